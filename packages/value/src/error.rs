//! Errors produced while walking values into the tagged tree.

/// Failure to turn a Rust value into a [`Value`](crate::Value).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A map key serialized to something that cannot name a field.
    #[error("map key must be a string, found {found}")]
    KeyMustBeAString { found: &'static str },

    /// The root of a parameter or header set was not a record.
    #[error("expected a record at the root, found {found}")]
    NotARecord { found: &'static str },

    /// JSON has no representation for NaN or the infinities.
    #[error("non-finite float {value} cannot be encoded as JSON")]
    NonFiniteFloat { value: f64 },

    /// A custom `Serialize` implementation reported an error.
    #[error("{message}")]
    Custom { message: String },
}

impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Custom {
            message: msg.to_string(),
        }
    }
}
