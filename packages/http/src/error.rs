/// Which decoder failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTarget {
    /// The success body of a 2xx response.
    Response,
    /// The endpoint's remote-error payload on a non-2xx response.
    RemoteError,
}

impl std::fmt::Display for DecodeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeTarget::Response => f.write_str("response"),
            DecodeTarget::RemoteError => f.write_str("remote error payload"),
        }
    }
}

/// Failures that originate on this side of the wire.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocalError {
    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("payload of {len} bytes is not a recognized binary asset")]
    InvalidBinaryPayload { len: usize },

    #[error("encoding failure: {message}")]
    Encoding { message: String },

    #[error("failed to decode {target}: {message}")]
    Decoding {
        target: DecodeTarget,
        message: String,
    },

    #[error("preview asset not found: {name}")]
    PreviewAssetMissing { name: String },

    /// Forced failure from [`PreviewMode::Failure`](crate::PreviewMode) without an explicit error.
    #[error("preview failure")]
    Preview,

    #[error("unknown failure: {message}")]
    Unknown { message: String },
}

impl LocalError {
    pub(crate) fn encoding(error: impl std::fmt::Display) -> Self {
        LocalError::Encoding {
            message: error.to_string(),
        }
    }

    pub(crate) fn decoding(target: DecodeTarget, error: impl std::fmt::Display) -> Self {
        LocalError::Decoding {
            target,
            message: error.to_string(),
        }
    }
}

impl From<netkit_value::Error> for LocalError {
    fn from(error: netkit_value::Error) -> Self {
        LocalError::encoding(error)
    }
}

/// The typed result error of a dispatch.
///
/// `E` is the endpoint's remote-error payload type; `()` when the endpoint
/// declares none.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NetworkError<E> {
    #[error(transparent)]
    Local(#[from] LocalError),

    #[error("remote error (status {status})")]
    Remote { status: u16, content: E },
}

impl<E> NetworkError<E> {
    pub fn is_local(&self) -> bool {
        matches!(self, NetworkError::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, NetworkError::Remote { .. })
    }

    pub fn local(&self) -> Option<&LocalError> {
        match self {
            NetworkError::Local(error) => Some(error),
            NetworkError::Remote { .. } => None,
        }
    }

    pub fn remote_content(&self) -> Option<&E> {
        match self {
            NetworkError::Local(_) => None,
            NetworkError::Remote { content, .. } => Some(content),
        }
    }
}

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("{message}")]
    Other { message: String },
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connection {
                message: error.to_string(),
            }
        } else if error.is_builder() {
            TransportError::InvalidRequest {
                message: error.to_string(),
            }
        } else {
            TransportError::Other {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoding_display_names_target() {
        let e = LocalError::decoding(DecodeTarget::RemoteError, "expected value");
        assert_eq!(
            e.to_string(),
            "failed to decode remote error payload: expected value"
        );
    }

    #[test]
    fn local_error_is_transparent() {
        let e: NetworkError<()> = LocalError::PreviewAssetMissing {
            name: "api.example.com/movie".to_string(),
        }
        .into();
        assert_eq!(e.to_string(), "preview asset not found: api.example.com/movie");
        assert!(e.is_local());
        assert!(!e.is_remote());
    }

    #[test]
    fn remote_error_exposes_content() {
        let e = NetworkError::Remote {
            status: 404,
            content: "not found".to_string(),
        };
        assert_eq!(e.to_string(), "remote error (status 404)");
        assert_eq!(e.remote_content().map(String::as_str), Some("not found"));
        assert!(e.local().is_none());
    }

    #[test]
    fn value_errors_become_encoding_failures() {
        let e: LocalError = netkit_value::Error::NotARecord { found: "string" }.into();
        assert!(matches!(e, LocalError::Encoding { .. }));
    }
}
