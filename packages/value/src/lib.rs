//! Tagged value tree for netkit request parameters.
//!
//! Request parameters and headers are ordinary `Serialize` types. Before
//! anything touches the wire they are walked into a [`Value`] tree:
//! - `Value`: records, arrays, scalars, nulls and raw binary leaves
//! - `Map`: ordered record with unique keys (declaration order)
//! - `Binary`: raw bytes with optional content type and file name
//!
//! # Example
//!
//! ```rust
//! use netkit_value::{to_record, Binary, Value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Upload {
//!     note: String,
//!     file: Binary,
//!     tag: Option<String>,
//! }
//!
//! let record = to_record(&Upload {
//!     note: "ok".to_string(),
//!     file: Binary::new(b"hi".to_vec()),
//!     tag: None,
//! })
//! .unwrap();
//!
//! assert_eq!(record.keys().collect::<Vec<_>>(), vec!["note", "file"]);
//! assert_eq!(record.get("note"), Some(&Value::from("ok")));
//! ```

pub use bytes::Bytes;

mod binary;
mod convert;
mod error;
mod ser;
mod value;

pub use binary::Binary;
pub use convert::{map_to_json, to_flat_string, value_to_json};
pub use error::Error;
pub use ser::{to_record, to_value, ValueSerializer};
pub use value::{Map, Value};
