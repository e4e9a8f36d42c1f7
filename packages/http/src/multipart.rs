//! multipart/form-data encoding.
//!
//! The encoder walks a record depth first. Every leaf becomes one part named
//! by the dot-joined path of record keys and array indices leading to it, so
//! `{"tags": ["a", "b"], "owner": {"id": 7}}` yields `tags.0`, `tags.1` and
//! `owner.id` in that order. Nulls produce no part.

use bytes::Bytes;
use netkit_value::{to_flat_string, Map, Value};
use uuid::Uuid;

use crate::error::LocalError;

/// One form-data part.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    /// Dot-joined field path.
    pub name: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// An encoded multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Bytes,
    pub part_count: usize,
}

impl MultipartBody {
    /// Value of the `Content-Type` header for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Flatten a record into parts in depth-first encounter order.
pub fn collect_parts(record: &Map) -> Result<Vec<MultipartPart>, LocalError> {
    let mut parts = Vec::new();
    let mut path = Vec::new();
    for (key, value) in record.iter() {
        path.push(key.to_string());
        walk(value, &mut path, &mut parts)?;
        path.pop();
    }
    Ok(parts)
}

fn walk(
    value: &Value,
    path: &mut Vec<String>,
    parts: &mut Vec<MultipartPart>,
) -> Result<(), LocalError> {
    match value {
        Value::Null => {}
        Value::Map(map) => {
            for (key, child) in map.iter() {
                path.push(key.to_string());
                walk(child, path, parts)?;
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                walk(child, path, parts)?;
                path.pop();
            }
        }
        Value::Binary(binary) => parts.push(MultipartPart {
            name: path.join("."),
            body: binary.data.clone(),
            content_type: binary.content_type.clone(),
            file_name: binary.file_name.clone(),
        }),
        leaf => {
            if let Some(text) = to_flat_string(leaf)? {
                parts.push(MultipartPart {
                    name: path.join("."),
                    body: Bytes::from(text),
                    content_type: None,
                    file_name: None,
                });
            }
        }
    }
    Ok(())
}

/// Produces a multipart body with its own boundary token.
///
/// `encode` consumes the encoder, so a boundary is never reused across
/// requests.
#[derive(Debug)]
pub struct MultipartEncoder {
    boundary: String,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self {
            boundary: format!("netkit-{}", Uuid::new_v4().simple()),
        }
    }

    /// Use a fixed boundary token.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn encode(self, record: &Map) -> Result<MultipartBody, LocalError> {
        let parts = collect_parts(record)?;
        let mut out = Vec::new();

        for part in &parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            out.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"",
                    escape(&part.name)
                )
                .as_bytes(),
            );
            if let Some(file_name) = &part.file_name {
                out.extend_from_slice(format!("; filename=\"{}\"", escape(file_name)).as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.body);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Ok(MultipartBody {
            boundary: self.boundary,
            bytes: Bytes::from(out),
            part_count: parts.len(),
        })
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-escape characters that would break a quoted header parameter.
fn escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}
