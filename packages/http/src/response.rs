//! Response shapes and body decoding.
//!
//! Every response type declares a [`ResponseKind`]; the dispatcher decodes a
//! 2xx body by matching on that tag and then hands the [`DecodedBody`] to the
//! type's constructor.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::endpoint::JsonCodec;
use crate::error::{DecodeTarget, LocalError};

/// How a successful body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Bytes exactly as received.
    Raw,
    /// JSON through the endpoint codec.
    Json,
    /// A binary asset whose format is recognized from its leading bytes.
    Asset,
}

/// A body after kind-specific decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    Raw(Bytes),
    Json(serde_json::Value),
    Asset(Asset),
}

impl DecodedBody {
    fn kind(&self) -> ResponseKind {
        match self {
            DecodedBody::Raw(_) => ResponseKind::Raw,
            DecodedBody::Json(_) => ResponseKind::Json,
            DecodedBody::Asset(_) => ResponseKind::Asset,
        }
    }
}

/// A type that can be produced from a successful response.
pub trait Response: Sized + Send + 'static {
    const KIND: ResponseKind;

    fn from_body(body: DecodedBody) -> Result<Self, LocalError>;
}

/// Decode `bytes` according to `kind`.
pub fn decode_body(
    kind: ResponseKind,
    bytes: Bytes,
    codec: &dyn JsonCodec,
) -> Result<DecodedBody, LocalError> {
    match kind {
        ResponseKind::Raw => Ok(DecodedBody::Raw(bytes)),
        ResponseKind::Json => codec
            .decode(&bytes)
            .map(DecodedBody::Json)
            .map_err(|e| LocalError::decoding(DecodeTarget::Response, e)),
        ResponseKind::Asset => Asset::from_bytes(bytes).map(DecodedBody::Asset),
    }
}

/// Decode a successful body into `R`.
pub fn decode_response<R: Response>(bytes: Bytes, codec: &dyn JsonCodec) -> Result<R, LocalError> {
    R::from_body(decode_body(R::KIND, bytes, codec)?)
}

fn unexpected(expected: ResponseKind, body: &DecodedBody) -> LocalError {
    LocalError::decoding(
        DecodeTarget::Response,
        format!("expected a {:?} body, got {:?}", expected, body.kind()),
    )
}

impl Response for Bytes {
    const KIND: ResponseKind = ResponseKind::Raw;

    fn from_body(body: DecodedBody) -> Result<Self, LocalError> {
        match body {
            DecodedBody::Raw(bytes) => Ok(bytes),
            other => Err(unexpected(Self::KIND, &other)),
        }
    }
}

/// Discards the body. Useful for HEAD and DELETE requests.
impl Response for () {
    const KIND: ResponseKind = ResponseKind::Raw;

    fn from_body(_body: DecodedBody) -> Result<Self, LocalError> {
        Ok(())
    }
}

/// A JSON response decoded into `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DeserializeOwned + Send + 'static> Response for Json<T> {
    const KIND: ResponseKind = ResponseKind::Json;

    fn from_body(body: DecodedBody) -> Result<Self, LocalError> {
        match body {
            DecodedBody::Json(value) => serde_json::from_value(value)
                .map(Json)
                .map_err(|e| LocalError::decoding(DecodeTarget::Response, e)),
            other => Err(unexpected(Self::KIND, &other)),
        }
    }
}

/// A binary asset (image, document, archive) with its detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    bytes: Bytes,
    mime_type: &'static str,
    extension: &'static str,
}

impl Asset {
    /// Recognize the payload format. Unknown or empty payloads are rejected.
    pub fn from_bytes(bytes: Bytes) -> Result<Self, LocalError> {
        match infer::get(&bytes) {
            Some(kind) => Ok(Self {
                mime_type: kind.mime_type(),
                extension: kind.extension(),
                bytes,
            }),
            None => Err(LocalError::InvalidBinaryPayload { len: bytes.len() }),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn extension(&self) -> &'static str {
        self.extension
    }
}

impl Response for Asset {
    const KIND: ResponseKind = ResponseKind::Asset;

    fn from_body(body: DecodedBody) -> Result<Self, LocalError> {
        match body {
            DecodedBody::Asset(asset) => Ok(asset),
            other => Err(unexpected(Self::KIND, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::DefaultJsonCodec;
    use serde::Deserialize;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];

    #[derive(Debug, Deserialize, PartialEq)]
    struct Movie {
        id: u32,
        title: String,
    }

    #[test]
    fn raw_bytes_pass_through() {
        let body = Bytes::from_static(b"not json at all");
        let decoded: Bytes = decode_response(body.clone(), &DefaultJsonCodec).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn unit_ignores_body() {
        let decoded: Result<(), _> =
            decode_response(Bytes::from_static(b"\xff\xfe"), &DefaultJsonCodec);
        assert!(decoded.is_ok());
    }

    #[test]
    fn json_decodes_typed() {
        let body = Bytes::from_static(br#"{"id":42,"title":"Dune","extra":true}"#);
        let Json(movie): Json<Movie> = decode_response(body, &DefaultJsonCodec).unwrap();
        assert_eq!(
            movie,
            Movie {
                id: 42,
                title: "Dune".to_string()
            }
        );
    }

    #[test]
    fn malformed_json_is_response_decoding_error() {
        let result: Result<Json<Movie>, _> =
            decode_response(Bytes::from_static(b"{"), &DefaultJsonCodec);
        assert!(matches!(
            result,
            Err(LocalError::Decoding {
                target: DecodeTarget::Response,
                ..
            })
        ));
    }

    #[test]
    fn wrong_json_shape_is_response_decoding_error() {
        let result: Result<Json<Movie>, _> =
            decode_response(Bytes::from_static(br#"{"id":"x"}"#), &DefaultJsonCodec);
        assert!(matches!(
            result,
            Err(LocalError::Decoding {
                target: DecodeTarget::Response,
                ..
            })
        ));
    }

    #[test]
    fn png_asset_is_recognized() {
        let asset: Asset =
            decode_response(Bytes::from_static(PNG_HEADER), &DefaultJsonCodec).unwrap();
        assert_eq!(asset.mime_type(), "image/png");
        assert_eq!(asset.extension(), "png");
        assert_eq!(asset.bytes().len(), PNG_HEADER.len());
    }

    #[test]
    fn unknown_asset_is_invalid_binary_payload() {
        let result: Result<Asset, _> =
            decode_response(Bytes::from_static(b"hello"), &DefaultJsonCodec);
        assert_eq!(result, Err(LocalError::InvalidBinaryPayload { len: 5 }));
    }

    #[test]
    fn mismatched_body_kind_is_rejected() {
        let result = Bytes::from_body(DecodedBody::Json(serde_json::Value::Null));
        assert!(matches!(result, Err(LocalError::Decoding { .. })));
    }
}
