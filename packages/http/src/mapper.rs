//! Single point where raw failures become [`NetworkError`]s.

use bytes::Bytes;
use tracing::warn;

use crate::endpoint::{JsonCodec, RemoteErrorDecoder};
use crate::error::{DecodeTarget, LocalError, NetworkError, TransportError};

/// A failure observed somewhere in the pipeline, before classification.
#[derive(Debug)]
pub enum Failure<E> {
    /// Already classified.
    Typed(NetworkError<E>),
    /// A successful body did not decode.
    Decode(String),
    /// Parameters or headers did not encode.
    Encode(String),
    /// A non-2xx status with its body.
    Remote { status: u16, body: Bytes },
    /// The transport could not complete the exchange.
    Transport(TransportError),
    /// Anything else.
    Other(String),
}

/// Encoding and response-decoding errors are unwrapped into their raw
/// shapes; every other local error is already classified.
impl<E> From<LocalError> for Failure<E> {
    fn from(error: LocalError) -> Self {
        match error {
            LocalError::Encoding { message } => Failure::Encode(message),
            LocalError::Decoding {
                target: DecodeTarget::Response,
                message,
            } => Failure::Decode(message),
            other => Failure::Typed(NetworkError::Local(other)),
        }
    }
}

/// A transport failure the transport itself could not classify becomes
/// [`Failure::Other`].
impl<E> From<TransportError> for Failure<E> {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Other { message } => Failure::Other(message),
            other => Failure::Transport(other),
        }
    }
}

/// Classifies failures for one endpoint.
pub struct ErrorMapper<'a, E> {
    codec: &'a dyn JsonCodec,
    remote: RemoteErrorDecoder<E>,
}

impl<'a, E> ErrorMapper<'a, E> {
    pub fn new(codec: &'a dyn JsonCodec, remote: RemoteErrorDecoder<E>) -> Self {
        Self { codec, remote }
    }

    /// Classify a failure. A remote payload that does not decode is a local
    /// decoding error for the remote payload, never `Unknown`.
    pub fn classify(&self, failure: Failure<E>) -> NetworkError<E> {
        match failure {
            Failure::Typed(error) => error,
            Failure::Decode(message) => {
                LocalError::decoding(DecodeTarget::Response, message).into()
            }
            Failure::Encode(message) => LocalError::Encoding { message }.into(),
            Failure::Remote { status, body } => match (self.remote)(self.codec, &body) {
                Ok(content) => {
                    warn!(status, "remote error");
                    NetworkError::Remote { status, content }
                }
                Err(e) => {
                    warn!(status, error = %e, "remote error payload did not decode");
                    LocalError::decoding(DecodeTarget::RemoteError, e).into()
                }
            },
            Failure::Transport(error) => LocalError::Transport {
                message: error.to_string(),
            }
            .into(),
            Failure::Other(message) => LocalError::Unknown { message }.into(),
        }
    }
}
