//! Endpoint configuration shared by every request against one logical API.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::mapper::ErrorMapper;
use crate::preview::PreviewMode;
use crate::request::Empty;

/// JSON encode/decode capability of an endpoint.
///
/// The default implementation is plain `serde_json`. Endpoints with special
/// wire conventions (date formats, envelopes) supply their own codec; typed
/// fields are still decoded through serde afterwards.
pub trait JsonCodec: Send + Sync {
    fn encode(&self, body: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(body)
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Plain `serde_json` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultJsonCodec;

impl JsonCodec for DefaultJsonCodec {}

/// Decodes a non-2xx response body into the endpoint's remote error type.
pub type RemoteErrorDecoder<E> = fn(&dyn JsonCodec, &[u8]) -> Result<E, serde_json::Error>;

fn ignore_remote_body(_codec: &dyn JsonCodec, _body: &[u8]) -> Result<(), serde_json::Error> {
    Ok(())
}

fn decode_remote_json<E: DeserializeOwned>(
    codec: &dyn JsonCodec,
    body: &[u8],
) -> Result<E, serde_json::Error> {
    serde_json::from_value(codec.decode(body)?)
}

/// Configuration for one logical API.
///
/// `P` and `H` are the persistent parameters and headers merged into every
/// request; `E` is the remote error payload (`()` ignores error bodies).
///
/// ```rust
/// use netkit_http::{EndpointConfig, PreviewMode};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct Credentials {
///     api_key: String,
/// }
///
/// #[derive(Debug, Deserialize)]
/// struct ApiMessage {
///     message: String,
/// }
///
/// let movies = EndpointConfig::new("https://api.themoviedb.org/3/")
///     .with_persistent_parameters(Credentials { api_key: "secret".to_string() })
///     .with_remote_error::<ApiMessage>()
///     .with_preview(PreviewMode::Disabled);
///
/// assert_eq!(movies.base_url(), "https://api.themoviedb.org/3/");
/// ```
pub struct EndpointConfig<P = Empty, H = Empty, E = ()> {
    base_url: String,
    persistent_parameters: P,
    persistent_headers: H,
    codec: Arc<dyn JsonCodec>,
    remote_error: RemoteErrorDecoder<E>,
    preview: PreviewMode,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            persistent_parameters: Empty,
            persistent_headers: Empty,
            codec: Arc::new(DefaultJsonCodec),
            remote_error: ignore_remote_body,
            preview: PreviewMode::default(),
        }
    }
}

impl<P, H, E> EndpointConfig<P, H, E> {
    pub fn with_persistent_parameters<P2>(self, parameters: P2) -> EndpointConfig<P2, H, E> {
        EndpointConfig {
            base_url: self.base_url,
            persistent_parameters: parameters,
            persistent_headers: self.persistent_headers,
            codec: self.codec,
            remote_error: self.remote_error,
            preview: self.preview,
        }
    }

    pub fn with_persistent_headers<H2>(self, headers: H2) -> EndpointConfig<P, H2, E> {
        EndpointConfig {
            base_url: self.base_url,
            persistent_parameters: self.persistent_parameters,
            persistent_headers: headers,
            codec: self.codec,
            remote_error: self.remote_error,
            preview: self.preview,
        }
    }

    /// Decode non-2xx bodies as JSON into `E2`.
    pub fn with_remote_error<E2: DeserializeOwned>(self) -> EndpointConfig<P, H, E2> {
        self.with_remote_error_decoder(decode_remote_json::<E2>)
    }

    pub fn with_remote_error_decoder<E2>(
        self,
        decoder: RemoteErrorDecoder<E2>,
    ) -> EndpointConfig<P, H, E2> {
        EndpointConfig {
            base_url: self.base_url,
            persistent_parameters: self.persistent_parameters,
            persistent_headers: self.persistent_headers,
            codec: self.codec,
            remote_error: decoder,
            preview: self.preview,
        }
    }

    pub fn with_codec(mut self, codec: impl JsonCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_preview(mut self, mode: PreviewMode) -> Self {
        self.preview = mode;
        self
    }

    /// Change the preview mode. Dispatches already running keep the mode
    /// they started with.
    pub fn set_preview_mode(&mut self, mode: PreviewMode) {
        self.preview = mode;
    }

    pub fn preview_mode(&self) -> &PreviewMode {
        &self.preview
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn persistent_parameters(&self) -> &P {
        &self.persistent_parameters
    }

    pub fn persistent_headers(&self) -> &H {
        &self.persistent_headers
    }

    pub fn codec(&self) -> &dyn JsonCodec {
        self.codec.as_ref()
    }

    pub fn error_mapper(&self) -> ErrorMapper<'_, E> {
        ErrorMapper::new(self.codec.as_ref(), self.remote_error)
    }
}

impl<P: Clone, H: Clone, E> Clone for EndpointConfig<P, H, E> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            persistent_parameters: self.persistent_parameters.clone(),
            persistent_headers: self.persistent_headers.clone(),
            codec: Arc::clone(&self.codec),
            remote_error: self.remote_error,
            preview: self.preview.clone(),
        }
    }
}

impl<P: std::fmt::Debug, H: std::fmt::Debug, E> std::fmt::Debug for EndpointConfig<P, H, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("persistent_parameters", &self.persistent_parameters)
            .field("persistent_headers", &self.persistent_headers)
            .field("remote_error", &std::any::type_name::<E>())
            .field("preview", &self.preview)
            .finish()
    }
}
