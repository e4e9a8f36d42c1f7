//! Dispatch: build, send (or answer from fixtures), classify, decode.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::builder::build;
use crate::endpoint::EndpointConfig;
use crate::error::{LocalError, NetworkError};
use crate::executor::Transport;
use crate::handle::{pair, DispatchHandle};
use crate::mapper::Failure;
use crate::preview::{FixtureStore, MemoryFixtures, PreviewDecision, PreviewResolver};
use crate::request::RequestDescriptor;
use crate::response::{decode_response, Response};

/// Environment variable marking the process as a preview environment.
///
/// Any value other than empty, `0` or `false` turns it on.
pub const PREVIEW_ENV_VAR: &str = "NETKIT_PREVIEW";

/// Outcome of looking at a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Status in `[200, 300)`.
    Success,
    /// Any other status.
    Remote(u16),
    /// No HTTP envelope.
    MissingStatus,
}

pub fn classify_status(status: Option<u16>) -> Classification {
    match status {
        Some(status) if (200..300).contains(&status) => Classification::Success,
        Some(status) => Classification::Remote(status),
        None => Classification::MissingStatus,
    }
}

fn preview_environment_from_env() -> bool {
    match std::env::var(PREVIEW_ENV_VAR) {
        Ok(value) => !matches!(value.trim(), "" | "0" | "false"),
        Err(_) => false,
    }
}

/// Runs request descriptors against their endpoints.
///
/// Cheap to clone; clones share the transport and the fixture store.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    fixtures: Arc<dyn FixtureStore>,
    preview_environment: bool,
}

impl Dispatcher {
    /// Create a dispatcher. Whether this is a preview environment is read
    /// from `NETKIT_PREVIEW` now, not per dispatch.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            fixtures: Arc::new(MemoryFixtures::new()),
            preview_environment: preview_environment_from_env(),
        }
    }

    /// Dispatcher over a reqwest transport with the default timeout.
    #[cfg(feature = "reqwest")]
    pub fn with_default_transport() -> Result<Self, crate::error::TransportError> {
        Ok(Self::new(crate::executor::ReqwestTransport::with_default_timeout()?))
    }

    pub fn with_fixtures(mut self, fixtures: impl FixtureStore + 'static) -> Self {
        self.fixtures = Arc::new(fixtures);
        self
    }

    pub fn with_preview_environment(mut self, preview_environment: bool) -> Self {
        self.preview_environment = preview_environment;
        self
    }

    pub fn in_preview_environment(&self) -> bool {
        self.preview_environment
    }

    /// Dispatch one request and decode its result.
    ///
    /// The endpoint's preview mode is read once, before anything else. With
    /// [`PreviewMode::Loading`](crate::PreviewMode::Loading) the returned
    /// future never completes.
    pub async fn request<P, H, R, EP, EH, E>(
        &self,
        descriptor: &RequestDescriptor<P, H, R>,
        endpoint: &EndpointConfig<EP, EH, E>,
    ) -> Result<R, NetworkError<E>>
    where
        P: Serialize,
        H: Serialize,
        R: Response,
        EP: Serialize,
        EH: Serialize,
    {
        let decision = endpoint.preview_mode().decide(self.preview_environment);
        debug!(
            method = %descriptor.method(),
            path = descriptor.path(),
            decision = ?decision,
            "dispatch"
        );

        let from_fixtures = match decision {
            PreviewDecision::Fail(error) => return Err(error.into()),
            PreviewDecision::Loading => return std::future::pending().await,
            PreviewDecision::Live => false,
            PreviewDecision::Fixture => true,
        };

        let mapper = endpoint.error_mapper();
        let request = build(descriptor, endpoint).map_err(|e| mapper.classify(e.into()))?;

        if from_fixtures {
            let bytes = PreviewResolver::new(self.fixtures.as_ref()).resolve(&request)?;
            return decode_response(bytes, endpoint.codec()).map_err(|e| mapper.classify(e.into()));
        }

        if let Err(e) = request.parse_url() {
            return Err(LocalError::InvalidResponse {
                message: format!("invalid url {:?}: {}", request.url, e),
            }
            .into());
        }

        debug!(url = %request.url, "sent");
        let sent = self.transport.send(&request).await;

        let response = match sent {
            Ok(response) => response,
            Err(error) => {
                debug!(url = %request.url, error = %error, "transport failed");
                return Err(mapper.classify(error.into()));
            }
        };

        let classification = classify_status(response.status);
        debug!(url = %request.url, classification = ?classification, "classified");

        match classification {
            Classification::Success => decode_response(response.body, endpoint.codec())
                .map_err(|e| mapper.classify(e.into())),
            Classification::Remote(status) => Err(mapper.classify(Failure::Remote {
                status,
                body: response.body,
            })),
            Classification::MissingStatus => Err(LocalError::InvalidResponse {
                message: "response carried no status code".to_string(),
            }
            .into()),
        }
    }

    /// Run [`request`](Self::request) as a tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<P, H, R, EP, EH, E>(
        &self,
        descriptor: RequestDescriptor<P, H, R>,
        endpoint: EndpointConfig<EP, EH, E>,
    ) -> DispatchHandle<R, E>
    where
        P: Serialize + Send + Sync + 'static,
        H: Serialize + Send + Sync + 'static,
        R: Response,
        EP: Serialize + Send + Sync + 'static,
        EH: Serialize + Send + Sync + 'static,
        E: Send + 'static,
    {
        let (handle, completion) = pair();
        let dispatcher = self.clone();
        debug!(id = handle.id(), path = descriptor.path(), "spawning dispatch");
        tokio::spawn(completion.run(async move {
            dispatcher.request(&descriptor, &endpoint).await
        }));
        handle
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("preview_environment", &self.preview_environment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeTarget, TransportError};
    use crate::executor::mock::MockTransport;
    use crate::handle::RequestState;
    use crate::preview::PreviewMode;
    use crate::response::Json;
    use crate::types::{Encoding, TransportResponse};
    use bytes::Bytes;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize)]
    struct Credentials {
        key: String,
    }

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct ApiMessage {
        message: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Movie {
        id: u32,
        title: String,
    }

    type Movies = EndpointConfig<Credentials, crate::Empty, ApiMessage>;

    fn movies() -> Movies {
        EndpointConfig::new("https://api.example.com/")
            .with_persistent_parameters(Credentials {
                key: "abc".to_string(),
            })
            .with_remote_error::<ApiMessage>()
            .with_preview(PreviewMode::Disabled)
    }

    fn movie_request() -> RequestDescriptor<crate::Empty, crate::Empty, Json<Movie>> {
        RequestDescriptor::get("movie/42").expecting::<Json<Movie>>()
    }

    fn live(transport: &MockTransport) -> Dispatcher {
        Dispatcher::new(transport.clone()).with_preview_environment(false)
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(classify_status(Some(199)), Classification::Remote(199));
        assert_eq!(classify_status(Some(200)), Classification::Success);
        assert_eq!(classify_status(Some(299)), Classification::Success);
        assert_eq!(classify_status(Some(300)), Classification::Remote(300));
        assert_eq!(classify_status(None), Classification::MissingStatus);
    }

    #[tokio::test]
    async fn status_boundaries_through_dispatch() {
        for (status, decoded) in [(199, false), (200, true), (299, true), (300, false)] {
            let transport = MockTransport::new()
                .with_default_response(TransportResponse::new(status, r#"{"message":"m"}"#));
            let result = live(&transport)
                .request(&RequestDescriptor::get("x"), &movies())
                .await;
            assert_eq!(result.is_ok(), decoded, "status {}", status);
        }
    }

    #[tokio::test]
    async fn decodes_json_success() {
        let transport = MockTransport::new().with_response(
            "https://api.example.com/movie/42",
            MockTransport::success_response(serde_json::json!({"id": 42, "title": "Dune"})),
        );

        let Json(movie) = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap();
        assert_eq!(
            movie,
            Movie {
                id: 42,
                title: "Dune".to_string()
            }
        );

        let recorded = transport.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].url, "https://api.example.com/movie/42?key=abc");
    }

    #[tokio::test]
    async fn not_found_decodes_remote_payload() {
        let transport = MockTransport::new().with_default_response(TransportResponse::new(
            404,
            r#"{"message":"not found"}"#,
        ));

        let error = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            NetworkError::Remote {
                status: 404,
                content: ApiMessage {
                    message: "not found".to_string()
                }
            }
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_response_decoding_error() {
        let transport = MockTransport::new()
            .with_default_response(TransportResponse::new(200, "{\"id\": \"nope\"}"));

        let error = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap_err();
        assert!(matches!(
            error.local(),
            Some(LocalError::Decoding {
                target: DecodeTarget::Response,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn missing_status_is_invalid_response() {
        let transport =
            MockTransport::new().with_default_response(TransportResponse::without_status("?"));
        let error = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap_err();
        assert!(matches!(error.local(), Some(LocalError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn transport_failure_is_local() {
        let transport = MockTransport::new().fail_with(TransportError::Connection {
            message: "refused".to_string(),
        });
        let error = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap_err();
        assert!(matches!(error.local(), Some(LocalError::Transport { .. })));
        assert_eq!(transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn unclassified_transport_failure_is_unknown() {
        let transport = MockTransport::new().fail_with(TransportError::Other {
            message: "connection reset mid-body".to_string(),
        });
        let error = live(&transport)
            .request(&movie_request(), &movies())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            NetworkError::Local(LocalError::Unknown {
                message: "connection reset mid-body".to_string()
            })
        );
    }

    #[tokio::test]
    async fn invalid_url_fails_before_sending() {
        let transport = MockTransport::new();
        let endpoint = EndpointConfig::new("no scheme here").with_preview(PreviewMode::Disabled);
        let error = live(&transport)
            .request(&RequestDescriptor::get("x"), &endpoint)
            .await
            .unwrap_err();

        assert!(matches!(error.local(), Some(LocalError::InvalidResponse { .. })));
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn encoding_failure_never_sends() {
        let transport = MockTransport::new();
        let descriptor = RequestDescriptor::post("lists").with_parameters(vec!["not", "a", "record"]);
        let error = live(&transport)
            .request(&descriptor, &movies())
            .await
            .unwrap_err();

        assert!(matches!(error.local(), Some(LocalError::Encoding { .. })));
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn fixture_mode_never_touches_transport() {
        let transport = MockTransport::new();
        let fixtures = MemoryFixtures::new()
            .with_fixture("api.example.com/movie/42", r#"{"id":42,"title":"Fixture"}"#);
        let dispatcher = live(&transport).with_fixtures(fixtures);
        let endpoint = movies().with_preview(PreviewMode::Success);

        let descriptor = RequestDescriptor::get("movie/42/details").expecting::<Json<Movie>>();
        let Json(movie) = dispatcher.request(&descriptor, &endpoint).await.unwrap();

        assert_eq!(movie.title, "Fixture");
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn automatic_mode_follows_environment() {
        let transport = MockTransport::new()
            .with_default_response(MockTransport::success_response(serde_json::json!({})));
        let endpoint = EndpointConfig::new("https://api.example.com/");
        let descriptor = RequestDescriptor::get("anything");

        let error = Dispatcher::new(transport.clone())
            .with_preview_environment(true)
            .request(&descriptor, &endpoint)
            .await
            .unwrap_err();
        assert!(matches!(
            error.local(),
            Some(LocalError::PreviewAssetMissing { .. })
        ));
        assert!(transport.recorded_requests().is_empty());

        let body = live(&transport).request(&descriptor, &endpoint).await.unwrap();
        assert_eq!(&body[..], b"{}");
        assert_eq!(transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn failure_mode_uses_configured_error() {
        let transport = MockTransport::new();
        let endpoint = movies().with_preview(PreviewMode::Failure(None));
        let error = live(&transport)
            .request(&movie_request(), &endpoint)
            .await
            .unwrap_err();
        assert_eq!(error, NetworkError::Local(LocalError::Preview));

        let endpoint = movies().with_preview(PreviewMode::Failure(Some(LocalError::Unknown {
            message: "offline".to_string(),
        })));
        let error = live(&transport)
            .request(&movie_request(), &endpoint)
            .await
            .unwrap_err();
        assert!(matches!(error.local(), Some(LocalError::Unknown { .. })));
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn loading_mode_never_completes() {
        let transport = MockTransport::new();
        let endpoint = movies().with_preview(PreviewMode::Loading);
        let dispatcher = live(&transport);
        let descriptor = movie_request();
        let pending = dispatcher.request(&descriptor, &endpoint);

        let result = tokio::time::timeout(Duration::from_millis(50), pending).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn preview_mode_is_read_per_dispatch() {
        let transport = MockTransport::new()
            .with_default_response(TransportResponse::new(200, Bytes::from_static(b"live")));
        let dispatcher = live(&transport);
        let mut endpoint = EndpointConfig::new("https://api.example.com/")
            .with_preview(PreviewMode::Disabled);

        let first: Bytes = dispatcher
            .request(&RequestDescriptor::get("a"), &endpoint)
            .await
            .unwrap();
        assert_eq!(&first[..], b"live");

        endpoint.set_preview_mode(PreviewMode::Failure(None));
        let second = dispatcher.request(&RequestDescriptor::get("a"), &endpoint).await;
        assert_eq!(second, Err(NetworkError::Local(LocalError::Preview)));
    }

    #[tokio::test]
    async fn spawn_delivers_result() {
        let transport = MockTransport::new().with_default_response(
            MockTransport::success_response(serde_json::json!({"id": 1, "title": "Arrival"})),
        );
        let mut handle = live(&transport).spawn(movie_request(), movies());

        let Json(movie) = handle.wait().await.unwrap().unwrap();
        assert_eq!(movie.title, "Arrival");
        assert_eq!(handle.state(), RequestState::Complete);
    }

    #[tokio::test]
    async fn cancel_before_transport_answers() {
        let transport = MockTransport::new()
            .with_delay(Duration::from_millis(200))
            .with_default_response(MockTransport::success_response(serde_json::json!({})));
        let mut handle = live(&transport).spawn(
            RequestDescriptor::post("upload").with_encoding(Encoding::Json),
            movies(),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        assert_eq!(handle.state(), RequestState::Cancelled);
        assert!(handle.wait().await.is_none());
        assert!(handle.try_result().is_none());
    }
}
