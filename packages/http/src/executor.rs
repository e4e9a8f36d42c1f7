//! Transport abstraction.
//!
//! The dispatcher talks to the network through [`Transport`] so tests can
//! swap in a mock and avoid real network calls.

#[cfg(feature = "reqwest")]
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{TransportRequest, TransportResponse};

/// A single request -> response exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return whatever came back.
    ///
    /// Non-2xx statuses are responses, not errors. `Err` means the exchange
    /// itself failed.
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport using the async reqwest client.
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestTransport {
    /// Create a new transport with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(30))
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

        let method: http::Method = request.method.into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| TransportError::InvalidRequest {
                    message: e.to_string(),
                })?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| TransportError::InvalidRequest {
                    message: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = self.client.request(method, &request.url).headers(headers);
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let mut resp_headers = Vec::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.push((name.to_string(), v.to_string()));
            }
        }
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: Some(status),
            headers: resp_headers,
            body,
        })
    }
}

/// Mock transport for testing.
///
/// Returns predefined responses keyed by request URL (query string ignored).
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// A mock transport that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        /// Responses keyed by URL without query.
        responses: Arc<Mutex<HashMap<String, TransportResponse>>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<TransportResponse>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<TransportRequest>>>,
        /// Error returned for every request, if set.
        failure: Arc<Mutex<Option<TransportError>>>,
        /// Delay before answering.
        delay: Arc<Mutex<Option<Duration>>>,
    }

    impl MockTransport {
        /// Create a new mock transport.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a specific URL.
        pub fn with_response(self, url: impl Into<String>, response: TransportResponse) -> Self {
            self.responses.lock().unwrap().insert(url.into(), response);
            self
        }

        /// Set a default response when no URL matches.
        pub fn with_default_response(self, response: TransportResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, error: TransportError) -> Self {
            *self.failure.lock().unwrap() = Some(error);
            self
        }

        /// Wait before answering each request.
        pub fn with_delay(self, delay: Duration) -> Self {
            *self.delay.lock().unwrap() = Some(delay);
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<TransportRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Create a 200 response with a JSON body.
        pub fn success_response(body: serde_json::Value) -> TransportResponse {
            TransportResponse::new(200, body.to_string())
                .with_header("content-type", "application/json")
        }

        /// Create an error response with a `{"message": ..}` body.
        pub fn error_response(status: u16, message: &str) -> TransportResponse {
            TransportResponse::new(status, serde_json::json!({ "message": message }).to_string())
                .with_header("content-type", "application/json")
        }

        /// Create a 404 Not Found response.
        pub fn not_found() -> TransportResponse {
            Self::error_response(404, "Not Found")
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            request: &TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = self.failure.lock().unwrap().clone() {
                return Err(error);
            }

            if let Some(response) = self
                .responses
                .lock()
                .unwrap()
                .get(request.url_without_query())
            {
                return Ok(response.clone());
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return Ok(response.clone());
            }

            Ok(Self::not_found())
        }
    }
}
