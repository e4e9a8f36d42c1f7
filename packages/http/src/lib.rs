//! # netkit-http
//!
//! Declarative HTTP requests: describe a request as data, run it against an
//! endpoint configuration, get back a typed response or a typed error.
//!
//! ## Pieces
//!
//! - [`RequestDescriptor`]: method, path, encoding, parameters, headers and
//!   the expected [`Response`] shape.
//! - [`EndpointConfig`]: base address, persistent parameters and headers,
//!   JSON codec, remote-error payload type and [`PreviewMode`].
//! - [`build`]: merges and encodes everything into a [`TransportRequest`]
//!   (query string, JSON body or multipart/form-data).
//! - [`Dispatcher`]: sends through a [`Transport`] (or answers from
//!   fixtures in preview), classifies the status and decodes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use netkit_http::{Dispatcher, EndpointConfig, Json, RequestDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Credentials {
//!     api_key: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Search {
//!     query: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Page {
//!     total_results: u64,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct ApiMessage {
//!     status_message: String,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let movies = EndpointConfig::new("https://api.themoviedb.org/3/")
//!     .with_persistent_parameters(Credentials { api_key: "secret".to_string() })
//!     .with_remote_error::<ApiMessage>();
//!
//! let search = RequestDescriptor::get("search/movie")
//!     .with_parameters(Search { query: "dune".to_string() })
//!     .expecting::<Json<Page>>();
//!
//! let dispatcher = Dispatcher::with_default_transport()?;
//! let page = dispatcher.request(&search, &movies).await?;
//! println!("{} results", page.total_results);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod codec;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod handle;
pub mod mapper;
pub mod multipart;
pub mod preview;
pub mod request;
pub mod response;
pub mod types;

pub use netkit_value::{Binary, Bytes};

pub use builder::build;
pub use dispatch::{classify_status, Classification, Dispatcher, PREVIEW_ENV_VAR};
pub use endpoint::{DefaultJsonCodec, EndpointConfig, JsonCodec, RemoteErrorDecoder};
pub use error::{DecodeTarget, LocalError, NetworkError, TransportError};
#[cfg(any(test, feature = "test-utils"))]
pub use executor::mock::MockTransport;
#[cfg(feature = "reqwest")]
pub use executor::ReqwestTransport;
pub use executor::Transport;
pub use handle::{DispatchHandle, RequestState};
pub use mapper::{ErrorMapper, Failure};
pub use multipart::{MultipartBody, MultipartEncoder, MultipartPart};
pub use preview::{
    asset_name, DirectoryFixtures, FixtureStore, MemoryFixtures, PreviewDecision, PreviewMode,
    PreviewResolver,
};
pub use request::{Empty, RequestDescriptor};
pub use response::{Asset, DecodedBody, Json, Response, ResponseKind};
pub use types::{Encoding, Method, TransportRequest, TransportResponse};
