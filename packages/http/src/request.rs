//! Declarative request descriptors.
//!
//! A descriptor is data only: method, path, encoding, parameters, headers and
//! the response shape expected back. Parameters and headers are any
//! `Serialize` type; [`Empty`] stands in when a request has none.
//!
//! ```rust
//! use netkit_http::{Encoding, Json, Method, RequestDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Search {
//!     q: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Results {
//!     total: u32,
//! }
//!
//! let search = RequestDescriptor::get("search")
//!     .with_parameters(Search { q: "dune".to_string() })
//!     .expecting::<Json<Results>>();
//!
//! assert_eq!(search.method(), Method::GET);
//! assert_eq!(search.encoding(), Encoding::Url);
//! ```

use std::marker::PhantomData;

use bytes::Bytes;
use serde::Serialize;

use crate::types::{Encoding, Method};

/// A parameter or header set with no entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty;

/// Description of one HTTP request against an [`EndpointConfig`](crate::EndpointConfig).
///
/// `P` are the request parameters, `H` the request headers and `R` the
/// [`Response`](crate::Response) shape (raw bytes by default).
pub struct RequestDescriptor<P = Empty, H = Empty, R = Bytes> {
    method: Method,
    path: String,
    encoding: Option<Encoding>,
    parameters: P,
    headers: H,
    response: PhantomData<fn() -> R>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            encoding: None,
            parameters: Empty,
            headers: Empty,
            response: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }
}

impl<P, H, R> RequestDescriptor<P, H, R> {
    pub fn with_parameters<P2>(self, parameters: P2) -> RequestDescriptor<P2, H, R> {
        RequestDescriptor {
            method: self.method,
            path: self.path,
            encoding: self.encoding,
            parameters,
            headers: self.headers,
            response: PhantomData,
        }
    }

    pub fn with_headers<H2>(self, headers: H2) -> RequestDescriptor<P, H2, R> {
        RequestDescriptor {
            method: self.method,
            path: self.path,
            encoding: self.encoding,
            parameters: self.parameters,
            headers,
            response: PhantomData,
        }
    }

    /// Change the response shape.
    pub fn expecting<R2>(self) -> RequestDescriptor<P, H, R2> {
        RequestDescriptor {
            method: self.method,
            path: self.path,
            encoding: self.encoding,
            parameters: self.parameters,
            headers: self.headers,
            response: PhantomData,
        }
    }

    /// Override the method-derived encoding. Multipart must be chosen here.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
            .unwrap_or_else(|| self.method.default_encoding())
    }

    pub fn parameters(&self) -> &P {
        &self.parameters
    }

    pub fn headers(&self) -> &H {
        &self.headers
    }
}

impl<P: Clone, H: Clone, R> Clone for RequestDescriptor<P, H, R> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            encoding: self.encoding,
            parameters: self.parameters.clone(),
            headers: self.headers.clone(),
            response: PhantomData,
        }
    }
}

impl<P: std::fmt::Debug, H: std::fmt::Debug, R> std::fmt::Debug for RequestDescriptor<P, H, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("encoding", &self.encoding())
            .field("parameters", &self.parameters)
            .field("headers", &self.headers)
            .field("response", &std::any::type_name::<R>())
            .finish()
    }
}
