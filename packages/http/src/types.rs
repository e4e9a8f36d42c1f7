use bytes::Bytes;
use url::Url;

/// HTTP method for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
        }
    }

    /// Encoding used when a descriptor doesn't pick one explicitly.
    pub fn default_encoding(&self) -> Encoding {
        match self {
            Method::GET | Method::DELETE | Method::HEAD => Encoding::Url,
            Method::POST | Method::PUT => Encoding::Json,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
            Method::HEAD => http::Method::HEAD,
        }
    }
}

/// How merged parameters are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Query items appended to the URL, no body.
    Url,
    /// A JSON object body.
    Json,
    /// A multipart/form-data body built from the request parameters only.
    Multipart,
}

/// A fully resolved request, ready for a [`Transport`](crate::Transport).
///
/// Built by [`build`](crate::build). The URL is composed but not validated;
/// the dispatcher checks it right before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,

    /// Absolute URL including the query string.
    pub url: String,

    /// Header pairs, unique by case-insensitive name.
    pub headers: Vec<(String, String)>,

    pub body: Option<Bytes>,

    /// Boundary token when the body is multipart/form-data.
    pub boundary: Option<String>,
}

impl TransportRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query items, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.url.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// URL without the query string.
    pub fn url_without_query(&self) -> &str {
        match self.url.split_once('?') {
            Some((base, _)) => base,
            None => &self.url,
        }
    }

    pub fn parse_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)
    }
}

/// What a transport hands back for one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code. `None` when the exchange produced no HTTP envelope.
    pub status: Option<u16>,

    pub headers: Vec<(String, String)>,

    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status: Some(status),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A response that carries bytes but no status code.
    pub fn without_status(body: impl Into<Bytes>) -> Self {
        Self {
            status: None,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
