//! Turns a descriptor and its endpoint into a [`TransportRequest`].

use netkit_value::map_to_json;
use serde::Serialize;
use tracing::debug;

use crate::codec::{encode_merged, encode_merged_headers, encode_parameters, flatten};
use crate::endpoint::EndpointConfig;
use crate::error::LocalError;
use crate::multipart::MultipartEncoder;
use crate::request::RequestDescriptor;
use crate::types::{Encoding, TransportRequest};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Build the wire request.
///
/// Request-scoped parameters and headers win over the endpoint's persistent
/// ones; header names are compared without regard to ASCII case. Multipart bodies are built from the request parameters alone, and
/// their `Content-Type` and `Content-Length` always describe the body. The
/// URL is composed here but only validated at dispatch.
pub fn build<P, H, R, EP, EH, E>(
    descriptor: &RequestDescriptor<P, H, R>,
    endpoint: &EndpointConfig<EP, EH, E>,
) -> Result<TransportRequest, LocalError>
where
    P: Serialize,
    H: Serialize,
    EP: Serialize,
    EH: Serialize,
{
    let mut url = join_url(endpoint.base_url(), descriptor.path());
    let mut body = None;
    let mut boundary = None;
    let mut body_headers = Vec::new();

    // Parameters before headers: when both fail, the parameter error wins.
    match descriptor.encoding() {
        Encoding::Url => {
            let merged =
                encode_merged(descriptor.parameters(), endpoint.persistent_parameters())?;
            let pairs = flatten(&merged)?;
            if !pairs.is_empty() {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
        }
        Encoding::Json => {
            let merged =
                encode_merged(descriptor.parameters(), endpoint.persistent_parameters())?;
            let json = serde_json::Value::Object(map_to_json(merged)?);
            let bytes = endpoint.codec().encode(&json).map_err(LocalError::encoding)?;
            body = Some(bytes.into());
        }
        Encoding::Multipart => {
            let record = encode_parameters(descriptor.parameters())?;
            let multipart = MultipartEncoder::new().encode(&record)?;
            body_headers.push((CONTENT_TYPE, multipart.content_type()));
            body_headers.push((CONTENT_LENGTH, multipart.len().to_string()));
            boundary = Some(multipart.boundary);
            body = Some(multipart.bytes);
        }
    }

    let merged_headers =
        encode_merged_headers(descriptor.headers(), endpoint.persistent_headers())?;
    let mut headers = Vec::new();
    for (name, value) in flatten(&merged_headers)? {
        set_header(&mut headers, name, value);
    }
    if descriptor.encoding() == Encoding::Json && header_value(&headers, CONTENT_TYPE).is_none() {
        set_header(&mut headers, CONTENT_TYPE, "application/json");
    }
    for (name, value) in body_headers {
        set_header(&mut headers, name, value);
    }

    let request = TransportRequest {
        method: descriptor.method(),
        url,
        headers,
        body,
        boundary,
    };
    debug!(
        method = %request.method,
        url = %request.url,
        headers = request.headers.len(),
        body_len = request.body.as_ref().map(|b| b.len()),
        "built request"
    );
    Ok(request)
}

/// Join a base address and a relative path with exactly one `/`.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Set a header, replacing any existing one with the same name in any case.
fn set_header(headers: &mut Vec<(String, String)>, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
    {
        Some(slot) => *slot = (name, value),
        None => headers.push((name, value)),
    }
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
