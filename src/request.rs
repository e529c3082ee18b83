//! Request descriptors and URL/body construction.
//!
//! A [`RequestSpec`] describes one logical request: method, path, headers,
//! and query parameters. The body travels separately through
//! [`Client::call`](crate::Client::call) so it can stay generic over any
//! `Serialize` type.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::{Error, Result};

/// Content type attached to JSON request bodies.
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";

/// Describes a single HTTP request before execution.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP method.
    pub method: Method,

    /// The path, resolved against the client's base URL if one is set,
    /// otherwise a complete URL on its own.
    pub path: String,

    /// Headers for this request. These win over client-level defaults and
    /// interceptor-injected statics.
    pub headers: HeaderMap,

    /// Query parameters, appended to the URL in insertion order.
    pub query: Vec<(String, String)>,
}

impl RequestSpec {
    /// Creates a descriptor with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the name or value is not a valid
    /// HTTP header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::InvalidRequest(format!("invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidRequest(format!("invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter. Setting the same key twice keeps the last
    /// value, so every key appears in the URL exactly once.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.query.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.query.push((key, value));
        }
        self
    }

    /// Adds multiple query parameters in iteration order.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        for (key, value) in params {
            self = self.with_query_param(key, value);
        }
        self
    }

    /// Resolves this descriptor's URL against an optional base.
    pub fn build_url(&self, base: Option<&str>) -> Result<Url> {
        build_url(base, &self.path, &self.query)
    }

    /// Rejects method/body combinations the template refuses to send.
    pub(crate) fn validate_body(&self, has_body: bool) -> Result<()> {
        if has_body && (self.method == Method::GET || self.method == Method::HEAD) {
            return Err(Error::InvalidRequest(format!(
                "{} requests must not carry a body",
                self.method
            )));
        }
        Ok(())
    }
}

/// Joins a base URL and a path with exactly one separating slash, then
/// appends query parameters in order.
///
/// An empty or absent base means `path` must be a complete URL by itself.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the joined string does not parse.
pub fn build_url(base: Option<&str>, path: &str, query: &[(String, String)]) -> Result<Url> {
    let joined = match base {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
        _ => path.to_string(),
    };
    let mut url = Url::parse(&joined)?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Serializes a body to JSON with null object fields omitted, at every
/// nesting level.
pub fn encode_json_body<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    let mut value =
        serde_json::to_value(body).map_err(|e| Error::Serialization(e.to_string()))?;
    prune_nulls(&mut value);
    serde_json::to_vec(&value).map_err(|e| Error::Serialization(e.to_string()))
}

fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                prune_nulls(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                prune_nulls(item);
            }
        }
        _ => {}
    }
}
