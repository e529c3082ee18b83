//! Request interceptors: ordered transformers applied before dispatch.
//!
//! The client keeps two chains, application-level and network-level, each
//! run in registration order. Application interceptors see the logical
//! request first; network interceptors run after them and see the request in
//! its final, closest-to-the-wire form.

use flate2::write::GzEncoder;
use flate2::Compression;
use http::header::CONTENT_ENCODING;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::io::Write;
use url::Url;

use crate::config::{GzipConfig, HeaderConfig};
use crate::{Error, Result};

/// The mutable pieces of an outgoing request an interceptor may transform.
#[derive(Debug, Clone)]
pub struct RequestParts {
    /// The HTTP method.
    pub method: Method,

    /// The fully resolved URL, query included.
    pub url: Url,

    /// Request headers accumulated so far.
    pub headers: HeaderMap,

    /// The encoded body, if any.
    pub body: Option<Vec<u8>>,
}

/// A request transformer inserted into the call pipeline.
///
/// Interceptors run in registration order and may rewrite headers, the body,
/// or the URL. Returning an error aborts the call before anything touches
/// the network.
pub trait Interceptor: Send + Sync {
    /// Transforms the request in place.
    fn intercept(&self, parts: &mut RequestParts) -> Result<()>;
}

/// Injects a fixed set of headers into every request.
///
/// Headers already present on the request are left alone, so per-request
/// values always win over configured statics.
pub struct HeaderInterceptor {
    headers: HeaderMap,
}

impl HeaderInterceptor {
    /// Builds the interceptor from a [`HeaderConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any configured name or value is not a
    /// valid HTTP header.
    pub fn from_config(config: &HeaderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::Config(format!("invalid static header name {name:?}: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::Config(format!("invalid static header value: {e}")))?;
            headers.insert(name, value);
        }
        Ok(Self { headers })
    }
}

impl Interceptor for HeaderInterceptor {
    fn intercept(&self, parts: &mut RequestParts) -> Result<()> {
        for (name, value) in &self.headers {
            if !parts.headers.contains_key(name) {
                parts.headers.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// Gzip-encodes request bodies and marks them with `Content-Encoding: gzip`.
///
/// Bodies below the configured minimum size, and requests that already carry
/// a content encoding, pass through untouched.
pub struct GzipInterceptor {
    min_size: usize,
}

impl GzipInterceptor {
    /// Builds the interceptor from a [`GzipConfig`].
    pub fn from_config(config: &GzipConfig) -> Self {
        Self {
            min_size: config.min_size,
        }
    }
}

impl Interceptor for GzipInterceptor {
    fn intercept(&self, parts: &mut RequestParts) -> Result<()> {
        if parts.headers.contains_key(CONTENT_ENCODING) {
            return Ok(());
        }
        let Some(body) = parts.body.take() else {
            return Ok(());
        };
        if body.len() < self.min_size {
            parts.body = Some(body);
            return Ok(());
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        let compressed = encoder
            .write_all(&body)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::Serialization(format!("gzip encoding failed: {e}")))?;
        tracing::debug!(
            original_len = body.len(),
            compressed_len = compressed.len(),
            "gzip-encoded request body"
        );
        parts.body = Some(compressed);
        parts
            .headers
            .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        Ok(())
    }
}

/// Logs each outgoing request at debug level.
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn intercept(&self, parts: &mut RequestParts) -> Result<()> {
        let header_names: Vec<&str> = parts.headers.keys().map(|name| name.as_str()).collect();
        tracing::debug!(
            method = %parts.method,
            url = %parts.url,
            headers = ?header_names,
            body_len = parts.body.as_ref().map(|b| b.len()),
            "outgoing request"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use http::header::CONTENT_TYPE;
    use std::collections::HashMap;
    use std::io::Read;

    fn parts_with_body(body: Option<Vec<u8>>) -> RequestParts {
        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
        }
        RequestParts {
            method: Method::POST,
            url: Url::parse("https://api.example.com/users").unwrap(),
            headers,
            body,
        }
    }

    #[test]
    fn static_headers_injected_without_overwriting() {
        let config = HeaderConfig {
            headers: HashMap::from([
                ("x-tenant".to_string(), "configured".to_string()),
                ("x-trace".to_string(), "abc".to_string()),
            ]),
        };
        let interceptor = HeaderInterceptor::from_config(&config).unwrap();

        let mut parts = parts_with_body(None);
        parts
            .headers
            .insert("x-tenant", HeaderValue::from_static("per-request"));
        interceptor.intercept(&mut parts).unwrap();

        assert_eq!(parts.headers.get("x-tenant").unwrap(), "per-request");
        assert_eq!(parts.headers.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn invalid_static_header_is_a_config_error() {
        let config = HeaderConfig {
            headers: HashMap::from([("bad header".to_string(), "v".to_string())]),
        };
        assert!(matches!(
            HeaderInterceptor::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn gzip_round_trips_large_bodies() {
        let body = vec![b'a'; 4096];
        let mut parts = parts_with_body(Some(body.clone()));
        let interceptor = GzipInterceptor::from_config(&GzipConfig {
            enabled: true,
            min_size: 1024,
        });

        interceptor.intercept(&mut parts).unwrap();

        assert_eq!(parts.headers.get(CONTENT_ENCODING).unwrap(), "gzip");
        let compressed = parts.body.unwrap();
        assert!(compressed.len() < body.len());

        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn gzip_skips_small_bodies() {
        let mut parts = parts_with_body(Some(b"tiny".to_vec()));
        let interceptor = GzipInterceptor::from_config(&GzipConfig::default());

        interceptor.intercept(&mut parts).unwrap();

        assert!(parts.headers.get(CONTENT_ENCODING).is_none());
        assert_eq!(parts.body.unwrap(), b"tiny");
    }

    #[test]
    fn gzip_respects_existing_encoding() {
        let mut parts = parts_with_body(Some(vec![b'a'; 4096]));
        parts
            .headers
            .insert(CONTENT_ENCODING, HeaderValue::from_static("br"));
        let interceptor = GzipInterceptor::from_config(&GzipConfig {
            enabled: true,
            min_size: 0,
        });

        interceptor.intercept(&mut parts).unwrap();

        assert_eq!(parts.headers.get(CONTENT_ENCODING).unwrap(), "br");
        assert_eq!(parts.body.unwrap().len(), 4096);
    }
}
