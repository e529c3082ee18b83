//! Error types for the client and request template.
//!
//! Transport, HTTP-status, and decode failures are all distinct variants so
//! callers can decide per call whether to propagate, retry, or fall back to a
//! default value. Variants that carry a response preserve the raw body for
//! debugging.

use http::{HeaderMap, StatusCode};

/// The error type for all client operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level failure: connection refused, DNS lookup failed,
    /// connection reset mid-body, and so on.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request exceeded a configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The joined base + path + query string did not parse as a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request itself was malformed: a body on GET/HEAD, an invalid
    /// header name or value, and similar construction-time mistakes.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a non-2xx status.
    #[error("http error {status}: {raw_response}")]
    Http {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body.
        raw_response: String,
        /// The response headers.
        headers: HeaderMap,
    },

    /// A 2xx response body did not deserialize into the requested type.
    ///
    /// The raw body is preserved so the mismatch can be diagnosed without
    /// re-issuing the request.
    #[error("failed to decode response (status {status}): {serde_error}")]
    Decode {
        /// The raw response body that failed to decode.
        raw_response: String,
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The request body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(String),

    /// The client or a collaborator was misconfigured.
    #[error("configuration error: {0}")]
    Config(String),

    /// A retryable failure persisted past the configured retry budget.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total attempts made, including the initial one.
        attempts: usize,
        /// The last failure observed before giving up.
        last_error: Box<Error>,
    },

    /// An asynchronous call was cancelled via its handle before completing.
    #[error("call cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if retrying the request might succeed.
    ///
    /// Network failures, timeouts, 5xx statuses, and 429 are retryable.
    /// Client errors, decode failures, and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout => true,
            Error::Http { status, .. } => status.is_server_error() || status.as_u16() == 429,
            _ => false,
        }
    }

    /// Returns the HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body, if this error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Http { raw_response, .. } => Some(raw_response),
            Error::Decode { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: StatusCode) -> Error {
        Error::Http {
            status,
            raw_response: String::new(),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(http_error(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(http_error(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(http_error(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!http_error(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!http_error(StatusCode::NOT_FOUND).is_retryable());
    }

    #[test]
    fn non_http_retryability() {
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::Config("bad".to_string()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::Decode {
            raw_response: "not json".to_string(),
            serde_error: "expected value".to_string(),
            status: StatusCode::OK,
        }
        .is_retryable());
    }

    #[test]
    fn status_accessor() {
        assert_eq!(
            http_error(StatusCode::BAD_GATEWAY).status(),
            Some(StatusCode::BAD_GATEWAY)
        );
        assert_eq!(Error::Timeout.status(), None);
    }
}
