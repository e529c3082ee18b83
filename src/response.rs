//! Response types: the raw wire result and its typed decoding.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{Error, Result};

/// An executed response before any typed decoding: status, headers, and the
/// body as text, plus timing metadata.
///
/// Returned by [`Client::execute`](crate::Client::execute) for callers that
/// want the wire result regardless of status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body as text.
    pub body: String,

    /// Total elapsed time, including all retry attempts.
    pub latency: Duration,

    /// Attempts made, including the initial one.
    pub attempts: usize,
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] for non-2xx statuses and [`Error::Decode`]
    /// when a 2xx body does not parse as `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Response<T>> {
        if !self.status.is_success() {
            return Err(Error::Http {
                status: self.status,
                raw_response: self.body,
                headers: self.headers,
            });
        }
        match serde_json::from_str::<T>(&self.body) {
            Ok(data) => Ok(Response {
                data,
                raw_body: self.body,
                status: self.status,
                headers: self.headers,
                latency: self.latency,
                attempts: self.attempts,
            }),
            Err(e) => Err(Error::Decode {
                serde_error: e.to_string(),
                raw_response: self.body,
                status: self.status,
            }),
        }
    }

    /// Decodes the body into `T`, falling back to `T::default()` on a
    /// non-2xx status or a parse failure. The failure is logged, not
    /// surfaced.
    ///
    /// This mirrors APIs that would rather hand back an empty record than an
    /// error; prefer [`RawResponse::into_typed`] when the caller should see
    /// the failure.
    pub fn decode_or_default<T: DeserializeOwned + Default>(self) -> T {
        match self.into_typed::<T>() {
            Ok(response) => response.data,
            Err(e) => {
                tracing::error!(error = %e, "decode failed, returning default value");
                T::default()
            }
        }
    }
}

/// A successfully decoded HTTP response.
///
/// Wraps the decoded value together with the transaction metadata: status,
/// headers, raw body, total latency, and attempt count.
///
/// # Examples
///
/// ```no_run
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> wirecall::Result<()> {
/// let client = wirecall::Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let response = client.get::<User>("/users/42").await?;
/// println!("{} in {:?}", response.data.name, response.latency);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body the data was decoded from.
    pub raw_body: String,

    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Total elapsed time, including all retry attempts.
    pub latency: Duration,

    /// Attempts made, including the initial one.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Transforms the decoded data, keeping the transaction metadata.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if completing this request took more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct User {
        #[serde(default)]
        id: u64,
        #[serde(default)]
        name: String,
    }

    fn raw(status: StatusCode, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
            latency: Duration::from_millis(5),
            attempts: 1,
        }
    }

    #[test]
    fn success_body_decodes_exactly() {
        let response = raw(StatusCode::OK, r#"{"id":42,"name":"Ann"}"#)
            .into_typed::<User>()
            .unwrap();
        assert_eq!(
            response.data,
            User {
                id: 42,
                name: "Ann".to_string()
            }
        );
        assert_eq!(response.raw_body, r#"{"id":42,"name":"Ann"}"#);
    }

    #[test]
    fn non_success_becomes_http_error() {
        let result = raw(StatusCode::INTERNAL_SERVER_ERROR, "boom").into_typed::<User>();
        match result {
            Err(Error::Http {
                status,
                raw_response,
                ..
            }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(raw_response, "boom");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn bad_body_becomes_decode_error() {
        let result = raw(StatusCode::OK, "not json").into_typed::<User>();
        assert!(matches!(result, Err(Error::Decode { status, .. }) if status == StatusCode::OK));
    }

    #[test]
    fn decode_or_default_swallows_failures() {
        let user: User = raw(StatusCode::INTERNAL_SERVER_ERROR, "boom").decode_or_default();
        assert_eq!(user, User::default());

        let user: User = raw(StatusCode::OK, "not json").decode_or_default();
        assert_eq!(user, User::default());

        let user: User = raw(StatusCode::OK, r#"{"id":1,"name":"Ann"}"#).decode_or_default();
        assert_eq!(user.id, 1);
    }

    #[test]
    fn map_preserves_metadata() {
        let response = raw(StatusCode::OK, r#"{"id":1,"name":"Ann"}"#)
            .into_typed::<User>()
            .unwrap();
        let mapped = response.map(|user| user.name);
        assert_eq!(mapped.data, "Ann");
        assert_eq!(mapped.status, StatusCode::OK);
        assert_eq!(mapped.attempts, 1);
    }
}
