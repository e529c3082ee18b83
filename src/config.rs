//! Typed configuration records for client composition.
//!
//! Each record is a plain data holder populated externally (a config file,
//! environment layer, or hand-written literals) and consumed once by
//! [`ClientBuilder::build`](crate::ClientBuilder::build). Nothing here is
//! mutated after the client exists.
//!
//! All records derive `Deserialize` with per-field defaults, so a partial
//! config source fills in only what it cares about.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::retry::RetryStrategy;

/// Floor for the dispatcher-wide in-flight request cap.
pub const MAX_REQUESTS_FLOOR: usize = 64;

/// Floor for the per-host idle connection count.
pub const MAX_IDLE_PER_HOST_FLOOR: usize = 5;

/// Core transport settings: timeouts, redirects, protocol selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,

    /// Maximum time between two reads of the response body.
    pub read_timeout: Duration,

    /// Maximum time for the entire call, from first byte sent to last byte
    /// received, across a single attempt.
    pub call_timeout: Duration,

    /// TCP keepalive probe interval, or `None` to leave keepalive off.
    pub tcp_keepalive: Option<Duration>,

    /// Whether to follow redirects.
    pub follow_redirects: bool,

    /// Redirect hop limit when `follow_redirects` is on.
    pub max_redirects: usize,

    /// Speak HTTP/2 from the first byte instead of negotiating.
    pub http2_prior_knowledge: bool,

    /// Whether transient connection failures are retried by default.
    ///
    /// When `false` and no explicit retry predicate is installed, only
    /// HTTP-level retryable statuses (5xx, 429) are retried.
    pub retry_on_connection_failure: bool,

    /// Log every outgoing request and its headers at debug level.
    pub log_requests: bool,

    /// The `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(30),
            tcp_keepalive: None,
            follow_redirects: true,
            max_redirects: 10,
            http2_prior_knowledge: false,
            retry_on_connection_failure: true,
            log_requests: false,
            user_agent: concat!("wirecall/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Connection pool and dispatcher sizing.
///
/// The pool itself lives inside the transport; these values are passed
/// through, after clamping pathological inputs up to documented floors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum idle connections kept alive per host.
    pub max_idle_per_host: usize,

    /// How long an idle connection stays in the pool.
    pub idle_timeout: Duration,

    /// Maximum requests in flight across the whole client.
    pub max_requests: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: MAX_IDLE_PER_HOST_FLOOR,
            idle_timeout: Duration::from_secs(90),
            max_requests: MAX_REQUESTS_FLOOR,
        }
    }
}

impl PoolConfig {
    /// The in-flight cap after clamping to [`MAX_REQUESTS_FLOOR`].
    pub fn effective_max_requests(&self) -> usize {
        self.max_requests.max(MAX_REQUESTS_FLOOR)
    }

    /// The per-host idle count after clamping to [`MAX_IDLE_PER_HOST_FLOOR`].
    pub fn effective_max_idle_per_host(&self) -> usize {
        self.max_idle_per_host.max(MAX_IDLE_PER_HOST_FLOOR)
    }
}

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsProtocol {
    /// TLS 1.2 or newer.
    #[default]
    #[serde(rename = "tls1.2", alias = "tls12")]
    Tls12,
    /// TLS 1.3 only.
    #[serde(rename = "tls1.3", alias = "tls13")]
    Tls13,
}

impl From<TlsProtocol> for reqwest::tls::Version {
    fn from(protocol: TlsProtocol) -> Self {
        match protocol {
            TlsProtocol::Tls12 => reqwest::tls::Version::TLS_1_2,
            TlsProtocol::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// TLS trust configuration.
///
/// Certificate verification defaults to on. Turning it off is an explicit,
/// warn-logged opt-in intended for development against self-signed
/// endpoints, never a silent default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Whether the TLS settings below are applied at all.
    pub enabled: bool,

    /// Verify server certificates. Disable only for development.
    pub verify: bool,

    /// Minimum accepted protocol version.
    pub min_protocol: TlsProtocol,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verify: true,
            min_protocol: TlsProtocol::Tls12,
        }
    }
}

/// Static headers injected into every request by the header interceptor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Header name to value. Headers already present on a request win.
    pub headers: HashMap<String, String>,
}

impl HeaderConfig {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Request-body gzip encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GzipConfig {
    /// Whether outgoing bodies are gzip-encoded.
    pub enabled: bool,

    /// Bodies smaller than this many bytes are sent uncompressed.
    pub min_size: usize,
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_size: 1024,
        }
    }
}

/// Fixed-interval retry settings.
///
/// This is the simple count-and-interval shape most config sources want.
/// Richer behavior (backoff, jitter, custom predicates) goes through
/// [`RetryStrategy`] on the builder directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry attempts after the initial one. Zero disables retries.
    pub max_retries: usize,

    /// Delay between attempts.
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            interval: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Converts this record into the strategy the client executes.
    pub fn strategy(&self) -> RetryStrategy {
        if self.max_retries == 0 {
            RetryStrategy::None
        } else {
            RetryStrategy::Fixed {
                interval: self.interval,
                max_retries: self.max_retries,
            }
        }
    }
}
