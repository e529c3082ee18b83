//! Client composition and the request/response template.
//!
//! [`ClientBuilder`] gathers the configuration records and optional
//! collaborators into one [`Client`]; the client turns [`RequestSpec`]s into
//! executed calls with interceptors, retries, and typed decoding. Pooling,
//! TLS, and redirect handling are delegated to the underlying `reqwest`
//! transport.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::cookie::CookieStore;
use reqwest::dns::{Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, GzipConfig, HeaderConfig, PoolConfig, RetryConfig, TlsConfig};
use crate::interceptor::{
    GzipInterceptor, HeaderInterceptor, Interceptor, LoggingInterceptor, RequestParts,
};
use crate::request::{self, RequestSpec, APPLICATION_JSON_UTF8};
use crate::response::{RawResponse, Response};
use crate::retry::{RetryOnRetryable, RetryOnStatus, RetryPredicate, RetryStrategy};
use crate::{Error, Result};

/// A configured HTTP client with an interceptor chain and typed JSON
/// request templating.
///
/// The client is long-lived and cheap to clone; all clones share one
/// connection pool and dispatcher. It is safe to use from any number of
/// tasks or threads without external locking. Configuration is read-only
/// after [`ClientBuilder::build`].
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
/// let user = client.get::<User>("/users/42").await?;
/// println!("{} ({} attempts)", user.data.name, user.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Option<String>,
    app_interceptors: Vec<Arc<dyn Interceptor>>,
    net_interceptors: Vec<Arc<dyn Interceptor>>,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    dispatcher: Semaphore,
}

impl Client {
    /// Creates a [`ClientBuilder`] with default configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Executes a typed request: URL construction, interceptors, retries,
    /// and JSON decoding.
    ///
    /// This is the full template; the method helpers below are shorthands
    /// over it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] when base + path + query does not parse,
    /// [`Error::Http`] for non-2xx responses, [`Error::Decode`] when a 2xx
    /// body does not match `Res`, and transport variants for network-level
    /// failures that survive the retry budget.
    pub async fn call<Req, Res>(
        &self,
        spec: RequestSpec,
        body: Option<&Req>,
    ) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let encoded = body.map(|b| request::encode_json_body(b)).transpose()?;
        self.call_encoded(spec, encoded).await
    }

    async fn call_encoded<Res>(
        &self,
        spec: RequestSpec,
        body: Option<Vec<u8>>,
    ) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let parts = self.prepare(&spec, body)?;
        self.run(parts).await?.into_typed()
    }

    /// Executes a request and returns the raw response regardless of HTTP
    /// status. Only URL construction and transport-level failures are
    /// errors here; a 500 comes back as an `Ok` raw response.
    ///
    /// Retryable statuses still consume the retry budget before the final
    /// response is returned.
    pub async fn execute<Req>(&self, spec: RequestSpec, body: Option<&Req>) -> Result<RawResponse>
    where
        Req: Serialize,
    {
        let encoded = body.map(|b| request::encode_json_body(b)).transpose()?;
        let parts = self.prepare(&spec, encoded)?;
        self.run(parts).await
    }

    /// Issues a request without blocking the caller.
    ///
    /// The call runs as its own task on the current runtime; the returned
    /// [`CallHandle`] resolves exactly once, to either the response or the
    /// failure. Completions of concurrently dispatched calls are unordered.
    /// Cancellation is the caller's job via [`CallHandle::abort`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn dispatch<Req, Res>(&self, spec: RequestSpec, body: Option<&Req>) -> CallHandle<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned + Send + 'static,
    {
        // Encode eagerly so the body type need not be 'static.
        let encoded = body.map(|b| request::encode_json_body(b)).transpose();
        let client = self.clone();
        let handle = tokio::spawn(async move { client.call_encoded(spec, encoded?).await });
        CallHandle { handle }
    }

    /// Makes a GET request.
    pub async fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.call::<(), Res>(RequestSpec::new(Method::GET, path), None)
            .await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::POST, path), Some(body))
            .await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::PUT, path), Some(body))
            .await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<Req, Res>(
        &self,
        path: impl Into<String>,
        body: &Req,
    ) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.call(RequestSpec::new(Method::PATCH, path), Some(body))
            .await
    }

    /// Makes a DELETE request.
    pub async fn delete<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.call::<(), Res>(RequestSpec::new(Method::DELETE, path), None)
            .await
    }

    /// Makes a GET request, returning `Res::default()` on any failure.
    ///
    /// The failure is logged at error level rather than surfaced, so callers
    /// cannot distinguish an empty result from a failed call. Prefer
    /// [`Client::get`] unless that trade-off is deliberate.
    pub async fn get_or_default<Res>(&self, path: impl Into<String>) -> Res
    where
        Res: DeserializeOwned + Default,
    {
        self.or_default(self.get::<Res>(path).await)
    }

    /// Makes a POST request, returning `Res::default()` on any failure.
    ///
    /// Same swallow-and-default contract as [`Client::get_or_default`].
    pub async fn post_or_default<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Res
    where
        Req: Serialize,
        Res: DeserializeOwned + Default,
    {
        self.or_default(self.post::<Req, Res>(path, body).await)
    }

    fn or_default<Res: Default>(&self, result: Result<Response<Res>>) -> Res {
        match result {
            Ok(response) => response.data,
            Err(e) => {
                tracing::error!(error = %e, "request failed, returning default value");
                Res::default()
            }
        }
    }

    /// Builds the final request parts: URL, content type, then the
    /// application and network interceptor chains in registration order.
    fn prepare(&self, spec: &RequestSpec, body: Option<Vec<u8>>) -> Result<RequestParts> {
        spec.validate_body(body.is_some())?;
        let url = spec.build_url(self.inner.base_url.as_deref())?;

        let mut headers = spec.headers.clone();
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON_UTF8));
        }

        let mut parts = RequestParts {
            method: spec.method.clone(),
            url,
            headers,
            body,
        };
        for interceptor in self
            .inner
            .app_interceptors
            .iter()
            .chain(self.inner.net_interceptors.iter())
        {
            interceptor.intercept(&mut parts)?;
        }
        Ok(parts)
    }

    /// The retry loop around single attempts. Non-2xx responses are handed
    /// to the retry predicate; the final response is returned raw either
    /// way. Transport failures propagate once the budget is spent.
    async fn run(&self, parts: RequestParts) -> Result<RawResponse> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt(&parts).await {
                Ok(raw) => {
                    let latency = start.elapsed();
                    if raw.0.is_success() {
                        tracing::info!(
                            status = raw.0.as_u16(),
                            latency_ms = latency.as_millis() as u64,
                            attempts = attempt,
                            method = %parts.method,
                            url = %parts.url,
                            "request succeeded"
                        );
                        return Ok(RawResponse {
                            status: raw.0,
                            headers: raw.1,
                            body: raw.2,
                            latency,
                            attempts: attempt,
                        });
                    }

                    tracing::error!(
                        status = raw.0.as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        attempt = attempt,
                        method = %parts.method,
                        url = %parts.url,
                        "request failed"
                    );

                    let error = Error::Http {
                        status: raw.0,
                        raw_response: raw.2.clone(),
                        headers: raw.1.clone(),
                    };
                    if self.inner.retry_predicate.should_retry(&error, attempt) {
                        if let Some(delay) = self.inner.retry_strategy.delay_for_attempt(attempt) {
                            tracing::info!(
                                delay_ms = delay.as_millis() as u64,
                                attempt = attempt,
                                "retrying request after delay"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    return Ok(RawResponse {
                        status: raw.0,
                        headers: raw.1,
                        body: raw.2,
                        latency: start.elapsed(),
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    tracing::error!(
                        error = %error,
                        latency_ms = start.elapsed().as_millis() as u64,
                        attempt = attempt,
                        method = %parts.method,
                        url = %parts.url,
                        "transport failure"
                    );

                    if !self.inner.retry_predicate.should_retry(&error, attempt) {
                        return Err(error);
                    }
                    match self.inner.retry_strategy.delay_for_attempt(attempt) {
                        Some(delay) => {
                            tracing::info!(
                                delay_ms = delay.as_millis() as u64,
                                attempt = attempt,
                                "retrying request after delay"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(Error::RetriesExhausted {
                                attempts: attempt,
                                last_error: Box::new(error),
                            })
                        }
                    }
                }
            }
        }
    }

    /// One wire attempt, gated by the dispatcher permit.
    async fn attempt(
        &self,
        parts: &RequestParts,
    ) -> Result<(http::StatusCode, HeaderMap, String)> {
        let _permit = self
            .inner
            .dispatcher
            .acquire()
            .await
            .map_err(|_| Error::Config("dispatcher closed".to_string()))?;

        tracing::debug!(method = %parts.method, url = %parts.url, "executing request");

        let mut request = self
            .inner
            .http
            .request(parts.method.clone(), parts.url.clone())
            .headers(parts.headers.clone());
        if let Some(body) = &parts.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(map_transport_error)?;
        Ok((status, headers, body))
    }
}

fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}

/// Handle to a call issued with [`Client::dispatch`].
///
/// Exactly one of success or failure is observable through
/// [`CallHandle::join`]; an aborted call resolves to [`Error::Cancelled`].
pub struct CallHandle<T> {
    handle: JoinHandle<Result<Response<T>>>,
}

impl<T> CallHandle<T> {
    /// Cancels the call. If it has not completed yet, [`CallHandle::join`]
    /// resolves to [`Error::Cancelled`] and no response is delivered.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the call has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the call's single completion.
    pub async fn join(self) -> Result<Response<T>> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Builder assembling configuration records and optional collaborators into
/// a [`Client`].
///
/// Every collaborator is optional: a supplied one is used as-is, otherwise a
/// documented default applies (system DNS, no proxy, verified TLS, no
/// interceptors, no retries). Building performs no network I/O.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use wirecall::config::{PoolConfig, RetryConfig};
///
/// # fn example() -> wirecall::Result<()> {
/// let client = wirecall::ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .pool(PoolConfig {
///         max_idle_per_host: 10,
///         ..Default::default()
///     })
///     .retry(RetryConfig {
///         max_retries: 3,
///         interval: Duration::from_millis(250),
///     })
///     .default_header("x-api-key", "secret")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    pool: PoolConfig,
    tls: TlsConfig,
    gzip: GzipConfig,
    static_headers: HeaderConfig,
    retry: RetryConfig,
    base_url: Option<String>,
    default_headers: HeaderMap,
    app_interceptors: Vec<Arc<dyn Interceptor>>,
    net_interceptors: Vec<Arc<dyn Interceptor>>,
    retry_strategy: Option<RetryStrategy>,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    http_client: Option<reqwest::Client>,
    proxy: Option<reqwest::Proxy>,
    dns_resolver: Option<Arc<dyn Resolve>>,
    cookie_store: Option<Arc<dyn CookieStore>>,
    trusted_roots: Vec<reqwest::Certificate>,
}

impl ClientBuilder {
    /// Creates a builder with every record at its default.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            pool: PoolConfig::default(),
            tls: TlsConfig::default(),
            gzip: GzipConfig::default(),
            static_headers: HeaderConfig::default(),
            retry: RetryConfig::default(),
            base_url: None,
            default_headers: HeaderMap::new(),
            app_interceptors: Vec::new(),
            net_interceptors: Vec::new(),
            retry_strategy: None,
            retry_predicate: None,
            http_client: None,
            proxy: None,
            dns_resolver: None,
            cookie_store: None,
            trusted_roots: Vec::new(),
        }
    }

    /// Sets the base URL request paths are resolved against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        url::Url::parse(url.as_ref())?;
        self.base_url = Some(url.as_ref().to_string());
        Ok(self)
    }

    /// Sets the transport configuration record.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the pool and dispatcher sizing record.
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the TLS trust record.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the request-body gzip record. When enabled, a
    /// [`GzipInterceptor`] is appended after user application interceptors.
    pub fn gzip(mut self, gzip: GzipConfig) -> Self {
        self.gzip = gzip;
        self
    }

    /// Sets static headers injected into every request. When non-empty, a
    /// [`HeaderInterceptor`] runs before all other interceptors.
    pub fn static_headers(mut self, headers: HeaderConfig) -> Self {
        self.static_headers = headers;
        self
    }

    /// Sets the fixed-interval retry record. Ignored when an explicit
    /// [`ClientBuilder::retry_strategy`] is installed.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Adds a default header applied by the transport to every request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Config(format!("invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Config(format!("invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Appends an application-level interceptor. Application interceptors
    /// run in registration order, before network interceptors.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.app_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends a network-level interceptor: it sees the request after all
    /// application interceptors, in its final wire form.
    pub fn network_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.net_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Sets the retry strategy, overriding the [`RetryConfig`] record.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Sets a custom retry predicate. The default retries what
    /// [`Error::is_retryable`] allows, narrowed to HTTP statuses when
    /// `retry_on_connection_failure` is off.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Supplies a pre-built transport, skipping composition entirely. The
    /// config, pool, and TLS records are ignored when this is set.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Routes all requests through the given proxy.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Overrides DNS resolution. Defaults to the system resolver.
    pub fn dns_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.dns_resolver = Some(resolver);
        self
    }

    /// Installs a cookie jar. Without one, cookies are neither stored nor
    /// sent.
    pub fn cookie_store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.cookie_store = Some(store);
        self
    }

    /// Adds a trusted root certificate on top of the platform trust store.
    pub fn add_root_certificate(mut self, certificate: reqwest::Certificate) -> Self {
        self.trusted_roots.push(certificate);
        self
    }

    /// Composes the client. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the transport rejects the combined
    /// settings or a static header is invalid.
    pub fn build(self) -> Result<Client> {
        let ClientBuilder {
            config,
            pool,
            tls,
            gzip,
            static_headers,
            retry,
            base_url,
            default_headers,
            app_interceptors: user_app,
            net_interceptors: user_net,
            retry_strategy,
            retry_predicate,
            http_client,
            proxy,
            dns_resolver,
            cookie_store,
            trusted_roots,
        } = self;

        let http = match http_client {
            Some(client) => client,
            None => compose_transport(
                &config,
                &pool,
                &tls,
                default_headers,
                proxy,
                dns_resolver,
                cookie_store,
                trusted_roots,
            )?,
        };

        // Header injection first, then user interceptors, then gzip, so
        // later stages see the final logical headers.
        let mut app_interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        if !static_headers.is_empty() {
            app_interceptors.push(Arc::new(HeaderInterceptor::from_config(&static_headers)?));
        }
        app_interceptors.extend(user_app);
        if gzip.enabled {
            app_interceptors.push(Arc::new(GzipInterceptor::from_config(&gzip)));
        }

        // Logging goes on both chains: the application view before other
        // stages and the final wire form after them.
        let mut net_interceptors = user_net;
        if config.log_requests {
            app_interceptors.push(Arc::new(LoggingInterceptor));
            net_interceptors.push(Arc::new(LoggingInterceptor));
        }

        let retry_strategy = retry_strategy.unwrap_or_else(|| retry.strategy());
        let retry_predicate = retry_predicate.unwrap_or_else(|| {
            if config.retry_on_connection_failure {
                Box::new(RetryOnRetryable)
            } else {
                Box::new(RetryOnStatus)
            }
        });

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                app_interceptors,
                net_interceptors,
                retry_strategy,
                retry_predicate,
                dispatcher: Semaphore::new(pool.effective_max_requests()),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn compose_transport(
    config: &ClientConfig,
    pool: &PoolConfig,
    tls: &TlsConfig,
    default_headers: HeaderMap,
    proxy: Option<reqwest::Proxy>,
    dns_resolver: Option<Arc<dyn Resolve>>,
    cookie_store: Option<Arc<dyn CookieStore>>,
    trusted_roots: Vec<reqwest::Certificate>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .timeout(config.call_timeout)
        .tcp_keepalive(config.tcp_keepalive)
        .user_agent(config.user_agent.clone())
        .default_headers(default_headers)
        .pool_max_idle_per_host(pool.effective_max_idle_per_host())
        .pool_idle_timeout(pool.idle_timeout)
        .gzip(true);

    builder = if config.follow_redirects {
        builder.redirect(Policy::limited(config.max_redirects))
    } else {
        builder.redirect(Policy::none())
    };

    if config.http2_prior_knowledge {
        builder = builder.http2_prior_knowledge();
    }

    if tls.enabled {
        builder = builder.min_tls_version(tls.min_protocol.into());
        for certificate in trusted_roots {
            builder = builder.add_root_certificate(certificate);
        }
        if !tls.verify {
            tracing::warn!(
                "TLS certificate verification disabled; only use against trusted development endpoints"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }
    if let Some(resolver) = dns_resolver {
        builder = builder.dns_resolver(Arc::new(DnsOverride(resolver)));
    }
    if let Some(store) = cookie_store {
        builder = builder.cookie_provider(Arc::new(CookieJarOverride(store)));
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("failed to compose transport: {e}")))
}

/// Adapter so a caller-supplied resolver can be stored as a trait object.
struct DnsOverride(Arc<dyn Resolve>);

impl Resolve for DnsOverride {
    fn resolve(&self, name: Name) -> Resolving {
        self.0.resolve(name)
    }
}

/// Same adapter pattern for caller-supplied cookie jars.
struct CookieJarOverride(Arc<dyn CookieStore>);

impl CookieStore for CookieJarOverride {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &url::Url) {
        self.0.set_cookies(cookie_headers, url)
    }

    fn cookies(&self, url: &url::Url) -> Option<HeaderValue> {
        self.0.cookies(url)
    }
}
