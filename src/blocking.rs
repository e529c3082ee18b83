//! Synchronous facade over the async client.
//!
//! [`blocking::Client`](Client) owns a private single-threaded runtime and
//! blocks the calling thread until each call completes. It mirrors the async
//! surface minus [`dispatch`](crate::Client::dispatch).
//!
//! Must not be used from inside an async runtime; callers on a runtime
//! should use [`crate::Client`] directly.

use serde::{de::DeserializeOwned, Serialize};

use crate::request::RequestSpec;
use crate::response::{RawResponse, Response};
use crate::{Error, Result};

/// A synchronous client wrapping a configured [`crate::Client`].
///
/// # Examples
///
/// ```no_run
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Health {
///     ok: bool,
/// }
///
/// # fn example() -> wirecall::Result<()> {
/// let client = wirecall::blocking::Client::new(
///     wirecall::Client::builder()
///         .base_url("https://api.example.com")?
///         .build()?,
/// )?;
///
/// let health = client.get::<Health>("/health")?;
/// assert!(health.data.ok);
/// # Ok(())
/// # }
/// ```
pub struct Client {
    inner: crate::Client,
    runtime: tokio::runtime::Runtime,
}

impl Client {
    /// Wraps an async client with a dedicated current-thread runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the runtime cannot be started.
    pub fn new(client: crate::Client) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to start blocking runtime: {e}")))?;
        Ok(Self {
            inner: client,
            runtime,
        })
    }

    /// Blocking [`crate::Client::call`].
    pub fn call<Req, Res>(&self, spec: RequestSpec, body: Option<&Req>) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.call(spec, body))
    }

    /// Blocking [`crate::Client::execute`].
    pub fn execute<Req>(&self, spec: RequestSpec, body: Option<&Req>) -> Result<RawResponse>
    where
        Req: Serialize,
    {
        self.runtime.block_on(self.inner.execute(spec, body))
    }

    /// Blocking [`crate::Client::get`].
    pub fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.get(path))
    }

    /// Blocking [`crate::Client::post`].
    pub fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.post(path, body))
    }

    /// Blocking [`crate::Client::put`].
    pub fn put<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.put(path, body))
    }

    /// Blocking [`crate::Client::patch`].
    pub fn patch<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.patch(path, body))
    }

    /// Blocking [`crate::Client::delete`].
    pub fn delete<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.delete(path))
    }

    /// Blocking [`crate::Client::get_or_default`].
    pub fn get_or_default<Res>(&self, path: impl Into<String>) -> Res
    where
        Res: DeserializeOwned + Default,
    {
        self.runtime.block_on(self.inner.get_or_default(path))
    }

    /// Blocking [`crate::Client::post_or_default`].
    pub fn post_or_default<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Res
    where
        Req: Serialize,
        Res: DeserializeOwned + Default,
    {
        self.runtime.block_on(self.inner.post_or_default(path, body))
    }
}
