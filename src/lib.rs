//! # wirecall - a configured HTTP client with typed request templating
//!
//! wirecall composes a production `reqwest` transport from typed
//! configuration records (timeouts, pool sizing, TLS trust, static headers,
//! gzip, retries) and layers a thin request template on top: URL building,
//! header and JSON body attachment, an ordered interceptor chain,
//! synchronous and asynchronous execution, and decoding into typed results.
//!
//! The transport machinery - connection pooling, TLS handshakes, redirects,
//! HTTP/2 multiplexing - belongs to `reqwest`. This crate only configures
//! it, transforms requests on the way in, and maps responses on the way out.
//!
//! ## Quick start
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//! use wirecall::config::RetryConfig;
//! use wirecall::Client;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! #[derive(Deserialize, Default)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> wirecall::Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .retry(RetryConfig {
//!             max_retries: 3,
//!             interval: Duration::from_millis(250),
//!         })
//!         .default_header("x-api-key", "secret")?
//!         .build()?;
//!
//!     // Typed GET; non-2xx and decode failures are errors.
//!     let user = client.get::<User>("/users/42").await?;
//!     println!("{} in {:?}", user.data.name, user.latency);
//!
//!     // Null fields are omitted from the encoded body.
//!     let created: wirecall::Response<User> = client
//!         .post("/users", &CreateUser {
//!             name: "Ann".to_string(),
//!             email: None,
//!         })
//!         .await?;
//!     println!("created {}", created.data.id);
//!
//!     // Fail-soft variant: swallow failures, return the default value.
//!     let user: User = client.get_or_default("/users/43").await;
//!     println!("{}", user.name);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Asynchronous dispatch
//!
//! [`Client::dispatch`] issues a call without blocking the caller and hands
//! back a [`CallHandle`] that resolves exactly once, to the response or the
//! failure. Handles can be aborted; an aborted call resolves to
//! [`Error::Cancelled`] and never delivers a response.
//!
//! ## Interceptors
//!
//! Requests pass through two ordered chains before dispatch: application
//! interceptors first, then network interceptors. The built-in
//! [`HeaderInterceptor`](interceptor::HeaderInterceptor),
//! [`GzipInterceptor`](interceptor::GzipInterceptor), and
//! [`LoggingInterceptor`](interceptor::LoggingInterceptor) are wired up
//! automatically from their configuration records; custom [`Interceptor`]
//! implementations slot in through the builder.
//!
//! ## Failure semantics
//!
//! The core surface is fail-fast: transport, HTTP-status, and decode
//! failures all come back as distinct [`Error`] variants, with raw response
//! bodies preserved. The `*_or_default` helpers provide the opposite
//! contract - log the failure and return `Default::default()` - for callers
//! that prefer an empty record to an error path.

pub mod blocking;
mod client;
pub mod config;
mod error;
pub mod interceptor;
mod request;
mod response;
pub mod retry;

pub use client::{CallHandle, Client, ClientBuilder};
pub use error::{Error, Result};
pub use interceptor::{Interceptor, RequestParts};
pub use request::{build_url, encode_json_body, RequestSpec, APPLICATION_JSON_UTF8};
pub use response::{RawResponse, Response};
pub use retry::{RetryPredicate, RetryStrategy};
