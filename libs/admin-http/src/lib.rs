#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the menu admin request gateway
//!
//! A hyper-based client with:
//! - TLS via rustls (HTTPS only unless insecure HTTP is enabled)
//! - Connection pooling
//! - A per-request deadline covering both the exchange and the body read
//! - Caller-driven cancellation through a `CancellationToken`
//! - Default headers (User-Agent) that never override per-request values
//! - Transparent response decompression (gzip, brotli, deflate)
//! - Typed error categories via [`HttpError::kind`]
//!
//! # Example
//!
//! ```ignore
//! use admin_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let body = client
//!     .get("https://admin.example.com/nest/menu/tree")
//!     .query(&[("rootId", "1")])
//!     .send()
//!     .await?
//!     .checked_bytes()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod guard;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT, HttpClientConfig,
    TlsRootConfig, TransportSecurity,
};
pub use error::{ErrorKind, HttpError, InvalidUriKind};
pub use guard::RequestGuard;
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};

pub use http::{Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
