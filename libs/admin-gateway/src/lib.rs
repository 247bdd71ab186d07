#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Request gateway for the menu admin API
//!
//! Every call resolves to a `{ code, msg, data }` [`Envelope`]:
//! - JSON responses are returned as the backend sent them
//! - `arraybuffer` / `blob` responses become `{code: 1, data: <body>}`
//! - transport failures become `{code: -1, msg: <error>, data: {}}`
//!
//! Only a cancelled call returns an error ([`GatewayError::Cancelled`]).
//! Export mode hands back the raw [`admin_http::HttpResponse`] instead.
//!
//! # Example
//!
//! ```ignore
//! use admin_gateway::{GatewayConfig, RequestGateway, RequestMethod, RequestOptions};
//! use serde_json::json;
//!
//! let gateway = RequestGateway::from_config(&GatewayConfig::default())?;
//! let envelope = gateway
//!     .envelope(RequestMethod::Get, "/menu/tree", Some(&json!({})), RequestOptions::default())
//!     .await?;
//! ```

mod base_url;
mod config;
mod envelope;
mod error;
mod gateway;
pub mod json_util;
mod method;
mod notify;
mod options;
mod query;

pub use base_url::{BaseUrlPolicy, Environment, is_local_host};
pub use config::{GatewayConfig, TlsRoots};
pub use envelope::{
    BINARY_SUCCESS_CODE, Envelope, EnvelopeData, EnvelopeError, FAILURE_CODE, SUCCESS_CODE,
};
pub use error::{FailureClass, GatewayBuildError, GatewayError, classify};
pub use gateway::{CONTENT_MODE_HEADER, Reply, RequestGateway};
pub use method::RequestMethod;
pub use notify::{TracingNotifier, WarningNotifier};
pub use options::{RequestOptions, ResponseType};

pub use admin_http::HttpResponse;
pub use tokio_util::sync::CancellationToken;
