//! Tower layers for the HTTP client middleware stack
//!
//! - [`DefaultHeadersLayer`] - fills in headers the request did not set

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
