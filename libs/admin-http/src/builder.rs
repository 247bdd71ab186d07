use crate::client::{BufferedService, HttpClient};
use crate::config::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use crate::error::HttpError;
use crate::layers::DefaultHeadersLayer;
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::buffer::Buffer;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;

/// Configures and builds an [`HttpClient`].
///
/// Every setter overwrites one field of the underlying [`HttpClientConfig`];
/// [`with_config`](Self::with_config) starts from a complete one.
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    /// Deadline for requests that do not set their own
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Cap on buffered response bodies, in bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// `TlsOnly` rejects `http://` URLs at send time
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    #[must_use]
    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// Number of requests that may be queued at once (at least 1)
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Assemble the client.
    ///
    /// Layers, outermost first: `Buffer`, default headers, decompression,
    /// then the pooled hyper client. Deadlines and cancellation live on each
    /// request rather than in the stack.
    ///
    /// # Errors
    /// Returns an error if the TLS connector cannot be created or the user
    /// agent is not a valid header value.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let HttpClientConfig {
            request_timeout,
            max_body_size,
            user_agent,
            transport,
            tls_roots,
            buffer_capacity,
            pool_idle_timeout,
            pool_max_idle_per_host,
        } = self.config;

        if transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                target: "admin_http::security",
                "plain HTTP allowed; requests to http:// URLs are sent unencrypted"
            );
        }

        let connector = tls::https_connector(tls_roots, transport)?;
        let mut pool = Client::builder(TokioExecutor::new());
        // idle eviction only runs with a timer installed
        pool.pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .pool_idle_timeout(pool_idle_timeout);
        let hyper_client = pool.build::<_, Full<Bytes>>(connector);

        let service = ServiceBuilder::new()
            .layer(DefaultHeadersLayer::user_agent(&user_agent)?)
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(box_response_body)
            .map_err(HttpError::from)
            .boxed_clone();
        let service: BufferedService = Buffer::new(service, buffer_capacity.max(1));

        tracing::debug!(
            timeout_ms = request_timeout.as_millis(),
            max_body_size,
            ?transport,
            "HTTP client built"
        );

        Ok(HttpClient {
            service,
            max_body_size,
            request_timeout,
            transport_security: transport,
        })
    }
}

/// Erase the decompression body type.
fn box_response_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    response.map(|body| body.map_err(Into::into).boxed())
}
