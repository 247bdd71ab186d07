use crate::base_url::join_path;
use crate::config::GatewayConfig;
use crate::envelope::Envelope;
use crate::error::{GatewayBuildError, GatewayError, classify};
use crate::method::RequestMethod;
use crate::notify::{TracingNotifier, WarningNotifier};
use crate::options::{RequestOptions, ResponseType};
use crate::query::flatten_query;
use admin_http::{HttpClient, HttpError, HttpResponse, TransportSecurity};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Name of the content-mode marker header.
pub const CONTENT_MODE_HEADER: &str = "codeMode";

/// What a gateway call resolves to.
#[derive(Debug)]
pub enum Reply {
    Envelope(Envelope),
    /// Untouched transport response (export mode, 2xx only)
    Export(HttpResponse),
}

impl Reply {
    /// The envelope, or `None` for an export response.
    #[must_use]
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            Self::Export(_) => None,
        }
    }

    /// The raw response, or `None` for an envelope.
    #[must_use]
    pub fn into_export(self) -> Option<HttpResponse> {
        match self {
            Self::Export(response) => Some(response),
            Self::Envelope(_) => None,
        }
    }
}

/// Issues admin API calls and normalizes every outcome into an [`Envelope`].
///
/// Build one at startup and share it; clones share the HTTP client and the
/// notifier. The base URL is fixed at construction.
#[derive(Clone)]
pub struct RequestGateway {
    client: HttpClient,
    base_url: String,
    content_mode: String,
    notifier: Arc<dyn WarningNotifier>,
}

impl fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGateway")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .field("content_mode", &self.content_mode)
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    /// Wrap an existing client; `base_url` is used for every relative path.
    #[must_use]
    pub fn new(client: HttpClient, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            content_mode: "json".to_owned(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Build the HTTP client and select the base URL from `config`.
    ///
    /// Plain HTTP is allowed when `allow_insecure_http` is set or when the
    /// selected base URL points at a loopback host.
    ///
    /// # Errors
    /// Returns [`GatewayBuildError`] if a URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayBuildError> {
        let policy = config.base_url_policy()?;
        let base_url = policy.select();
        let insecure_ok = config.allow_insecure_http || crate::base_url::is_local_host(base_url);

        let transport = if insecure_ok {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        };

        let client = HttpClient::builder()
            .timeout(config.timeout())
            .max_body_size(config.max_body_size)
            .transport(transport)
            .tls_roots(config.tls_roots.into())
            .build()?;

        tracing::info!(
            base_url = %base_url,
            local = policy.is_local(),
            timeout_ms = config.timeout_ms,
            "request gateway ready"
        );

        Ok(Self::new(client, base_url).with_content_mode(config.content_mode.clone()))
    }

    /// Replace the logical-failure notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn WarningNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Value sent in the default `codeMode` header
    #[must_use]
    pub fn with_content_mode(mut self, content_mode: impl Into<String>) -> Self {
        self.content_mode = content_mode.into();
        self
    }

    /// Base URL selected at construction (no trailing slash)
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path`
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_path(&self.base_url, path)
    }

    /// Issue a request and normalize the outcome.
    ///
    /// `data` goes to the query string for `GET` and to the JSON body for
    /// every other method. Transport failures, non-2xx statuses and
    /// unreadable bodies resolve to `{code: -1, msg, data: {}}`; an empty
    /// 2xx body resolves to `{code: 1}`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] only when `options.cancel` fires
    /// before the call completes.
    pub async fn request<T>(
        &self,
        method: RequestMethod,
        path: &str,
        data: Option<&T>,
        options: RequestOptions,
    ) -> Result<Reply, GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url_for(path);
        let (is_export, response_type) = (options.is_export, options.response_type);
        tracing::debug!(%method, %url, %response_type, "gateway request");

        let response = match self.send(method, &url, data, options).await {
            Ok(response) => response,
            Err(err) => return normalize(method, &url, err).map(Reply::Envelope),
        };

        if is_export && response.status().is_success() {
            return Ok(Reply::Export(response));
        }

        let body = match response.checked_bytes().await {
            Ok(body) => body,
            Err(err) => return normalize(method, &url, err).map(Reply::Envelope),
        };

        Ok(Reply::Envelope(self.decode(&url, response_type, &body)))
    }

    /// [`request`](Self::request) for callers that never use export mode.
    ///
    /// An export flag in `options` is ignored.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] when the call is cancelled.
    pub async fn envelope<T>(
        &self,
        method: RequestMethod,
        path: &str,
        data: Option<&T>,
        mut options: RequestOptions,
    ) -> Result<Envelope, GatewayError>
    where
        T: Serialize + ?Sized,
    {
        options.is_export = false;
        match self.request(method, path, data, options).await? {
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Export(_) => Ok(Envelope::failure("unexpected export response")),
        }
    }

    async fn send<T>(
        &self,
        method: RequestMethod,
        url: &str,
        data: Option<&T>,
        options: RequestOptions,
    ) -> Result<HttpResponse, HttpError>
    where
        T: Serialize + ?Sized,
    {
        let mut builder = self.client.request(method.into(), url);

        builder = match options.headers {
            Some(headers) => builder.headers(headers),
            None => builder.header(CONTENT_MODE_HEADER, &self.content_mode),
        };
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(token) = options.cancel {
            builder = builder.cancellation(token);
        }

        if let Some(data) = data {
            if method.sends_query() {
                let value = serde_json::to_value(data)?;
                builder = builder.query(&flatten_query(&value));
            } else {
                builder = builder.json(data)?;
            }
        }

        builder.send().await
    }

    fn decode(&self, url: &str, response_type: ResponseType, body: &bytes::Bytes) -> Envelope {
        if response_type.is_binary() {
            return Envelope::binary(body.clone());
        }

        if body.trim_ascii().is_empty() {
            tracing::debug!(%url, "empty response body");
            return Envelope::empty();
        }

        match Envelope::from_slice(body) {
            Ok(envelope) => {
                if let Some(msg) = envelope.failure_message() {
                    self.notifier.warn(&msg);
                }
                envelope
            }
            Err(err) => {
                tracing::warn!(%url, error = %err, "response is not an envelope");
                Envelope::failure(err.to_string())
            }
        }
    }
}

/// Fold a transport error into a failure envelope; cancellation passes through.
fn normalize(method: RequestMethod, url: &str, err: HttpError) -> Result<Envelope, GatewayError> {
    if err.is_cancelled() {
        tracing::debug!(%method, %url, "gateway request cancelled");
        return Err(GatewayError::Cancelled);
    }

    let class = classify(&err);
    tracing::warn!(
        %method,
        %url,
        class = class.as_str(),
        error = %err,
        "gateway request failed"
    );
    Ok(Envelope::failure(err.to_string()))
}
