use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::guard::RequestGuard;
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::Service;

/// Body type for the request builder
#[derive(Clone, Debug)]
enum BodyKind {
    Empty,
    Bytes(Bytes),
    /// Already serialized with `serde_json`
    Json(Bytes),
}

/// HTTP request builder with fluent API
///
/// Created by [`HttpClient::request`](crate::HttpClient::request) and the
/// per-method shorthands. Builder errors (bad header, unencodable query) are
/// deferred and returned by [`send()`](RequestBuilder::send).
///
/// # Example
///
/// ```ignore
/// let resp = client
///     .get("https://api.example.com/menu/tree")
///     .query(&[("rootId", "7")])
///     .timeout(Duration::from_secs(5))
///     .cancellation(token.clone())
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    query: Option<String>,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    body: BodyKind,
    timeout: Duration,
    cancel: Option<CancellationToken>,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: String,
        timeout: Duration,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            method,
            url,
            query: None,
            headers: Vec::new(),
            body: BodyKind::Empty,
            timeout,
            cancel: None,
            error: None,
            transport_security,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Add multiple headers to the request
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| {
                builder.header(name.as_ref(), value.as_ref())
            })
    }

    /// Append URL-encoded query parameters to the URL
    ///
    /// Accepts anything `serde_urlencoded` can flatten: a slice of pairs, a
    /// map, or a struct of scalar fields. An empty encoding adds nothing.
    /// Calling it again appends further parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        if self.error.is_some() {
            return self;
        }

        match serde_urlencoded::to_string(params) {
            Ok(encoded) if encoded.is_empty() => {}
            Ok(encoded) => match &mut self.query {
                Some(existing) => {
                    existing.push('&');
                    existing.push_str(&encoded);
                }
                None => self.query = Some(encoded),
            },
            Err(e) => self.error = Some(HttpError::QueryEncode(e)),
        }
        self
    }

    /// Set request body as JSON
    ///
    /// Sets Content-Type to `application/json` unless the caller supplied one.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::Json)` if serialization fails, or the deferred
    /// builder error if there is one.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let json_bytes = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(json_bytes));
        Ok(self)
    }

    /// Set request body as raw bytes
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = BodyKind::Bytes(body);
        self
    }

    /// Override the client's default timeout for this request only
    ///
    /// The deadline covers sending the request and reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort the request when `token` is cancelled
    ///
    /// Cancellation surfaces as [`HttpError::Cancelled`] from `send()` or from
    /// any body read on the returned response.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Final URL: the base URL plus any query set on the builder.
    fn full_url(&self) -> String {
        match &self.query {
            Some(query) if self.url.contains('?') => format!("{}&{query}", self.url),
            Some(query) => format!("{}?{query}", self.url),
            None => self.url.clone(),
        }
    }

    /// Parse the final URL; it must be absolute and use a scheme the
    /// transport accepts.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let url = self.full_url();
        let invalid = |kind, reason: String| HttpError::InvalidUri {
            url: url.clone(),
            kind,
            reason,
        };

        let uri: http::Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;
        if uri.authority().is_none() {
            return Err(invalid(
                InvalidUriKind::MissingAuthority,
                "relative URL; join it with a base URL first".to_owned(),
            ));
        }
        let Some(scheme) = uri.scheme_str() else {
            return Err(invalid(InvalidUriKind::MissingScheme, "no scheme".to_owned()));
        };

        if self.transport_security.allows_scheme(scheme) {
            return Ok(uri);
        }
        let reason = if scheme == "http" {
            "plain HTTP is disabled; use https:// or allow insecure HTTP"
        } else {
            "expected http:// or https://"
        };
        Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: reason.to_owned(),
        })
    }

    /// Send the request and return the response
    ///
    /// Returns `Ok` for every HTTP status; use
    /// [`HttpResponse::error_for_status`] or the checked body readers to turn
    /// non-2xx into an error.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - Request building failed (invalid headers, URL, query encoding)
    /// - URL scheme is invalid for the transport security mode
    /// - Network/transport error
    /// - The deadline passed (`Timeout`) or the token fired (`Cancelled`)
    /// - The request buffer is full (`Overloaded`)
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let guard = RequestGuard::start(self.timeout, self.cancel.take());
        if guard.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let request = self.build_request()?;
        let Self {
            mut service,
            max_body_size,
            ..
        } = self;

        // Overloaded is reported immediately, without waiting for a slot
        try_acquire_buffer_slot(&mut service).await?;

        let inner: Response<ResponseBody> = guard
            .run(async move { service.call(request).await.map_err(map_buffer_error) })
            .await?;

        Ok(HttpResponse {
            inner,
            max_body_size,
            guard,
        })
    }

    /// Assemble the hyper request. A JSON body gets `application/json`
    /// unless the caller already set a content type.
    fn build_request(&mut self) -> Result<Request<Full<Bytes>>, HttpError> {
        let uri = self.validate_url()?;
        let (body, is_json) = match std::mem::replace(&mut self.body, BodyKind::Empty) {
            BodyKind::Empty => (Bytes::new(), false),
            BodyKind::Bytes(bytes) => (bytes, false),
            BodyKind::Json(bytes) => (bytes, true),
        };

        let mut request = Request::new(Full::new(body));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = uri;

        let headers = request.headers_mut();
        for (name, value) in self.headers.drain(..) {
            headers.append(name, value);
        }
        if is_json && !headers.contains_key(http::header::CONTENT_TYPE) {
            headers.insert(
                http::header::CONTENT_TYPE,
                http::header::HeaderValue::from_static("application/json"),
            );
        }
        Ok(request)
    }
}
