use crate::error::HttpError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that adds a fixed set of headers to every request
///
/// A header is only added when the request does not already carry one with
/// the same name, so per-request values always win.
#[derive(Clone, Debug, Default)]
pub struct DefaultHeadersLayer {
    defaults: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Layer that sets only `User-Agent`
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent string is not valid
    pub fn user_agent(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        Self::try_from_pairs([(http::header::USER_AGENT.as_str(), user_agent.as_ref())])
    }

    /// Build the layer from `(name, value)` string pairs
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` / `InvalidHeaderValue` for the
    /// first pair that does not form a valid header.
    pub fn try_from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, HttpError> {
        let mut defaults = HeaderMap::new();
        for (name, value) in pairs {
            let name = HeaderName::try_from(name)?;
            let value = HeaderValue::try_from(value)?;
            defaults.insert(name, value);
        }
        Ok(Self {
            defaults: Arc::new(defaults),
        })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            defaults: Arc::clone(&self.defaults),
        }
    }
}

/// Service produced by [`DefaultHeadersLayer`]
#[derive(Clone, Debug)]
pub struct DefaultHeadersService<S> {
    inner: S,
    defaults: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        for (name, value) in self.defaults.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Echoes the request headers back as the response headers.
    #[derive(Clone)]
    struct EchoHeaders;

    impl Service<Request<Full<Bytes>>> for EchoHeaders {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let mut resp = Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap();
            *resp.headers_mut() = req.headers().clone();
            std::future::ready(Ok(resp))
        }
    }

    fn request(extra: Option<(&str, &str)>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri("http://example.com");
        if let Some((name, value)) = extra {
            builder = builder.header(name, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_added() {
        let layer =
            DefaultHeadersLayer::try_from_pairs([("user-agent", "admin/1.0"), ("accept", "*/*")])
                .unwrap();
        let resp = layer
            .layer(EchoHeaders)
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(resp.headers()["user-agent"], "admin/1.0");
        assert_eq!(resp.headers()["accept"], "*/*");
    }

    #[tokio::test]
    async fn test_request_header_not_overwritten() {
        let layer = DefaultHeadersLayer::user_agent("admin/1.0").unwrap();
        let resp = layer
            .layer(EchoHeaders)
            .oneshot(request(Some(("user-agent", "custom/2.0"))))
            .await
            .unwrap();

        assert_eq!(resp.headers()["user-agent"], "custom/2.0");
    }

    #[test]
    fn test_invalid_value_rejected() {
        let result = DefaultHeadersLayer::user_agent("invalid\x00agent");
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let result = DefaultHeadersLayer::try_from_pairs([("bad header", "x")]);
        assert!(matches!(result, Err(HttpError::InvalidHeaderName(_))));
    }
}
