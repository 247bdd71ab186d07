use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tower::Service;
use tower::buffer::Buffer;

/// Type alias for the future type of the inner service
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// Type alias for the buffered service
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// HTTP client with tower middleware stack
///
/// `HttpClient` is `Clone + Send + Sync`; cloning is a channel clone. Build
/// one at startup with [`HttpClientBuilder`] and hand it to whoever needs it,
/// no `Mutex` required.
///
/// # Example
///
/// ```ignore
/// let client = HttpClient::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// let tree: serde_json::Value = client
///     .get("https://admin.example.com/nest/menu/tree")
///     .send()
///     .await?
///     .json()
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) max_body_size: usize,
    pub(crate) request_timeout: Duration,
    pub(crate) transport_security: TransportSecurity,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_body_size", &self.max_body_size)
            .field("request_timeout", &self.request_timeout)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a builder for configuring the HTTP client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Default timeout applied to requests that do not set their own
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Create a request builder for an arbitrary method
    ///
    /// The URL must be absolute (scheme and host); query parameters can be
    /// added with [`RequestBuilder::query`].
    pub fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.request_timeout,
            self.transport_security,
        )
    }

    /// Create a GET request builder
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::POST, url)
    }

    /// Create a PUT request builder
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    /// Create a DELETE request builder
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }
}

/// Map buffer errors to `HttpError`
///
/// Buffer wraps the inner service error, or reports `Closed` if its worker
/// has shut down.
pub fn map_buffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(err) => {
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; service unavailable"
            );
            HttpError::ServiceClosed
        }
    }
}

/// Try to acquire a buffer slot with fail-fast semantics.
///
/// If the buffer is full, returns `HttpError::Overloaded` immediately instead
/// of waiting for capacity.
pub async fn try_acquire_buffer_slot(service: &mut BufferedService) -> Result<(), HttpError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpError::Overloaded),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::HttpClientConfig;
    use crate::error::{ErrorKind, InvalidUriKind};
    use httpmock::prelude::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn test_client() -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_http_client_get() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/menu/tree");
            then.status(200).json_body(json!({"code": 1, "data": []}));
        });

        let client = test_client();
        let url = format!("{}/menu/tree", server.base_url());
        let resp = client.get(&url).send().await.unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_appended_to_url() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/menu/tree")
                .query_param("rootId", "7")
                .query_param("name", "a b");
            then.status(200);
        });

        let client = test_client();
        let url = format!("{}/menu/tree", server.base_url());
        let resp = client
            .get(&url)
            .query(&[("rootId", "7")])
            .query(&[("name", "a b")])
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
        m.assert();
    }

    #[tokio::test]
    async fn test_query_merges_with_existing_query() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/search")
                .query_param("a", "1")
                .query_param("b", "2");
            then.status(200);
        });

        let client = test_client();
        let url = format!("{}/search?a=1", server.base_url());
        client.get(&url).query(&[("b", "2")]).send().await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/menu")
                .header("content-type", "application/json")
                .json_body(json!({"name": "x"}));
            then.status(200).json_body(json!({"code": 1}));
        });

        let client = test_client();
        let url = format!("{}/menu", server.base_url());
        let resp = client
            .post(&url)
            .json(&json!({"name": "x"}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
        m.assert();
    }

    #[tokio::test]
    async fn test_caller_content_type_not_duplicated() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::PUT)
                .path("/menu/1")
                .header("content-type", "application/vnd.menu+json");
            then.status(200);
        });

        let client = test_client();
        let url = format!("{}/menu/1", server.base_url());
        client
            .put(&url)
            .header("content-type", "application/vnd.menu+json")
            .json(&json!({"id": 1}))
            .unwrap()
            .send()
            .await
            .unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn test_default_user_agent_sent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::DELETE)
                .path("/menu/3")
                .header_exists("user-agent");
            then.status(200);
        });

        let client = test_client();
        let url = format!("{}/menu/3", server.base_url());
        client.delete(&url).send().await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn test_non_2xx_returns_http_status_error() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/missing");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"error": "not found"}"#);
        });

        let client = test_client();
        let url = format!("{}/missing", server.base_url());
        let result: Result<serde_json::Value, _> =
            client.get(&url).send().await.unwrap().json().await;

        match result {
            Err(err @ HttpError::HttpStatus { .. }) => {
                assert_eq!(err.kind(), ErrorKind::Status);
                assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
                assert!(err.to_string().contains("status code 404"));
            }
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let server = MockServer::start();
        let large_body = "x".repeat(64 * 1024);
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/large");
            then.status(200).body(&large_body);
        });

        let client = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .max_body_size(1024)
            .build()
            .unwrap();
        let url = format!("{}/large", server.base_url());
        let result = client.get(&url).send().await.unwrap().bytes().await;

        assert!(matches!(result, Err(HttpError::BodyTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_per_request_timeout() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let client = test_client();
        let url = format!("{}/slow", server.base_url());
        let err = client
            .get(&url)
            .timeout(Duration::from_millis(50))
            .send()
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("timeout of 50ms exceeded"));
    }

    #[tokio::test]
    async fn test_cancel_in_flight_request() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let client = test_client();
        let url = format!("{}/slow", server.base_url());
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            })
        };
        let err = client
            .get(&url)
            .cancellation(token)
            .send()
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_short_circuits() {
        let client = test_client();
        let token = CancellationToken::new();
        token.cancel();

        // Nothing listens on this port; a real attempt would be a network error.
        let err = client
            .get("http://127.0.0.1:9/never")
            .cancellation(token)
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Cancelled));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = test_client();
        let err = client
            .get("http://127.0.0.1:9/refused")
            .send()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let client = test_client();
        let err = client.get("/menu/tree").send().await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_http_rejected_when_tls_only() {
        let client = HttpClient::builder().build().unwrap();
        let err = client
            .get("http://example.com/menu")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_invalid_header_deferred_to_send() {
        let client = test_client();
        let err = client
            .get("http://127.0.0.1:9/x")
            .header("codeMode", "bad\nvalue")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }

    #[tokio::test]
    async fn test_gzip_response_decompressed() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"code":1,"data":"zipped"}"#).unwrap();
        let compressed = encoder.finish().unwrap();

        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/gzip");
            then.status(200)
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let client = test_client();
        let url = format!("{}/gzip", server.base_url());
        let value: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(value, json!({"code": 1, "data": "zipped"}));
    }

    #[test]
    fn test_map_buffer_error_passes_through_http_error() {
        let boxed: tower::BoxError = Box::new(HttpError::Overloaded);
        assert!(matches!(map_buffer_error(boxed), HttpError::Overloaded));
    }

    #[test]
    fn test_map_buffer_error_returns_service_closed_for_unknown_error() {
        let boxed: tower::BoxError = "worker gone".into();
        assert!(matches!(map_buffer_error(boxed), HttpError::ServiceClosed));
    }

    /// Compile-time assertion that `HttpClient` is `Send + Sync`
    #[test]
    fn test_http_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpClient>();
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/concurrent");
            then.status(200).body("ok");
        });

        let client = test_client();
        let url = format!("{}/concurrent", server.base_url());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let client = client.clone();
                let url = url.clone();
                tokio::spawn(async move { client.get(&url).send().await?.checked_bytes().await })
            })
            .collect();

        for handle in handles {
            let body = handle.await.unwrap().unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }
}
