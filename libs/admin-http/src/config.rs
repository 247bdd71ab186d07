use std::time::Duration;

/// `User-Agent` sent when the caller does not set one
pub const DEFAULT_USER_AGENT: &str = concat!("admin-http/", env!("CARGO_PKG_VERSION"));

/// Deadline for a request and its body read unless overridden per call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body the client will buffer
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_BUFFER_CAPACITY: usize = 1024;
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Where trusted TLS roots come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Bundled Mozilla roots; behaves the same on every host
    #[default]
    WebPki,
    /// The operating system's certificate store
    Native,
}

/// Which URL schemes the client will connect to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// `https://` only
    #[default]
    TlsOnly,
    /// `http://` accepted too; meant for a backend on the developer's machine
    AllowInsecureHttp,
}

impl TransportSecurity {
    /// Whether a URL with this scheme may be requested.
    #[must_use]
    pub fn allows_scheme(self, scheme: &str) -> bool {
        match scheme {
            "https" => true,
            "http" => self == Self::AllowInsecureHttp,
            _ => false,
        }
    }
}

/// Settings consumed by [`HttpClientBuilder`](crate::HttpClientBuilder)
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Default deadline; [`RequestBuilder::timeout`] overrides it per call
    ///
    /// [`RequestBuilder::timeout`]: crate::RequestBuilder::timeout
    pub request_timeout: Duration,

    /// Body reads fail with `BodyTooLarge` past this many bytes
    pub max_body_size: usize,

    pub user_agent: String,

    pub transport: TransportSecurity,

    pub tls_roots: TlsRootConfig,

    /// In-flight request slots; when all are taken `send()` returns
    /// [`HttpError::Overloaded`](crate::HttpError::Overloaded) at once
    pub buffer_capacity: usize,

    /// How long a pooled connection may sit unused; `None` keeps it forever
    pub pool_idle_timeout: Option<Duration>,

    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::default(),
            tls_roots: TlsRootConfig::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            pool_idle_timeout: Some(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }
}

impl HttpClientConfig {
    /// Small limits and plain HTTP, for talking to a local mock backend
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gateway_expectations() {
        let config = HttpClientConfig::default();
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
        assert_eq!(config.transport, TransportSecurity::TlsOnly);
        assert_eq!(config.tls_roots, TlsRootConfig::WebPki);
        assert!(config.user_agent.starts_with("admin-http/"));
    }

    #[test]
    fn scheme_policy_follows_transport() {
        let strict = HttpClientConfig::default().transport;
        assert!(strict.allows_scheme("https"));
        assert!(!strict.allows_scheme("http"));
        assert!(!strict.allows_scheme("ftp"));

        let local = HttpClientConfig::for_testing().transport;
        assert!(local.allows_scheme("http"));
        assert!(local.allows_scheme("https"));
    }
}
