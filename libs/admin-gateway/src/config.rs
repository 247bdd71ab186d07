use crate::base_url::{BaseUrlPolicy, Environment};
use crate::error::GatewayBuildError;
use admin_http::TlsRootConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Gateway configuration (`gateway` section of the admin config file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Origin the admin panel is served from; `auto` picks the local backend
    /// when its host is loopback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_origin: Option<String>,
    #[serde(default = "default_local_base_url")]
    pub local_base_url: String,
    #[serde(default = "default_deployed_base_url")]
    pub deployed_base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Value of the default `codeMode` header
    #[serde(default = "default_content_mode")]
    pub content_mode: String,
    /// Permit plain HTTP to non-loopback hosts
    #[serde(default)]
    pub allow_insecure_http: bool,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Trust store for HTTPS backends
    #[serde(default)]
    pub tls_roots: TlsRoots,
}

/// Which certificate roots verify the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsRoots {
    /// Bundled Mozilla roots
    #[default]
    Webpki,
    /// Operating system store
    Native,
}

impl From<TlsRoots> for TlsRootConfig {
    fn from(roots: TlsRoots) -> Self {
        match roots {
            TlsRoots::Webpki => Self::WebPki,
            TlsRoots::Native => Self::Native,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            app_origin: None,
            local_base_url: default_local_base_url(),
            deployed_base_url: default_deployed_base_url(),
            timeout_ms: default_timeout_ms(),
            content_mode: default_content_mode(),
            allow_insecure_http: false,
            max_body_size: default_max_body_size(),
            tls_roots: TlsRoots::default(),
        }
    }
}

impl GatewayConfig {
    /// Default per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse and validate the configured URLs.
    ///
    /// # Errors
    /// Returns [`GatewayBuildError`] if a base URL or the app origin does not
    /// parse, or a base URL is not `http(s)`.
    pub fn base_url_policy(&self) -> Result<BaseUrlPolicy, GatewayBuildError> {
        let app_origin = self
            .app_origin
            .as_deref()
            .map(|origin| parse_url("app_origin", origin))
            .transpose()?;

        Ok(BaseUrlPolicy {
            environment: self.environment,
            app_origin,
            local: parse_base_url("local_base_url", &self.local_base_url)?,
            deployed: parse_base_url("deployed_base_url", &self.deployed_base_url)?,
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, GatewayBuildError> {
    Url::parse(value).map_err(|source| GatewayBuildError::InvalidUrl {
        field,
        value: value.to_owned(),
        source,
    })
}

fn parse_base_url(field: &'static str, value: &str) -> Result<Url, GatewayBuildError> {
    let url = parse_url(field, value)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayBuildError::UnsupportedScheme {
            field,
            value: value.to_owned(),
        });
    }
    Ok(url)
}

fn default_local_base_url() -> String {
    "http://localhost:3000/nest".to_owned()
}

fn default_deployed_base_url() -> String {
    "https://ali-lowcode.lammu.cn/nest".to_owned()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_content_mode() -> String {
    "json".to_owned()
}

fn default_max_body_size() -> usize {
    admin_http::DEFAULT_MAX_BODY_SIZE
}
