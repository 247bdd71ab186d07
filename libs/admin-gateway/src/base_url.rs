use serde::{Deserialize, Serialize};
use url::{Host, Url};

/// Which backend origin the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local when the application origin is a loopback host, deployed otherwise
    #[default]
    Auto,
    Local,
    Deployed,
}

/// Base URL selection, evaluated once when the gateway is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlPolicy {
    pub environment: Environment,
    pub app_origin: Option<Url>,
    pub local: Url,
    pub deployed: Url,
}

impl BaseUrlPolicy {
    /// Whether the policy resolves to the local backend.
    #[must_use]
    pub fn is_local(&self) -> bool {
        match self.environment {
            Environment::Local => true,
            Environment::Deployed => false,
            Environment::Auto => self.app_origin.as_ref().is_some_and(is_local_host),
        }
    }

    /// The selected base URL.
    #[must_use]
    pub fn select(&self) -> &Url {
        if self.is_local() {
            &self.local
        } else {
            &self.deployed
        }
    }
}

/// `localhost` (and `*.localhost`) or a loopback IP.
#[must_use]
pub fn is_local_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Resolve `path` against `base`.
///
/// Absolute `http(s)://` paths are used unchanged; otherwise exactly one `/`
/// separates the base from the path.
pub(crate) fn join_path(base: &str, path: &str) -> String {
    if has_http_scheme(path) {
        return path.to_owned();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{path}")
    }
}

fn has_http_scheme(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
