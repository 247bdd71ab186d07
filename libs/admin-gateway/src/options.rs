use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How the gateway interprets a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse as a `{code, msg, data}` envelope
    #[default]
    Json,
    /// Wrap the raw body as `{code: 1, data}`
    ArrayBuffer,
    /// Same as `ArrayBuffer`
    Blob,
}

impl ResponseType {
    /// `ArrayBuffer` and `Blob` both skip envelope parsing.
    #[must_use]
    pub fn is_binary(self) -> bool {
        matches!(self, Self::ArrayBuffer | Self::Blob)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::ArrayBuffer => "arraybuffer",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "arraybuffer" => Ok(Self::ArrayBuffer),
            "blob" => Ok(Self::Blob),
            other => Err(format!(
                "unknown response type '{other}' (expected json, arraybuffer or blob)"
            )),
        }
    }
}

/// Per-call overrides for [`RequestGateway::request`](crate::RequestGateway::request).
///
/// | field           | default                                  |
/// |-----------------|------------------------------------------|
/// | `headers`       | `None`: send `codeMode: <content mode>`  |
/// | `timeout`       | `None`: gateway default (30s)            |
/// | `response_type` | [`ResponseType::Json`]                   |
/// | `is_export`     | `false`                                  |
/// | `cancel`        | `None`                                   |
///
/// Supplying `headers` replaces the default header set entirely.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Option<Vec<(String, String)>>,
    pub timeout: Option<Duration>,
    pub response_type: ResponseType,
    pub is_export: bool,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default headers with `headers`
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Return the raw transport response instead of an envelope
    #[must_use]
    pub fn export(mut self) -> Self {
        self.is_export = true;
        self
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
