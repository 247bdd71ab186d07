use admin_gateway::GatewayConfig;
use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides, e.g. `ADMIN__GATEWAY__TIMEOUT_MS=5000`.
pub const ENV_PREFIX: &str = "ADMIN__";

/// Top-level configuration of the admin CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl AppConfig {
    /// Layered load: defaults, then the YAML file (if any), then `ADMIN__*`
    /// environment variables.
    ///
    /// # Errors
    /// Returns an error if `path` does not exist or the merged configuration
    /// does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    /// Pretty JSON rendering for `--print-config` and `check`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to render configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use admin_gateway::Environment;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TIMEOUT_VAR: &str = "ADMIN__GATEWAY__TIMEOUT_MS";

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        temp_env::with_var_unset(TIMEOUT_VAR, || {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.gateway.timeout_ms, 30_000);
            assert_eq!(config.logging.level, "info");
        });
    }

    #[test]
    fn yaml_overrides_defaults() {
        let file = yaml_file(
            "gateway:\n  environment: deployed\n  timeout_ms: 1500\nlogging:\n  format: json\n",
        );
        temp_env::with_var_unset(TIMEOUT_VAR, || {
            let config = AppConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.gateway.environment, Environment::Deployed);
            assert_eq!(config.gateway.timeout_ms, 1500);
            assert_eq!(config.gateway.content_mode, "json");
            assert_eq!(config.logging.format, LogFormat::Json);
        });
    }

    #[test]
    fn env_overrides_yaml() {
        let file = yaml_file("gateway:\n  timeout_ms: 1500\n");
        temp_env::with_vars(
            [
                (TIMEOUT_VAR, Some("2500")),
                ("ADMIN__GATEWAY__ENVIRONMENT", Some("local")),
            ],
            || {
                let config = AppConfig::load(Some(file.path())).unwrap();
                assert_eq!(config.gateway.timeout_ms, 2500);
                assert_eq!(config.gateway.environment, Environment::Local);
            },
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = yaml_file("gateway:\n  base: http://x\n");
        temp_env::with_var_unset(TIMEOUT_VAR, || {
            assert!(AppConfig::load(Some(file.path())).is_err());
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn pretty_json_omits_unset_origin() {
        let rendered = AppConfig::default().to_pretty_json().unwrap();
        assert!(rendered.contains("\"timeout_ms\": 30000"));
        assert!(!rendered.contains("app_origin"));
    }
}
