//! Provider configuration
//!
//! Credentials are read from a TOML file holding one table per account
//! section:
//!
//! ```toml
//! [default]
//! host = "akab-xxxx.luna.example.net"
//! access_token = "akab-token"
//! account_key = "1-ABCD"
//! ```
//!
//! `EDGEFORM_HOST`, `EDGEFORM_ACCESS_TOKEN` and `EDGEFORM_ACCOUNT_KEY`
//! override the values from the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SECTION: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("section [{0}] not found in configuration file")]
    MissingSection(String),

    #[error("'{0}' is not set")]
    Missing(&'static str),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Section {
    host: Option<String>,
    access_token: Option<String>,
    account_key: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Connection settings shared by every remote client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub host: String,
    pub access_token: String,
    /// Account to act on behalf of, sent as `accountSwitchKey`
    pub account_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(host: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            access_token: access_token.into(),
            account_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_account_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }

    /// Load `section` from `path` (if given) and apply environment overrides
    pub fn load(path: Option<&Path>, section: &str) -> Result<Self, ConfigError> {
        let source = match path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
            None => None,
        };
        Self::resolve(source.as_deref(), section, |key| std::env::var(key).ok())
    }

    /// Build a configuration from TOML text and an environment lookup
    pub fn resolve(
        source: Option<&str>,
        section: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut values = match source {
            Some(source) => {
                let mut table: toml::Table = toml::from_str(source)?;
                let raw = table
                    .remove(section)
                    .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
                raw.try_into::<Section>()?
            }
            None => Section::default(),
        };

        if let Some(host) = env("EDGEFORM_HOST") {
            values.host = Some(host);
        }
        if let Some(token) = env("EDGEFORM_ACCESS_TOKEN") {
            values.access_token = Some(token);
        }
        if let Some(key) = env("EDGEFORM_ACCOUNT_KEY") {
            values.account_key = Some(key);
        }

        let config = Self {
            host: values.host.unwrap_or_default(),
            access_token: values.access_token.unwrap_or_default(),
            account_key: values.account_key.filter(|k| !k.is_empty()),
            request_timeout_secs: values.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Missing("access_token"));
        }
        Ok(())
    }

    /// Base URL for API requests; bare host names are served over HTTPS
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FILE: &str = r#"
[default]
host = "akab-host.luna.example.net"
access_token = "token-a"

[other]
host = "http://localhost:8080/"
access_token = "token-b"
account_key = "1-ABCD"
request_timeout_secs = 5
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn loads_named_section() {
        let config = ProviderConfig::resolve(Some(FILE), "other", no_env).unwrap();
        assert_eq!(config.account_key.as_deref(), Some("1-ABCD"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.base_url(), "http://localhost:8080");

        let config = ProviderConfig::resolve(Some(FILE), DEFAULT_SECTION, no_env).unwrap();
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.base_url(), "https://akab-host.luna.example.net");
    }

    #[test]
    fn environment_overrides_file() {
        let env = HashMap::from([
            ("EDGEFORM_ACCESS_TOKEN", "from-env"),
            ("EDGEFORM_ACCOUNT_KEY", "2-XYZ"),
        ]);
        let config = ProviderConfig::resolve(Some(FILE), DEFAULT_SECTION, |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.access_token, "from-env");
        assert_eq!(config.account_key.as_deref(), Some("2-XYZ"));
        assert_eq!(config.host, "akab-host.luna.example.net");
    }

    #[test]
    fn missing_section_and_credentials() {
        assert!(matches!(
            ProviderConfig::resolve(Some(FILE), "nope", no_env),
            Err(ConfigError::MissingSection(_))
        ));
        assert!(matches!(
            ProviderConfig::resolve(None, DEFAULT_SECTION, no_env),
            Err(ConfigError::Missing("host"))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let source = "[default]\nhost = \"h\"\naccess_token = \"t\"\nclient_secret = \"s\"\n";
        assert!(matches!(
            ProviderConfig::resolve(Some(source), DEFAULT_SECTION, no_env),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edgeform.toml");
        std::fs::write(&path, FILE).unwrap();

        let config = ProviderConfig::load(Some(&path), "other").unwrap();
        assert_eq!(config.access_token, "token-b");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ProviderConfig::load(Some(&missing), "other"),
            Err(ConfigError::Io { .. })
        ));
    }
}
