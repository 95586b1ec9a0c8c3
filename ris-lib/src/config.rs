//! Client configuration.
//!
//! Settings can be built in code with the `with_*` methods, deserialized with
//! serde, or read from `RIS_*` environment variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `RIS_URL` | RIS endpoint for direct mode |
//! | `RIS_API_KEY` / `RIS_API_KEY_FILE` | API key, or a file holding it |
//! | `RIS_CONFIG_KEY` | Ascii85-encoded KHASH configuration key |
//! | `RIS_CONFIG_KEY_FINGERPRINT` | SHA-256 hex fingerprint of the decoded key |
//! | `RIS_MIGRATION_MODE_ENABLED` | Route requests through the gateway |
//! | `RIS_PF_API_KEY` | Gateway API key for the client-credentials grant |
//! | `RIS_PF_API_ENDPOINT` | Gateway RIS endpoint |
//! | `RIS_PF_AUTH_ENDPOINT` | Gateway auth endpoint |
//! | `RIS_PF_CLIENT_ID` | Gateway client id, sent as the merchant id |
//! | `RIS_FORCE_UTF8` | Encode request bodies as UTF-8 |
//! | `RIS_CONNECT_TIMEOUT_MS`, `RIS_READ_TIMEOUT_MS` | Timeouts |
//! | `RIS_MAX_CONNECTIONS`, `RIS_MAX_CONNECTIONS_PER_ROUTE` | Pool limits |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_FRESHNESS_MARGIN_SECS;
use crate::khash::Khash;
use crate::transport::PoolConfig;
use crate::{RisError, Result};

/// Gateway (migration mode) settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// API key for the client-credentials grant.
    #[serde(default)]
    pub api_key: String,

    /// Gateway RIS endpoint.
    #[serde(default)]
    pub api_endpoint: String,

    /// Gateway auth endpoint.
    #[serde(default)]
    pub auth_endpoint: String,

    /// Client id, sent in place of the merchant id.
    #[serde(default)]
    pub client_id: String,

    /// Seconds a cached token must stay usable beyond now.
    #[serde(default = "default_freshness_margin_secs")]
    pub freshness_margin_secs: i64,
}

fn default_freshness_margin_secs() -> i64 {
    DEFAULT_FRESHNESS_MARGIN_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("", "", "", "")
    }
}

impl GatewayConfig {
    /// Create gateway settings.
    pub fn new(
        api_key: impl Into<String>,
        api_endpoint: impl Into<String>,
        auth_endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_endpoint: api_endpoint.into(),
            auth_endpoint: auth_endpoint.into(),
            client_id: client_id.into(),
            freshness_margin_secs: default_freshness_margin_secs(),
        }
    }

    /// Set the token freshness margin.
    pub fn with_freshness_margin_secs(mut self, secs: i64) -> Self {
        self.freshness_margin_secs = secs;
        self
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("api_endpoint", &self.api_endpoint)
            .field("auth_endpoint", &self.auth_endpoint)
            .field("client_id", &self.client_id)
            .field("freshness_margin_secs", &self.freshness_margin_secs)
            .finish()
    }
}

/// Complete client configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RisConfig {
    /// RIS endpoint for direct mode.
    #[serde(default)]
    pub ris_url: String,

    /// API key for direct mode.
    #[serde(default)]
    pub api_key: String,

    /// Ascii85-encoded KHASH configuration key.
    #[serde(default)]
    pub config_key: String,

    /// Expected SHA-256 fingerprint of the decoded configuration key.
    #[serde(default)]
    pub config_key_fingerprint: String,

    /// Send requests through the gateway with bearer tokens.
    #[serde(default)]
    pub migration_mode_enabled: bool,

    /// Gateway settings, used in migration mode.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Encode request bodies as UTF-8 instead of ISO-8859-1.
    #[serde(default)]
    pub force_utf8: bool,

    /// Connection pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
}

impl RisConfig {
    /// Create a direct-mode configuration.
    pub fn new(
        ris_url: impl Into<String>,
        api_key: impl Into<String>,
        config_key: impl Into<String>,
        config_key_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            ris_url: ris_url.into(),
            api_key: api_key.into(),
            config_key: config_key.into(),
            config_key_fingerprint: config_key_fingerprint.into(),
            ..Self::default()
        }
    }

    /// Enable migration mode with the given gateway settings.
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.migration_mode_enabled = true;
        self.gateway = gateway;
        self
    }

    /// Encode bodies as UTF-8.
    pub fn with_force_utf8(mut self, force_utf8: bool) -> Self {
        self.force_utf8 = force_utf8;
        self
    }

    /// Set the pool settings.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Load from `RIS_*` environment variables and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable lookup and validate.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = get("RIS_URL") {
            config.ris_url = url;
        }
        if let Some(key) = get("RIS_API_KEY") {
            config.api_key = key;
        } else if let Some(path) = get("RIS_API_KEY_FILE") {
            config.api_key = read_api_key_file(path)?;
        }
        if let Some(key) = get("RIS_CONFIG_KEY") {
            config.config_key = key;
        }
        if let Some(fingerprint) = get("RIS_CONFIG_KEY_FINGERPRINT") {
            config.config_key_fingerprint = fingerprint;
        }
        if let Some(flag) = get("RIS_MIGRATION_MODE_ENABLED") {
            config.migration_mode_enabled = parse_flag("RIS_MIGRATION_MODE_ENABLED", &flag)?;
        }
        if let Some(flag) = get("RIS_FORCE_UTF8") {
            config.force_utf8 = parse_flag("RIS_FORCE_UTF8", &flag)?;
        }

        config.gateway.api_key = get("RIS_PF_API_KEY").unwrap_or_default();
        config.gateway.api_endpoint = get("RIS_PF_API_ENDPOINT").unwrap_or_default();
        config.gateway.auth_endpoint = get("RIS_PF_AUTH_ENDPOINT").unwrap_or_default();
        config.gateway.client_id = get("RIS_PF_CLIENT_ID").unwrap_or_default();

        if let Some(ms) = get("RIS_CONNECT_TIMEOUT_MS") {
            config.pool.connect_timeout_ms = parse_number("RIS_CONNECT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = get("RIS_READ_TIMEOUT_MS") {
            config.pool.read_timeout_ms = parse_number("RIS_READ_TIMEOUT_MS", &ms)?;
        }
        if let Some(max) = get("RIS_MAX_CONNECTIONS") {
            config.pool.max_connections = parse_number("RIS_MAX_CONNECTIONS", &max)?;
        }
        if let Some(max) = get("RIS_MAX_CONNECTIONS_PER_ROUTE") {
            config.pool.max_connections_per_route =
                parse_number("RIS_MAX_CONNECTIONS_PER_ROUTE", &max)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that every setting the selected mode needs is present.
    pub fn validate(&self) -> Result<()> {
        if self.config_key.trim().is_empty() {
            return Err(RisError::configuration("RIS_CONFIG_KEY is not set"));
        }
        if self.config_key_fingerprint.trim().is_empty() {
            return Err(RisError::configuration(
                "RIS_CONFIG_KEY_FINGERPRINT is not set",
            ));
        }

        if self.migration_mode_enabled {
            let gateway = &self.gateway;
            let required = [
                ("RIS_PF_API_KEY", &gateway.api_key),
                ("RIS_PF_API_ENDPOINT", &gateway.api_endpoint),
                ("RIS_PF_AUTH_ENDPOINT", &gateway.auth_endpoint),
                ("RIS_PF_CLIENT_ID", &gateway.client_id),
            ];
            for (name, value) in required {
                if value.trim().is_empty() {
                    return Err(RisError::configuration(format!(
                        "{} is required in migration mode",
                        name
                    )));
                }
            }
        } else {
            if self.ris_url.trim().is_empty() {
                return Err(RisError::configuration("RIS_URL is not set"));
            }
            if self.api_key.trim().is_empty() {
                return Err(RisError::configuration(
                    "RIS_API_KEY or RIS_API_KEY_FILE is not set",
                ));
            }
        }
        Ok(())
    }

    /// Decode and verify the configuration key.
    pub fn khash(&self) -> Result<Khash> {
        Khash::from_encoded(&self.config_key, &self.config_key_fingerprint)
    }
}

impl fmt::Debug for RisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RisConfig")
            .field("ris_url", &self.ris_url)
            .field("api_key", &redacted(&self.api_key))
            .field("config_key", &redacted(&self.config_key))
            .field("config_key_fingerprint", &self.config_key_fingerprint)
            .field("migration_mode_enabled", &self.migration_mode_enabled)
            .field("gateway", &self.gateway)
            .field("force_utf8", &self.force_utf8)
            .field("pool", &self.pool)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}

/// Read an API key file, trimming surrounding whitespace.
pub fn read_api_key_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        RisError::configuration(format!("cannot read API key file {}: {}", path.display(), e))
    })?;
    let key = contents.trim();
    if key.is_empty() {
        return Err(RisError::configuration(format!(
            "API key file {} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(RisError::configuration(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RisError::configuration(format!("{} must be a number, got {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::khash::tests::{TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT};
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("RIS_URL", "https://risk.test.kount.net"),
            ("RIS_API_KEY", "api-key"),
            ("RIS_CONFIG_KEY", TEST_KEY_ENCODED),
            ("RIS_CONFIG_KEY_FINGERPRINT", TEST_KEY_FINGERPRINT),
        ]
    }

    #[test]
    fn test_from_lookup_direct_mode() {
        let mut vars = base_vars();
        vars.push(("RIS_READ_TIMEOUT_MS", "2500"));
        vars.push(("RIS_FORCE_UTF8", "TRUE"));
        let config = RisConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.ris_url, "https://risk.test.kount.net");
        assert!(!config.migration_mode_enabled);
        assert!(config.force_utf8);
        assert_eq!(config.pool.read_timeout_ms, 2500);
        assert_eq!(config.pool.max_connections, 256);
        assert!(config.khash().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_named() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "RIS_API_KEY")
            .collect();
        let err = RisConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("RIS_API_KEY"));
    }

    #[test]
    fn test_migration_mode_requires_gateway_settings() {
        let mut vars = base_vars();
        vars.push(("RIS_MIGRATION_MODE_ENABLED", "true"));
        vars.push(("RIS_PF_API_KEY", "pf-key"));
        vars.push(("RIS_PF_API_ENDPOINT", "https://api.kount.com/commerce/ris"));
        vars.push(("RIS_PF_AUTH_ENDPOINT", "https://login.kount.com/oauth2/token"));
        let err = RisConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("RIS_PF_CLIENT_ID"));

        vars.push(("RIS_PF_CLIENT_ID", "900900"));
        let config = RisConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.migration_mode_enabled);
        assert_eq!(config.gateway.client_id, "900900");
        assert_eq!(config.gateway.freshness_margin_secs, 60);
    }

    #[test]
    fn test_invalid_numbers_and_flags_are_rejected() {
        let mut vars = base_vars();
        vars.push(("RIS_MAX_CONNECTIONS", "lots"));
        assert!(RisConfig::from_lookup(lookup(&vars)).unwrap_err().is_configuration());

        let mut vars = base_vars();
        vars.push(("RIS_MIGRATION_MODE_ENABLED", "maybe"));
        assert!(RisConfig::from_lookup(lookup(&vars)).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_config_key() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "RIS_CONFIG_KEY")
            .collect();
        let err = RisConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("RIS_CONFIG_KEY"));
    }

    #[test]
    fn test_api_key_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  file-api-key  ").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut vars: Vec<(&str, &str)> = Vec::new();
        for (key, value) in base_vars() {
            if key != "RIS_API_KEY" {
                vars.push((key, value));
            }
        }
        vars.push(("RIS_API_KEY_FILE", &path));
        let config = RisConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.api_key, "file-api-key");
    }

    #[test]
    fn test_missing_api_key_file() {
        let err = read_api_key_file("/nonexistent/ris/api.key").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RisConfig::new("https://ris", "secret-api-key", TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT)
            .with_gateway(GatewayConfig::new("pf-secret", "https://api", "https://auth", "1"));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-api-key"));
        assert!(!rendered.contains("pf-secret"));
        assert!(!rendered.contains(TEST_KEY_ENCODED));
    }
}
