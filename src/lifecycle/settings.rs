//! Runtime configuration.
//!
//! Defaults, then an optional `order-desk.toml`, then `ORDER_DESK_*` environment
//! variables. Credentials arrive here and are handed to the HTTP adapter explicitly.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "order-desk.toml";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_base: String,
    pub token: Option<String>,
    pub org_id: Option<String>,
    pub poll_interval_secs: u64,
    pub list_limit: u32,
    pub channel_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8787".into(),
            token: None,
            org_id: None,
            poll_interval_secs: 12,
            list_limit: 200,
            channel_capacity: 32,
            request_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Loads `path` if it exists and applies the process environment on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        settings.with_env(|var| std::env::var(var).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Applies `ORDER_DESK_*` overrides read through `lookup`.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("ORDER_DESK_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("ORDER_DESK_TOKEN") {
            self.token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = lookup("ORDER_DESK_ORG_ID") {
            self.org_id = Some(v).filter(|id| !id.is_empty());
        }
        if let Some(v) = lookup("ORDER_DESK_POLL_SECS") {
            self.poll_interval_secs = parse_env("ORDER_DESK_POLL_SECS", v)?;
        }
        if let Some(v) = lookup("ORDER_DESK_LIST_LIMIT") {
            self.list_limit = parse_env("ORDER_DESK_LIST_LIMIT", v)?;
        }
        if let Some(v) = lookup("ORDER_DESK_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("ORDER_DESK_TIMEOUT_SECS", v)?;
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_match_dashboard_cadence() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval(), Duration::from_secs(12));
        assert_eq!(settings.list_limit, 200);
        assert!(settings.token.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let settings: Settings = toml::from_str(
            r#"
            api_base = "https://orders.example"
            poll_interval_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(settings.list_limit, 200);

        let settings = settings
            .with_env(env(&[
                ("ORDER_DESK_POLL_SECS", "5"),
                ("ORDER_DESK_TOKEN", "secret"),
                ("ORDER_DESK_ORG_ID", ""),
            ]))
            .unwrap();
        assert_eq!(settings.api_base, "https://orders.example");
        assert_eq!(settings.poll_interval_secs, 5);
        assert_eq!(settings.token.as_deref(), Some("secret"));
        assert_eq!(settings.org_id, None);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Settings::default()
            .with_env(env(&[("ORDER_DESK_LIST_LIMIT", "lots")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                var: "ORDER_DESK_LIST_LIMIT",
                value: "lots".into()
            }
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("order-desk-does-not-exist.toml");
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.channel_capacity, 32);
    }
}
