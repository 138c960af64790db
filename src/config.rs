use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ml::emissions::{default_factors, DEFAULT_FALLBACK_FACTOR};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub emissions: EmissionsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Emission factors in kg CO2e per pound spent.
#[derive(Debug, Deserialize, Clone)]
pub struct EmissionsConfig {
    #[serde(default = "default_factors")]
    pub factors: BTreeMap<String, f64>,
    #[serde(default = "default_fallback_factor")]
    pub fallback_factor: f64,
}

fn default_fallback_factor() -> f64 {
    DEFAULT_FALLBACK_FACTOR
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            factors: default_factors(),
            fallback_factor: default_fallback_factor(),
        }
    }
}

impl AppConfig {
    /// Optional `config.{toml,yaml,json}` in the working directory, then
    /// `ALGOGRASS__SECTION__KEY` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("ALGOGRASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.emissions.factors.get("Electricity"), Some(&0.25));
        assert_eq!(config.emissions.fallback_factor, 0.15);
    }

    #[test]
    fn test_empty_source_uses_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.emissions.factors.len(), 6);
    }

    #[test]
    fn test_overrides() {
        let config: AppConfig = config::Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("emissions.fallback_factor", 0.2)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.emissions.fallback_factor, 0.2);
    }
}
