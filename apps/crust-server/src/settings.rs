use std::path::Path;

use anyhow::Context;
use crust::CrustConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use static_token_plugin::StaticTokenPluginConfig;

/// Environment prefix for server settings, e.g. `CRUST_SERVER__SERVER__BIND_ADDR`.
const ENV_PREFIX: &str = "CRUST_SERVER__";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: Server,
    pub crust: CrustConfig,
    pub verifier: StaticTokenPluginConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Server {
    pub bind_addr: String,
    /// Log output format: `text` or `json`.
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, then `CRUST_SERVER__*`
    /// environment variables (sections separated by `__`).
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load settings")
    }
}
