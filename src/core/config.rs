use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Error, Result};

use crate::ai::catalog::Catalog;
use crate::ai::chat::{ChainConfig, ChatError, SessionConfig};
use crate::ai::provider::SimulatedProvider;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub default_model: String,
    pub default_chain: Vec<String>,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub catalog_path: Option<String>,
    pub session_ttl_secs: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma separated list of model ids, dropping blanks.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        let host = env::var("MODELVERSE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("MODELVERSE_PORT").unwrap_or_else(|_| "2222".to_string());
        let default_model = env::var("MODELVERSE_DEFAULT_MODEL")
            .unwrap_or_else(|_| "mistral-7b-instruct".to_string());
        let default_chain = parse_model_list(
            &env::var("MODELVERSE_DEFAULT_CHAIN")
                .unwrap_or_else(|_| "mistral-7b-instruct,deepseek-chat".to_string()),
        );
        let catalog_path = env::var("MODELVERSE_CATALOG_PATH").ok();

        Self {
            host,
            port,
            default_model,
            default_chain,
            min_latency_ms: env_or("MODELVERSE_MIN_LATENCY_MS", 1000),
            max_latency_ms: env_or("MODELVERSE_MAX_LATENCY_MS", 3000),
            catalog_path,
            session_ttl_secs: env_or("MODELVERSE_SESSION_TTL_SECS", 60 * 60),
        }
    }
}

impl AppConfig {
    /// The built-in catalog unless a catalog file is configured.
    pub fn catalog(&self) -> Result<Catalog, Error> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::builtin()),
        }
    }

    pub fn provider(&self, catalog: &Catalog) -> Result<SimulatedProvider, Error> {
        SimulatedProvider::new(
            catalog,
            Duration::from_millis(self.min_latency_ms),
            Duration::from_millis(self.max_latency_ms),
        )
    }

    /// Configuration every new session starts with: single mode on the
    /// default model, with the default chain ready to switch on.
    pub fn session_config(&self) -> Result<SessionConfig, ChatError> {
        let chain = ChainConfig::new(self.default_chain.clone(), false)?;
        SessionConfig::new(&self.default_model, chain)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
