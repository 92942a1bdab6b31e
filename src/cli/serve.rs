use anyhow::Result;

use crate::api;
use crate::core::AppConfig;

pub async fn run(host: Option<String>, port: Option<String>) -> Result<()> {
    let config = AppConfig::default();
    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or_else(|| config.port.clone());
    api::serve(host, port, config).await
}
