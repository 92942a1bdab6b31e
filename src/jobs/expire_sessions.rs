use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::PeriodicJob;
use crate::api::SharedState;
use crate::core::AppConfig;

/// Discards sessions nobody has used for longer than the configured
/// TTL. Sessions with a run in flight are left alone.
#[derive(Debug)]
pub struct ExpireIdleSessions;

#[async_trait]
impl PeriodicJob for ExpireIdleSessions {
    fn interval(&self) -> Duration {
        // Run every minute
        Duration::from_secs(60)
    }

    async fn run_job(&self, config: &AppConfig, state: &SharedState) {
        let expired = state
            .write()
            .expect("Unable to write share state")
            .expire_idle(config.session_ttl(), Utc::now());

        if !expired.is_empty() {
            tracing::info!("Expired {} idle chat sessions", expired.len());
        }
    }
}
