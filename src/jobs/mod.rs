//! Background jobs that run on a fixed interval for the life of the
//! server.
mod expire_sessions;

pub use expire_sessions::ExpireIdleSessions;

use std::time::Duration;

use async_trait::async_trait;

use crate::api::SharedState;
use crate::core::AppConfig;

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self, config: &AppConfig, state: &SharedState);
}

/// Spawn `job` in its own tokio task, running it once per interval.
pub fn spawn_periodic_job<J: PeriodicJob>(config: AppConfig, state: SharedState, job: J) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(job.interval());
        // The first tick completes immediately, skip it so the job
        // doesn't run at startup
        interval.tick().await;
        loop {
            interval.tick().await;
            job.run_job(&config, &state).await;
        }
    });
}
