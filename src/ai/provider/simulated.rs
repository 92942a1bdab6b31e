use std::time::Duration;

use anyhow::{Error, Result};
use async_trait::async_trait;
use handlebars::Handlebars;
use rand::Rng;

use super::CompletionProvider;
use crate::ai::catalog::Catalog;
use crate::ai::prompt;

/// Stand-in for a real backend. Waits a random amount of time inside the
/// latency window then renders the model's canned response template.
pub struct SimulatedProvider {
    templates: Handlebars<'static>,
    min_latency: Duration,
    max_latency: Duration,
}

impl SimulatedProvider {
    pub fn new(
        catalog: &Catalog,
        min_latency: Duration,
        max_latency: Duration,
    ) -> Result<Self, Error> {
        let templates = prompt::templates(catalog)?;
        // Tolerate a reversed window rather than panicking in gen_range
        let (min_latency, max_latency) = if min_latency <= max_latency {
            (min_latency, max_latency)
        } else {
            (max_latency, min_latency)
        };
        Ok(Self {
            templates,
            min_latency,
            max_latency,
        })
    }

    /// No delay at all. Used by tests and the terminal chat's `--fast`.
    pub fn instant(catalog: &Catalog) -> Result<Self, Error> {
        Self::new(catalog, Duration::ZERO, Duration::ZERO)
    }

    fn latency(&self) -> Duration {
        if self.max_latency.is_zero() {
            return Duration::ZERO;
        }
        let min = self.min_latency.as_millis() as u64;
        let max = self.max_latency.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait]
impl CompletionProvider for SimulatedProvider {
    async fn invoke(&self, model_id: &str, input: &str) -> Result<String, Error> {
        let delay = self.latency();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::debug!("Simulated {} responded after {:?}", model_id, delay);
        prompt::render(&self.templates, model_id, input)
    }
}
