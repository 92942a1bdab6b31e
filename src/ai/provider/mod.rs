//! Completion providers turn (model, input) into generated text.
mod simulated;

pub use simulated::SimulatedProvider;

use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;

/// A single-shot, non-streaming completion call. Implementations own
/// any timeout or retry policy; callers treat latency as unbounded and
/// must not assume identical inputs give identical outputs.
#[async_trait]
pub trait CompletionProvider {
    async fn invoke(&self, model_id: &str, input: &str) -> Result<String, Error>;
}

pub type SharedProvider = Arc<dyn CompletionProvider + Send + Sync + 'static>;
