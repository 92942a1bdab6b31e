//! Run state of a chat session. `Running` is the busy flag; everything
//! else is idle.
use serde::Serialize;

#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    /// `step` is the 1-based position of the in-flight call.
    Running { step: usize, total: usize },
    Done { steps: usize },
    Failed {
        step: usize,
        model: String,
        reason: String,
    },
}

impl RunState {
    pub fn is_busy(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}
