//! Errors produced while running a submission against a session.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// No text and no attachments. Callers treat this as a silent no-op.
    #[error("Submission is empty")]
    EmptySubmission,

    #[error("Session is busy with another submission")]
    Busy,

    #[error("Chain must contain at least one model")]
    EmptyChain,

    #[error("A model identifier is required")]
    MissingModel,

    #[error("Chat session {0} not found")]
    SessionNotFound(String),

    /// The completion provider rejected the call for `model` at chain
    /// position `step` (1-based; single mode is always step 1).
    #[error("Model {model} failed at step {step}: {source}")]
    ProviderFailure {
        step: usize,
        model: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ChatError {
    /// Errors that are the caller's fault rather than the session's.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChatError::EmptySubmission
                | ChatError::Busy
                | ChatError::EmptyChain
                | ChatError::MissingModel
        )
    }
}
