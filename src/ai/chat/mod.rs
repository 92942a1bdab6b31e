mod core;
mod error;
mod models;
mod session;
mod state;

pub use self::core::{Orchestrator, OrchestratorBuilder, PendingRun};
pub use error::ChatError;
pub use models::{Attachment, Entry, Origin, Submission, Transcript};
pub use session::{ChainConfig, ChatSession, SessionConfig};
pub use state::RunState;
