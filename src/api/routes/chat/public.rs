//! Public types for the chat API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::chat::{Attachment, Entry, RunState, SessionConfig};

#[derive(Serialize, Clone)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub entries: usize,
    pub state: RunState,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Deserialize)]
pub struct ChatSessionsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ChatSessionsResponse {
    pub sessions: Vec<ChatSession>,
    pub page: usize,
    pub limit: usize,
    pub total_sessions: usize,
    pub total_pages: usize,
}

#[derive(Serialize)]
pub struct ChatTranscriptResponse {
    pub session_id: String,
    pub state: RunState,
    pub config: ChatConfig,
    pub transcript: Vec<Entry>,
}

/// The user-editable model selection for a session. `selected_model`
/// is used in single mode, `chain_models` when `chain_active` is set.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatConfig {
    pub chain_active: bool,
    pub chain_models: Vec<String>,
    pub selected_model: String,
}

impl From<SessionConfig> for ChatConfig {
    fn from(config: SessionConfig) -> Self {
        Self {
            chain_active: config.chain.is_active(),
            chain_models: config.chain.models().to_vec(),
            selected_model: config.selected_model,
        }
    }
}

/// One Server-Sent Event in the response to a chat request. Entries
/// arrive in transcript order, followed by exactly one `done` or
/// `failed` event.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Entry { entry: Entry },
    Done { state: RunState },
    Failed { error: String, state: RunState },
}
