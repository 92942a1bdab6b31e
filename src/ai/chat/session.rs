//! A chat session owns one transcript, the caller-owned configuration
//! for choosing models, and the run state that gates submissions.
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};

use super::error::ChatError;
use super::models::{Entry, Transcript};
use super::state::RunState;

/// Ordered list of models for chain mode and whether chain mode is on.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    model_sequence: Vec<String>,
    active: bool,
}

impl ChainConfig {
    /// Duplicates are allowed, empty sequences and blank ids are not.
    pub fn new(model_sequence: Vec<String>, active: bool) -> Result<Self, ChatError> {
        if model_sequence.is_empty() {
            return Err(ChatError::EmptyChain);
        }
        if model_sequence.iter().any(|m| m.trim().is_empty()) {
            return Err(ChatError::MissingModel);
        }
        Ok(Self {
            model_sequence,
            active,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.model_sequence
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Everything the user can change between submissions.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub selected_model: String,
    pub chain: ChainConfig,
}

impl SessionConfig {
    pub fn new(selected_model: &str, chain: ChainConfig) -> Result<Self, ChatError> {
        if selected_model.trim().is_empty() {
            return Err(ChatError::MissingModel);
        }
        Ok(Self {
            selected_model: selected_model.to_string(),
            chain,
        })
    }

    /// The models one submission will call, in order.
    pub fn plan(&self) -> Vec<String> {
        if self.chain.is_active() {
            self.chain.models().to_vec()
        } else {
            vec![self.selected_model.clone()]
        }
    }
}

pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    last_active: Mutex<DateTime<Utc>>,
    transcript: Mutex<Transcript>,
    config: RwLock<SessionConfig>,
    state: Arc<watch::Sender<RunState>>,
}

impl ChatSession {
    pub fn new(id: &str, config: SessionConfig) -> Self {
        let now = Utc::now();
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            id: id.to_string(),
            created_at: now,
            last_active: Mutex::new(now),
            transcript: Mutex::new(Transcript::new()),
            config: RwLock::new(config),
            state: Arc::new(state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Snapshot of the transcript in creation order.
    pub fn entries(&self) -> Vec<Entry> {
        self.transcript
            .lock()
            .expect("Unable to read transcript")
            .all()
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.transcript.lock().expect("Unable to read transcript").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Entry> {
        self.transcript
            .lock()
            .expect("Unable to read transcript")
            .subscribe()
    }

    pub(crate) fn append(&self, entry: Entry) {
        self.transcript
            .lock()
            .expect("Unable to write transcript")
            .append(entry);
        self.touch();
    }

    pub fn config(&self) -> SessionConfig {
        self.config.read().expect("Unable to read config").clone()
    }

    pub fn set_config(&self, config: SessionConfig) {
        *self.config.write().expect("Unable to write config") = config;
        self.touch();
    }

    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Resolves once no submission is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self` so this can't close early
        let _ = rx.wait_for(|s| !s.is_busy()).await;
    }

    /// How long since the last append or config change.
    pub fn idle_for(&self, now: DateTime<Utc>) -> TimeDelta {
        now - *self.last_active.lock().expect("Unable to read session")
    }

    fn touch(&self) {
        *self.last_active.lock().expect("Unable to write session") = Utc::now();
    }

    /// Marks the session busy. Fails with `Busy` if a run is already in
    /// flight so two submissions never interleave on one transcript.
    pub(crate) fn begin(&self, total: usize) -> Result<RunGuard, ChatError> {
        let started = self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            *state = RunState::Running { step: 1, total };
            true
        });
        if !started {
            return Err(ChatError::Busy);
        }
        self.touch();
        Ok(RunGuard {
            session_id: self.id.clone(),
            state: Arc::clone(&self.state),
            total,
            finished: false,
        })
    }
}

/// Held for the duration of one submission. Owns its handle on the run
/// state so it can move into a spawned task. Dropping it without calling
/// `done` or `fail` still releases the busy flag.
pub(crate) struct RunGuard {
    session_id: String,
    state: Arc<watch::Sender<RunState>>,
    total: usize,
    finished: bool,
}

impl RunGuard {
    pub(crate) fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(crate) fn step(&self, step: usize) {
        self.state.send_replace(RunState::Running {
            step,
            total: self.total,
        });
    }

    pub(crate) fn done(mut self) {
        self.finished = true;
        self.state.send_replace(RunState::Done { steps: self.total });
    }

    pub(crate) fn fail(mut self, step: usize, model: &str, reason: &str) {
        self.finished = true;
        self.state.send_replace(RunState::Failed {
            step,
            model: model.to_string(),
            reason: reason.to_string(),
        });
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let step = match *self.state.borrow() {
            RunState::Running { step, .. } => step,
            _ => 0,
        };
        tracing::warn!("Run in session {} ended without finishing", self.session_id);
        self.state.send_replace(RunState::Failed {
            step,
            model: String::new(),
            reason: String::from("interrupted"),
        });
    }
}
