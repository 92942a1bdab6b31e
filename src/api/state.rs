use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ai::catalog::Catalog;
use crate::ai::chat::{ChatError, ChatSession, Orchestrator};
use crate::core::AppConfig;

pub struct AppState {
    // In-memory only, sessions are gone when the server stops
    pub sessions: HashMap<String, Arc<ChatSession>>,
    pub orchestrator: Arc<Orchestrator>,
    pub catalog: Catalog,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, catalog: Catalog, config: AppConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            orchestrator: Arc::new(orchestrator),
            catalog,
            config,
        }
    }

    pub fn find_session(&self, id: &str) -> Result<Arc<ChatSession>, ChatError> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    /// New sessions start from the configured defaults.
    pub fn get_or_create_session(&mut self, id: &str) -> Result<Arc<ChatSession>, ChatError> {
        if let Some(session) = self.sessions.get(id) {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(ChatSession::new(id, self.config.session_config()?));
        self.sessions.insert(id.to_string(), Arc::clone(&session));
        tracing::debug!("Created chat session {}", id);
        Ok(session)
    }

    /// Discard a session and its transcript. A session with a run in
    /// flight can't be ended.
    pub fn end_session(&mut self, id: &str) -> Result<(), ChatError> {
        let session = self.find_session(id)?;
        if session.is_busy() {
            return Err(ChatError::Busy);
        }
        self.sessions.remove(id);
        Ok(())
    }

    /// Drop sessions idle for longer than `ttl`, skipping busy ones.
    /// Returns the ids that were removed.
    pub fn expire_idle(&mut self, ttl: Duration, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|s| !s.is_busy())
            .filter(|s| s.idle_for(now).to_std().is_ok_and(|idle| idle > ttl))
            .map(|s| s.id().to_string())
            .collect();
        for id in &expired {
            self.sessions.remove(id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::SimulatedProvider;

    fn state() -> AppState {
        let catalog = Catalog::builtin();
        let orchestrator = Orchestrator::builder()
            .provider(SimulatedProvider::instant(&catalog).unwrap())
            .build()
            .unwrap();
        AppState::new(orchestrator, catalog, AppConfig::default())
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let mut state = state();
        let a = state.get_or_create_session("abc").unwrap();
        let b = state.get_or_create_session("abc").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn test_end_session() {
        let mut state = state();
        state.get_or_create_session("abc").unwrap();
        state.end_session("abc").unwrap();
        assert!(matches!(
            state.end_session("abc"),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_expire_idle_sessions() {
        let mut state = state();
        state.get_or_create_session("old").unwrap();
        let later = Utc::now() + chrono::TimeDelta::seconds(120);

        assert!(state.expire_idle(Duration::from_secs(600), later).is_empty());
        assert_eq!(
            state.expire_idle(Duration::from_secs(60), later),
            vec![String::from("old")]
        );
        assert!(state.sessions.is_empty());
    }
}
