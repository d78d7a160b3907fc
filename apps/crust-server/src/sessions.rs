//! In-process session store for single-node deployments and local development.

use async_trait::async_trait;
use crust::{SecurityContext, SessionStore, SessionStoreError};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SecurityContext>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SecurityContext>, SessionStoreError> {
        Ok(self
            .sessions
            .get(session_id)
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, session_id: &str, ctx: SecurityContext) -> Result<(), SessionStoreError> {
        self.sessions.insert(session_id.to_owned(), ctx);
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
