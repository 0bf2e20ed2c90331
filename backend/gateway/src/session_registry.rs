//! Connected Session Table.
//!
//! Tracks which sessions are connected and which room each one is in.
//! Used for inspection; fan-out targets come from room membership.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use collabadoku_core::SessionId;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Option<String>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected session.
    pub async fn register(&self, session_id: SessionId) {
        let mut w = self.sessions.write().await;
        w.insert(session_id, None);
    }

    /// Record the room a session is now in.
    pub async fn set_room(&self, session_id: SessionId, room_code: Option<String>) {
        let mut w = self.sessions.write().await;
        if let Some(slot) = w.get_mut(&session_id) {
            *slot = room_code;
        }
    }

    /// Unregister a disconnected session.
    pub async fn unregister(&self, session_id: SessionId) {
        let mut w = self.sessions.write().await;
        w.remove(&session_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Number of connected sessions per room code.
    pub async fn room_counts(&self) -> BTreeMap<String, usize> {
        let r = self.sessions.read().await;
        let mut counts = BTreeMap::new();
        for code in r.values().flatten() {
            *counts.entry(code.clone()).or_insert(0) += 1;
        }
        counts
    }
}
