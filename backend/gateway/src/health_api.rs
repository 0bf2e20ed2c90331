//! Gateway Health API
//!
//! Reports process liveness with session and room counts.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sessions: usize,
    pub rooms: usize,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        service: "collabadoku".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        sessions: state.manager.session_count().await,
        rooms: state.manager.rooms().len().await,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_manager::SessionManager;
    use collabadoku_core::RandomSudokuGenerator;
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_sessions_and_rooms() {
        let manager = Arc::new(SessionManager::new(Arc::new(RandomSudokuGenerator::default())));
        let state = GatewayState::new(Arc::clone(&manager));

        let (tx, _rx) = manager.outbound_channel();
        let mut session = manager.connect(tx).await;
        manager.handle_text(&mut session, r#"{"roomCode":"health"}"#).await;

        let Json(report) = get_health(State(state)).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.service, "collabadoku");
        assert_eq!(report.sessions, 1);
        assert_eq!(report.rooms, 1);
    }
}
