//! Room inspection API.
//!
//! Read-only view of an existing room: its cells as clients see them, how
//! many sessions are attached, and which cells hold duplicate values.
//! Never creates a room.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use collabadoku_core::{CellUpdate, Position};

use crate::server::GatewayState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub members: usize,
    pub cells: Vec<CellUpdate>,
    pub conflicts: Vec<Position>,
}

/// Handler for `GET /api/rooms/:code`
pub async fn get_room(
    State(state): State<GatewayState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, StatusCode> {
    let room = state
        .manager
        .rooms()
        .get(&code)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let room_state = room.lock().await;
    Ok(Json(RoomSnapshot {
        room_code: room.code().to_string(),
        members: room_state.members.len(),
        cells: room_state.grid.all_cells().iter().map(CellUpdate::from).collect(),
        conflicts: room_state.grid.conflicts(),
    }))
}
