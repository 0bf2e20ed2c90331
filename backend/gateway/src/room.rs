//! A shared puzzle room.
//!
//! The grid and the member list sit behind one async mutex. Every mutation
//! and the fan-out it triggers happen while that lock is held, so all
//! members observe a room's updates in the same order.

use tokio::sync::{Mutex, MutexGuard};

use collabadoku_core::Grid;

use crate::broadcast::Members;

pub struct RoomState {
    pub grid: Grid,
    pub members: Members,
}

pub struct Room {
    code: String,
    state: Mutex<RoomState>,
}

impl Room {
    pub fn new(code: impl Into<String>, grid: Grid) -> Self {
        Self {
            code: code.into(),
            state: Mutex::new(RoomState {
                grid,
                members: Members::new(),
            }),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Enters the room's serialization path.
    pub async fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().await
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("code", &self.code).finish_non_exhaustive()
    }
}
