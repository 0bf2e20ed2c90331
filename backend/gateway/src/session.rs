//! Server-side state of one connected participant.

use std::sync::Arc;

use collabadoku_core::{Selection, SessionId};

use crate::broadcast::ClientSender;
use crate::room::Room;

/// Owned by the connection's worker; nothing else mutates it.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub name: Option<String>,
    pub color: Option<String>,
    pub room: Option<Arc<Room>>,
    pub outbound: ClientSender,
}

impl Session {
    pub fn new(id: SessionId, outbound: ClientSender) -> Self {
        Self {
            id,
            name: None,
            color: None,
            room: None,
            outbound,
        }
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room.as_deref().map(Room::code)
    }

    /// The selection this session stamps onto cells it claims.
    pub fn selection(&self) -> Selection {
        Selection {
            session_id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}
