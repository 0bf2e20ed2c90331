//! Room Event Logger
//!
//! Structured room lifecycle events (connect, join, leave, ...) emitted
//! through `tracing` under the `room_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::sanitize::sanitize_log_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    Connected,
    RoomCreated { room_code: String, puzzle: String },
    RoomJoined { room_code: String },
    RoomLeft { room_code: String, released_cells: usize },
    JoinFailed { room_code: String, reason: String },
    Disconnected { room_code: Option<String> },
}

#[derive(Debug, Serialize)]
pub struct RoomEventEntry {
    pub session_id: u64,
    pub timestamp: DateTime<Utc>,
    pub event: RoomEvent,
}

impl RoomEventEntry {
    /// Builds an entry with client-supplied strings sanitized.
    pub fn new(session_id: u64, mut event: RoomEvent) -> Self {
        match &mut event {
            RoomEvent::RoomCreated { room_code, .. }
            | RoomEvent::RoomJoined { room_code }
            | RoomEvent::RoomLeft { room_code, .. } => {
                *room_code = sanitize_log_text(room_code);
            }
            RoomEvent::JoinFailed { room_code, reason } => {
                *room_code = sanitize_log_text(room_code);
                *reason = sanitize_log_text(reason);
            }
            RoomEvent::Disconnected { room_code } => {
                if let Some(code) = room_code {
                    *code = sanitize_log_text(code);
                }
            }
            RoomEvent::Connected => {}
        }

        Self {
            session_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct RoomEventLogger;

impl RoomEventLogger {
    /// Logs a room lifecycle event for a session.
    pub fn log_event(session_id: u64, event: RoomEvent) {
        let entry = RoomEventEntry::new(session_id, event);
        info!(target: "room_events", session_id, event = ?entry, "Room event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_sanitizes_room_codes() {
        let entry = RoomEventEntry::new(
            3,
            RoomEvent::RoomJoined {
                room_code: "lobby\nfake".into(),
            },
        );
        assert_eq!(
            entry.event,
            RoomEvent::RoomJoined {
                room_code: "lobby?fake".into()
            }
        );
        assert_eq!(entry.session_id, 3);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(RoomEvent::RoomLeft {
            room_code: "a".into(),
            released_cells: 1,
        })
        .unwrap();
        assert_eq!(value["type"], "RoomLeft");
        assert_eq!(value["released_cells"], 1);
    }
}
