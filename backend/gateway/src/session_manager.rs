//! Session Manager.
//!
//! Assigns session ids, applies decoded client intents to the session's
//! room and fans the resulting cell changes out to the other members.
//! Each connection drives its own session sequentially; sessions sharing a
//! room are serialized by the room lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use collabadoku_core::{
    decode_message, CellRef, CollabError, Intent, PuzzleGenerator, RawValue, ServerMessage,
    SessionId,
};
use logging::{sanitize_log_text, RoomEvent, RoomEventLogger};

use crate::broadcast::{self, ClientSender, Outbound};
use crate::room_registry::RoomRegistry;
use crate::session::Session;
use crate::session_registry::SessionRegistry;

/// Default capacity of each session's outbound queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

pub struct SessionManager {
    rooms: RoomRegistry,
    sessions: SessionRegistry,
    next_id: AtomicU64,
    outbound_buffer: usize,
}

impl SessionManager {
    pub fn new(generator: Arc<dyn PuzzleGenerator>) -> Self {
        Self {
            rooms: RoomRegistry::new(generator),
            sessions: SessionRegistry::new(),
            next_id: AtomicU64::new(1),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity.max(1);
        self
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Creates an outbound queue sized for one session.
    pub fn outbound_channel(&self) -> (ClientSender, mpsc::Receiver<Outbound>) {
        mpsc::channel(self.outbound_buffer)
    }

    /// Registers a new connection and returns its session.
    pub async fn connect(&self, outbound: ClientSender) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.register(id).await;
        RoomEventLogger::log_event(id, RoomEvent::Connected);
        Session::new(id, outbound)
    }

    /// Decodes one inbound frame and applies its intents in order.
    ///
    /// Failures are logged and scoped to the frame or intent; the
    /// connection stays open.
    pub async fn handle_text(&self, session: &mut Session, text: &str) {
        debug!(session_id = session.id, payload = %sanitize_log_text(text), "Received frame");

        let intents = match decode_message(text) {
            Ok(intents) => intents,
            Err(e) => {
                warn!(
                    session_id = session.id,
                    error = %e,
                    payload = %sanitize_log_text(text),
                    "Dropping malformed message"
                );
                return;
            }
        };

        for intent in intents {
            match self.apply(session, intent).await {
                Ok(()) => {}
                Err(CollabError::NotInRoom) => {
                    debug!(session_id = session.id, "Ignoring cell intent before joining a room");
                }
                Err(e) => {
                    warn!(session_id = session.id, error = %e, "Intent rejected");
                }
            }
        }
    }

    /// Applies a single intent to the session and its room.
    pub async fn apply(&self, session: &mut Session, intent: Intent) -> Result<(), CollabError> {
        match intent {
            Intent::SetName(name) => {
                session.name = name;
                self.restamp(session).await;
                Ok(())
            }
            Intent::SetColor(color) => {
                session.color = color;
                self.restamp(session).await;
                Ok(())
            }
            Intent::JoinRoom(code) => self.join(session, code).await,
            Intent::Select(cell) => self.select(session, cell).await,
            Intent::SetValue { cell, value } => self.set_value(session, cell, value).await,
            Intent::Unknown(key) => {
                info!(session_id = session.id, key = %sanitize_log_text(&key), "Received unknown key");
                Ok(())
            }
        }
    }

    /// Removes the session, releasing its selections for the room.
    pub async fn disconnect(&self, mut session: Session) {
        let room_code = session.room_code().map(str::to_owned);
        self.leave_current(&mut session).await;
        self.sessions.unregister(session.id).await;
        RoomEventLogger::log_event(session.id, RoomEvent::Disconnected { room_code });
    }

    async fn restamp(&self, session: &Session) {
        let Some(room) = &session.room else {
            return;
        };
        let mut state = room.lock().await;
        let cells = state.grid.restamp(
            session.id,
            session.name.as_deref(),
            session.color.as_deref(),
        );
        broadcast::fanout(&state.members, &cells, session.id);
    }

    async fn join(&self, session: &mut Session, code: String) -> Result<(), CollabError> {
        if code.is_empty() {
            return Err(CollabError::EmptyRoomCode);
        }

        if session.room_code() == Some(code.as_str()) {
            if let Some(room) = &session.room {
                let state = room.lock().await;
                let snapshot = ServerMessage::updates(&state.grid.all_cells());
                broadcast::send_to(session.id, &session.outbound, &snapshot);
            }
            return Ok(());
        }

        let (room, created) = match self.rooms.get_or_create(&code).await {
            Ok(found) => found,
            Err(e) => {
                RoomEventLogger::log_event(
                    session.id,
                    RoomEvent::JoinFailed {
                        room_code: code,
                        reason: e.to_string(),
                    },
                );
                let failure = ServerMessage::error("join_failed", e.to_string());
                broadcast::send_to(session.id, &session.outbound, &failure);
                return Err(e);
            }
        };

        self.leave_current(session).await;

        {
            let mut state = room.lock().await;
            if created {
                RoomEventLogger::log_event(
                    session.id,
                    RoomEvent::RoomCreated {
                        room_code: code.clone(),
                        puzzle: state.grid.to_puzzle_string(),
                    },
                );
            }
            state.members.insert(session.id, session.outbound.clone());
            let snapshot = ServerMessage::updates(&state.grid.all_cells());
            broadcast::send_to(session.id, &session.outbound, &snapshot);
        }

        self.sessions.set_room(session.id, Some(code.clone())).await;
        RoomEventLogger::log_event(session.id, RoomEvent::RoomJoined { room_code: code });
        session.room = Some(room);
        Ok(())
    }

    /// Detaches the session from its current room, if any.
    async fn leave_current(&self, session: &mut Session) {
        let Some(room) = session.room.take() else {
            return;
        };
        let mut state = room.lock().await;
        state.members.remove(&session.id);
        let released = state.grid.release(session.id);
        broadcast::fanout(&state.members, &released, session.id);
        drop(state);

        self.sessions.set_room(session.id, None).await;
        RoomEventLogger::log_event(
            session.id,
            RoomEvent::RoomLeft {
                room_code: room.code().to_string(),
                released_cells: released.len(),
            },
        );
    }

    async fn select(&self, session: &Session, cell: CellRef) -> Result<(), CollabError> {
        let room = session.room.as_ref().ok_or(CollabError::NotInRoom)?;
        let position = cell.position()?;

        let mut state = room.lock().await;
        let mut changed = state.grid.release(session.id);
        changed.retain(|released| released.position != position);
        let selected = state.grid.select(position, session.selection()).clone();
        changed.push(selected);

        broadcast::fanout(&state.members, &changed, session.id);
        Ok(())
    }

    async fn set_value(
        &self,
        session: &Session,
        cell: CellRef,
        value: Option<RawValue>,
    ) -> Result<(), CollabError> {
        let room = session.room.as_ref().ok_or(CollabError::NotInRoom)?;
        let position = cell.position()?;
        let digit = match value {
            Some(raw) => raw.into_digit()?,
            None => None,
        };

        let mut state = room.lock().await;
        if state.grid.cell(position).fixed {
            debug!(session_id = session.id, %position, "Overwriting a given cell");
        }
        let updated = state.grid.set_value(position, digit)?.clone();
        broadcast::fanout(&state.members, &[updated], session.id);
        Ok(())
    }

    /// Number of sessions currently connected.
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Id the next connection will receive.
    pub fn peek_next_id(&self) -> SessionId {
        self.next_id.load(Ordering::Relaxed)
    }
}
