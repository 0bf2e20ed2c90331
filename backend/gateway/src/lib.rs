//! collabadoku Gateway
//!
//! Room synchronization server: room registry, sessions, fan-out, and the
//! WebSocket/HTTP surface in front of them.

pub mod broadcast;
pub mod health_api;
pub mod room;
pub mod room_api;
pub mod room_registry;
pub mod server;
pub mod session;
pub mod session_manager;
pub mod session_registry;
pub mod ws_server;

pub use room::Room;
pub use room_registry::RoomRegistry;
pub use server::{build_router, start_server, GatewayState};
pub use session::Session;
pub use session_manager::{SessionManager, DEFAULT_OUTBOUND_BUFFER};
