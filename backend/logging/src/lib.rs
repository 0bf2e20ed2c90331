//! Structured logging for the collabadoku server.
//!
//! Console output plus optional rolling NDJSON files, room lifecycle
//! events, and sanitizing of client-supplied text before it reaches a log.

pub mod event_logger;
pub mod logger;
pub mod sanitize;

pub use event_logger::{RoomEvent, RoomEventEntry, RoomEventLogger};
pub use logger::init_logger;
pub use sanitize::sanitize_log_text;
