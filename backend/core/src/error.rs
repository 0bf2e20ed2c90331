use thiserror::Error;

/// Top-level error type for the collabadoku room server.
///
/// Every variant is scoped to a single message, connection, or room;
/// none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("cell ({row}, {column}) is outside 1..=9")]
    OutOfRange { row: i64, column: i64 },

    #[error("invalid cell value: {0}")]
    InvalidValue(String),

    #[error("malformed puzzle: {0}")]
    MalformedPuzzle(String),

    #[error("session has not joined a room")]
    NotInRoom,

    #[error("room code must not be empty")]
    EmptyRoomCode,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollabError {
    /// Short machine-readable code, used in error messages sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "malformed_message",
            Self::OutOfRange { .. } => "out_of_range",
            Self::InvalidValue(_) => "invalid_value",
            Self::MalformedPuzzle(_) => "malformed_puzzle",
            Self::NotInRoom => "not_in_room",
            Self::EmptyRoomCode => "empty_room_code",
            Self::Other(_) => "internal",
        }
    }
}
