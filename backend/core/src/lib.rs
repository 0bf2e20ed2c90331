//! Core types for the collabadoku room server: the grid store, puzzle
//! generation, the wire protocol and the error taxonomy.

pub mod error;
pub mod grid;
pub mod protocol;
pub mod puzzle;

pub use error::CollabError;
pub use grid::{Cell, Grid, Position, Selection, SessionId, CELL_COUNT, EMPTY_SENTINEL};
pub use protocol::{decode_message, CellRef, CellUpdate, Intent, RawValue, ServerMessage};
pub use puzzle::{PuzzleGenerator, RandomSudokuGenerator};
