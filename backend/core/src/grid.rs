//! Grid Store: the 81 cells of one room.
//!
//! Knows nothing about networking. Cells are addressed by [`Position`] and
//! always fetched through the grid, never cached across calls.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CollabError;
use crate::protocol::CellRef;

/// Process-unique identifier of a connected session.
pub type SessionId = u64;

/// Cells per row, column and box edge.
pub const GRID_SIZE: u8 = 9;

/// Number of cells in a grid.
pub const CELL_COUNT: usize = 81;

/// Character marking a non-given cell in a puzzle string.
pub const EMPTY_SENTINEL: char = '-';

/// A validated (row, column) pair, both in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CellRef")]
pub struct Position {
    row: u8,
    column: u8,
}

impl Position {
    pub fn new(row: i64, column: i64) -> Result<Self, CollabError> {
        let range = 1..=i64::from(GRID_SIZE);
        if !range.contains(&row) || !range.contains(&column) {
            return Err(CollabError::OutOfRange { row, column });
        }
        Ok(Self {
            row: row as u8,
            column: column as u8,
        })
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn column(&self) -> u8 {
        self.column
    }

    /// Row-major index into a flat 81-cell array.
    pub fn index(&self) -> usize {
        usize::from(self.row - 1) * usize::from(GRID_SIZE) + usize::from(self.column - 1)
    }

    fn from_index(index: usize) -> Self {
        let size = usize::from(GRID_SIZE);
        Self {
            row: (index / size + 1) as u8,
            column: (index % size + 1) as u8,
        }
    }

    /// The 3x3 box this position belongs to, numbered 0..9 row-major.
    pub fn box_index(&self) -> u8 {
        ((self.row - 1) / 3) * 3 + (self.column - 1) / 3
    }

    /// All 81 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..CELL_COUNT).map(Position::from_index)
    }
}

impl TryFrom<CellRef> for Position {
    type Error = CollabError;

    fn try_from(cell: CellRef) -> Result<Self, Self::Error> {
        Position::new(cell.row, cell.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Who is currently "typing here". Display back-reference only, not a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub session_id: SessionId,
    pub name: Option<String>,
    pub color: Option<String>,
}

/// One grid position with its value, given flag and current selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub position: Position,
    pub value: Option<u8>,
    pub fixed: bool,
    pub selected_by: Option<Selection>,
}

impl Cell {
    fn empty(position: Position) -> Self {
        Self {
            position,
            value: None,
            fixed: false,
            selected_by: None,
        }
    }

    pub fn is_selected_by(&self, session_id: SessionId) -> bool {
        self.selected_by
            .as_ref()
            .is_some_and(|selection| selection.session_id == session_id)
    }
}

/// Checks a digit is a legal cell value.
pub fn validate_digit(value: i64) -> Result<u8, CollabError> {
    if (1..=i64::from(GRID_SIZE)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(CollabError::InvalidValue(value.to_string()))
    }
}

/// The cell collection of one room, stored row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from an 81-character puzzle string.
    ///
    /// `-` marks an open cell; `1`..`9` are givens and become fixed.
    pub fn initialize(puzzle: &str) -> Result<Self, CollabError> {
        let count = puzzle.chars().count();
        if count != CELL_COUNT {
            return Err(CollabError::MalformedPuzzle(format!(
                "expected {CELL_COUNT} characters, found {count}"
            )));
        }

        let mut cells = Vec::with_capacity(CELL_COUNT);
        for (index, ch) in puzzle.chars().enumerate() {
            let position = Position::from_index(index);
            let cell = match ch {
                EMPTY_SENTINEL => Cell::empty(position),
                '1'..='9' => Cell {
                    value: ch.to_digit(10).map(|digit| digit as u8),
                    fixed: true,
                    ..Cell::empty(position)
                },
                other => {
                    return Err(CollabError::MalformedPuzzle(format!(
                        "unexpected character '{other}' at position {index}"
                    )));
                }
            };
            cells.push(cell);
        }

        Ok(Self { cells })
    }

    /// Fetches a cell by raw coordinates.
    pub fn get(&self, row: i64, column: i64) -> Result<&Cell, CollabError> {
        Ok(self.cell(Position::new(row, column)?))
    }

    pub fn cell(&self, position: Position) -> &Cell {
        &self.cells[position.index()]
    }

    fn cell_mut(&mut self, position: Position) -> &mut Cell {
        &mut self.cells[position.index()]
    }

    /// Writes a value (or clears it with `None`).
    ///
    /// Fixed cells are writable too; callers decide whether that matters.
    pub fn set_value(&mut self, position: Position, value: Option<u8>) -> Result<&Cell, CollabError> {
        if let Some(digit) = value {
            validate_digit(i64::from(digit))?;
        }
        let cell = self.cell_mut(position);
        cell.value = value;
        Ok(cell)
    }

    /// Claims a cell for a session, overwriting any previous holder.
    pub fn select(&mut self, position: Position, selection: Selection) -> &Cell {
        let cell = self.cell_mut(position);
        cell.selected_by = Some(selection);
        cell
    }

    pub fn unselect(&mut self, position: Position) -> &Cell {
        let cell = self.cell_mut(position);
        cell.selected_by = None;
        cell
    }

    /// Cells currently selected by the given session, row-major.
    pub fn cells_selected_by(&self, session_id: SessionId) -> Vec<Cell> {
        self.cells
            .iter()
            .filter(|cell| cell.is_selected_by(session_id))
            .cloned()
            .collect()
    }

    /// Unselects everything the session holds and returns the cleared cells.
    pub fn release(&mut self, session_id: SessionId) -> Vec<Cell> {
        self.cells
            .iter_mut()
            .filter(|cell| cell.is_selected_by(session_id))
            .map(|cell| {
                cell.selected_by = None;
                cell.clone()
            })
            .collect()
    }

    /// Rewrites the display name and color on every cell the session holds.
    pub fn restamp(
        &mut self,
        session_id: SessionId,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Vec<Cell> {
        let mut stamped = Vec::new();
        for cell in self.cells.iter_mut() {
            if let Some(selection) = cell.selected_by.as_mut() {
                if selection.session_id == session_id {
                    selection.name = name.map(str::to_owned);
                    selection.color = color.map(str::to_owned);
                    stamped.push(cell.clone());
                }
            }
        }
        stamped
    }

    /// All 81 cells in row-major order.
    pub fn all_cells(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    /// Positions whose value repeats within a row, column or box.
    pub fn conflicts(&self) -> Vec<Position> {
        let mut units: HashMap<(char, u8, u8), Vec<Position>> = HashMap::new();
        for cell in &self.cells {
            let Some(value) = cell.value else { continue };
            let position = cell.position;
            units.entry(('r', position.row(), value)).or_default().push(position);
            units.entry(('c', position.column(), value)).or_default().push(position);
            units.entry(('b', position.box_index(), value)).or_default().push(position);
        }

        let conflicting: BTreeSet<Position> = units
            .into_values()
            .filter(|positions| positions.len() > 1)
            .flatten()
            .collect();
        conflicting.into_iter().collect()
    }

    /// Current values as an 81-character string, `-` for empty cells.
    pub fn to_puzzle_string(&self) -> String {
        self.cells
            .iter()
            .map(|cell| match cell.value {
                Some(digit) => char::from(b'0' + digit),
                None => EMPTY_SENTINEL,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUZZLE: &str =
        "53--7----6--195----98----6-8---6---34--8-3--17---2---6-6----28----419--5----8--79";

    fn pos(row: i64, column: i64) -> Position {
        Position::new(row, column).unwrap()
    }

    #[test]
    fn positions_deserialize_only_in_range() {
        let ok: Position = serde_json::from_str(r#"{"row":9,"column":1}"#).unwrap();
        assert_eq!(ok, pos(9, 1));
        assert_eq!(ok.index(), 72);

        for text in [r#"{"row":0,"column":0}"#, r#"{"row":1,"column":10}"#] {
            assert!(serde_json::from_str::<Position>(text).is_err(), "{text}");
        }
    }

    fn selection(session_id: SessionId, name: &str) -> Selection {
        Selection {
            session_id,
            name: Some(name.into()),
            color: Some("#ff0000".into()),
        }
    }

    #[test]
    fn initialize_marks_givens_fixed() {
        let grid = Grid::initialize(PUZZLE).unwrap();
        let cells = grid.all_cells();
        assert_eq!(cells.len(), CELL_COUNT);

        for (cell, ch) in cells.iter().zip(PUZZLE.chars()) {
            if ch == EMPTY_SENTINEL {
                assert!(!cell.fixed);
                assert_eq!(cell.value, None);
            } else {
                assert!(cell.fixed);
                assert_eq!(cell.value, ch.to_digit(10).map(|d| d as u8));
            }
            assert!(cell.selected_by.is_none());
        }

        let first = grid.get(1, 1).unwrap();
        assert_eq!(first.value, Some(5));
        assert!(first.fixed);
        let open = grid.get(1, 3).unwrap();
        assert_eq!(open.value, None);
        assert!(!open.fixed);
    }

    #[test]
    fn all_cells_is_row_major() {
        let grid = Grid::initialize(PUZZLE).unwrap();
        let positions: Vec<Position> = grid.all_cells().iter().map(|c| c.position).collect();
        let expected: Vec<Position> = Position::all().collect();
        assert_eq!(positions, expected);
        assert_eq!(positions[9], pos(2, 1));
        assert_eq!(grid.to_puzzle_string(), PUZZLE);
    }

    #[test]
    fn initialize_rejects_bad_length() {
        let err = Grid::initialize(&PUZZLE[..80]).unwrap_err();
        assert!(matches!(err, CollabError::MalformedPuzzle(_)));
    }

    #[test]
    fn initialize_rejects_bad_characters() {
        let zero = PUZZLE.replacen('-', "0", 1);
        assert!(matches!(
            Grid::initialize(&zero),
            Err(CollabError::MalformedPuzzle(_))
        ));
        let letter = PUZZLE.replacen('5', "x", 1);
        assert!(matches!(
            Grid::initialize(&letter),
            Err(CollabError::MalformedPuzzle(_))
        ));
    }

    #[test]
    fn positions_outside_grid_are_rejected() {
        let grid = Grid::initialize(PUZZLE).unwrap();
        for (row, column) in [(0, 1), (1, 0), (10, 5), (5, 10), (-1, 3)] {
            assert!(matches!(
                grid.get(row, column),
                Err(CollabError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn set_value_updates_and_clears() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        let cell = grid.set_value(pos(1, 3), Some(4)).unwrap();
        assert_eq!(cell.value, Some(4));
        let cell = grid.set_value(pos(1, 3), None).unwrap();
        assert_eq!(cell.value, None);
        assert!(matches!(
            grid.set_value(pos(1, 3), Some(0)),
            Err(CollabError::InvalidValue(_))
        ));
    }

    #[test]
    fn set_value_on_given_is_permitted() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        let cell = grid.set_value(pos(1, 1), Some(9)).unwrap();
        assert_eq!(cell.value, Some(9));
        assert!(cell.fixed);
    }

    #[test]
    fn select_is_last_writer_wins() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        grid.select(pos(2, 2), selection(1, "alice"));
        grid.select(pos(2, 2), selection(2, "bob"));

        let cell = grid.cell(pos(2, 2));
        assert!(cell.is_selected_by(2));
        assert!(grid.cells_selected_by(1).is_empty());
        assert_eq!(grid.cells_selected_by(2).len(), 1);
    }

    #[test]
    fn unselect_is_idempotent() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        grid.select(pos(4, 4), selection(1, "alice"));
        assert!(grid.unselect(pos(4, 4)).selected_by.is_none());
        assert!(grid.unselect(pos(4, 4)).selected_by.is_none());
    }

    #[test]
    fn release_clears_only_that_session() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        grid.select(pos(1, 3), selection(1, "alice"));
        grid.select(pos(9, 9), selection(1, "alice"));
        grid.select(pos(5, 5), selection(2, "bob"));

        let released = grid.release(1);
        assert_eq!(released.len(), 2);
        assert!(released.iter().all(|cell| cell.selected_by.is_none()));
        assert!(grid.cells_selected_by(1).is_empty());
        assert!(grid.cell(pos(5, 5)).is_selected_by(2));
    }

    #[test]
    fn restamp_rewrites_identity() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        grid.select(pos(3, 3), selection(7, "old"));

        let stamped = grid.restamp(7, Some("new"), Some("blue"));
        assert_eq!(stamped.len(), 1);
        let holder = grid.cell(pos(3, 3)).selected_by.clone().unwrap();
        assert_eq!(holder.name.as_deref(), Some("new"));
        assert_eq!(holder.color.as_deref(), Some("blue"));
        assert!(grid.restamp(8, Some("x"), None).is_empty());
    }

    #[test]
    fn conflicts_flag_duplicates_in_units() {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        assert!(grid.conflicts().is_empty());

        // Row 1 already holds a 5 at (1, 1).
        grid.set_value(pos(1, 3), Some(5)).unwrap();
        assert_eq!(grid.conflicts(), vec![pos(1, 1), pos(1, 3)]);

        grid.set_value(pos(1, 3), None).unwrap();
        assert!(grid.conflicts().is_empty());
    }

    #[test]
    fn box_index_is_row_major() {
        assert_eq!(pos(1, 1).box_index(), 0);
        assert_eq!(pos(2, 6).box_index(), 1);
        assert_eq!(pos(5, 5).box_index(), 4);
        assert_eq!(pos(9, 9).box_index(), 8);
    }
}
