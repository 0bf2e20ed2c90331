//! Puzzle generation.
//!
//! Rooms get their starting grid from a [`PuzzleGenerator`]. The stock
//! generator fills a random complete solution and blanks cells until the
//! configured number of givens remains. Uniqueness of the solution is not
//! checked.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{CELL_COUNT, EMPTY_SENTINEL};

/// Source of fresh puzzles, called once per new room.
///
/// Returns 81 row-major characters over `1`..`9` and `-`.
pub trait PuzzleGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random Sudoku generator backed by `rand`.
#[derive(Debug, Clone)]
pub struct RandomSudokuGenerator {
    givens: usize,
}

impl RandomSudokuGenerator {
    pub const DEFAULT_GIVENS: usize = 36;
    /// Fewest givens a uniquely solvable Sudoku can have.
    pub const MIN_GIVENS: usize = 17;

    pub fn new(givens: usize) -> Self {
        Self {
            givens: givens.clamp(Self::MIN_GIVENS, CELL_COUNT),
        }
    }

    pub fn givens(&self) -> usize {
        self.givens
    }

    /// Generates a puzzle using the supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut board = [0u8; CELL_COUNT];
        // An empty board always has a completion.
        fill(&mut board, 0, rng);

        let mut order: Vec<usize> = (0..CELL_COUNT).collect();
        order.shuffle(rng);
        for &index in order.iter().take(CELL_COUNT - self.givens) {
            board[index] = 0;
        }

        board
            .iter()
            .map(|&digit| {
                if digit == 0 {
                    EMPTY_SENTINEL
                } else {
                    char::from(b'0' + digit)
                }
            })
            .collect()
    }
}

impl Default for RandomSudokuGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GIVENS)
    }
}

impl PuzzleGenerator for RandomSudokuGenerator {
    fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }
}

fn fill<R: Rng + ?Sized>(board: &mut [u8; CELL_COUNT], index: usize, rng: &mut R) -> bool {
    if index == CELL_COUNT {
        return true;
    }

    let mut digits: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    digits.shuffle(rng);
    for digit in digits {
        if allowed(board, index, digit) {
            board[index] = digit;
            if fill(board, index + 1, rng) {
                return true;
            }
            board[index] = 0;
        }
    }
    false
}

fn allowed(board: &[u8; CELL_COUNT], index: usize, digit: u8) -> bool {
    let row = index / 9;
    let column = index % 9;
    let box_row = row / 3 * 3;
    let box_column = column / 3 * 3;

    for i in 0..9 {
        if board[row * 9 + i] == digit || board[i * 9 + column] == digit {
            return false;
        }
        let r = box_row + i / 3;
        let c = box_column + i % 3;
        if board[r * 9 + c] == digit {
            return false;
        }
    }
    true
}
