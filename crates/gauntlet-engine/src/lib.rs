//! Grid model and composite-state search for grading puzzle mazes.
//!
//! - [`core`] - tiles, positions and the immutable [`Grid`] with its parser
//! - [`search`] - breadth-first exploration of (position, keys, switch,
//!   teleporters, blocks) states
//!
//! # Example
//!
//! ```
//! use gauntlet_engine::{Grid, GridLimits, SearchBudget, explore};
//!
//! let grid = Grid::parse("S a A E", &GridLimits::default()).unwrap();
//! let outcome = explore(&grid, &SearchBudget::default());
//! assert_eq!(outcome.end_path().map(|path| path.moves()), Some(6));
//! ```

pub use self::{core::*, search::*};

pub mod core;
pub mod search;

/// Structural defect found before any search is attempted.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, serde::Serialize)]
#[serde(tag = "kind")]
pub enum ValidationError {
    #[display("unknown tile {glyph:?} at ({row}, {col})")]
    UnknownTile { glyph: char, row: usize, col: usize },
    #[display("row {row} has {found} cells, expected {expected}")]
    IrregularRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("grid is {rows}x{cols}, maximum edge length is {max_edge}")]
    SizeViolation {
        rows: usize,
        cols: usize,
        max_edge: usize,
    },
    #[display("no start tile 'S'")]
    MissingStart,
    #[display("expected exactly one start tile 'S', found {count}")]
    DuplicateStart { count: usize },
    #[display("no end tile 'E' or bonus exit")]
    MissingTerminal,
    #[display("{glyph:?} at ({row}, {col}) has no unlocking mechanism in the grid")]
    DanglingLock { glyph: char, row: usize, col: usize },
}
