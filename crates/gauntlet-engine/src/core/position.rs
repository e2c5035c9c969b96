/// A cell coordinate inside a [`Grid`](super::grid::Grid).
///
/// Rows grow downwards and columns grow to the right, matching the order in
/// which the grid text is read.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    derive_more::Display,
    serde::Serialize,
)]
#[display("({row}, {col})")]
pub struct Position {
    pub row: u16,
    pub col: u16,
}

impl Position {
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Returns the neighbouring coordinate in `dir`, or `None` if it would
    /// underflow. Upper bounds are checked by the grid.
    #[must_use]
    pub fn offset(self, dir: Direction) -> Option<Self> {
        let Self { row, col } = self;
        let (row, col) = match dir {
            Direction::Up => (row.checked_sub(1)?, col),
            Direction::Down => (row.checked_add(1)?, col),
            Direction::Left => (row, col.checked_sub(1)?),
            Direction::Right => (row, col.checked_add(1)?),
        };
        Some(Self { row, col })
    }

    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> u32 {
        u32::from(self.row.abs_diff(other.row)) + u32::from(self.col.abs_diff(other.col))
    }
}

/// One of the four orthogonal move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by the search. Fixed so that results are
    /// reproducible across runs.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}
