use std::{fmt, str::FromStr};

use crate::ValidationError;

use super::{
    position::{Direction, Position},
    tile::{CondDoorKind, KeySet, TeleportId, Tile},
};

/// Size limits applied while parsing a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridLimits {
    /// Maximum number of rows and of columns.
    pub max_edge: u16,
}

impl GridLimits {
    pub const DEFAULT_MAX_EDGE: u16 = 64;
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            max_edge: Self::DEFAULT_MAX_EDGE,
        }
    }
}

/// Number of tiles of each kind in a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ElementCounts {
    pub floor: usize,
    pub walls: usize,
    pub ends: usize,
    pub bonus_ends: usize,
    pub keys: usize,
    pub doors: usize,
    pub conditional_doors: usize,
    pub gates: usize,
    pub switches: usize,
    pub traps: usize,
    pub teleport_entries: usize,
    pub teleport_exits: usize,
    pub movable_blocks: usize,
}

impl ElementCounts {
    fn add(&mut self, tile: Tile) {
        let counter = match tile {
            Tile::Empty => &mut self.floor,
            Tile::Wall => &mut self.walls,
            Tile::Start => return,
            Tile::End => &mut self.ends,
            Tile::BonusEnd(_) => &mut self.bonus_ends,
            Tile::Key(_) => &mut self.keys,
            Tile::Door(_) => &mut self.doors,
            Tile::Trap => &mut self.traps,
            Tile::TeleportEntry(_) => &mut self.teleport_entries,
            Tile::TeleportExit(_) => &mut self.teleport_exits,
            Tile::Switch => &mut self.switches,
            Tile::Gate => &mut self.gates,
            Tile::MovableBlock => &mut self.movable_blocks,
            Tile::CondDoor(_) => &mut self.conditional_doors,
        };
        *counter += 1;
    }

    /// Total number of stateful mechanics (everything a search state tracks).
    #[must_use]
    pub fn mechanics(&self) -> usize {
        self.keys
            + self.doors
            + self.conditional_doors
            + self.gates
            + self.switches
            + self.teleport_entries
            + self.movable_blocks
    }
}

/// Immutable rectangular maze.
///
/// Built once by [`Grid::parse`], which guarantees:
///
/// - every row has the same length and both edges are within [`GridLimits`]
/// - exactly one [`Tile::Start`] and at least one terminal tile exist
/// - every door, gate and key-operated conditional door has an unlocking
///   mechanism; a switch-only door may stand without a switch and stays shut
///
/// Movable blocks are recorded at their authored positions; the search moves
/// them in its own state and never mutates the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: u16,
    cols: u16,
    tiles: Vec<Tile>,
    start: Position,
    blocks: Vec<Position>,
    teleport_entries: Vec<Position>,
    teleport_exits: Vec<Position>,
    counts: ElementCounts,
}

impl Grid {
    /// Parses and validates grid text.
    ///
    /// Leading and trailing blank lines are ignored; every other line is one
    /// row, with spaces meaning floor.
    pub fn parse(text: &str, limits: &GridLimits) -> Result<Self, ValidationError> {
        let lines = trim_blank_lines(text);
        let max_edge = usize::from(limits.max_edge);
        let num_rows = lines.len();
        let num_cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if num_rows > max_edge || num_cols > max_edge {
            return Err(ValidationError::SizeViolation {
                rows: num_rows,
                cols: num_cols,
                max_edge,
            });
        }

        let mut entry_count = 0;
        let mut exit_count = 0;
        let mut decoded = Vec::with_capacity(num_rows);
        for (row, line) in lines.iter().enumerate() {
            let mut cells = Vec::with_capacity(num_cols);
            for (col, glyph) in line.chars().enumerate() {
                let tile = match glyph {
                    'O' => {
                        entry_count += 1;
                        Tile::TeleportEntry(TeleportId(entry_count - 1))
                    }
                    'Q' => {
                        exit_count += 1;
                        Tile::TeleportExit(TeleportId(exit_count - 1))
                    }
                    _ => Tile::from_glyph(glyph)
                        .ok_or(ValidationError::UnknownTile { glyph, row, col })?,
                };
                cells.push(tile);
            }
            decoded.push(cells);
        }

        if let Some(expected) = decoded.first().map(Vec::len) {
            if let Some((row, cells)) = decoded
                .iter()
                .enumerate()
                .find(|(_, cells)| cells.len() != expected)
            {
                return Err(ValidationError::IrregularRow {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }

        // Both edges fit in u16 because they are bounded by `max_edge`.
        let rows = u16::try_from(num_rows).unwrap_or(u16::MAX);
        let cols = u16::try_from(num_cols).unwrap_or(u16::MAX);
        let tiles = decoded.into_iter().flatten().collect::<Vec<_>>();
        let grid = Self::from_tiles(rows, cols, tiles)?;
        grid.check_locks()?;
        Ok(grid)
    }

    fn from_tiles(rows: u16, cols: u16, tiles: Vec<Tile>) -> Result<Self, ValidationError> {
        let mut starts = vec![];
        let mut blocks = vec![];
        let mut teleport_entries = vec![];
        let mut teleport_exits = vec![];
        let mut counts = ElementCounts::default();
        let positions = (0..rows).flat_map(|row| (0..cols).map(move |col| Position::new(row, col)));
        for (pos, &tile) in positions.zip(&tiles) {
            counts.add(tile);
            match tile {
                Tile::Start => starts.push(pos),
                Tile::MovableBlock => blocks.push(pos),
                Tile::TeleportEntry(_) => teleport_entries.push(pos),
                Tile::TeleportExit(_) => teleport_exits.push(pos),
                _ => {}
            }
        }

        let start = match starts.as_slice() {
            [] => return Err(ValidationError::MissingStart),
            [start] => *start,
            _ => return Err(ValidationError::DuplicateStart { count: starts.len() }),
        };
        if counts.ends + counts.bonus_ends == 0 {
            return Err(ValidationError::MissingTerminal);
        }

        Ok(Self {
            rows,
            cols,
            tiles,
            start,
            blocks,
            teleport_entries,
            teleport_exits,
            counts,
        })
    }

    /// Rejects key locks whose keys appear nowhere in the grid.
    ///
    /// Switch-operated tiles are not checked: without a switch they simply
    /// stay closed, which the search reports as an unsolvable route.
    fn check_locks(&self) -> Result<(), ValidationError> {
        let mut keys = KeySet::EMPTY;
        for (_, tile) in self.cells() {
            if let Tile::Key(key) = tile {
                keys.insert(key);
            }
        }

        let has_switch = self.counts.switches > 0;

        for (pos, tile) in self.cells() {
            let unlockable = match tile {
                Tile::Door(key) => keys.contains(key),
                Tile::CondDoor(CondDoorKind::TwoKeys) => keys.len() >= 2,
                Tile::CondDoor(CondDoorKind::SwitchAndKey) => has_switch && !keys.is_empty(),
                Tile::Gate => has_switch,
                _ => true,
            };
            if !unlockable {
                return Err(ValidationError::DanglingLock {
                    glyph: tile.glyph(),
                    row: usize::from(pos.row),
                    col: usize::from(pos.col),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Number of cells.
    #[must_use]
    pub fn area(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Returns the row-major cell index of `pos`.
    #[must_use]
    pub fn index_of(&self, pos: Position) -> usize {
        usize::from(pos.row) * usize::from(self.cols) + usize::from(pos.col)
    }

    /// Returns the tile at `pos`. Out-of-bounds positions read as walls.
    #[must_use]
    pub fn tile(&self, pos: Position) -> Tile {
        if self.contains(pos) {
            self.tiles[self.index_of(pos)]
        } else {
            Tile::Wall
        }
    }

    /// Returns the in-bounds neighbour of `pos` in `dir`.
    #[must_use]
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        pos.offset(dir).filter(|next| self.contains(*next))
    }

    #[must_use]
    pub fn start(&self) -> Position {
        self.start
    }

    /// Authored block positions, indexed by block id.
    #[must_use]
    pub fn blocks(&self) -> &[Position] {
        &self.blocks
    }

    /// Number of complete entry/exit pairs.
    #[must_use]
    pub fn teleport_pairs(&self) -> usize {
        usize::min(self.teleport_entries.len(), self.teleport_exits.len())
    }

    /// Exit of a complete teleporter pair; `None` for an unpaired entry.
    #[must_use]
    pub fn teleport_exit(&self, id: TeleportId) -> Option<Position> {
        let index = usize::try_from(id.0).ok()?;
        if index < self.teleport_pairs() {
            self.teleport_exits.get(index).copied()
        } else {
            None
        }
    }

    #[must_use]
    pub fn teleport_entry(&self, id: TeleportId) -> Option<Position> {
        let index = usize::try_from(id.0).ok()?;
        if index < self.teleport_pairs() {
            self.teleport_entries.get(index).copied()
        } else {
            None
        }
    }

    #[must_use]
    pub fn counts(&self) -> &ElementCounts {
        &self.counts
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        let cols = self.cols;
        (0..self.rows)
            .flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
            .zip(self.tiles.iter().copied())
    }

    /// Positions of every [`Tile::End`].
    pub fn ends(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter_map(|(pos, tile)| (tile == Tile::End).then_some(pos))
    }

    /// Positions of every [`Tile::BonusEnd`].
    pub fn bonus_ends(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter_map(|(pos, tile)| tile.is_bonus_end().then_some(pos))
    }
}

impl FromStr for Grid {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, &GridLimits::default())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(usize::from(self.cols).max(1)) {
            for tile in row {
                write!(f, "{}", tile.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn trim_blank_lines(text: &str) -> Vec<&str> {
    let lines = text.lines().collect::<Vec<_>>();
    let is_content = |line: &&str| !line.trim().is_empty();
    let Some(first) = lines.iter().position(is_content) else {
        return vec![];
    };
    let last = lines.iter().rposition(is_content).unwrap_or(first);
    lines[first..=last].to_vec()
}
