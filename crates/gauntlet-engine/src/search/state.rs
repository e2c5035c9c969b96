use crate::core::{Grid, KeySet, Position, TeleportId};

/// Fixed-width bitset of consumed teleporter pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TeleportSet {
    words: Box<[u64]>,
}

impl TeleportSet {
    fn with_capacity(pairs: usize) -> Self {
        Self {
            words: vec![0; pairs.div_ceil(64)].into_boxed_slice(),
        }
    }

    fn slot(id: TeleportId) -> (usize, u64) {
        let index = id.0 as usize;
        (index / 64, 1 << (index % 64))
    }

    /// Marks `id` as used. Ids outside the capacity are ignored.
    pub fn insert(&mut self, id: TeleportId) -> bool {
        let (word, mask) = Self::slot(id);
        let Some(word) = self.words.get_mut(word) else {
            return false;
        };
        let newly = *word & mask == 0;
        *word |= mask;
        newly
    }

    #[must_use]
    pub fn contains(&self, id: TeleportId) -> bool {
        let (word, mask) = Self::slot(id);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }
}

/// One node of the composite state space.
///
/// Two states are equal only when every field is equal, so the visited set
/// distinguishes "same cell, different keys" and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub(crate) position: Position,
    pub(crate) keys: KeySet,
    pub(crate) switch_on: bool,
    pub(crate) teleporters_used: TeleportSet,
    pub(crate) blocks: Box<[Position]>,
}

impl SearchState {
    /// State at the start tile: no keys, switch off, no teleporter used and
    /// every block at its authored position.
    #[must_use]
    pub fn initial(grid: &Grid) -> Self {
        Self {
            position: grid.start(),
            keys: KeySet::EMPTY,
            switch_on: false,
            teleporters_used: TeleportSet::with_capacity(grid.teleport_pairs()),
            blocks: grid.blocks().into(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn keys(&self) -> KeySet {
        self.keys
    }

    #[must_use]
    pub fn switch_on(&self) -> bool {
        self.switch_on
    }

    #[must_use]
    pub fn teleporters_used(&self) -> &TeleportSet {
        &self.teleporters_used
    }

    /// Current block positions, indexed by block id.
    #[must_use]
    pub fn blocks(&self) -> &[Position] {
        &self.blocks
    }

    /// Returns the id of the block standing on `pos`, if any.
    #[must_use]
    pub fn block_at(&self, pos: Position) -> Option<usize> {
        self.blocks.iter().position(|b| *b == pos)
    }
}
