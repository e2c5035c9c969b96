/// Identifies a key and the doors it opens.
///
/// Lowercase letters name key/door pairs (`a` opens `A`). The legacy `K`/`D`
/// glyphs share the [`KeyId::GENERIC`] id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    serde::Serialize,
)]
pub struct KeyId(char);

impl KeyId {
    pub const GENERIC: Self = Self('*');

    /// Returns the id for a lowercase letter, or `None` for anything else.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        letter.is_ascii_lowercase().then_some(Self(letter))
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        self.0
    }

    fn bit(self) -> u32 {
        match self.0 {
            c @ 'a'..='z' => 1 << (u32::from(c) - u32::from('a')),
            _ => 1 << 26,
        }
    }

    fn from_bit(bit: u32) -> Self {
        match bit {
            0..26 => Self(char::from(b'a' + u8::try_from(bit).unwrap_or(0))),
            _ => Self::GENERIC,
        }
    }
}

/// Set of held keys, stored as a bitmask so that search states stay small.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeySet(u32);

impl KeySet {
    pub const EMPTY: Self = Self(0);

    /// Adds `key`, returning `true` if it was not held before.
    pub fn insert(&mut self, key: KeyId) -> bool {
        let before = self.0;
        self.0 |= key.bit();
        before != self.0
    }

    #[must_use]
    pub fn contains(self, key: KeyId) -> bool {
        self.0 & key.bit() != 0
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = KeyId> {
        (0..32)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .map(KeyId::from_bit)
    }
}

impl FromIterator<KeyId> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// Pairs a teleport entry with its exit: the k-th `O` with the k-th `Q`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    serde::Serialize,
)]
pub struct TeleportId(pub u32);

/// Names an optional exit (`F`, `G` or `H`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    serde::Serialize,
)]
pub struct BonusId(pub char);

/// Opening condition of a conditional door.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    serde::Serialize,
)]
pub enum CondDoorKind {
    /// Opens while at least two distinct keys are held.
    #[display("two keys")]
    TwoKeys,
    /// Opens while the global switch is on.
    #[display("switch")]
    SwitchOnly,
    /// Opens while the global switch is on and at least one key is held.
    #[display("switch and key")]
    SwitchAndKey,
}

impl CondDoorKind {
    #[must_use]
    pub fn is_open(self, keys: KeySet, switch_on: bool) -> bool {
        match self {
            CondDoorKind::TwoKeys => keys.len() >= 2,
            CondDoorKind::SwitchOnly => switch_on,
            CondDoorKind::SwitchAndKey => switch_on && !keys.is_empty(),
        }
    }

    /// Whether the switch has to be on for this door to open.
    #[must_use]
    pub fn needs_switch(self) -> bool {
        matches!(self, CondDoorKind::SwitchOnly | CondDoorKind::SwitchAndKey)
    }
}

/// Semantic kind of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::IsVariant)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    BonusEnd(BonusId),
    Key(KeyId),
    Door(KeyId),
    Trap,
    TeleportEntry(TeleportId),
    TeleportExit(TeleportId),
    Switch,
    Gate,
    MovableBlock,
    CondDoor(CondDoorKind),
}

impl Tile {
    /// Decodes a glyph that does not depend on its position in the grid.
    ///
    /// Teleporter glyphs (`O`, `Q`) are numbered by the parser and return
    /// `None` here, as does any glyph outside the alphabet.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        let tile = match glyph {
            ' ' | '.' => Tile::Empty,
            '#' => Tile::Wall,
            'S' => Tile::Start,
            'E' => Tile::End,
            'F' | 'G' | 'H' => Tile::BonusEnd(BonusId(glyph)),
            'T' => Tile::Trap,
            's' => Tile::Switch,
            '=' => Tile::Gate,
            'B' => Tile::MovableBlock,
            'X' => Tile::CondDoor(CondDoorKind::TwoKeys),
            'Y' => Tile::CondDoor(CondDoorKind::SwitchOnly),
            'Z' => Tile::CondDoor(CondDoorKind::SwitchAndKey),
            'K' => Tile::Key(KeyId::GENERIC),
            'D' => Tile::Door(KeyId::GENERIC),
            'a'..='z' => Tile::Key(KeyId(glyph)),
            'A'..='Z' if glyph != 'O' && glyph != 'Q' => {
                Tile::Door(KeyId(glyph.to_ascii_lowercase()))
            }
            _ => return None,
        };
        Some(tile)
    }

    /// Returns the glyph this tile is written with.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Wall => '#',
            Tile::Start => 'S',
            Tile::End => 'E',
            Tile::BonusEnd(BonusId(c)) => c,
            Tile::Key(key) if key == KeyId::GENERIC => 'K',
            Tile::Key(KeyId(c)) => c,
            Tile::Door(key) if key == KeyId::GENERIC => 'D',
            Tile::Door(KeyId(c)) => c.to_ascii_uppercase(),
            Tile::Trap => 'T',
            Tile::TeleportEntry(_) => 'O',
            Tile::TeleportExit(_) => 'Q',
            Tile::Switch => 's',
            Tile::Gate => '=',
            Tile::MovableBlock => 'B',
            Tile::CondDoor(CondDoorKind::TwoKeys) => 'X',
            Tile::CondDoor(CondDoorKind::SwitchOnly) => 'Y',
            Tile::CondDoor(CondDoorKind::SwitchAndKey) => 'Z',
        }
    }

    /// Whether reaching this tile finishes a path.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Tile::End | Tile::BonusEnd(_))
    }
}
