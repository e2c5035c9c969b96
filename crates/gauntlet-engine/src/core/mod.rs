pub use self::{grid::*, position::*, tile::*};

pub(crate) mod grid;
pub(crate) mod position;
pub(crate) mod tile;
