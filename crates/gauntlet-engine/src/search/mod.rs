//! Breadth-first exploration of the composite state space.
//!
//! A [`SearchState`] is the mover's position together with everything that
//! changes passability: held keys, the global switch, spent teleporters and
//! displaced blocks. [`explore`] deduplicates on the full state, so the same
//! cell is revisited whenever any of that accumulated state differs.

pub use self::{event::*, explorer::*, state::*, transition::*};

mod event;
mod explorer;
mod state;
mod transition;
