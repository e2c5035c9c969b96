//! Single-move transition rules.
//!
//! Each tile kind maps to exactly one rule in [`successors`]; adding a tile
//! kind forces this match to be extended.

use arrayvec::ArrayVec;

use crate::core::{Direction, Grid, Position, Tile};

use super::{event::MechanicEvent, state::SearchState};

/// A state reachable from another state in one move.
#[derive(Debug, Clone)]
pub struct Successor {
    pub direction: Direction,
    pub state: SearchState,
    pub event: Option<MechanicEvent>,
}

/// Returns every state reachable from `state` in exactly one move.
///
/// Successors are produced in [`Direction::ALL`] order.
#[must_use]
pub fn successors(grid: &Grid, state: &SearchState) -> ArrayVec<Successor, 4> {
    debug_assert!(
        grid.contains(state.position),
        "state at {} lies outside the grid",
        state.position
    );

    let mut out = ArrayVec::new();
    for direction in Direction::ALL {
        let Some(target) = grid.neighbor(state.position, direction) else {
            continue;
        };
        if let Some((state, event)) = step(grid, state, target, direction) {
            out.push(Successor {
                direction,
                state,
                event,
            });
        }
    }
    out
}

fn step(
    grid: &Grid,
    from: &SearchState,
    target: Position,
    direction: Direction,
) -> Option<(SearchState, Option<MechanicEvent>)> {
    if let Some(block) = from.block_at(target) {
        return push_block(grid, from, block, target, direction);
    }

    let mut next = from.clone();
    next.position = target;
    let event = match grid.tile(target) {
        Tile::Wall => return None,
        Tile::Empty | Tile::Start | Tile::TeleportExit(_) | Tile::MovableBlock => None,
        Tile::End => Some(MechanicEvent::EndReached { position: target }),
        Tile::BonusEnd(bonus) => Some(MechanicEvent::BonusReached {
            bonus,
            position: target,
        }),
        Tile::Trap => Some(MechanicEvent::TrapEntered { position: target }),
        Tile::Key(key) => next.keys.insert(key).then_some(MechanicEvent::KeyPickup {
            key,
            position: target,
        }),
        Tile::Door(key) => {
            if !from.keys.contains(key) {
                return None;
            }
            Some(MechanicEvent::DoorPassed {
                key,
                position: target,
            })
        }
        Tile::CondDoor(kind) => {
            if !kind.is_open(from.keys, from.switch_on) {
                return None;
            }
            Some(MechanicEvent::CondDoorPassed {
                kind,
                position: target,
            })
        }
        Tile::Gate => {
            if !from.switch_on {
                return None;
            }
            Some(MechanicEvent::GatePassed { position: target })
        }
        Tile::Switch => {
            next.switch_on = !from.switch_on;
            Some(MechanicEvent::SwitchToggled {
                position: target,
                on: next.switch_on,
            })
        }
        Tile::TeleportEntry(pair) => match grid.teleport_exit(pair) {
            Some(exit) if !from.teleporters_used.contains(pair) => {
                next.teleporters_used.insert(pair);
                next.position = exit;
                Some(MechanicEvent::Teleported {
                    pair,
                    from: target,
                    to: exit,
                })
            }
            // Spent or unpaired entries are plain floor.
            _ => None,
        },
    };
    Some((next, event))
}

/// Moves onto a block's cell, shoving the block one cell further along.
fn push_block(
    grid: &Grid,
    from: &SearchState,
    block: usize,
    target: Position,
    direction: Direction,
) -> Option<(SearchState, Option<MechanicEvent>)> {
    let beyond = grid.neighbor(target, direction)?;
    let landing_is_floor = matches!(grid.tile(beyond), Tile::Empty | Tile::MovableBlock);
    if !landing_is_floor || from.block_at(beyond).is_some() {
        return None;
    }
    let mut next = from.clone();
    next.position = target;
    next.blocks[block] = beyond;
    Some((
        next,
        Some(MechanicEvent::BlockPushed {
            block,
            from: target,
            to: beyond,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyId;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    fn moves_to(grid: &Grid, state: &SearchState) -> Vec<Position> {
        successors(grid, state)
            .iter()
            .map(|s| s.state.position())
            .collect()
    }

    #[test]
    fn test_walls_and_bounds_block_movement() {
        let grid = grid("S#\n E");
        let state = SearchState::initial(&grid);
        assert_eq!(moves_to(&grid, &state), vec![Position::new(1, 0)]);
    }

    #[test]
    fn test_door_needs_matching_key() {
        let grid = grid("SAaE");
        let mut state = SearchState::initial(&grid);
        assert!(moves_to(&grid, &state).is_empty());
        state.keys.insert(KeyId::from_letter('a').unwrap());
        let succ = successors(&grid, &state);
        assert_eq!(succ.len(), 1);
        assert!(matches!(
            succ[0].event,
            Some(MechanicEvent::DoorPassed { .. })
        ));
    }

    #[test]
    fn test_key_pickup_is_idempotent() {
        let grid = grid("SaE");
        let state = SearchState::initial(&grid);
        let first = successors(&grid, &state).remove(0);
        assert!(matches!(
            first.event,
            Some(MechanicEvent::KeyPickup { .. })
        ));
        let mut back_on_key = first.state.clone();
        back_on_key.position = Position::new(0, 0);
        let again = successors(&grid, &back_on_key).remove(0);
        assert_eq!(again.event, None, "key already held");
        assert_eq!(again.state, first.state);
    }

    #[test]
    fn test_switch_toggles_global_flag_and_opens_gate() {
        let grid = grid("Ss=E");
        let state = SearchState::initial(&grid);
        let on = successors(&grid, &state).remove(0);
        assert!(on.state.switch_on());
        let through_gate = successors(&grid, &on.state)
            .into_iter()
            .find(|s| s.direction == Direction::Right)
            .unwrap();
        assert!(matches!(
            through_gate.event,
            Some(MechanicEvent::GatePassed { .. })
        ));

        let back = successors(&grid, &through_gate.state)
            .into_iter()
            .find(|s| s.direction == Direction::Left)
            .unwrap();
        assert!(!back.state.switch_on(), "re-entering the switch turns it off");
    }

    #[test]
    fn test_teleport_is_consumed() {
        let grid = grid("SO  \n## Q\n  E ");
        let state = SearchState::initial(&grid);
        let jump = successors(&grid, &state).remove(0);
        assert_eq!(jump.state.position(), Position::new(1, 3));
        assert!(jump.state.teleporters_used().contains(crate::TeleportId(0)));

        let mut back = jump.state.clone();
        back.position = Position::new(0, 0);
        let walk = successors(&grid, &back).remove(0);
        assert_eq!(walk.state.position(), Position::new(0, 1), "spent entry is floor");
        assert_eq!(walk.event, None);
    }

    #[test]
    fn test_block_push_needs_free_floor_beyond() {
        let grid = grid("SB E\n#B##\n    ");
        let state = SearchState::initial(&grid);
        let push = successors(&grid, &state)
            .into_iter()
            .find(|s| s.direction == Direction::Right)
            .unwrap();
        assert_eq!(push.state.position(), Position::new(0, 1));
        assert_eq!(push.state.blocks()[0], Position::new(0, 2));
        assert!(matches!(
            push.event,
            Some(MechanicEvent::BlockPushed { block: 0, .. })
        ));

        // Block 1 sits below; the row under it is open floor.
        let mut above = state.clone();
        above.position = Position::new(0, 1);
        above.blocks[0] = Position::new(0, 2);
        let down = successors(&grid, &above)
            .into_iter()
            .find(|s| s.direction == Direction::Down);
        assert!(down.is_some(), "block 1 can be pushed onto the floor below");

        // Pushing block 0 into the end tile is not allowed.
        let pushed_again = successors(&grid, &push.state)
            .into_iter()
            .find(|s| s.direction == Direction::Right);
        assert!(pushed_again.is_none());
    }

    #[test]
    fn test_conditional_doors() {
        let grid = grid("SXabE");
        let mut state = SearchState::initial(&grid);
        assert!(moves_to(&grid, &state).is_empty());
        state.keys.insert(KeyId::from_letter('a').unwrap());
        assert!(moves_to(&grid, &state).is_empty());
        state.keys.insert(KeyId::from_letter('b').unwrap());
        assert_eq!(moves_to(&grid, &state), vec![Position::new(0, 1)]);
    }
}
