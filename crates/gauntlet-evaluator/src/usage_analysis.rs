//! Strategic element analysis of a finished search.
//!
//! [`UsageAnalysis`] compares the winning path against everything the search
//! reached. It reports raw counts only; turning them into points is the job of
//! [`score_evaluator`](crate::score_evaluator).
//!
//! # Measurements
//!
//! - **Mechanic usage**: every key, door, conditional door, gate, switch,
//!   teleporter entry, block, trap and bonus exit is classified as
//!   [`MechanicUsage::UsedOnPath`], [`MechanicUsage::ReachableUnused`] or
//!   [`MechanicUsage::Unreachable`].
//! - **Load-bearing mechanics**: teleporter pairs traversed, conditional doors
//!   passed, and switches whose activation opens a gate or switch door later
//!   on the path.
//! - **Key chain**: the longest run of key pickups each followed by their own
//!   door before any other door intervenes (see [`KeyChain`]).
//! - **Decision points**: path states offering at least two ways forward.
//! - **Danger**: traps on or next to the winning path.
//! - **Frontier distance**: how close the search came to a terminal.

use std::{collections::BTreeSet, iter};

use gauntlet_engine::{
    BonusId, CondDoorKind, Direction, Grid, KeyId, MechanicEvent, Position, SearchOutcome,
    StatePath, TeleportId, Tile, successors,
};
use serde::Serialize;

/// How a mechanic instance relates to the winning path.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::IsVariant,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MechanicUsage {
    #[display("used on path")]
    UsedOnPath,
    #[display("reachable but unused")]
    ReachableUnused,
    #[display("unreachable")]
    Unreachable,
}

/// Kind of a classified mechanic instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicKind {
    #[display("key {_0}")]
    Key(KeyId),
    #[display("door {_0}")]
    Door(KeyId),
    #[display("{_0} door")]
    CondDoor(CondDoorKind),
    #[display("gate")]
    Gate,
    #[display("switch")]
    Switch,
    #[display("teleporter {_0}")]
    Teleporter(TeleportId),
    /// Block id, indexed in grid reading order.
    #[display("block {_0}")]
    Block(usize),
    #[display("trap")]
    Trap,
    #[display("bonus exit {_0}")]
    BonusExit(BonusId),
}

/// One classified mechanic tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MechanicInstance {
    pub kind: MechanicKind,
    /// Authored position of the tile.
    pub position: Position,
    pub usage: MechanicUsage,
}

/// Longest lock-and-key sequence on the winning path.
///
/// A link is a key pickup whose matching door is the next door passed. Links
/// form a run until a door is passed that links nothing and was not already
/// linked in the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyChain {
    /// Length of the longest run.
    pub depth: usize,
    /// Keys of the longest run, in path order.
    pub order: Vec<KeyId>,
    /// Links over the whole path, across runs.
    pub links: usize,
}

/// Raw strategic measurements of one graded grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageAnalysis {
    pub instances: Vec<MechanicInstance>,
    /// Distinct teleporter pairs traversed on the winning path.
    pub teleport_pairs_used: usize,
    /// Switch tiles whose activation opens something later on the winning path.
    pub load_bearing_switches: usize,
    /// Reachable switch tiles that are not load-bearing.
    pub decorative_switches: usize,
    /// Distinct conditional doors passed on the winning path.
    pub cond_doors_passed: usize,
    /// Distinct gates passed on the winning path.
    pub gates_passed: usize,
    pub key_chain: KeyChain,
    pub decision_points: usize,
    /// Distinct traps on or orthogonally adjacent to the winning path.
    pub traps_near_path: usize,
    /// Bonus exits reached by any discovered path.
    pub bonus_exits_reached: usize,
    /// Minimal Manhattan distance from a reached cell to a terminal; zero
    /// when solved. Terminals are the end tiles, or the bonus exits of a grid
    /// without one.
    pub frontier_distance: Option<u32>,
}

impl UsageAnalysis {
    #[must_use]
    pub fn new(grid: &Grid, outcome: &SearchOutcome) -> Self {
        let path = outcome.winning_path();
        let path_events = path.map(|p| p.events().collect::<Vec<_>>()).unwrap_or_default();
        let path_cells = path
            .map(|p| p.cells().into_iter().collect::<BTreeSet<_>>())
            .unwrap_or_default();

        let load_bearing = load_bearing_switches(&path_events);
        let instances = classify_instances(grid, outcome, &path_events);
        let decorative_switches = instances
            .iter()
            .filter(|inst| inst.kind == MechanicKind::Switch)
            .filter(|inst| !inst.usage.is_unreachable() && !load_bearing.contains(&inst.position))
            .count();

        let teleport_pairs_used = path_events
            .iter()
            .filter_map(|event| match event {
                MechanicEvent::Teleported { pair, .. } => Some(*pair),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len();
        let cond_doors_passed = distinct_positions(&path_events, MechanicEvent::is_cond_door_passed);
        let gates_passed = distinct_positions(&path_events, MechanicEvent::is_gate_passed);

        let analysis = Self {
            instances,
            teleport_pairs_used,
            load_bearing_switches: load_bearing.len(),
            decorative_switches,
            cond_doors_passed,
            gates_passed,
            key_chain: key_chain(&path_events),
            decision_points: path.map_or(0, |p| decision_points(grid, p)),
            traps_near_path: traps_near(grid, &path_cells),
            bonus_exits_reached: outcome.bonus_paths().len(),
            frontier_distance: frontier_distance(grid, outcome),
        };
        tracing::trace!(
            teleport_pairs = analysis.teleport_pairs_used,
            load_bearing_switches = analysis.load_bearing_switches,
            cond_doors = analysis.cond_doors_passed,
            chain_depth = analysis.key_chain.depth,
            decision_points = analysis.decision_points,
            traps = analysis.traps_near_path,
            "usage analysis finished"
        );
        analysis
    }

    /// Instances of the given usage class.
    pub fn instances_with(&self, usage: MechanicUsage) -> impl Iterator<Item = &MechanicInstance> {
        self.instances.iter().filter(move |inst| inst.usage == usage)
    }
}

fn classify_instances(
    grid: &Grid,
    outcome: &SearchOutcome,
    path_events: &[MechanicEvent],
) -> Vec<MechanicInstance> {
    let on_path = path_events
        .iter()
        .map(|event| event.position())
        .collect::<BTreeSet<_>>();
    let usage_of = |position: Position| {
        if on_path.contains(&position) {
            MechanicUsage::UsedOnPath
        } else if outcome.reached().contains(position) {
            MechanicUsage::ReachableUnused
        } else {
            MechanicUsage::Unreachable
        }
    };

    let mut instances = grid
        .cells()
        .filter_map(|(position, tile)| {
            let kind = match tile {
                Tile::Key(key) => MechanicKind::Key(key),
                Tile::Door(key) => MechanicKind::Door(key),
                Tile::CondDoor(kind) => MechanicKind::CondDoor(kind),
                Tile::Gate => MechanicKind::Gate,
                Tile::Switch => MechanicKind::Switch,
                Tile::TeleportEntry(pair) => MechanicKind::Teleporter(pair),
                Tile::Trap => MechanicKind::Trap,
                Tile::BonusEnd(bonus) => MechanicKind::BonusExit(bonus),
                Tile::Empty
                | Tile::Wall
                | Tile::Start
                | Tile::End
                | Tile::TeleportExit(_)
                | Tile::MovableBlock => return None,
            };
            Some(MechanicInstance {
                kind,
                position,
                usage: usage_of(position),
            })
        })
        .collect::<Vec<_>>();

    // Blocks move, so they are classified by push events instead of cells.
    let pushed_on_path = pushed_blocks(path_events);
    let pushed_anywhere = pushed_blocks(outcome.observed_events());
    instances.extend(grid.blocks().iter().enumerate().map(|(block, &position)| {
        let usage = if pushed_on_path.contains(&block) {
            MechanicUsage::UsedOnPath
        } else if pushed_anywhere.contains(&block) {
            MechanicUsage::ReachableUnused
        } else {
            MechanicUsage::Unreachable
        };
        MechanicInstance {
            kind: MechanicKind::Block(block),
            position,
            usage,
        }
    }));
    instances
}

fn pushed_blocks<'a>(events: impl IntoIterator<Item = &'a MechanicEvent>) -> BTreeSet<usize> {
    events
        .into_iter()
        .filter_map(|event| match event {
            MechanicEvent::BlockPushed { block, .. } => Some(*block),
            _ => None,
        })
        .collect()
}

fn distinct_positions(events: &[MechanicEvent], pred: fn(&MechanicEvent) -> bool) -> usize {
    events
        .iter()
        .filter(|event| pred(event))
        .map(|event| event.position())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Switch tiles whose on-toggle is followed, before the next toggle, by a
/// gate or a switch-operated conditional door.
fn load_bearing_switches(path_events: &[MechanicEvent]) -> BTreeSet<Position> {
    let mut active = None;
    let mut load_bearing = BTreeSet::new();
    for event in path_events {
        match *event {
            MechanicEvent::SwitchToggled { position, on } => active = on.then_some(position),
            MechanicEvent::GatePassed { .. } => load_bearing.extend(active),
            MechanicEvent::CondDoorPassed { kind, .. } if kind.needs_switch() => {
                load_bearing.extend(active);
            }
            _ => {}
        }
    }
    load_bearing
}

fn key_chain(path_events: &[MechanicEvent]) -> KeyChain {
    let mut pending = BTreeSet::new();
    let mut run = Vec::new();
    let mut chain = KeyChain::default();
    for event in path_events {
        match *event {
            MechanicEvent::KeyPickup { key, .. } => {
                pending.insert(key);
            }
            MechanicEvent::DoorPassed { key, .. } => {
                let linked = pending.contains(&key);
                pending.clear();
                if linked {
                    run.push(key);
                    chain.links += 1;
                    if run.len() > chain.order.len() {
                        chain.order.clone_from(&run);
                    }
                } else if !run.contains(&key) {
                    run.clear();
                }
            }
            MechanicEvent::CondDoorPassed { .. } | MechanicEvent::GatePassed { .. } => {
                pending.clear();
            }
            _ => {}
        }
    }
    chain.depth = chain.order.len();
    chain
}

/// Path states, excluding the final one, with at least two successors that do
/// not step straight back.
fn decision_points(grid: &Grid, path: &StatePath) -> usize {
    let steps = path.steps();
    let mut previous = None;
    let mut count = 0;
    for step in &steps[..steps.len().saturating_sub(1)] {
        let options = successors(grid, &step.state)
            .iter()
            .filter(|succ| Some(succ.state.position()) != previous)
            .count();
        if options >= 2 {
            count += 1;
        }
        previous = Some(step.state.position());
    }
    count
}

fn traps_near(grid: &Grid, path_cells: &BTreeSet<Position>) -> usize {
    let mut traps = BTreeSet::new();
    for &cell in path_cells {
        let around = iter::once(Some(cell)).chain(Direction::ALL.map(|dir| grid.neighbor(cell, dir)));
        traps.extend(around.flatten().filter(|pos| grid.tile(*pos).is_trap()));
    }
    traps.len()
}

fn frontier_distance(grid: &Grid, outcome: &SearchOutcome) -> Option<u32> {
    if outcome.is_solved() {
        return Some(0);
    }
    let targets = if grid.counts().ends > 0 {
        grid.ends().collect::<Vec<_>>()
    } else {
        grid.bonus_ends().collect()
    };
    outcome
        .reached()
        .iter()
        .flat_map(|cell| targets.iter().map(move |target| cell.manhattan_distance(*target)))
        .min()
}
