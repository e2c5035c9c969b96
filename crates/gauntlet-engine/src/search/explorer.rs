use std::{
    collections::{BTreeMap, BTreeSet, HashSet, VecDeque},
    time::{Duration, Instant},
};

use crate::core::{Grid, Position};

use super::{event::MechanicEvent, state::SearchState, transition::successors};

/// Hard limits on one exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of state expansions.
    pub iteration_cap: usize,
    /// Wall-clock limit in milliseconds.
    pub timeout_ms: u64,
}

impl SearchBudget {
    pub const DEFAULT_ITERATION_CAP: usize = 250_000;
    pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            iteration_cap: Self::DEFAULT_ITERATION_CAP,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Why the exploration loop stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::IsVariant,
    serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every reachable state was expanded.
    #[display("exhausted")]
    Exhausted,
    #[display("iteration cap")]
    IterationCap,
    #[display("wall-clock timeout")]
    WallClock,
}

/// One step of a reconstructed path: the state after the move and the
/// mechanic the move triggered.
#[derive(Debug, Clone)]
pub struct PathStep {
    pub state: SearchState,
    pub event: Option<MechanicEvent>,
}

/// Minimal-move path from the start state to some target state.
#[derive(Debug, Clone)]
pub struct StatePath {
    steps: Vec<PathStep>,
}

impl StatePath {
    /// Steps in traversal order; the first step is the initial state.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of moves. A teleport jump counts as the single move onto its
    /// entry tile.
    #[must_use]
    pub fn moves(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Triggered mechanics in traversal order.
    pub fn events(&self) -> impl Iterator<Item = MechanicEvent> + '_ {
        self.steps.iter().filter_map(|step| step.event)
    }

    /// Every cell the mover stood on, including teleport entries.
    #[must_use]
    pub fn cells(&self) -> Vec<Position> {
        let mut cells = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            if let Some(MechanicEvent::Teleported { from, .. }) = step.event {
                cells.push(from);
            }
            cells.push(step.state.position());
        }
        cells
    }

    #[must_use]
    pub fn last_position(&self) -> Option<Position> {
        self.steps.last().map(|step| step.state.position())
    }
}

/// Cells the mover stood on in any explored state.
#[derive(Debug, Clone)]
pub struct ReachedCells {
    cols: u16,
    reached: Vec<bool>,
}

impl ReachedCells {
    fn new(grid: &Grid) -> Self {
        Self {
            cols: grid.cols(),
            reached: vec![false; grid.area()],
        }
    }

    fn insert(&mut self, grid: &Grid, pos: Position) {
        if grid.contains(pos) {
            self.reached[grid.index_of(pos)] = true;
        }
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        let index = usize::from(pos.row) * usize::from(self.cols) + usize::from(pos.col);
        pos.col < self.cols && self.reached.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reached.iter().filter(|r| **r).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.reached.iter().any(|r| *r)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = usize::from(self.cols.max(1));
        self.reached
            .iter()
            .enumerate()
            .filter(|(_, reached)| **reached)
            .map(move |(index, _)| {
                // Indices come from in-bounds positions, so both parts fit.
                let row = u16::try_from(index / cols).unwrap_or(u16::MAX);
                let col = u16::try_from(index % cols).unwrap_or(u16::MAX);
                Position::new(row, col)
            })
    }
}

/// Counters describing how much work an exploration did.
#[derive(Debug, Clone, Copy)]
pub struct SearchStats {
    /// States popped from the queue and expanded.
    pub expanded: usize,
    /// Distinct states entered into the visited set.
    pub discovered: usize,
    pub elapsed: Duration,
    pub termination: Termination,
}

/// Everything one exploration found.
///
/// Always well formed: when the budget trips, the fields hold whatever was
/// discovered before the cap.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    end_path: Option<StatePath>,
    /// The grid has bonus exits but no end tile.
    bonus_only: bool,
    bonus_paths: BTreeMap<Position, StatePath>,
    reached: ReachedCells,
    observed_events: BTreeSet<MechanicEvent>,
    stats: SearchStats,
}

impl SearchOutcome {
    /// Minimal-move path to the nearest end tile.
    #[must_use]
    pub fn end_path(&self) -> Option<&StatePath> {
        self.end_path.as_ref()
    }

    /// Minimal-move path to each reached bonus exit, keyed by its position.
    #[must_use]
    pub fn bonus_paths(&self) -> &BTreeMap<Position, StatePath> {
        &self.bonus_paths
    }

    #[must_use]
    pub fn reached(&self) -> &ReachedCells {
        &self.reached
    }

    /// Distinct mechanic events triggered anywhere in the explored state space.
    #[must_use]
    pub fn observed_events(&self) -> &BTreeSet<MechanicEvent> {
        &self.observed_events
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Path to the grid's terminal: the end path, or the shortest bonus path
    /// when the grid has no end tile.
    #[must_use]
    pub fn winning_path(&self) -> Option<&StatePath> {
        if self.bonus_only {
            self.bonus_paths.values().min_by_key(|path| path.moves())
        } else {
            self.end_path.as_ref()
        }
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.winning_path().is_some()
    }

    /// The budget tripped before a winning path was found.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        !self.is_solved() && !self.stats.termination.is_exhausted()
    }

    /// Reachability information may be partial.
    #[must_use]
    pub fn is_approximate(&self) -> bool {
        !self.stats.termination.is_exhausted()
    }
}

#[derive(Debug)]
struct Node {
    state: SearchState,
    parent: Option<usize>,
    event: Option<MechanicEvent>,
}

/// Explores the composite state space breadth-first from the start tile.
///
/// Expansion continues past the first end tile so that bonus exits and the
/// wider reachable set are discovered, until the queue drains or `budget`
/// trips. Because expansion is breadth-first over moves, the first path found
/// to any cell is minimal in moves.
#[must_use]
pub fn explore(grid: &Grid, budget: &SearchBudget) -> SearchOutcome {
    const CLOCK_CHECK_INTERVAL: usize = 64;

    let started = Instant::now();
    let timeout = budget.timeout();

    let initial = SearchState::initial(grid);
    let mut arena = vec![Node {
        state: initial.clone(),
        parent: None,
        event: None,
    }];
    let mut visited = HashSet::from([initial]);
    let mut queue = VecDeque::from([0]);
    let mut reached = ReachedCells::new(grid);
    reached.insert(grid, grid.start());
    let mut observed_events = BTreeSet::new();
    let mut end_node = None;
    let mut bonus_nodes = BTreeMap::new();
    let mut expanded = 0;

    let termination = loop {
        if queue.is_empty() {
            break Termination::Exhausted;
        }
        if expanded >= budget.iteration_cap {
            break Termination::IterationCap;
        }
        if expanded % CLOCK_CHECK_INTERVAL == 0 && started.elapsed() >= timeout {
            break Termination::WallClock;
        }
        let Some(index) = queue.pop_front() else {
            break Termination::Exhausted;
        };
        expanded += 1;

        for succ in successors(grid, &arena[index].state) {
            if visited.contains(&succ.state) {
                continue;
            }
            visited.insert(succ.state.clone());

            let child = arena.len();
            if let Some(event) = succ.event {
                observed_events.insert(event);
                match event {
                    MechanicEvent::EndReached { .. } => {
                        end_node.get_or_insert(child);
                    }
                    MechanicEvent::BonusReached { position, .. } => {
                        bonus_nodes.entry(position).or_insert(child);
                    }
                    MechanicEvent::Teleported { from, .. } => reached.insert(grid, from),
                    _ => {}
                }
            }
            reached.insert(grid, succ.state.position());
            arena.push(Node {
                state: succ.state,
                parent: Some(index),
                event: succ.event,
            });
            queue.push_back(child);
        }
    };

    let stats = SearchStats {
        expanded,
        discovered: visited.len(),
        elapsed: started.elapsed(),
        termination,
    };
    tracing::debug!(
        expanded = stats.expanded,
        discovered = stats.discovered,
        elapsed_ms = stats.elapsed.as_millis(),
        %termination,
        solved = end_node.is_some(),
        bonus_exits = bonus_nodes.len(),
        "state-space search finished"
    );

    SearchOutcome {
        end_path: end_node.map(|node| reconstruct(&arena, node)),
        bonus_only: grid.counts().ends == 0,
        bonus_paths: bonus_nodes
            .into_iter()
            .map(|(pos, node)| (pos, reconstruct(&arena, node)))
            .collect(),
        reached,
        observed_events,
        stats,
    }
}

fn reconstruct(arena: &[Node], mut index: usize) -> StatePath {
    let mut steps = vec![];
    loop {
        let node = &arena[index];
        steps.push(PathStep {
            state: node.state.clone(),
            event: node.event,
        });
        match node.parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    steps.reverse();
    StatePath { steps }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{GridLimits, KeyId, Tile};

    fn grid(text: &str) -> Grid {
        Grid::parse(text, &GridLimits::default()).unwrap()
    }

    fn explore_default(grid: &Grid) -> SearchOutcome {
        explore(grid, &SearchBudget::default())
    }

    /// Plain single-state BFS over walls and floor, used as a reference.
    fn plain_bfs_distance(grid: &Grid) -> Option<usize> {
        let mut dist = vec![None; grid.area()];
        let mut queue = VecDeque::from([grid.start()]);
        dist[grid.index_of(grid.start())] = Some(0);
        while let Some(pos) = queue.pop_front() {
            let d = dist[grid.index_of(pos)].unwrap();
            if grid.tile(pos) == Tile::End {
                return Some(d);
            }
            for dir in crate::Direction::ALL {
                let Some(next) = grid.neighbor(pos, dir) else {
                    continue;
                };
                if grid.tile(next) == Tile::Wall || dist[grid.index_of(next)].is_some() {
                    continue;
                }
                dist[grid.index_of(next)] = Some(d + 1);
                queue.push_back(next);
            }
        }
        None
    }

    #[test]
    fn test_matches_plain_bfs_without_mechanics() {
        let mazes = [
            "S   E",
            "\
#########
#S  #   #
# # # # #
# #   # #
# ##### #
#      E#
#########",
            "S #   \n  # # \n  #  #\n     E",
            "S#\n#E",
        ];
        for text in mazes {
            let grid = grid(text);
            let outcome = explore_default(&grid);
            assert_eq!(
                outcome.end_path().map(StatePath::moves),
                plain_bfs_distance(&grid),
                "maze:\n{text}"
            );
            assert!(outcome.stats().termination.is_exhausted());
        }
    }

    #[test]
    fn test_key_door_corridor() {
        let grid = grid("#######\n#S a A#\n#####E#\n#######");
        let outcome = explore_default(&grid);
        let path = outcome.end_path().expect("maze is solvable");
        assert_eq!(path.moves(), 5);
        let events = path.events().collect::<Vec<_>>();
        let a = KeyId::from_letter('a').unwrap();
        assert_eq!(
            events,
            vec![
                MechanicEvent::KeyPickup {
                    key: a,
                    position: Position::new(1, 3),
                },
                MechanicEvent::DoorPassed {
                    key: a,
                    position: Position::new(1, 5),
                },
                MechanicEvent::EndReached {
                    position: Position::new(2, 5),
                },
            ]
        );
    }

    #[test]
    fn test_door_before_key_is_unsolvable() {
        let grid = grid("#######\n#S A a#\n#####E#\n#######");
        let outcome = explore_default(&grid);
        assert!(!outcome.is_solved());
        assert!(!outcome.is_timeout());
        assert!(outcome.reached().contains(Position::new(1, 2)));
        assert!(!outcome.reached().contains(Position::new(1, 3)));
    }

    #[test]
    fn test_single_use_teleporter() {
        // The only route to E is the jump from O to Q.
        let text = "\
#######
#SO#  #
####Q #
#  # E#
#######";
        let grid = grid(text);
        let outcome = explore_default(&grid);
        let path = outcome.end_path().expect("solvable through the teleporter");
        let jumps = path.events().filter(|e| e.is_teleported()).count();
        assert_eq!(jumps, 1);
        assert_eq!(path.moves(), 3);
        assert!(path.cells().contains(&Position::new(1, 2)));
        assert!(outcome.stats().termination.is_exhausted());
    }

    #[test]
    fn test_teleporter_loop_does_not_duplicate_states() {
        // Q lands next to a loop back to O; the spent entry is plain floor.
        let text = "\
#######
#S O  #
#   # #
# Q   #
#    E#
#######";
        let grid = grid(text);
        let outcome = explore_default(&grid);
        assert!(outcome.is_solved());
        assert!(outcome.stats().termination.is_exhausted());
        // Each cell exists at most once with and once without the pair spent.
        let floor_cells = grid.cells().filter(|(_, t)| *t != Tile::Wall).count();
        assert!(outcome.stats().discovered <= floor_cells * 2);
    }

    #[test]
    fn test_switch_only_door() {
        let with_switch = "\
#######
#S s  #
####Y##
#  E  #
#######";
        let outcome = explore_default(&grid(with_switch));
        let path = outcome.end_path().expect("switch opens the door");
        assert!(path.events().any(|e| e.is_switch_toggled()));
        assert!(path.events().any(|e| e.is_cond_door_passed()));
    }

    #[test]
    fn test_block_push_opens_route() {
        let blocked = grid("######\n#SB E#\n######");
        let outcome = explore_default(&blocked);
        assert!(!outcome.is_solved(), "the block cannot be pushed into E");

        let detour = grid("######\n#SB  #\n### ##\n#E   #\n######");
        let outcome = explore_default(&detour);
        let path = outcome.end_path().expect("block pushed out of the corridor");
        assert_eq!(path.events().filter(|e| e.is_block_pushed()).count(), 2);
    }

    #[test]
    fn test_bonus_paths_are_minimal() {
        let grid = grid("F  S    E\n   #     \nG  #     ");
        let outcome = explore_default(&grid);
        assert_eq!(outcome.end_path().map(StatePath::moves), Some(5));
        let bonus = outcome.bonus_paths();
        assert_eq!(bonus.len(), 2);
        assert_eq!(bonus[&Position::new(0, 0)].moves(), 3);
        assert_eq!(bonus[&Position::new(2, 0)].moves(), 5);
    }

    #[test]
    fn test_iteration_cap_returns_partial_results() {
        // Twenty-one optional keys in front of a long detour to E.
        let text = "\
S abcdefghij
 klmnopqrtuv
########### 
E           ";
        let grid = grid(text);
        let budget = SearchBudget {
            iteration_cap: 500,
            timeout_ms: 60_000,
        };
        let outcome = explore(&grid, &budget);
        assert_eq!(outcome.stats().termination, Termination::IterationCap);
        assert_eq!(outcome.stats().expanded, 500);
        assert!(outcome.is_timeout());
        assert!(outcome.is_approximate());
        assert!(!outcome.reached().is_empty());
        assert!(!outcome.observed_events().is_empty());
    }

    #[test]
    fn test_cap_equal_to_state_count_is_exhaustive() {
        // A 1x4 corridor has four states; the fourth expansion drains the queue.
        let grid = grid("S  E");
        let budget = SearchBudget {
            iteration_cap: 4,
            timeout_ms: 60_000,
        };
        let outcome = explore(&grid, &budget);
        assert_eq!(outcome.stats().expanded, 4);
        assert_eq!(outcome.stats().termination, Termination::Exhausted);
        assert!(!outcome.is_approximate());

        let budget = SearchBudget {
            iteration_cap: 3,
            ..budget
        };
        let outcome = explore(&grid, &budget);
        assert_eq!(outcome.stats().termination, Termination::IterationCap);
        assert!(outcome.is_solved(), "E was discovered by the third expansion");
        assert!(!outcome.is_timeout());
        assert!(outcome.is_approximate());
    }

    #[test]
    fn test_bonus_only_grid_wins_through_nearest_bonus() {
        let outcome = explore_default(&grid("G  S F"));
        assert!(outcome.end_path().is_none());
        let path = outcome.winning_path().expect("a bonus exit is reachable");
        assert_eq!(path.last_position(), Some(Position::new(0, 5)));
        assert_eq!(path.moves(), 2);
        assert!(outcome.is_solved());

        let outcome = explore_default(&grid("S #F"));
        assert!(outcome.winning_path().is_none());
        assert!(!outcome.is_solved());

        let outcome = explore_default(&grid("S F E"));
        assert!(
            outcome.winning_path().is_some_and(|path| path.moves() == 4),
            "with an end tile, bonus exits are optional"
        );
    }

    #[test]
    fn test_zero_timeout_trips_wall_clock() {
        let grid = grid("S   E");
        let budget = SearchBudget {
            iteration_cap: 1_000,
            timeout_ms: 0,
        };
        let outcome = explore(&grid, &budget);
        assert_eq!(outcome.stats().termination, Termination::WallClock);
        assert!(outcome.is_timeout());
    }

    #[test]
    fn test_reached_cells_iter() {
        let grid = grid("S #E\n  # ");
        let outcome = explore_default(&grid);
        let reached = outcome.reached().iter().collect::<Vec<_>>();
        assert_eq!(
            reached,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 1),
            ]
        );
        assert_eq!(outcome.reached().len(), 4);
    }
}
