use std::fmt;

use gauntlet_engine::{
    BonusId, ElementCounts, Grid, MechanicEvent, Position, SearchOutcome, Termination, Tile,
    ValidationError,
};
use serde::Serialize;

use crate::usage_analysis::{MechanicUsage, UsageAnalysis};

/// Final disposition of one grading call.
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
pub enum Classification {
    /// The end tile was reached.
    Completed,
    /// The end tile and at least one bonus exit were reached, or a bonus
    /// exit of a grid without an end tile.
    BonusCompleted,
    /// The search finished without reaching a terminal.
    Unsolvable,
    /// The grid failed validation.
    Invalid,
    /// The search budget ran out before the end tile was reached.
    Timeout,
}

/// Named score components. Each is already capped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub ambition: f64,
    pub strategic_innovation: f64,
    pub route_complexity: f64,
    pub bonus_objectives: f64,
    pub completion: f64,
    pub path_efficiency: f64,
    pub danger: f64,
    pub proximity: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, points)| points).sum()
    }

    /// Components paired with their names, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("ambition", self.ambition),
            ("strategic_innovation", self.strategic_innovation),
            ("route_complexity", self.route_complexity),
            ("bonus_objectives", self.bonus_objectives),
            ("completion", self.completion),
            ("path_efficiency", self.path_efficiency),
            ("danger", self.danger),
            ("proximity", self.proximity),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BonusPathSummary {
    pub bonus: BonusId,
    pub position: Position,
    pub moves: usize,
}

/// Search details needed to render a human-readable breakdown.
///
/// Holds no wall-clock data, so equal inputs give equal summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub rows: u16,
    pub cols: u16,
    /// Moves on the winning path.
    pub path_length: Option<usize>,
    /// Mechanics triggered on the winning path, in order.
    pub path_events: Vec<MechanicEvent>,
    pub bonus_paths: Vec<BonusPathSummary>,
    /// Distinct mechanic events observed anywhere in the search.
    pub observed_events: usize,
    pub reached_cells: usize,
    pub expanded: usize,
    pub discovered: usize,
    pub termination: Termination,
    pub counts: ElementCounts,
}

impl TraceSummary {
    #[must_use]
    pub fn new(grid: &Grid, outcome: &SearchOutcome) -> Self {
        let path = outcome.winning_path();
        let bonus_paths = outcome
            .bonus_paths()
            .iter()
            .filter_map(|(&position, path)| match grid.tile(position) {
                Tile::BonusEnd(bonus) => Some(BonusPathSummary {
                    bonus,
                    position,
                    moves: path.moves(),
                }),
                _ => None,
            })
            .collect();
        let stats = outcome.stats();
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            path_length: path.map(|p| p.moves()),
            path_events: path.map(|p| p.events().collect()).unwrap_or_default(),
            bonus_paths,
            observed_events: outcome.observed_events().len(),
            reached_cells: outcome.reached().len(),
            expanded: stats.expanded,
            discovered: stats.discovered,
            termination: stats.termination,
            counts: *grid.counts(),
        }
    }
}

/// The single artifact produced by grading a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub classification: Classification,
    pub total: f64,
    /// Set when reachability may be incomplete because the budget tripped.
    pub approximate: bool,
    pub components: ScoreBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<UsageAnalysis>,
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}", self.classification, self.total)?;
        if self.approximate {
            write!(f, " (approximate)")?;
        }
        writeln!(f)?;

        if let Some(violation) = &self.violation {
            writeln!(f, "  invalid grid: {violation}")?;
            return Ok(());
        }

        for (name, points) in self.components.iter() {
            writeln!(f, "  {name:<22}{points:>8.2}")?;
        }

        if let Some(trace) = &self.trace {
            writeln!(f, "grid: {}x{}", trace.rows, trace.cols)?;
            match trace.path_length {
                Some(moves) => writeln!(f, "path: {moves} moves")?,
                None => writeln!(f, "path: end not reached")?,
            }
            for event in &trace.path_events {
                writeln!(f, "  - {event}")?;
            }
            for bonus in &trace.bonus_paths {
                writeln!(
                    f,
                    "bonus exit {} at {}: {} moves",
                    bonus.bonus, bonus.position, bonus.moves
                )?;
            }
            writeln!(
                f,
                "search: {} expanded, {} discovered, {} cells reached ({})",
                trace.expanded, trace.discovered, trace.reached_cells, trace.termination
            )?;
        }

        if let Some(analysis) = &self.analysis {
            let unused = analysis
                .instances_with(MechanicUsage::ReachableUnused)
                .count();
            let unreachable = analysis.instances_with(MechanicUsage::Unreachable).count();
            if unused + unreachable > 0 {
                writeln!(
                    f,
                    "mechanics: {unused} reachable but unused, {unreachable} unreachable"
                )?;
            }
        }
        Ok(())
    }
}
