//! Scoring: turning search and analysis results into a [`ScoreReport`].
//!
//! Each component is computed independently, capped, and summed:
//!
//! ```text
//! ambition             = a · log2(rows × cols)
//! strategic_innovation = min(p_t · pairs, c_t) + min(p_s · switches, c_s) + min(p_d · doors, c_d)
//! route_complexity     = min(p_c · chain_depth + p_p · decision_points, c_r)
//! bonus_objectives     = min(p_b · bonus_exits, c_b)
//! completion           = p_e                        (end reached)
//! path_efficiency      = c_e · tent(moves / area)   (peaks at the configured ratio)
//! danger               = min(k · sqrt(traps), c_x)
//! proximity            = c_p · (1 − d / (rows + cols))
//! ```
//!
//! Which components apply depends on the [`Classification`]:
//!
//! | Classification | Components |
//! |---|---|
//! | `Completed` / `BonusCompleted` | everything except proximity |
//! | `Timeout` | ambition, proximity (flagged approximate) |
//! | `Unsolvable` | proximity |
//! | `Invalid` | none; the total is the fixed invalid penalty |
//!
//! A grid without an end tile is won through its nearest bonus exit and
//! classifies as `BonusCompleted`.

use gauntlet_engine::{Grid, SearchOutcome, StatePath, ValidationError};

use crate::{
    config::ScoringWeights,
    report::{Classification, ScoreBreakdown, ScoreReport, TraceSummary},
    usage_analysis::UsageAnalysis,
};

/// Scores graded grids with a fixed set of weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEvaluator {
    weights: ScoringWeights,
}

impl ScoreEvaluator {
    #[must_use]
    pub const fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Builds the report of a grid that passed validation.
    ///
    /// Pure: the result depends only on the arguments.
    #[must_use]
    pub fn evaluate(
        &self,
        grid: &Grid,
        outcome: &SearchOutcome,
        analysis: &UsageAnalysis,
    ) -> ScoreReport {
        let winning = outcome.winning_path();
        let (classification, components, approximate) = if let Some(path) = winning {
            let components = ScoreBreakdown {
                ambition: self.ambition(grid),
                strategic_innovation: self.strategic_innovation(analysis),
                route_complexity: self.route_complexity(analysis),
                bonus_objectives: self.bonus_objectives(analysis),
                completion: self.weights.completion_points,
                path_efficiency: self.path_efficiency(grid, path),
                danger: self.danger(analysis),
                proximity: 0.0,
            };
            let classification = if analysis.bonus_exits_reached > 0 {
                Classification::BonusCompleted
            } else {
                Classification::Completed
            };
            (classification, components, outcome.is_approximate())
        } else if outcome.is_timeout() {
            let components = ScoreBreakdown {
                ambition: self.ambition(grid),
                proximity: self.proximity(grid, analysis),
                ..ScoreBreakdown::default()
            };
            (Classification::Timeout, components, true)
        } else {
            let components = ScoreBreakdown {
                proximity: self.proximity(grid, analysis),
                ..ScoreBreakdown::default()
            };
            (Classification::Unsolvable, components, false)
        };

        ScoreReport {
            classification,
            total: components.total(),
            approximate,
            components,
            violation: None,
            trace: Some(TraceSummary::new(grid, outcome)),
            analysis: Some(analysis.clone()),
        }
    }

    /// Builds the report of a grid rejected by validation.
    #[must_use]
    pub fn invalid(&self, violation: ValidationError) -> ScoreReport {
        ScoreReport {
            classification: Classification::Invalid,
            total: self.weights.invalid_penalty,
            approximate: false,
            components: ScoreBreakdown::default(),
            violation: Some(violation),
            trace: None,
            analysis: None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn ambition(&self, grid: &Grid) -> f64 {
        let area = grid.area().max(1) as f64;
        self.weights.ambition_per_doubling * area.log2()
    }

    fn strategic_innovation(&self, analysis: &UsageAnalysis) -> f64 {
        let w = &self.weights;
        capped(analysis.teleport_pairs_used, w.teleport_pair_points, w.teleport_cap)
            + capped(analysis.load_bearing_switches, w.switch_points, w.switch_cap)
            + capped(analysis.cond_doors_passed, w.cond_door_points, w.cond_door_cap)
    }

    #[expect(clippy::cast_precision_loss)]
    fn route_complexity(&self, analysis: &UsageAnalysis) -> f64 {
        let w = &self.weights;
        let raw = w.chain_link_points * analysis.key_chain.depth as f64
            + w.decision_point_points * analysis.decision_points as f64;
        raw.clamp(0.0, w.route_complexity_cap.max(0.0))
    }

    fn bonus_objectives(&self, analysis: &UsageAnalysis) -> f64 {
        capped(
            analysis.bonus_exits_reached,
            self.weights.bonus_exit_points,
            self.weights.bonus_cap,
        )
    }

    /// Tent-shaped reward on `moves / area`: zero for a zero-length path,
    /// full at the configured peak ratio, back to zero at ratio one.
    #[expect(clippy::cast_precision_loss)]
    fn path_efficiency(&self, grid: &Grid, path: &StatePath) -> f64 {
        let ratio = path.moves() as f64 / grid.area().max(1) as f64;
        let peak = self.weights.path_efficiency_peak.clamp(0.01, 0.99);
        let shape = if ratio <= peak {
            ratio / peak
        } else {
            (1.0 - ratio) / (1.0 - peak)
        };
        self.weights.path_efficiency_cap * shape.clamp(0.0, 1.0)
    }

    #[expect(clippy::cast_precision_loss)]
    fn danger(&self, analysis: &UsageAnalysis) -> f64 {
        let raw = self.weights.danger_scale * (analysis.traps_near_path as f64).sqrt();
        raw.clamp(0.0, self.weights.danger_cap.max(0.0))
    }

    fn proximity(&self, grid: &Grid, analysis: &UsageAnalysis) -> f64 {
        let Some(distance) = analysis.frontier_distance else {
            return 0.0;
        };
        let span = f64::from(grid.rows()) + f64::from(grid.cols());
        let closeness = 1.0 - f64::from(distance) / span;
        self.weights.proximity_cap * closeness.clamp(0.0, 1.0)
    }
}

#[expect(clippy::cast_precision_loss)]
fn capped(count: usize, points: f64, cap: f64) -> f64 {
    (count as f64 * points).clamp(0.0, cap.max(0.0))
}

#[cfg(test)]
mod tests {
    use gauntlet_engine::{SearchBudget, explore};

    use super::*;

    fn evaluate(text: &str) -> ScoreReport {
        let grid: Grid = text.parse().unwrap();
        let outcome = explore(&grid, &SearchBudget::default());
        let analysis = UsageAnalysis::new(&grid, &outcome);
        ScoreEvaluator::default().evaluate(&grid, &outcome, &analysis)
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_capped() {
        assert!(approx_eq(capped(2, 15.0, 60.0), 30.0));
        assert!(approx_eq(capped(5, 15.0, 60.0), 60.0));
        assert!(approx_eq(capped(0, 15.0, 60.0), 0.0));
    }

    #[test]
    fn test_ambition_is_logarithmic() {
        let small = evaluate("S  E");
        let large = evaluate("S              E");
        assert!(approx_eq(small.components.ambition, 200.0));
        assert!(approx_eq(large.components.ambition, 400.0));
    }

    #[test]
    fn test_path_efficiency_tent() {
        let evaluator = ScoreEvaluator::default();
        // 10x10 open grid: the shortest path from corner to corner is 18 moves.
        let text = ["S         "]
            .into_iter()
            .chain(std::iter::repeat_n("          ", 8))
            .chain(["         E"])
            .collect::<Vec<_>>()
            .join("\n");
        let grid: Grid = text.parse().unwrap();
        let outcome = explore(&grid, &SearchBudget::default());
        let path = outcome.end_path().unwrap();
        assert_eq!(path.moves(), 18);
        let score = evaluator.path_efficiency(&grid, path);
        assert!(approx_eq(score, 50.0 * 0.18 / 0.3), "{score}");

        // A corridor whose path covers most of the grid scores low.
        let corridor = evaluate("S  E");
        assert!(corridor.components.path_efficiency < 25.0);
    }

    #[test]
    fn test_danger_has_diminishing_returns() {
        let one = evaluate("STE");
        let four = evaluate("S   E\nTTTT ");
        assert!(approx_eq(one.components.danger, 10.0));
        assert!(approx_eq(four.components.danger, 20.0));
        let nine = evaluate("S         E\nTTTTTTTTT  ");
        assert!(approx_eq(nine.components.danger, 30.0), "capped");
    }

    #[test]
    fn test_unsolvable_keeps_only_partial_credit() {
        let report = evaluate("S #E");
        assert_eq!(report.classification, Classification::Unsolvable);
        assert!(!report.approximate);
        assert!(approx_eq(report.components.ambition, 0.0));
        assert!(approx_eq(report.components.completion, 0.0));
        // Frontier (0, 1) is two cells from the end on a 1x4 grid.
        assert!(approx_eq(report.components.proximity, 25.0 * (1.0 - 2.0 / 5.0)));
        assert!(approx_eq(report.total, report.components.proximity));
    }

    #[test]
    fn test_bonus_completed() {
        let report = evaluate("S E F");
        assert_eq!(report.classification, Classification::BonusCompleted);
        assert!(approx_eq(report.components.bonus_objectives, 75.0));
        assert!(approx_eq(report.components.completion, 50.0));
        let trace = report.trace.unwrap();
        assert_eq!(trace.bonus_paths.len(), 1);
        assert_eq!(trace.bonus_paths[0].moves, 4);
    }

    #[test]
    fn test_unsolvable_ignores_reached_bonus_exits() {
        let report = evaluate("S F#E");
        assert_eq!(report.classification, Classification::Unsolvable);
        assert_eq!(report.analysis.as_ref().unwrap().bonus_exits_reached, 1);
        for (name, points) in report.components.iter() {
            if name != "proximity" {
                assert!(approx_eq(points, 0.0), "{name} = {points}");
            }
        }
        assert!(report.components.proximity > 0.0);
        assert!(approx_eq(report.total, report.components.proximity));
    }

    #[test]
    fn test_bonus_only_grid_is_bonus_completed() {
        let report = evaluate("S F G H");
        assert_eq!(report.classification, Classification::BonusCompleted);
        assert!(approx_eq(report.components.bonus_objectives, 225.0));
        assert!(approx_eq(report.components.completion, 50.0));
        assert!(report.components.ambition > 0.0);
        assert!(report.total > evaluate("S   E").total);
        assert_eq!(report.trace.unwrap().path_length, Some(2));

        let unreached = evaluate("S #F");
        assert_eq!(unreached.classification, Classification::Unsolvable);
        assert!(approx_eq(unreached.components.bonus_objectives, 0.0));
    }

    #[test]
    fn test_unreached_bonus_scores_nothing() {
        let report = evaluate("S E#F");
        assert_eq!(report.classification, Classification::Completed);
        assert!(approx_eq(report.components.bonus_objectives, 0.0));
    }

    #[test]
    fn test_invalid_report() {
        let report = ScoreEvaluator::default().invalid(ValidationError::MissingStart);
        assert_eq!(report.classification, Classification::Invalid);
        assert!(approx_eq(report.total, -100.0));
        assert_eq!(report.components, ScoreBreakdown::default());
        assert_eq!(report.violation, Some(ValidationError::MissingStart));
    }

    #[test]
    fn test_components_sum_to_total() {
        let report = evaluate("S a A T\n s    Y\nO#Q   E");
        assert!(report.classification.is_completed());
        assert!(approx_eq(report.total, report.components.total()));
        for (name, points) in report.components.iter() {
            assert!(points >= 0.0, "{name} is negative");
        }
    }
}
