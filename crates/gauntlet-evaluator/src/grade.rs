use gauntlet_engine::{Grid, explore};

use crate::{
    config::GradingConfig, report::ScoreReport, score_evaluator::ScoreEvaluator,
    usage_analysis::UsageAnalysis,
};

/// Grades one grid text.
///
/// Total over its input: malformed text yields an `Invalid` report, a
/// tripped search budget yields a `Timeout` report. Calls share no state, so
/// any number of them may run in parallel.
#[must_use]
pub fn grade(text: &str, config: &GradingConfig) -> ScoreReport {
    let evaluator = ScoreEvaluator::new(config.weights);
    let grid = match Grid::parse(text, &config.limits) {
        Ok(grid) => grid,
        Err(violation) => {
            tracing::debug!(%violation, "grid rejected");
            return evaluator.invalid(violation);
        }
    };
    tracing::trace!(rows = grid.rows(), cols = grid.cols(), "grid parsed");

    let outcome = explore(&grid, &config.budget);
    let analysis = UsageAnalysis::new(&grid, &outcome);
    let report = evaluator.evaluate(&grid, &outcome, &analysis);
    tracing::debug!(
        classification = %report.classification,
        total = report.total,
        approximate = report.approximate,
        "grid graded"
    );
    report
}
