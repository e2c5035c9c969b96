//! Grading of maze grids: usage analysis, scoring and reports.
//!
//! This crate sits on top of `gauntlet-engine` and turns one grid text into a
//! [`ScoreReport`](report::ScoreReport):
//!
//! ```text
//! grid text
//!     ↓ Grid::parse           (validation; failures score as Invalid)
//! Grid
//!     ↓ explore               (composite-state BFS within the search budget)
//! SearchOutcome
//!     ↓ UsageAnalysis::new    (which mechanics the winning path relies on)
//! UsageAnalysis
//!     ↓ ScoreEvaluator        (capped components, classification)
//! ScoreReport
//! ```
//!
//! # Modules
//!
//! - [`grade`] - The total entry point running the whole pipeline
//! - [`usage_analysis`] - Strategic element analysis of a finished search
//! - [`score_evaluator`] - Score components and terminal classification
//! - [`report`] - The report returned to callers, with a text rendering
//! - [`config`] - Limits, search budget and point values
//!
//! # Example
//!
//! ```rust
//! use gauntlet_evaluator::{config::GradingConfig, grade::grade, report::Classification};
//!
//! let report = grade("S a A E", &GradingConfig::default());
//! assert_eq!(report.classification, Classification::Completed);
//! assert!(report.total > 0.0);
//! ```

pub mod config;
pub mod grade;
pub mod report;
pub mod score_evaluator;
pub mod usage_analysis;
