use std::{iter, path::PathBuf, thread};

use gauntlet_evaluator::{config::GradingConfig, grade::grade, report::ScoreReport};

use crate::{
    command::config::ConfigSource,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct GradeArg {
    /// Grid text files to grade (`-` reads standard input)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Report format: json or text
    #[arg(long, default_value = "json")]
    format: ReportFormat,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    config: ConfigSource,
}

#[derive(Debug, serde::Serialize)]
struct GradedFile<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a ScoreReport,
}

pub(crate) fn run(arg: &GradeArg) -> anyhow::Result<()> {
    let GradeArg {
        files,
        format,
        output,
        config,
    } = arg;
    let config = config.load()?;
    let texts = files
        .iter()
        .map(|path| util::read_text_input("grid", path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let reports = grade_all(&texts, &config);
    for (path, report) in iter::zip(files, &reports) {
        tracing::info!(
            file = %util::display_input_path(path),
            classification = %report.classification,
            total = report.total,
            "graded"
        );
    }

    let mut output = Output::open(output.clone())?;
    match format {
        ReportFormat::Json => {
            let graded = iter::zip(files, &reports)
                .map(|(path, report)| GradedFile {
                    file: util::display_input_path(path),
                    report,
                })
                .collect::<Vec<_>>();
            output.write_json(&graded)?;
        }
        ReportFormat::Text => {
            for (path, report) in iter::zip(files, &reports) {
                let path = util::display_input_path(path);
                output.write_text(&format!("== {path} ==\n{report}\n"))?;
            }
            output.finish()?;
        }
    }
    Ok(())
}

/// Grades every text on its own scoped thread, keeping input order.
fn grade_all(texts: &[String], config: &GradingConfig) -> Vec<ScoreReport> {
    let mut slots = vec![None; texts.len()];
    thread::scope(|s| {
        for (text, slot) in iter::zip(texts, &mut slots) {
            s.spawn(move || {
                *slot = Some(grade(text, config));
            });
        }
    });
    slots.into_iter().flatten().collect()
}
