use std::path::PathBuf;

use gauntlet_evaluator::config::GradingConfig;

use crate::util::{self, Output};

/// Where the grading configuration comes from, plus per-field overrides.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigSource {
    /// Grading configuration JSON file (missing fields keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Maximum number of rows and of columns
    #[arg(long)]
    max_edge: Option<u16>,
    /// Maximum number of search state expansions
    #[arg(long)]
    iteration_cap: Option<usize>,
    /// Search wall-clock limit in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl ConfigSource {
    pub(crate) fn load(&self) -> anyhow::Result<GradingConfig> {
        let config = match &self.config {
            Some(path) => util::read_json_file("grading config", path)?,
            None => GradingConfig::default(),
        };
        let config = self.apply_overrides(config);
        tracing::debug!(?config, "grading configuration loaded");
        Ok(config)
    }

    fn apply_overrides(&self, mut config: GradingConfig) -> GradingConfig {
        if let Some(max_edge) = self.max_edge {
            config.limits.max_edge = max_edge;
        }
        if let Some(iteration_cap) = self.iteration_cap {
            config.budget.iteration_cap = iteration_cap;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.budget.timeout_ms = timeout_ms;
        }
        config
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    #[clap(flatten)]
    source: ConfigSource,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    let ConfigArg { source, output } = arg;
    let config = source.load()?;
    Output::open(output.clone())?.write_json(&config)
}
