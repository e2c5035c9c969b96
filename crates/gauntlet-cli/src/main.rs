use anyhow::Context as _;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;
mod util;

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    command::run()
}
