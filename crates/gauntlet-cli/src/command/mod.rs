use clap::{Parser, Subcommand};

use self::{config::ConfigArg, grade::GradeArg};

mod config;
mod grade;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Grade maze grid files
    Grade(#[clap(flatten)] GradeArg),
    /// Print the effective grading configuration as JSON
    Config(#[clap(flatten)] ConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Grade(arg) => grade::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
    }
    Ok(())
}
