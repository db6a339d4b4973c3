//! CLI interface for sigma-edge
//!
//! Provides subcommands for:
//! - `run`: drive the engine from JSON-line bars on stdin
//! - `replay`: replay a recorded bar file through the engine
//! - `config`: show the effective configuration

mod replay;
mod run;

pub use replay::ReplayArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sigma-edge")]
#[command(about = "Decision engine for an extreme-move reversion strategy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine on bars read from stdin
    Run(RunArgs),
    /// Replay a recorded bar file through the engine
    Replay(ReplayArgs),
    /// Show the effective configuration
    Config,
}
