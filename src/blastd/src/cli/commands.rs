use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "blastd",
    about = "Buffers editor activity locally and forwards it to Blast",
    version
)]
pub struct Cli {
    /// Path to a TOML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the daemon in the foreground (default)
    Run,

    /// Check that a daemon is listening
    Ping,

    /// Ask the running daemon to sync now
    Sync,
}
