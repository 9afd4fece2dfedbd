use super::commands::{Cli, Command};
use crate::config::ConfigLoader;
use crate::daemon::daemon_run;
use crate::daemon::structs::Response;
use crate::daemon::DaemonClient;
use crate::logging::setup_logging;
use anyhow::{bail, Context, Result};
use clap::Parser;

/// Process the command line.
pub fn process_command() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref())?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            setup_logging(&config)?;
            runtime.block_on(daemon_run::run(config))
        }
        Command::Ping => {
            let client = DaemonClient::new(&config.socket_path);
            let response = runtime
                .block_on(client.send_ping_request())
                .with_context(|| format!("Failed to reach daemon at {}", config.socket_path.display()))?;
            report(response, "blastd is running")
        }
        Command::Sync => {
            let client = DaemonClient::new(&config.socket_path);
            let response = runtime
                .block_on(client.send_sync_request())
                .with_context(|| format!("Failed to reach daemon at {}", config.socket_path.display()))?;
            report(response, "sync requested")
        }
    }
}

fn report(response: Response, fallback: &str) -> Result<()> {
    if !response.ok {
        bail!(response.error.unwrap_or_else(|| "request failed".to_string()));
    }
    println!("{}", response.message.as_deref().unwrap_or(fallback));
    Ok(())
}
