// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod params;

#[derive(Parser, Debug)]
#[command(name = "cliwrap", version, about = "Run configured command-line programs with typed arguments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Executable definition (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured program and its commands.
    Commands,

    /// Print the argument string a command builds.
    Args {
        /// Command name.
        command: String,

        /// Input fields as key=value. Values parse as JSON when possible.
        ///
        /// Examples:
        /// --param n=4
        /// --param host=localhost
        #[arg(long = "param")]
        params: Vec<String>,
    },

    /// Run a command and print its parsed output.
    Run {
        /// Command name.
        command: String,

        /// Input fields as key=value. Values parse as JSON when possible.
        #[arg(long = "param")]
        params: Vec<String>,

        /// Print JSON instead of plain lines.
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON schema of the config file.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("cliwrap=debug")
        } else {
            EnvFilter::new("cliwrap=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Commands => commands::list(cli.config.as_deref()),
        Commands::Args { command, params } => {
            commands::args(cli.config.as_deref(), &command, &params)
        }
        Commands::Run {
            command,
            params,
            json,
        } => commands::run(cli.config.as_deref(), &command, &params, json).await,
        Commands::Schema => commands::schema(),
    }
}
