//! TickBridge CLI
//!
//! Runs the bridge (`serve`), calls it (`add`), and manages its
//! configuration file (`config`).

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::add::AddArgs;
use commands::config::ConfigCommands;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[command(name = "tickbridge")]
#[command(version = tickbridge::VERSION)]
#[command(about = "Serve a tick-driven simulated adder behind a blocking remote call", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tickbridge/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge and serve Add calls
    Serve(ServeArgs),

    /// Call Add on a running bridge
    Add(AddArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config_path),
        Commands::Add(args) => commands::add::run(args, config_path),
        Commands::Config(command) => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
