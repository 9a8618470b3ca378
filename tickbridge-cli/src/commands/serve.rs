//! `tickbridge serve`: run the bridge until the transaction limit or Ctrl-C.

use clap::Args;
use std::path::Path;
use tickbridge::bridge::{BridgeSupervisor, StopCondition, StopReason, SupervisorConfig};
use tickbridge::config::{ConfigFile, MAX_SERVER_WORKERS};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides [server] address)
    #[arg(long)]
    pub address: Option<String>,

    /// Stop after this many completed transactions, 0 to run until Ctrl-C
    /// (overrides [harness] transactions)
    #[arg(long)]
    pub transactions: Option<u64>,

    /// Microseconds per simulated clock cycle (overrides [clock] period_us)
    #[arg(long)]
    pub period_us: Option<u64>,

    /// Calls that may wait in the bridge at once (overrides [server] workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Only write logs to the log file
    #[arg(long)]
    pub quiet: bool,
}

impl ServeArgs {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        if let Some(address) = &self.address {
            config.server.address = address.clone();
        }
        if let Some(transactions) = self.transactions {
            config.harness.transactions = transactions;
        }
        if let Some(period_us) = self.period_us {
            if period_us == 0 {
                return Err(CliError::Config("--period-us must be positive".to_string()));
            }
            config.clock.period_us = period_us;
        }
        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_SERVER_WORKERS {
                return Err(CliError::Config(format!(
                    "--workers must be between 1 and {}",
                    MAX_SERVER_WORKERS
                )));
            }
            config.server.workers = workers;
        }
        Ok(())
    }
}

pub fn run(args: ServeArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, !args.quiet)?;
    runner.log_startup("serve");

    let mut config = runner.config().clone();
    args.apply(&mut config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let mut bridge = BridgeSupervisor::start(SupervisorConfig::from(&config))?;

    let front = bridge.front();
    let token = bridge.shutdown_token();
    ctrlc::set_handler(move || {
        front.shutdown();
        token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let stop = StopCondition::from_limit(config.harness.transactions);
    if let Some(address) = bridge.local_addr() {
        println!(
            "Listening on {} with {} worker(s) (Ctrl-C to stop)",
            address,
            bridge.config().workers
        );
    }

    let outcome = runtime.block_on(bridge.run_until(stop));
    bridge.shutdown();
    let summary = outcome?;

    info!(?summary, "Serve finished");
    match summary.reason {
        StopReason::ConditionMet => println!(
            "Completed {} transactions in {} cycles",
            summary.transactions, summary.cycles
        ),
        StopReason::Shutdown => println!(
            "Interrupted after {} transactions ({} cycles)",
            summary.transactions, summary.cycles
        ),
    }
    Ok(())
}
