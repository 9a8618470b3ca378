//! `tickbridge add`: one remote call against a running bridge.

use clap::Args;
use std::path::Path;
use std::time::Duration;
use tickbridge::message::AddResult;
use tickbridge::server::RemoteClient;

use crate::error::CliError;
use crate::runner::load_config;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// First operand
    pub ina: u64,

    /// Second operand
    pub inb: u64,

    /// Bridge address (default: [server] address from the config file)
    #[arg(long)]
    pub address: Option<String>,

    /// Give up after this many milliseconds without a reply
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the result as a JSON object
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AddArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let address = match args.address {
        Some(address) => address,
        None => load_config(config_path)?.0.server.address,
    };

    let mut client = RemoteClient::connect(address.as_str())?;
    client.set_timeout(args.timeout_ms.map(Duration::from_millis));

    let result = AddResult {
        res: client.add(args.ina, args.inb)?,
    };
    if args.json {
        let json = serde_json::to_string(&result).map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("{}", result);
    }
    Ok(())
}
