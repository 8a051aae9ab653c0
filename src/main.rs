use anyhow::Result;
use log::info;
use std::io;
use tracing_subscriber::EnvFilter;

mod configuration;
use crate::configuration::Configuration;

mod constants;
mod ethereum_client;
use crate::ethereum_client::EthereumClient;

mod explorer_client;
mod network;
mod printer;
mod simulation;
mod trace;
mod types;

/// Swap once on a forked mainnet and dump the transaction's execution trace.
///
/// Every step runs to completion before the next starts:
/// - connect to the fork node and check it answers
/// - resolve the router ABI and pick a funded, unlocked account
/// - submit `swapExactETHForTokens` with zero minimum output and wait for it
/// - print the receipt summary, then every entry of the transaction trace
///
/// Any failure ends the run with a non-zero exit status; nothing is retried.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    info!("=== FORK SWAP TRACE STARTING ===");

    let config = Configuration::get_from_environment()?;
    let client = EthereumClient::connect(&config).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    simulation::run(&client, &config, &mut out).await?;

    Ok(())
}
