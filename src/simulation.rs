use anyhow::{anyhow, Result};
use ethers::types::{Address, U256};
use log::info;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::instrument;

use crate::configuration::Configuration;
use crate::network::ForkNetwork;
use crate::printer;
use crate::types::SwapRequest;

/// Swap on the configured router from a funded fork account, then write the
/// receipt summary and the full trace to `out`.
#[instrument(skip_all, fields(network = %config.network))]
pub async fn run<N, W>(network: &N, config: &Configuration, out: &mut W) -> Result<()>
where
    N: ForkNetwork + Sync,
    W: Write,
{
    let router = network.resolve_contract(config.router_address).await?;

    let accounts = network.funded_accounts().await?;
    let account = *accounts.get(config.account_index).ok_or_else(|| {
        anyhow!(
            "fork exposes {} funded accounts, no account at index {}",
            accounts.len(),
            config.account_index
        )
    })?;

    let request = build_swap_request(config, account, current_timestamp()?)?;
    info!(
        "swapping {} wei of {:?} for {:?} from {:?}",
        request.amount_in, config.input_token, config.output_token, account
    );

    let receipt = network.submit_swap(&router, &request).await?;
    printer::write_receipt(&receipt, out)?;

    let trace = network.fetch_trace(&receipt).await?;
    info!("retrieved {} trace entries", trace.len());
    printer::write_trace(&trace, out)?;

    Ok(())
}

/// Zero minimum output: the swap carries no slippage protection.
pub fn build_swap_request(
    config: &Configuration,
    account: Address,
    now: u64,
) -> Result<SwapRequest> {
    let deadline = now
        .checked_add(config.deadline_window_secs)
        .ok_or_else(|| {
            anyhow!(
                "deadline window of {} seconds overflows the current timestamp {}",
                config.deadline_window_secs,
                now
            )
        })?;

    Ok(SwapRequest {
        router: config.router_address,
        sender: account,
        path: vec![config.input_token, config.output_token],
        amount_in: config.swap_amount,
        recipient: account,
        amount_out_min: U256::zero(),
        deadline: deadline.into(),
    })
}

fn current_timestamp() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
