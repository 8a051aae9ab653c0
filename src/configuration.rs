use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use log::debug;
use std::env;
use std::str::FromStr;

use crate::constants::{
    DAI_ADDRESS, DEFAULT_DEADLINE_WINDOW_SECS, DEFAULT_EXPLORER_API_URL, DEFAULT_NETWORK,
    DEFAULT_RPC_URL, DEFAULT_SWAP_AMOUNT_WEI, UNISWAP_ROUTER_ADDRESS, WETH_ADDRESS,
};
use crate::types::TraceMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub network: String, // name of the fork profile, e.g. 'mainnet-fork'
    pub rpc_url: String,
    pub etherscan_api_key: Option<String>,
    pub explorer_api_url: String,
    pub router_address: Address,
    pub input_token: Address,
    pub output_token: Address,
    pub swap_amount: U256,
    pub account_index: usize,
    pub deadline_window_secs: u64,
    pub trace_mode: TraceMode,
}

impl Configuration {
    pub fn get_from_environment() -> Result<Self> {
        let network = collect_optional_environment_variable("FORK_NETWORK")?
            .unwrap_or(DEFAULT_NETWORK.to_string());
        let rpc_url = collect_optional_environment_variable("FORK_RPC_URL")?
            .unwrap_or(DEFAULT_RPC_URL.to_string());
        let etherscan_api_key = collect_optional_environment_variable("ETHERSCAN_API_KEY")?;
        let explorer_api_url = collect_optional_environment_variable("EXPLORER_API_URL")?
            .unwrap_or(DEFAULT_EXPLORER_API_URL.to_string());

        let router_address = parse_or_default("ROUTER_ADDRESS", UNISWAP_ROUTER_ADDRESS)?;
        let input_token = parse_or_default("INPUT_TOKEN", WETH_ADDRESS)?;
        let output_token = parse_or_default("OUTPUT_TOKEN", DAI_ADDRESS)?;

        let swap_amount = collect_optional_environment_variable("SWAP_AMOUNT_WEI")?
            .map(|var| U256::from_dec_str(&var))
            .transpose()
            .context("SWAP_AMOUNT_WEI must be a decimal amount of wei")?
            .unwrap_or(DEFAULT_SWAP_AMOUNT_WEI.into());
        let account_index = collect_optional_environment_variable("ACCOUNT_INDEX")?
            .map(|var| var.parse::<usize>())
            .transpose()
            .context("ACCOUNT_INDEX must be a non-negative integer")?
            .unwrap_or(0);
        let deadline_window_secs =
            collect_optional_environment_variable("DEADLINE_WINDOW_SECS")?
                .map(|var| var.parse::<u64>())
                .transpose()
                .context("DEADLINE_WINDOW_SECS must be a number of seconds")?
                .unwrap_or(DEFAULT_DEADLINE_WINDOW_SECS);
        let trace_mode = collect_optional_environment_variable("TRACE_MODE")?
            .map(|var| var.parse::<TraceMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            network,
            rpc_url,
            etherscan_api_key,
            explorer_api_url,
            router_address,
            input_token,
            output_token,
            swap_amount,
            account_index,
            deadline_window_secs,
            trace_mode,
        })
    }
}

fn parse_or_default<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = collect_optional_environment_variable(key)?.unwrap_or(default.to_string());
    raw.parse::<T>()
        .with_context(|| format!("unable to parse {} from `{}`", key, raw))
}

/// Empty values count as unset.
fn collect_optional_environment_variable(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
        _ => {
            debug!(
                "environment variable {} not set but it wasn't required",
                key
            );
            Ok(None)
        }
    }
}
