use anyhow::Result;
use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::types::Address;

use crate::types::{SwapReceipt, SwapRequest, TraceEntry};

/// Everything the simulation needs from the forked network and the
/// contract-metadata service.
#[async_trait]
pub trait ForkNetwork {
    async fn resolve_contract(&self, address: Address) -> Result<Abi>;

    /// Accounts the fork node holds unlocked and funded.
    async fn funded_accounts(&self) -> Result<Vec<Address>>;

    /// Sends the swap and waits until it is mined.
    async fn submit_swap(&self, router: &Abi, request: &SwapRequest) -> Result<SwapReceipt>;

    async fn fetch_trace(&self, receipt: &SwapReceipt) -> Result<Vec<TraceEntry>>;
}
