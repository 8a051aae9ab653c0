use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ethers::abi::{parse_abi, Abi};
use ethers::prelude::*;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::configuration::Configuration;
use crate::constants::{BUNDLED_ROUTER_ABI, SWAP_FUNCTION};
use crate::explorer_client::ExplorerClient;
use crate::network::ForkNetwork;
use crate::trace::{
    flatten_call_frames, reconstruct_struct_logs, tracer_options, CallFrame, StructLogTrace,
};
use crate::types::{SwapReceipt, SwapRequest, TraceEntry, TraceMode};

/// Connection to a forked node whose accounts are unlocked, so transactions
/// are sent with `eth_sendTransaction` and signed by the node.
pub struct EthereumClient<P = Http> {
    inner_client: Arc<Provider<P>>,
    explorer: Option<ExplorerClient>,
    trace_mode: TraceMode,
}

impl<P: JsonRpcClient> EthereumClient<P> {
    pub fn new(
        provider: Provider<P>,
        explorer: Option<ExplorerClient>,
        trace_mode: TraceMode,
    ) -> Self {
        Self {
            inner_client: Arc::new(provider),
            explorer,
            trace_mode,
        }
    }
}

impl EthereumClient<Http> {
    pub async fn connect(config: &Configuration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .with_context(|| format!("invalid RPC url {}", config.rpc_url))?;

        let chain_id = provider
            .get_chainid()
            .await
            .with_context(|| format!("unable to reach {} at {}", config.network, config.rpc_url))?;
        let block_number = provider.get_block_number().await?;

        info!(
            "connected to {} at {} (chain id {}, block {})",
            config.network, config.rpc_url, chain_id, block_number
        );

        let explorer = ExplorerClient::new(config);
        if explorer.is_none() {
            warn!("ETHERSCAN_API_KEY not set, falling back to the bundled router ABI");
        }

        Ok(Self::new(provider, explorer, config.trace_mode))
    }
}

/// Receipt summary for a mined swap; a dropped or reverted transaction is an
/// error naming its hash.
fn swap_receipt(
    request: &SwapRequest,
    transaction_hash: TxHash,
    receipt: Option<TransactionReceipt>,
) -> Result<SwapReceipt> {
    let receipt = receipt.ok_or_else(|| {
        anyhow!(
            "swap transaction {:?} was dropped before being mined",
            transaction_hash
        )
    })?;

    if receipt.status == Some(U64::zero()) {
        bail!("swap transaction {:?} reverted", transaction_hash);
    }

    Ok(SwapReceipt {
        transaction_hash,
        sender: request.sender,
        router: request.router,
        value: request.amount_in,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
    })
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ForkNetwork for EthereumClient<P> {
    async fn resolve_contract(&self, address: Address) -> Result<Abi> {
        match &self.explorer {
            Some(explorer) => explorer.get_abi(address).await,
            None => Ok(parse_abi(BUNDLED_ROUTER_ABI)?),
        }
    }

    async fn funded_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.inner_client.get_accounts().await?)
    }

    async fn submit_swap(&self, router: &Abi, request: &SwapRequest) -> Result<SwapReceipt> {
        let router_contract =
            Contract::new(request.router, router.clone(), Arc::clone(&self.inner_client));

        let call = router_contract
            .method::<_, Vec<U256>>(
                SWAP_FUNCTION,
                (
                    request.amount_out_min,
                    request.path.clone(),
                    request.recipient,
                    request.deadline,
                ),
            )?
            .from(request.sender)
            .value(request.amount_in);

        let pending_transaction = call.send().await?;
        let transaction_hash = *pending_transaction;
        info!("submitted swap transaction {:?}", transaction_hash);

        swap_receipt(request, transaction_hash, pending_transaction.await?)
    }

    async fn fetch_trace(&self, receipt: &SwapReceipt) -> Result<Vec<TraceEntry>> {
        let params = (receipt.transaction_hash, tracer_options(self.trace_mode));
        let response: Value = self
            .inner_client
            .request("debug_traceTransaction", params)
            .await
            .context("debug_traceTransaction failed")?;

        match self.trace_mode {
            TraceMode::Call => {
                let root: CallFrame = serde_json::from_value(response)
                    .context("unable to decode callTracer frame")?;
                Ok(flatten_call_frames(&root))
            }
            TraceMode::StructLogs => {
                let trace: StructLogTrace = serde_json::from_value(response)
                    .context("unable to decode struct logs")?;
                if trace.failed {
                    warn!("node reports the traced execution as failed");
                }
                reconstruct_struct_logs(receipt, &trace.struct_logs)
            }
        }
    }
}
