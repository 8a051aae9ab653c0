use anyhow::{anyhow, Error};
use ethers::types::{Address, H256, U256};
use std::str::FromStr;

/// One `swapExactETHForTokens` invocation, built fresh for every run.
#[derive(Debug, PartialEq, Clone)]
pub struct SwapRequest {
    pub router: Address,
    pub sender: Address,
    pub path: Vec<Address>, // [input asset, output asset]
    pub amount_in: U256,
    pub recipient: Address,
    pub amount_out_min: U256,
    pub deadline: U256,
}

/// The parts of a mined transaction receipt the report consumes.
#[derive(Debug, PartialEq, Clone)]
pub struct SwapReceipt {
    pub transaction_hash: H256,
    pub sender: Address,
    pub router: Address,
    pub value: U256,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
}

/// A single recorded step of a transaction's execution.
///
/// `depth` through `value` are always printed; the remaining fields only
/// appear when the tracer populated them for this entry.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct TraceEntry {
    pub depth: u64,
    pub kind: String,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub op: Option<String>,
    pub error: Option<String>,
    pub gas: Option<U256>,
    pub gas_cost: Option<U256>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum TraceMode {
    /// One entry per call frame (`callTracer`).
    #[default]
    Call,
    /// One entry per executed opcode (default struct-log tracer).
    StructLogs,
}

impl FromStr for TraceMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "struct" | "structlogs" => Ok(Self::StructLogs),
            other => Err(anyhow!(
                "unknown trace mode `{}`, expected `call` or `struct`",
                other
            )),
        }
    }
}
