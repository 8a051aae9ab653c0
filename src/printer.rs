use anyhow::Result;
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use std::io::Write;

use crate::types::{SwapReceipt, TraceEntry};

impl TraceEntry {
    /// Mandatory fields first, then whichever optional fields are present,
    /// always in the same order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Depth: {}", self.depth),
            format!("Type: {}", self.kind),
            format!("From: {}", checksummed(&self.from)),
            format!("To: {}", checksummed(&self.to)),
            format!("Value: {}", self.value),
        ];

        if let Some(op) = &self.op {
            lines.push(format!("Opcode: {}", op));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error: {}", error));
        }
        if let Some(gas) = &self.gas {
            lines.push(format!("Gas: {}", gas));
        }
        if let Some(gas_cost) = &self.gas_cost {
            lines.push(format!("Gas Cost: {}", gas_cost));
        }

        lines
    }
}

/// One block of lines per entry, lazily, in input order.
pub fn trace_blocks(trace: &[TraceEntry]) -> impl Iterator<Item = Vec<String>> + '_ {
    trace.iter().map(TraceEntry::lines)
}

pub fn write_receipt<W: Write>(receipt: &SwapReceipt, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "Transaction hash: 0x{}",
        hex::encode(receipt.transaction_hash)
    )?;
    writeln!(out, "Gas used: {}", or_unavailable(receipt.gas_used))?;
    writeln!(
        out,
        "Effective gas price: {}",
        or_unavailable(receipt.effective_gas_price)
    )?;
    Ok(())
}

pub fn write_trace<W: Write>(trace: &[TraceEntry], out: &mut W) -> Result<()> {
    writeln!(out, "\nTransaction Trace Analysis:")?;

    for block in trace_blocks(trace) {
        writeln!(out)?;
        for line in block {
            writeln!(out, "{}", line)?;
        }
    }

    Ok(())
}

fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}

fn or_unavailable(value: Option<U256>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unavailable".to_string())
}
