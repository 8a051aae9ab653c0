//! Conversion of `debug_traceTransaction` output into flat [`TraceEntry`] lists.
//!
//! Two tracer outputs are supported. The `callTracer` returns a tree of call
//! frames which is flattened depth-first, so entries come out in the order the
//! calls were made. The default struct-log tracer returns one step per opcode
//! with only a depth counter; the call context of each step (type, sender,
//! recipient, value) is rebuilt by watching depth changes and reading the
//! arguments of the call opcode that caused them off the stack.

use anyhow::{anyhow, bail, Result};
use ethers::types::{Address, U256};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{SwapReceipt, TraceEntry, TraceMode};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Option<U256>,
    pub gas: U256,
    pub gas_used: U256,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub calls: Vec<CallFrame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLogTrace {
    #[serde(default)]
    pub failed: bool,
    pub struct_logs: Vec<StructLog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLog {
    pub op: String,
    pub gas: u64,
    pub gas_cost: u64,
    pub depth: u64, // 1-based
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stack: Option<Vec<U256>>,
}

/// Tracer options sent along with `debug_traceTransaction`.
pub fn tracer_options(mode: TraceMode) -> Value {
    match mode {
        TraceMode::Call => json!({ "tracer": "callTracer" }),
        TraceMode::StructLogs => json!({
            "disableStorage": true,
            "enableMemory": false,
            "disableStack": false,
            "enableReturnData": false,
        }),
    }
}

pub fn flatten_call_frames(root: &CallFrame) -> Vec<TraceEntry> {
    let mut entries = Vec::new();
    push_call_frame(root, 0, &mut entries);
    entries
}

fn push_call_frame(frame: &CallFrame, depth: u64, entries: &mut Vec<TraceEntry>) {
    entries.push(TraceEntry {
        depth,
        kind: frame.kind.clone(),
        from: frame.from,
        to: frame.to.unwrap_or_default(), // aborted CREATE has no address
        value: frame.value.unwrap_or_default(),
        op: None,
        error: frame.error.clone(),
        gas: Some(frame.gas),
        gas_cost: Some(frame.gas_used),
    });

    for call in &frame.calls {
        push_call_frame(call, depth + 1, entries);
    }
}

/// Context a struct-log step executes in.
#[derive(Debug, Clone)]
struct Frame {
    kind: String,
    from: Address,
    to: Address,
    value: U256,
    // address whose storage and balance the frame runs against; differs from
    // `to` under DELEGATECALL and CALLCODE
    this: Address,
    first_entry: usize,
}

pub fn reconstruct_struct_logs(
    receipt: &SwapReceipt,
    struct_logs: &[StructLog],
) -> Result<Vec<TraceEntry>> {
    let mut entries: Vec<TraceEntry> = Vec::with_capacity(struct_logs.len());
    let mut frames = vec![Frame {
        kind: "CALL".to_string(),
        from: receipt.sender,
        to: receipt.router,
        value: receipt.value,
        this: receipt.router,
        first_entry: 0,
    }];
    let mut previous: Option<&StructLog> = None;

    for (index, step) in struct_logs.iter().enumerate() {
        let depth = step.depth.saturating_sub(1);
        let current_depth = (frames.len() - 1) as u64;

        if depth > current_depth {
            if depth != current_depth + 1 {
                bail!(
                    "trace step {} jumps from depth {} to {}",
                    index,
                    current_depth,
                    depth
                );
            }
            let caller = match previous {
                Some(caller) => caller,
                None => bail!("trace step {} enters depth {} with no caller", index, depth),
            };
            let parent = &frames[frames.len() - 1];
            let frame = enter_frame(parent, caller, entries.len()).ok_or_else(|| {
                anyhow!(
                    "trace step {} enters depth {} after {} instead of a call",
                    index,
                    depth,
                    caller.op
                )
            })?;
            frames.push(frame);
        }

        while depth < (frames.len() - 1) as u64 {
            let Some(finished) = frames.pop() else {
                break;
            };
            // only the constructor's own steps get the created address; calls it
            // makes keep the zero sender recorded when they were entered
            if is_create(&finished.kind) {
                if let Some(created) = stack_word(step, 0).map(word_to_address) {
                    let finished_depth = frames.len() as u64;
                    for entry in entries[finished.first_entry..]
                        .iter_mut()
                        .filter(|entry| entry.depth == finished_depth)
                    {
                        entry.to = created;
                    }
                }
            }
        }

        let frame = &frames[frames.len() - 1];
        entries.push(TraceEntry {
            depth,
            kind: frame.kind.clone(),
            from: frame.from,
            to: frame.to,
            value: frame.value,
            op: Some(step.op.clone()),
            error: step.error.clone(),
            gas: Some(step.gas.into()),
            gas_cost: Some(step.gas_cost.into()),
        });
        previous = Some(step);
    }

    Ok(entries)
}

fn enter_frame(parent: &Frame, caller: &StructLog, first_entry: usize) -> Option<Frame> {
    let kind = caller.op.to_ascii_uppercase();
    let (from, to, value, this) = match kind.as_str() {
        "CALL" => {
            let to = word_to_address(stack_word(caller, 1)?);
            (parent.this, to, stack_word(caller, 2)?, to)
        }
        "CALLCODE" => (
            parent.this,
            word_to_address(stack_word(caller, 1)?),
            stack_word(caller, 2)?,
            parent.this,
        ),
        "DELEGATECALL" => (
            parent.from,
            word_to_address(stack_word(caller, 1)?),
            parent.value,
            parent.this,
        ),
        "STATICCALL" => {
            let to = word_to_address(stack_word(caller, 1)?);
            (parent.this, to, U256::zero(), to)
        }
        // address is only known once the frame returns
        "CREATE" | "CREATE2" => (
            parent.this,
            Address::zero(),
            stack_word(caller, 0)?,
            Address::zero(),
        ),
        _ => return None,
    };

    Some(Frame {
        kind,
        from,
        to,
        value,
        this,
        first_entry,
    })
}

fn is_create(kind: &str) -> bool {
    kind == "CREATE" || kind == "CREATE2"
}

/// Stack word `position` slots below the top.
fn stack_word(step: &StructLog, position: usize) -> Option<U256> {
    let stack = step.stack.as_ref()?;
    stack.len().checked_sub(position + 1).map(|index| stack[index])
}

fn word_to_address(word: U256) -> Address {
    let mut buffer = [0u8; 32];
    word.to_big_endian(&mut buffer);
    Address::from_slice(&buffer[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::H256;

    const SENDER: Address = Address::repeat_byte(0xaa);
    const ROUTER: Address = Address::repeat_byte(0xbb);
    const PAIR: Address = Address::repeat_byte(0xcc);
    const TOKEN: Address = Address::repeat_byte(0xdd);

    fn receipt() -> SwapReceipt {
        SwapReceipt {
            transaction_hash: H256::zero(),
            sender: SENDER,
            router: ROUTER,
            value: U256::from(1000),
            gas_used: None,
            effective_gas_price: None,
        }
    }

    fn address_word(address: Address) -> U256 {
        U256::from_big_endian(address.as_bytes())
    }

    fn step(op: &str, depth: u64, stack: Vec<U256>) -> StructLog {
        StructLog {
            op: op.to_string(),
            gas: 100_000 - depth,
            gas_cost: 3,
            depth,
            error: None,
            stack: Some(stack),
        }
    }

    #[test]
    fn test_flatten_call_frames() {
        let root: CallFrame = serde_json::from_value(json!({
            "type": "CALL",
            "from": format!("{:?}", SENDER),
            "to": format!("{:?}", ROUTER),
            "value": "0xde0b6b3a7640000",
            "gas": "0x2dc6c0",
            "gasUsed": "0x1d4c0",
            "calls": [
                {
                    "type": "STATICCALL",
                    "from": format!("{:?}", ROUTER),
                    "to": format!("{:?}", PAIR),
                    "gas": "0x100",
                    "gasUsed": "0x10"
                },
                {
                    "type": "CALL",
                    "from": format!("{:?}", ROUTER),
                    "to": format!("{:?}", PAIR),
                    "value": "0x0",
                    "gas": "0x200",
                    "gasUsed": "0x20",
                    "calls": [
                        {
                            "type": "CALL",
                            "from": format!("{:?}", PAIR),
                            "to": format!("{:?}", TOKEN),
                            "gas": "0x50",
                            "gasUsed": "0x5",
                            "error": "execution reverted"
                        }
                    ]
                },
                {
                    "type": "CREATE",
                    "from": format!("{:?}", ROUTER),
                    "gas": "0x300",
                    "gasUsed": "0x300",
                    "error": "out of gas"
                }
            ]
        }))
        .expect("failed to deserialize");

        let entries = flatten_call_frames(&root);

        let summary: Vec<(u64, &str, Address)> = entries
            .iter()
            .map(|entry| (entry.depth, entry.kind.as_str(), entry.to))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "CALL", ROUTER),
                (1, "STATICCALL", PAIR),
                (1, "CALL", PAIR),
                (2, "CALL", TOKEN),
                (1, "CREATE", Address::zero()),
            ]
        );
        assert_eq!(entries[0].value, U256::exp10(18));
        assert_eq!(entries[0].gas, Some(U256::from(3_000_000)));
        assert_eq!(entries[0].gas_cost, Some(U256::from(120_000)));
        assert_eq!(entries[1].value, U256::zero());
        assert_eq!(entries[3].error.as_deref(), Some("execution reverted"));
        assert!(entries.iter().all(|entry| entry.op.is_none()));
    }

    #[test]
    fn test_reconstruct_call_context() {
        let logs = vec![
            step("PUSH1", 1, vec![]),
            // CALL(gas, to, value, ...)
            step(
                "CALL",
                1,
                vec![U256::zero(), U256::from(7), address_word(PAIR), U256::from(50_000)],
            ),
            step("PUSH1", 2, vec![]),
            // DELEGATECALL(gas, to, ...)
            step(
                "DELEGATECALL",
                2,
                vec![U256::zero(), address_word(TOKEN), U256::from(40_000)],
            ),
            step("SLOAD", 3, vec![]),
            step("STOP", 3, vec![]),
            step("RETURN", 2, vec![]),
            step("POP", 1, vec![U256::one()]),
        ];

        let entries = reconstruct_struct_logs(&receipt(), &logs).expect("failed to rebuild");

        assert_eq!(entries.len(), logs.len());
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[0].kind, "CALL");
        assert_eq!(entries[0].from, SENDER);
        assert_eq!(entries[0].to, ROUTER);
        assert_eq!(entries[0].value, U256::from(1000));
        assert_eq!(entries[0].op.as_deref(), Some("PUSH1"));

        assert_eq!(entries[2].depth, 1);
        assert_eq!(entries[2].from, ROUTER);
        assert_eq!(entries[2].to, PAIR);
        assert_eq!(entries[2].value, U256::from(7));

        // delegatecall keeps the caller's sender and value
        assert_eq!(entries[4].kind, "DELEGATECALL");
        assert_eq!(entries[4].from, ROUTER);
        assert_eq!(entries[4].to, TOKEN);
        assert_eq!(entries[4].value, U256::from(7));

        assert_eq!(entries[6].to, PAIR);
        assert_eq!(entries[7].to, ROUTER);
        assert_eq!(entries[7].depth, 0);
        assert!(entries
            .iter()
            .all(|entry| entry.gas.is_some() && entry.gas_cost == Some(U256::from(3))));
    }

    #[test]
    fn test_reconstruct_backfills_created_address() {
        let created = Address::repeat_byte(0xee);
        let logs = vec![
            // CREATE(value, offset, size)
            step("CREATE", 1, vec![U256::zero(), U256::zero(), U256::from(5)]),
            step("PUSH1", 2, vec![]),
            step("RETURN", 2, vec![]),
            step("POP", 1, vec![address_word(created)]),
        ];

        let entries = reconstruct_struct_logs(&receipt(), &logs).expect("failed to rebuild");

        assert_eq!(entries[1].kind, "CREATE");
        assert_eq!(entries[1].value, U256::from(5));
        assert_eq!(entries[1].from, ROUTER);
        assert_eq!(entries[1].to, created);
        assert_eq!(entries[2].to, created);
        assert_eq!(entries[3].to, ROUTER);
    }

    #[test]
    fn test_reconstruct_rejects_malformed_depth() {
        let unexplained = vec![step("PUSH1", 1, vec![]), step("PUSH1", 2, vec![])];
        assert!(reconstruct_struct_logs(&receipt(), &unexplained).is_err());

        let jump = vec![step("CALL", 1, vec![U256::zero(); 7]), step("PUSH1", 3, vec![])];
        assert!(reconstruct_struct_logs(&receipt(), &jump).is_err());

        let orphan = vec![step("PUSH1", 2, vec![])];
        assert!(reconstruct_struct_logs(&receipt(), &orphan).is_err());
    }

    #[test]
    fn test_tracer_options() {
        assert_eq!(
            tracer_options(TraceMode::Call),
            json!({ "tracer": "callTracer" })
        );

        let options = tracer_options(TraceMode::StructLogs);
        assert!(options.get("tracer").is_none());
        assert_eq!(options["disableStack"], json!(false));
        assert_eq!(options["disableStorage"], json!(true));
        assert_eq!(options["enableMemory"], json!(false));
    }

    #[test]
    fn test_struct_log_deserialization() {
        let trace: StructLogTrace = serde_json::from_value(json!({
            "failed": false,
            "gas": 21000,
            "returnValue": "",
            "structLogs": [
                {"pc": 0, "op": "PUSH1", "gas": 300000, "gasCost": 3, "depth": 1, "stack": []},
                {"pc": 2, "op": "REVERT", "gas": 299997, "gasCost": 0, "depth": 1,
                 "stack": ["0x0", "0x20"], "error": "execution reverted"}
            ]
        }))
        .expect("failed to deserialize");

        assert!(!trace.failed);
        assert_eq!(trace.struct_logs.len(), 2);
        assert_eq!(stack_word(&trace.struct_logs[1], 0), Some(U256::from(0x20)));
        assert_eq!(stack_word(&trace.struct_logs[1], 2), None);
        assert_eq!(
            trace.struct_logs[1].error.as_deref(),
            Some("execution reverted")
        );
    }
}
