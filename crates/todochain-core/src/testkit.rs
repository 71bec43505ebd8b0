//! Scripted EIP-1193 wallet backed by an in-memory `TodoList` contract.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::future::{Future, ready};
use std::rc::Rc;
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256, address};
use alloy_sol_types::SolValue;
use serde_json::{Value, json};

use crate::config::CALIBRATION_CHAIN_ID;
use crate::contract::{ITodoList::ITodoListCalls, decode_calldata};
use crate::provider::{Eip1193, ProviderError, parse_hex_u64};
use crate::timer::Timer;

pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");

#[derive(Default)]
pub struct InstantTimer {
    sleeps: Cell<u32>,
    total: Cell<Duration>,
}

impl InstantTimer {
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }

    pub fn total(&self) -> Duration {
        self.total.get()
    }
}

impl Timer for InstantTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        self.sleeps.set(self.sleeps.get() + 1);
        self.total.set(self.total.get() + duration);
        ready(())
    }
}

struct PendingTx {
    hash: B256,
    call: ITodoListCalls,
    polls_left: u32,
    reverted: bool,
    mined: bool,
}

struct WalletState {
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    ignore_switches: bool,
    switch_delay_polls: u32,
    pending_switch: Option<(u64, u32)>,
    accounts: Vec<Address>,
    failures: HashMap<String, ProviderError>,
    fail_task_read_at: Option<u64>,
    revert_next: bool,
    confirm_after_polls: u32,
    tasks: Vec<(String, bool)>,
    pending: Vec<PendingTx>,
    sent: u8,
    log: Vec<(String, Value)>,
}

#[derive(Clone)]
pub struct MockWallet {
    state: Rc<RefCell<WalletState>>,
}

impl MockWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        let state = WalletState {
            chain_id,
            known_chains: BTreeSet::from([1, chain_id, CALIBRATION_CHAIN_ID]),
            ignore_switches: false,
            switch_delay_polls: 0,
            pending_switch: None,
            accounts: vec![ALICE],
            failures: HashMap::new(),
            fail_task_read_at: None,
            revert_next: false,
            confirm_after_polls: 0,
            tasks: vec![],
            pending: vec![],
            sent: 0,
            log: vec![],
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn calibration() -> Self {
        Self::on_chain(CALIBRATION_CHAIN_ID)
    }

    pub fn forget_chain(&self, chain_id: u64) {
        self.state.borrow_mut().known_chains.remove(&chain_id);
    }

    pub fn ignore_switches(&self) {
        self.state.borrow_mut().ignore_switches = true;
    }

    /// Accepted switches only show up on the `polls`-th `eth_chainId` read.
    pub fn switch_lands_after(&self, polls: u32) {
        self.state.borrow_mut().switch_delay_polls = polls;
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.state.borrow_mut().chain_id = chain_id;
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.borrow_mut().accounts = accounts;
    }

    pub fn fail_method(&self, method: &str, err: ProviderError) {
        self.state
            .borrow_mut()
            .failures
            .insert(method.to_string(), err);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.failures.clear();
        state.fail_task_read_at = None;
    }

    pub fn fail_task_read(&self, index: u64) {
        self.state.borrow_mut().fail_task_read_at = Some(index);
    }

    pub fn revert_next(&self) {
        self.state.borrow_mut().revert_next = true;
    }

    pub fn confirm_after(&self, polls: u32) {
        self.state.borrow_mut().confirm_after_polls = polls;
    }

    pub fn seed_tasks(&self, tasks: &[(&str, bool)]) {
        self.state.borrow_mut().tasks = tasks
            .iter()
            .map(|(description, completed)| (description.to_string(), *completed))
            .collect();
    }

    pub fn tasks(&self) -> Vec<(String, bool)> {
        self.state.borrow().tasks.clone()
    }

    pub fn chain_id(&self) -> u64 {
        self.state.borrow().chain_id
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.state
            .borrow()
            .log
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }

    fn handle(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.log.push((method.to_string(), params.clone()));
        if let Some(err) = state.failures.get(method) {
            return Err(err.clone());
        }

        match method {
            "eth_chainId" => {
                let state = &mut *state;
                if let Some((target, left)) = state.pending_switch.as_mut() {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        state.chain_id = *target;
                        state.pending_switch = None;
                    }
                }
                Ok(json!(format!("{:#x}", state.chain_id)))
            }
            "wallet_switchEthereumChain" => {
                let target = requested_chain(&params)?;
                if !state.known_chains.contains(&target) {
                    return Err(ProviderError::new(
                        ProviderError::UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{target:#x}\"."),
                    ));
                }
                let delay = state.switch_delay_polls;
                match (state.ignore_switches, delay) {
                    (true, _) => {}
                    (false, 0) => state.chain_id = target,
                    (false, polls) => state.pending_switch = Some((target, polls)),
                }
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let target = requested_chain(&params)?;
                state.known_chains.insert(target);
                if !state.ignore_switches {
                    state.chain_id = target;
                }
                Ok(Value::Null)
            }
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(state.accounts)),
            "eth_call" => {
                let call = decode_params(&params)?;
                let out = match call {
                    ITodoListCalls::getTaskCount(_) => U256::from(state.tasks.len()).abi_encode(),
                    ITodoListCalls::getTask(call) => {
                        let index = call._index.to::<u64>();
                        if state.fail_task_read_at == Some(index) {
                            return Err(ProviderError::new(-32000, "header not found"));
                        }
                        let (description, completed) = state
                            .tasks
                            .get(index as usize)
                            .cloned()
                            .ok_or_else(|| ProviderError::new(3, "execution reverted"))?;
                        (description, completed).abi_encode_params()
                    }
                    _ => return Err(ProviderError::new(3, "execution reverted")),
                };
                Ok(json!(Bytes::from(out)))
            }
            "eth_sendTransaction" => {
                let call = decode_params(&params)?;
                state.sent += 1;
                let hash = B256::with_last_byte(state.sent);
                let reverted = std::mem::take(&mut state.revert_next);
                let polls_left = state.confirm_after_polls;
                state.pending.push(PendingTx {
                    hash,
                    call,
                    polls_left,
                    reverted,
                    mined: false,
                });
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let hash: B256 = serde_json::from_value(params[0].clone())
                    .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
                let state = &mut *state;
                let Some(tx) = state.pending.iter_mut().find(|tx| tx.hash == hash) else {
                    return Ok(Value::Null);
                };
                if tx.polls_left > 0 {
                    tx.polls_left -= 1;
                    return Ok(Value::Null);
                }
                if !tx.mined {
                    tx.mined = true;
                    if !tx.reverted {
                        tx.reverted = !apply(&mut state.tasks, &tx.call);
                    }
                }
                Ok(json!({
                    "transactionHash": tx.hash,
                    "blockNumber": "0x2a",
                    "status": if tx.reverted { "0x0" } else { "0x1" },
                }))
            }
            other => Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                format!("{other} not supported"),
            )),
        }
    }
}

impl Eip1193 for MockWallet {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> {
        ready(self.handle(method, params))
    }
}

fn requested_chain(params: &Value) -> Result<u64, ProviderError> {
    params[0]["chainId"]
        .as_str()
        .and_then(parse_hex_u64)
        .ok_or_else(|| ProviderError::new(-32602, "invalid chainId"))
}

fn decode_params(params: &Value) -> Result<ITodoListCalls, ProviderError> {
    let data: Bytes = serde_json::from_value(params[0]["data"].clone())
        .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
    decode_calldata(&data).ok_or_else(|| ProviderError::new(3, "execution reverted"))
}

/// Applies a mined call; `false` means the contract reverted.
fn apply(tasks: &mut Vec<(String, bool)>, call: &ITodoListCalls) -> bool {
    match call {
        ITodoListCalls::addTask(call) => {
            tasks.push((call._description.clone(), false));
            true
        }
        ITodoListCalls::completeTask(call) => {
            match tasks.get_mut(call._index.to::<u64>() as usize) {
                Some(task) => {
                    task.1 = true;
                    true
                }
                None => false,
            }
        }
        _ => false,
    }
}
