//! Mock transports for testing.
//!
//! `MockLedger` is an in-memory ledger that hosts any number of profit-token contracts
//! and answers every frame kind. Invocations are simulated: they run against a copy of
//! the contract state, skip authorization and commit nothing. Submissions check
//! signatures and commit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::DashSet;
use ledgerrpc::Address;
use ledgerrpc::Deploy;
use ledgerrpc::Deployed;
use ledgerrpc::FailureReason;
use ledgerrpc::InvokeDecoder;
use ledgerrpc::Pending;
use ledgerrpc::ReplyErrEncoder;
use ledgerrpc::ReplyOkEncoder;
use ledgerrpc::RpcFrame;
use ledgerrpc::Schema;
use ledgerrpc::Value;
use tracing::debug;

use crate::contracts::profit_token;
use crate::error::Result;
use crate::network::TESTNET_PASSPHRASE;
use crate::transport;
use crate::transport::Transport;
use crate::transport::TransportError;

const ADDRESS_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Storage of one profit-token instance.
#[derive(Debug, Clone, Default)]
struct TokenState {
    admin: Option<Address>,
    total_supply: i128,
    balances: HashMap<Address, i128>,
    allowances: HashMap<(Address, Address), i128>,
}

/// A settled submission waiting to be collected by polls.
#[derive(Debug)]
struct Settlement {
    seq: u64,
    answer: Vec<u8>,
    polls_left: usize,
}

pub struct MockLedger {
    passphrase: String,
    schema: Arc<Schema>,
    contracts: DashMap<String, TokenState>,
    installed: DashSet<Vec<u8>>,
    pending: DashMap<String, Settlement>,
    settle_after: AtomicUsize,
    frames: AtomicUsize,
    next_hash: AtomicU64,
}

impl MockLedger {
    /// An empty ledger identified by `passphrase`.
    pub fn new(passphrase: impl Into<String>) -> Result<Self> {
        Ok(Self {
            passphrase: passphrase.into(),
            schema: profit_token::schema()?,
            contracts: DashMap::new(),
            installed: DashSet::new(),
            pending: DashMap::new(),
            settle_after: AtomicUsize::new(0),
            frames: AtomicUsize::new(0),
            next_hash: AtomicU64::new(1),
        })
    }

    /// A testnet ledger hosting the profit token at its registered id.
    pub fn testnet() -> Result<Self> {
        let ledger = Self::new(TESTNET_PASSPHRASE)?;
        for entry in profit_token::NETWORKS.entries() {
            ledger.register(entry.contract_id);
        }
        Ok(ledger)
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Hosts an empty profit-token instance under `contract_id`.
    pub fn register(&self, contract_id: &str) {
        self.contracts.entry(contract_id.to_string()).or_default();
    }

    pub fn is_registered(&self, contract_id: &str) -> bool {
        self.contracts.contains_key(contract_id)
    }

    /// Makes `wasm_hash` deployable.
    pub fn install(&self, wasm_hash: [u8; 32]) {
        self.installed.insert(wasm_hash.to_vec());
    }

    /// Submissions answer `Pending` and settle on the `polls`-th poll; zero settles at once.
    pub fn settle_after(&self, polls: usize) {
        self.settle_after.store(polls, Ordering::SeqCst);
    }

    /// Number of frames received through any entry point.
    pub fn frames_received(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn balance_of(&self, contract_id: &str, who: &Address) -> i128 {
        self.contracts
            .get(contract_id)
            .and_then(|s| s.balances.get(who).copied())
            .unwrap_or(0)
    }

    pub fn total_supply_of(&self, contract_id: &str) -> i128 {
        self.contracts.get(contract_id).map(|s| s.total_supply).unwrap_or(0)
    }

    /// Runs one invocation and encodes its Reply.
    fn run(&self, invoke: &InvokeDecoder<'_>, signers: Option<&[&str]>) -> transport::Result<Vec<u8>> {
        let outcome = self.execute(invoke, signers);
        debug!(method = invoke.method, commit = signers.is_some(), ok = outcome.is_ok(), "executed");
        let bytes = match &outcome {
            Ok(result) => ReplyOkEncoder::new(invoke.seq, result).to_bytes(),
            Err(reason) => ReplyErrEncoder::new(invoke.seq, reason).to_bytes(),
        };
        bytes.map_err(io)
    }

    fn execute(
        &self,
        invoke: &InvokeDecoder<'_>,
        signers: Option<&[&str]>,
    ) -> std::result::Result<Vec<u8>, FailureReason> {
        if invoke.network != self.passphrase {
            return Err(FailureReason::ProtocolViolation("network passphrase mismatch".into()));
        }
        let mut state = self.contracts.get_mut(invoke.contract).ok_or(FailureReason::ContractNotFound)?;
        let sig = self.schema.method(invoke.method).ok_or(FailureReason::MethodNotFound)?;
        let args = ledgerrpc::decode_args(invoke.args.clone(), sig.param_types())
            .map_err(|_| FailureReason::BadArguments)?;

        let mut scratch = state.clone();
        let value = run_token(&mut scratch, invoke.method, &args, signers)?;
        let result = ledgerrpc::encode(&value, &sig.returns)
            .map_err(|e| FailureReason::Trapped { message: e.to_string() })?;
        if signers.is_some() {
            *state = scratch;
        }
        Ok(result)
    }

    fn contract_id_for(salt: &[u8], source: Option<&str>) -> String {
        let mut seed = salt.to_vec();
        seed.extend(source.unwrap_or_default().bytes());
        if seed.is_empty() {
            seed.push(0);
        }
        let mut acc: u32 = 0x9e37_79b9;
        let mut id = String::with_capacity(56);
        id.push('C');
        for i in 0..55 {
            acc = acc.wrapping_mul(31).wrapping_add(u32::from(seed[i % seed.len()]) + i as u32);
            id.push(char::from(ADDRESS_ALPHABET[(acc >> 7) as usize % 32]));
        }
        id
    }

    fn deployed(&self, deploy: &Deploy<'_>) -> std::result::Result<String, FailureReason> {
        if deploy.network != self.passphrase {
            return Err(FailureReason::ProtocolViolation("network passphrase mismatch".into()));
        }
        if !self.installed.contains(deploy.wasm_hash) {
            return Err(FailureReason::Trapped { message: "wasm hash is not installed".into() });
        }
        let id = Self::contract_id_for(deploy.salt, deploy.source);
        if self.contracts.contains_key(&id) {
            return Err(FailureReason::Trapped { message: "contract already exists".into() });
        }
        self.register(&id);
        Ok(id)
    }
}

fn io(e: impl std::fmt::Display) -> TransportError {
    TransportError::Io(e.to_string())
}

fn decode_frame(bytes: &[u8]) -> transport::Result<RpcFrame<'_>> {
    RpcFrame::from_bytes(bytes).map_err(io)
}

#[async_trait::async_trait]
impl Transport for MockLedger {
    async fn invoke(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let RpcFrame::Invoke(invoke) = decode_frame(frame)? else {
            return Err(io("invoke expects an Invoke frame"));
        };
        self.run(&invoke, None)
    }

    async fn submit(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let RpcFrame::Submit(submit) = decode_frame(frame)? else {
            return Err(io("submit expects a Submit frame"));
        };
        let RpcFrame::Invoke(invoke) = decode_frame(submit.payload)? else {
            return Err(io("submitted payload is not an Invoke frame"));
        };
        let signers: Vec<&str> = submit
            .signatures
            .iter()
            .filter(|(_, sig)| !sig.is_empty())
            .map(|(signer, _)| *signer)
            .collect();
        let answer = self.run(&invoke, Some(signers.as_slice()))?;

        let polls = self.settle_after.load(Ordering::SeqCst);
        if polls == 0 {
            return Ok(answer);
        }
        let hash = format!("{:064x}", self.next_hash.fetch_add(1, Ordering::SeqCst));
        let ack = Pending::new(invoke.seq, &hash).to_bytes().map_err(io)?;
        self.pending.insert(hash, Settlement { seq: invoke.seq, answer, polls_left: polls });
        Ok(ack)
    }

    async fn poll(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let RpcFrame::Poll(poll) = decode_frame(frame)? else {
            return Err(io("poll expects a Poll frame"));
        };
        let hash = poll.hash.to_string();
        let seq = {
            let mut settlement = self
                .pending
                .get_mut(&hash)
                .ok_or_else(|| io(format!("unknown submission {}", hash)))?;
            settlement.polls_left = settlement.polls_left.saturating_sub(1);
            if settlement.polls_left > 0 {
                Some(settlement.seq)
            } else {
                None
            }
        };
        match seq {
            Some(seq) => Pending::new(seq, &hash).to_bytes().map_err(io),
            None => {
                let (_, settlement) = self.pending.remove(&hash).ok_or_else(|| io("submission vanished"))?;
                Ok(settlement.answer)
            }
        }
    }

    async fn deploy(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let RpcFrame::Deploy(deploy) = decode_frame(frame)? else {
            return Err(io("deploy expects a Deploy frame"));
        };
        let outcome = self.deployed(&deploy);
        debug!(ok = outcome.is_ok(), "deploy");
        let status = outcome.as_ref().map(String::as_str).map_err(Clone::clone);
        Deployed { seq: deploy.seq, status }.to_bytes().map_err(io)
    }
}

fn trap(message: &str) -> FailureReason {
    FailureReason::Trapped { message: message.to_string() }
}

fn ensure(cond: bool, message: &str) -> std::result::Result<(), FailureReason> {
    if cond { Ok(()) } else { Err(trap(message)) }
}

/// The profit-token program.
///
/// `signers` is `None` for simulated calls, which skip authorization.
fn run_token(
    state: &mut TokenState,
    method: &str,
    args: &[Value],
    signers: Option<&[&str]>,
) -> std::result::Result<Value, FailureReason> {
    let address = |i: usize| -> std::result::Result<Address, FailureReason> {
        args.get(i).and_then(Value::as_address).cloned().ok_or(FailureReason::BadArguments)
    };
    let amount = |i: usize| -> std::result::Result<i128, FailureReason> {
        args.get(i).and_then(Value::as_i128).ok_or(FailureReason::BadArguments)
    };
    let authorize = |who: &Address| -> std::result::Result<(), FailureReason> {
        match signers {
            Some(list) if !list.contains(&who.as_str()) => Err(FailureReason::Unauthorized),
            _ => Ok(()),
        }
    };
    let add = |a: i128, b: i128| a.checked_add(b).ok_or_else(|| trap("arithmetic overflow"));

    match method {
        "initialize_ptc" => {
            *state = TokenState { admin: Some(address(0)?), ..TokenState::default() };
            Ok(Value::Void)
        }
        "get_admin" => state.admin.clone().map(Value::Address).ok_or_else(|| trap("not initialized")),
        "mint" => {
            let admin = state.admin.clone().ok_or_else(|| trap("not initialized"))?;
            authorize(&admin)?;
            let (to, amount) = (address(0)?, amount(1)?);
            ensure(amount > 0, "Amount must be positive")?;
            state.total_supply = add(state.total_supply, amount)?;
            let balance = state.balances.entry(to).or_insert(0);
            *balance = add(*balance, amount)?;
            Ok(Value::Void)
        }
        "burn" => {
            let (from, amount) = (address(0)?, amount(1)?);
            authorize(&from)?;
            ensure(amount > 0, "Amount must be positive")?;
            let balance = state.balances.entry(from).or_insert(0);
            ensure(*balance >= amount, "Insufficient balance")?;
            *balance -= amount;
            state.total_supply -= amount;
            Ok(Value::Void)
        }
        "transfer" => {
            let (from, to, amount) = (address(0)?, address(1)?, amount(2)?);
            authorize(&from)?;
            ensure(amount > 0, "Amount must be positive")?;
            move_balance(state, from, to, amount)?;
            Ok(Value::Void)
        }
        "approve" => {
            let (owner, spender, amount) = (address(0)?, address(1)?, amount(2)?);
            authorize(&owner)?;
            ensure(amount >= 0, "Amount must be non-negative")?;
            state.allowances.insert((owner, spender), amount);
            Ok(Value::Void)
        }
        "allowance" => {
            let key = (address(0)?, address(1)?);
            Ok(Value::Int(state.allowances.get(&key).copied().unwrap_or(0)))
        }
        "transfer_from" => {
            let (spender, from, to, amount) = (address(0)?, address(1)?, address(2)?, amount(3)?);
            authorize(&spender)?;
            ensure(amount > 0, "Amount must be positive")?;
            let allowance = state.allowances.entry((from.clone(), spender)).or_insert(0);
            ensure(*allowance >= amount, "Insufficient allowance")?;
            *allowance -= amount;
            move_balance(state, from, to, amount)?;
            Ok(Value::Void)
        }
        "balance" => Ok(Value::Int(state.balances.get(&address(0)?).copied().unwrap_or(0))),
        "total_supply" => Ok(Value::Int(state.total_supply)),
        _ => Err(FailureReason::MethodNotFound),
    }
}

fn move_balance(state: &mut TokenState, from: Address, to: Address, amount: i128) -> std::result::Result<(), FailureReason> {
    let from_balance = state.balances.get(&from).copied().unwrap_or(0);
    ensure(from_balance >= amount, "Insufficient balance")?;
    state.balances.insert(from, from_balance - amount);
    let to_balance = state.balances.entry(to).or_insert(0);
    *to_balance = to_balance.checked_add(amount).ok_or_else(|| trap("arithmetic overflow"))?;
    Ok(())
}

/// A request-response transport driven by a closure, for scripting odd answers.
///
/// Every entry point hands the frame to the same handler.
pub struct CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<Vec<u8>> + Send + Sync,
{
    handler: F,
    calls: AtomicUsize,
}

impl<F> CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<Vec<u8>> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn handle(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(frame)
    }
}

#[async_trait::async_trait]
impl<F> Transport for CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<Vec<u8>> + Send + Sync + 'static,
{
    async fn invoke(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.handle(frame)
    }

    async fn submit(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.handle(frame)
    }

    async fn poll(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.handle(frame)
    }

    async fn deploy(&self, frame: &[u8]) -> transport::Result<Vec<u8>> {
        self.handle(frame)
    }
}
