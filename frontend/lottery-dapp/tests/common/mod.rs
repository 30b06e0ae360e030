// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use futures::channel::mpsc::{self, UnboundedSender};
use lottery_abi::{Address, EntryTransaction, LotteryMethod, TransactionReceipt, Wei, U256};
use lottery_dapp::{
    eip1193::{EventHandler, Transport},
    provider::{AccountSubscription, ListenerId},
    DappParameters, LotteryContract, ProviderError, SigningAgent,
};
use serde_json::Value;
use tokio::sync::Notify;

pub const ONE_HUNDREDTH_ETHER: u128 = 10_000_000_000_000_000;

pub fn address(last: u8) -> Address {
    Address::with_last_byte(last)
}

pub fn contract_address() -> Address {
    address(0xcc)
}

pub fn parameters() -> DappParameters {
    DappParameters::new(contract_address())
}

// ========================================
// Contract mock
// ========================================

struct LotteryInner {
    fee: Wei,
    players: u64,
    state_code: u64,
    read_error: Option<ProviderError>,
    read_error_after_entry: Option<ProviderError>,
    read_gate: Option<Arc<Notify>>,
    entry_error: Option<ProviderError>,
    revert_entries: bool,
    entry_gate: Option<Arc<Notify>>,
    calls: Vec<LotteryMethod>,
    entries: Vec<EntryTransaction>,
}

/// In-memory lottery that records every call made to it.
#[derive(Clone)]
pub struct MockLottery {
    inner: Arc<Mutex<LotteryInner>>,
}

impl MockLottery {
    pub fn new(fee: u128, players: u64, state_code: u64) -> Self {
        MockLottery {
            inner: Arc::new(Mutex::new(LotteryInner {
                fee: Wei::from(fee),
                players,
                state_code,
                read_error: None,
                read_error_after_entry: None,
                read_gate: None,
                entry_error: None,
                revert_entries: false,
                entry_gate: None,
                calls: Vec::new(),
                entries: Vec::new(),
            })),
        }
    }

    pub fn set_fee(&self, fee: u128) {
        self.inner.lock().unwrap().fee = Wei::from(fee);
    }

    pub fn set_players(&self, players: u64) {
        self.inner.lock().unwrap().players = players;
    }

    pub fn set_state_code(&self, code: u64) {
        self.inner.lock().unwrap().state_code = code;
    }

    pub fn fail_reads(&self, error: Option<ProviderError>) {
        self.inner.lock().unwrap().read_error = error;
    }

    /// Breaks reads once the next entry has been mined.
    pub fn fail_reads_after_entry(&self, error: ProviderError) {
        self.inner.lock().unwrap().read_error_after_entry = Some(error);
    }

    /// Makes each read wait for a notification on the returned gate.
    pub fn gate_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().unwrap().read_gate = Some(gate.clone());
        gate
    }

    pub fn open_reads(&self) {
        self.inner.lock().unwrap().read_gate = None;
    }

    pub fn fail_entries(&self, error: Option<ProviderError>) {
        self.inner.lock().unwrap().entry_error = error;
    }

    pub fn revert_entries(&self) {
        self.inner.lock().unwrap().revert_entries = true;
    }

    /// Makes entries wait until the returned gate is notified.
    pub fn gate_entries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().unwrap().entry_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<LotteryMethod> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn entries(&self) -> Vec<EntryTransaction> {
        self.inner.lock().unwrap().entries.clone()
    }

    async fn read(&self, method: LotteryMethod) -> Result<U256, ProviderError> {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(method);
            inner.read_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let inner = self.inner.lock().unwrap();
        if let Some(error) = &inner.read_error {
            return Err(error.clone());
        }
        Ok(match method {
            LotteryMethod::EntranceFee => inner.fee.as_u256(),
            LotteryMethod::NumberOfPlayers => U256::from(inner.players),
            LotteryMethod::LotteryState => U256::from(inner.state_code),
            LotteryMethod::EnterLottery => unreachable!("not a read"),
        })
    }
}

impl LotteryContract for MockLottery {
    fn address(&self) -> Address {
        contract_address()
    }

    async fn entrance_fee(&self) -> Result<Wei, ProviderError> {
        self.read(LotteryMethod::EntranceFee).await.map(Wei::new)
    }

    async fn number_of_players(&self) -> Result<U256, ProviderError> {
        self.read(LotteryMethod::NumberOfPlayers).await
    }

    async fn lottery_state_code(&self) -> Result<U256, ProviderError> {
        self.read(LotteryMethod::LotteryState).await
    }

    async fn enter_lottery(&self, entry: &EntryTransaction) -> Result<TransactionReceipt, ProviderError> {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(LotteryMethod::EnterLottery);
            inner.entry_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = &inner.entry_error {
            return Err(error.clone());
        }
        inner.entries.push(entry.clone());
        let status = if inner.revert_entries {
            "0x0"
        } else {
            inner.players += 1;
            if let Some(error) = inner.read_error_after_entry.take() {
                inner.read_error = Some(error);
            }
            "0x1"
        };
        Ok(TransactionReceipt {
            transaction_hash: format!("0x{:064x}", inner.entries.len()),
            block_number: Some("0x10".to_string()),
            gas_used: Some("0x5208".to_string()),
            status: Some(status.to_string()),
        })
    }
}

// ========================================
// Wallet mock
// ========================================

struct WalletInner {
    accounts: Result<Vec<Address>, ProviderError>,
    listeners: HashMap<ListenerId, UnboundedSender<Vec<Address>>>,
    next_listener: ListenerId,
    request_accounts_calls: usize,
}

#[derive(Clone)]
pub struct MockWallet {
    inner: Arc<Mutex<WalletInner>>,
    lottery: MockLottery,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>, lottery: MockLottery) -> Self {
        MockWallet {
            inner: Arc::new(Mutex::new(WalletInner {
                accounts: Ok(accounts),
                listeners: HashMap::new(),
                next_listener: 0,
                request_accounts_calls: 0,
            })),
            lottery,
        }
    }

    pub fn set_accounts(&self, accounts: Result<Vec<Address>, ProviderError>) {
        self.inner.lock().unwrap().accounts = accounts;
    }

    /// Notifies every registered listener, like the wallet does when the
    /// user switches account.
    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        let inner = self.inner.lock().unwrap();
        for sender in inner.listeners.values() {
            sender.unbounded_send(accounts.clone()).unwrap();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    pub fn request_accounts_calls(&self) -> usize {
        self.inner.lock().unwrap().request_accounts_calls
    }
}

impl SigningAgent for MockWallet {
    type Contract = MockLottery;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.request_accounts_calls += 1;
        inner.accounts.clone()
    }

    fn subscribe_accounts(&self) -> AccountSubscription {
        let (sender, receiver) = mpsc::unbounded();
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.insert(id, sender);
        AccountSubscription::new(id, receiver)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner.lock().unwrap().listeners.remove(&id);
    }

    fn bind_contract(&self, _parameters: &DappParameters) -> MockLottery {
        self.lottery.clone()
    }
}

// ========================================
// Transport mock
// ========================================

struct TransportInner {
    responses: HashMap<String, VecDeque<Result<Value, ProviderError>>>,
    requests: Vec<(String, Value)>,
    handlers: HashMap<ListenerId, (String, EventHandler)>,
    next_listener: ListenerId,
}

/// Scripted EIP-1193 provider.
///
/// Responses are keyed by method name, or `eth_call:<data>` for calls. The
/// last queued response for a key is repeated.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<TransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(TransportInner {
                responses: HashMap::new(),
                requests: Vec::new(),
                handlers: HashMap::new(),
                next_listener: 0,
            })),
        }
    }

    /// Replaces whatever was scripted for `key`.
    pub fn respond(&self, key: impl Into<String>, response: Result<Value, ProviderError>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .insert(key.into(), VecDeque::from([response]));
    }

    /// Queues another response for `key` behind the existing ones.
    pub fn enqueue(&self, key: impl Into<String>, response: Result<Value, ProviderError>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry(key.into())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|(method, _)| method).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().handlers.len()
    }

    pub fn emit(&self, event: &str, payload: Value) {
        let inner = self.inner.lock().unwrap();
        for (name, handler) in inner.handlers.values() {
            if name == event {
                handler(payload.clone());
            }
        }
    }
}

impl Transport for MockTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        let key = match method {
            "eth_call" => format!("eth_call:{}", params[0]["data"].as_str().unwrap_or_default()),
            _ => method.to_string(),
        };
        inner.requests.push((method.to_string(), params));

        let queue = inner
            .responses
            .get_mut(&key)
            .ok_or_else(|| ProviderError::rpc(-32601, format!("no response scripted for {key}")))?;
        match queue.len() {
            0 => Err(ProviderError::rpc(-32601, format!("no response scripted for {key}"))),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap(),
        }
    }

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.handlers.insert(id, (event.to_string(), handler));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner.lock().unwrap().handlers.remove(&id);
    }
}
