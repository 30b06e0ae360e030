// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signing agent and contract client over an injected EIP-1193 provider
//! (`window.ethereum`).

use futures::channel::mpsc;
use lottery_abi::{
    decode_word, Address, CallRequest, ContractMethods, EntryTransaction, LotteryMethod, TransactionReceipt, Wei, U256,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    error::ProviderError,
    provider::{AccountSubscription, ListenerId, LotteryContract, SigningAgent},
    DappParameters, ReceiptPolling,
};

pub const ACCOUNTS_CHANGED: &str = "accountsChanged";

pub type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

/// The raw provider object: JSON-RPC requests plus event listeners.
#[allow(async_fn_in_trait)]
pub trait Transport: Clone {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId;

    /// Drops the handler registered under `id`.
    fn remove_listener(&self, id: ListenerId);
}

#[derive(Debug, Clone)]
pub struct Eip1193Agent<T> {
    transport: T,
}

impl<T: Transport> Eip1193Agent<T> {
    pub fn new(transport: T) -> Self {
        Eip1193Agent { transport }
    }
}

impl<T: Transport> SigningAgent for Eip1193Agent<T> {
    type Contract = JsonRpcLottery<T>;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.transport.request("eth_requestAccounts", json!([])).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn subscribe_accounts(&self) -> AccountSubscription {
        let (sender, receiver) = mpsc::unbounded();
        let id = self.transport.on(
            ACCOUNTS_CHANGED,
            Box::new(move |payload: Value| match serde_json::from_value::<Vec<Address>>(payload) {
                Ok(accounts) => {
                    // The receiver is gone once the session is dropped
                    let _ = sender.unbounded_send(accounts);
                }
                Err(error) => warn!(%error, "ignoring malformed accountsChanged payload"),
            }),
        );
        AccountSubscription::new(id, receiver)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.transport.remove_listener(id);
    }

    fn bind_contract(&self, parameters: &DappParameters) -> JsonRpcLottery<T> {
        JsonRpcLottery {
            transport: self.transport.clone(),
            address: parameters.contract_address,
            methods: parameters.methods.clone(),
            polling: parameters.receipts.clone(),
        }
    }
}

/// The lottery contract reached through `eth_call` and `eth_sendTransaction`.
#[derive(Debug, Clone)]
pub struct JsonRpcLottery<T> {
    transport: T,
    address: Address,
    methods: ContractMethods,
    polling: ReceiptPolling,
}

impl<T: Transport> JsonRpcLottery<T> {
    async fn call(&self, method: LotteryMethod) -> Result<U256, ProviderError> {
        let request = CallRequest {
            to: self.address,
            data: self.methods.call_data(method),
        };
        let value = self.transport.request("eth_call", json!([request, "latest"])).await?;
        let data = value
            .as_str()
            .ok_or_else(|| ProviderError::Malformed(format!("eth_call returned {value}")))?;
        Ok(decode_word(data)?)
    }

    async fn wait_for_receipt(&self, hash: &str) -> Result<TransactionReceipt, ProviderError> {
        let mut attempts = 0;
        loop {
            let value = self.transport.request("eth_getTransactionReceipt", json!([hash])).await?;
            if !value.is_null() {
                return Ok(serde_json::from_value(value)?);
            }
            attempts += 1;
            if self.polling.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(ProviderError::Unconfirmed {
                    hash: hash.to_string(),
                    attempts,
                });
            }
            tokio::time::sleep(self.polling.interval()).await;
        }
    }
}

impl<T: Transport> LotteryContract for JsonRpcLottery<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn entrance_fee(&self) -> Result<Wei, ProviderError> {
        self.call(LotteryMethod::EntranceFee).await.map(Wei::new)
    }

    async fn number_of_players(&self) -> Result<U256, ProviderError> {
        self.call(LotteryMethod::NumberOfPlayers).await
    }

    async fn lottery_state_code(&self) -> Result<U256, ProviderError> {
        self.call(LotteryMethod::LotteryState).await
    }

    async fn enter_lottery(&self, entry: &EntryTransaction) -> Result<TransactionReceipt, ProviderError> {
        let request = entry.to_request(self.address, &self.methods);
        let value = self.transport.request("eth_sendTransaction", json!([request])).await?;
        let hash = value
            .as_str()
            .ok_or_else(|| ProviderError::Malformed(format!("eth_sendTransaction returned {value}")))?;
        debug!(hash, "entry transaction sent, waiting for receipt");
        self.wait_for_receipt(hash).await
    }
}
