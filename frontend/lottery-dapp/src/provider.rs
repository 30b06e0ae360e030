// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The boundary between the dapp and the injected signing agent.

use futures::{channel::mpsc::UnboundedReceiver, FutureExt, StreamExt};
use lottery_abi::{Address, EntryTransaction, TransactionReceipt, Wei, U256};

use crate::{error::ProviderError, DappParameters};

pub type ListenerId = u64;

/// Whether a signing agent was injected into the page.
///
/// Resolved once per connect attempt.
#[derive(Debug, Clone)]
pub enum ProviderAvailability<A> {
    Available(A),
    Unavailable,
}

impl<A> From<Option<A>> for ProviderAvailability<A> {
    fn from(agent: Option<A>) -> Self {
        match agent {
            Some(agent) => ProviderAvailability::Available(agent),
            None => ProviderAvailability::Unavailable,
        }
    }
}

/// Looks up the injected signing agent.
pub trait ProviderDiscovery {
    type Agent: SigningAgent;

    fn detect(&self) -> ProviderAvailability<Self::Agent>;
}

impl<F, A> ProviderDiscovery for F
where
    F: Fn() -> ProviderAvailability<A>,
    A: SigningAgent,
{
    type Agent = A;

    fn detect(&self) -> ProviderAvailability<A> {
        self()
    }
}

/// A user-controlled wallet holding keys and authorizing requests.
#[allow(async_fn_in_trait)]
pub trait SigningAgent {
    type Contract: LotteryContract;

    /// Asks the user to authorize accounts (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Registers an `accountsChanged` listener.
    fn subscribe_accounts(&self) -> AccountSubscription;

    /// Removes a listener registered by `subscribe_accounts`. Removing an
    /// unknown listener does nothing.
    fn unsubscribe(&self, id: ListenerId);

    /// Binds the lottery contract through this agent's RPC connection.
    fn bind_contract(&self, parameters: &DappParameters) -> Self::Contract;
}

/// Remote calls into the deployed lottery.
#[allow(async_fn_in_trait)]
pub trait LotteryContract {
    fn address(&self) -> Address;

    async fn entrance_fee(&self) -> Result<Wei, ProviderError>;

    async fn number_of_players(&self) -> Result<U256, ProviderError>;

    async fn lottery_state_code(&self) -> Result<U256, ProviderError>;

    /// Sends the entry transaction and waits until it is mined.
    async fn enter_lottery(&self, entry: &EntryTransaction) -> Result<TransactionReceipt, ProviderError>;
}

/// Account-change notifications for one registered listener.
#[derive(Debug)]
pub struct AccountSubscription {
    id: ListenerId,
    receiver: UnboundedReceiver<Vec<Address>>,
}

impl AccountSubscription {
    pub fn new(id: ListenerId, receiver: UnboundedReceiver<Vec<Address>>) -> Self {
        AccountSubscription { id, receiver }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns a notification that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<Vec<Address>> {
        self.receiver.next().now_or_never().flatten()
    }

    /// Waits for the next notification. `None` once the listener is removed.
    pub async fn next(&mut self) -> Option<Vec<Address>> {
        self.receiver.next().await
    }
}
