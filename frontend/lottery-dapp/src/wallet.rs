// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};

use futures::lock::Mutex;
use lottery_abi::Address;
use tracing::{debug, info, warn};

use crate::{
    error::DappError,
    provider::{AccountSubscription, ListenerId, LotteryContract, ProviderAvailability, SigningAgent},
    DappParameters,
};

/// A connected signing agent, the contract bound through it and the
/// registered account-change listener.
///
/// The listener is removed on `close` or when the session is dropped.
pub struct Session<A: SigningAgent> {
    agent: A,
    contract: A::Contract,
    listener: ListenerId,
    subscription: Mutex<AccountSubscription>,
    closed: AtomicBool,
}

impl<A: SigningAgent> Session<A> {
    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn contract(&self) -> &A::Contract {
        &self.contract
    }

    /// Collects the account lists reported since the last call, oldest first.
    ///
    /// Returns nothing if another task is currently waiting on the listener.
    pub fn pending_account_changes(&self) -> Vec<Vec<Address>> {
        let mut changes = Vec::new();
        if let Some(mut subscription) = self.subscription.try_lock() {
            while let Some(accounts) = subscription.try_next() {
                changes.push(accounts);
            }
        }
        changes
    }

    /// Waits for the next account list. `None` once the session is closed.
    pub async fn next_account_change(&self) -> Option<Vec<Address>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.subscription.lock().await.next().await
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(listener = self.listener, "removing accountsChanged listener");
            self.agent.unsubscribe(self.listener);
        }
    }
}

impl<A: SigningAgent> Drop for Session<A> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connects to the signing agent and returns the session with the first
/// authorized account.
pub async fn connect<A: SigningAgent>(
    availability: ProviderAvailability<A>,
    parameters: &DappParameters,
) -> Result<(Session<A>, Address), DappError> {
    let agent = match availability {
        ProviderAvailability::Available(agent) => agent,
        ProviderAvailability::Unavailable => {
            warn!("no signing agent injected, install a browser wallet");
            return Err(DappError::NoProvider);
        }
    };

    let accounts = agent.request_accounts().await.map_err(|error| {
        warn!(%error, rejected = error.is_user_rejection(), "account authorization failed");
        DappError::Connection(error)
    })?;
    let account = *accounts.first().ok_or(DappError::NoAccounts)?;

    let subscription = agent.subscribe_accounts();
    let listener = subscription.id();
    let contract = agent.bind_contract(parameters);
    info!(%account, contract = %contract.address(), "wallet connected");

    let session = Session {
        agent,
        contract,
        listener,
        subscription: Mutex::new(subscription),
        closed: AtomicBool::new(false),
    };
    Ok((session, account))
}
