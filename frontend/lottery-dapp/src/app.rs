// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_graphql::{EmptyMutation, EmptySubscription, Request, Response, Schema};
use lottery_abi::{Address, LotteryState, TransactionReceipt, Wei};
use tracing::{debug, info, warn};

use crate::{
    contract::{self, ENTERED_MESSAGE},
    error::{DappError, ProviderError},
    provider::{LotteryContract, ProviderDiscovery},
    service,
    state::{AppState, Operation},
    view::{LotteryView, QueryRoot},
    wallet::{self, Session},
    DappParameters,
};

/// The dapp controller.
///
/// Every user action runs through here: the in-progress guard is taken, the
/// action runs, and any error is turned into the error banner. Errors are
/// also returned so callers can react, but none of them is fatal.
pub struct LotteryDapp<P: ProviderDiscovery> {
    discovery: P,
    parameters: DappParameters,
    state: Mutex<AppState>,
    session: Mutex<Option<Arc<Session<P::Agent>>>>,
}

impl<P: ProviderDiscovery> LotteryDapp<P> {
    pub fn new(discovery: P, parameters: DappParameters) -> Self {
        LotteryDapp {
            discovery,
            parameters,
            state: Mutex::new(AppState::default()),
            session: Mutex::new(None),
        }
    }

    pub fn parameters(&self) -> &DappParameters {
        &self.parameters
    }

    pub fn state(&self) -> AppState {
        self.lock_state().clone()
    }

    pub fn view(&self) -> LotteryView {
        LotteryView::render(&self.lock_state(), self.parameters.display_decimals)
    }

    pub async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(QueryRoot::new(self.view()), EmptyMutation, EmptySubscription).finish();
        schema.execute(request).await
    }

    /// Connects the wallet, then refreshes the snapshot.
    pub async fn connect(&self) -> Result<(), DappError> {
        self.begin(Operation::Connect)?;
        let outcome = self.connect_and_refresh().await;
        self.settle(Operation::Connect, outcome)
    }

    /// Removes the account listener and forgets the session.
    pub fn disconnect(&self) {
        if let Some(session) = self.lock_session().take() {
            session.close();
            info!("wallet disconnected");
        }
        self.update(AppState::disconnected);
    }

    /// Re-reads fee, player count and state. Does nothing before connecting.
    pub async fn refresh(&self) -> Result<(), DappError> {
        self.begin(Operation::Refresh)?;
        self.apply_account_changes();
        let outcome = self.refresh_snapshot().await;
        self.settle(Operation::Refresh, outcome)
    }

    /// Enters the lottery with the current entry fee, then refreshes.
    pub async fn enter_lottery(&self) -> Result<TransactionReceipt, DappError> {
        self.begin(Operation::EnterLottery)?;
        let outcome = self.submit_and_refresh().await;
        self.settle(Operation::EnterLottery, outcome)
    }

    /// Reads one field. Rejected while a user action is running, and a no-op
    /// before connecting.
    pub async fn fetch_entry_fee(&self) -> Result<Option<Wei>, DappError> {
        self.ensure_idle()?;
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        let fee = self.record(service::fetch_entry_fee(session.contract()).await)?;
        self.commit(&session, |state| state.fee_fetched(fee));
        Ok(Some(fee))
    }

    pub async fn fetch_player_count(&self) -> Result<Option<u64>, DappError> {
        self.ensure_idle()?;
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        let count = self.record(service::fetch_player_count(session.contract()).await)?;
        self.commit(&session, |state| state.player_count_fetched(count));
        Ok(Some(count))
    }

    pub async fn fetch_lottery_state(&self) -> Result<Option<LotteryState>, DappError> {
        self.ensure_idle()?;
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        let lottery_state = self.record(service::fetch_lottery_state(session.contract()).await)?;
        self.commit(&session, |state| state.lottery_state_fetched(lottery_state));
        Ok(Some(lottery_state))
    }

    /// Applies account changes the wallet has already reported. Returns
    /// whether anything was applied.
    pub fn apply_account_changes(&self) -> bool {
        let Some(session) = self.current_session() else {
            return false;
        };
        let changes = session.pending_account_changes();
        for accounts in &changes {
            self.apply_accounts(accounts);
        }
        !changes.is_empty()
    }

    /// Waits for the next account change and applies it. Returns `None` once
    /// there is no session or its listener was removed.
    pub async fn next_account_change(&self) -> Option<Option<Address>> {
        let session = self.current_session()?;
        let accounts = session.next_account_change().await?;
        self.apply_accounts(&accounts);
        Some(accounts.first().copied())
    }

    /// Applies account changes until the session goes away.
    pub async fn watch_accounts(&self) {
        while self.next_account_change().await.is_some() {}
        debug!("account watcher stopped");
    }

    async fn connect_and_refresh(&self) -> Result<(), DappError> {
        let (session, account) = wallet::connect(self.discovery.detect(), &self.parameters).await?;
        let contract = session.contract().address();

        let previous = self.lock_session().replace(Arc::new(session));
        if let Some(previous) = previous {
            previous.close();
        }
        self.update(|state| state.connected(account, contract));

        self.refresh_snapshot().await
    }

    async fn refresh_snapshot(&self) -> Result<(), DappError> {
        let Some(session) = self.current_session() else {
            debug!("refresh skipped, no session");
            return Ok(());
        };
        let snapshot = service::fetch_snapshot(session.contract()).await?;
        self.commit(&session, |state| state.refreshed(snapshot));
        Ok(())
    }

    async fn submit_and_refresh(&self) -> Result<TransactionReceipt, DappError> {
        self.apply_account_changes();
        let session = self.current_session().ok_or(DappError::NotConnected)?;
        let (account, fee) = {
            let state = self.lock_state();
            let fee = state.snapshot.entry_fee.filter(|_| !state.stale);
            (state.account(), fee)
        };
        let account = account.ok_or(DappError::NoActiveAccount)?;

        // Not written to the snapshot: a failed entry leaves it untouched.
        let fee = match fee {
            Some(fee) => fee,
            None => service::fetch_entry_fee(session.contract()).await?,
        };

        let receipt = contract::submit_entry(session.contract(), account, fee, self.parameters.gas_limit)
            .await
            .inspect_err(|error| {
                // The transaction may still be mined
                if matches!(error, DappError::Transaction(ProviderError::Unconfirmed { .. })) {
                    self.update(AppState::invalidated);
                }
            })?;
        self.update(|state| state.entered(ENTERED_MESSAGE));

        if let Err(error) = self.refresh_snapshot().await {
            self.update(|state| state.failed(&error));
        }
        Ok(receipt)
    }

    fn apply_accounts(&self, accounts: &[Address]) {
        info!(account = ?accounts.first(), "wallet accounts changed");
        self.update(|state| state.account_changed(accounts));
    }

    fn begin(&self, operation: Operation) -> Result<(), DappError> {
        let mut state = self.lock_state();
        let next = state.clone().begin(operation).inspect_err(|_| {
            debug!(%operation, "rejected, another operation is in progress");
        })?;
        *state = next;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), DappError> {
        match self.lock_state().pending {
            Some(running) => {
                debug!(%running, "read rejected, another operation is in progress");
                Err(DappError::OperationInProgress(running))
            }
            None => Ok(()),
        }
    }

    /// Applies `transition` only if `session` is still the active one, so
    /// values read before a disconnect or reconnect are dropped.
    fn commit(&self, session: &Arc<Session<P::Agent>>, transition: impl FnOnce(AppState) -> AppState) {
        let current = self
            .lock_session()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if current {
            self.update(transition);
        } else {
            debug!("session changed while reading, discarding result");
        }
    }

    fn settle<T>(&self, operation: Operation, outcome: Result<T, DappError>) -> Result<T, DappError> {
        let outcome = self.record(outcome);
        if outcome.is_ok() {
            debug!(%operation, "completed");
        }
        self.update(AppState::finish);
        outcome
    }

    fn record<T>(&self, outcome: Result<T, DappError>) -> Result<T, DappError> {
        if let Err(error) = &outcome {
            warn!(%error, "operation failed");
            self.update(|state| state.failed(error));
        }
        outcome
    }

    fn update(&self, transition: impl FnOnce(AppState) -> AppState) {
        let mut state = self.lock_state();
        *state = transition(std::mem::take(&mut *state));
    }

    fn current_session(&self) -> Option<Arc<Session<P::Agent>>> {
        self.lock_session().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Arc<Session<P::Agent>>>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
