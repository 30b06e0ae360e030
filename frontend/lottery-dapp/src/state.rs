// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use lottery_abi::{Address, LotteryState, Wei};

use crate::error::DappError;

/// User-visible operations guarded against overlapping runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Refresh,
    EnterLottery,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Connect => "Wallet connection",
            Operation::Refresh => "Refresh",
            Operation::EnterLottery => "Lottery entry",
        })
    }
}

/// The connected account and the contract it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// `None` after the wallet reports an empty account list.
    pub account: Option<Address>,
    pub contract: Address,
}

/// Contract values as of the last successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotterySnapshot {
    pub entry_fee: Option<Wei>,
    pub player_count: Option<u64>,
    pub lottery_state: Option<LotteryState>,
}

/// Banner shown after a user action. Error and success never coexist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationResult {
    #[default]
    Empty,
    Error(String),
    Success(String),
}

impl OperationResult {
    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&str> {
        match self {
            OperationResult::Success(message) => Some(message),
            _ => None,
        }
    }
}

/// Everything the presentation layer renders.
///
/// Transitions consume the state and return the next one, so each can be
/// checked on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub session: Option<SessionState>,
    pub snapshot: LotterySnapshot,
    pub result: OperationResult,
    pub pending: Option<Operation>,
    /// Set once an entry transaction has reached the chain. The snapshot is
    /// not trusted again until a full refresh commits.
    pub stale: bool,
}

impl AppState {
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.as_ref().and_then(|session| session.account)
    }

    /// Starts a user action: rejects it if another one is running, otherwise
    /// clears the previous banner.
    pub fn begin(self, operation: Operation) -> Result<AppState, DappError> {
        if let Some(running) = self.pending {
            return Err(DappError::OperationInProgress(running));
        }
        Ok(AppState {
            result: OperationResult::Empty,
            pending: Some(operation),
            ..self
        })
    }

    pub fn finish(self) -> AppState {
        AppState { pending: None, ..self }
    }

    pub fn connected(self, account: Address, contract: Address) -> AppState {
        AppState {
            session: Some(SessionState {
                account: Some(account),
                contract,
            }),
            ..self
        }
    }

    pub fn disconnected(self) -> AppState {
        AppState {
            session: None,
            snapshot: LotterySnapshot::default(),
            stale: false,
            ..self
        }
    }

    /// Replaces the active account with the first reported one. The snapshot
    /// is left alone.
    pub fn account_changed(self, accounts: &[Address]) -> AppState {
        match self.session {
            Some(session) => AppState {
                session: Some(SessionState {
                    account: accounts.first().copied(),
                    ..session
                }),
                ..self
            },
            None => self,
        }
    }

    pub fn fee_fetched(self, fee: Wei) -> AppState {
        AppState {
            snapshot: LotterySnapshot {
                entry_fee: Some(fee),
                ..self.snapshot
            },
            ..self
        }
    }

    pub fn player_count_fetched(self, count: u64) -> AppState {
        AppState {
            snapshot: LotterySnapshot {
                player_count: Some(count),
                ..self.snapshot
            },
            ..self
        }
    }

    pub fn lottery_state_fetched(self, state: LotteryState) -> AppState {
        AppState {
            snapshot: LotterySnapshot {
                lottery_state: Some(state),
                ..self.snapshot
            },
            ..self
        }
    }

    /// Commits a snapshot produced by a full refresh.
    pub fn refreshed(self, snapshot: LotterySnapshot) -> AppState {
        AppState {
            snapshot,
            stale: false,
            ..self
        }
    }

    /// Marks the snapshot as outdated by a transaction.
    pub fn invalidated(self) -> AppState {
        AppState { stale: true, ..self }
    }

    /// An entry was mined: shows `message` and invalidates the snapshot.
    pub fn entered(self, message: impl Into<String>) -> AppState {
        self.succeeded(message).invalidated()
    }

    pub fn failed(self, error: &DappError) -> AppState {
        AppState {
            result: OperationResult::Error(error.to_string()),
            ..self
        }
    }

    pub fn succeeded(self, message: impl Into<String>) -> AppState {
        AppState {
            result: OperationResult::Success(message.into()),
            ..self
        }
    }
}
