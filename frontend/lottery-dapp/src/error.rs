// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use lottery_abi::{AbiError, LotteryMethod};
use thiserror::Error;

use crate::state::Operation;

/// Failures reported by the signing agent or the contract RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// An error object returned by the provider, e.g. code 4001 when the user
    /// rejects a request.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("transaction {hash} was not confirmed after {attempts} receipt checks")]
    Unconfirmed { hash: String, attempts: u32 },
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;

    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ProviderError::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ProviderError::Rpc { code, .. } if *code == Self::USER_REJECTED)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Malformed(error.to_string())
    }
}

/// Errors surfaced to the user. Each displays as the message shown in the
/// error banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DappError {
    #[error("No wallet found. Please install MetaMask or another browser wallet.")]
    NoProvider,

    /// The account authorization request failed or was rejected.
    #[error("{0}")]
    Connection(ProviderError),

    #[error("The wallet did not authorize any account.")]
    NoAccounts,

    /// A read call failed. The previous snapshot is kept.
    #[error("{source}")]
    Query {
        method: LotteryMethod,
        source: ProviderError,
    },

    #[error("{0}")]
    Transaction(ProviderError),

    #[error("Transaction {hash} was reverted.")]
    Reverted { hash: String },

    #[error("Connect a wallet first.")]
    NotConnected,

    #[error("The wallet has no active account.")]
    NoActiveAccount,

    #[error("{0} is already in progress.")]
    OperationInProgress(Operation),

    #[error("invalid parameters: {0}")]
    Config(String),
}

impl DappError {
    pub fn query(method: LotteryMethod) -> impl FnOnce(ProviderError) -> DappError {
        move |source| DappError::Query { method, source }
    }
}
