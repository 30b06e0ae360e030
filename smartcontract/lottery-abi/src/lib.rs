// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Shared ABI definitions for the Lottery contract */

mod units;

use std::fmt;

use alloy_primitives::{hex, keccak256, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alloy_primitives::{Address, U256};
pub use units::{format_units, Wei, ETHER_DECIMALS};

/// Gas budget attached to `enterLottery` when nothing else is configured.
pub const DEFAULT_ENTRY_GAS_LIMIT: u64 = 2_500_000;

/// Errors raised while encoding or decoding values at the contract boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid hex quantity `{0}`")]
    InvalidQuantity(String),

    /// The call returned something other than a single 32-byte word.
    #[error("return data is not a 32-byte word: `{0}`")]
    InvalidWord(String),

    #[error("value {0} does not fit in the target integer type")]
    Overflow(U256),
}

// ========================================
// Lottery state
// ========================================

/// Whether the lottery accepts entries.
///
/// The contract exposes an integer code. Zero means open; every other code
/// (calculating, paused, ...) is folded into `Closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, async_graphql::Enum)]
pub enum LotteryState {
    Open,   // Accepting entries
    Closed, // Any non-zero code
}

impl LotteryState {
    pub fn from_code(code: U256) -> Self {
        if code.is_zero() {
            LotteryState::Open
        } else {
            LotteryState::Closed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LotteryState::Open => "OPEN",
            LotteryState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ========================================
// Contract methods
// ========================================

/// The contract methods the dapp calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LotteryMethod {
    EntranceFee,
    NumberOfPlayers,
    LotteryState,
    EnterLottery,
}

/// Solidity signatures of the deployed contract's methods.
///
/// Defaults match the deployed lottery, spelling included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractMethods {
    pub entrance_fee: String,
    pub number_of_players: String,
    pub lottery_state: String,
    pub enter_lottery: String,
}

impl Default for ContractMethods {
    fn default() -> Self {
        ContractMethods {
            entrance_fee: "getEnterenceFee()".to_string(),
            number_of_players: "getNuberOfPlayers()".to_string(),
            lottery_state: "getLotteryState()".to_string(),
            enter_lottery: "enterLottery()".to_string(),
        }
    }
}

impl ContractMethods {
    pub fn signature(&self, method: LotteryMethod) -> &str {
        match method {
            LotteryMethod::EntranceFee => &self.entrance_fee,
            LotteryMethod::NumberOfPlayers => &self.number_of_players,
            LotteryMethod::LotteryState => &self.lottery_state,
            LotteryMethod::EnterLottery => &self.enter_lottery,
        }
    }

    /// Hex call data for a method. None of the lottery methods take
    /// arguments, so this is the bare selector.
    pub fn call_data(&self, method: LotteryMethod) -> String {
        hex::encode_prefixed(selector(self.signature(method)))
    }
}

/// First four bytes of the keccak256 hash of a function signature.
pub fn selector(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature)[..4])
}

/// Decodes the single `uint256` word returned by a read call.
pub fn decode_word(data: &str) -> Result<U256, AbiError> {
    let bytes = hex::decode(data).map_err(|_| AbiError::InvalidWord(data.to_string()))?;
    if bytes.len() != 32 {
        return Err(AbiError::InvalidWord(data.to_string()));
    }
    Ok(U256::from_be_slice(&bytes))
}

/// Hex quantity encoding used by JSON-RPC (`0x0`, `0x2625a0`).
pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

// ========================================
// Transactions
// ========================================

/// A value-bearing `enterLottery` call from one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTransaction {
    pub from: Address,
    pub value: Wei,
    pub gas_limit: u64,
}

impl EntryTransaction {
    pub fn to_request(&self, contract: Address, methods: &ContractMethods) -> TransactionRequest {
        TransactionRequest {
            from: self.from,
            to: contract,
            value: self.value,
            gas: quantity(self.gas_limit),
            data: methods.call_data(LotteryMethod::EnterLottery),
        }
    }
}

/// Parameter object of `eth_sendTransaction`. Gas price is left to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: Wei,
    pub gas: String,
    pub data: String,
}

/// Parameter object of `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub to: Address,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    /// `0x1` on success, `0x0` when reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0") | Some("0x00"))
    }
}
