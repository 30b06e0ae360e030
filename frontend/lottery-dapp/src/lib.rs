// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Lottery dapp client: wallet session, contract reads and lottery entry */

pub mod app;
pub mod contract;
pub mod eip1193;
pub mod error;
pub mod provider;
pub mod service;
pub mod state;
pub mod view;
pub mod wallet;

use std::time::Duration;

use lottery_abi::{Address, ContractMethods, DEFAULT_ENTRY_GAS_LIMIT, ETHER_DECIMALS};
use serde::{Deserialize, Serialize};

pub use app::LotteryDapp;
pub use error::{DappError, ProviderError};
pub use provider::{LotteryContract, ProviderAvailability, ProviderDiscovery, SigningAgent};
pub use state::{AppState, LotterySnapshot, Operation, OperationResult};
pub use view::LotteryView;

/// Dapp configuration, usually loaded from JSON.
///
/// ```json
/// { "contract_address": "0x5b38da6a701c568545dcfcb03fcb875f56beddc4", "gas_limit": 2500000 }
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DappParameters {
    pub contract_address: Address,
    #[serde(default)]
    pub methods: ContractMethods,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Decimal places used when showing the entry fee.
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,
    #[serde(default)]
    pub receipts: ReceiptPolling,
}

impl DappParameters {
    pub fn new(contract_address: Address) -> Self {
        DappParameters {
            contract_address,
            methods: ContractMethods::default(),
            gas_limit: default_gas_limit(),
            display_decimals: default_display_decimals(),
            receipts: ReceiptPolling::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DappError> {
        serde_json::from_str(json).map_err(|error| DappError::Config(error.to_string()))
    }
}

/// How the client waits for a sent transaction to be mined.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReceiptPolling {
    pub interval_ms: u64,
    /// Unbounded when absent.
    pub max_attempts: Option<u32>,
}

impl ReceiptPolling {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        ReceiptPolling {
            interval_ms: 1_000,
            max_attempts: None,
        }
    }
}

fn default_gas_limit() -> u64 {
    DEFAULT_ENTRY_GAS_LIMIT
}

fn default_display_decimals() -> u32 {
    ETHER_DECIMALS
}
