// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::AbiError;

/// Decimal places between wei and ether.
pub const ETHER_DECIMALS: u32 = 18;

/// An amount in the chain's smallest denomination.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(U256);

impl Wei {
    pub const fn new(value: U256) -> Self {
        Wei(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Parses a JSON-RPC hex quantity such as `0x2386f26fc10000`.
    pub fn from_quantity(s: &str) -> Result<Self, AbiError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .filter(|digits| !digits.is_empty())
            .ok_or_else(|| AbiError::InvalidQuantity(s.to_string()))?;
        U256::from_str_radix(digits, 16)
            .map(Wei)
            .map_err(|_| AbiError::InvalidQuantity(s.to_string()))
    }

    pub fn to_quantity(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Wei(value)
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Wei(U256::from(value))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

impl fmt::Debug for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wei({})", self.0)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_quantity())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Wei::from_quantity(&s).map_err(de::Error::custom)
    }
}

/// Divides `value` by `10^decimals` exactly, trimming trailing zeros from the
/// fractional part.
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    match fraction.trim_end_matches('0') {
        "" => whole.to_string(),
        fraction => format!("{whole}.{fraction}"),
    }
}
