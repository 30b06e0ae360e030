// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use lottery_abi::{Address, EntryTransaction, TransactionReceipt, Wei};
use tracing::{error, info};

use crate::{error::DappError, provider::LotteryContract};

pub const ENTERED_MESSAGE: &str = "You have entered the lottery!";

/// Sends `enterLottery` from `from` carrying `fee`, and waits for the receipt.
///
/// A mined but reverted transaction is an error.
pub async fn submit_entry<C: LotteryContract>(
    contract: &C,
    from: Address,
    fee: Wei,
    gas_limit: u64,
) -> Result<TransactionReceipt, DappError> {
    let entry = EntryTransaction {
        from,
        value: fee,
        gas_limit,
    };
    info!(%from, value = %entry.value, gas_limit, "submitting lottery entry");

    let receipt = contract.enter_lottery(&entry).await.map_err(|error| {
        error!(%error, %from, "lottery entry failed");
        DappError::Transaction(error)
    })?;

    if !receipt.succeeded() {
        error!(hash = %receipt.transaction_hash, "lottery entry reverted");
        return Err(DappError::Reverted {
            hash: receipt.transaction_hash,
        });
    }

    info!(hash = %receipt.transaction_hash, block = ?receipt.block_number, "lottery entry mined");
    Ok(receipt)
}
