// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only queries against the lottery contract.

use lottery_abi::{AbiError, LotteryMethod, LotteryState, Wei};
use tracing::{debug, warn};

use crate::{error::DappError, provider::LotteryContract, state::LotterySnapshot};

/// Entry fee in wei.
pub async fn fetch_entry_fee<C: LotteryContract>(contract: &C) -> Result<Wei, DappError> {
    let fee = contract
        .entrance_fee()
        .await
        .map_err(DappError::query(LotteryMethod::EntranceFee))?;
    debug!(%fee, "fetched entrance fee");
    Ok(fee)
}

pub async fn fetch_player_count<C: LotteryContract>(contract: &C) -> Result<u64, DappError> {
    let count = contract
        .number_of_players()
        .await
        .map_err(DappError::query(LotteryMethod::NumberOfPlayers))?;
    let count = u64::try_from(count)
        .map_err(|_| DappError::query(LotteryMethod::NumberOfPlayers)(AbiError::Overflow(count).into()))?;
    debug!(count, "fetched number of players");
    Ok(count)
}

pub async fn fetch_lottery_state<C: LotteryContract>(contract: &C) -> Result<LotteryState, DappError> {
    let code = contract
        .lottery_state_code()
        .await
        .map_err(DappError::query(LotteryMethod::LotteryState))?;
    let state = LotteryState::from_code(code);
    debug!(%code, %state, "fetched lottery state");
    Ok(state)
}

/// Runs the three reads in order. The caller commits the result only if all
/// of them succeeded.
pub async fn fetch_snapshot<C: LotteryContract>(contract: &C) -> Result<LotterySnapshot, DappError> {
    let result: Result<LotterySnapshot, DappError> = async {
        Ok(LotterySnapshot {
            entry_fee: Some(fetch_entry_fee(contract).await?),
            player_count: Some(fetch_player_count(contract).await?),
            lottery_state: Some(fetch_lottery_state(contract).await?),
        })
    }
    .await;

    if let Err(error) = &result {
        warn!(%error, contract = %contract.address(), "refresh failed, keeping previous snapshot");
    }
    result
}
