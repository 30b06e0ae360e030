// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_graphql::{Object, SimpleObject};
use lottery_abi::{format_units, LotteryState};

use crate::state::{AppState, Operation};

/// What the page shows, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct LotteryView {
    pub connected: bool,
    pub account: Option<String>,
    /// Entry fee in ether.
    pub entrance_fee: Option<String>,
    pub number_of_players: Option<u64>,
    pub lottery_state: Option<LotteryState>,
    /// The values above are withheld until a refresh follows the last entry.
    pub stale: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub busy: bool,
    pub can_connect: bool,
    pub can_enter: bool,
}

impl LotteryView {
    pub fn render(state: &AppState, decimals: u32) -> Self {
        let busy = state.pending.is_some();
        // Between sending an entry and the refresh that follows it, the old
        // values are no longer valid.
        let stale = state.stale || state.pending == Some(Operation::EnterLottery);
        let snapshot = (!stale).then_some(&state.snapshot);

        LotteryView {
            connected: state.is_connected(),
            account: state.account().map(|account| account.to_string()),
            entrance_fee: snapshot
                .and_then(|snapshot| snapshot.entry_fee.as_ref())
                .map(|fee| format_units(fee.as_u256(), decimals)),
            number_of_players: snapshot.and_then(|snapshot| snapshot.player_count),
            lottery_state: snapshot.and_then(|snapshot| snapshot.lottery_state),
            stale,
            error: state.result.error().map(str::to_string),
            success: state.result.success().map(str::to_string),
            busy,
            can_connect: !busy,
            can_enter: !busy && state.account().is_some(),
        }
    }
}

pub struct QueryRoot {
    view: LotteryView,
}

impl QueryRoot {
    pub fn new(view: LotteryView) -> Self {
        QueryRoot { view }
    }
}

#[Object]
impl QueryRoot {
    /// Everything shown on the lottery page
    async fn lottery(&self) -> LotteryView {
        self.view.clone()
    }

    async fn lottery_state(&self) -> Option<LotteryState> {
        self.view.lottery_state
    }

    async fn can_enter(&self) -> bool {
        self.view.can_enter
    }
}
