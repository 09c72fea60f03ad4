// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Current token holdings of a wallet set.

use alloy::primitives::U256;
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::amount::{sum_raw, to_ui_amount};
use crate::providers::ChainReader;
use crate::types::WalletAddress;

/// Holdings of a wallet set at call time.
#[derive(Debug, Clone, Default)]
pub struct HoldingsSnapshot {
    /// Raw balance per wallet. Failed lookups are recorded as zero.
    pub per_wallet: HashMap<WalletAddress, U256>,
    pub total_raw: U256,
    /// `total_raw / 10^decimals`.
    pub total: f64,
    pub failed_lookups: usize,
}

pub struct HoldingsAggregator {
    chain: Arc<dyn ChainReader>,
    concurrency: usize,
}

impl HoldingsAggregator {
    pub fn new(chain: Arc<dyn ChainReader>, concurrency: usize) -> Self {
        Self {
            chain,
            concurrency: concurrency.max(1),
        }
    }

    /// Read every wallet's balance of `token` concurrently.
    ///
    /// A wallet may split its balance over several token accounts; they are
    /// summed in raw units. A failed lookup counts as zero and never aborts the
    /// batch.
    pub async fn current_holdings<'a, I>(
        &self,
        wallets: I,
        token: &str,
        token_decimals: u8,
    ) -> HoldingsSnapshot
    where
        I: IntoIterator<Item = &'a WalletAddress>,
    {
        let unique: BTreeSet<&WalletAddress> = wallets.into_iter().collect();
        let chain = &self.chain;

        let lookups: Vec<_> = stream::iter(unique)
            .map(|wallet| async move {
                let result = chain.get_token_account_balances(wallet, token).await;
                (wallet, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut snapshot = HoldingsSnapshot::default();

        for (wallet, result) in lookups {
            let balance = match result {
                Ok(balances) => sum_raw(balances),
                Err(e) => {
                    warn!("⚠️ Holdings lookup failed for {}: {}", wallet, e);
                    snapshot.failed_lookups += 1;
                    U256::ZERO
                }
            };
            debug!("Wallet {} holds {} raw", wallet, balance);
            snapshot.per_wallet.insert(wallet.clone(), balance);
        }

        snapshot.total_raw = sum_raw(snapshot.per_wallet.values().copied());
        snapshot.total = to_ui_amount(snapshot.total_raw, token_decimals);

        info!(
            "💼 Holdings: {} wallets, {:.2} tokens, {} failed lookups",
            snapshot.per_wallet.len(),
            snapshot.total,
            snapshot.failed_lookups
        );

        snapshot
    }
}
