// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle detection - buys from several wallets landing in one settlement key.

use alloy::primitives::U256;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::amount::{percentage_of, to_ui_amount};
use crate::types::{Bundle, SettlementKey, Trade, WalletAddress};

/// Distinct wallets needed in one settlement key to call it a bundle.
pub const MIN_BUNDLE_WALLETS: usize = 2;

/// Group buy-side trades into bundles, ordered by tokens bought.
///
/// A wallet buying several times in one key counts once; a wallet buying in
/// several keys is counted in each.
pub fn group_into_bundles(
    trades: &[Trade],
    token_decimals: u8,
    quote_decimals: u8,
) -> Vec<Bundle> {
    let mut by_key: BTreeMap<SettlementKey, Vec<Trade>> = BTreeMap::new();

    for trade in trades.iter().filter(|t| t.is_buy()) {
        by_key
            .entry(trade.settlement_key)
            .or_default()
            .push(trade.clone());
    }

    let mut bundles: Vec<Bundle> = by_key
        .into_iter()
        .filter(|(_, trades)| distinct_wallets(trades) >= MIN_BUNDLE_WALLETS)
        .map(|(key, trades)| Bundle::from_trades(key, trades, token_decimals, quote_decimals))
        .collect();

    sort_by_tokens_bought(&mut bundles);

    debug!(
        "Grouped {} trades into {} bundles",
        trades.len(),
        bundles.len()
    );

    bundles
}

fn distinct_wallets(trades: &[Trade]) -> usize {
    trades
        .iter()
        .map(|t| t.wallet.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn by_tokens_bought(a: &Bundle, b: &Bundle) -> Ordering {
    b.token_amount_raw
        .cmp(&a.token_amount_raw)
        .then_with(|| a.settlement_key.cmp(&b.settlement_key))
}

/// Descending tokens bought, earliest settlement key first on ties.
pub fn sort_by_tokens_bought(bundles: &mut [Bundle]) {
    bundles.sort_by(by_tokens_bought);
}

/// Descending current holding, then the tokens-bought order.
pub fn sort_by_holding(bundles: &mut [Bundle]) {
    bundles.sort_by(|a, b| {
        b.holding_amount_raw
            .cmp(&a.holding_amount_raw)
            .then_with(|| by_tokens_bought(a, b))
    });
}

/// Narrow every bundle to the trades of team wallets.
///
/// Aggregates are rebuilt from the surviving trades rather than carried over
/// from the unfiltered bundle. Bundles with no team trades are dropped.
pub fn reduce_to_team(
    bundles: Vec<Bundle>,
    team: &BTreeSet<WalletAddress>,
    token_decimals: u8,
    quote_decimals: u8,
) -> Vec<Bundle> {
    let mut reduced: Vec<Bundle> = bundles
        .into_iter()
        .filter_map(|bundle| {
            let team_trades: Vec<Trade> = bundle
                .trades
                .into_iter()
                .filter(|t| team.contains(&t.wallet))
                .collect();

            if team_trades.is_empty() {
                return None;
            }

            Some(Bundle::from_trades(
                bundle.settlement_key,
                team_trades,
                token_decimals,
                quote_decimals,
            ))
        })
        .collect();

    sort_by_tokens_bought(&mut reduced);
    reduced
}

/// Attach current holdings to each bundle and switch to holding order.
///
/// Wallets missing from `per_wallet` hold zero.
pub fn apply_holdings(
    bundles: &mut [Bundle],
    per_wallet: &HashMap<WalletAddress, U256>,
    total_supply: U256,
    token_decimals: u8,
) {
    for bundle in bundles.iter_mut() {
        let raw = bundle
            .wallets
            .iter()
            .filter_map(|w| per_wallet.get(w))
            .fold(U256::ZERO, |acc, amount| acc.saturating_add(*amount));

        bundle.holding_amount_raw = raw;
        bundle.holding_amount = to_ui_amount(raw, token_decimals);
        bundle.holding_percentage = percentage_of(raw, total_supply, token_decimals);
    }

    sort_by_holding(bundles);
}

/// Every wallet appearing in any bundle.
pub fn participants(bundles: &[Bundle]) -> BTreeSet<WalletAddress> {
    bundles
        .iter()
        .flat_map(|b| b.wallets.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::sum_raw;
    use crate::types::TradeSide;

    fn trade(wallet: &str, slot: u64, side: TradeSide, tokens: u64, quote: u64) -> Trade {
        Trade {
            wallet: wallet.to_string(),
            settlement_key: SettlementKey::Slot(slot),
            side,
            token_amount: U256::from(tokens),
            quote_amount: U256::from(quote),
            tx_hash: format!("{}-{}-{}", wallet, slot, tokens),
        }
    }

    fn buy(wallet: &str, slot: u64, tokens: u64, quote: u64) -> Trade {
        trade(wallet, slot, TradeSide::Buy, tokens, quote)
    }

    fn team(wallets: &[&str]) -> BTreeSet<WalletAddress> {
        wallets.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_two_wallets_in_one_slot_form_a_bundle() {
        let trades = vec![
            buy("A", 100, 1000, 10),
            buy("B", 100, 2000, 20),
            buy("C", 200, 500, 5),
        ];

        let bundles = group_into_bundles(&trades, 0, 0);

        assert_eq!(bundles.len(), 1);
        let bundle = &bundles[0];
        assert_eq!(bundle.settlement_key, SettlementKey::Slot(100));
        assert_eq!(bundle.wallets, team(&["A", "B"]));
        assert_eq!(bundle.tokens_bought, 3000.0);
        assert_eq!(bundle.sol_spent, 30.0);
    }

    #[test]
    fn test_repeat_buys_by_one_wallet_are_not_a_bundle() {
        let trades = vec![buy("A", 100, 1000, 10), buy("A", 100, 1000, 10)];
        assert!(group_into_bundles(&trades, 0, 0).is_empty());
    }

    #[test]
    fn test_sells_are_ignored() {
        let trades = vec![
            buy("A", 100, 1000, 10),
            trade("B", 100, TradeSide::Sell, 2000, 20),
        ];
        assert!(group_into_bundles(&trades, 0, 0).is_empty());
    }

    #[test]
    fn test_wallet_counted_in_each_bundle() {
        let trades = vec![
            buy("A", 1, 10, 1),
            buy("B", 1, 10, 1),
            buy("A", 2, 10, 1),
            buy("C", 2, 10, 1),
        ];

        let bundles = group_into_bundles(&trades, 0, 0);
        assert_eq!(bundles.len(), 2);
        assert!(bundles.iter().all(|b| b.wallets.contains("A")));
    }

    #[test]
    fn test_ordering_is_deterministic_with_tie_break() {
        let trades = vec![
            buy("A", 7, 100, 1),
            buy("B", 7, 100, 1),
            buy("C", 3, 100, 1),
            buy("D", 3, 100, 1),
            buy("E", 5, 900, 1),
            buy("F", 5, 100, 1),
        ];

        let first = group_into_bundles(&trades, 0, 0);
        let second = group_into_bundles(&trades, 0, 0);

        let keys: Vec<_> = first.iter().map(|b| b.settlement_key).collect();
        assert_eq!(
            keys,
            vec![
                SettlementKey::Slot(5),
                SettlementKey::Slot(3),
                SettlementKey::Slot(7)
            ]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_invariants_hold_for_mixed_input() {
        let mut trades = Vec::new();
        for i in 0..60u64 {
            let wallet = format!("w{}", i % 7);
            let side = if i % 5 == 0 { TradeSide::Sell } else { TradeSide::Buy };
            trades.push(trade(&wallet, i % 9, side, 10 + i, i));
        }

        let bundles = group_into_bundles(&trades, 0, 0);
        assert!(bundles.iter().all(|b| b.wallet_count() >= MIN_BUNDLE_WALLETS));

        let bought = sum_raw(bundles.iter().map(|b| b.token_amount_raw));
        let all_buys = sum_raw(trades.iter().filter(|t| t.is_buy()).map(|t| t.token_amount));
        assert!(bought <= all_buys);
    }

    #[test]
    fn test_timestamp_keys_group_like_slots() {
        let mut a = buy("A", 0, 10, 1);
        let mut b = buy("B", 0, 20, 1);
        a.settlement_key = SettlementKey::Timestamp(1_700_000_000);
        b.settlement_key = SettlementKey::Timestamp(1_700_000_000);

        let bundles = group_into_bundles(&[a, b], 0, 0);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].tokens_bought, 30.0);
    }

    #[test]
    fn test_team_reduction_recomputes_from_team_trades() {
        let trades = vec![
            buy("A", 100, 1000, 10),
            buy("B", 100, 2000, 20),
            buy("A", 100, 500, 5),
            buy("C", 100, 4000, 40),
            buy("X", 200, 10, 1),
            buy("Y", 200, 10, 1),
        ];
        let bundles = group_into_bundles(&trades, 0, 0);
        let team_set = team(&["A", "C"]);

        let reduced = reduce_to_team(bundles, &team_set, 0, 0);

        assert_eq!(reduced.len(), 1);
        let bundle = &reduced[0];
        assert_eq!(bundle.wallets, team_set);
        assert_eq!(bundle.token_amount_raw, U256::from(5500u64));
        assert_eq!(bundle.quote_amount_raw, U256::from(55u64));
        assert_eq!(bundle.trades.len(), 3);
    }

    #[test]
    fn test_apply_holdings_reorders_by_holding() {
        let trades = vec![
            buy("A", 1, 5000, 1),
            buy("B", 1, 5000, 1),
            buy("C", 2, 100, 1),
            buy("D", 2, 100, 1),
        ];
        let mut bundles = group_into_bundles(&trades, 0, 0);
        assert_eq!(bundles[0].settlement_key, SettlementKey::Slot(1));

        let per_wallet: HashMap<WalletAddress, U256> = [
            ("A".to_string(), U256::ZERO),
            ("C".to_string(), U256::from(300u64)),
            ("D".to_string(), U256::from(200u64)),
        ]
        .into_iter()
        .collect();

        apply_holdings(&mut bundles, &per_wallet, U256::from(10_000u64), 0);

        assert_eq!(bundles[0].settlement_key, SettlementKey::Slot(2));
        assert_eq!(bundles[0].holding_amount, 500.0);
        assert!((bundles[0].holding_percentage - 5.0).abs() < 1e-9);
        assert_eq!(bundles[1].holding_amount, 0.0);
    }

    #[test]
    fn test_holding_ties_fall_back_to_tokens_bought() {
        let trades = vec![
            buy("A", 1, 100, 1),
            buy("B", 1, 100, 1),
            buy("C", 2, 900, 1),
            buy("D", 2, 900, 1),
        ];
        let mut bundles = group_into_bundles(&trades, 0, 0);
        apply_holdings(&mut bundles, &HashMap::new(), U256::from(10_000u64), 0);

        assert_eq!(bundles[0].settlement_key, SettlementKey::Slot(2));
    }
}
