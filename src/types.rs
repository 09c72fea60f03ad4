// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared data model for an analysis call.

use alloy::primitives::U256;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::amount::to_ui_amount;

/// Base58 wallet or mint address.
pub type WalletAddress = String;

/// The unit within which same-moment buys are considered coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettlementKey {
    /// Block slot (primary venue).
    Slot(u64),
    /// Unix timestamp in seconds (secondary venue).
    Timestamp(i64),
}

impl fmt::Display for SettlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementKey::Slot(slot) => write!(f, "slot {}", slot),
            SettlementKey::Timestamp(ts) => write!(f, "ts {}", ts),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed swap, normalized from whichever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub wallet: WalletAddress,
    pub settlement_key: SettlementKey,
    pub side: TradeSide,
    pub token_amount: U256,
    pub quote_amount: U256,
    pub tx_hash: String,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.side == TradeSide::Buy
    }
}

/// Buys from two or more distinct wallets sharing one settlement key.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub settlement_key: SettlementKey,
    pub wallets: BTreeSet<WalletAddress>,
    pub trades: Vec<Trade>,
    pub token_amount_raw: U256,
    pub quote_amount_raw: U256,
    pub tokens_bought: f64,
    pub sol_spent: f64,
    pub holding_amount_raw: U256,
    pub holding_amount: f64,
    pub holding_percentage: f64,
}

impl Bundle {
    /// Build a bundle from its member trades, summing in raw units and
    /// scaling once.
    pub fn from_trades(
        settlement_key: SettlementKey,
        trades: Vec<Trade>,
        token_decimals: u8,
        quote_decimals: u8,
    ) -> Self {
        let mut wallets = BTreeSet::new();
        let mut token_amount_raw = U256::ZERO;
        let mut quote_amount_raw = U256::ZERO;

        for trade in &trades {
            wallets.insert(trade.wallet.clone());
            token_amount_raw = token_amount_raw.saturating_add(trade.token_amount);
            quote_amount_raw = quote_amount_raw.saturating_add(trade.quote_amount);
        }

        Self {
            settlement_key,
            wallets,
            trades,
            token_amount_raw,
            quote_amount_raw,
            tokens_bought: to_ui_amount(token_amount_raw, token_decimals),
            sol_spent: to_ui_amount(quote_amount_raw, quote_decimals),
            holding_amount_raw: U256::ZERO,
            holding_amount: 0.0,
            holding_percentage: 0.0,
        }
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }
}

/// Token metadata, fetched once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub price_usd: f64,
    pub price_in_sol: f64,
}

impl TokenInfo {
    pub fn total_supply_ui(&self) -> f64 {
        to_ui_amount(self.total_supply, self.decimals)
    }

    /// USD price of one SOL implied by the token's two quotes.
    pub fn sol_price_usd(&self) -> Option<f64> {
        if self.price_usd > 0.0 && self.price_in_sol > 0.0 {
            Some(self.price_usd / self.price_in_sol)
        } else {
            None
        }
    }
}

/// The inbound transfer that identified a wallet's funder.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingDetails {
    pub amount: U256,
    pub timestamp: Option<i64>,
    pub tx_hash: String,
    pub source_label: Option<String>,
}

/// Result of a funding resolution for one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingSource {
    pub funder: WalletAddress,
    pub details: FundingDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletFundingRecord {
    pub wallet: WalletAddress,
    pub funder: Option<WalletAddress>,
    pub details: Option<FundingDetails>,
}

/// Launch venue of a token, decided by a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    PumpFun,
    Secondary,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::PumpFun => write!(f, "pump.fun"),
            Venue::Secondary => write!(f, "secondary"),
        }
    }
}

/// Final output of one analysis call.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub token: TokenInfo,
    pub venue: Venue,
    pub team_mode: bool,
    pub trades_analyzed: usize,
    pub total_tokens_bundled: f64,
    pub percentage_bundled: f64,
    pub total_sol_spent: f64,
    pub total_sol_spent_usd: Option<f64>,
    pub total_holding_amount: f64,
    pub total_holding_amount_percentage: f64,
    pub failed_holding_lookups: usize,
    pub bundles: Vec<Bundle>,
    pub team_wallets: BTreeSet<WalletAddress>,
    /// Team wallets flagged for having almost no history.
    pub fresh_wallets: BTreeSet<WalletAddress>,
    /// Funders that fed two or more analyzed wallets, with those wallets.
    pub shared_funders: BTreeMap<WalletAddress, BTreeSet<WalletAddress>>,
    pub funding: BTreeMap<WalletAddress, WalletFundingRecord>,
}

impl Metrics {
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
