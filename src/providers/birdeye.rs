// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Birdeye token swap history for tokens that did not launch on pump.fun.
//!
//! Birdeye reports block time but not slot, so trades are keyed by their
//! shared timestamp.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{TradePage, TradeProvider};
use crate::amount::{deserialize_raw_amount, WRAPPED_SOL_MINT};
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{SettlementKey, Trade, TradeSide};

const SOURCE: &str = "birdeye";

/// `/defi/txs/token` rejects a `limit` above this.
pub const MAX_TXS_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct TxsResponse {
    success: bool,
    data: Option<TxsData>,
}

#[derive(Debug, Deserialize)]
struct TxsData {
    #[serde(default)]
    items: Vec<SwapItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct SwapItem {
    #[serde(rename = "txHash")]
    tx_hash: String,
    #[serde(rename = "blockUnixTime")]
    block_unix_time: i64,
    owner: String,
    from: SwapLeg,
    to: SwapLeg,
}

#[derive(Debug, Clone, Deserialize)]
struct SwapLeg {
    address: String,
    #[serde(deserialize_with = "deserialize_raw_amount")]
    amount: U256,
}

impl SwapItem {
    /// Normalize against `mint`. Swaps that do not touch the mint are dropped.
    fn into_trade(self, mint: &str) -> Option<Trade> {
        let (side, token_leg, quote_leg) = if self.to.address == mint {
            (TradeSide::Buy, self.to, self.from)
        } else if self.from.address == mint {
            (TradeSide::Sell, self.from, self.to)
        } else {
            return None;
        };

        // Only SOL-quoted swaps contribute to SOL spent.
        let quote_amount = if quote_leg.address == WRAPPED_SOL_MINT {
            quote_leg.amount
        } else {
            U256::ZERO
        };

        Some(Trade {
            wallet: self.owner,
            settlement_key: SettlementKey::Timestamp(self.block_unix_time),
            side,
            token_amount: token_leg.amount,
            quote_amount,
            tx_hash: self.tx_hash,
        })
    }
}

pub struct BirdeyeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BirdeyeClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AnalysisResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TradeProvider for BirdeyeClient {
    fn name(&self) -> &str {
        SOURCE
    }

    fn max_page_size(&self) -> usize {
        MAX_TXS_PAGE_SIZE
    }

    async fn get_trades(
        &self,
        token: &str,
        page_size: usize,
        offset: usize,
    ) -> AnalysisResult<TradePage> {
        let url = format!("{}/defi/txs/token", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .header("x-chain", "solana")
            .query(&[
                ("address", token.to_string()),
                ("offset", offset.to_string()),
                ("limit", page_size.to_string()),
                ("tx_type", "swap".to_string()),
                ("sort_type", "asc".to_string()),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AnalysisError::upstream(
                SOURCE,
                format!("txs page at offset {} returned {}", offset, response.status()),
            ));
        }

        let body: TxsResponse = response.json().await?;
        trades_from_response(body, token)
    }
}

fn trades_from_response(body: TxsResponse, mint: &str) -> AnalysisResult<TradePage> {
    if !body.success {
        return Err(AnalysisError::upstream(SOURCE, "response flagged unsuccessful"));
    }

    let items = body.data.map(|d| d.items).unwrap_or_default();
    let received = items.len();
    let trades: Vec<Trade> = items
        .into_iter()
        .filter_map(|item| item.into_trade(mint))
        .collect();

    if trades.len() < received {
        debug!(
            "birdeye: {} of {} swaps did not touch {}",
            received - trades.len(),
            received,
            mint
        );
    }

    Ok(TradePage { trades, received })
}
