// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! pump.fun frontend API: primary venue trades and the venue probe.

use alloy::primitives::U256;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{TradePage, TradeProvider, VenueProbe};
use crate::amount::deserialize_raw_amount;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{SettlementKey, Trade, TradeSide};

const SOURCE: &str = "pump.fun";

/// A trade as returned by `/trades/all/{mint}`.
#[derive(Debug, Clone, Deserialize)]
struct PumpTrade {
    signature: String,
    #[serde(deserialize_with = "deserialize_raw_amount")]
    sol_amount: U256,
    #[serde(deserialize_with = "deserialize_raw_amount")]
    token_amount: U256,
    is_buy: bool,
    user: String,
    slot: u64,
}

impl From<PumpTrade> for Trade {
    fn from(raw: PumpTrade) -> Self {
        Trade {
            wallet: raw.user,
            settlement_key: SettlementKey::Slot(raw.slot),
            side: if raw.is_buy { TradeSide::Buy } else { TradeSide::Sell },
            token_amount: raw.token_amount,
            quote_amount: raw.sol_amount,
            tx_hash: raw.signature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PumpCoin {
    mint: String,
}

pub struct PumpFunClient {
    http: reqwest::Client,
    base_url: String,
}

impl PumpFunClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AnalysisResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TradeProvider for PumpFunClient {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn get_trades(
        &self,
        token: &str,
        page_size: usize,
        offset: usize,
    ) -> AnalysisResult<TradePage> {
        let url = format!("{}/trades/all/{}", self.base_url, token);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
                ("minimumSize", "0".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::upstream(
                SOURCE,
                format!("trades page at offset {} returned {}", offset, response.status()),
            ));
        }

        let page: Vec<PumpTrade> = response.json().await?;
        Ok(page.into_iter().map(Trade::from).collect::<Vec<_>>().into())
    }
}

#[async_trait]
impl VenueProbe for PumpFunClient {
    async fn is_primary_venue(&self, token: &str) -> AnalysisResult<bool> {
        let url = format!("{}/coins/{}", self.base_url, token);
        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                // An unknown mint sometimes comes back as 200 with an empty body.
                let text = response.text().await?;
                let coin: Option<PumpCoin> = serde_json::from_str(&text).ok();
                let listed = coin.map(|c| c.mint == token).unwrap_or(false);
                debug!("pump.fun probe for {}: listed={}", token, listed);
                Ok(listed)
            }
            status => Err(AnalysisError::upstream(
                SOURCE,
                format!("coin lookup returned {}", status),
            )),
        }
    }
}
