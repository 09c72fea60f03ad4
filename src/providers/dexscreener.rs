// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! DexScreener price lookups.
//!
//! Endpoint: `{base}/token-pairs/v1/solana/{mint}`, an array of trading pairs.
//! We take the first pair quoted in SOL.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Deserialize)]
struct DexScreenerPair {
    #[serde(rename = "baseToken")]
    base_token: PairToken,
    #[serde(rename = "quoteToken")]
    quote_token: PairToken,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    #[serde(rename = "priceNative")]
    price_native: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PairToken {
    symbol: String,
}

/// Symbol and prices of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenQuote {
    pub symbol: String,
    pub price_usd: f64,
    pub price_in_sol: f64,
}

pub struct DexScreenerClient {
    http: reqwest::Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AnalysisResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Quote of `mint` against SOL, or `None` when no SOL pair is listed.
    pub async fn fetch_quote(&self, mint: &str) -> AnalysisResult<Option<TokenQuote>> {
        let url = format!("{}/token-pairs/v1/solana/{}", self.base_url, mint);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AnalysisError::upstream(
                "dexscreener",
                format!("API error: {}", response.status()),
            ));
        }

        let pairs: Vec<DexScreenerPair> = response.json().await?;
        Ok(quote_from_pairs(&pairs))
    }
}

fn quote_from_pairs(pairs: &[DexScreenerPair]) -> Option<TokenQuote> {
    let pair = pairs.iter().find(|p| p.quote_token.symbol == "SOL")?;
    let parse = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    Some(TokenQuote {
        symbol: pair.base_token.symbol.clone(),
        price_usd: parse(&pair.price_usd),
        price_in_sol: parse(&pair.price_native),
    })
}
