// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Upstream collaborators: trade history, chain state and funding lookups.

pub mod birdeye;
pub mod dexscreener;
pub mod funding;
pub mod pump_fun;
pub mod rpc;

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::error::AnalysisResult;
use crate::types::{FundingSource, Trade};

pub use birdeye::BirdeyeClient;
pub use funding::RpcFundingResolver;
pub use pump_fun::PumpFunClient;
pub use rpc::SolanaRpcClient;

/// Token metadata as reported by the chain reader.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Option<U256>,
    pub price_usd: f64,
    pub price_in_sol: f64,
}

/// One page of normalized trades.
#[derive(Debug, Clone, Default)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    /// Records the provider returned, including any it could not normalize.
    /// Drives the offset and the end-of-history check.
    pub received: usize,
}

impl From<Vec<Trade>> for TradePage {
    fn from(trades: Vec<Trade>) -> Self {
        Self {
            received: trades.len(),
            trades,
        }
    }
}

/// A paged source of trades for one token.
#[async_trait]
pub trait TradeProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Largest page the upstream will serve in one request.
    fn max_page_size(&self) -> usize {
        usize::MAX
    }

    async fn get_trades(
        &self,
        token: &str,
        page_size: usize,
        offset: usize,
    ) -> AnalysisResult<TradePage>;
}

/// Decides whether a token launched on the primary venue.
#[async_trait]
pub trait VenueProbe: Send + Sync {
    async fn is_primary_venue(&self, token: &str) -> AnalysisResult<bool>;
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_token_metadata(&self, token: &str) -> AnalysisResult<TokenMetadata>;

    /// Raw balances of every token account `wallet` holds for `token`.
    async fn get_token_account_balances(
        &self,
        wallet: &str,
        token: &str,
    ) -> AnalysisResult<Vec<U256>>;

    /// Number of signatures recorded for `wallet`, capped at `limit`.
    async fn get_signature_count(&self, wallet: &str, limit: usize) -> AnalysisResult<usize>;
}

#[async_trait]
pub trait FundingResolver: Send + Sync {
    /// The nearest identifiable funder of `wallet`, if any.
    async fn resolve_funder(&self, wallet: &str) -> AnalysisResult<Option<FundingSource>>;
}
