// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle analysis for a single token.
//!
//! One call fetches token metadata, probes the launch venue, pages the full
//! trade history from that venue's provider, groups same-settlement buys into
//! bundles, optionally narrows them to team wallets, and attaches current
//! holdings. Nothing is cached between calls.

use std::sync::Arc;
use tracing::{info, warn};

use crate::amount::{percentage_of, sum_raw, to_ui_amount, SOL_DECIMALS};
use crate::bundles::{apply_holdings, group_into_bundles, participants, reduce_to_team};
use crate::classifier::{Classification, WalletClassifier, DEFAULT_FRESH_MAX_SIGNATURES};
use crate::error::{AnalysisError, AnalysisResult};
use crate::holdings::HoldingsAggregator;
use crate::paginator::{fetch_all_trades, DEFAULT_PAGE_SIZE};
use crate::providers::{ChainReader, FundingResolver, TradeProvider, VenueProbe};
use crate::types::{Metrics, TokenInfo, Venue};

/// Tunables shared by every call.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub page_size: usize,
    pub fresh_max_signatures: usize,
    pub max_concurrent_lookups: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fresh_max_signatures: DEFAULT_FRESH_MAX_SIGNATURES,
            max_concurrent_lookups: 16,
        }
    }
}

pub struct Analyzer {
    primary_trades: Arc<dyn TradeProvider>,
    secondary_trades: Arc<dyn TradeProvider>,
    probe: Arc<dyn VenueProbe>,
    chain: Arc<dyn ChainReader>,
    funding: Arc<dyn FundingResolver>,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(
        primary_trades: Arc<dyn TradeProvider>,
        secondary_trades: Arc<dyn TradeProvider>,
        probe: Arc<dyn VenueProbe>,
        chain: Arc<dyn ChainReader>,
        funding: Arc<dyn FundingResolver>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            primary_trades,
            secondary_trades,
            probe,
            chain,
            funding,
            settings,
        }
    }

    /// Analyze `token` for coordinated buys.
    ///
    /// Upstream failures while fetching metadata, probing or paging abort the
    /// call. Per-wallet lookup failures are absorbed and show up as zero
    /// holdings or unflagged wallets.
    pub async fn analyze(
        &self,
        token: &str,
        record_cap: usize,
        team_mode: bool,
    ) -> AnalysisResult<Metrics> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AnalysisError::malformed(token, "empty token address"));
        }

        let token_info = self.token_info(token).await?;
        info!(
            "🔍 Analyzing {} ({}), supply {}",
            token_info.symbol,
            token,
            token_info.total_supply_ui()
        );

        let venue = if self.probe.is_primary_venue(token).await? {
            Venue::PumpFun
        } else {
            Venue::Secondary
        };
        info!("📍 Venue for {}: {}", token, venue);

        let (provider, team_mode) = match venue {
            Venue::PumpFun => (&self.primary_trades, team_mode),
            Venue::Secondary => {
                if team_mode {
                    warn!(
                        "⚠️ Team mode is not available for {} on the {} venue, reporting all bundles",
                        token, venue
                    );
                }
                (&self.secondary_trades, false)
            }
        };

        let trades = fetch_all_trades(
            provider.as_ref(),
            token,
            self.settings.page_size,
            record_cap,
        )
        .await?;

        let decimals = token_info.decimals;
        let mut bundles = group_into_bundles(&trades, decimals, SOL_DECIMALS);
        info!(
            "📦 {} bundles across {} trades for {}",
            bundles.len(),
            trades.len(),
            token
        );

        let mut classification = Classification::default();

        if team_mode {
            let classifier = WalletClassifier::new(
                self.chain.clone(),
                self.funding.clone(),
                self.settings.fresh_max_signatures,
                self.settings.max_concurrent_lookups,
            );
            classification = classifier.classify(&participants(&bundles)).await;

            bundles = reduce_to_team(
                bundles,
                &classification.team_wallets,
                decimals,
                SOL_DECIMALS,
            );
            info!("👥 {} bundles contain team wallets", bundles.len());
        }

        let holders = participants(&bundles);
        let holdings = HoldingsAggregator::new(
            self.chain.clone(),
            self.settings.max_concurrent_lookups,
        )
        .current_holdings(&holders, token, decimals)
        .await;

        apply_holdings(
            &mut bundles,
            &holdings.per_wallet,
            token_info.total_supply,
            decimals,
        );

        let tokens_raw = sum_raw(bundles.iter().map(|b| b.token_amount_raw));
        let quote_raw = sum_raw(bundles.iter().map(|b| b.quote_amount_raw));
        let total_sol_spent = to_ui_amount(quote_raw, SOL_DECIMALS);

        let metrics = Metrics {
            venue,
            team_mode,
            trades_analyzed: trades.len(),
            total_tokens_bundled: to_ui_amount(tokens_raw, decimals),
            percentage_bundled: percentage_of(tokens_raw, token_info.total_supply, decimals),
            total_sol_spent,
            total_sol_spent_usd: token_info.sol_price_usd().map(|p| total_sol_spent * p),
            total_holding_amount: holdings.total,
            total_holding_amount_percentage: percentage_of(
                holdings.total_raw,
                token_info.total_supply,
                decimals,
            ),
            failed_holding_lookups: holdings.failed_lookups,
            bundles,
            team_wallets: classification.team_wallets,
            fresh_wallets: classification.fresh_wallets,
            shared_funders: classification.shared_funders,
            funding: classification.funding,
            token: token_info,
        };

        if metrics.is_empty() {
            info!("✅ No bundles found for {}", token);
        } else {
            info!(
                "✅ {}: {:.2}% bundled, {:.2}% still held",
                token, metrics.percentage_bundled, metrics.total_holding_amount_percentage
            );
        }

        Ok(metrics)
    }

    async fn token_info(&self, token: &str) -> AnalysisResult<TokenInfo> {
        let metadata = self.chain.get_token_metadata(token).await?;

        let total_supply = match metadata.total_supply {
            Some(supply) if !supply.is_zero() => supply,
            Some(_) => return Err(AnalysisError::malformed(token, "total supply is zero")),
            None => return Err(AnalysisError::malformed(token, "total supply unavailable")),
        };

        Ok(TokenInfo {
            address: token.to_string(),
            symbol: metadata.symbol,
            decimals: metadata.decimals,
            total_supply,
            price_usd: metadata.price_usd,
            price_in_sol: metadata.price_in_sol,
        })
    }
}
