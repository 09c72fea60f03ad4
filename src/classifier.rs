// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Team wallet classification from wallet freshness and shared funding.

use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::providers::{ChainReader, FundingResolver};
use crate::types::{WalletAddress, WalletFundingRecord};

/// Wallets with at most this many signatures are treated as fresh.
pub const DEFAULT_FRESH_MAX_SIGNATURES: usize = 10;

/// Outcome of classifying one wallet set.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub funding: BTreeMap<WalletAddress, WalletFundingRecord>,
    pub team_wallets: BTreeSet<WalletAddress>,
    pub fresh_wallets: BTreeSet<WalletAddress>,
    /// Funders that fed more than one analyzed wallet.
    pub shared_funders: BTreeMap<WalletAddress, BTreeSet<WalletAddress>>,
}

impl Classification {
    pub fn is_team(&self, wallet: &str) -> bool {
        self.team_wallets.contains(wallet)
    }
}

struct WalletLookup {
    wallet: WalletAddress,
    fresh: bool,
    record: WalletFundingRecord,
}

pub struct WalletClassifier {
    chain: Arc<dyn ChainReader>,
    funding: Arc<dyn FundingResolver>,
    fresh_max_signatures: usize,
    concurrency: usize,
}

impl WalletClassifier {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        funding: Arc<dyn FundingResolver>,
        fresh_max_signatures: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            chain,
            funding,
            fresh_max_signatures,
            concurrency: concurrency.max(1),
        }
    }

    /// Flag team wallets among `wallets`.
    ///
    /// A wallet is team if it is fresh, or if its funder also funded another
    /// wallet in the set. Lookups that fail leave the wallet unflagged.
    pub async fn classify<'a, I>(&self, wallets: I) -> Classification
    where
        I: IntoIterator<Item = &'a WalletAddress>,
    {
        let unique: BTreeSet<&WalletAddress> = wallets.into_iter().collect();

        let lookups: Vec<WalletLookup> = stream::iter(unique)
            .map(|wallet| self.lookup(wallet))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut classification = Classification::default();
        let mut funded_by: BTreeMap<WalletAddress, BTreeSet<WalletAddress>> = BTreeMap::new();

        for lookup in lookups {
            if lookup.fresh {
                classification.fresh_wallets.insert(lookup.wallet.clone());
                classification.team_wallets.insert(lookup.wallet.clone());
            }
            if let Some(funder) = &lookup.record.funder {
                funded_by
                    .entry(funder.clone())
                    .or_default()
                    .insert(lookup.wallet.clone());
            }
            classification.funding.insert(lookup.wallet, lookup.record);
        }

        for (funder, funded) in funded_by {
            if funded.len() > 1 {
                warn!(
                    "🚨 Common funder {} fed {} analyzed wallets",
                    funder,
                    funded.len()
                );
                classification.team_wallets.extend(funded.iter().cloned());
                classification.shared_funders.insert(funder, funded);
            }
        }

        info!(
            "🕵️ Classified {} wallets: {} team ({} fresh, {} shared funders)",
            classification.funding.len(),
            classification.team_wallets.len(),
            classification.fresh_wallets.len(),
            classification.shared_funders.len()
        );

        classification
    }

    async fn lookup(&self, wallet: &WalletAddress) -> WalletLookup {
        let (signatures, funding) = tokio::join!(
            self.chain
                .get_signature_count(wallet, self.fresh_max_signatures + 1),
            self.funding.resolve_funder(wallet),
        );

        let fresh = match signatures {
            Ok(count) => {
                debug!("Wallet {} has {} signatures", wallet, count);
                count <= self.fresh_max_signatures
            }
            Err(e) => {
                warn!("⚠️ Freshness lookup failed for {}: {}", wallet, e);
                false
            }
        };

        let record = match funding {
            Ok(Some(source)) if source.funder != *wallet => WalletFundingRecord {
                wallet: wallet.clone(),
                funder: Some(source.funder),
                details: Some(source.details),
            },
            Ok(_) => WalletFundingRecord {
                wallet: wallet.clone(),
                funder: None,
                details: None,
            },
            Err(e) => {
                warn!("⚠️ Funding lookup failed for {}: {}", wallet, e);
                WalletFundingRecord {
                    wallet: wallet.clone(),
                    funder: None,
                    details: None,
                }
            }
        };

        WalletLookup {
            wallet: wallet.clone(),
            fresh,
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, AnalysisResult};
    use crate::providers::TokenMetadata;
    use crate::types::{FundingDetails, FundingSource};
    use alloy::primitives::U256;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct History {
        signatures: HashMap<String, usize>,
        funders: HashMap<String, String>,
        broken: BTreeSet<String>,
    }

    #[async_trait]
    impl ChainReader for History {
        async fn get_token_metadata(&self, token: &str) -> AnalysisResult<TokenMetadata> {
            Err(AnalysisError::malformed(token, "unused"))
        }

        async fn get_token_account_balances(
            &self,
            _wallet: &str,
            _token: &str,
        ) -> AnalysisResult<Vec<U256>> {
            Ok(vec![])
        }

        async fn get_signature_count(&self, wallet: &str, limit: usize) -> AnalysisResult<usize> {
            if self.broken.contains(wallet) {
                return Err(AnalysisError::upstream("rpc", "429"));
            }
            Ok(self.signatures.get(wallet).copied().unwrap_or(1_000).min(limit))
        }
    }

    #[async_trait]
    impl FundingResolver for History {
        async fn resolve_funder(&self, wallet: &str) -> AnalysisResult<Option<FundingSource>> {
            if self.broken.contains(wallet) {
                return Err(AnalysisError::upstream("rpc", "429"));
            }
            Ok(self.funders.get(wallet).map(|funder| FundingSource {
                funder: funder.clone(),
                details: FundingDetails {
                    amount: U256::from(1_000_000_000u64),
                    timestamp: Some(1_700_000_000),
                    tx_hash: format!("fund-{}", wallet),
                    source_label: None,
                },
            }))
        }
    }

    fn classifier(history: History) -> WalletClassifier {
        let history = Arc::new(history);
        WalletClassifier::new(history.clone(), history, DEFAULT_FRESH_MAX_SIGNATURES, 4)
    }

    fn wallets(names: &[&str]) -> Vec<WalletAddress> {
        names.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn test_freshness_boundary() {
        let mut history = History::default();
        history.signatures.insert("ten".into(), 10);
        history.signatures.insert("eleven".into(), 11);

        let result = classifier(history)
            .classify(&wallets(&["ten", "eleven"]))
            .await;

        assert!(result.is_team("ten"));
        assert!(!result.is_team("eleven"));
        assert_eq!(result.fresh_wallets.len(), 1);
    }

    #[tokio::test]
    async fn test_common_funder_promotes_all_funded_wallets() {
        let mut history = History::default();
        history.funders.insert("A".into(), "F".into());
        history.funders.insert("B".into(), "F".into());
        history.funders.insert("C".into(), "G".into());

        let result = classifier(history)
            .classify(&wallets(&["A", "B", "C"]))
            .await;

        assert!(result.is_team("A"));
        assert!(result.is_team("B"));
        assert!(!result.is_team("C"));
        assert_eq!(
            result.shared_funders["F"],
            ["A", "B"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
        );
        assert_eq!(result.funding["C"].funder.as_deref(), Some("G"));
    }

    #[tokio::test]
    async fn test_failed_lookups_fail_open() {
        let mut history = History::default();
        history.funders.insert("A".into(), "F".into());
        history.funders.insert("B".into(), "F".into());
        history.signatures.insert("B".into(), 1);
        history.broken.insert("B".into());

        let result = classifier(history)
            .classify(&wallets(&["A", "B"]))
            .await;

        assert!(result.team_wallets.is_empty());
        assert_eq!(result.funding["B"].funder, None);
        assert_eq!(result.funding.len(), 2);
    }

    #[tokio::test]
    async fn test_self_funding_is_ignored() {
        let mut history = History::default();
        history.funders.insert("A".into(), "A".into());

        let result = classifier(history).classify(&wallets(&["A"])).await;
        assert_eq!(result.funding["A"].funder, None);
    }
}
