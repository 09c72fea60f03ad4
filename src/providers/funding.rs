// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Funding source resolution from a wallet's earliest visible transfers.
//!
//! This is a bounded scan, not a trace: we look at the oldest few
//! transactions within the most recent `scan_limit` signatures and report the
//! first System Program transfer that paid into the wallet.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::rpc::{ParsedInstruction, ParsedTransaction, SolanaRpcClient};
use super::FundingResolver;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{FundingDetails, FundingSource};

pub struct RpcFundingResolver {
    rpc: Arc<SolanaRpcClient>,
    scan_limit: usize,
    inspect: usize,
    labels: HashMap<String, String>,
}

impl RpcFundingResolver {
    pub fn new(
        rpc: Arc<SolanaRpcClient>,
        scan_limit: usize,
        inspect: usize,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            rpc,
            scan_limit: scan_limit.max(1),
            inspect: inspect.max(1),
            labels,
        }
    }
}

#[async_trait]
impl FundingResolver for RpcFundingResolver {
    async fn resolve_funder(&self, wallet: &str) -> AnalysisResult<Option<FundingSource>> {
        let signatures = self
            .rpc
            .get_signatures(wallet, self.scan_limit)
            .await
            .map_err(|e| AnalysisError::lookup(wallet, e))?;

        // Newest first from the node; walk the oldest ones first.
        for info in signatures.iter().rev().take(self.inspect) {
            let Some(tx) = self
                .rpc
                .get_transaction(&info.signature)
                .await
                .map_err(|e| AnalysisError::lookup(wallet, e))?
            else {
                continue;
            };

            if let Some((funder, lamports)) = find_inbound_transfer(&tx, wallet) {
                debug!("Wallet {} funded by {} in {}", wallet, funder, info.signature);
                let source_label = self.labels.get(&funder).cloned();
                return Ok(Some(FundingSource {
                    funder,
                    details: FundingDetails {
                        amount: U256::from(lamports),
                        timestamp: tx.block_time.or(info.block_time),
                        tx_hash: info.signature.clone(),
                        source_label,
                    },
                }));
            }
        }

        Ok(None)
    }
}

/// First system transfer into `wallet` within `tx`: `(source, lamports)`.
fn find_inbound_transfer(tx: &ParsedTransaction, wallet: &str) -> Option<(String, u64)> {
    tx.transaction
        .message
        .instructions
        .iter()
        .find_map(|ix| system_transfer(ix).filter(|(_, destination, _)| destination == wallet))
        .map(|(source, _, lamports)| (source, lamports))
}

fn system_transfer(ix: &ParsedInstruction) -> Option<(String, String, u64)> {
    if ix.program.as_deref() != Some("system") {
        return None;
    }
    let parsed = ix.parsed.as_ref()?;
    match parsed.get("type")?.as_str()? {
        "transfer" | "transferWithSeed" => {}
        _ => return None,
    }

    let info = parsed.get("info")?;
    let source = info.get("source")?.as_str()?.to_string();
    let destination = info.get("destination")?.as_str()?.to_string();
    let lamports = info.get("lamports")?.as_u64()?;

    Some((source, destination, lamports))
}
