// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Trade history pagination.

use tracing::{debug, info};

use crate::error::AnalysisResult;
use crate::providers::TradeProvider;
use crate::types::Trade;

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Upper bound on records pulled for one token.
pub const DEFAULT_RECORD_CAP: usize = 50_000;

/// Pull the full trade history for `token`, page by page.
///
/// The requested page size is clamped to what the provider serves, so a
/// capped page is not mistaken for the end of history. Stops on the first
/// short page or once `record_cap` records are held. Any
/// page error aborts the whole fetch: a silently truncated history would skew
/// every percentage computed from it.
pub async fn fetch_all_trades(
    provider: &dyn TradeProvider,
    token: &str,
    page_size: usize,
    record_cap: usize,
) -> AnalysisResult<Vec<Trade>> {
    let page_size = page_size.min(provider.max_page_size()).max(1);
    let mut trades: Vec<Trade> = Vec::new();
    let mut offset = 0;

    while trades.len() < record_cap {
        let page = provider.get_trades(token, page_size, offset).await?;
        let received = page.received;

        debug!(
            "{}: page at offset {} returned {} trades",
            provider.name(),
            offset,
            received
        );

        let room = record_cap - trades.len();
        trades.extend(page.trades.into_iter().take(room));
        offset += received;

        if received < page_size {
            break;
        }
    }

    info!(
        "📥 Fetched {} trades for {} from {}",
        trades.len(),
        token,
        provider.name()
    );

    Ok(trades)
}
