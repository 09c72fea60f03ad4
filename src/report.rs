// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chat rendering of analysis results (Telegram Markdown).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::AnalysisError;
use crate::types::{Bundle, Metrics, WalletAddress};

/// Bundles listed individually; the rest are summarized in one line.
pub const MAX_LISTED_BUNDLES: usize = 10;

/// Fresh wallets named individually in the team section.
pub const MAX_LISTED_WALLETS: usize = 10;

/// Render `metrics` as a chat message.
pub fn format_metrics(metrics: &Metrics) -> String {
    let token = &metrics.token;
    let mut lines = vec![
        "📦 *BUNDLE REPORT*".to_string(),
        format!("Token: {} `{}`", escape_markdown(&token.symbol), token.address),
        format!("Venue: {}", metrics.venue),
    ];
    if metrics.team_mode {
        lines.push("Mode: team wallets only".to_string());
    }
    lines.push(format!("Trades analyzed: {}", metrics.trades_analyzed));

    if metrics.is_empty() {
        lines.push(String::new());
        lines.push("✅ No bundles found".to_string());
        return lines.join("\n");
    }

    let usd = metrics
        .total_sol_spent_usd
        .map(|usd| format!(" (~${:.0})", usd))
        .unwrap_or_default();
    lines.extend([
        String::new(),
        "*Totals*".to_string(),
        format!("Bundles: {}", metrics.bundles.len()),
        format!(
            "Tokens bundled: {} ({:.2}% of supply)",
            format_amount(metrics.total_tokens_bundled),
            metrics.percentage_bundled
        ),
        format!("SOL spent: {:.4}{}", metrics.total_sol_spent, usd),
        format!(
            "Still held: {} ({:.2}% of supply)",
            format_amount(metrics.total_holding_amount),
            metrics.total_holding_amount_percentage
        ),
    ]);
    if metrics.failed_holding_lookups > 0 {
        lines.push(format!(
            "⚠️ {} holding lookups failed and count as zero",
            metrics.failed_holding_lookups
        ));
    }

    if metrics.team_mode {
        lines.extend(team_lines(metrics));
    }

    lines.push(String::new());
    lines.push("*Top bundles*".to_string());
    for (rank, bundle) in metrics.bundles.iter().take(MAX_LISTED_BUNDLES).enumerate() {
        lines.push(format!("{}. {}", rank + 1, format_bundle(bundle)));
    }
    let hidden = metrics.bundles.len().saturating_sub(MAX_LISTED_BUNDLES);
    if hidden > 0 {
        lines.push(format!("…and {} more", hidden));
    }

    lines.join("\n")
}

/// Map an analysis failure to the message shown to the user.
pub fn format_error(token: &str, err: &AnalysisError) -> String {
    if err.is_retryable() {
        format!(
            "❌ *Analysis Failed*\nToken: `{}`\nData is unavailable right now, please try again later.",
            token
        )
    } else {
        format!("❌ *Analysis Failed*\nToken: `{}`\nError: {}", token, err)
    }
}

fn format_bundle(bundle: &Bundle) -> String {
    format!(
        "{}: {} wallets, {} tokens, {:.4} SOL, holding {:.2}%",
        bundle.settlement_key,
        bundle.wallet_count(),
        format_amount(bundle.tokens_bought),
        bundle.sol_spent,
        bundle.holding_percentage
    )
}

/// Team summary: why each wallet was flagged.
fn team_lines(metrics: &Metrics) -> Vec<String> {
    let funded = metrics
        .funding
        .values()
        .filter(|r| r.funder.is_some())
        .count();
    let mut lines = vec![
        String::new(),
        "*Team*".to_string(),
        format!("Team wallets: {}", metrics.team_wallets.len()),
        format!("Wallets with known funder: {}", funded),
    ];

    if !metrics.fresh_wallets.is_empty() {
        lines.push(format!(
            "🆕 Fresh wallets ({}): {}",
            metrics.fresh_wallets.len(),
            wallet_list(&metrics.fresh_wallets)
        ));
    }

    for (funder, wallets) in &metrics.shared_funders {
        lines.push(shared_funder_line(metrics, funder, wallets));
    }

    lines
}

fn shared_funder_line(
    metrics: &Metrics,
    funder: &str,
    wallets: &BTreeSet<WalletAddress>,
) -> String {
    let details: Vec<_> = wallets
        .iter()
        .filter_map(|w| metrics.funding.get(w)?.details.as_ref())
        .collect();

    let label = details
        .iter()
        .find_map(|d| d.source_label.as_deref())
        .map(|l| format!(" ({})", escape_markdown(l)))
        .unwrap_or_default();
    let first_funded = details
        .iter()
        .filter_map(|d| d.timestamp)
        .min()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| format!(", first at {}", dt.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();

    format!(
        "🔗 Funder `{}`{} fed {} wallets{}",
        funder,
        label,
        wallets.len(),
        first_funded
    )
}

fn wallet_list(wallets: &BTreeSet<WalletAddress>) -> String {
    let mut listed: Vec<String> = wallets
        .iter()
        .take(MAX_LISTED_WALLETS)
        .map(|w| format!("`{}`", w))
        .collect();
    let hidden = wallets.len().saturating_sub(MAX_LISTED_WALLETS);
    if hidden > 0 {
        listed.push(format!("+{} more", hidden));
    }
    listed.join(", ")
}

/// Compact human amount: 1.23K, 4.56M, 7.89B.
fn format_amount(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// Escape characters that legacy Telegram Markdown treats as markup.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FundingDetails, SettlementKey, TokenInfo, Venue, WalletFundingRecord};
    use alloy::primitives::U256;
    use std::collections::BTreeMap;

    fn metrics(bundles: Vec<Bundle>) -> Metrics {
        Metrics {
            token: TokenInfo {
                address: "Mint111".to_string(),
                symbol: "MY_TOKEN".to_string(),
                decimals: 6,
                total_supply: U256::from(1_000_000_000_000_000u64),
                price_usd: 0.0,
                price_in_sol: 0.0,
            },
            venue: Venue::PumpFun,
            team_mode: false,
            trades_analyzed: 3,
            total_tokens_bundled: 100_000.0,
            percentage_bundled: 10.0,
            total_sol_spent: 1.5,
            total_sol_spent_usd: Some(225.0),
            total_holding_amount: 50_000.0,
            total_holding_amount_percentage: 5.0,
            failed_holding_lookups: 0,
            bundles,
            team_wallets: BTreeSet::new(),
            fresh_wallets: BTreeSet::new(),
            shared_funders: BTreeMap::new(),
            funding: BTreeMap::new(),
        }
    }

    fn bundle(slot: u64) -> Bundle {
        Bundle {
            settlement_key: SettlementKey::Slot(slot),
            wallets: wallets(&["A", "B"]),
            trades: Vec::new(),
            token_amount_raw: U256::ZERO,
            quote_amount_raw: U256::ZERO,
            tokens_bought: 100_000.0,
            sol_spent: 1.5,
            holding_amount_raw: U256::ZERO,
            holding_amount: 50_000.0,
            holding_percentage: 5.0,
        }
    }

    fn wallets(names: &[&str]) -> BTreeSet<WalletAddress> {
        names.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_result_message() {
        let text = format_metrics(&metrics(Vec::new()));
        assert!(text.ends_with("\n\n✅ No bundles found"));
        assert!(!text.contains("Top bundles"));
    }

    #[test]
    fn test_report_lists_totals_and_bundles() {
        let text = format_metrics(&metrics(vec![bundle(100)]));
        assert!(text.starts_with(
            "📦 *BUNDLE REPORT*\nToken: MY\\_TOKEN `Mint111`\nVenue: pump.fun"
        ));
        assert!(text.contains("100.00K (10.00% of supply)"));
        assert!(text.contains("SOL spent: 1.5000 (~$225)"));
        assert!(text.contains("\n\n*Top bundles*\n1. slot 100: 2 wallets"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_long_bundle_list_is_truncated() {
        let bundles = (0..12).map(bundle).collect();
        let text = format_metrics(&metrics(bundles));
        assert!(text.contains("10. slot 9"));
        assert!(!text.contains("11. slot 10"));
        assert!(text.contains("…and 2 more"));
    }

    #[test]
    fn test_retryable_errors_ask_to_retry() {
        let err = AnalysisError::upstream("birdeye", "503");
        assert!(format_error("Mint111", &err).contains("try again later"));

        let err = AnalysisError::malformed("Mint111", "total supply is zero");
        assert!(format_error("Mint111", &err).contains("try again later"));
    }

    fn funded(wallet: &str, funder: &str, ts: i64) -> (WalletAddress, WalletFundingRecord) {
        (
            wallet.to_string(),
            WalletFundingRecord {
                wallet: wallet.to_string(),
                funder: Some(funder.to_string()),
                details: Some(FundingDetails {
                    amount: U256::from(1_000_000_000u64),
                    timestamp: Some(ts),
                    tx_hash: format!("fund-{}", wallet),
                    source_label: Some("Exchange_1".to_string()),
                }),
            },
        )
    }

    #[test]
    fn test_team_section_lists_shared_funders() {
        let mut m = metrics(vec![bundle(100)]);
        m.team_mode = true;
        m.team_wallets = wallets(&["A", "B"]);
        m.shared_funders = [("F".to_string(), wallets(&["A", "B"]))].into_iter().collect();
        m.funding = [
            funded("A", "F", 1_700_000_060),
            funded("B", "F", 1_700_000_000),
            funded("C", "G", 1_700_000_000),
        ]
        .into_iter()
        .collect();

        let text = format_metrics(&m);
        assert!(text.contains("Team wallets: 2"));
        assert!(text.contains("Wallets with known funder: 3"));
        assert!(text.contains(
            "🔗 Funder `F` (Exchange\\_1) fed 2 wallets, first at 2023-11-14 22:13 UTC"
        ));
        assert!(!text.contains("Funder `G`"));
        assert!(!text.contains("Fresh wallets"));
    }

    #[test]
    fn test_team_section_names_fresh_wallets() {
        let mut m = metrics(vec![bundle(100)]);
        m.team_mode = true;
        m.team_wallets = wallets(&["A", "B"]);
        m.fresh_wallets = wallets(&["A", "B"]);

        let text = format_metrics(&m);
        assert!(text.contains("Team wallets: 2"));
        assert!(text.contains("🆕 Fresh wallets (2): `A`, `B`"));
        assert!(!text.contains("🔗 Funder"));
    }

    #[test]
    fn test_fresh_wallet_list_is_truncated() {
        let names: Vec<String> = (0..12).map(|i| format!("W{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let listed = wallet_list(&wallets(&refs));

        assert!(listed.starts_with("`W00`, `W01`"));
        assert!(listed.contains("`W09`"));
        assert!(!listed.contains("`W10`"));
        assert!(listed.ends_with("+2 more"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(1_500.0), "1.50K");
        assert_eq!(format_amount(2_000_000.0), "2.00M");
        assert_eq!(format_amount(3_100_000_000.0), "3.10B");
    }
}
