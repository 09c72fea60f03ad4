// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads settings from environment variables.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::analyzer::AnalyzerSettings;

/// Main configuration for the bundle scanner.
#[derive(Debug, Clone)]
pub struct Config {
    // Upstreams
    pub solana_rpc_url: String,
    pub pump_fun_api_url: String,
    pub birdeye_api_url: String,
    pub birdeye_api_key: Option<String>,
    pub dexscreener_api_url: String,
    pub http_timeout_secs: u64,

    // Trade history
    pub trade_record_cap: usize,
    pub trade_page_size: usize,

    // Classification
    pub fresh_wallet_max_signatures: usize,
    pub funding_scan_limit: usize,
    pub funding_tx_inspect: usize,
    pub funder_labels: HashMap<String, String>,

    // Fan-out
    pub max_concurrent_lookups: usize,

    // Telegram
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Upstreams
            solana_rpc_url: env_var("SOLANA_RPC_URL")?,
            pump_fun_api_url: env_var_or("PUMP_FUN_API_URL", "https://frontend-api-v3.pump.fun"),
            birdeye_api_url: env_var_or("BIRDEYE_API_URL", "https://public-api.birdeye.so"),
            birdeye_api_key: optional_var("BIRDEYE_API_KEY"),
            dexscreener_api_url: env_var_or("DEXSCREENER_API_URL", "https://api.dexscreener.com"),
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 15),

            // Trade history
            trade_record_cap: parse_or("TRADE_RECORD_CAP", 50_000),
            trade_page_size: parse_or("TRADE_PAGE_SIZE", 200),

            // Classification
            fresh_wallet_max_signatures: parse_or("FRESH_WALLET_MAX_SIGNATURES", 10),
            funding_scan_limit: parse_or("FUNDING_SCAN_LIMIT", 100),
            funding_tx_inspect: parse_or("FUNDING_TX_INSPECT", 5),
            funder_labels: parse_funder_labels(&env_var_or("FUNDER_LABELS", "")),

            // Fan-out
            max_concurrent_lookups: parse_or("MAX_CONCURRENT_LOOKUPS", 16),

            // Telegram
            telegram_bot_token: optional_var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: optional_var("TELEGRAM_CHAT_ID"),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            page_size: self.trade_page_size.max(1),
            fresh_max_signatures: self.fresh_wallet_max_signatures,
            max_concurrent_lookups: self.max_concurrent_lookups.max(1),
        }
    }
}

fn env_var(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{} not set", name))
}

fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank both read as absent.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    parse_value(std::env::var(name).ok().as_deref(), default)
}

fn parse_value<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parse `address=label,address=label`. Malformed entries are skipped.
fn parse_funder_labels(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (address, label) = entry.split_once('=')?;
            let (address, label) = (address.trim(), label.trim());
            if address.is_empty() || label.is_empty() {
                return None;
            }
            Some((address.to_string(), label.to_string()))
        })
        .collect()
}
