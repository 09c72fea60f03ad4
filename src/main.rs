// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle Scanner - reports coordinated buys for a Solana token.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bundle_scanner::config::Config;
use bundle_scanner::providers::dexscreener::DexScreenerClient;
use bundle_scanner::providers::{BirdeyeClient, PumpFunClient, RpcFundingResolver, SolanaRpcClient};
use bundle_scanner::report::{format_error, format_metrics};
use bundle_scanner::telegram::TelegramNotifier;
use bundle_scanner::Analyzer;

#[derive(Parser)]
#[command(about = "Detect bundled buys of a Solana token and report current holdings")]
struct Cli {
    /// Token mint address
    token: String,

    /// Only report bundles containing team wallets (fresh or commonly funded)
    #[arg(long)]
    team: bool,

    /// Maximum trade records to pull (overrides TRADE_RECORD_CAP)
    #[arg(long)]
    cap: Option<usize>,

    /// Also deliver the report via Telegram
    #[arg(long)]
    notify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow!(e)).context("loading configuration")?;

    info!("🚀 Bundle Scanner starting...");
    info!("📡 RPC: {}", config.solana_rpc_url);

    let timeout = config.http_timeout();
    let prices = DexScreenerClient::new(&config.dexscreener_api_url, timeout)?;
    let rpc = Arc::new(SolanaRpcClient::new(
        &config.solana_rpc_url,
        timeout,
        Some(prices),
    )?);
    let pump_fun = Arc::new(PumpFunClient::new(&config.pump_fun_api_url, timeout)?);
    let birdeye = Arc::new(BirdeyeClient::new(
        &config.birdeye_api_url,
        config.birdeye_api_key.clone(),
        timeout,
    )?);
    let funding = Arc::new(RpcFundingResolver::new(
        rpc.clone(),
        config.funding_scan_limit,
        config.funding_tx_inspect,
        config.funder_labels.clone(),
    ));

    let analyzer = Analyzer::new(
        pump_fun.clone(),
        birdeye,
        pump_fun,
        rpc,
        funding,
        config.analyzer_settings(),
    );

    let telegram = if cli.notify {
        TelegramNotifier::new(config.telegram_bot_token.clone(), config.telegram_chat_id.clone())
    } else {
        TelegramNotifier::new(None, None)
    };

    let record_cap = cli.cap.unwrap_or(config.trade_record_cap);
    let result = analyzer.analyze(&cli.token, record_cap, cli.team).await;

    let message = match &result {
        Ok(metrics) => format_metrics(metrics),
        Err(e) => {
            error!("❌ Analysis of {} failed: {}", cli.token, e);
            format_error(&cli.token, e)
        }
    };

    println!("{}", message);
    telegram.send_report(&message).await;

    result?;
    Ok(())
}
