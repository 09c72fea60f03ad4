// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Solana JSON-RPC chain reader.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::dexscreener::DexScreenerClient;
use super::{ChainReader, TokenMetadata};
use crate::amount::deserialize_raw_amount;
use crate::error::{AnalysisError, AnalysisResult};

const SOURCE: &str = "solana-rpc";

/// JSON-RPC "invalid params". `getTokenSupply` answers it for a non-mint.
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

impl<T> JsonRpcResponse<T> {
    /// Turn an RPC-level error into `UpstreamUnavailable`.
    fn into_result(self, method: &str) -> AnalysisResult<Option<T>> {
        match self.error {
            Some(error) => Err(AnalysisError::upstream(
                SOURCE,
                format!("{} failed: {} - {}", method, error.code, error.message),
            )),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    #[serde(deserialize_with = "deserialize_raw_amount")]
    amount: U256,
    decimals: u8,
}

#[derive(Debug, Deserialize)]
struct KeyedTokenAccount {
    account: TokenAccount,
}

#[derive(Debug, Deserialize)]
struct TokenAccount {
    data: TokenAccountData,
}

#[derive(Debug, Deserialize)]
struct TokenAccountData {
    parsed: ParsedTokenAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
struct TokenAccountInfo {
    #[serde(rename = "tokenAmount")]
    token_amount: TokenAmount,
}

/// One entry of `getSignaturesForAddress`, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
}

/// The subset of a `jsonParsed` transaction the funding scan reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTransaction {
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    pub transaction: TransactionBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBody {
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedInstruction {
    pub program: Option<String>,
    pub parsed: Option<serde_json::Value>,
}

pub struct SolanaRpcClient {
    http: reqwest::Client,
    url: String,
    prices: Option<DexScreenerClient>,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        prices: Option<DexScreenerClient>,
    ) -> AnalysisResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            prices,
            next_id: AtomicU64::new(1),
        })
    }

    /// Post one request and decode the envelope without judging it.
    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AnalysisResult<JsonRpcResponse<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.http.post(&self.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::upstream(
                SOURCE,
                format!("{} returned HTTP {}", method, status),
            ));
        }

        Ok(response.json().await?)
    }

    /// Issue a JSON-RPC call whose result may legitimately be `null`.
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AnalysisResult<Option<T>> {
        self.send(method, params).await?.into_result(method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AnalysisResult<T> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| {
                AnalysisError::upstream(SOURCE, format!("{} returned no result", method))
            })
    }

    /// Most recent signatures of `address`, newest first.
    pub async fn get_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> AnalysisResult<Vec<SignatureInfo>> {
        self.call(
            "getSignaturesForAddress",
            json!([address, { "limit": limit }]),
        )
        .await
    }

    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> AnalysisResult<Option<ParsedTransaction>> {
        self.call_optional(
            "getTransaction",
            json!([
                signature,
                { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
            ]),
        )
        .await
    }
}

#[async_trait]
impl ChainReader for SolanaRpcClient {
    async fn get_token_metadata(&self, token: &str) -> AnalysisResult<TokenMetadata> {
        let response = self.send("getTokenSupply", json!([token])).await?;
        let supply = supply_from_response(token, response)?;

        let quote = match &self.prices {
            Some(prices) => match prices.fetch_quote(token).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!("⚠️ Price lookup failed for {}: {}", token, e);
                    None
                }
            },
            None => None,
        };

        let (symbol, price_usd, price_in_sol) = match quote {
            Some(q) => (q.symbol, q.price_usd, q.price_in_sol),
            None => ("UNKNOWN".to_string(), 0.0, 0.0),
        };

        debug!(
            "Token {} supply {} ({} decimals)",
            token, supply.amount, supply.decimals
        );

        Ok(TokenMetadata {
            symbol,
            decimals: supply.decimals,
            total_supply: Some(supply.amount),
            price_usd,
            price_in_sol,
        })
    }

    async fn get_token_account_balances(
        &self,
        wallet: &str,
        token: &str,
    ) -> AnalysisResult<Vec<U256>> {
        let accounts: WithContext<Vec<KeyedTokenAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([wallet, { "mint": token }, { "encoding": "jsonParsed" }]),
            )
            .await
            .map_err(|e| AnalysisError::lookup(wallet, e))?;

        Ok(accounts
            .value
            .into_iter()
            .map(|a| a.account.data.parsed.info.token_amount.amount)
            .collect())
    }

    async fn get_signature_count(&self, wallet: &str, limit: usize) -> AnalysisResult<usize> {
        let signatures = self
            .get_signatures(wallet, limit)
            .await
            .map_err(|e| AnalysisError::lookup(wallet, e))?;
        Ok(signatures.len())
    }
}

/// An address the node refuses as a mint is malformed input, not an outage.
fn supply_from_response(
    token: &str,
    response: JsonRpcResponse<WithContext<TokenAmount>>,
) -> AnalysisResult<TokenAmount> {
    if let Some(error) = &response.error {
        if error.code == INVALID_PARAMS {
            return Err(AnalysisError::malformed(token, error.message.clone()));
        }
    }
    response
        .into_result("getTokenSupply")?
        .map(|supply| supply.value)
        .ok_or_else(|| AnalysisError::upstream(SOURCE, "getTokenSupply returned no result"))
}
