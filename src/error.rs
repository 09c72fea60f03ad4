// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error taxonomy for an analysis call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A provider or chain reader call failed outright. Aborts the analysis.
    #[error("{source_name} unavailable: {message}")]
    UpstreamUnavailable {
        source_name: String,
        message: String,
    },

    /// Required token metadata is missing or unusable.
    #[error("malformed token {token}: {reason}")]
    MalformedToken { token: String, reason: String },

    /// A single wallet lookup failed. Absorbed by the caller.
    #[error("lookup for wallet {wallet} failed: {message}")]
    PartialLookupFailure { wallet: String, message: String },
}

impl AnalysisError {
    pub fn upstream(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::UpstreamUnavailable {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn lookup(wallet: impl Into<String>, message: impl ToString) -> Self {
        Self::PartialLookupFailure {
            wallet: wallet.into(),
            message: message.to_string(),
        }
    }

    /// Whether the presentation layer should ask the user to retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::MalformedToken { .. }
        )
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        let source_name = err
            .url()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());
        Self::upstream(source_name, err)
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
