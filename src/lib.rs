// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle Scanner - coordinated buy detection for Solana tokens.

pub mod amount;
pub mod analyzer;
pub mod bundles;
pub mod classifier;
pub mod config;
pub mod error;
pub mod holdings;
pub mod paginator;
pub mod providers;
pub mod report;
pub mod telegram;
pub mod types;

pub use analyzer::{Analyzer, AnalyzerSettings};
pub use error::{AnalysisError, AnalysisResult};
pub use types::{Bundle, Metrics, TokenInfo, Venue};
