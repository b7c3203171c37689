// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Insufficient balance. Required: {required} {token}, Available: {available} {token}")]
    InsufficientBalance {
        token: String,
        required: String,
        available: String,
    },

    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("Transaction {hash} reverted on-chain")]
    Reverted { hash: String },

    #[error("Approval failed for {token}: {reason}")]
    Approval { token: String, reason: String },

    #[error("All {attempts} swap attempts failed. Last error: {last}")]
    RetriesExhausted { attempts: usize, last: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Terminal errors are not worth another attempt; re-reading the chain
    /// cannot change them within a single session iteration.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppError::InsufficientBalance { .. })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
