// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::token::Token;
use alloy::primitives::B256;

/// One swap the session has decided to perform. Amount is in human units
/// of the source token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapIntent {
    pub from: Token,
    pub to: Token,
    pub amount: f64,
}

impl SwapIntent {
    pub fn new(from: Token, amount: f64) -> Self {
        Self {
            from,
            to: from.other(),
            amount,
        }
    }
}

/// Result of one swap as reported back to the session. Failures carry a
/// human-readable description instead of an error type; nothing past the
/// executor needs to match on the cause.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub success: bool,
    pub tx_hash: Option<B256>,
    pub from: Token,
    pub to: Token,
    pub amount_in: f64,
    pub expected_out: f64,
    pub gas_used: Option<u64>,
    pub error: Option<String>,
}

impl SwapOutcome {
    pub fn confirmed(intent: &SwapIntent, hash: B256, expected_out: f64, gas_used: u64) -> Self {
        Self {
            success: true,
            tx_hash: Some(hash),
            from: intent.from,
            to: intent.to,
            amount_in: intent.amount,
            expected_out,
            gas_used: Some(gas_used),
            error: None,
        }
    }

    pub fn failed(intent: &SwapIntent, error: &AppError) -> Self {
        Self {
            success: false,
            tx_hash: None,
            from: intent.from,
            to: intent.to,
            amount_in: intent.amount,
            expected_out: 0.0,
            gas_used: None,
            error: Some(error.to_string()),
        }
    }
}

/// Map a receipt status onto the attempt result. A reverted receipt is an
/// error so the retry loop treats it like any other failed attempt.
pub fn settle_receipt(status: bool, hash: B256) -> Result<B256, AppError> {
    if status {
        Ok(hash)
    } else {
        Err(AppError::Reverted {
            hash: format!("{hash:#x}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent() -> SwapIntent {
        SwapIntent::new(Token::Mon, 0.25)
    }

    #[test]
    fn successful_receipt_yields_success_with_hash() {
        let hash = B256::from([7u8; 32]);
        let settled = settle_receipt(true, hash).expect("status 1 settles");
        let outcome = SwapOutcome::confirmed(&intent(), settled, 0.41, 150_000);
        assert!(outcome.success);
        assert_eq!(outcome.tx_hash, Some(hash));
        assert_eq!(outcome.gas_used, Some(150_000));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn reverted_receipt_becomes_failure_outcome() {
        let hash = B256::from([9u8; 32]);
        let err = settle_receipt(false, hash).unwrap_err();
        let outcome = SwapOutcome::failed(&intent(), &err);
        assert!(!outcome.success);
        assert!(outcome.tx_hash.is_none());
        assert!(outcome.error.as_deref().unwrap_or("").contains("reverted"));
    }

    #[test]
    fn intent_destination_is_the_counterpart() {
        let intent = SwapIntent::new(Token::Usdc, 1.0);
        assert_eq!(intent.to, Token::Mon);
    }
}
