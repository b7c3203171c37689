// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::{FALLBACK_BASE_FEE_WEI, FALLBACK_PRIORITY_FEE_WEI};
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct GasOracle {
    provider: HttpProvider,
    last_good: Arc<Mutex<Option<GasFees>>>,
}

#[derive(Debug, Clone)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub base_fee_per_gas: u128,
}

impl GasOracle {
    pub fn new(provider: HttpProvider) -> Self {
        Self {
            provider,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    /// EIP-1559 fee parameters: the latest block's base fee plus the node's
    /// priority-fee suggestion. Falls back to the last good sample when the
    /// RPC is flaky mid-session.
    pub async fn current_fees(&self) -> Result<GasFees, AppError> {
        match self.sample().await {
            Ok(fees) => {
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(fees.clone());
                }
                Ok(fees)
            }
            Err(e) => {
                if let Ok(guard) = self.last_good.lock()
                    && let Some(fees) = guard.clone()
                {
                    tracing::warn!(target: "gas", error = %e, "Fee sample failed; reusing last good fees");
                    return Ok(fees);
                }
                Err(e)
            }
        }
    }

    async fn sample(&self) -> Result<GasFees, AppError> {
        let provider = self.provider.clone();
        let block = retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_block_by_number(BlockNumberOrTag::Latest).await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Latest block fetch failed: {}", e)))?;

        let base: u128 = block
            .as_ref()
            .and_then(|b| b.header.base_fee_per_gas)
            .map(|v| v as u128)
            .unwrap_or(FALLBACK_BASE_FEE_WEI);

        let priority: u128 = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(FALLBACK_PRIORITY_FEE_WEI);

        Ok(compose_fees(base, priority))
    }
}

fn compose_fees(base: u128, priority: u128) -> GasFees {
    GasFees {
        max_fee_per_gas: base.saturating_add(priority),
        max_priority_fee_per_gas: priority,
        base_fee_per_gas: base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_fee_is_base_plus_priority() {
        let fees = compose_fees(50_000_000_000, 2_000_000_000);
        assert_eq!(fees.max_fee_per_gas, 52_000_000_000);
        assert_eq!(fees.max_priority_fee_per_gas, 2_000_000_000);
        assert_eq!(fees.base_fee_per_gas, 50_000_000_000);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let fees = compose_fees(u128::MAX, 1);
        assert_eq!(fees.max_fee_per_gas, u128::MAX);
    }
}
