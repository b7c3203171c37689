// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::common::units::from_base_units;
use crate::data::abi::ERC20;
use crate::domain::token::Token;
use crate::network::provider::HttpProvider;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use std::time::Duration;

/// Point-in-time view of the wallet, in human units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Balances {
    pub mon: f64,
    pub usdc: f64,
}

/// Reads wallet balances for one account. No caching: the session re-reads
/// before every selection and the executor re-checks before every swap.
#[derive(Clone)]
pub struct BalanceBook {
    provider: HttpProvider,
    wallet: Address,
}

impl BalanceBook {
    pub fn new(provider: HttpProvider, wallet: Address) -> Self {
        Self { provider, wallet }
    }

    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Raw balance of a token in base units.
    pub async fn raw_of(&self, token: Token) -> Result<U256, AppError> {
        match token.address() {
            None => self.native_raw().await,
            Some(addr) => self.erc20_raw(addr).await,
        }
    }

    /// Human-unit balance of a token.
    pub async fn of(&self, token: Token) -> Result<f64, AppError> {
        let raw = self.raw_of(token).await?;
        Ok(from_base_units(raw, token.decimals()))
    }

    pub async fn snapshot(&self) -> Result<Balances, AppError> {
        Ok(Balances {
            mon: self.of(Token::Mon).await?,
            usdc: self.of(Token::Usdc).await?,
        })
    }

    async fn native_raw(&self) -> Result<U256, AppError> {
        let provider = self.provider.clone();
        let addr = self.wallet;
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_balance(addr).await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Balance check failed: {}", e)))
    }

    async fn erc20_raw(&self, token: Address) -> Result<U256, AppError> {
        let contract = ERC20::new(token, self.provider.clone());
        let wallet = self.wallet;
        retry_async(
            move |_| {
                let contract = contract.clone();
                async move { contract.balanceOf(wallet).call().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Token balance failed: {}", e)))
    }
}
