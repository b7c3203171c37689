// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::{
    CHAIN_MONAD_TESTNET, GAS_LIMIT_MULTIPLIER_BPS, ROUTER_CONTRACT, SWAP_DEADLINE_SECS,
};
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::common::units::{from_base_units, to_base_units};
use crate::data::abi::{CrystalRouter, ERC20};
use crate::domain::token::{Token, swap_path};
use crate::network::gas::{GasFees, GasOracle};
use crate::network::nonce::NonceManager;
use crate::network::provider::HttpProvider;
use crate::services::rotation::balances::BalanceBook;
use crate::services::rotation::outcome::{SwapIntent, SwapOutcome, settle_receipt};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use rand::Rng;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Executor knobs, fixed at construction from the loaded settings.
#[derive(Debug, Clone)]
pub struct ExecutorTuning {
    pub attempts: usize,
    pub pause_between_attempts: (u64, u64),
    pub slippage_bps: u64,
    pub receipt_poll_ms: u64,
    pub receipt_timeout_ms: u64,
}

/// Executes one swap at a time for a single account: balance re-check,
/// quote, allowance, gas, sign, broadcast, receipt. Not designed for
/// concurrent reuse; each account gets its own instance.
pub struct SwapExecutor {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    gas: GasOracle,
    nonce: NonceManager,
    balances: BalanceBook,
    tuning: ExecutorTuning,
    account_index: usize,
}

struct ConfirmedSwap {
    hash: B256,
    expected_out: U256,
    gas_used: u64,
}

impl SwapExecutor {
    pub fn new(
        provider: HttpProvider,
        signer: PrivateKeySigner,
        tuning: ExecutorTuning,
        account_index: usize,
    ) -> Self {
        let wallet = signer.address();
        Self {
            gas: GasOracle::new(provider.clone()),
            nonce: NonceManager::new(provider.clone(), wallet),
            balances: BalanceBook::new(provider.clone(), wallet),
            provider,
            signer,
            tuning,
            account_index,
        }
    }

    pub fn balances(&self) -> &BalanceBook {
        &self.balances
    }

    /// Run a swap to completion. All failures fold into the outcome; this
    /// never raises to the session.
    pub async fn swap(&self, intent: &SwapIntent) -> SwapOutcome {
        if let Err(e) = validate_intent(intent) {
            return SwapOutcome::failed(intent, &e);
        }

        let mut last = String::from("no attempt completed");
        for attempt in 1..=self.tuning.attempts {
            match self.attempt_swap(intent).await {
                Ok(confirmed) => {
                    return SwapOutcome::confirmed(
                        intent,
                        confirmed.hash,
                        from_base_units(confirmed.expected_out, intent.to.decimals()),
                        confirmed.gas_used,
                    );
                }
                Err(e) if e.is_terminal() => {
                    tracing::warn!(
                        target: "executor",
                        account = self.account_index,
                        error = %e,
                        "Swap aborted"
                    );
                    return SwapOutcome::failed(intent, &e);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "executor",
                        account = self.account_index,
                        attempt,
                        of = self.tuning.attempts,
                        error = %e,
                        "Swap attempt failed"
                    );
                    last = e.to_string();
                    if attempt < self.tuning.attempts {
                        let backoff = draw_secs(self.tuning.pause_between_attempts);
                        tokio::time::sleep(Duration::from_secs(backoff)).await;
                    }
                }
            }
        }

        SwapOutcome::failed(
            intent,
            &AppError::RetriesExhausted {
                attempts: self.tuning.attempts,
                last,
            },
        )
    }

    async fn attempt_swap(&self, intent: &SwapIntent) -> Result<ConfirmedSwap, AppError> {
        let from = intent.from;
        let balance = self.balances.raw_of(from).await?;
        let amount_in = to_base_units(intent.amount, from.decimals());
        ensure_spendable(balance, amount_in, from)?;

        let expected_out = self.quote_expected_out(amount_in, swap_path(from)).await?;
        let min_out = apply_slippage(expected_out, self.tuning.slippage_bps);

        let fees = self.gas.current_fees().await?;
        if let Some(token_addr) = from.address() {
            self.ensure_allowance(from, token_addr, amount_in, &fees)
                .await?;
        }

        let deadline = current_unix().saturating_add(SWAP_DEADLINE_SECS);
        let (calldata, value) =
            build_swap_call(from, amount_in, min_out, self.signer.address(), deadline);
        let gas_limit = self
            .estimate_gas_with_buffer(ROUTER_CONTRACT, value, calldata.clone(), &fees)
            .await?;

        let hash = self
            .send_transaction(ROUTER_CONTRACT, value, calldata, gas_limit, &fees)
            .await?;
        tracing::info!(
            target: "executor",
            account = self.account_index,
            tx = %format!("{hash:#x}"),
            "Swap transaction broadcast"
        );

        let receipt = self.await_receipt(hash).await?;
        settle_receipt(receipt.status(), hash)?;

        Ok(ConfirmedSwap {
            hash,
            expected_out,
            gas_used: receipt.gas_used,
        })
    }

    async fn quote_expected_out(
        &self,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<U256, AppError> {
        let router = CrystalRouter::new(ROUTER_CONTRACT, self.provider.clone());
        let amounts: Vec<U256> = retry_async(
            move |_| {
                let c = router.clone();
                let p = path.clone();
                async move { c.getAmountsOut(amount_in, p).call().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Router quote failed: {}", e)))?;

        amounts
            .last()
            .copied()
            .ok_or_else(|| AppError::Connection("Router quote returned no amounts".into()))
    }

    /// Make sure the router may move `amount_in` of the token, issuing an
    /// unlimited approval first when the current allowance is short. The
    /// approval is confirmed before the swap proceeds.
    async fn ensure_allowance(
        &self,
        token: Token,
        token_addr: Address,
        amount_in: U256,
        fees: &GasFees,
    ) -> Result<(), AppError> {
        let erc20 = ERC20::new(token_addr, self.provider.clone());
        let owner = self.signer.address();
        let current: U256 = retry_async(
            move |_| {
                let c = erc20.clone();
                async move { c.allowance(owner, ROUTER_CONTRACT).call().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Allowance check failed: {}", e)))?;

        if current >= amount_in {
            return Ok(());
        }

        tracing::info!(
            target: "executor",
            account = self.account_index,
            token = %token,
            "Approving router to spend token"
        );

        let calldata = ERC20::approveCall {
            spender: ROUTER_CONTRACT,
            amount: U256::MAX,
        }
        .abi_encode();
        let gas_limit = self
            .estimate_gas_with_buffer(token_addr, U256::ZERO, calldata.clone(), fees)
            .await
            .map_err(|e| AppError::Approval {
                token: token.symbol().to_string(),
                reason: e.to_string(),
            })?;
        let hash = self
            .send_transaction(token_addr, U256::ZERO, calldata, gas_limit, fees)
            .await
            .map_err(|e| AppError::Approval {
                token: token.symbol().to_string(),
                reason: e.to_string(),
            })?;

        let receipt = self.await_receipt(hash).await?;
        if !receipt.status() {
            return Err(AppError::Approval {
                token: token.symbol().to_string(),
                reason: format!("approval {hash:#x} reverted"),
            });
        }

        tracing::info!(
            target: "executor",
            account = self.account_index,
            token = %token,
            tx = %format!("{hash:#x}"),
            "Approval confirmed"
        );
        Ok(())
    }

    async fn estimate_gas_with_buffer(
        &self,
        to: Address,
        value: U256,
        calldata: Vec<u8>,
        fees: &GasFees,
    ) -> Result<u64, AppError> {
        let request = TransactionRequest {
            from: Some(self.signer.address()),
            to: Some(TxKind::Call(to)),
            value: Some(value),
            input: TransactionInput::new(calldata.into()),
            max_fee_per_gas: Some(fees.max_fee_per_gas),
            max_priority_fee_per_gas: Some(fees.max_priority_fee_per_gas),
            chain_id: Some(CHAIN_MONAD_TESTNET),
            ..Default::default()
        };
        let estimated = self
            .provider
            .estimate_gas(request)
            .await
            .map_err(|e| AppError::GasEstimation(e.to_string()))?;
        Ok(scale_gas_limit(estimated))
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        calldata: Vec<u8>,
        gas_limit: u64,
        fees: &GasFees,
    ) -> Result<B256, AppError> {
        let nonce = self.nonce.next_nonce().await?;
        let mut tx = TxEip1559 {
            chain_id: CHAIN_MONAD_TESTNET,
            nonce,
            gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value,
            input: calldata.into(),
            ..Default::default()
        };
        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| AppError::Connection(format!("Transaction signing failed: {}", e)))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let raw = signed.encoded_2718();
        let hash = *signed.tx_hash();

        self.provider
            .send_raw_transaction(raw.as_slice())
            .await
            .map_err(|e| AppError::Connection(format!("Broadcast failed: {}", e)))?;
        Ok(hash)
    }

    async fn await_receipt(&self, hash: B256) -> Result<TransactionReceipt, AppError> {
        let deadline = Instant::now() + Duration::from_millis(self.tuning.receipt_timeout_ms);
        loop {
            if let Ok(Some(receipt)) = self.provider.get_transaction_receipt(hash).await {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(AppError::Connection(format!(
                    "No receipt for {hash:#x} within {}ms",
                    self.tuning.receipt_timeout_ms
                )));
            }
            tokio::time::sleep(Duration::from_millis(self.tuning.receipt_poll_ms)).await;
        }
    }
}

fn validate_intent(intent: &SwapIntent) -> Result<(), AppError> {
    if intent.from == intent.to {
        return Err(AppError::Config(format!(
            "Swap source and destination are both {}",
            intent.from
        )));
    }
    if !intent.amount.is_finite() || intent.amount <= 0.0 {
        return Err(AppError::Config(format!(
            "Swap amount must be positive, got {}",
            intent.amount
        )));
    }
    Ok(())
}

/// The balance re-check runs before any write call; a short balance means
/// zero broadcasts for this intent.
fn ensure_spendable(balance: U256, required: U256, token: Token) -> Result<(), AppError> {
    if balance < required {
        return Err(AppError::InsufficientBalance {
            token: token.symbol().to_string(),
            required: format!("{}", from_base_units(required, token.decimals())),
            available: format!("{}", from_base_units(balance, token.decimals())),
        });
    }
    Ok(())
}

pub fn apply_slippage(expected_out: U256, slippage_bps: u64) -> U256 {
    let bps = slippage_bps.min(10_000);
    expected_out.saturating_mul(U256::from(10_000 - bps)) / U256::from(10_000u64)
}

/// Calldata and native value for the router call: native sources pay value
/// and enter via swapExactETHForTokens, token sources pass the amount as a
/// parameter to swapExactTokensForETH.
pub fn build_swap_call(
    from: Token,
    amount_in: U256,
    min_out: U256,
    recipient: Address,
    deadline: u64,
) -> (Vec<u8>, U256) {
    let path = swap_path(from);
    if from.is_native() {
        let call = CrystalRouter::swapExactETHForTokensCall {
            amountOutMin: min_out,
            path,
            to: recipient,
            deadline: U256::from(deadline),
        };
        (call.abi_encode(), amount_in)
    } else {
        let call = CrystalRouter::swapExactTokensForETHCall {
            amountIn: amount_in,
            amountOutMin: min_out,
            path,
            to: recipient,
            deadline: U256::from(deadline),
        };
        (call.abi_encode(), U256::ZERO)
    }
}

pub fn scale_gas_limit(estimated: u64) -> u64 {
    estimated.saturating_mul(GAS_LIMIT_MULTIPLIER_BPS) / 10_000
}

fn draw_secs((lo, hi): (u64, u64)) -> u64 {
    let mut rng = rand::rng();
    rng.random_range(lo..=hi.max(lo))
}

fn current_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_balance_is_rejected_before_any_broadcast() {
        let balance = U256::from(400_000u64); // 0.4 USDC
        let required = U256::from(500_000u64); // 0.5 USDC
        let err = ensure_spendable(balance, required, Token::Usdc).unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { .. }));
        assert!(err.is_terminal());
    }

    #[test]
    fn exact_balance_is_spendable() {
        let amount = U256::from(1_000_000u64);
        assert!(ensure_spendable(amount, amount, Token::Usdc).is_ok());
    }

    #[test]
    fn slippage_reduces_minimum_output() {
        let expected = U256::from(10_000u64);
        assert_eq!(apply_slippage(expected, 50), U256::from(9_950u64));
        assert_eq!(apply_slippage(expected, 0), expected);
        // Absurd settings clamp to a zero floor rather than underflow.
        assert_eq!(apply_slippage(expected, 20_000), U256::ZERO);
    }

    #[test]
    fn gas_buffer_applies_twenty_percent() {
        assert_eq!(scale_gas_limit(100_000), 120_000);
        assert_eq!(scale_gas_limit(0), 0);
    }

    #[test]
    fn native_swap_carries_value_and_eth_entrypoint() {
        let (calldata, value) = build_swap_call(
            Token::Mon,
            U256::from(1_000_000_000_000_000_000u128),
            U256::from(990u64),
            Address::from([3u8; 20]),
            1_700_000_000,
        );
        assert_eq!(value, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(hex::encode(&calldata[..4]), "7ff36ab5");

        let decoded = CrystalRouter::swapExactETHForTokensCall::abi_decode(&calldata)
            .expect("decode swap call");
        assert_eq!(decoded.amountOutMin, U256::from(990u64));
        assert_eq!(decoded.path, swap_path(Token::Mon));
    }

    #[test]
    fn token_swap_passes_amount_as_parameter() {
        let (calldata, value) = build_swap_call(
            Token::Usdc,
            U256::from(5_000_000u64),
            U256::from(1u64),
            Address::from([4u8; 20]),
            1_700_000_000,
        );
        assert_eq!(value, U256::ZERO);
        assert_eq!(hex::encode(&calldata[..4]), "18cbafe5");

        let decoded = CrystalRouter::swapExactTokensForETHCall::abi_decode(&calldata)
            .expect("decode swap call");
        assert_eq!(decoded.amountIn, U256::from(5_000_000u64));
        assert_eq!(decoded.path, swap_path(Token::Usdc));
    }

    #[test]
    fn degenerate_intents_fail_validation() {
        let mut intent = SwapIntent::new(Token::Mon, 0.0);
        assert!(validate_intent(&intent).is_err());
        intent.amount = 1.0;
        intent.to = Token::Mon;
        assert!(validate_intent(&intent).is_err());
        let ok = SwapIntent::new(Token::Mon, 1.0);
        assert!(validate_intent(&ok).is_ok());
    }
}
