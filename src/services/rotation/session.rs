// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::token::Token;
use crate::services::rotation::balances::Balances;
use crate::services::rotation::executor::SwapExecutor;
use crate::services::rotation::outcome::SwapIntent;
use rand::Rng;
use std::time::Duration;

/// Session knobs, fixed at construction from the loaded settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub number_of_swaps: (u32, u32),
    pub pause_between_swaps: (u64, u64),
    pub percent_of_balance: (f64, f64),
    pub explorer_url: String,
}

/// What the selection step decided for this iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Both sides are below their minimums; the session ends early.
    Depleted,
    /// The drawn amount is below the dust threshold; skip this iteration.
    Dust { token: Token, amount: f64 },
    /// A swap worth performing.
    Swap(SwapIntent),
}

/// Pick a direction and amount from live balances. A side below its
/// minimum is never chosen; when both qualify a fair coin decides. The
/// amount is a random percentage of the chosen side's balance.
pub fn select_intent<R: Rng>(
    balances: &Balances,
    percent_range: (f64, f64),
    rng: &mut R,
) -> Selection {
    let mon_spendable = balances.mon >= Token::Mon.dust_threshold();
    let usdc_spendable = balances.usdc >= Token::Usdc.dust_threshold();
    if !mon_spendable && !usdc_spendable {
        return Selection::Depleted;
    }

    let sell_mon = mon_spendable && (!usdc_spendable || rng.random_bool(0.5));
    let (from, side_balance) = if sell_mon {
        (Token::Mon, balances.mon)
    } else {
        (Token::Usdc, balances.usdc)
    };

    let (lo, hi) = percent_range;
    let percent = rng.random_range(lo..=hi.max(lo));
    let amount = side_balance * (percent / 100.0);
    if amount < from.dust_threshold() {
        return Selection::Dust {
            token: from,
            amount,
        };
    }

    Selection::Swap(SwapIntent::new(from, amount))
}

/// Drives one account through a randomized run of swaps: refresh balances,
/// select, execute, pause, repeat.
pub struct SessionDriver {
    executor: SwapExecutor,
    settings: SessionSettings,
    account_index: usize,
}

impl SessionDriver {
    pub fn new(executor: SwapExecutor, settings: SessionSettings, account_index: usize) -> Self {
        Self {
            executor,
            settings,
            account_index,
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let swap_count = draw_swap_count(self.settings.number_of_swaps);
        tracing::info!(
            target: "session",
            account = self.account_index,
            swap_count,
            "Starting swap rotation"
        );

        let mut executed = 0u32;
        for swap_num in 1..=swap_count {
            let balances = match self.executor.balances().snapshot().await {
                Ok(b) => b,
                Err(e) => {
                    // A dead RPC reads as empty balances and flows into the
                    // depletion check instead of killing the session.
                    tracing::error!(
                        target: "session",
                        account = self.account_index,
                        error = %e,
                        "Balance refresh failed"
                    );
                    Balances::default()
                }
            };
            tracing::info!(
                target: "session",
                account = self.account_index,
                swap_num,
                of = swap_count,
                mon = balances.mon,
                usdc = balances.usdc,
                "Selecting swap"
            );

            let selection = {
                let mut rng = rand::rng();
                select_intent(&balances, self.settings.percent_of_balance, &mut rng)
            };
            match selection {
                Selection::Depleted => {
                    tracing::warn!(
                        target: "session",
                        account = self.account_index,
                        "Both balances below minimums; ending session early"
                    );
                    break;
                }
                Selection::Dust { token, amount } => {
                    tracing::warn!(
                        target: "session",
                        account = self.account_index,
                        swap_num,
                        %token,
                        amount,
                        "Amount below dust threshold; skipping"
                    );
                    continue;
                }
                Selection::Swap(intent) => {
                    tracing::info!(
                        target: "session",
                        account = self.account_index,
                        swap_num,
                        from = %intent.from,
                        to = %intent.to,
                        amount = intent.amount,
                        "Executing swap"
                    );
                    let outcome = self.executor.swap(&intent).await;
                    executed += 1;
                    if outcome.success {
                        let hash = outcome
                            .tx_hash
                            .map(|h| format!("{h:#x}"))
                            .unwrap_or_default();
                        tracing::info!(
                            target: "session",
                            account = self.account_index,
                            swap_num,
                            amount_in = outcome.amount_in,
                            expected_out = outcome.expected_out,
                            tx = %format!("{}{}", self.settings.explorer_url, hash),
                            "Swap confirmed"
                        );
                    } else {
                        tracing::error!(
                            target: "session",
                            account = self.account_index,
                            swap_num,
                            error = outcome.error.as_deref().unwrap_or("unknown"),
                            "Swap failed"
                        );
                    }
                }
            }

            if swap_num < swap_count {
                let pause = draw_secs(self.settings.pause_between_swaps);
                tracing::info!(
                    target: "session",
                    account = self.account_index,
                    pause_secs = pause,
                    "Pausing before next swap"
                );
                tokio::time::sleep(Duration::from_secs(pause)).await;
            }
        }

        tracing::info!(
            target: "session",
            account = self.account_index,
            executed,
            "Swap rotation finished"
        );
        Ok(())
    }
}

fn draw_swap_count((lo, hi): (u32, u32)) -> u32 {
    let mut rng = rand::rng();
    rng.random_range(lo..=hi.max(lo))
}

fn draw_secs((lo, hi): (u64, u64)) -> u64 {
    let mut rng = rand::rng();
    rng.random_range(lo..=hi.max(lo))
}
