// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::primitives::{Address, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10143;

pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_EXPLORER_URL: &str = "https://testnet.monadexplorer.com/tx/";

// =============================================================================
// CONTRACT ADDRESSES (Monad testnet)
// =============================================================================

pub const ROUTER_CONTRACT: Address = address!("64Aff7245EbdAAECAf266852139c67E4D8DBa4de");
pub const WMON_CONTRACT: Address = address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701");
pub const USDC_CONTRACT: Address = address!("f817257fed379853cde0fa4f97ab987181b1e5ea");

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

/// Safety buffer applied on top of eth_estimateGas results.
pub const GAS_LIMIT_MULTIPLIER_BPS: u64 = 12_000;

/// Fallbacks for nodes that omit fee fields. Monad testnet pins its base
/// fee at 50 gwei.
pub const FALLBACK_BASE_FEE_WEI: u128 = 50_000_000_000;
pub const FALLBACK_PRIORITY_FEE_WEI: u128 = 2_000_000_000;

/// Seconds a swap transaction stays valid after submission.
pub const SWAP_DEADLINE_SECS: u64 = 600;

// =============================================================================
// SESSION THRESHOLDS (human units)
// =============================================================================

/// Smallest MON amount worth swapping; below this a side is not spendable.
pub const MIN_MON_SWAP: f64 = 0.001;
/// Smallest USDC amount worth swapping.
pub const MIN_USDC_SWAP: f64 = 0.01;
