// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::U256;

/// Convert a human-readable amount into base units for a token with the
/// given decimal precision. Negative or non-finite inputs clamp to zero.
pub fn to_base_units(amount: f64, decimals: u8) -> U256 {
    if !amount.is_finite() || amount <= 0.0 {
        return U256::ZERO;
    }
    let scale = 10f64.powi(decimals as i32);
    let scaled = (amount * scale).round();
    if scaled >= u128::MAX as f64 {
        return U256::from(u128::MAX);
    }
    U256::from(scaled as u128)
}

/// Convert base units back into a human-readable amount. Values beyond
/// u128 clamp rather than panic; display precision is f64-bounded.
pub fn from_base_units(raw: U256, decimals: u8) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let num: u128 = raw.try_into().unwrap_or(u128::MAX);
    num as f64 / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_diff(raw: u128, decimals: u8) -> u128 {
        let raw = U256::from(raw);
        let back = to_base_units(from_base_units(raw, decimals), decimals);
        if back > raw {
            (back - raw).to::<u128>()
        } else {
            (raw - back).to::<u128>()
        }
    }

    #[test]
    fn usdc_roundtrip_is_exact_for_moderate_amounts() {
        assert_eq!(roundtrip_diff(123_456_789, 6), 0); // 123.456789 USDC
        assert_eq!(roundtrip_diff(10_000, 6), 0);
        assert_eq!(roundtrip_diff(1, 6), 0);
    }

    #[test]
    fn mon_roundtrip_stays_within_float_precision() {
        // 1.5 MON is exactly representable.
        assert_eq!(roundtrip_diff(1_500_000_000_000_000_000, 18), 0);
        // ~0.9876 MON needs more mantissa bits than f64 carries; the
        // round-trip may drift by a few hundred wei but no more.
        assert!(roundtrip_diff(987_654_321_000_000_000, 18) < 1_000);
    }

    #[test]
    fn degenerate_amounts_clamp_to_zero() {
        assert_eq!(to_base_units(-1.0, 18), U256::ZERO);
        assert_eq!(to_base_units(f64::NAN, 18), U256::ZERO);
        assert_eq!(to_base_units(0.0, 6), U256::ZERO);
    }

    #[test]
    fn human_conversion_matches_decimals() {
        assert_eq!(to_base_units(0.5, 18), U256::from(500_000_000_000_000_000u128));
        assert_eq!(to_base_units(2.25, 6), U256::from(2_250_000u64));
        let half = from_base_units(U256::from(500_000u64), 6);
        assert!((half - 0.5).abs() < 1e-12);
    }
}
