//! Diamond conversion.
//!
//! Creator payouts settle in Diamonds, a discrete virtual currency worth
//! $0.01 each. Conversion always floors so the platform can never over-pay;
//! the sub-diamond remainder is reported as a deferred amount (it is not
//! carried into a future period).

use serde::{Deserialize, Serialize};

/// USD value of one Diamond.
pub const DIAMOND_USD: f64 = 0.01;

/// Round to two decimal places, half away from zero.
///
/// This mirrors the rounding the rest of the payout pipeline uses for USD
/// amounts; changing it would shift diamond counts at period boundaries.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of converting a USD amount into whole Diamonds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiamondConversion {
    /// Whole diamonds granted.
    pub diamonds: u64,
    /// USD value of the granted diamonds.
    pub diamonds_usd: f64,
    /// USD lost to floor rounding, always `>= 0`.
    pub deferred_usd: f64,
}

impl DiamondConversion {
    /// Convert a (already round2-ed) USD amount into whole diamonds.
    pub fn convert(scaled_usd: f64) -> Self {
        let raw = scaled_usd / DIAMOND_USD;
        let diamonds = raw.floor().max(0.0) as u64;
        let diamonds_usd = round2(diamonds as f64 * DIAMOND_USD);
        let deferred_usd = round2(scaled_usd - diamonds_usd).max(0.0);
        Self {
            diamonds,
            diamonds_usd,
            deferred_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_amount() {
        let c = DiamondConversion::convert(500.0);
        assert_eq!(c.diamonds, 50_000);
        assert_eq!(c.diamonds_usd, 500.0);
        assert_eq!(c.deferred_usd, 0.0);
    }

    #[test]
    fn test_zero() {
        let c = DiamondConversion::convert(0.0);
        assert_eq!(c.diamonds, 0);
        assert_eq!(c.deferred_usd, 0.0);
    }

    #[test]
    fn test_floor_keeps_remainder() {
        // $133.33 -> 13,333 diamonds, nothing deferred (exact cent amount)
        let c = DiamondConversion::convert(133.33);
        assert_eq!(c.diamonds, 13_333);
        assert_eq!(c.diamonds_usd, 133.33);
        assert_eq!(c.deferred_usd, 0.0);
    }

    #[test]
    fn test_deferred_never_negative() {
        for usd in [0.0, 0.004, 0.01, 1.005, 266.67, 99999.99] {
            let c = DiamondConversion::convert(round2(usd));
            assert!(c.deferred_usd >= 0.0, "deferred negative for {usd}");
            assert!(c.deferred_usd < DIAMOND_USD + 1e-9);
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(133.333333), 133.33);
        assert_eq!(round2(266.666666), 266.67);
        assert_eq!(round2(0.0), 0.0);
    }
}
