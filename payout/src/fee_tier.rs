//! Platform fee tiers.
//!
//! The platform takes a cut of every tip, expressed in basis points and
//! chosen from a cliff-edge schedule over the creator's trailing monthly
//! gross:
//!
//! | Trailing gross (month to date) | Fee    |
//! |--------------------------------|--------|
//! | under $1,000                   | 5%     |
//! | $1,000 to under $10,000        | 10%    |
//! | $10,000 and up                 | 15%    |
//!
//! The tier is evaluated on gross accumulated strictly *before* the tip
//! being priced, so a single large tip is always charged at the tier the
//! creator was already in. Callers resolve the tier first, then hand the
//! resulting bps to the transfer engine.

/// Fee rate as basis points (1/10000). 10000 = 100%, 100 = 1%.
///
/// Integer bps avoid floating-point drift in fee computation.
pub type FeeRateBps = u32;

/// Tier boundaries, in cents of trailing monthly gross.
const TIER_MID_CENTS: i64 = 100_000; // $1,000
const TIER_TOP_CENTS: i64 = 1_000_000; // $10,000

/// Fee rates per tier.
const TIER_LOW_BPS: FeeRateBps = 500;
const TIER_MID_BPS: FeeRateBps = 1000;
const TIER_TOP_BPS: FeeRateBps = 1500;

/// Resolve the platform fee rate for a creator's trailing monthly gross.
///
/// Non-decreasing in `monthly_gross_cents`; negative gross (possible only
/// through manual adjustments) falls into the lowest tier.
pub fn resolve_fee_bps(monthly_gross_cents: i64) -> FeeRateBps {
    if monthly_gross_cents < TIER_MID_CENTS {
        TIER_LOW_BPS
    } else if monthly_gross_cents < TIER_TOP_CENTS {
        TIER_MID_BPS
    } else {
        TIER_TOP_BPS
    }
}

/// Clamp a caller-supplied fee rate into the valid `[0, 10000]` range.
///
/// Out-of-range values are clamped rather than rejected; they are never
/// passed through raw.
pub fn clamp_fee_bps(fee_bps: i64) -> FeeRateBps {
    fee_bps.clamp(0, 10_000) as FeeRateBps
}
