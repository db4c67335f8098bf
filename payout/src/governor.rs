//! Payout pool governor.
//!
//! Once per settlement period the platform allocates a capped revenue pool
//! across creators in proportion to their qualified (fraud-screened) views.
//! Locked rates: $500 per million qualified short-form views, $1,000 per
//! million qualified long-form views, with a global ceiling of 40% of
//! payout-eligible revenue. When total demand exceeds the ceiling, every
//! creator's base payout is scaled pro-rata by the same factor.
//!
//! The computation is single-shot and pure: it takes view statistics and a
//! revenue context and returns a [`PoolResult`]. Persisting the result (and
//! chaining it for audit) is the caller's job.

use serde::{Deserialize, Serialize};

use crate::diamond::{round2, DiamondConversion};

/// Settlement cadence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

/// USD rates per million qualified views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRates {
    /// USD per 1,000,000 qualified short-form views.
    #[serde(default = "default_per_million_short")]
    pub per_million_short_usd: f64,

    /// USD per 1,000,000 qualified long-form views.
    #[serde(default = "default_per_million_long")]
    pub per_million_long_usd: f64,
}

fn default_per_million_short() -> f64 {
    500.0
}

fn default_per_million_long() -> f64 {
    1000.0
}

impl Default for PayoutRates {
    fn default() -> Self {
        Self {
            per_million_short_usd: default_per_million_short(),
            per_million_long_usd: default_per_million_long(),
        }
    }
}

/// Revenue recognized for one settlement period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueContext {
    pub period: Period,

    /// Ad revenue recognized for this period.
    #[serde(rename = "adRevenueUSD")]
    pub ad_revenue_usd: f64,

    /// Subscription revenue allocated to the creator pool.
    #[serde(rename = "subsRevenueUSD")]
    pub subs_revenue_usd: f64,

    /// Sponsorships, brand integrations, and other pooled revenue.
    #[serde(rename = "otherRevenueUSD", default)]
    pub other_revenue_usd: f64,

    /// Multiplier for the payout-eligible portion of revenue, in `[0, 1]`.
    #[serde(default = "default_eligible_ratio")]
    pub eligible_revenue_ratio: f64,

    /// Hard ceiling on creator payouts as a ratio of eligible revenue.
    #[serde(default = "default_ceiling_ratio")]
    pub payout_ceiling_ratio: f64,
}

fn default_eligible_ratio() -> f64 {
    1.0
}

fn default_ceiling_ratio() -> f64 {
    0.40
}

/// Qualified view counts for one creator, as emitted by the proof-of-view
/// pipeline (already fraud-screened and deduplicated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorViewStats {
    pub creator_id: String,

    /// Qualified short-form views.
    pub short_qualified_views: u64,

    /// Qualified long-form views.
    pub long_qualified_views: u64,

    /// Anomaly score in `[0, 1]`: 0 = clean, 1 = severe anomaly.
    #[serde(default)]
    pub anomaly_score: f64,
}

/// Review/hold flags attached to a creator's payout.
///
/// `HoldAnomaly` payouts must not be settled downstream until cleared by
/// human review; this crate only carries the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutFlag {
    HoldAnomaly,
    ReviewAnomaly,
    ReviewSpike,
}

/// Anomaly score thresholds for flagging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Soft threshold: at or above, flag for review.
    pub review: f64,
    /// Hard threshold: at or above, hold the payout.
    pub hold: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            review: 0.3,
            hold: 0.6,
        }
    }
}

/// Pluggable spike detector.
///
/// The default is a crude volume threshold; production is expected to swap
/// in a velocity/novelty model without touching the governor.
pub type SpikeDetector = fn(&CreatorViewStats) -> bool;

/// Default spike heuristic: flag more than 2M combined views in one period.
pub fn default_spike_detector(stats: &CreatorViewStats) -> bool {
    stats.short_qualified_views + stats.long_qualified_views > 2_000_000
}

/// One creator's allocation for the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorPayoutResult {
    pub creator_id: String,

    /// USD before ceiling scaling.
    #[serde(rename = "baseUSD")]
    pub base_usd: f64,

    /// USD after ceiling scaling.
    #[serde(rename = "scaledUSD")]
    pub scaled_usd: f64,

    /// Whole diamonds granted (`floor(scaled_usd / 0.01)`).
    pub diamonds: u64,

    /// Scale factor applied (1.0 when the ceiling did not bind).
    pub scale_applied: f64,

    /// USD lost to floor rounding, `>= 0`; not carried forward.
    #[serde(rename = "deferredUSD")]
    pub deferred_usd: f64,

    pub flags: Vec<PayoutFlag>,
}

/// Full result of one settlement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResult {
    pub period: Period,

    #[serde(rename = "eligibleRevenueUSD")]
    pub eligible_revenue_usd: f64,

    /// `eligible_revenue_usd * payout_ceiling_ratio`.
    #[serde(rename = "poolCeilingUSD")]
    pub pool_ceiling_usd: f64,

    #[serde(rename = "totalBaseUSD")]
    pub total_base_usd: f64,

    /// 1.0 when total base fits under the ceiling, else in `(0, 1)`.
    pub scale_factor: f64,

    pub results: Vec<CreatorPayoutResult>,

    /// USD actually allocated after scaling and diamond flooring.
    #[serde(rename = "totalAllocatedUSD")]
    pub total_allocated_usd: f64,

    /// USD deferred due to rounding.
    #[serde(rename = "totalDeferredUSD")]
    pub total_deferred_usd: f64,
}

/// Base (pre-ceiling) payout in USD from qualified views.
fn compute_base_usd(stats: &CreatorViewStats, rates: &PayoutRates) -> f64 {
    let short_factor = stats.short_qualified_views as f64 / 1_000_000.0;
    let long_factor = stats.long_qualified_views as f64 / 1_000_000.0;
    round2(short_factor * rates.per_million_short_usd + long_factor * rates.per_million_long_usd)
}

/// Eligible revenue and pool ceiling for the period.
fn compute_pool_ceiling(revenue: &RevenueContext) -> (f64, f64) {
    let eligible = round2(
        (revenue.ad_revenue_usd + revenue.subs_revenue_usd + revenue.other_revenue_usd)
            * revenue.eligible_revenue_ratio,
    );
    let ceiling = round2(eligible * revenue.payout_ceiling_ratio);
    (eligible, ceiling)
}

/// Run one settlement computation with the default spike detector.
pub fn compute_payouts(
    creators: &[CreatorViewStats],
    revenue: &RevenueContext,
    rates: &PayoutRates,
    thresholds: &AnomalyThresholds,
) -> PoolResult {
    compute_payouts_with_detector(creators, revenue, rates, thresholds, default_spike_detector)
}

/// Run one settlement computation with a caller-supplied spike detector.
pub fn compute_payouts_with_detector(
    creators: &[CreatorViewStats],
    revenue: &RevenueContext,
    rates: &PayoutRates,
    thresholds: &AnomalyThresholds,
    spike_detector: SpikeDetector,
) -> PoolResult {
    let bases: Vec<f64> = creators
        .iter()
        .map(|c| compute_base_usd(c, rates))
        .collect();
    let total_base_usd = round2(bases.iter().sum());

    let (eligible_revenue_usd, pool_ceiling_usd) = compute_pool_ceiling(revenue);

    let scale_factor = if total_base_usd <= pool_ceiling_usd || total_base_usd == 0.0 {
        1.0
    } else {
        (pool_ceiling_usd / total_base_usd).clamp(0.0, 1.0)
    };

    let mut results = Vec::with_capacity(creators.len());
    let mut allocated = 0.0;
    let mut deferred = 0.0;

    for (stats, base_usd) in creators.iter().zip(bases) {
        let scaled_usd = round2(base_usd * scale_factor);
        let conversion = DiamondConversion::convert(scaled_usd);

        let mut flags = Vec::new();
        if stats.anomaly_score >= thresholds.hold {
            flags.push(PayoutFlag::HoldAnomaly);
        } else if stats.anomaly_score >= thresholds.review {
            flags.push(PayoutFlag::ReviewAnomaly);
        }
        if spike_detector(stats) {
            flags.push(PayoutFlag::ReviewSpike);
        }

        allocated += conversion.diamonds_usd;
        deferred += conversion.deferred_usd;

        results.push(CreatorPayoutResult {
            creator_id: stats.creator_id.clone(),
            base_usd,
            scaled_usd,
            diamonds: conversion.diamonds,
            scale_applied: scale_factor,
            deferred_usd: conversion.deferred_usd,
            flags,
        });
    }

    PoolResult {
        period: revenue.period,
        eligible_revenue_usd,
        pool_ceiling_usd,
        total_base_usd,
        scale_factor,
        results,
        total_allocated_usd: round2(allocated),
        total_deferred_usd: round2(deferred),
    }
}
