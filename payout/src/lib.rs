// Copyright (c) 2025 Tipstream Contributors

//! Creator payout math for Tipstream.
//!
//! Everything in this crate is pure computation: no I/O, no clocks, no
//! shared state. The service crate feeds it ledger-derived inputs (trailing
//! monthly gross) and proof-of-view statistics, and persists its outputs.

pub mod diamond;
pub mod fee_tier;
pub mod governor;

pub use diamond::{round2, DiamondConversion, DIAMOND_USD};
pub use fee_tier::{clamp_fee_bps, resolve_fee_bps, FeeRateBps};
pub use governor::{
    compute_payouts, compute_payouts_with_detector, default_spike_detector, AnomalyThresholds,
    CreatorPayoutResult, CreatorViewStats, PayoutFlag, PayoutRates, Period, PoolResult,
    RevenueContext, SpikeDetector,
};
