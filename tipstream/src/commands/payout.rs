// Copyright (c) 2025 Tipstream Contributors

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use tsp_audit::ChainStore;
use tsp_payout::{compute_payouts, CreatorViewStats, RevenueContext};

use crate::config::Config;

/// Input file for one settlement run: qualified view stats from the
/// proof-of-view pipeline plus the period's revenue context.
#[derive(Deserialize)]
struct PayoutInput {
    creators: Vec<CreatorViewStats>,
    revenue: RevenueContext,
}

pub fn run(config_path: &Path, input_path: &Path) -> Result<()> {
    let config =
        Config::load(config_path).context("No config found. Run 'tipstream init' first.")?;

    let data = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read payout input from {}", input_path.display()))?;
    let input: PayoutInput = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse payout input from {}", input_path.display()))?;

    let pool = compute_payouts(
        &input.creators,
        &input.revenue,
        &config.payout.rates(),
        &config.payout.thresholds(),
    );

    let chain = ChainStore::open(config.data.chain_path())?;
    let sealed = chain.seal_and_append(pool, input.creators, input.revenue)?;

    println!("Sealed {} payout run", sealed.pool.period);
    println!(
        "  eligible revenue: ${:.2}  ceiling: ${:.2}  scale: {:.4}",
        sealed.pool.eligible_revenue_usd, sealed.pool.pool_ceiling_usd, sealed.pool.scale_factor
    );
    for r in &sealed.pool.results {
        let flags = if r.flags.is_empty() {
            String::new()
        } else {
            format!("  {:?}", r.flags)
        };
        println!(
            "  {:<24} {:>10} diamonds  (${:.2} scaled){}",
            r.creator_id, r.diamonds, r.scaled_usd, flags
        );
    }
    println!(
        "  allocated: ${:.2}  deferred: ${:.2}",
        sealed.pool.total_allocated_usd, sealed.pool.total_deferred_usd
    );
    println!("  input hash:  {}", sealed.input_hash);
    println!("  output hash: {}", sealed.output_hash);
    if let Some(prev) = &sealed.prev_output_hash {
        println!("  prev output: {prev}");
    }
    println!("  chain length: {}", chain.len());

    Ok(())
}
