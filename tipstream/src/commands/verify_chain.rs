// Copyright (c) 2025 Tipstream Contributors

use anyhow::{Context, Result};
use std::path::Path;

use tsp_audit::ChainStore;

use crate::config::Config;

pub fn run(config_path: &Path) -> Result<()> {
    let config =
        Config::load(config_path).context("No config found. Run 'tipstream init' first.")?;

    let chain = ChainStore::open(config.data.chain_path())?;
    chain
        .verify()
        .context("Payout chain verification failed")?;

    println!("Payout chain OK: {} runs", chain.len());
    if let Some(tail) = chain.tail_hash() {
        println!("Tail hash: {tail}");
    }
    Ok(())
}
