// Copyright (c) 2025 Tipstream Contributors

use anyhow::{Context, Result};
use std::path::Path;

use tsp_audit::ChainStore;

use crate::config::Config;
use crate::ledger::{Snapshot, PLATFORM_FEE_ACCOUNT};

pub fn run(config_path: &Path) -> Result<()> {
    let config =
        Config::load(config_path).context("No config found. Run 'tipstream init' first.")?;

    let store = Snapshot::restore(&config.data.snapshot_path());
    println!("Accounts:      {}", store.account_count());
    println!("Receipts:      {}", store.receipt_count());
    println!(
        "Platform fees: {} cents",
        store.balance(PLATFORM_FEE_ACCOUNT)
    );

    let chain = ChainStore::open(config.data.chain_path())?;
    println!("Payout runs:   {}", chain.len());
    if let Some(tail) = chain.tail_hash() {
        println!("Chain tail:    {tail}");
    }
    Ok(())
}
