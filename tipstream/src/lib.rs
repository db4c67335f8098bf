// Copyright (c) 2025 Tipstream Contributors

//! Tipstream service: creator revenue ledger and payout governor.
//!
//! The ledger tracks per-account balances in integer cents and an append-only
//! receipt log; every tip routes through a tiered platform fee and lands in
//! the creator's wallet. Payout runs allocate a capped revenue pool into
//! Diamonds and are sealed into a tamper-evident hash chain (`tsp-audit`).

pub mod commands;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod rpc;
pub mod transfer;
