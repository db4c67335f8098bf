// Copyright (c) 2025 Tipstream Contributors

//! Revenue ledger: per-account balances plus an append-only receipt log.
//!
//! Balances are signed integer cents; receipts are never mutated after
//! append and are the sole input to trailing-gross computation. The store
//! is plain in-memory state persisted as a JSON snapshot; the service
//! serializes access through a single mutex.

pub mod snapshot;
pub mod store;

pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use store::{LedgerStore, Receipt, PLATFORM_FEE_ACCOUNT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
