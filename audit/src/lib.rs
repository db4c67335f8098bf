// Copyright (c) 2025 Tipstream Contributors

//! Audit chain for payout settlement runs.
//!
//! Every settlement run is sealed with two SHA-256 digests: one over its
//! inputs (creator view statistics plus the revenue context) and one over
//! its output (the computed pool). Each sealed run links to the previous
//! run's output hash, so rewriting any historical run breaks every link
//! after it. The chain is an audit artifact, not a consensus mechanism;
//! there is exactly one writer.

pub mod chain;
pub mod hash;

pub use chain::{ChainError, ChainStore, SealedPool, CHAIN_VERSION};
pub use hash::canonical_json_sha256;
