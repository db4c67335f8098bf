// Copyright (c) 2025 Tipstream Contributors

//! File-backed hash chain of sealed settlement runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use tsp_payout::{CreatorViewStats, PoolResult, RevenueContext};

use crate::hash::canonical_json_sha256;

/// Current chain file format version.
pub const CHAIN_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Chain file version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("Input hash mismatch at run {index}")]
    InputHashMismatch { index: usize },

    #[error("Output hash mismatch at run {index}")]
    OutputHashMismatch { index: usize },

    #[error("Broken chain link at run {index}")]
    BrokenLink { index: usize },
}

/// Input payload covered by a run's `input_hash`.
///
/// Field order here fixes the hashed encoding; do not reorder.
#[derive(Serialize)]
struct ChainInput<'a> {
    creators: &'a [CreatorViewStats],
    revenue: &'a RevenueContext,
}

/// One settlement run, sealed and linked to its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedPool {
    /// Computed pool for this run.
    pub pool: PoolResult,

    /// Inputs the pool was computed from, kept verbatim for re-hashing.
    pub creators: Vec<CreatorViewStats>,
    pub revenue: RevenueContext,

    /// SHA-256 over `{creators, revenue}`.
    pub input_hash: String,

    /// SHA-256 over `pool`.
    pub output_hash: String,

    /// The previous run's `output_hash`; `None` for the first run.
    pub prev_output_hash: Option<String>,

    pub sealed_at: DateTime<Utc>,
}

/// On-disk chain file layout.
#[derive(Serialize, Deserialize)]
struct ChainFile {
    version: u32,
    runs: Vec<SealedPool>,
}

/// Append-only store for sealed runs, persisted as a single JSON file.
///
/// All mutation happens under one mutex, so the tail read and the append in
/// [`ChainStore::seal_and_append`] are a single atomic step.
pub struct ChainStore {
    path: PathBuf,
    runs: Mutex<Vec<SealedPool>>,
}

impl ChainStore {
    /// Open the chain file at `path`, or start an empty chain if it does
    /// not exist yet. A file that exists but fails to parse is an error,
    /// not an empty chain: silently restarting would orphan history.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ChainError> {
        let path = path.as_ref().to_path_buf();
        let runs = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let file: ChainFile = serde_json::from_str(&data)?;
            if file.version != CHAIN_VERSION {
                return Err(ChainError::VersionMismatch {
                    expected: CHAIN_VERSION,
                    got: file.version,
                });
            }
            info!(runs = file.runs.len(), path = %path.display(), "loaded payout chain");
            file.runs
        } else {
            warn!(path = %path.display(), "no payout chain file, starting empty");
            Vec::new()
        };

        Ok(Self {
            path,
            runs: Mutex::new(runs),
        })
    }

    /// Seal a settlement run and append it to the chain.
    ///
    /// Computes both digests, links `prev_output_hash` to the current tail,
    /// and persists the whole chain atomically. If persistence fails the
    /// in-memory chain is rolled back and the error is returned; a run is
    /// never chained without being durable.
    pub fn seal_and_append(
        &self,
        pool: PoolResult,
        creators: Vec<CreatorViewStats>,
        revenue: RevenueContext,
    ) -> Result<SealedPool, ChainError> {
        let input_hash = canonical_json_sha256(&ChainInput {
            creators: &creators,
            revenue: &revenue,
        })?;
        let output_hash = canonical_json_sha256(&pool)?;

        let mut runs = self.runs.lock();
        let prev_output_hash = runs.last().map(|r| r.output_hash.clone());

        let sealed = SealedPool {
            pool,
            creators,
            revenue,
            input_hash,
            output_hash,
            prev_output_hash,
            sealed_at: Utc::now(),
        };

        runs.push(sealed.clone());
        if let Err(e) = self.persist_locked(&runs) {
            runs.pop();
            return Err(e);
        }

        info!(
            runs = runs.len(),
            output_hash = %sealed.output_hash,
            "sealed payout run"
        );
        Ok(sealed)
    }

    /// Re-hash every stored run and check every link.
    ///
    /// Returns the first break found, scanning from the oldest run.
    pub fn verify(&self) -> Result<(), ChainError> {
        let runs = self.runs.lock();
        let mut prev_hash: Option<String> = None;

        for (index, run) in runs.iter().enumerate() {
            let input_hash = canonical_json_sha256(&ChainInput {
                creators: &run.creators,
                revenue: &run.revenue,
            })?;
            if input_hash != run.input_hash {
                return Err(ChainError::InputHashMismatch { index });
            }

            let output_hash = canonical_json_sha256(&run.pool)?;
            if output_hash != run.output_hash {
                return Err(ChainError::OutputHashMismatch { index });
            }

            if run.prev_output_hash != prev_hash {
                return Err(ChainError::BrokenLink { index });
            }
            prev_hash = Some(run.output_hash.clone());
        }

        Ok(())
    }

    /// Number of sealed runs.
    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    /// Output hash of the most recent run, if any.
    pub fn tail_hash(&self) -> Option<String> {
        self.runs.lock().last().map(|r| r.output_hash.clone())
    }

    /// Snapshot of all sealed runs, oldest first.
    pub fn runs(&self) -> Vec<SealedPool> {
        self.runs.lock().clone()
    }

    /// Write the chain file via a temp file and rename, so a crash mid-write
    /// leaves the previous file intact.
    fn persist_locked(&self, runs: &[SealedPool]) -> Result<(), ChainError> {
        let file = ChainFile {
            version: CHAIN_VERSION,
            runs: runs.to_vec(),
        };
        let encoded = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &encoded)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
