// Copyright (c) 2025 Tipstream Contributors

//! JSON snapshot persistence for the ledger.
//!
//! The whole store is written in one shot: serialize, write to `<path>.tmp`,
//! rename over the canonical file. A crash mid-write leaves the previous
//! snapshot intact. Restore is deliberately tolerant: a missing or corrupt
//! file logs a warning and yields an empty ledger, never a startup error.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::store::{LedgerStore, Receipt};
use super::LedgerError;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub balances: BTreeMap<String, i64>,
    pub receipts: Vec<Receipt>,
    pub version: u32,
}

impl Snapshot {
    pub fn from_store(store: &LedgerStore) -> Self {
        Self {
            balances: store.balances().clone(),
            receipts: store.receipts().to_vec(),
            version: SNAPSHOT_VERSION,
        }
    }

    /// Write the snapshot atomically.
    pub fn persist(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &encoded)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load the snapshot at `path` into a fresh store.
    ///
    /// Missing or unparseable snapshots start an empty ledger; an unknown
    /// version is treated the same way rather than guessing at the layout.
    pub fn restore(path: &Path) -> LedgerStore {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => {
                warn!(path = %path.display(), "no ledger snapshot, starting empty");
                return LedgerStore::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&data) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => {
                info!(
                    accounts = snapshot.balances.len(),
                    receipts = snapshot.receipts.len(),
                    "restored ledger snapshot"
                );
                LedgerStore::from_parts(snapshot.balances, snapshot.receipts)
            }
            Ok(snapshot) => {
                warn!(
                    version = snapshot.version,
                    "unsupported snapshot version, starting empty"
                );
                LedgerStore::new()
            }
            Err(e) => {
                warn!(error = %e, "corrupt ledger snapshot, starting empty");
                LedgerStore::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn populated_store() -> LedgerStore {
        let mut store = LedgerStore::new();
        store.apply_delta("alice", 1200);
        store.apply_delta("bob", -50);
        store.append_receipt(Receipt {
            id: "rcpt-1-abc123".to_string(),
            reference: "t1".to_string(),
            reason: "tip".to_string(),
            from_user_id: "bob".to_string(),
            to_user_id: "alice".to_string(),
            gross_cents: 1200,
            net_cents: 1140,
            fee_cents: 60,
            created_at: Utc::now(),
        });
        store
    }

    #[test]
    fn test_persist_restore_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger_snapshot.json");

        let store = populated_store();
        Snapshot::from_store(&store).persist(&path).unwrap();

        let restored = Snapshot::restore(&path);
        assert_eq!(restored.balance("alice"), 1200);
        assert_eq!(restored.balance("bob"), -50);
        assert_eq!(restored.receipt_count(), 1);
        assert_eq!(restored.receipts()[0].fee_cents, 60);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let restored = Snapshot::restore(&dir.path().join("absent.json"));
        assert_eq!(restored.account_count(), 0);
        assert_eq!(restored.receipt_count(), 0);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger_snapshot.json");
        fs::write(&path, b"{truncated").unwrap();

        let restored = Snapshot::restore(&path);
        assert_eq!(restored.account_count(), 0);
    }

    #[test]
    fn test_unknown_version_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger_snapshot.json");
        fs::write(&path, br#"{"balances":{"alice":99},"receipts":[],"version":7}"#).unwrap();

        let restored = Snapshot::restore(&path);
        assert_eq!(restored.balance("alice"), 0);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger_snapshot.json");
        Snapshot::from_store(&populated_store())
            .persist(&path)
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
