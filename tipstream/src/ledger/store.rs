// Copyright (c) 2025 Tipstream Contributors

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Account credited with every platform fee.
pub const PLATFORM_FEE_ACCOUNT: &str = "platform:fees";

/// One completed transfer. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,

    /// Caller-supplied reference; not deduplicated.
    #[serde(rename = "ref")]
    pub reference: String,

    pub reason: String,

    #[serde(rename = "from")]
    pub from_user_id: String,

    #[serde(rename = "to")]
    pub to_user_id: String,

    /// Amount debited from the sender.
    pub gross_cents: i64,

    /// Amount credited to the recipient after the fee.
    pub net_cents: i64,

    pub fee_cents: i64,

    pub created_at: DateTime<Utc>,
}

/// Generate a receipt id: `rcpt-<millis>-<nonce>`.
pub fn new_receipt_id(now: DateTime<Utc>) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("rcpt-{}-{}", now.timestamp_millis(), nonce)
}

/// In-memory ledger state.
///
/// Balances are signed: overdraft is permitted and shows up as a negative
/// balance rather than a rejected transfer.
#[derive(Debug, Default)]
pub struct LedgerStore {
    balances: BTreeMap<String, i64>,
    receipts: Vec<Receipt>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(balances: BTreeMap<String, i64>, receipts: Vec<Receipt>) -> Self {
        Self { balances, receipts }
    }

    /// Current balance in cents; unknown accounts read as 0.
    pub fn balance(&self, user_id: &str) -> i64 {
        self.balances.get(user_id).copied().unwrap_or(0)
    }

    pub fn apply_delta(&mut self, user_id: &str, delta_cents: i64) {
        *self.balances.entry(user_id.to_string()).or_insert(0) += delta_cents;
    }

    pub fn append_receipt(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }

    /// Remove the most recent receipt. Only used to roll back a transfer
    /// whose snapshot persist failed.
    pub fn pop_receipt(&mut self) -> Option<Receipt> {
        self.receipts.pop()
    }

    /// Gross cents received by `creator` since the start of the current UTC
    /// calendar month, derived entirely from the receipt log.
    pub fn monthly_gross_cents(&self, creator: &str, now: DateTime<Utc>) -> i64 {
        self.receipts
            .iter()
            .filter(|r| {
                r.to_user_id == creator
                    && r.created_at.year() == now.year()
                    && r.created_at.month() == now.month()
            })
            .map(|r| r.gross_cents)
            .sum()
    }

    /// Most recent receipts crediting `creator`, in append order (oldest of
    /// the window first), at most `limit`.
    pub fn receipts_for(&self, creator: &str, limit: usize) -> Vec<Receipt> {
        let mut window: Vec<Receipt> = self
            .receipts
            .iter()
            .rev()
            .filter(|r| r.to_user_id == creator)
            .take(limit)
            .cloned()
            .collect();
        window.reverse();
        window
    }

    pub fn balances(&self) -> &BTreeMap<String, i64> {
        &self.balances
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub fn receipt_count(&self) -> usize {
        self.receipts.len()
    }

    /// Drop all balances and receipts.
    pub fn clear(&mut self) {
        self.balances.clear();
        self.receipts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn receipt(to: &str, gross: i64, created_at: DateTime<Utc>) -> Receipt {
        Receipt {
            id: new_receipt_id(created_at),
            reference: "t1".to_string(),
            reason: "tip".to_string(),
            from_user_id: "viewer".to_string(),
            to_user_id: to.to_string(),
            gross_cents: gross,
            net_cents: gross,
            fee_cents: 0,
            created_at,
        }
    }

    #[test]
    fn test_unknown_account_reads_zero() {
        let store = LedgerStore::new();
        assert_eq!(store.balance("nobody"), 0);
    }

    #[test]
    fn test_apply_delta_accumulates() {
        let mut store = LedgerStore::new();
        store.apply_delta("alice", 500);
        store.apply_delta("alice", -200);
        assert_eq!(store.balance("alice"), 300);
    }

    #[test]
    fn test_overdraft_goes_negative() {
        let mut store = LedgerStore::new();
        store.apply_delta("alice", -100);
        assert_eq!(store.balance("alice"), -100);
    }

    #[test]
    fn test_monthly_gross_filters_by_month_and_payee() {
        let mut store = LedgerStore::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap();
        let month_start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        store.append_receipt(receipt("alice", 1000, last_month));
        store.append_receipt(receipt("alice", 2000, month_start));
        store.append_receipt(receipt("alice", 3000, now));
        store.append_receipt(receipt("bob", 9000, now));

        assert_eq!(store.monthly_gross_cents("alice", now), 5000);
        assert_eq!(store.monthly_gross_cents("bob", now), 9000);
        assert_eq!(store.monthly_gross_cents("carol", now), 0);
    }

    #[test]
    fn test_receipts_for_keeps_append_order_and_limit() {
        let mut store = LedgerStore::new();
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        for i in 0..5 {
            let mut r = receipt("alice", 100 + i, base);
            r.reference = format!("t{i}");
            store.append_receipt(r);
        }

        // Window is the last 3 receipts, returned oldest first.
        let got = store.receipts_for("alice", 3);
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].reference, "t2");
        assert_eq!(got[2].reference, "t4");
    }

    #[test]
    fn test_clear() {
        let mut store = LedgerStore::new();
        store.apply_delta("alice", 500);
        store.append_receipt(receipt("alice", 500, Utc::now()));
        store.clear();
        assert_eq!(store.account_count(), 0);
        assert_eq!(store.receipt_count(), 0);
    }

    #[test]
    fn test_receipt_id_shape() {
        let id = new_receipt_id(Utc::now());
        assert!(id.starts_with("rcpt-"));
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 6);
    }
}
