// Copyright (c) 2025 Tipstream Contributors

//! Transfer engine: the only write path into the ledger.
//!
//! A transfer debits the sender's wallet, credits the creator net of the
//! platform fee, credits the fee account, appends a receipt, and persists
//! the snapshot — all under the caller's store lock. If persistence fails,
//! the in-memory mutation is rolled back and the transfer is not committed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error};

use tsp_payout::clamp_fee_bps;

use crate::ledger::{
    store::new_receipt_id, LedgerError, LedgerStore, Receipt, Snapshot, PLATFORM_FEE_ACCOUNT,
};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] LedgerError),
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub reference: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_cents: i64,
    pub reason: String,
    pub fee_bps: i64,
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub receipt_id: String,
    pub gross_cents: i64,
    pub net_cents: i64,
    pub fee_cents: i64,
    pub applied_fee_bps: u32,
}

/// Applies transfers to a ledger store and persists the snapshot after each.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    snapshot_path: PathBuf,
}

impl TransferEngine {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Execute one transfer. The caller must hold the store lock for the
    /// whole call; the read-modify-write is not otherwise serialized.
    ///
    /// A zero amount is a valid transfer: it moves nothing but still writes
    /// a receipt. Negative amounts are rejected since a reversal phrased as
    /// a transfer would skip the fee path.
    pub fn transfer(
        &self,
        store: &mut LedgerStore,
        req: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        if req.amount_cents < 0 {
            return Err(TransferError::InvalidAmount(format!(
                "amount_cents must not be negative, got {}",
                req.amount_cents
            )));
        }

        let fee_bps = clamp_fee_bps(req.fee_bps);
        if i64::from(fee_bps) != req.fee_bps {
            debug!(
                requested = req.fee_bps,
                applied = fee_bps,
                "fee bps clamped into [0, 10000]"
            );
        }

        // Integer fee, truncated toward zero; net + fee == amount always.
        let fee_cents = (req.amount_cents as i128 * fee_bps as i128 / 10_000) as i64;
        let net_cents = req.amount_cents - fee_cents;

        store.apply_delta(&req.from_user_id, -req.amount_cents);
        store.apply_delta(&req.to_user_id, net_cents);
        if fee_cents > 0 {
            store.apply_delta(PLATFORM_FEE_ACCOUNT, fee_cents);
        }

        let now = Utc::now();
        let receipt = Receipt {
            id: new_receipt_id(now),
            reference: req.reference.clone(),
            reason: req.reason.clone(),
            from_user_id: req.from_user_id.clone(),
            to_user_id: req.to_user_id.clone(),
            gross_cents: req.amount_cents,
            net_cents,
            fee_cents,
            created_at: now,
        };
        let receipt_id = receipt.id.clone();
        store.append_receipt(receipt);

        if let Err(e) = Snapshot::from_store(store).persist(&self.snapshot_path) {
            // Roll back so memory and disk never diverge.
            store.apply_delta(&req.from_user_id, req.amount_cents);
            store.apply_delta(&req.to_user_id, -net_cents);
            if fee_cents > 0 {
                store.apply_delta(PLATFORM_FEE_ACCOUNT, -fee_cents);
            }
            store.pop_receipt();
            error!(error = %e, reference = %req.reference, "snapshot persist failed, transfer rolled back");
            return Err(TransferError::Persistence(e));
        }

        debug!(
            receipt_id = %receipt_id,
            from = %req.from_user_id,
            to = %req.to_user_id,
            gross = req.amount_cents,
            fee = fee_cents,
            "transfer committed"
        );

        Ok(TransferOutcome {
            receipt_id,
            gross_cents: req.amount_cents,
            net_cents,
            fee_cents,
            applied_fee_bps: fee_bps,
        })
    }
}
