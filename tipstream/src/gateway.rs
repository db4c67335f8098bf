// Copyright (c) 2025 Tipstream Contributors

//! Tip orchestration: fraud gate, fee tier lookup, transfer, notification.
//!
//! Fraud screening and notifications live in separate services and are
//! consumed over HTTP. Fraud denial aborts before any ledger mutation; a
//! notification failure is logged and never unwinds a completed transfer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use tsp_payout::resolve_fee_bps;

use crate::ledger::LedgerStore;
use crate::transfer::{TransferEngine, TransferError, TransferOutcome, TransferRequest};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("tip denied by fraud screen (score {})", .0.score)]
    FraudDenied(FraudDecision),

    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FraudAction {
    Allow,
    Flag,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudDecision {
    pub action: FraudAction,
    pub score: f64,
}

/// Request body sent to the fraud service.
#[derive(Debug, Clone, Serialize)]
pub struct FraudCheck {
    pub viewer_id: String,
    pub action: String,
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait FraudClient: Send + Sync {
    async fn check(&self, req: &FraudCheck) -> Result<FraudDecision, GatewayError>;
}

/// HTTP fraud client posting to `<base>/check`.
///
/// With no base URL configured every check is allowed; that keeps local
/// development working without the fraud service running.
pub struct HttpFraudClient {
    base_url: Option<String>,
    shared_secret: Option<String>,
    http: reqwest::Client,
}

impl HttpFraudClient {
    pub fn new(base_url: Option<String>, shared_secret: Option<String>) -> Self {
        Self {
            base_url,
            shared_secret,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FraudClient for HttpFraudClient {
    async fn check(&self, req: &FraudCheck) -> Result<FraudDecision, GatewayError> {
        let base = match &self.base_url {
            Some(base) => base,
            None => {
                debug!(viewer = %req.viewer_id, "fraud service not configured, allowing");
                return Ok(FraudDecision {
                    action: FraudAction::Allow,
                    score: 0.0,
                });
            }
        };

        let body = serde_json::to_vec(req).map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let mut request = self
            .http
            .post(format!("{base}/check"))
            .header("content-type", "application/json")
            .body(body.clone());

        if let Some(secret) = &self.shared_secret {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| GatewayError::Upstream(e.to_string()))?;
            mac.update(&body);
            request = request.header("x-internal-signature", hex::encode(mac.finalize().into_bytes()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Upstream(format!(
                "fraud service returned {}",
                response.status()
            )));
        }

        response
            .json::<FraudDecision>()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget; implementations log failures instead of returning them.
    async fn notify(&self, kind: &str, to: &str, message: &str);
}

/// HTTP notifier posting to `<base>/send`.
pub struct HttpNotifier {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, kind: &str, to: &str, message: &str) {
        let base = match &self.base_url {
            Some(base) => base,
            None => {
                debug!(kind, to, "notification service not configured, skipping");
                return;
            }
        };

        let result = self
            .http
            .post(format!("{base}/send"))
            .json(&serde_json::json!({ "kind": kind, "to": to, "message": message }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!(kind, to, status = %resp.status(), "notification rejected"),
            Err(e) => warn!(kind, to, error = %e, "notification failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TipRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_cents: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TipOutcome {
    pub transfer: TransferOutcome,
    pub reference: String,
    pub fraud: FraudDecision,
    /// The payee's trailing gross before this tip; the tier input.
    pub mtd_gross_before_cents: i64,
}

pub struct TipGateway {
    fraud: Arc<dyn FraudClient>,
    notifier: Arc<dyn Notifier>,
    engine: TransferEngine,
}

impl TipGateway {
    pub fn new(
        fraud: Arc<dyn FraudClient>,
        notifier: Arc<dyn Notifier>,
        engine: TransferEngine,
    ) -> Self {
        Self {
            fraud,
            notifier,
            engine,
        }
    }

    /// Process one tip end to end.
    ///
    /// The fee tier is resolved from the payee's gross accumulated strictly
    /// before this tip; tier lookup and transfer happen under one lock
    /// acquisition so no other transfer can land between them.
    pub async fn tip(
        &self,
        store: &Mutex<LedgerStore>,
        req: TipRequest,
    ) -> Result<TipOutcome, GatewayError> {
        let check = FraudCheck {
            viewer_id: req.from_user_id.clone(),
            action: "tip".to_string(),
            amount_cents: req.amount_cents,
            ip: req.ip.clone(),
            user_agent: req.user_agent.clone(),
        };

        let decision = self.fraud.check(&check).await?;
        match decision.action {
            FraudAction::Deny => {
                warn!(from = %req.from_user_id, score = decision.score, "tip denied by fraud screen");
                return Err(GatewayError::FraudDenied(decision));
            }
            FraudAction::Flag => {
                warn!(from = %req.from_user_id, score = decision.score, "tip flagged, proceeding");
            }
            FraudAction::Allow => {}
        }

        let now = Utc::now();
        let reference = format!(
            "tip-{}-{}-{}",
            now.timestamp_millis(),
            req.from_user_id,
            req.to_user_id
        );

        let (transfer, mtd_gross_before_cents) = {
            let mut store = store.lock();
            let mtd = store.monthly_gross_cents(&req.to_user_id, now);
            let fee_bps = resolve_fee_bps(mtd);
            let outcome = self.engine.transfer(
                &mut store,
                TransferRequest {
                    reference: reference.clone(),
                    from_user_id: req.from_user_id.clone(),
                    to_user_id: req.to_user_id.clone(),
                    amount_cents: req.amount_cents,
                    reason: "tip".to_string(),
                    fee_bps: i64::from(fee_bps),
                },
            )?;
            (outcome, mtd)
        };

        self.notifier
            .notify(
                "creator_event",
                &req.to_user_id,
                &format!(
                    "You received a tip: {} cents ({} cents after fees)",
                    transfer.gross_cents, transfer.net_cents
                ),
            )
            .await;

        Ok(TipOutcome {
            transfer,
            reference,
            fraud: decision,
            mtd_gross_before_cents,
        })
    }
}
