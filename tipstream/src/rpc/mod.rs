// Copyright (c) 2025 Tipstream Contributors

//! HTTP API for the ledger service.
//!
//! Plain JSON over hyper with manual routing. Every error response is a
//! structured body `{ok: false, error: <kind>, ...}` so callers can branch
//! on the kind instead of parsing messages.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use tsp_payout::resolve_fee_bps;

use crate::gateway::{GatewayError, TipGateway, TipRequest};
use crate::ledger::{LedgerStore, Snapshot};
use crate::transfer::{TransferEngine, TransferError, TransferRequest};

/// Maximum receipts returned per creator query.
const RECEIPTS_LIMIT: usize = 200;

/// Shared API state
pub struct RpcState {
    pub store: Mutex<LedgerStore>,
    pub engine: TransferEngine,
    pub gateway: TipGateway,
    pub snapshot_path: PathBuf,
}

/// Serve the HTTP API on an already-bound listener.
pub async fn serve(listener: TcpListener, state: Arc<RpcState>) -> Result<()> {
    info!("HTTP API listening on {}", listener.local_addr()?);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(|req| handle_request(req, state.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

#[derive(Deserialize)]
struct TransferBody {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default = "default_reason")]
    reason: String,
    #[serde(alias = "fromUserId")]
    from_user_id: String,
    #[serde(alias = "toUserId")]
    to_user_id: String,
    /// Strict JSON integer; a fractional amount fails deserialization.
    #[serde(alias = "amountCents")]
    amount_cents: i64,
    #[serde(default, alias = "feeBps")]
    fee_bps: i64,
}

fn default_reason() -> String {
    "transfer".to_string()
}

#[derive(Deserialize)]
struct TipBody {
    #[serde(alias = "fromUserId")]
    from_user_id: String,
    #[serde(alias = "toUserId")]
    to_user_id: String,
    #[serde(alias = "amountCents")]
    amount_cents: i64,
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<RpcState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = header_string(&req, "x-forwarded-for");
    let user_agent = header_string(&req, "user-agent");

    let body_bytes = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("Failed to read request body: {}", e);
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({"ok": false, "error": "bad_request", "message": "failed to read body"}),
            ));
        }
    };

    debug!(%method, %path, "request");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["health"]) => json_response(StatusCode::OK, &json!({"ok": true})),

        (&Method::GET, ["wallets", id, "balance"]) => {
            let balance = state.store.lock().balance(id);
            json_response(
                StatusCode::OK,
                &json!({"userId": id, "balance_cents": balance}),
            )
        }

        (&Method::POST, ["transfer"]) => handle_transfer(&state, &body_bytes),

        (&Method::GET, ["creators", id, "monthly-earnings"]) => {
            let gross = state.store.lock().monthly_gross_cents(id, Utc::now());
            json_response(StatusCode::OK, &json!({"ok": true, "gross_cents": gross}))
        }

        (&Method::GET, ["creators", id, "receipts"]) => {
            let receipts = state.store.lock().receipts_for(id, RECEIPTS_LIMIT);
            json_response(StatusCode::OK, &json!({"ok": true, "receipts": receipts}))
        }

        (&Method::GET, ["creators", id, "summary"]) => {
            let store = state.store.lock();
            let mtd = store.monthly_gross_cents(id, Utc::now());
            let balance = store.balance(id);
            drop(store);
            json_response(
                StatusCode::OK,
                &json!({
                    "ok": true,
                    "creator_id": id,
                    "mtd_gross_cents": mtd,
                    "applied_fee_bps": resolve_fee_bps(mtd),
                    "wallet_balance_cents": balance,
                }),
            )
        }

        (&Method::POST, ["tip"]) => handle_tip(&state, &body_bytes, ip, user_agent).await,

        (&Method::POST, ["admin", "save"]) => {
            let store = state.store.lock();
            match Snapshot::from_store(&store).persist(&state.snapshot_path) {
                Ok(()) => json_response(StatusCode::OK, &json!({"ok": true})),
                Err(e) => persistence_error(&e.to_string()),
            }
        }

        (&Method::POST, ["admin", "clear"]) => {
            let mut store = state.store.lock();
            store.clear();
            match Snapshot::from_store(&store).persist(&state.snapshot_path) {
                Ok(()) => json_response(StatusCode::OK, &json!({"ok": true})),
                Err(e) => persistence_error(&e.to_string()),
            }
        }

        _ => json_response(
            StatusCode::NOT_FOUND,
            &json!({"ok": false, "error": "not_found"}),
        ),
    };

    Ok(response)
}

fn handle_transfer(state: &RpcState, body: &[u8]) -> Response<Full<Bytes>> {
    let body: TransferBody = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({"ok": false, "error": "invalid_request", "message": e.to_string()}),
            )
        }
    };

    let mut store = state.store.lock();
    let result = state.engine.transfer(
        &mut store,
        TransferRequest {
            reference: body.reference,
            from_user_id: body.from_user_id,
            to_user_id: body.to_user_id,
            amount_cents: body.amount_cents,
            reason: body.reason,
            fee_bps: body.fee_bps,
        },
    );

    match result {
        Ok(outcome) => json_response(
            StatusCode::OK,
            &json!({"ok": true, "fee_cents": outcome.fee_cents}),
        ),
        Err(e) => transfer_error(&e),
    }
}

async fn handle_tip(
    state: &RpcState,
    body: &[u8],
    ip: Option<String>,
    user_agent: Option<String>,
) -> Response<Full<Bytes>> {
    let body: TipBody = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({"ok": false, "error": "invalid_request", "message": e.to_string()}),
            )
        }
    };

    let result = state
        .gateway
        .tip(
            &state.store,
            TipRequest {
                from_user_id: body.from_user_id,
                to_user_id: body.to_user_id,
                amount_cents: body.amount_cents,
                ip,
                user_agent,
            },
        )
        .await;

    match result {
        Ok(out) => json_response(
            StatusCode::OK,
            &json!({
                "ok": true,
                "result": {
                    "receipt_id": out.transfer.receipt_id,
                    "gross_cents": out.transfer.gross_cents,
                    "net_cents": out.transfer.net_cents,
                    "fee_cents": out.transfer.fee_cents,
                },
                "ref": out.reference,
                "fraud": out.fraud,
                "applied_fee_bps": out.transfer.applied_fee_bps,
                "mtd_gross_before_cents": out.mtd_gross_before_cents,
            }),
        ),
        Err(GatewayError::FraudDenied(decision)) => json_response(
            StatusCode::UNAUTHORIZED,
            &json!({"ok": false, "error": "fraud_denied", "fraud": decision}),
        ),
        Err(GatewayError::Upstream(message)) => json_response(
            StatusCode::BAD_GATEWAY,
            &json!({"ok": false, "error": "upstream_unavailable", "message": message}),
        ),
        Err(GatewayError::Transfer(e)) => transfer_error(&e),
    }
}

fn transfer_error(e: &TransferError) -> Response<Full<Bytes>> {
    match e {
        TransferError::InvalidAmount(message) => json_response(
            StatusCode::BAD_REQUEST,
            &json!({"ok": false, "error": "invalid_amount", "message": message}),
        ),
        TransferError::Persistence(source) => persistence_error(&source.to_string()),
    }
}

fn persistence_error(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({"ok": false, "error": "persistence_failure", "message": message}),
    )
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

fn json_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(value).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
