// Copyright (c) 2025 Tipstream Contributors

//! End-to-end tests for the HTTP API: real server on an ephemeral port,
//! real snapshot files in a temp directory, no fraud/notification services
//! configured (tips are allowed through the dev fallback).

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::net::TcpListener;

use tipstream::gateway::{HttpFraudClient, HttpNotifier, TipGateway};
use tipstream::ledger::LedgerStore;
use tipstream::rpc::{self, RpcState};
use tipstream::transfer::TransferEngine;

async fn spawn_server(data_dir: &Path) -> String {
    let snapshot_path = data_dir.join("ledger_snapshot.json");
    let engine = TransferEngine::new(&snapshot_path);
    let gateway = TipGateway::new(
        Arc::new(HttpFraudClient::new(None, None)),
        Arc::new(HttpNotifier::new(None)),
        engine.clone(),
    );
    let state = Arc::new(RpcState {
        store: Mutex::new(LedgerStore::new()),
        engine,
        gateway,
        snapshot_path,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(rpc::serve(listener, state));
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn test_transfer_and_creator_queries() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/transfer"))
        .json(&json!({
            "ref": "t1",
            "reason": "tip",
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 1000,
            "feeBps": 500,
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["fee_cents"], json!(50));

    let body: Value = client
        .get(format!("{base}/wallets/alice/balance"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["userId"], json!("alice"));
    assert_eq!(body["balance_cents"], json!(950));

    let body: Value = client
        .get(format!("{base}/creators/alice/monthly-earnings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["gross_cents"], json!(1000));

    let body: Value = client
        .get(format!("{base}/creators/alice/receipts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let receipts = body["receipts"].as_array().unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0]["ref"], json!("t1"));
    assert_eq!(receipts[0]["from"], json!("viewer"));
    assert_eq!(receipts[0]["fee_cents"], json!(50));

    let body: Value = client
        .get(format!("{base}/creators/alice/summary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["creator_id"], json!("alice"));
    assert_eq!(body["mtd_gross_cents"], json!(1000));
    assert_eq!(body["applied_fee_bps"], json!(500));
    assert_eq!(body["wallet_balance_cents"], json!(950));

    // Snapshot hit disk as part of the transfer.
    assert!(dir.path().join("ledger_snapshot.json").exists());
}

#[tokio::test]
async fn test_transfer_rejects_bad_amounts() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    // Fractional cents fail strict integer deserialization.
    let resp = client
        .post(format!("{base}/transfer"))
        .json(&json!({
            "ref": "t1",
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 10.5,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/transfer"))
        .json(&json!({
            "ref": "t2",
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": -100,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], json!("invalid_amount"));

    // A zero amount is accepted and moves nothing.
    let resp = client
        .post(format!("{base}/transfer"))
        .json(&json!({
            "ref": "t3",
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 0,
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fee_cents"], json!(0));

    let body: Value = client
        .get(format!("{base}/wallets/alice/balance"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["balance_cents"], json!(0));
}

#[tokio::test]
async fn test_tip_without_fraud_service_is_allowed() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/tip"))
        .json(&json!({
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 1000,
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["fraud"]["action"], json!("allow"));
    assert_eq!(body["applied_fee_bps"], json!(500));
    assert_eq!(body["mtd_gross_before_cents"], json!(0));
    assert_eq!(body["result"]["net_cents"], json!(950));
    assert!(body["ref"].as_str().unwrap().starts_with("tip-"));

    // The second tip sees the first tip's gross, still in the low tier.
    let body: Value = client
        .post(format!("{base}/tip"))
        .json(&json!({
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 500,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["mtd_gross_before_cents"], json!(1000));
}

#[tokio::test]
async fn test_admin_save_and_clear() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/transfer"))
        .json(&json!({
            "ref": "t1",
            "fromUserId": "viewer",
            "toUserId": "alice",
            "amountCents": 1000,
            "feeBps": 500,
        }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/admin/save"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = client
        .post(format!("{base}/admin/clear"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let body: Value = client
        .get(format!("{base}/wallets/alice/balance"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["balance_cents"], json!(0));

    let body: Value = client
        .get(format!("{base}/creators/alice/receipts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["receipts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = tempdir().unwrap();
    let base = spawn_server(dir.path()).await;

    let resp = reqwest::get(format!("{base}/nope")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], json!("not_found"));
}
