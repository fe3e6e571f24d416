//! Router-level Tests
//!
//! 실제 Halo2 증명과 메모리 레지스트리로 HTTP 흐름 전체를 확인

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{create_router, AppState, Config, InMemoryNullifierRegistry, NullifierRegistry};

async fn app() -> (Router, Arc<InMemoryNullifierRegistry>) {
    let registry = Arc::new(InMemoryNullifierRegistry::new());
    let state = AppState::with_registry(Config::for_development(), registry.clone(), None)
        .await
        .unwrap();
    (create_router(state), registry)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn field_hex(value: u64) -> String {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&value.to_le_bytes());
    format!("0x{}", hex::encode(bytes))
}

fn attributes(age: u64, risk: u64, salt: u64) -> Value {
    json!({
        "circuit_variant": "full-personhood",
        "age": age,
        "country_risk": risk,
        "unique_id_salt": field_hex(salt),
        "secret_key": field_hex(0xc0ffee),
        "context": "lending-pool"
    })
}

async fn prove(app: &Router, age: u64, risk: u64, salt: u64) -> Value {
    let body = Some(attributes(age, risk, salt));
    let (status, body) = send(app, "POST", "/attestation/prove", body).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["submission"].clone()
}

#[tokio::test]
async fn test_health_reports_memory_registry() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["registry"]["backend"], "memory");
    assert_eq!(body["registry"]["nullifier_count"], 0);
}

#[tokio::test]
async fn test_keys_lists_enabled_variants() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/keys", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["full-personhood@v1", "age-only@v1", "country-risk-only@v1"]);
    assert_eq!(body["instance_len"], 4);
}

#[tokio::test]
async fn test_inputs_match_proof_submission() {
    let (app, _) = app().await;
    let body = Some(attributes(25, 1, 12345));
    let (status, inputs) = send(&app, "POST", "/attestation/inputs", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inputs["expected_valid"], true);

    let submission = prove(&app, 25, 1, 12345).await;
    assert_eq!(submission["public_inputs"][0], inputs["nullifier_hash"]);
    assert_eq!(submission["public_inputs"][1], inputs["commitment_hash"]);
}

#[tokio::test]
async fn test_accept_then_replay() {
    let (app, registry) = app().await;
    let submission = prove(&app, 25, 1, 12345).await;

    let (status, body) = send(&app, "POST", "/attestation/verify", Some(submission.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["result"], "accepted");
    let nullifier = body["nullifier"].as_str().unwrap().to_string();
    assert!(registry.contains(&nullifier).await.unwrap());

    let (status, body) = send(&app, "POST", "/attestation/verify", Some(submission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NULLIFIER_ALREADY_USED");

    let (status, body) = send(&app, "GET", &format!("/nullifier/{}", nullifier), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["used"], true);
    assert_eq!(body["record"]["context"], "lending-pool");
    assert_eq!(registry.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_ineligible_proofs_are_forbidden() {
    let (app, registry) = app().await;

    for (age, risk, salt) in [(16, 1, 999), (30, 3, 67890)] {
        let submission = prove(&app, age, risk, salt).await;
        let (status, body) = send(&app, "POST", "/attestation/verify", Some(submission)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PREDICATE_NOT_SATISFIED");
    }
    assert_eq!(registry.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_corrupted_commitment_is_invalid_proof() {
    let (app, registry) = app().await;
    let mut submission = prove(&app, 25, 1, 12345).await;

    let commitment = submission["public_inputs"][1].as_str().unwrap();
    let mut bytes = hex::decode(&commitment[2..]).unwrap();
    bytes[0] ^= 1;
    submission["public_inputs"][1] = json!(format!("0x{}", hex::encode(bytes)));

    let (status, body) = send(&app, "POST", "/attestation/verify", Some(submission)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_PROOF");
    assert_eq!(registry.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_attribute_is_bad_request() {
    let (app, _) = app().await;
    let mut body = attributes(25, 1, 1);
    body.as_object_mut().unwrap().remove("age");

    let (status, body) = send(&app, "POST", "/attestation/prove", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INCONSISTENT_WITNESS");
}

#[tokio::test]
async fn test_unknown_nullifier_is_unused() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", &format!("/nullifier/{}", field_hex(7)), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["used"], false);
    assert!(body.get("record").is_none());
}
