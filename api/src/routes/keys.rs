//! Verification Key Publication
//!
//! 게이트에 고정된 키 식별자와 각 variant의 signal 레이아웃을 공개.
//! 소비자는 `id`(variant@version)로 어떤 키로 검증되었는지 추적함

use axum::{extract::State, Json};
use serde::Serialize;
use zk_identity_circuits::{AssuranceLevel, CircuitVariant, INSTANCE_LEN};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct KeyInfo {
    pub id: String,
    pub circuit_variant: CircuitVariant,
    pub version: u32,
    pub assurance: AssuranceLevel,
    pub checks: &'static [&'static str],
    pub public_signals: [&'static str; 2],
    pub public_inputs: [&'static str; 2],
}

#[derive(Debug, Serialize)]
pub struct KeysResponse {
    pub k: u32,
    pub instance_len: usize,
    pub keys: Vec<KeyInfo>,
}

/// GET /keys
pub async fn list_keys(State(state): State<AppState>) -> Json<KeysResponse> {
    let keys = state
        .gate
        .key_ids()
        .into_iter()
        .map(|id| KeyInfo {
            id: id.to_string(),
            circuit_variant: id.variant,
            version: id.version,
            assurance: id.variant.assurance(),
            checks: id.variant.checks(),
            public_signals: ["valid", "unique_nullifier"],
            public_inputs: ["nullifier_hash", "commitment_hash"],
        })
        .collect();

    Json(KeysResponse {
        k: state.prover.k(),
        instance_len: INSTANCE_LEN,
        keys,
    })
}
