//! Identity Attestation Endpoints
//!
//! Witness building, server-side proving, and the verifier gate.
//!
//! # Security Note
//!
//! - `/attestation/inputs`, `/attestation/prove`는 secret key를 받음
//!   → 요청 타입은 `Debug`를 구현하지 않고, 로그에도 남기지 않음
//! - 브라우저에서 직접 public input을 계산하려면 circuits crate의 wasm 바인딩 사용

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zk_identity_circuits::{
    fp_from_hex, fp_to_hex, random_salt, CircuitVariant, Fp, ProvingRequest, WitnessBuilder,
};

use crate::{error::ApiError, types::ProofSubmission, AppState};

// ============ Request/Response Types ============

/// 원시 속성 요청
///
/// 해시/salt/key는 0x hex (little-endian field element)
#[derive(Deserialize)]
pub struct AttributesRequest {
    pub circuit_variant: CircuitVariant,
    pub age: Option<u64>,
    pub country_risk: Option<u64>,
    pub biometric_hash: Option<String>,
    pub device_hash: Option<String>,
    /// 없으면 서버가 새 salt를 생성 (새 nullifier slot)
    pub unique_id_salt: Option<String>,
    pub secret_key: String,
    /// 레지스트리 레코드에 남길 검증 컨텍스트
    pub context: Option<String>,
}

/// Public input 응답
#[derive(Debug, Serialize)]
pub struct InputsResponse {
    pub circuit_variant: CircuitVariant,
    pub nullifier_hash: String,
    pub commitment_hash: String,
    /// 이 속성으로 증명하면 나올 valid 값
    pub expected_valid: bool,
    /// 서버가 생성한 경우에만 포함
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id_salt: Option<String>,
}

/// Proof 응답
#[derive(Debug, Serialize)]
pub struct ProveResponse {
    pub submission: ProofSubmission,
    /// 서버가 생성한 경우에만 포함
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id_salt: Option<String>,
    /// 증명 생성 시간 (ms)
    pub generation_time_ms: u64,
}

/// 게이트 통과 응답
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub result: &'static str,
    pub nullifier: String,
    pub verified_at: DateTime<Utc>,
    pub attempt_id: Uuid,
}

// ============ Handlers ============

/// POST /attestation/inputs
///
/// Witness Builder만 실행: 증명 없이 public input 계산
pub async fn compute_inputs(
    Json(req): Json<AttributesRequest>,
) -> Result<Json<InputsResponse>, ApiError> {
    let (request, generated_salt) = build_request(&req)?;
    let inputs = request.public_inputs();

    Ok(Json(InputsResponse {
        circuit_variant: request.variant(),
        nullifier_hash: fp_to_hex(&inputs.nullifier_hash),
        commitment_hash: fp_to_hex(&inputs.commitment_hash),
        expected_valid: request.expected_signals().is_valid(),
        unique_id_salt: generated_salt.as_ref().map(fp_to_hex),
    }))
}

/// POST /attestation/prove
///
/// # Flow
///
/// 1. 입력 검증 (WitnessBuilder, 구조적 오류 → 400)
/// 2. Poseidon으로 nullifierHash, commitmentHash 계산
/// 3. Halo2 회로로 ZK proof 생성
/// 4. 제출 payload 반환
///
/// 자격 미달(예: 16세)이어도 proof는 생성됨 (valid = 0).
/// 거부는 `/attestation/verify`에서 일어남
pub async fn prove(
    State(state): State<AppState>,
    Json(req): Json<AttributesRequest>,
) -> Result<Json<ProveResponse>, ApiError> {
    tracing::info!("Generating {} attestation proof", req.circuit_variant);
    let start = std::time::Instant::now();

    let (request, generated_salt) = build_request(&req)?;

    let submission = state.prover.prove(&request, req.context.clone()).await?;

    let generation_time = start.elapsed().as_millis() as u64;
    tracing::info!("{} proof generated in {}ms", req.circuit_variant, generation_time);

    Ok(Json(ProveResponse {
        submission,
        unique_id_salt: generated_salt.as_ref().map(fp_to_hex),
        generation_time_ms: generation_time,
    }))
}

/// POST /attestation/verify
///
/// Verifier Gate 실행. 거부 사유는 에러 코드로 구분:
/// - 422 INVALID_PROOF
/// - 403 PREDICATE_NOT_SATISFIED
/// - 409 NULLIFIER_ALREADY_USED
pub async fn verify(
    State(state): State<AppState>,
    Json(submission): Json<ProofSubmission>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let attempt_id = Uuid::new_v4();
    tracing::info!(%attempt_id, "Verifying {} submission", submission.key_id());

    let accepted = state.gate.verify(&submission).await.map_err(|e| {
        tracing::info!(%attempt_id, "Submission rejected: {}", e.code());
        ApiError::from(e)
    })?;

    Ok(Json(VerifyResponse {
        result: "accepted",
        nullifier: accepted.nullifier,
        verified_at: accepted.record.verified_at,
        attempt_id,
    }))
}

// ============ Helpers ============

/// 요청 → ProvingRequest. salt가 없으면 새로 생성해서 함께 반환
fn build_request(req: &AttributesRequest) -> Result<(ProvingRequest, Option<Fp>), ApiError> {
    let (salt, generated) = match &req.unique_id_salt {
        Some(s) => (fp_from_hex(s, "unique_id_salt")?, None),
        None => {
            let salt = random_salt();
            (salt, Some(salt))
        }
    };

    let mut builder = WitnessBuilder::new()
        .unique_id_salt(salt)
        .secret_key(fp_from_hex(&req.secret_key, "secret_key")?);

    if let Some(age) = req.age {
        builder = builder.age(age);
    }
    if let Some(risk) = req.country_risk {
        builder = builder.country_risk(risk);
    }
    if let Some(hash) = &req.biometric_hash {
        builder = builder.biometric_hash(fp_from_hex(hash, "biometric_hash")?);
    }
    if let Some(hash) = &req.device_hash {
        builder = builder.device_hash(fp_from_hex(hash, "device_hash")?);
    }

    let request = builder.build(req.circuit_variant)?;
    Ok((request, generated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(age: Option<u64>, salt: Option<&str>) -> AttributesRequest {
        AttributesRequest {
            circuit_variant: CircuitVariant::FullPersonhood,
            age,
            country_risk: Some(1),
            biometric_hash: None,
            device_hash: None,
            unique_id_salt: salt.map(str::to_string),
            secret_key: fp_to_hex(&Fp::from(42u64)),
            context: None,
        }
    }

    #[test]
    fn test_build_request_with_given_salt() {
        let salt = fp_to_hex(&Fp::from(12345u64));
        let (request, generated) = build_request(&attributes(Some(25), Some(&salt))).unwrap();

        assert!(generated.is_none());
        assert!(request.expected_signals().is_valid());
    }

    #[test]
    fn test_build_request_generates_salt() {
        let (first, salt_a) = build_request(&attributes(Some(25), None)).unwrap();
        let (second, salt_b) = build_request(&attributes(Some(25), None)).unwrap();

        assert_ne!(salt_a, salt_b);
        assert_ne!(first.public_inputs().nullifier_hash, second.public_inputs().nullifier_hash);
    }

    #[test]
    fn test_missing_attribute_is_inconsistent_witness() {
        let result = build_request(&attributes(None, None));
        assert!(matches!(result, Err(ApiError::InconsistentWitness(_))));
    }

    #[test]
    fn test_bad_hex_is_bad_request() {
        let result = build_request(&attributes(Some(25), Some("0x1234")));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_compute_inputs_handler() {
        let Json(response) = compute_inputs(Json(attributes(Some(16), None))).await.unwrap();

        assert!(!response.expected_valid);
        assert!(response.unique_id_salt.is_some());
        assert!(response.nullifier_hash.starts_with("0x"));
    }
}
