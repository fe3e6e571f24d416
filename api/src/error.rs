//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use zk_identity_circuits::CircuitError;

use crate::services::{ProverError, VerificationError};

/// API 에러 타입
///
/// # Design Decision
///
/// 각 에러 variant는 적절한 HTTP 상태 코드에 매핑됨
/// - 클라이언트 에러: 4xx (잘못된 요청, 검증 거부 등)
/// - 서버 에러: 5xx (내부 오류, 저장소 장애)
///
/// 게이트 거부 사유는 서로 다른 코드로 구분해서 반환
/// (INVALID_PROOF / PREDICATE_NOT_SATISFIED / NULLIFIER_ALREADY_USED)
///
/// 민감한 내부 정보는 클라이언트에 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Inconsistent witness: {0}")]
    InconsistentWitness(String),

    // ============ 403 Forbidden ============
    #[error("Eligibility predicate not satisfied")]
    PredicateNotSatisfied,

    // ============ 409 Conflict ============
    #[error("Nullifier already used: {0}")]
    NullifierAlreadyUsed(String),

    // ============ 422 Unprocessable Entity ============
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Witness constraint infeasible: {0}")]
    WitnessConstraintInfeasible(String),

    // ============ 500 Internal Server Error ============
    #[error("Internal server error")]
    InternalError,

    // ============ 503 Service Unavailable ============
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// API 에러 응답 구조
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // 4xx 클라이언트 에러
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            ApiError::InconsistentWitness(msg) => (
                StatusCode::BAD_REQUEST,
                "INCONSISTENT_WITNESS",
                "Attributes cannot be wired into the circuit".to_string(),
                Some(msg.clone()),
            ),
            ApiError::PredicateNotSatisfied => (
                StatusCode::FORBIDDEN,
                "PREDICATE_NOT_SATISFIED",
                "Proof is valid but eligibility criteria are not met".to_string(),
                None,
            ),
            ApiError::NullifierAlreadyUsed(nullifier) => (
                StatusCode::CONFLICT,
                "NULLIFIER_ALREADY_USED",
                "Nullifier has already been used".to_string(),
                Some(nullifier.clone()),
            ),
            ApiError::InvalidProof(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PROOF",
                "Proof verification failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::WitnessConstraintInfeasible(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "WITNESS_CONSTRAINT_INFEASIBLE",
                "Failed to generate ZK proof".to_string(),
                Some(msg.clone()),
            ),

            // 5xx 서버 에러
            ApiError::InternalError => {
                // 내부 에러는 클라이언트에 상세 정보 노출 안 함
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                format!("{} is currently unavailable", service),
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CircuitError> for ApiError {
    fn from(err: CircuitError) -> Self {
        if err.is_inconsistent_witness() {
            ApiError::InconsistentWitness(err.to_string())
        } else {
            ApiError::BadRequest(err.to_string())
        }
    }
}

impl From<ProverError> for ApiError {
    fn from(err: ProverError) -> Self {
        match err {
            ProverError::InconsistentWitness(e) => e.into(),
            ProverError::WitnessConstraintInfeasible { .. } => {
                ApiError::WitnessConstraintInfeasible(err.to_string())
            }
            ProverError::VariantDisabled(_) => ApiError::BadRequest(err.to_string()),
            ProverError::InvalidK(_)
            | ProverError::InvalidKeyVersion(_)
            | ProverError::KeyGeneration { .. }
            | ProverError::Proving(_) => {
                tracing::error!("Prover error: {}", err);
                ApiError::InternalError
            }
        }
    }
}

/// 게이트 거부 사유를 그대로 코드로 전달
impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidProof(msg) => ApiError::InvalidProof(msg),
            VerificationError::PredicateNotSatisfied => ApiError::PredicateNotSatisfied,
            VerificationError::NullifierAlreadyUsed(nullifier) => {
                ApiError::NullifierAlreadyUsed(nullifier)
            }
            VerificationError::RegistryUnavailable(_) => {
                ApiError::ServiceUnavailable("Nullifier registry".to_string())
            }
            VerificationError::VerifierUnavailable(_) => {
                ApiError::ServiceUnavailable("Proof verifier".to_string())
            }
        }
    }
}

/// anyhow 에러를 ApiError로 변환
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Anyhow error: {:?}", err);
        ApiError::InternalError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zk_identity_circuits::CircuitVariant;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    fn code_of(err: ApiError) -> String {
        let body = err.into_response().into_body();
        let bytes = tokio_test::block_on(axum::body::to_bytes(body, usize::MAX)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["code"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_gate_rejections_map_to_distinct_statuses() {
        use VerificationError::*;

        let cases = [
            (InvalidProof("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (PredicateNotSatisfied, StatusCode::FORBIDDEN),
            (NullifierAlreadyUsed("0x01".into()), StatusCode::CONFLICT),
            (RegistryUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (VerifierUnavailable("panic".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(status_of(err), status);
        }
    }

    /// 모든 variant가 실제 변환 경로에서 만들어지고 서로 다른 코드를 가짐
    #[test]
    fn test_every_variant_is_reachable_with_its_own_code() {
        let missing = CircuitError::MissingAttribute { field: "age".into() };
        let bad_hex = CircuitError::InvalidFieldEncoding {
            field: "salt".into(),
            reason: "odd length".into(),
        };
        let infeasible = ProverError::WitnessConstraintInfeasible {
            variant: CircuitVariant::AgeOnly,
            reason: "lookup".into(),
        };

        let produced = [
            ApiError::from(bad_hex),
            ApiError::from(missing),
            ApiError::from(VerificationError::PredicateNotSatisfied),
            ApiError::from(VerificationError::NullifierAlreadyUsed("0x01".into())),
            ApiError::from(VerificationError::InvalidProof("x".into())),
            ApiError::from(infeasible),
            ApiError::from(anyhow::anyhow!("boom")),
            ApiError::from(VerificationError::RegistryUnavailable("down".into())),
        ];

        let codes: Vec<String> = produced.into_iter().map(code_of).collect();
        assert_eq!(
            codes,
            vec![
                "BAD_REQUEST",
                "INCONSISTENT_WITNESS",
                "PREDICATE_NOT_SATISFIED",
                "NULLIFIER_ALREADY_USED",
                "INVALID_PROOF",
                "WITNESS_CONSTRAINT_INFEASIBLE",
                "INTERNAL_ERROR",
                "SERVICE_UNAVAILABLE",
            ]
        );
    }

    #[test]
    fn test_prover_errors() {
        let missing = CircuitError::MissingAttribute { field: "age".into() };
        assert_eq!(status_of(ProverError::InconsistentWitness(missing)), StatusCode::BAD_REQUEST);

        let infeasible = ProverError::WitnessConstraintInfeasible {
            variant: CircuitVariant::AgeOnly,
            reason: "lookup".into(),
        };
        assert_eq!(status_of(infeasible), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_of(ProverError::Proving("oops".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ProverError::InvalidKeyVersion(0)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
