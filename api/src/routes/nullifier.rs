//! Nullifier Lookup Endpoint
//!
//! 소비자가 nullifier 사용 여부만 조회. 등록/삭제 경로는 없음
//! (등록은 Verifier Gate를 통해서만 일어남)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use zk_identity_circuits::{fp_from_hex, fp_to_hex};

use crate::{db::NullifierRecord, error::ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct NullifierResponse {
    pub nullifier: String,
    pub used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<NullifierRecord>,
}

/// GET /nullifier/:nullifier
///
/// hex 표기를 canonical 형태로 정규화한 뒤 조회
pub async fn get_nullifier(
    State(state): State<AppState>,
    Path(nullifier): Path<String>,
) -> Result<Json<NullifierResponse>, ApiError> {
    let nullifier = fp_to_hex(&fp_from_hex(&nullifier.to_lowercase(), "nullifier")?);

    let record = state.registry.get(&nullifier).await.map_err(|e| {
        tracing::error!("Nullifier lookup failed: {:?}", e);
        ApiError::ServiceUnavailable("Nullifier registry".to_string())
    })?;

    Ok(Json(NullifierResponse {
        nullifier,
        used: record.is_some(),
        record,
    }))
}
