//! Health Check Endpoint
//!
//! # Interview Q&A
//!
//! Q: Health check 엔드포인트는 왜 필요한가?
//! A: 3가지 용도
//!    1. 로드밸런서 헬스체크 (ALB, nginx)
//!    2. Kubernetes liveness/readiness probe
//!    3. 모니터링 시스템 연동 (Prometheus, Datadog)
//!
//! Q: 레지스트리 상태도 체크하는 이유는?
//! A: "깊은 헬스체크"(deep health check) 패턴
//!    - 단순 200 OK: 프로세스 살아있음
//!    - 레지스트리 조회: 실제로 nullifier를 등록할 수 있는 상태
//!    - 레지스트리 장애 시 게이트는 모든 제출을 거부하므로 트래픽 차단 필요

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub registry: RegistryStatus,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct RegistryStatus {
    pub backend: String,
    pub connected: bool,
    pub nullifier_count: Option<u64>,
    pub latency_ms: Option<u64>,
}

/// GET /health
///
/// 서버 및 레지스트리 상태 확인
pub async fn health_check(
    State(state): State<AppState>,
) -> Json<HealthResponse> {
    let start = std::time::Instant::now();

    let db_ok = match &state.db {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let count = if db_ok {
        state.registry.count().await.ok()
    } else {
        None
    };

    let registry = RegistryStatus {
        backend: state.config.registry_backend.as_str().to_string(),
        connected: count.is_some(),
        nullifier_count: count,
        latency_ms: count.map(|_| start.elapsed().as_millis() as u64),
    };

    Json(HealthResponse {
        status: if registry.connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        registry,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
