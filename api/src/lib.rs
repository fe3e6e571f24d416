//! ZK Identity Attestation API Library
//!
//! # Overview
//!
//! 이 라이브러리는 ZK Identity Attestation 서브시스템의 백엔드 API를 제공합니다.
//! 사용자는 나이/국가 위험도 등 속성을 공개하지 않고 자격을 증명하며,
//! 같은 신원은 nullifier로 한 번만 사용할 수 있습니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            API                                │
//! │                                                               │
//! │  WitnessBuilder ──▶ ZKProver ──▶ ProofSubmission              │
//! │                                        │                      │
//! │                                        ▼                      │
//! │                                  VerifierGate                 │
//! │                          (pinned VK, valid == 1 확인)          │
//! │                                        │                      │
//! │                                        ▼                      │
//! │                  NullifierRegistry (PostgreSQL | Memory)      │
//! └────────────────────────────────────────┼─────────────────────┘
//!                                          │ Accepted / 거부 사유
//!                                          ▼
//!                              ┌──────────────────────┐
//!                              │  외부 소비자          │
//!                              │  (lending "verified") │
//!                              └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: ZK Prover, Verifier Gate
//! - `db`: nullifier 레지스트리 (PostgreSQL / 메모리)
//! - `types`: 제출 payload, 키 식별자
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zk_identity_api::{config::Config, AppState, create_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(config).await?;
//!     let app = create_router(state);
//!
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::{Config, RegistryBackend};
pub use error::ApiError;
pub use db::{Database, InMemoryNullifierRegistry, NullifierRegistry};
pub use services::{VerifierGate, ZKProver};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub prover: Arc<ZKProver>,
    pub gate: Arc<VerifierGate>,
    pub registry: Arc<dyn NullifierRegistry>,
    /// PostgreSQL 백엔드일 때만 존재 (health check용)
    pub db: Option<Arc<Database>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 설정에 따라 레지스트리/Prover/Gate 구성
    ///
    /// # Design Decision
    ///
    /// Gate의 검증 키는 Prover가 생성한 키를 그대로 고정 (시작 시 keygen).
    /// 키와 variant는 `KeyId` 단위로 묶여 이동하므로 따로 어긋날 수 없음
    pub async fn from_config(config: Config) -> Result<Self> {
        let (registry, db): (Arc<dyn NullifierRegistry>, Option<Arc<Database>>) =
            match config.registry_backend {
                RegistryBackend::Postgres => {
                    let db = Arc::new(
                        Database::connect(&config.database_url)
                            .await
                            .context("Failed to connect to PostgreSQL")?,
                    );
                    tracing::info!("🗄️  Database connected");

                    db.run_migrations().await.context("Failed to run migrations")?;
                    tracing::info!("📦 Migrations completed");

                    let registry: Arc<dyn NullifierRegistry> = db.clone();
                    (registry, Some(db))
                }
                RegistryBackend::Memory => {
                    tracing::warn!("⚠️  In-memory nullifier registry: lost on restart");
                    let registry: Arc<dyn NullifierRegistry> =
                        Arc::new(InMemoryNullifierRegistry::new());
                    (registry, None)
                }
            };

        Self::with_registry(config, registry, db).await
    }

    /// 주어진 레지스트리로 상태 구성 (테스트에서 직접 사용)
    pub async fn with_registry(
        config: Config,
        registry: Arc<dyn NullifierRegistry>,
        db: Option<Arc<Database>>,
    ) -> Result<Self> {
        let prover = ZKProver::new(
            config.circuit_k,
            config.key_version,
            config.enabled_variants.clone(),
        )
        .context("Failed to initialize ZK prover")?;
        tracing::info!("🔐 ZK Prover initialized");

        let keys = prover.pinned_keys().await.context("Failed to generate verifying keys")?;
        for key in &keys {
            tracing::info!("📌 Pinned verifying key {}", key.id);
        }

        let gate = VerifierGate::new(prover.params(), keys, registry.clone());

        Ok(Self {
            prover: Arc::new(prover),
            gate: Arc::new(gate),
            registry,
            db,
            config: Arc::new(config),
        })
    }
}

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                - 서버 상태 확인
///
/// POST /attestation/inputs    - public input 계산 (증명 없음)
/// POST /attestation/prove     - ZK 증명 생성
/// POST /attestation/verify    - Verifier Gate
///
/// GET  /nullifier/:nullifier  - nullifier 사용 여부
/// GET  /keys                  - 고정된 검증 키 목록
/// ```
pub fn create_router(state: AppState) -> Router {
    // CORS 설정
    // 프로덕션에서는 특정 도메인만 허용
    // 개발 환경에서는 localhost 허용
    let cors = if state.config.is_production() {
        // 프로덕션: 특정 도메인만 허용 (환경변수로 설정)
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string());
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // 개발: localhost 허용
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:5173"), // Vite dev server
                HeaderValue::from_static("http://localhost:3000"), // Alternative
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Attestation
        .route("/attestation/inputs", post(routes::attestation::compute_inputs))
        .route("/attestation/prove", post(routes::attestation::prove))
        .route("/attestation/verify", post(routes::attestation::verify))
        // Registry / keys
        .route("/nullifier/:nullifier", get(routes::nullifier::get_nullifier))
        .route("/keys", get(routes::keys::list_keys))
        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // 상태 주입
        .with_state(state)
}

#[cfg(test)]
mod tests;
