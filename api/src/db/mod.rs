//! Database Module
//!
//! # Interview Q&A
//!
//! Q: 왜 PostgreSQL을 선택했는가?
//! A: nullifier 레지스트리에 필요한 성질
//!
//!    1. 영속성: 재시작 후에도 소비된 nullifier 유지 (replay 방지)
//!    2. PRIMARY KEY 제약: 중복 삽입을 DB가 직접 거부
//!    3. `ON CONFLICT DO NOTHING`: check-and-set을 한 문장으로 처리
//!    4. 생태계: SQLx 등 Rust 라이브러리 지원
//!
//! Q: 동시에 같은 nullifier가 들어오면?
//! A: PRIMARY KEY 인덱스에서 직렬화됨
//!    - 먼저 커밋한 쪽: rows_affected = 1
//!    - 나머지: rows_affected = 0 → NullifierAlreadyUsed
//!    - 애플리케이션 레벨 락 불필요
//!
//! Q: 커넥션 풀은 어떻게 관리하는가?
//! A: SQLx의 PgPool 사용
//!    - 최소/최대 커넥션 수 설정
//!    - 커넥션 재사용 (오버헤드 감소)
//!    - 타임아웃 처리

mod models;
mod repository;

pub use models::*;
pub use repository::{InMemoryNullifierRegistry, NullifierRegistry};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL 기반 nullifier 레지스트리
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10 (트래픽에 따라 조정)
    /// - min_connections: 1 (idle 시 최소 유지)
    /// - acquire_timeout: 3초 (커넥션 획득 대기)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NullifierRegistry for Database {
    async fn contains(&self, nullifier: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM nullifiers WHERE nullifier = $1)"
        )
        .bind(nullifier)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// `ON CONFLICT DO NOTHING`의 affected rows가 곧 check-and-set 결과
    async fn insert_if_absent(&self, record: NullifierRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO nullifiers (
                nullifier, circuit_variant, key_version, context, verified_at
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (nullifier) DO NOTHING
            "#
        )
        .bind(&record.nullifier)
        .bind(&record.circuit_variant)
        .bind(record.key_version)
        .bind(&record.context)
        .bind(record.verified_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, nullifier: &str) -> Result<Option<NullifierRecord>> {
        let record = sqlx::query_as::<_, NullifierRecord>(
            r#"
            SELECT
                nullifier,
                circuit_variant,
                key_version,
                context,
                verified_at
            FROM nullifiers
            WHERE nullifier = $1
            "#
        )
        .bind(nullifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nullifiers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 as u64)
    }
}

/// PostgreSQL 레지스트리 테스트
///
/// 실제 DB가 필요하므로 기본 실행에서 제외:
///   DATABASE_URL=postgres://... cargo test -p zk-identity-api -- --ignored postgres
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    /// DATABASE_URL이 없으면 None (테스트는 건너뜀)
    async fn connect() -> Option<Database> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let db = Database::connect(&url).await.unwrap();
        db.run_migrations().await.unwrap();
        Some(db)
    }

    /// 실행마다 겹치지 않는 nullifier
    fn fresh_nullifier() -> String {
        format!("0x{}", Uuid::new_v4().simple())
    }

    fn record(nullifier: &str, context: &str) -> NullifierRecord {
        NullifierRecord {
            nullifier: nullifier.to_string(),
            circuit_variant: "full-personhood".to_string(),
            key_version: 1,
            context: Some(context.to_string()),
            verified_at: Utc::now(),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_insert_once_and_survives_reconnect() {
        let Some(db) = connect().await else { return };
        let nullifier = fresh_nullifier();

        assert!(!db.contains(&nullifier).await.unwrap());
        assert!(db.insert_if_absent(record(&nullifier, "first")).await.unwrap());
        assert!(!db.insert_if_absent(record(&nullifier, "second")).await.unwrap());

        // 재시작: 풀을 버리고 새로 연결
        drop(db);
        let Some(restarted) = connect().await else { return };

        assert!(restarted.contains(&nullifier).await.unwrap());
        let stored = restarted.get(&nullifier).await.unwrap().unwrap();
        assert_eq!(stored.context.as_deref(), Some("first"));
        assert!(!restarted.insert_if_absent(record(&nullifier, "third")).await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_concurrent_inserts_exactly_one_wins() {
        let Some(db) = connect().await else { return };
        let db = Arc::new(db);
        let nullifier = fresh_nullifier();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let db = db.clone();
                let record = record(&nullifier, &format!("attempt-{}", i));
                tokio::spawn(async move { db.insert_if_absent(record).await.unwrap() })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert!(db.contains(&nullifier).await.unwrap());
    }
}
