//! Nullifier Registry (Repository Pattern)
//!
//! # Interview Q&A
//!
//! Q: 왜 trait로 추상화했는가?
//! A: 저장소 교체 가능성 + 테스트 용이성
//!
//!    ```rust
//!    // Verifier Gate는 trait만 알고 있음
//!    let fresh = registry.insert_if_absent(record).await?;
//!
//!    // PostgreSQL 구현 (프로덕션, db/mod.rs)
//!    impl NullifierRegistry for Database { ... }
//!
//!    // 메모리 구현 (개발/테스트)
//!    impl NullifierRegistry for InMemoryNullifierRegistry { ... }
//!    ```
//!
//! Q: contains() 후 insert() 하면 안 되는 이유는?
//! A: TOCTOU (time-of-check to time-of-use) 경쟁 조건
//!
//!    ```text
//!    요청 A: contains(n) → false
//!    요청 B: contains(n) → false
//!    요청 A: insert(n)   → 성공
//!    요청 B: insert(n)   → 성공  ← 같은 nullifier가 두 번 통과!
//!    ```
//!
//!    그래서 check-and-set을 하나의 원자적 연산(`insert_if_absent`)으로 제공
//!    - 메모리: 하나의 Mutex 잠금 안에서 확인 + 삽입
//!    - PostgreSQL: `INSERT ... ON CONFLICT DO NOTHING` + affected rows
//!
//! Q: nullifier를 삭제할 수 있는가?
//! A: 없음. Unused → Used 단방향 전이만 존재
//!    - trait에 remove 메서드 자체가 없음

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::models::NullifierRecord;

/// 소비된 nullifier 집합
#[async_trait]
pub trait NullifierRegistry: Send + Sync {
    /// 이미 사용된 nullifier인지 확인 (조회 전용, 게이트 판정에 쓰지 않음)
    async fn contains(&self, nullifier: &str) -> Result<bool>;

    /// 원자적 check-and-insert
    ///
    /// 새로 삽입되면 `true`, 이미 있으면 `false` (기존 레코드는 그대로)
    async fn insert_if_absent(&self, record: NullifierRecord) -> Result<bool>;

    /// 레코드 조회
    async fn get(&self, nullifier: &str) -> Result<Option<NullifierRecord>>;

    /// 지금까지 소비된 nullifier 수
    async fn count(&self) -> Result<u64>;
}

/// 메모리 기반 레지스트리
///
/// 프로세스가 종료되면 내용이 사라짐. 개발/테스트 전용
#[derive(Default)]
pub struct InMemoryNullifierRegistry {
    entries: Mutex<HashMap<String, NullifierRecord>>,
}

impl InMemoryNullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NullifierRegistry for InMemoryNullifierRegistry {
    async fn contains(&self, nullifier: &str) -> Result<bool> {
        Ok(self.entries.lock().await.contains_key(nullifier))
    }

    async fn insert_if_absent(&self, record: NullifierRecord) -> Result<bool> {
        // 확인과 삽입이 같은 잠금 안에서 일어남
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&record.nullifier) {
            return Ok(false);
        }
        entries.insert(record.nullifier.clone(), record);
        Ok(true)
    }

    async fn get(&self, nullifier: &str) -> Result<Option<NullifierRecord>> {
        Ok(self.entries.lock().await.get(nullifier).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.lock().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn record(nullifier: &str, context: Option<&str>) -> NullifierRecord {
        NullifierRecord {
            nullifier: nullifier.to_string(),
            circuit_variant: "full-personhood".to_string(),
            key_version: 1,
            context: context.map(str::to_string),
            verified_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_once() {
        let registry = InMemoryNullifierRegistry::new();

        assert!(!registry.contains("0x01").await.unwrap());
        assert!(registry.insert_if_absent(record("0x01", None)).await.unwrap());
        assert!(registry.contains("0x01").await.unwrap());
        assert!(!registry.insert_if_absent(record("0x01", None)).await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_insert_keeps_first_record() {
        let registry = InMemoryNullifierRegistry::new();

        registry.insert_if_absent(record("0x02", Some("first"))).await.unwrap();
        registry.insert_if_absent(record("0x02", Some("second"))).await.unwrap();

        let stored = registry.get("0x02").await.unwrap().unwrap();
        assert_eq!(stored.context.as_deref(), Some("first"));
        assert!(registry.get("0x03").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_exactly_one_wins() {
        let registry = Arc::new(InMemoryNullifierRegistry::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .insert_if_absent(record("0xaa", None))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[test]
    fn test_count_with_block_on() {
        let registry = InMemoryNullifierRegistry::new();
        tokio_test::block_on(async {
            registry.insert_if_absent(record("0x10", None)).await.unwrap();
            registry.insert_if_absent(record("0x11", None)).await.unwrap();
        });
        assert_eq!(tokio_test::block_on(registry.count()).unwrap(), 2);
    }
}
