//! Database Models
//!
//! 소비된 nullifier 기록. 비밀값이나 속성은 저장하지 않음:
//! nullifier 자체가 H(secretKey, salt)이므로 원래 값을 알 수 없음.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// 소비된 nullifier 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct NullifierRecord {
    /// 0x hex (little-endian repr). Primary key
    pub nullifier: String,

    /// 어떤 회로로 검증되었는지 (예: "full-personhood")
    pub circuit_variant: String,

    /// 검증에 사용된 키 버전
    pub key_version: i32,

    /// 검증 컨텍스트 (옵션)
    pub context: Option<String>,

    /// 최초 검증 시각. 이후 변경되지 않음
    pub verified_at: DateTime<Utc>,
}
