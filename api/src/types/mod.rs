//! Common Types Module
//!
//! 증명 제출 payload와 키 식별자 등 서비스 간에 오가는 타입 정의
//!
//! # Design Decision
//!
//! `ProofSubmission`의 필드는 모두 문자열(hex)로 받음:
//! - JSON 역직렬화 단계에서 실패하면 axum이 자체 에러를 반환함
//! - 디코딩을 Verifier Gate 안에서 해야 malformed 입력이 일관되게 `InvalidProof`가 됨

use std::fmt;

use serde::{Deserialize, Serialize};
use zk_identity_circuits::{fp_to_hex, CircuitVariant, PublicInputs, PublicSignals};

/// 검증 키 식별자: variant와 버전은 항상 한 단위로 다룸
///
/// 같은 variant라도 버전이 다르면 다른 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId {
    pub variant: CircuitVariant,
    pub version: u32,
}

impl KeyId {
    pub fn new(variant: CircuitVariant, version: u32) -> Self {
        Self { variant, version }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.variant, self.version)
    }
}

/// 증명 제출 payload
///
/// ```text
/// {
///   "circuit_variant": "full-personhood",
///   "key_version": 1,
///   "proof": "0x...",
///   "public_signals": ["0x<valid>", "0x<uniqueNullifier>"],
///   "public_inputs": ["0x<nullifierHash>", "0x<commitmentHash>"],
///   "context": "lending-pool-v2"
/// }
/// ```
///
/// 소비자는 이 payload를 불투명하게 다루고 검증 결과와 nullifier만 읽음
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub circuit_variant: CircuitVariant,
    pub key_version: u32,
    /// Halo2 transcript bytes (0x hex)
    pub proof: String,
    /// `[valid, uniqueNullifier]`
    pub public_signals: Vec<String>,
    /// `[nullifierHash, commitmentHash]`
    pub public_inputs: Vec<String>,
    /// 검증 컨텍스트 (레지스트리 레코드에 함께 저장됨)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ProofSubmission {
    pub fn new(
        key: KeyId,
        proof: &[u8],
        signals: &PublicSignals,
        inputs: &PublicInputs,
        context: Option<String>,
    ) -> Self {
        Self {
            circuit_variant: key.variant,
            key_version: key.version,
            proof: format!("0x{}", hex::encode(proof)),
            public_signals: signals.to_vec().iter().map(fp_to_hex).collect(),
            public_inputs: inputs.to_vec().iter().map(fp_to_hex).collect(),
            context,
        }
    }

    pub fn key_id(&self) -> KeyId {
        KeyId::new(self.circuit_variant, self.key_version)
    }
}

/// 0x 접두사가 있거나 없는 hex 문자열을 bytes로 변환
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}
