//! Verifier Gate - 유일한 신뢰 경계
//!
//! # Interview Q&A
//!
//! Q: 검증 순서는?
//! A: 3단계, 앞 단계가 실패하면 뒤 단계는 실행하지 않음
//!
//!    ```text
//!    submission
//!        │
//!        ▼
//!    1. 암호학적 검증 (pinned VK) ──실패──▶ InvalidProof          (상태 변화 없음)
//!        │
//!        ▼
//!    2. publicSignals[0] == 1 ? ───아니오─▶ PredicateNotSatisfied (상태 변화 없음)
//!        │
//!        ▼
//!    3. registry.insert_if_absent ─이미 있음▶ NullifierAlreadyUsed (상태 변화 없음)
//!        │
//!        ▼
//!     Accepted
//!    ```
//!
//! Q: 2단계를 빼먹으면?
//! A: 가장 흔한 구현 실수
//!    - 18세 미만 사용자의 증명도 암호학적으로는 완벽히 유효함 (valid = 0)
//!    - proof만 검증하면 "자격 없음"을 증명한 사람이 통과하게 됨
//!
//! Q: 키 버전이 다르면?
//! A: InvalidProof
//!    - 다른 키로는 어차피 검증이 실패하지만, 버전 불일치는 검증 전에 명시적으로 거부
//!    - variant와 버전은 항상 `KeyId` 한 단위로 비교

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use halo2_proofs::{
    plonk::verify_proof,
    poly::{
        ipa::{
            commitment::{IPACommitmentScheme, ParamsIPA},
            multiopen::VerifierIPA,
            strategy::SingleStrategy,
        },
        VerificationStrategy,
    },
    transcript::{Blake2bRead, Challenge255, TranscriptReadBuffer},
};
use pasta_curves::{EqAffine, Fp};
use thiserror::Error;

use zk_identity_circuits::{
    fp_from_hex, fp_to_hex, instance_column, CircuitError, CircuitVariant, PublicInputs,
    PublicSignals,
};

use crate::db::{NullifierRecord, NullifierRegistry};
use crate::services::zk_prover::PinnedVerifyingKey;
use crate::types::{decode_hex, KeyId, ProofSubmission};

/// 검증 거부 사유
///
/// 소비자가 "증명 무효" / "자격 없음" / "이미 사용됨"을 구분할 수 있어야 함
/// (bool 하나로 뭉개지 않음)
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Proof is valid but the eligibility predicate is not satisfied")]
    PredicateNotSatisfied,

    #[error("Nullifier already used: {0}")]
    NullifierAlreadyUsed(String),

    #[error("Nullifier registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// 검증 작업 자체가 완료되지 못함 (blocking 작업 패닉, 런타임 종료)
    #[error("Proof verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

impl VerificationError {
    /// API 응답에 쓰는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidProof(_) => "INVALID_PROOF",
            VerificationError::PredicateNotSatisfied => "PREDICATE_NOT_SATISFIED",
            VerificationError::NullifierAlreadyUsed(_) => "NULLIFIER_ALREADY_USED",
            VerificationError::RegistryUnavailable(_) => "REGISTRY_UNAVAILABLE",
            VerificationError::VerifierUnavailable(_) => "VERIFIER_UNAVAILABLE",
        }
    }
}

impl From<CircuitError> for VerificationError {
    fn from(err: CircuitError) -> Self {
        VerificationError::InvalidProof(err.to_string())
    }
}

/// 암호학적 검증을 통과한 제출물
#[derive(Debug, Clone, Copy)]
pub struct CheckedProof {
    pub key: KeyId,
    /// 레지스트리 레코드에 기록할 키 버전 (고정된 키에서 가져옴)
    pub registry_version: i32,
    pub signals: PublicSignals,
    pub inputs: PublicInputs,
}

impl CheckedProof {
    /// 레지스트리에 기록할 nullifier (circuit이 직접 도출한 uniqueNullifier)
    pub fn nullifier(&self) -> String {
        fp_to_hex(&self.signals.unique_nullifier)
    }
}

/// 게이트 통과 결과
#[derive(Debug, Clone)]
pub struct Accepted {
    pub nullifier: String,
    pub record: NullifierRecord,
}

/// Verifier Gate
///
/// # Design Decision
///
/// - 검증 키는 생성 시점에 고정 (`PinnedVerifyingKey`), 런타임 교체 없음
/// - 레지스트리는 trait object로 주입 (PostgreSQL / 메모리)
/// - `check_proof`는 동기 + 상태 없음 → 병렬 호출 자유
/// - `verify`는 같은 검증을 blocking 스레드에서 실행 (tokio worker 점유 방지)
pub struct VerifierGate {
    params: Arc<ParamsIPA<EqAffine>>,
    keys: HashMap<CircuitVariant, Arc<PinnedVerifyingKey>>,
    registry: Arc<dyn NullifierRegistry>,
}

impl VerifierGate {
    pub fn new(
        params: Arc<ParamsIPA<EqAffine>>,
        keys: Vec<PinnedVerifyingKey>,
        registry: Arc<dyn NullifierRegistry>,
    ) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| (key.id.variant, Arc::new(key)))
            .collect();
        Self { params, keys, registry }
    }

    /// 게이트에 고정된 키 목록
    pub fn key_ids(&self) -> Vec<KeyId> {
        let mut ids: Vec<KeyId> = self.keys.values().map(|k| k.id).collect();
        ids.sort_by_key(|id| id.variant);
        ids
    }

    pub fn registry(&self) -> &Arc<dyn NullifierRegistry> {
        &self.registry
    }

    /// 1단계: 암호학적 검증
    ///
    /// 알 수 없는 variant, 버전 불일치, hex 오류, 벡터 길이 오류,
    /// non-canonical 인코딩은 모두 InvalidProof
    pub fn check_proof(
        &self,
        submission: &ProofSubmission,
    ) -> Result<CheckedProof, VerificationError> {
        let pinned = self.pinned_for(submission)?;
        verify_with_key(&self.params, &pinned, submission)
    }

    /// 전체 게이트: 검증 → valid 확인 → nullifier 원자적 등록
    pub async fn verify(
        &self,
        submission: &ProofSubmission,
    ) -> Result<Accepted, VerificationError> {
        let pinned = self.pinned_for(submission)?;
        let params = self.params.clone();
        let owned = submission.clone();

        let checked =
            tokio::task::spawn_blocking(move || verify_with_key(&params, &pinned, &owned))
                .await
                .map_err(|e| {
                    tracing::error!("Verifier task failed: {}", e);
                    VerificationError::VerifierUnavailable(e.to_string())
                })??;

        if !checked.signals.is_valid() {
            tracing::info!("{} proof verified with valid = 0", checked.key);
            return Err(VerificationError::PredicateNotSatisfied);
        }

        let nullifier = checked.nullifier();
        let record = NullifierRecord {
            nullifier: nullifier.clone(),
            circuit_variant: checked.key.variant.as_str().to_string(),
            key_version: checked.registry_version,
            context: submission.context.clone(),
            verified_at: Utc::now(),
        };

        let fresh = self
            .registry
            .insert_if_absent(record.clone())
            .await
            .map_err(|e| {
                tracing::error!("Nullifier registry error: {:?}", e);
                VerificationError::RegistryUnavailable(e.to_string())
            })?;

        if !fresh {
            tracing::warn!("Replay rejected for nullifier {}", nullifier);
            return Err(VerificationError::NullifierAlreadyUsed(nullifier));
        }

        tracing::info!("{} attestation accepted", checked.key);
        Ok(Accepted { nullifier, record })
    }

    /// 제출물의 `KeyId`와 정확히 일치하는 고정 키
    fn pinned_for(
        &self,
        submission: &ProofSubmission,
    ) -> Result<Arc<PinnedVerifyingKey>, VerificationError> {
        let requested = submission.key_id();
        let pinned = self.keys.get(&requested.variant).ok_or_else(|| {
            VerificationError::InvalidProof(format!(
                "no verifying key pinned for {}",
                requested.variant
            ))
        })?;

        if pinned.id != requested {
            return Err(VerificationError::InvalidProof(format!(
                "key mismatch: submitted {}, pinned {}",
                requested, pinned.id
            )));
        }
        Ok(pinned.clone())
    }
}

fn verify_with_key(
    params: &ParamsIPA<EqAffine>,
    pinned: &PinnedVerifyingKey,
    submission: &ProofSubmission,
) -> Result<CheckedProof, VerificationError> {
    let proof = decode_hex(&submission.proof)
        .map_err(|e| VerificationError::InvalidProof(format!("proof: {}", e)))?;
    let signals = decode_fields(&submission.public_signals, "public_signals")?;
    let inputs = decode_fields(&submission.public_inputs, "public_inputs")?;
    let signals = PublicSignals::from_slice(&signals)?;
    let inputs = PublicInputs::from_slice(&inputs)?;

    let instance = instance_column(&signals, &inputs);

    let mut transcript =
        Blake2bRead::<_, EqAffine, Challenge255<EqAffine>>::init(proof.as_slice());
    let strategy = SingleStrategy::new(params);
    verify_proof::<IPACommitmentScheme<EqAffine>, VerifierIPA<'_, EqAffine>, _, _, _>(
        params,
        &pinned.vk,
        strategy,
        &[&[instance.as_slice()]],
        &mut transcript,
    )
    .map_err(|e| VerificationError::InvalidProof(e.to_string()))?;

    Ok(CheckedProof {
        key: pinned.id,
        registry_version: pinned.registry_version,
        signals,
        inputs,
    })
}

fn decode_fields(values: &[String], field: &str) -> Result<Vec<Fp>, VerificationError> {
    values
        .iter()
        .map(|v| fp_from_hex(v, field).map_err(VerificationError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_VARIANTS;
    use crate::db::InMemoryNullifierRegistry;
    use crate::services::ZKProver;
    use zk_identity_circuits::{WitnessBuilder, K};

    const SECRET_KEY: u64 = 0xb0b;

    struct Harness {
        prover: ZKProver,
        gate: Arc<VerifierGate>,
        registry: Arc<InMemoryNullifierRegistry>,
    }

    async fn harness() -> Harness {
        harness_with_version(1).await
    }

    async fn harness_with_version(key_version: u32) -> Harness {
        let prover = ZKProver::new(K, key_version, DEFAULT_VARIANTS.to_vec()).unwrap();
        let registry = Arc::new(InMemoryNullifierRegistry::new());
        let keys = prover.pinned_keys().await.unwrap();
        let gate = Arc::new(VerifierGate::new(prover.params(), keys, registry.clone()));
        Harness { prover, gate, registry }
    }

    async fn submit(prover: &ZKProver, age: u64, risk: u64, salt: u64) -> ProofSubmission {
        let request = WitnessBuilder::new()
            .age(age)
            .country_risk(risk)
            .unique_id_salt(Fp::from(salt))
            .secret_key(Fp::from(SECRET_KEY))
            .build(CircuitVariant::FullPersonhood)
            .unwrap();
        prover.prove(&request, None).await.unwrap()
    }

    fn flip_low_bit(hex_value: &str) -> String {
        let mut bytes = decode_hex(hex_value).unwrap();
        bytes[0] ^= 1;
        format!("0x{}", hex::encode(bytes))
    }

    // ============ Scenarios ============

    #[tokio::test]
    async fn test_eligible_attestation_accepted_and_registered() {
        let h = harness().await;
        let submission = submit(&h.prover, 25, 1, 12345).await;

        let accepted = h.gate.verify(&submission).await.unwrap();
        assert_eq!(accepted.nullifier, submission.public_signals[1]);
        assert_eq!(accepted.record.circuit_variant, "full-personhood");
        assert!(h.registry.contains(&accepted.nullifier).await.unwrap());
        assert_eq!(h.registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resubmission_is_replay() {
        let h = harness().await;
        let submission = submit(&h.prover, 25, 1, 12345).await;

        h.gate.verify(&submission).await.unwrap();
        let second = h.gate.verify(&submission).await;

        assert!(matches!(second, Err(VerificationError::NullifierAlreadyUsed(_))));
        assert_eq!(h.registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_underage_is_predicate_failure() {
        let h = harness().await;
        let submission = submit(&h.prover, 16, 1, 999).await;

        // 암호학적으로는 유효
        assert!(h.gate.check_proof(&submission).is_ok());

        let result = h.gate.verify(&submission).await;
        assert!(matches!(result, Err(VerificationError::PredicateNotSatisfied)));
        assert_eq!(h.registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_high_risk_is_predicate_failure() {
        let h = harness().await;
        let submission = submit(&h.prover, 30, 3, 67890).await;

        let result = h.gate.verify(&submission).await;
        assert!(matches!(result, Err(VerificationError::PredicateNotSatisfied)));
    }

    #[tokio::test]
    async fn test_tampered_public_inputs_are_invalid() {
        let h = harness().await;
        let submission = submit(&h.prover, 25, 1, 12345).await;

        for index in 0..2 {
            let mut tampered = submission.clone();
            tampered.public_inputs[index] = flip_low_bit(&tampered.public_inputs[index]);

            let result = h.gate.verify(&tampered).await;
            assert!(
                matches!(result, Err(VerificationError::InvalidProof(_))),
                "input {}",
                index
            );
        }
        assert_eq!(h.registry.count().await.unwrap(), 0);

        // 원본은 여전히 통과
        assert!(h.gate.verify(&submission).await.is_ok());
    }

    // ============ Security ============

    #[tokio::test]
    async fn test_forged_valid_signal_is_invalid() {
        let h = harness().await;
        let mut submission = submit(&h.prover, 16, 1, 999).await;
        submission.public_signals[0] = fp_to_hex(&Fp::from(1u64));

        let result = h.gate.verify(&submission).await;
        assert!(matches!(result, Err(VerificationError::InvalidProof(_))));
    }

    #[tokio::test]
    async fn test_key_version_mismatch_is_invalid() {
        let h = harness().await;
        let mut submission = submit(&h.prover, 25, 1, 12345).await;
        submission.key_version = 2;

        let result = h.gate.check_proof(&submission);
        assert!(matches!(result, Err(VerificationError::InvalidProof(_))));
    }

    #[tokio::test]
    async fn test_highest_key_version_is_recorded() {
        let h = harness_with_version(i32::MAX as u32).await;
        let submission = submit(&h.prover, 25, 1, 12345).await;
        assert_eq!(submission.key_version, i32::MAX as u32);

        let accepted = h.gate.verify(&submission).await.unwrap();
        assert_eq!(accepted.record.key_version, i32::MAX);

        let stored = h.registry.get(&accepted.nullifier).await.unwrap().unwrap();
        assert_eq!(stored.key_version, i32::MAX);
    }

    #[tokio::test]
    async fn test_wrong_variant_tag_is_invalid() {
        let h = harness().await;
        let mut submission = submit(&h.prover, 25, 1, 12345).await;

        // 같은 proof를 다른 variant의 키로 검증
        submission.circuit_variant = CircuitVariant::AgeOnly;
        let result = h.gate.check_proof(&submission);
        assert!(matches!(result, Err(VerificationError::InvalidProof(_))));

        // 게이트에 고정되지 않은 variant
        submission.circuit_variant = CircuitVariant::AntiSybilOnly;
        let result = h.gate.check_proof(&submission);
        assert!(matches!(result, Err(VerificationError::InvalidProof(_))));
    }

    #[tokio::test]
    async fn test_malformed_encodings_are_invalid() {
        let h = harness().await;
        let submission = submit(&h.prover, 25, 1, 12345).await;

        let mut bad_hex = submission.clone();
        bad_hex.proof = "0xnot-hex".to_string();

        let mut short_signals = submission.clone();
        short_signals.public_signals.pop();

        let mut non_canonical = submission.clone();
        non_canonical.public_inputs[1] = format!("0x{}", "ff".repeat(32));

        let mut truncated = submission.clone();
        truncated.proof.truncate(truncated.proof.len() / 2);

        for tampered in [bad_hex, short_signals, non_canonical, truncated] {
            let result = h.gate.check_proof(&tampered);
            assert!(matches!(result, Err(VerificationError::InvalidProof(_))));
        }
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_accept_exactly_once() {
        let h = harness().await;
        let submission = submit(&h.prover, 25, 1, 12345).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = h.gate.clone();
                let submission = submission.clone();
                tokio::spawn(async move { gate.verify(&submission).await })
            })
            .collect();

        let mut accepted = 0;
        let mut replays = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(VerificationError::NullifierAlreadyUsed(_)) => replays += 1,
                Err(other) => panic!("unexpected rejection: {}", other),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(replays, 7);
        assert_eq!(h.registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_new_salt_gives_new_slot() {
        let h = harness().await;
        let first = submit(&h.prover, 25, 1, 1).await;
        let second = submit(&h.prover, 25, 1, 2).await;

        h.gate.verify(&first).await.unwrap();
        h.gate.verify(&second).await.unwrap();
        assert_eq!(h.registry.count().await.unwrap(), 2);
    }
}
