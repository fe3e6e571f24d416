//! ZK Prover Service - Real Halo2 Integration
//!
//! # Interview Q&A
//!
//! Q: ZK Proof 생성 과정을 설명해주세요
//! A: 4단계 과정
//!
//!    1. Circuit Setup (variant별 일회성)
//!       - 빈 회로로 keygen() → Proving Key (PK) + Verification Key (VK)
//!       - variant마다 회로 모양이 다르므로 키도 다름
//!
//!    2. Witness 생성
//!       - WitnessBuilder가 원시 속성 + salt + secretKey를 검증
//!       - nullifierHash, commitmentHash와 예상 [valid, uniqueNullifier] 계산
//!
//!    3. Proof 생성
//!       - create_proof(PK, Circuit, instance) → Proof
//!       - 다항식 연산, FFT, MSM 등 CPU 집약적 작업
//!
//!    4. 제출 payload 구성
//!       - proof bytes + public signals + public inputs를 hex로 직렬화
//!
//! Q: valid = 0 인 증명도 생성하는가?
//! A: 예. 나이가 18 미만이어도 증명은 생성됨
//!    - 회로가 "불만족"을 abort가 아닌 valid = 0 출력으로 표현
//!    - "증명 생성 실패"와 "자격 없음"을 구분할 수 없게 만들어 정보 누출 방지
//!    - valid = 0 증명은 Verifier Gate가 PredicateNotSatisfied로 거부
//!
//! Q: 그럼 증명 생성이 실패하는 경우는?
//! A: WitnessConstraintInfeasible
//!    - 값이 회로 배선 자체를 만족할 수 없을 때 (예: 비교기 비트폭 초과)
//!    - create_proof 전에 MockProver로 먼저 확인

use std::collections::HashMap;
use std::sync::Arc;

use halo2_proofs::{
    dev::MockProver,
    plonk::{create_proof, keygen_pk, keygen_vk, ProvingKey, VerifyingKey},
    poly::{
        commitment::ParamsProver,
        ipa::{
            commitment::{IPACommitmentScheme, ParamsIPA},
            multiopen::ProverIPA,
        },
    },
    transcript::{Blake2bWrite, Challenge255, TranscriptWriterBuffer},
};
use pasta_curves::EqAffine;
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::sync::RwLock;

use zk_identity_circuits::{AttestationCircuit, CircuitError, CircuitVariant, ProvingRequest};

use crate::types::{KeyId, ProofSubmission};

/// 증명 생성 에러
#[derive(Debug, Error)]
pub enum ProverError {
    /// 필수 속성 누락, 범위 초과 등 (WitnessBuilder 단계)
    #[error("Inconsistent witness: {0}")]
    InconsistentWitness(#[from] CircuitError),

    /// 회로 제약을 만족할 수 없는 witness
    #[error("Witness cannot satisfy the {variant} circuit: {reason}")]
    WitnessConstraintInfeasible { variant: CircuitVariant, reason: String },

    #[error("Circuit variant {0} is not enabled")]
    VariantDisabled(CircuitVariant),

    #[error("k={0} is too small for the attestation circuits")]
    InvalidK(u32),

    /// 레지스트리 컬럼(INTEGER)에 담을 수 없는 버전
    #[error("key version {0} does not fit the registry (1..={max})", max = i32::MAX)]
    InvalidKeyVersion(u32),

    #[error("Key generation failed for {variant}: {reason}")]
    KeyGeneration { variant: CircuitVariant, reason: String },

    #[error("Proof generation failed: {0}")]
    Proving(String),
}

/// Prover가 사용하는 키를 Verifier Gate에 그대로 넘기기 위한 쌍
#[derive(Clone)]
pub struct PinnedVerifyingKey {
    pub id: KeyId,
    /// `id.version`을 레지스트리 레코드에 쓰는 형태로 미리 변환한 값
    pub registry_version: i32,
    pub vk: VerifyingKey<EqAffine>,
}

/// ZK Prover 서비스
///
/// # Architecture
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                      ZKProver                                │
/// ├─────────────────────────────────────────────────────────────┤
/// │                                                             │
/// │  ┌───────────┐ ┌─────────┐ ┌──────────────┐ ┌────────────┐ │
/// │  │Personhood │ │   Age   │ │ CountryRisk  │ │ AntiSybil  │ │
/// │  └─────┬─────┘ └────┬────┘ └──────┬───────┘ └─────┬──────┘ │
/// │        │            │             │               │        │
/// │        v            v             v               v        │
/// │  ┌──────────────────────────────────────────────────────┐  │
/// │  │  Params (SRS, 공유)                                   │  │
/// │  │  keys: variant → ProvingKey (lazy, cached)            │  │
/// │  └──────────────────────────────────────────────────────┘  │
/// │                                                             │
/// └─────────────────────────────────────────────────────────────┘
/// ```
pub struct ZKProver {
    params: Arc<ParamsIPA<EqAffine>>,
    /// variant별 Proving Key 캐시
    keys: RwLock<HashMap<CircuitVariant, Arc<ProvingKey<EqAffine>>>>,
    enabled: Vec<CircuitVariant>,
    key_version: u32,
    registry_version: i32,
    /// Circuit size parameter (k = log2(rows))
    k: u32,
}

impl ZKProver {
    /// 새 ZK Prover 생성
    ///
    /// # Arguments
    ///
    /// * `k` - Circuit size parameter (2^k rows). 회로 상수 `K` 이상이어야 함
    /// * `key_version` - 이 인스턴스가 발급하는 키의 버전 (1..=i32::MAX)
    /// * `enabled` - 증명을 허용할 variant 목록
    ///
    /// # Performance
    ///
    /// - Params 생성: k=10 기준 수십 ms
    /// - 메모리 사용: ~2^k * 32 bytes
    pub fn new(
        k: u32,
        key_version: u32,
        enabled: Vec<CircuitVariant>,
    ) -> Result<Self, ProverError> {
        if k < zk_identity_circuits::K {
            return Err(ProverError::InvalidK(k));
        }

        // 검증된 증명이 레지스트리 기록 단계에서 거부되지 않도록 시작 시 확인
        let registry_version = i32::try_from(key_version)
            .ok()
            .filter(|v| *v > 0)
            .ok_or(ProverError::InvalidKeyVersion(key_version))?;

        tracing::info!("Initializing ZK Prover with k={}...", k);

        // Generate parameters (SRS - Structured Reference String)
        // IPA는 trusted setup이 필요 없음
        let params = ParamsIPA::<EqAffine>::new(k);

        tracing::info!("SRS parameters generated");

        Ok(Self {
            params: Arc::new(params),
            keys: RwLock::new(HashMap::new()),
            enabled,
            key_version,
            registry_version,
            k,
        })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn key_version(&self) -> u32 {
        self.key_version
    }

    pub fn enabled_variants(&self) -> &[CircuitVariant] {
        &self.enabled
    }

    /// Verifier Gate와 공유하는 SRS
    pub fn params(&self) -> Arc<ParamsIPA<EqAffine>> {
        self.params.clone()
    }

    /// variant별 Proving Key 생성 (lazy initialization)
    ///
    /// # Interview Q&A
    ///
    /// Q: 왜 lazy initialization을 사용하는가?
    /// A: keygen이 비용이 크기 때문
    ///    - 첫 번째 proof 요청 시에만 생성
    ///    - 서버 시작 시간 단축
    ///    - 사용하지 않는 회로의 키는 생성하지 않음
    async fn ensure_keys(
        &self,
        variant: CircuitVariant,
    ) -> Result<Arc<ProvingKey<EqAffine>>, ProverError> {
        if !self.enabled.contains(&variant) {
            return Err(ProverError::VariantDisabled(variant));
        }

        if let Some(pk) = self.keys.read().await.get(&variant) {
            return Ok(pk.clone());
        }

        tracing::info!("Generating {} circuit keys...", variant);

        let mut write_guard = self.keys.write().await;

        // Double-check after acquiring write lock
        if let Some(pk) = write_guard.get(&variant) {
            return Ok(pk.clone());
        }

        // keygen은 blocking 스레드에서. 같은 variant의 동시 요청은 write lock에서 대기
        let params = self.params.clone();
        let pk = tokio::task::spawn_blocking(move || {
            let empty_circuit = AttestationCircuit::blank(variant);
            let keygen_error = |e: halo2_proofs::plonk::Error| ProverError::KeyGeneration {
                variant,
                reason: e.to_string(),
            };

            let vk = keygen_vk(params.as_ref(), &empty_circuit).map_err(keygen_error)?;
            let pk = keygen_pk(params.as_ref(), vk, &empty_circuit).map_err(keygen_error)?;
            Ok::<_, ProverError>(Arc::new(pk))
        })
        .await
        .map_err(|e| ProverError::KeyGeneration {
            variant,
            reason: e.to_string(),
        })??;

        write_guard.insert(variant, pk.clone());

        tracing::info!("{} circuit keys generated successfully", variant);
        Ok(pk)
    }

    /// Verifier Gate에 고정할 검증 키
    pub async fn pinned_key(
        &self,
        variant: CircuitVariant,
    ) -> Result<PinnedVerifyingKey, ProverError> {
        let pk = self.ensure_keys(variant).await?;
        Ok(PinnedVerifyingKey {
            id: KeyId::new(variant, self.key_version),
            registry_version: self.registry_version,
            vk: pk.get_vk().clone(),
        })
    }

    /// 활성화된 모든 variant의 검증 키
    pub async fn pinned_keys(&self) -> Result<Vec<PinnedVerifyingKey>, ProverError> {
        let mut keys = Vec::with_capacity(self.enabled.len());
        for variant in &self.enabled {
            keys.push(self.pinned_key(*variant).await?);
        }
        Ok(keys)
    }

    /// 증명 생성 (실제 Halo2 사용)
    ///
    /// # Flow
    ///
    /// ```text
    /// 1. 키 준비 (variant별 lazy keygen)
    /// 2. instance = [valid, uniqueNullifier, nullifierHash, commitmentHash]
    /// 3. MockProver로 배선 가능 여부 확인 → 불가능하면 WitnessConstraintInfeasible
    /// 4. create_proof
    ///
    /// 3, 4는 같은 blocking 스레드 작업 안에서 실행
    /// ```
    ///
    /// # Randomness
    ///
    /// OsRng blinding → 같은 witness라도 매번 다른 proof가 나오며 모두 검증됨
    pub async fn prove(
        &self,
        request: &ProvingRequest,
        context: Option<String>,
    ) -> Result<ProofSubmission, ProverError> {
        let variant = request.variant();
        tracing::info!("Generating {} proof", variant);

        let pk = self.ensure_keys(variant).await?;

        let circuit = request.circuit();
        let signals = request.expected_signals();
        let instance = request.instance();

        let k = self.k;
        let params = self.params.clone();
        let proof_bytes = tokio::task::spawn_blocking(move || {
            check_feasible(k, variant, &circuit, &instance)?;

            let mut transcript =
                Blake2bWrite::<Vec<u8>, EqAffine, Challenge255<EqAffine>>::init(vec![]);

            create_proof::<
                IPACommitmentScheme<EqAffine>,
                ProverIPA<'_, EqAffine>,
                _,
                _,
                _,
                _,
            >(
                params.as_ref(),
                pk.as_ref(),
                &[circuit],
                &[&[instance.as_slice()]],
                OsRng,
                &mut transcript,
            )
            .map_err(|e| ProverError::Proving(e.to_string()))?;

            Ok::<_, ProverError>(transcript.finalize())
        })
        .await
        .map_err(|e| ProverError::Proving(e.to_string()))??;

        tracing::debug!(
            "{} proof: {} bytes, valid={}",
            variant,
            proof_bytes.len(),
            signals.is_valid()
        );

        Ok(ProofSubmission::new(
            KeyId::new(variant, self.key_version),
            &proof_bytes,
            &signals,
            request.public_inputs(),
            context,
        ))
    }
}

/// 실제 proving 전에 회로 배선이 가능한지 확인
///
/// valid = 0 은 여기서 통과함 (만족 가능한 회로). 실패는 값이 회로에
/// 배선될 수 없을 때뿐
fn check_feasible(
    k: u32,
    variant: CircuitVariant,
    circuit: &AttestationCircuit,
    instance: &[pasta_curves::Fp],
) -> Result<(), ProverError> {
    let infeasible =
        |reason: String| ProverError::WitnessConstraintInfeasible { variant, reason };

    let prover = MockProver::run(k, circuit, vec![instance.to_vec()])
        .map_err(|e| infeasible(e.to_string()))?;

    prover.verify().map_err(|failures| {
        infeasible(
            failures
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}
