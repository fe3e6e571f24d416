//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `ZKProver`: variant별 키 캐싱 + ZK 증명 생성
//! - `VerifierGate`: 증명 검증 + valid 확인 + nullifier 등록

pub mod verifier_gate;
pub mod zk_prover;

pub use verifier_gate::{Accepted, CheckedProof, VerificationError, VerifierGate};
pub use zk_prover::{PinnedVerifyingKey, ProverError, ZKProver};
