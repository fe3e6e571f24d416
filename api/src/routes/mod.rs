//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/attestation/*` - public input 계산, 증명 생성, Verifier Gate
//! - `/nullifier/:nullifier` - nullifier 사용 여부 조회
//! - `/keys` - 고정된 검증 키 목록

pub mod attestation;
pub mod health;
pub mod keys;
pub mod nullifier;
