//! Public inputs, public signals and the instance column
//!
//! Every variant exposes the same four instance rows:
//!
//! ```text
//! row 0: valid            (public signal, 0 or 1)
//! row 1: uniqueNullifier  (public signal, H(secretKey, salt) as derived in-circuit)
//! row 2: nullifierHash    (public input, claimed by the prover)
//! row 3: commitmentHash   (public input, claimed by the prover)
//! ```
//!
//! Field elements travel as `0x`-prefixed hex of the canonical little-endian
//! representation.

use ff::{Field, PrimeField};
use pasta_curves::Fp;
use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, CircuitResult};

pub const VALID_ROW: usize = 0;
pub const UNIQUE_NULLIFIER_ROW: usize = 1;
pub const NULLIFIER_HASH_ROW: usize = 2;
pub const COMMITMENT_HASH_ROW: usize = 3;
/// Number of instance rows shared by all variants
pub const INSTANCE_LEN: usize = 4;

/// Values the prover commits to before proving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    #[serde(with = "hex_field")]
    pub nullifier_hash: Fp,
    #[serde(with = "hex_field")]
    pub commitment_hash: Fp,
}

/// Circuit outputs: `[valid, uniqueNullifier]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals {
    #[serde(with = "hex_field")]
    pub valid: Fp,
    #[serde(with = "hex_field")]
    pub unique_nullifier: Fp,
}

impl PublicSignals {
    pub fn is_valid(&self) -> bool {
        self.valid == Fp::ONE
    }

    pub fn to_vec(&self) -> Vec<Fp> {
        vec![self.valid, self.unique_nullifier]
    }

    /// Read signals back from an ordered vector; the length must be exact
    pub fn from_slice(values: &[Fp]) -> CircuitResult<Self> {
        match values {
            [valid, unique_nullifier] => Ok(Self {
                valid: *valid,
                unique_nullifier: *unique_nullifier,
            }),
            _ => Err(CircuitError::InvalidFieldEncoding {
                field: "public_signals".to_string(),
                reason: format!("expected 2 signals, got {}", values.len()),
            }),
        }
    }
}

impl PublicInputs {
    pub fn to_vec(&self) -> Vec<Fp> {
        vec![self.nullifier_hash, self.commitment_hash]
    }

    pub fn from_slice(values: &[Fp]) -> CircuitResult<Self> {
        match values {
            [nullifier_hash, commitment_hash] => Ok(Self {
                nullifier_hash: *nullifier_hash,
                commitment_hash: *commitment_hash,
            }),
            _ => Err(CircuitError::InvalidFieldEncoding {
                field: "public_inputs".to_string(),
                reason: format!("expected 2 inputs, got {}", values.len()),
            }),
        }
    }
}

/// Instance column for a proof: signals followed by inputs
pub fn instance_column(signals: &PublicSignals, inputs: &PublicInputs) -> Vec<Fp> {
    let mut column = signals.to_vec();
    column.extend(inputs.to_vec());
    column
}

/// Encode a field element as `0x` + little-endian canonical hex
pub fn fp_to_hex(value: &Fp) -> String {
    format!("0x{}", hex::encode(value.to_repr()))
}

/// Decode a field element, rejecting malformed or non-canonical encodings
pub fn fp_from_hex(s: &str, field: &str) -> CircuitResult<Fp> {
    let invalid = |reason: String| CircuitError::InvalidFieldEncoding {
        field: field.to_string(),
        reason,
    };

    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;
    let repr: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("expected 32 bytes, got {}", b.len())))?;

    Option::<Fp>::from(Fp::from_repr(repr))
        .ok_or_else(|| invalid("non-canonical encoding".to_string()))
}

/// Serde adapter for hex-encoded field elements
pub mod hex_field {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&fp_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fp, D::Error> {
        let s = String::deserialize(deserializer)?;
        fp_from_hex(&s, "field element").map_err(serde::de::Error::custom)
    }
}
