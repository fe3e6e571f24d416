//! Error types for the identity attestation circuits
//!
//! Structural problems (a value that cannot be wired into a circuit at all)
//! are errors. A false predicate is not: it flows through to `valid = 0`.

use std::fmt;

/// Error types for circuit operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// Value is outside the comparator's bit-width domain
    ValueOutOfRange {
        value: u64,
        max: u64,
        field: String,
    },

    /// A variant needs an attribute the builder was never given
    MissingAttribute {
        field: String,
    },

    /// Unrecognised circuit variant identifier
    UnknownVariant {
        name: String,
    },

    /// Field element could not be decoded (bad hex, wrong length, non-canonical)
    InvalidFieldEncoding {
        field: String,
        reason: String,
    },
}

impl CircuitError {
    /// `true` for the errors that make a witness impossible to wire into a
    /// circuit (the `InconsistentWitness` family)
    pub fn is_inconsistent_witness(&self) -> bool {
        matches!(
            self,
            CircuitError::ValueOutOfRange { .. } | CircuitError::MissingAttribute { .. }
        )
    }
}

impl fmt::Display for CircuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitError::ValueOutOfRange { value, max, field } => {
                write!(f, "{} value {} exceeds maximum {}", field, value, max)
            }
            CircuitError::MissingAttribute { field } => {
                write!(f, "Missing attribute: {}", field)
            }
            CircuitError::UnknownVariant { name } => {
                write!(f, "Unknown circuit variant: {}", name)
            }
            CircuitError::InvalidFieldEncoding { field, reason } => {
                write!(f, "Invalid field element for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for CircuitError {}

/// Result type for circuit operations
pub type CircuitResult<T> = Result<T, CircuitError>;

/// Input validation utilities
pub mod validation {
    use super::*;
    use crate::attestation::{ATTRIBUTE_BITS, MAX_RISK_TIER};

    /// Largest value the 8-bit comparator can order
    pub const MAX_ATTRIBUTE: u64 = (1u64 << ATTRIBUTE_BITS) - 1;

    /// Validate that a value fits the comparator domain
    pub fn validate_range(value: u64, max: u64, field: &str) -> CircuitResult<()> {
        if value > max {
            return Err(CircuitError::ValueOutOfRange {
                value,
                max,
                field: field.to_string(),
            });
        }
        Ok(())
    }

    /// Ages 0..=255 are representable; eligibility is decided in-circuit
    pub fn validate_age(age: u64) -> CircuitResult<()> {
        validate_range(age, MAX_ATTRIBUTE, "age")
    }

    /// Risk tiers are 0..=3, with 3 the highest (excluded) tier
    pub fn validate_country_risk(country_risk: u64) -> CircuitResult<()> {
        validate_range(country_risk, MAX_RISK_TIER, "country_risk")
    }

    /// Unwrap an optional attribute or report which one is missing
    pub fn require<T: Copy>(value: Option<T>, field: &str) -> CircuitResult<T> {
        value.ok_or_else(|| CircuitError::MissingAttribute {
            field: field.to_string(),
        })
    }
}
