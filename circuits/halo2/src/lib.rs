//! ZK Identity Attestation Circuits
//!
//! Privacy-preserving eligibility proofs using Halo2 (PSE fork)
//!
//! # Circuits
//! - `PersonhoodCircuit`: age >= 18 and country risk <= 2, nullifier and commitment bound
//! - `AgeCircuit`: age >= 18 only
//! - `CountryRiskCircuit`: country risk <= 2 only
//! - `AntiSybilCircuit`: biometric/device material present (weaker, presence-only)
//!
//! Every circuit outputs `[valid, uniqueNullifier]`. A false predicate does
//! not abort proving; it yields a verifying proof with `valid = 0`.
//!
//! # Features
//! - Poseidon hash with every round constrained, shared with the witness builder
//! - Boolean-output comparison and equality gadgets, aggregated by sum == count
//! - Range checks using lookup tables
//!
//! # Example
//! ```ignore
//! use zk_identity_circuits::{CircuitVariant, WitnessBuilder, random_salt, Fp};
//!
//! let request = WitnessBuilder::new()
//!     .age(25)
//!     .country_risk(1)
//!     .unique_id_salt(random_salt())
//!     .secret_key(Fp::from(42u64))
//!     .build(CircuitVariant::FullPersonhood)?;
//!
//! let circuit = request.circuit();
//! let instance = request.instance();
//! ```

pub mod age;
pub mod anti_sybil;
pub mod attestation;
pub mod circuit;
pub mod country_risk;
pub mod error;
pub mod gadgets;
pub mod personhood;
pub mod signals;
pub mod variant;
pub mod witness;

#[cfg(feature = "wasm")]
pub mod wasm;


// Circuit exports
pub use age::AgeCircuit;
pub use anti_sybil::AntiSybilCircuit;
pub use circuit::AttestationCircuit;
pub use country_risk::CountryRiskCircuit;
pub use personhood::PersonhoodCircuit;

pub use attestation::{AttestationConfig, K, MAX_COUNTRY_RISK, MIN_AGE};
pub use signals::{
    fp_from_hex, fp_to_hex, instance_column, PublicInputs, PublicSignals, INSTANCE_LEN,
};
pub use variant::{AssuranceLevel, CircuitVariant};
pub use witness::{random_salt, PrivateWitness, ProvingRequest, WitnessBuilder};

// Error handling
pub use error::validation;
pub use error::{CircuitError, CircuitResult};

// Gadget exports
pub use gadgets::{
    poseidon_hash, AggregateChip, ComparisonChip, IsEqualChip, PoseidonChip, RangeCheckChip,
};
pub use gadgets::poseidon::compute_nullifier;

// Re-export commonly used types from halo2
pub use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};

// Re-export Pasta curves
pub use pasta_curves::{EqAffine, Fp};
