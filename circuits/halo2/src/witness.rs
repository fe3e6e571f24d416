//! Witness Builder
//!
//! Turns raw attributes plus a salt and secret key into a [`ProvingRequest`]:
//! the private witness for one variant and the public inputs computed with
//! the same Poseidon instance the circuit re-derives internally.
//!
//! Only structural problems fail here (a missing attribute, a value outside
//! the comparator domain). An under-age or high-risk holder still gets a
//! well-formed request; the circuit reports the outcome as `valid = 0`.
//!
//! # Example
//! ```ignore
//! let request = WitnessBuilder::new()
//!     .age(25)
//!     .country_risk(1)
//!     .unique_id_salt(random_salt())
//!     .secret_key(secret_key)
//!     .build(CircuitVariant::FullPersonhood)?;
//!
//! let instance = request.instance();
//! ```

use ff::Field;
use pasta_curves::Fp;
use rand::rngs::OsRng;
use std::fmt;

use crate::age::AgeCircuit;
use crate::anti_sybil::AntiSybilCircuit;
use crate::circuit::AttestationCircuit;
use crate::country_risk::CountryRiskCircuit;
use crate::error::validation::{require, validate_age, validate_country_risk};
use crate::error::CircuitResult;
use crate::gadgets::poseidon::compute_nullifier;
use crate::personhood::PersonhoodCircuit;
use crate::signals::{instance_column, PublicInputs, PublicSignals};
use crate::variant::CircuitVariant;

/// Fresh random salt for a new verification context
pub fn random_salt() -> Fp {
    Fp::random(OsRng)
}

/// Private values for one variant. Lives only on the prover side.
///
/// Not serializable, and its `Debug` output never shows the values.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateWitness {
    FullPersonhood {
        age: u64,
        country_risk: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
    },
    AgeOnly {
        age: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
    },
    CountryRiskOnly {
        country_risk: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
    },
    AntiSybilOnly {
        biometric_hash: Fp,
        device_hash: Fp,
        unique_id_salt: Fp,
        secret_key: Fp,
    },
}

impl fmt::Debug for PrivateWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateWitness")
            .field("variant", &self.variant())
            .field("values", &"<redacted>")
            .finish()
    }
}

impl PrivateWitness {
    pub fn variant(&self) -> CircuitVariant {
        match self {
            PrivateWitness::FullPersonhood { .. } => CircuitVariant::FullPersonhood,
            PrivateWitness::AgeOnly { .. } => CircuitVariant::AgeOnly,
            PrivateWitness::CountryRiskOnly { .. } => CircuitVariant::CountryRiskOnly,
            PrivateWitness::AntiSybilOnly { .. } => CircuitVariant::AntiSybilOnly,
        }
    }

    fn salt_and_key(&self) -> (Fp, Fp) {
        match *self {
            PrivateWitness::FullPersonhood { unique_id_salt, secret_key, .. }
            | PrivateWitness::AgeOnly { unique_id_salt, secret_key, .. }
            | PrivateWitness::CountryRiskOnly { unique_id_salt, secret_key, .. }
            | PrivateWitness::AntiSybilOnly { unique_id_salt, secret_key, .. } => {
                (unique_id_salt, secret_key)
            }
        }
    }

    /// H(secretKey, uniqueIdSalt)
    pub fn nullifier(&self) -> Fp {
        let (salt, key) = self.salt_and_key();
        compute_nullifier(key, salt)
    }

    /// Variant-specific commitment
    pub fn commitment(&self) -> Fp {
        match *self {
            PrivateWitness::FullPersonhood { age, country_risk, unique_id_salt, secret_key } => {
                PersonhoodCircuit::compute_commitment(
                    Fp::from(age),
                    Fp::from(country_risk),
                    unique_id_salt,
                    secret_key,
                )
            }
            PrivateWitness::AgeOnly { age, unique_id_salt, secret_key } => {
                AgeCircuit::compute_commitment(Fp::from(age), unique_id_salt, secret_key)
            }
            PrivateWitness::CountryRiskOnly { country_risk, unique_id_salt, secret_key } => {
                CountryRiskCircuit::compute_commitment(
                    Fp::from(country_risk),
                    unique_id_salt,
                    secret_key,
                )
            }
            PrivateWitness::AntiSybilOnly {
                biometric_hash,
                device_hash,
                unique_id_salt,
                secret_key,
            } => {
                AntiSybilCircuit::compute_commitment(
                    biometric_hash,
                    device_hash,
                    unique_id_salt,
                    secret_key,
                )
            }
        }
    }

    /// Evaluate the variant's relation off-circuit against `inputs`
    pub fn evaluate(&self, inputs: &PublicInputs) -> PublicSignals {
        match *self {
            PrivateWitness::FullPersonhood { age, country_risk, unique_id_salt, secret_key } => {
                PersonhoodCircuit::expected_signals(
                    age,
                    country_risk,
                    unique_id_salt,
                    secret_key,
                    inputs,
                )
            }
            PrivateWitness::AgeOnly { age, unique_id_salt, secret_key } => {
                AgeCircuit::expected_signals(age, unique_id_salt, secret_key, inputs)
            }
            PrivateWitness::CountryRiskOnly { country_risk, unique_id_salt, secret_key } => {
                CountryRiskCircuit::expected_signals(
                    country_risk,
                    unique_id_salt,
                    secret_key,
                    inputs,
                )
            }
            PrivateWitness::AntiSybilOnly {
                biometric_hash,
                device_hash,
                unique_id_salt,
                secret_key,
            } => {
                AntiSybilCircuit::expected_signals(
                    biometric_hash,
                    device_hash,
                    unique_id_salt,
                    secret_key,
                    inputs,
                )
            }
        }
    }

    /// Circuit carrying this witness
    pub fn circuit(&self) -> AttestationCircuit {
        match *self {
            PrivateWitness::FullPersonhood { age, country_risk, unique_id_salt, secret_key } => {
                AttestationCircuit::FullPersonhood(PersonhoodCircuit::new(
                    Fp::from(age),
                    Fp::from(country_risk),
                    unique_id_salt,
                    secret_key,
                ))
            }
            PrivateWitness::AgeOnly { age, unique_id_salt, secret_key } => {
                let circuit = AgeCircuit::new(Fp::from(age), unique_id_salt, secret_key);
                AttestationCircuit::AgeOnly(circuit)
            }
            PrivateWitness::CountryRiskOnly { country_risk, unique_id_salt, secret_key } => {
                AttestationCircuit::CountryRiskOnly(CountryRiskCircuit::new(
                    Fp::from(country_risk),
                    unique_id_salt,
                    secret_key,
                ))
            }
            PrivateWitness::AntiSybilOnly {
                biometric_hash,
                device_hash,
                unique_id_salt,
                secret_key,
            } => {
                AttestationCircuit::AntiSybilOnly(AntiSybilCircuit::new(
                    biometric_hash,
                    device_hash,
                    unique_id_salt,
                    secret_key,
                ))
            }
        }
    }
}

/// Witness plus matching public inputs, ready for the prover
#[derive(Debug, Clone)]
pub struct ProvingRequest {
    witness: PrivateWitness,
    public_inputs: PublicInputs,
}

impl ProvingRequest {
    /// Pair a witness with the public inputs it honestly produces
    pub fn from_witness(witness: PrivateWitness) -> Self {
        let public_inputs = PublicInputs {
            nullifier_hash: witness.nullifier(),
            commitment_hash: witness.commitment(),
        };
        Self { witness, public_inputs }
    }

    /// Pair a witness with arbitrary claimed public inputs. A mismatch is
    /// not an error; it proves `valid = 0`.
    pub fn with_public_inputs(witness: PrivateWitness, public_inputs: PublicInputs) -> Self {
        Self { witness, public_inputs }
    }

    pub fn variant(&self) -> CircuitVariant {
        self.witness.variant()
    }

    pub fn witness(&self) -> &PrivateWitness {
        &self.witness
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.public_inputs
    }

    /// `[valid, uniqueNullifier]` the circuit will output
    pub fn expected_signals(&self) -> PublicSignals {
        self.witness.evaluate(&self.public_inputs)
    }

    /// Full instance column for proving and verification
    pub fn instance(&self) -> Vec<Fp> {
        instance_column(&self.expected_signals(), &self.public_inputs)
    }

    pub fn circuit(&self) -> AttestationCircuit {
        self.witness.circuit()
    }
}

/// Collects raw attributes and builds a request for a chosen variant
#[derive(Default, Clone)]
pub struct WitnessBuilder {
    age: Option<u64>,
    country_risk: Option<u64>,
    biometric_hash: Option<Fp>,
    device_hash: Option<Fp>,
    unique_id_salt: Option<Fp>,
    secret_key: Option<Fp>,
}

impl WitnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn age(mut self, age: u64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn country_risk(mut self, country_risk: u64) -> Self {
        self.country_risk = Some(country_risk);
        self
    }

    pub fn biometric_hash(mut self, biometric_hash: Fp) -> Self {
        self.biometric_hash = Some(biometric_hash);
        self
    }

    pub fn device_hash(mut self, device_hash: Fp) -> Self {
        self.device_hash = Some(device_hash);
        self
    }

    pub fn unique_id_salt(mut self, salt: Fp) -> Self {
        self.unique_id_salt = Some(salt);
        self
    }

    pub fn secret_key(mut self, secret_key: Fp) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    /// Validate the attributes `variant` needs and compute public inputs.
    /// Attributes the variant does not use are ignored.
    pub fn build(&self, variant: CircuitVariant) -> CircuitResult<ProvingRequest> {
        let unique_id_salt = require(self.unique_id_salt, "unique_id_salt")?;
        let secret_key = require(self.secret_key, "secret_key")?;

        let witness = match variant {
            CircuitVariant::FullPersonhood => {
                let age = require(self.age, "age")?;
                let country_risk = require(self.country_risk, "country_risk")?;
                validate_age(age)?;
                validate_country_risk(country_risk)?;
                PrivateWitness::FullPersonhood { age, country_risk, unique_id_salt, secret_key }
            }
            CircuitVariant::AgeOnly => {
                let age = require(self.age, "age")?;
                validate_age(age)?;
                PrivateWitness::AgeOnly { age, unique_id_salt, secret_key }
            }
            CircuitVariant::CountryRiskOnly => {
                let country_risk = require(self.country_risk, "country_risk")?;
                validate_country_risk(country_risk)?;
                PrivateWitness::CountryRiskOnly { country_risk, unique_id_salt, secret_key }
            }
            CircuitVariant::AntiSybilOnly => PrivateWitness::AntiSybilOnly {
                biometric_hash: require(self.biometric_hash, "biometric_hash")?,
                device_hash: require(self.device_hash, "device_hash")?,
                unique_id_salt,
                secret_key,
            },
        };

        Ok(ProvingRequest::from_witness(witness))
    }
}

impl fmt::Debug for WitnessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitnessBuilder")
            .field("age", &self.age.is_some())
            .field("country_risk", &self.country_risk.is_some())
            .field("biometric_hash", &self.biometric_hash.is_some())
            .field("device_hash", &self.device_hash.is_some())
            .field("unique_id_salt", &self.unique_id_salt.is_some())
            .field("secret_key", &self.secret_key.is_some())
            .finish()
    }
}
