//! FullPersonhood Circuit
//!
//! Proves that the holder of a secret key is at least 18, sits in an accepted
//! jurisdiction-risk tier, and owns the nullifier they present, without
//! revealing age, risk tier, salt or key.
//!
//! # Public Inputs
//! - `nullifierHash`: H(secretKey, uniqueIdSalt)
//! - `commitmentHash`: H(age, countryRisk, uniqueIdSalt, secretKey)
//!
//! # Public Signals
//! - `valid`: 1 iff all four sub-checks pass
//! - `uniqueNullifier`: H(secretKey, uniqueIdSalt) as derived in-circuit
//!
//! # Private Inputs (Witnesses)
//! - `age`, `countryRisk`, `uniqueIdSalt`, `secretKey`
//!
//! # Sub-checks
//! 1. `age >= 18` (8-bit comparator)
//! 2. `countryRisk <= 2` (8-bit comparator)
//! 3. `H(secretKey, uniqueIdSalt) == nullifierHash`
//! 4. `H(age, countryRisk, uniqueIdSalt, secretKey) == commitmentHash`
//!
//! # Security Properties
//! - **Soundness**: `valid = 1` cannot be proven unless every check holds
//! - **Soft failure**: a false predicate yields a verifying proof with `valid = 0`
//! - **Binding**: the commitment fixes all four private values jointly

use ff::PrimeField;
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};
use pasta_curves::Fp;

use crate::attestation::{
    aggregate_checks, Attestation, AttestationConfig, MAX_COUNTRY_RISK, MIN_AGE,
};
use crate::gadgets::poseidon::{compute_nullifier, poseidon_hash};
use crate::signals::{PublicInputs, PublicSignals};

/// FullPersonhood circuit
#[derive(Clone)]
pub struct PersonhoodCircuit<F: PrimeField> {
    /// Private: age in years
    pub age: Value<F>,
    /// Private: jurisdiction risk tier (0..=3)
    pub country_risk: Value<F>,
    /// Private: per-context salt
    pub unique_id_salt: Value<F>,
    /// Private: holder's secret key
    pub secret_key: Value<F>,
}

impl<F: PrimeField> Default for PersonhoodCircuit<F> {
    fn default() -> Self {
        Self {
            age: Value::unknown(),
            country_risk: Value::unknown(),
            unique_id_salt: Value::unknown(),
            secret_key: Value::unknown(),
        }
    }
}

impl<F: PrimeField> PersonhoodCircuit<F> {
    /// Create a new circuit with the given values
    pub fn new(age: F, country_risk: F, unique_id_salt: F, secret_key: F) -> Self {
        Self {
            age: Value::known(age),
            country_risk: Value::known(country_risk),
            unique_id_salt: Value::known(unique_id_salt),
            secret_key: Value::known(secret_key),
        }
    }

    /// commitment = H(age, countryRisk, uniqueIdSalt, secretKey)
    pub fn compute_commitment(age: F, country_risk: F, unique_id_salt: F, secret_key: F) -> F {
        poseidon_hash(&[age, country_risk, unique_id_salt, secret_key])
    }
}

impl PersonhoodCircuit<Fp> {
    /// What the circuit outputs for these values and claimed public inputs
    pub fn expected_signals(
        age: u64,
        country_risk: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
        inputs: &PublicInputs,
    ) -> PublicSignals {
        let nullifier = compute_nullifier(secret_key, unique_id_salt);
        let commitment = Self::compute_commitment(
            Fp::from(age),
            Fp::from(country_risk),
            unique_id_salt,
            secret_key,
        );

        PublicSignals {
            valid: aggregate_checks(&[
                age >= MIN_AGE,
                country_risk <= MAX_COUNTRY_RISK,
                nullifier == inputs.nullifier_hash,
                commitment == inputs.commitment_hash,
            ]),
            unique_nullifier: nullifier,
        }
    }
}

impl Circuit<Fp> for PersonhoodCircuit<Fp> {
    type Config = AttestationConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        AttestationConfig::configure(meta)
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<Fp>,
    ) -> Result<(), Error> {
        let att = Attestation::load(config, &mut layouter)?;

        let private = att.assign_private(
            &mut layouter,
            &[
                ("age", self.age),
                ("country_risk", self.country_risk),
                ("unique_id_salt", self.unique_id_salt),
                ("secret_key", self.secret_key),
            ],
        )?;
        let (age, country_risk, salt, secret_key) =
            (&private[0], &private[1], &private[2], &private[3]);

        let nullifier = att.hash(&mut layouter, "nullifier", &[secret_key.clone(), salt.clone()])?;
        let commitment = att.hash(&mut layouter, "commitment", &private)?;

        let checks = vec![
            att.at_least(&mut layouter, age, MIN_AGE)?,
            att.at_most(&mut layouter, country_risk, MAX_COUNTRY_RISK)?,
            att.nullifier_check(&mut layouter, &nullifier)?,
            att.commitment_check(&mut layouter, &commitment)?,
        ];

        att.finalize(&mut layouter, &checks, &nullifier)
    }
}
