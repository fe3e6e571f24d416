//! AgeOnly Circuit
//!
//! Narrow disclosure: proves `age >= 18` and nullifier ownership only. The
//! commitment binds age, salt and key, so it is not interchangeable with a
//! FullPersonhood commitment.
//!
//! # Public Inputs
//! - `nullifierHash`: H(secretKey, uniqueIdSalt)
//! - `commitmentHash`: H(age, uniqueIdSalt, secretKey)
//!
//! # Sub-checks
//! 1. `age >= 18`
//! 2. nullifier matches
//! 3. commitment matches

use ff::PrimeField;
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};
use pasta_curves::Fp;

use crate::attestation::{aggregate_checks, Attestation, AttestationConfig, MIN_AGE};
use crate::gadgets::poseidon::{compute_nullifier, poseidon_hash};
use crate::signals::{PublicInputs, PublicSignals};

/// AgeOnly circuit
#[derive(Clone)]
pub struct AgeCircuit<F: PrimeField> {
    pub age: Value<F>,
    pub unique_id_salt: Value<F>,
    pub secret_key: Value<F>,
}

impl<F: PrimeField> Default for AgeCircuit<F> {
    fn default() -> Self {
        Self {
            age: Value::unknown(),
            unique_id_salt: Value::unknown(),
            secret_key: Value::unknown(),
        }
    }
}

impl<F: PrimeField> AgeCircuit<F> {
    pub fn new(age: F, unique_id_salt: F, secret_key: F) -> Self {
        Self {
            age: Value::known(age),
            unique_id_salt: Value::known(unique_id_salt),
            secret_key: Value::known(secret_key),
        }
    }

    /// commitment = H(age, uniqueIdSalt, secretKey)
    pub fn compute_commitment(age: F, unique_id_salt: F, secret_key: F) -> F {
        poseidon_hash(&[age, unique_id_salt, secret_key])
    }
}

impl AgeCircuit<Fp> {
    pub fn expected_signals(
        age: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
        inputs: &PublicInputs,
    ) -> PublicSignals {
        let nullifier = compute_nullifier(secret_key, unique_id_salt);
        let commitment = Self::compute_commitment(Fp::from(age), unique_id_salt, secret_key);

        PublicSignals {
            valid: aggregate_checks(&[
                age >= MIN_AGE,
                nullifier == inputs.nullifier_hash,
                commitment == inputs.commitment_hash,
            ]),
            unique_nullifier: nullifier,
        }
    }
}

impl Circuit<Fp> for AgeCircuit<Fp> {
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
                ("unique_id_salt", self.unique_id_salt),
                ("secret_key", self.secret_key),
            ],
        )?;
        let (age, salt, secret_key) = (&private[0], &private[1], &private[2]);

        let nullifier = att.hash(&mut layouter, "nullifier", &[secret_key.clone(), salt.clone()])?;
        let commitment = att.hash(&mut layouter, "commitment", &private)?;

        let checks = vec![
            att.at_least(&mut layouter, age, MIN_AGE)?,
            att.nullifier_check(&mut layouter, &nullifier)?,
            att.commitment_check(&mut layouter, &commitment)?,
        ];

        att.finalize(&mut layouter, &checks, &nullifier)
    }
}
