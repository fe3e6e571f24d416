//! CountryRiskOnly Circuit
//!
//! Proves `countryRisk <= 2` and nullifier ownership, hiding the tier.
//!
//! # Public Inputs
//! - `nullifierHash`: H(secretKey, uniqueIdSalt)
//! - `commitmentHash`: H(countryRisk, uniqueIdSalt, secretKey)
//!
//! # Sub-checks
//! 1. `countryRisk <= 2` (tier 3 is excluded)
//! 2. nullifier matches
//! 3. commitment matches

use ff::PrimeField;
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};
use pasta_curves::Fp;

use crate::attestation::{aggregate_checks, Attestation, AttestationConfig, MAX_COUNTRY_RISK};
use crate::gadgets::poseidon::{compute_nullifier, poseidon_hash};
use crate::signals::{PublicInputs, PublicSignals};

/// CountryRiskOnly circuit
#[derive(Clone)]
pub struct CountryRiskCircuit<F: PrimeField> {
    pub country_risk: Value<F>,
    pub unique_id_salt: Value<F>,
    pub secret_key: Value<F>,
}

impl<F: PrimeField> Default for CountryRiskCircuit<F> {
    fn default() -> Self {
        Self {
            country_risk: Value::unknown(),
            unique_id_salt: Value::unknown(),
            secret_key: Value::unknown(),
        }
    }
}

impl<F: PrimeField> CountryRiskCircuit<F> {
    pub fn new(country_risk: F, unique_id_salt: F, secret_key: F) -> Self {
        Self {
            country_risk: Value::known(country_risk),
            unique_id_salt: Value::known(unique_id_salt),
            secret_key: Value::known(secret_key),
        }
    }

    /// commitment = H(countryRisk, uniqueIdSalt, secretKey)
    pub fn compute_commitment(country_risk: F, unique_id_salt: F, secret_key: F) -> F {
        poseidon_hash(&[country_risk, unique_id_salt, secret_key])
    }
}

impl CountryRiskCircuit<Fp> {
    pub fn expected_signals(
        country_risk: u64,
        unique_id_salt: Fp,
        secret_key: Fp,
        inputs: &PublicInputs,
    ) -> PublicSignals {
        let nullifier = compute_nullifier(secret_key, unique_id_salt);
        let commitment =
            Self::compute_commitment(Fp::from(country_risk), unique_id_salt, secret_key);

        PublicSignals {
            valid: aggregate_checks(&[
                country_risk <= MAX_COUNTRY_RISK,
                nullifier == inputs.nullifier_hash,
                commitment == inputs.commitment_hash,
            ]),
            unique_nullifier: nullifier,
        }
    }
}

impl Circuit<Fp> for CountryRiskCircuit<Fp> {
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
                ("country_risk", self.country_risk),
                ("unique_id_salt", self.unique_id_salt),
                ("secret_key", self.secret_key),
            ],
        )?;
        let (country_risk, salt, secret_key) = (&private[0], &private[1], &private[2]);

        let nullifier = att.hash(&mut layouter, "nullifier", &[secret_key.clone(), salt.clone()])?;
        let commitment = att.hash(&mut layouter, "commitment", &private)?;

        let checks = vec![
            att.at_most(&mut layouter, country_risk, MAX_COUNTRY_RISK)?,
            att.nullifier_check(&mut layouter, &nullifier)?,
            att.commitment_check(&mut layouter, &commitment)?,
        ];

        att.finalize(&mut layouter, &checks, &nullifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::K;
    use crate::signals::instance_column;
    use ff::Field;
    use halo2_proofs::dev::MockProver;

    fn prove(country_risk: u64) -> (PublicSignals, bool) {
        let (salt, sk) = (Fp::from(31337u64), Fp::from(5u64));
        let inputs = PublicInputs {
            nullifier_hash: compute_nullifier(sk, salt),
            commitment_hash: CountryRiskCircuit::compute_commitment(
                Fp::from(country_risk),
                salt,
                sk,
            ),
        };
        let signals = CountryRiskCircuit::expected_signals(country_risk, salt, sk, &inputs);
        let circuit = CountryRiskCircuit::new(Fp::from(country_risk), salt, sk);

        let instance = instance_column(&signals, &inputs);
        let prover = MockProver::run(K, &circuit, vec![instance]).unwrap();
        (signals, prover.verify().is_ok())
    }

    #[test]
    fn test_accepted_tiers() {
        for tier in 0..=2 {
            let (signals, ok) = prove(tier);
            assert!(signals.is_valid(), "tier {}", tier);
            assert!(ok, "tier {}", tier);
        }
    }

    #[test]
    fn test_highest_tier_is_valid_zero() {
        let (signals, ok) = prove(3);
        assert_eq!(signals.valid, Fp::ZERO);
        assert!(ok);
    }
}
