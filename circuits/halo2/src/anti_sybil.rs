//! AntiSybilOnly Circuit
//!
//! Presence check for identity material: the biometric and device hashes must
//! be non-zero. Any non-zero value passes, so `valid = 1` here only says that
//! *some* identity material was committed under this nullifier. It says
//! nothing about age or jurisdiction and carries [`AssuranceLevel::PresenceOnly`].
//!
//! # Public Inputs
//! - `nullifierHash`: H(secretKey, uniqueIdSalt)
//! - `commitmentHash`: H(biometricHash, deviceHash, uniqueIdSalt, secretKey)
//!
//! # Sub-checks
//! 1. `biometricHash != 0`
//! 2. `deviceHash != 0`
//! 3. nullifier matches
//! 4. commitment matches
//!
//! [`AssuranceLevel::PresenceOnly`]: crate::variant::AssuranceLevel::PresenceOnly

use ff::{Field, PrimeField};
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};
use pasta_curves::Fp;

use crate::attestation::{aggregate_checks, Attestation, AttestationConfig};
use crate::gadgets::poseidon::{compute_nullifier, poseidon_hash};
use crate::signals::{PublicInputs, PublicSignals};

/// AntiSybilOnly circuit
#[derive(Clone)]
pub struct AntiSybilCircuit<F: PrimeField> {
    pub biometric_hash: Value<F>,
    pub device_hash: Value<F>,
    pub unique_id_salt: Value<F>,
    pub secret_key: Value<F>,
}

impl<F: PrimeField> Default for AntiSybilCircuit<F> {
    fn default() -> Self {
        Self {
            biometric_hash: Value::unknown(),
            device_hash: Value::unknown(),
            unique_id_salt: Value::unknown(),
            secret_key: Value::unknown(),
        }
    }
}

impl<F: PrimeField> AntiSybilCircuit<F> {
    pub fn new(biometric_hash: F, device_hash: F, unique_id_salt: F, secret_key: F) -> Self {
        Self {
            biometric_hash: Value::known(biometric_hash),
            device_hash: Value::known(device_hash),
            unique_id_salt: Value::known(unique_id_salt),
            secret_key: Value::known(secret_key),
        }
    }

    /// commitment = H(biometricHash, deviceHash, uniqueIdSalt, secretKey)
    pub fn compute_commitment(
        biometric_hash: F,
        device_hash: F,
        unique_id_salt: F,
        secret_key: F,
    ) -> F {
        poseidon_hash(&[biometric_hash, device_hash, unique_id_salt, secret_key])
    }
}

impl AntiSybilCircuit<Fp> {
    pub fn expected_signals(
        biometric_hash: Fp,
        device_hash: Fp,
        unique_id_salt: Fp,
        secret_key: Fp,
        inputs: &PublicInputs,
    ) -> PublicSignals {
        let nullifier = compute_nullifier(secret_key, unique_id_salt);
        let commitment =
            Self::compute_commitment(biometric_hash, device_hash, unique_id_salt, secret_key);

        PublicSignals {
            valid: aggregate_checks(&[
                !bool::from(biometric_hash.is_zero()),
                !bool::from(device_hash.is_zero()),
                nullifier == inputs.nullifier_hash,
                commitment == inputs.commitment_hash,
            ]),
            unique_nullifier: nullifier,
        }
    }
}

impl Circuit<Fp> for AntiSybilCircuit<Fp> {
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
                ("biometric_hash", self.biometric_hash),
                ("device_hash", self.device_hash),
                ("unique_id_salt", self.unique_id_salt),
                ("secret_key", self.secret_key),
            ],
        )?;
        let (biometric, device, salt, secret_key) =
            (&private[0], &private[1], &private[2], &private[3]);

        let nullifier = att.hash(&mut layouter, "nullifier", &[secret_key.clone(), salt.clone()])?;
        let commitment = att.hash(&mut layouter, "commitment", &private)?;

        let checks = vec![
            att.is_present(&mut layouter, biometric)?,
            att.is_present(&mut layouter, device)?,
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
    use halo2_proofs::dev::MockProver;

    fn prove(biometric: Fp, device: Fp) -> (PublicSignals, bool) {
        let (salt, sk) = (Fp::from(2024u64), Fp::from(77u64));
        let inputs = PublicInputs {
            nullifier_hash: compute_nullifier(sk, salt),
            commitment_hash: AntiSybilCircuit::compute_commitment(biometric, device, salt, sk),
        };
        let signals = AntiSybilCircuit::expected_signals(biometric, device, salt, sk, &inputs);
        let circuit = AntiSybilCircuit::new(biometric, device, salt, sk);

        let instance = instance_column(&signals, &inputs);
        let prover = MockProver::run(K, &circuit, vec![instance]).unwrap();
        (signals, prover.verify().is_ok())
    }

    #[test]
    fn test_present_material_is_valid() {
        let (signals, ok) = prove(Fp::from(0xb10u64), Fp::from(0xde7u64));
        assert!(signals.is_valid());
        assert!(ok);
    }

    #[test]
    fn test_missing_device_is_valid_zero() {
        let (signals, ok) = prove(Fp::from(0xb10u64), Fp::ZERO);
        assert_eq!(signals.valid, Fp::ZERO);
        assert!(ok);
    }

    #[test]
    fn test_any_nonzero_value_passes() {
        // Presence only: a trivially chosen value is accepted
        let (signals, ok) = prove(Fp::ONE, -Fp::ONE);
        assert!(signals.is_valid());
        assert!(ok);
    }
}
