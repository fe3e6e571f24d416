//! One circuit type over all variants
//!
//! Every variant shares [`AttestationConfig`], so a single enum can stand in
//! for whichever variant a request names. Key generation still sees four
//! different circuits: synthesis differs per variant, and so do the keys.

use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner},
    plonk::{Circuit, ConstraintSystem, Error},
};
use pasta_curves::Fp;

use crate::age::AgeCircuit;
use crate::anti_sybil::AntiSybilCircuit;
use crate::attestation::AttestationConfig;
use crate::country_risk::CountryRiskCircuit;
use crate::personhood::PersonhoodCircuit;
use crate::variant::CircuitVariant;

#[derive(Clone)]
pub enum AttestationCircuit {
    FullPersonhood(PersonhoodCircuit<Fp>),
    AgeOnly(AgeCircuit<Fp>),
    CountryRiskOnly(CountryRiskCircuit<Fp>),
    AntiSybilOnly(AntiSybilCircuit<Fp>),
}

impl AttestationCircuit {
    /// Witness-free circuit, used for key generation
    pub fn blank(variant: CircuitVariant) -> Self {
        match variant {
            CircuitVariant::FullPersonhood => Self::FullPersonhood(PersonhoodCircuit::default()),
            CircuitVariant::AgeOnly => Self::AgeOnly(AgeCircuit::default()),
            CircuitVariant::CountryRiskOnly => Self::CountryRiskOnly(CountryRiskCircuit::default()),
            CircuitVariant::AntiSybilOnly => Self::AntiSybilOnly(AntiSybilCircuit::default()),
        }
    }

    pub fn variant(&self) -> CircuitVariant {
        match self {
            Self::FullPersonhood(_) => CircuitVariant::FullPersonhood,
            Self::AgeOnly(_) => CircuitVariant::AgeOnly,
            Self::CountryRiskOnly(_) => CircuitVariant::CountryRiskOnly,
            Self::AntiSybilOnly(_) => CircuitVariant::AntiSybilOnly,
        }
    }
}

impl Circuit<Fp> for AttestationCircuit {
    type Config = AttestationConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::blank(self.variant())
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        AttestationConfig::configure(meta)
    }

    fn synthesize(&self, config: Self::Config, layouter: impl Layouter<Fp>) -> Result<(), Error> {
        match self {
            Self::FullPersonhood(c) => c.synthesize(config, layouter),
            Self::AgeOnly(c) => c.synthesize(config, layouter),
            Self::CountryRiskOnly(c) => c.synthesize(config, layouter),
            Self::AntiSybilOnly(c) => c.synthesize(config, layouter),
        }
    }
}
