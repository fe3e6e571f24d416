//! Shared attestation layout
//!
//! All four circuit variants use the same column layout and the same
//! synthesis steps; only the private witness shape and the list of sub-checks
//! differ. [`AttestationConfig`] configures every gadget once, and
//! [`Attestation`] exposes the steps a variant needs:
//!
//! 1. assign private values
//! 2. hash them (nullifier and commitment)
//! 3. produce one boolean cell per sub-check
//! 4. [`Attestation::finalize`]: `valid = (sum(checks) == count)`, then expose
//!    `valid` and the derived nullifier on the instance column
//!
//! Nothing in this flow can fail because a predicate is false. A failed
//! sub-check is a `0` term in the sum, and the proof still verifies with
//! `valid = 0`.
//!
//! # Circuit Statistics
//! - Advice columns: 5 (shared by all gadgets)
//! - Fixed columns: 5 round-constant columns + 1 constants column
//! - Instance columns: 1 (4 rows, see [`crate::signals`])
//! - Lookup tables: 1 (8-bit range table)
//! - Rows used: ~400 of 2^10

use ff::Field;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Instance},
};
use pasta_curves::Fp;

use crate::gadgets::{
    AggregateChip, AggregateConfig, ComparisonChip, ComparisonConfig, ComparisonInstruction,
    IsEqualChip, IsEqualConfig, PoseidonChip, PoseidonConfig,
};
use crate::gadgets::poseidon::POSEIDON_WIDTH;
use crate::signals::{
    COMMITMENT_HASH_ROW, NULLIFIER_HASH_ROW, UNIQUE_NULLIFIER_ROW, VALID_ROW,
};

/// Default circuit size (2^10 rows)
pub const K: u32 = 10;

/// Bit width of the attribute comparator (ages 0..=255)
pub const ATTRIBUTE_BITS: usize = 8;

/// Minimum age, inclusive
pub const MIN_AGE: u64 = 18;
/// Highest accepted country risk tier, inclusive
pub const MAX_COUNTRY_RISK: u64 = 2;
/// Highest representable country risk tier
pub const MAX_RISK_TIER: u64 = 3;

pub type AssignedFp = AssignedCell<Fp, Fp>;

/// Column layout shared by all variants
#[derive(Debug, Clone)]
pub struct AttestationConfig {
    pub advice: [Column<Advice>; POSEIDON_WIDTH],
    pub instance: Column<Instance>,
    pub poseidon: PoseidonConfig<Fp>,
    pub comparison: ComparisonConfig<Fp, ATTRIBUTE_BITS>,
    pub is_equal: IsEqualConfig<Fp>,
    pub aggregate: AggregateConfig<Fp>,
}

impl AttestationConfig {
    pub fn configure(meta: &mut ConstraintSystem<Fp>) -> Self {
        let advice = [(); POSEIDON_WIDTH].map(|_| meta.advice_column());
        let instance = meta.instance_column();
        let constants = meta.fixed_column();

        meta.enable_equality(instance);
        meta.enable_constant(constants);

        // Gadgets occupy disjoint regions, so they can share advice columns
        let poseidon = PoseidonChip::configure(meta, advice);
        let comparison = ComparisonChip::<Fp, ATTRIBUTE_BITS>::configure(
            meta, advice[0], advice[1], advice[2], advice[3], advice[4],
        );
        let is_equal = IsEqualChip::configure(meta, advice[0], advice[1], advice[2], advice[3]);
        let aggregate = AggregateChip::configure(meta, advice[0], advice[1]);

        Self {
            advice,
            instance,
            poseidon,
            comparison,
            is_equal,
            aggregate,
        }
    }
}

/// Synthesis helper bound to one configuration
pub struct Attestation {
    config: AttestationConfig,
    poseidon: PoseidonChip<Fp>,
    comparison: ComparisonChip<Fp, ATTRIBUTE_BITS>,
    is_equal: IsEqualChip<Fp>,
    aggregate: AggregateChip<Fp>,
}

impl Attestation {
    /// Construct the chips and load the range table
    pub fn load(
        config: AttestationConfig,
        layouter: &mut impl Layouter<Fp>,
    ) -> Result<Self, Error> {
        let comparison = ComparisonChip::construct(config.comparison.clone());
        comparison.load_table(layouter.namespace(|| "load range table"))?;

        Ok(Self {
            poseidon: PoseidonChip::construct(config.poseidon.clone()),
            is_equal: IsEqualChip::construct(config.is_equal.clone()),
            aggregate: AggregateChip::construct(config.aggregate.clone()),
            comparison,
            config,
        })
    }

    /// Assign up to five private values on a single row
    pub fn assign_private(
        &self,
        layouter: &mut impl Layouter<Fp>,
        values: &[(&'static str, Value<Fp>)],
    ) -> Result<Vec<AssignedFp>, Error> {
        if values.len() > self.config.advice.len() {
            return Err(Error::Synthesis);
        }

        layouter.assign_region(
            || "private witness",
            |mut region| {
                values
                    .iter()
                    .zip(self.config.advice.iter())
                    .map(|((name, value), column)| {
                        region.assign_advice(|| *name, *column, 0, || *value)
                    })
                    .collect()
            },
        )
    }

    pub fn hash(
        &self,
        layouter: &mut impl Layouter<Fp>,
        name: &'static str,
        inputs: &[AssignedFp],
    ) -> Result<AssignedFp, Error> {
        self.poseidon.hash(layouter.namespace(|| name), inputs)
    }

    fn constant(&self, layouter: &mut impl Layouter<Fp>, value: u64) -> Result<AssignedFp, Error> {
        layouter.assign_region(
            || "threshold",
            |mut region| {
                region.assign_advice_from_constant(
                    || "threshold",
                    self.config.advice[0],
                    0,
                    Fp::from(value),
                )
            },
        )
    }

    /// `1` if `value >= min`
    pub fn at_least(
        &self,
        layouter: &mut impl Layouter<Fp>,
        value: &AssignedFp,
        min: u64,
    ) -> Result<AssignedFp, Error> {
        let min = self.constant(layouter, min)?;
        self.comparison.gte(layouter.namespace(|| "value >= min"), value.clone(), min)
    }

    /// `1` if `value <= max`
    pub fn at_most(
        &self,
        layouter: &mut impl Layouter<Fp>,
        value: &AssignedFp,
        max: u64,
    ) -> Result<AssignedFp, Error> {
        let max = self.constant(layouter, max)?;
        self.comparison.lte(layouter.namespace(|| "value <= max"), value.clone(), max)
    }

    /// `1` if `value != 0`
    pub fn is_present(
        &self,
        layouter: &mut impl Layouter<Fp>,
        value: &AssignedFp,
    ) -> Result<AssignedFp, Error> {
        self.is_equal.is_nonzero(layouter.namespace(|| "value != 0"), value)
    }

    /// `1` if `value` equals the public input at instance `row`
    pub fn matches_public(
        &self,
        layouter: &mut impl Layouter<Fp>,
        value: &AssignedFp,
        row: usize,
    ) -> Result<AssignedFp, Error> {
        let public = layouter.assign_region(
            || format!("public input {}", row),
            |mut region| {
                region.assign_advice_from_instance(
                    || "public input",
                    self.config.instance,
                    row,
                    self.config.advice[0],
                    0,
                )
            },
        )?;
        self.is_equal.is_equal(layouter.namespace(|| "derived == public"), value, &public)
    }

    /// Nullifier sub-check against instance row 2
    pub fn nullifier_check(
        &self,
        layouter: &mut impl Layouter<Fp>,
        nullifier: &AssignedFp,
    ) -> Result<AssignedFp, Error> {
        self.matches_public(layouter, nullifier, NULLIFIER_HASH_ROW)
    }

    /// Commitment sub-check against instance row 3
    pub fn commitment_check(
        &self,
        layouter: &mut impl Layouter<Fp>,
        commitment: &AssignedFp,
    ) -> Result<AssignedFp, Error> {
        self.matches_public(layouter, commitment, COMMITMENT_HASH_ROW)
    }

    /// Aggregate the sub-checks and expose `[valid, uniqueNullifier]`
    pub fn finalize(
        &self,
        layouter: &mut impl Layouter<Fp>,
        checks: &[AssignedFp],
        nullifier: &AssignedFp,
    ) -> Result<(), Error> {
        let total = self.aggregate.sum(layouter.namespace(|| "sum checks"), checks)?;
        let valid = self.is_equal.is_equal_constant(
            layouter.namespace(|| "sum == count"),
            &total,
            Fp::from(checks.len() as u64),
        )?;

        layouter.constrain_instance(valid.cell(), self.config.instance, VALID_ROW)?;
        layouter.constrain_instance(nullifier.cell(), self.config.instance, UNIQUE_NULLIFIER_ROW)
    }
}

/// Off-circuit aggregation: `1` iff every check passed
pub fn aggregate_checks(checks: &[bool]) -> Fp {
    let total = checks.iter().filter(|c| **c).count();
    if total == checks.len() {
        Fp::ONE
    } else {
        Fp::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_checks() {
        assert_eq!(aggregate_checks(&[true, true, true, true]), Fp::ONE);
        assert_eq!(aggregate_checks(&[true, false, true, true]), Fp::ZERO);
        assert_eq!(aggregate_checks(&[false, false, false]), Fp::ZERO);
    }

    #[test]
    fn test_thresholds_fit_comparator() {
        assert!(MIN_AGE < 1 << ATTRIBUTE_BITS);
        assert!(MAX_RISK_TIER < 1 << ATTRIBUTE_BITS);
        assert!(MAX_COUNTRY_RISK < MAX_RISK_TIER);
    }
}
