//! Comparison Gadget with a Boolean Output
//!
//! Computes `bit = (a >= b)` for `a, b` in `[0, 2^BITS)` without ever making
//! the circuit unsatisfiable when the comparison is false.
//!
//! # Strategy
//! 1. Range check `a` and `b` into `[0, 2^BITS)` (structural domain)
//! 2. Shift the difference into a positive window: `d = a - b + 2^BITS`,
//!    so `d` lies in `[1, 2^(BITS+1))`
//! 3. Decompose `d = bit * 2^BITS + low` with `bit * (1 - bit) = 0` and
//!    `low` range-checked into `[0, 2^BITS)`
//! 4. The decomposition is unique, and `bit == 1` exactly when `a >= b`
//!
//! Because `bit` is boolean-constrained, callers may sum several comparison
//! outputs and compare the total with the number of checks.
//!
//! # Example
//! ```ignore
//! // age >= 18
//! let age_ok = comparison_chip.gte(layouter, age, min_age)?;
//! // country_risk <= 2
//! let risk_ok = comparison_chip.lte(layouter, country_risk, max_risk)?;
//! ```

use ff::PrimeFieldBits;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector},
    poly::Rotation,
};
use std::marker::PhantomData;

use super::range_check::{RangeCheckChip, RangeCheckConfig, RangeCheckInstruction};

/// Configuration for comparison chip
#[derive(Debug, Clone)]
pub struct ComparisonConfig<F: PrimeFieldBits, const BITS: usize> {
    /// Advice column for operand a
    pub a: Column<Advice>,
    /// Advice column for operand b
    pub b: Column<Advice>,
    /// Advice column for the output bit (a >= b)
    pub bit: Column<Advice>,
    /// Advice column for the low BITS of the shifted difference
    pub low: Column<Advice>,
    /// Selector for the comparison gate
    pub q_cmp: Selector,
    /// Range check config shared by operands and `low`
    pub range_check: RangeCheckConfig<F, BITS>,
    _marker: PhantomData<F>,
}

/// Instructions for comparison operations
pub trait ComparisonInstruction<F: PrimeFieldBits> {
    /// Returns a boolean cell equal to `a >= b`
    fn gte(
        &self,
        layouter: impl Layouter<F>,
        a: AssignedCell<F, F>,
        b: AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error>;

    /// Returns a boolean cell equal to `a <= b`
    fn lte(
        &self,
        layouter: impl Layouter<F>,
        a: AssignedCell<F, F>,
        b: AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error>;
}

/// Comparison chip for >= and <= operations
#[derive(Debug, Clone)]
pub struct ComparisonChip<F: PrimeFieldBits, const BITS: usize> {
    config: ComparisonConfig<F, BITS>,
}

/// Interpret a field element as a small integer, if it fits in 64 bits
pub(crate) fn field_to_u64<F: PrimeFieldBits>(value: &F) -> Option<u64> {
    let bits = value.to_le_bits();
    if bits.iter().skip(64).any(|b| *b) {
        return None;
    }
    Some(
        bits.iter()
            .take(64)
            .enumerate()
            .fold(0u64, |acc, (i, b)| if *b { acc | (1u64 << i) } else { acc }),
    )
}

impl<F: PrimeFieldBits, const BITS: usize> ComparisonChip<F, BITS> {
    /// Create a new comparison chip
    pub fn construct(config: ComparisonConfig<F, BITS>) -> Self {
        Self { config }
    }

    /// Configure the comparison chip
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        a: Column<Advice>,
        b: Column<Advice>,
        bit: Column<Advice>,
        low: Column<Advice>,
        range_value: Column<Advice>,
    ) -> ComparisonConfig<F, BITS> {
        let q_cmp = meta.selector();

        for col in [a, b, bit, low] {
            meta.enable_equality(col);
        }

        let range_check = RangeCheckChip::<F, BITS>::configure(meta, range_value);

        meta.create_gate("comparison", |meta| {
            let q = meta.query_selector(q_cmp);
            let a = meta.query_advice(a, Rotation::cur());
            let b = meta.query_advice(b, Rotation::cur());
            let bit = meta.query_advice(bit, Rotation::cur());
            let low = meta.query_advice(low, Rotation::cur());

            let shift = Expression::Constant(F::from(1u64 << BITS));
            let one = Expression::Constant(F::ONE);

            vec![
                // a - b + 2^BITS = bit * 2^BITS + low
                q.clone() * (a - b + shift.clone() - bit.clone() * shift - low),
                // bit is boolean
                q * bit.clone() * (one - bit),
            ]
        });

        ComparisonConfig {
            a,
            b,
            bit,
            low,
            q_cmp,
            range_check,
            _marker: PhantomData,
        }
    }

    /// Load the range check lookup table
    pub fn load_table(&self, layouter: impl Layouter<F>) -> Result<(), Error> {
        let range_chip = RangeCheckChip::<F, BITS>::construct(self.config.range_check.clone());
        range_chip.load_table(layouter)
    }
}

impl<F: PrimeFieldBits, const BITS: usize> ComparisonInstruction<F> for ComparisonChip<F, BITS> {
    fn gte(
        &self,
        mut layouter: impl Layouter<F>,
        a: AssignedCell<F, F>,
        b: AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let range_chip = RangeCheckChip::<F, BITS>::construct(self.config.range_check.clone());

        range_chip.check_all(layouter.namespace(|| "operand domain"), &[a.clone(), b.clone()])?;

        let (bit_cell, low_cell) = layouter.assign_region(
            || "comparison: a >= b",
            |mut region| {
                self.config.q_cmp.enable(&mut region, 0)?;

                a.copy_advice(|| "a", &mut region, self.config.a, 0)?;
                b.copy_advice(|| "b", &mut region, self.config.b, 0)?;

                // Out-of-domain operands still get a witness; the range
                // checks above are what reject them.
                let shifted = a.value().zip(b.value()).map(|(a, b)| {
                    let a = field_to_u64(a).unwrap_or(0) as u128;
                    let b = field_to_u64(b).unwrap_or(0) as u128;
                    (a + (1u128 << BITS)).saturating_sub(b)
                });
                let bit = shifted.map(|d| F::from(((d >> BITS) & 1) as u64));
                let low = shifted.map(|d| F::from((d & ((1u128 << BITS) - 1)) as u64));

                let bit_cell = region.assign_advice(|| "bit", self.config.bit, 0, || bit)?;
                let low_cell = region.assign_advice(|| "low", self.config.low, 0, || low)?;

                Ok((bit_cell, low_cell))
            },
        )?;

        range_chip.check(layouter.namespace(|| "range check low"), low_cell)?;

        Ok(bit_cell)
    }

    fn lte(
        &self,
        mut layouter: impl Layouter<F>,
        a: AssignedCell<F, F>,
        b: AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.gte(layouter.namespace(|| "a <= b"), b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_proofs::{
        circuit::{SimpleFloorPlanner, Value},
        dev::MockProver,
        plonk::{Circuit, Instance},
    };
    use pasta_curves::Fp;

    #[derive(Debug, Clone)]
    struct ComparisonTestConfig<const BITS: usize> {
        cmp: ComparisonConfig<Fp, BITS>,
        instance: Column<Instance>,
    }

    #[derive(Clone)]
    struct ComparisonTestCircuit<const BITS: usize> {
        a: Value<Fp>,
        b: Value<Fp>,
    }

    impl<const BITS: usize> Default for ComparisonTestCircuit<BITS> {
        fn default() -> Self {
            Self {
                a: Value::unknown(),
                b: Value::unknown(),
            }
        }
    }

    impl<const BITS: usize> Circuit<Fp> for ComparisonTestCircuit<BITS> {
        type Config = ComparisonTestConfig<BITS>;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self::default()
        }

        fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
            let a = meta.advice_column();
            let b = meta.advice_column();
            let bit = meta.advice_column();
            let low = meta.advice_column();
            let range_value = meta.advice_column();
            let instance = meta.instance_column();
            meta.enable_equality(instance);

            ComparisonTestConfig {
                cmp: ComparisonChip::<Fp, BITS>::configure(meta, a, b, bit, low, range_value),
                instance,
            }
        }

        fn synthesize(
            &self,
            config: Self::Config,
            mut layouter: impl Layouter<Fp>,
        ) -> Result<(), Error> {
            let chip = ComparisonChip::<Fp, BITS>::construct(config.cmp.clone());

            chip.load_table(layouter.namespace(|| "load table"))?;

            let (a_cell, b_cell) = layouter.assign_region(
                || "assign inputs",
                |mut region| {
                    let a = region.assign_advice(|| "a", config.cmp.a, 0, || self.a)?;
                    let b = region.assign_advice(|| "b", config.cmp.b, 0, || self.b)?;
                    Ok((a, b))
                },
            )?;

            let bit = chip.gte(layouter.namespace(|| "a >= b"), a_cell, b_cell)?;
            layouter.constrain_instance(bit.cell(), config.instance, 0)
        }
    }

    fn run(a: u64, b: u64, expected: u64) -> Result<(), Vec<halo2_proofs::dev::VerifyFailure>> {
        const BITS: usize = 8;
        let circuit = ComparisonTestCircuit::<BITS> {
            a: Value::known(Fp::from(a)),
            b: Value::known(Fp::from(b)),
        };
        let prover = MockProver::run(10, &circuit, vec![vec![Fp::from(expected)]]).unwrap();
        prover.verify()
    }

    #[test]
    fn test_gte_true_cases() {
        for (a, b) in [(100u64, 50u64), (100, 100), (255, 0), (18, 18), (25, 18)] {
            assert_eq!(run(a, b, 1), Ok(()), "Failed for a={}, b={}", a, b);
        }
    }

    #[test]
    fn test_gte_false_cases_still_satisfiable() {
        // A false comparison is a valid witness with bit = 0
        for (a, b) in [(16u64, 18u64), (0, 255), (17, 18)] {
            assert_eq!(run(a, b, 0), Ok(()), "Failed for a={}, b={}", a, b);
        }
    }

    #[test]
    fn test_gte_bit_cannot_be_flipped() {
        // Claiming the opposite result must not verify
        assert!(run(16, 18, 1).is_err());
        assert!(run(25, 18, 0).is_err());
    }

    #[test]
    fn test_operand_out_of_domain_is_infeasible() {
        // 300 does not fit in 8 bits: structural failure, not a 0 bit
        assert!(run(300, 18, 1).is_err());
        assert!(run(300, 18, 0).is_err());
    }

    #[test]
    fn test_field_to_u64() {
        assert_eq!(field_to_u64(&Fp::from(255u64)), Some(255));
        assert_eq!(field_to_u64(&Fp::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(field_to_u64(&-Fp::ONE), None);
    }
}
