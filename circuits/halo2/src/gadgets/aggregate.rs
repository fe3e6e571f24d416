//! Sum-of-Checks Aggregation
//!
//! Folds boolean sub-check outputs into a running sum:
//!
//! ```text
//! row 0: acc = 0        term = c_0
//! row 1: acc = c_0      term = c_1
//! ...
//! row n: acc = c_0 + ... + c_{n-1}
//! ```
//!
//! Every term is boolean-constrained on its own row, so `total == n` holds
//! exactly when every check is 1. The comparison against `n` is left to the
//! caller (see `IsEqualChip::is_equal_constant`), which keeps a failing check
//! a satisfiable `valid = 0` witness instead of an unsatisfiable circuit.

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector},
    poly::Rotation,
};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct AggregateConfig<F: PrimeField> {
    pub acc: Column<Advice>,
    pub term: Column<Advice>,
    pub q_sum: Selector,
    _marker: PhantomData<F>,
}

#[derive(Debug, Clone)]
pub struct AggregateChip<F: PrimeField> {
    config: AggregateConfig<F>,
}

impl<F: PrimeField> AggregateChip<F> {
    pub fn construct(config: AggregateConfig<F>) -> Self {
        Self { config }
    }

    /// Requires a constant column on the enclosing circuit (initial zero).
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        acc: Column<Advice>,
        term: Column<Advice>,
    ) -> AggregateConfig<F> {
        let q_sum = meta.selector();

        meta.enable_equality(acc);
        meta.enable_equality(term);

        meta.create_gate("boolean sum", |meta| {
            let q = meta.query_selector(q_sum);
            let acc_cur = meta.query_advice(acc, Rotation::cur());
            let acc_next = meta.query_advice(acc, Rotation::next());
            let term = meta.query_advice(term, Rotation::cur());
            let one = Expression::Constant(F::ONE);

            vec![
                q.clone() * (acc_next - acc_cur - term.clone()),
                q * term.clone() * (one - term),
            ]
        });

        AggregateConfig {
            acc,
            term,
            q_sum,
            _marker: PhantomData,
        }
    }

    /// Sum the given boolean cells, returning the total
    pub fn sum(
        &self,
        mut layouter: impl Layouter<F>,
        terms: &[AssignedCell<F, F>],
    ) -> Result<AssignedCell<F, F>, Error> {
        layouter.assign_region(
            || "aggregate checks",
            |mut region| {
                let mut acc = region.assign_advice_from_constant(
                    || "acc[0]",
                    self.config.acc,
                    0,
                    F::ZERO,
                )?;

                for (row, term) in terms.iter().enumerate() {
                    self.config.q_sum.enable(&mut region, row)?;
                    let name = || format!("term[{}]", row);
                    term.copy_advice(name, &mut region, self.config.term, row)?;

                    let next = acc.value().zip(term.value()).map(|(a, t)| *a + *t);
                    acc = region.assign_advice(
                        || format!("acc[{}]", row + 1),
                        self.config.acc,
                        row + 1,
                        || next,
                    )?;
                }

                Ok(acc)
            },
        )
    }
}
