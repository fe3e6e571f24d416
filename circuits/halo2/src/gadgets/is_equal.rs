//! Equality Gadget with a Boolean Output
//!
//! `is_equal(x, y)` returns a cell holding `1` if `x == y` and `0` otherwise.
//! The prover supplies `inv = (x - y)^-1` (or 0), and the gate pins `out`:
//!
//! ```text
//! out = 1 - (x - y) * inv
//! (x - y) * out = 0
//! ```
//!
//! If `x != y` the second constraint forces `out = 0`; if `x == y` the first
//! forces `out = 1`. The output is therefore always boolean and fully
//! determined by the inputs, whatever `inv` the prover picks.
//!
//! The negated form (`is_nonzero`) uses `out = (x - y) * inv` together with
//! `(x - y) * (1 - out) = 0`.

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector},
    poly::Rotation,
};
use std::marker::PhantomData;

/// Configuration for the equality chip
#[derive(Debug, Clone)]
pub struct IsEqualConfig<F: PrimeField> {
    pub lhs: Column<Advice>,
    pub rhs: Column<Advice>,
    pub inv: Column<Advice>,
    pub out: Column<Advice>,
    /// out = (lhs == rhs)
    pub q_eq: Selector,
    /// out = (lhs != rhs)
    pub q_neq: Selector,
    _marker: PhantomData<F>,
}

#[derive(Debug, Clone)]
pub struct IsEqualChip<F: PrimeField> {
    config: IsEqualConfig<F>,
}

enum Rhs<'a, F: PrimeField> {
    Cell(&'a AssignedCell<F, F>),
    Constant(F),
}

impl<F: PrimeField> IsEqualChip<F> {
    pub fn construct(config: IsEqualConfig<F>) -> Self {
        Self { config }
    }

    /// Configure the chip. The enclosing circuit must enable a constant
    /// column if `is_equal_constant` or `is_nonzero` are used.
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        lhs: Column<Advice>,
        rhs: Column<Advice>,
        inv: Column<Advice>,
        out: Column<Advice>,
    ) -> IsEqualConfig<F> {
        let q_eq = meta.selector();
        let q_neq = meta.selector();

        for col in [lhs, rhs, out] {
            meta.enable_equality(col);
        }

        meta.create_gate("is equal", |meta| {
            let q = meta.query_selector(q_eq);
            let diff =
                meta.query_advice(lhs, Rotation::cur()) - meta.query_advice(rhs, Rotation::cur());
            let inv = meta.query_advice(inv, Rotation::cur());
            let out = meta.query_advice(out, Rotation::cur());
            let one = Expression::Constant(F::ONE);

            vec![
                q.clone() * (out.clone() - one + diff.clone() * inv),
                q * diff * out,
            ]
        });

        meta.create_gate("is not equal", |meta| {
            let q = meta.query_selector(q_neq);
            let diff =
                meta.query_advice(lhs, Rotation::cur()) - meta.query_advice(rhs, Rotation::cur());
            let inv = meta.query_advice(inv, Rotation::cur());
            let out = meta.query_advice(out, Rotation::cur());
            let one = Expression::Constant(F::ONE);

            vec![
                q.clone() * (out.clone() - diff.clone() * inv),
                q * diff * (one - out),
            ]
        });

        IsEqualConfig {
            lhs,
            rhs,
            inv,
            out,
            q_eq,
            q_neq,
            _marker: PhantomData,
        }
    }

    /// `1` if `lhs == rhs`, else `0`
    pub fn is_equal(
        &self,
        layouter: impl Layouter<F>,
        lhs: &AssignedCell<F, F>,
        rhs: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.assign(layouter, lhs, Rhs::Cell(rhs), false)
    }

    /// `1` if `lhs == constant`, else `0`
    pub fn is_equal_constant(
        &self,
        layouter: impl Layouter<F>,
        lhs: &AssignedCell<F, F>,
        constant: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.assign(layouter, lhs, Rhs::Constant(constant), false)
    }

    /// `1` if `value != 0`, else `0`
    pub fn is_nonzero(
        &self,
        layouter: impl Layouter<F>,
        value: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.assign(layouter, value, Rhs::Constant(F::ZERO), true)
    }

    fn assign(
        &self,
        mut layouter: impl Layouter<F>,
        lhs: &AssignedCell<F, F>,
        rhs: Rhs<'_, F>,
        negate: bool,
    ) -> Result<AssignedCell<F, F>, Error> {
        layouter.assign_region(
            || if negate { "is nonzero" } else { "is equal" },
            |mut region| {
                if negate {
                    self.config.q_neq.enable(&mut region, 0)?;
                } else {
                    self.config.q_eq.enable(&mut region, 0)?;
                }

                let lhs = lhs.copy_advice(|| "lhs", &mut region, self.config.lhs, 0)?;
                let rhs = match &rhs {
                    Rhs::Cell(cell) => cell.copy_advice(|| "rhs", &mut region, self.config.rhs, 0)?,
                    Rhs::Constant(c) => {
                        region.assign_advice_from_constant(|| "rhs", self.config.rhs, 0, *c)?
                    }
                };

                let diff: Value<F> = lhs.value().zip(rhs.value()).map(|(l, r)| *l - *r);
                let inv = diff.map(|d| d.invert().unwrap_or(F::ZERO));
                let out = diff.map(|d| {
                    let equal = d.is_zero_vartime();
                    if equal != negate {
                        F::ONE
                    } else {
                        F::ZERO
                    }
                });

                region.assign_advice(|| "inv", self.config.inv, 0, || inv)?;
                region.assign_advice(|| "out", self.config.out, 0, || out)
            },
        )
    }
}
