//! Attribute-domain range check (lookup table)
//!
//! Every private attribute fed into a comparator must lie in `[0, 2^BITS)`.
//! With `BITS = 8` the table holds 256 rows and covers every age and every
//! risk tier; one lookup per value.
//!
//! A value outside the table is a *structural* failure: the witness cannot be
//! wired into the circuit at all. Predicate failures (e.g. age below the
//! threshold) never go through this path; they surface as a `0` bit from the
//! comparison gadget instead.
//!
//! ```text
//! region "attribute domain"
//! row | value | q_lookup
//! ----+-------+---------
//!  0  |  a    |    1      a ∈ table
//!  1  |  b    |    1      b ∈ table
//!  …  |  …    |    1
//! ```
//!
//! # Example
//! ```ignore
//! chip.check_all(layouter.namespace(|| "operands"), &[age, threshold])?;
//! ```

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Selector, TableColumn},
    poly::Rotation,
};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct RangeCheckConfig<F: PrimeField, const BITS: usize> {
    /// Copies of the values being checked, one per row
    pub value: Column<Advice>,
    pub q_lookup: Selector,
    /// `[0, 2^BITS)`
    pub table: TableColumn,
    _marker: PhantomData<F>,
}

pub trait RangeCheckInstruction<F: PrimeField> {
    /// Constrain a single value to the table
    fn check(&self, layouter: impl Layouter<F>, value: AssignedCell<F, F>) -> Result<(), Error>;

    /// Constrain several values in one region
    fn check_all(
        &self,
        layouter: impl Layouter<F>,
        values: &[AssignedCell<F, F>],
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct RangeCheckChip<F: PrimeField, const BITS: usize> {
    config: RangeCheckConfig<F, BITS>,
}

impl<F: PrimeField, const BITS: usize> RangeCheckChip<F, BITS> {
    pub fn construct(config: RangeCheckConfig<F, BITS>) -> Self {
        Self { config }
    }

    /// Largest value the table accepts
    pub const fn max_value() -> u64 {
        (1u64 << BITS) - 1
    }

    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        value: Column<Advice>,
    ) -> RangeCheckConfig<F, BITS> {
        let q_lookup = meta.complex_selector();
        let table = meta.lookup_table_column();

        meta.enable_equality(value);

        meta.lookup("attribute domain", |meta| {
            let q = meta.query_selector(q_lookup);
            let v = meta.query_advice(value, Rotation::cur());

            // Unselected rows look up 0, which is in the table
            vec![(q * v, table)]
        });

        RangeCheckConfig {
            value,
            q_lookup,
            table,
            _marker: PhantomData,
        }
    }

    /// Fill the table column. Must run once per synthesis.
    pub fn load_table(&self, mut layouter: impl Layouter<F>) -> Result<(), Error> {
        layouter.assign_table(
            || "attribute domain table",
            |mut table| {
                for i in 0..=Self::max_value() {
                    table.assign_cell(
                        || format!("domain[{}]", i),
                        self.config.table,
                        i as usize,
                        || Value::known(F::from(i)),
                    )?;
                }
                Ok(())
            },
        )
    }
}

impl<F: PrimeField, const BITS: usize> RangeCheckInstruction<F> for RangeCheckChip<F, BITS> {
    fn check(&self, layouter: impl Layouter<F>, value: AssignedCell<F, F>) -> Result<(), Error> {
        self.check_all(layouter, &[value])
    }

    fn check_all(
        &self,
        mut layouter: impl Layouter<F>,
        values: &[AssignedCell<F, F>],
    ) -> Result<(), Error> {
        layouter.assign_region(
            || "attribute domain",
            |mut region| {
                for (row, value) in values.iter().enumerate() {
                    self.config.q_lookup.enable(&mut region, row)?;
                    let name = || format!("value[{}]", row);
                    value.copy_advice(name, &mut region, self.config.value, row)?;
                }
                Ok(())
            },
        )
    }
}
