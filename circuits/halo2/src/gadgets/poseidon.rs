//! Poseidon Hash Gadget for Nullifiers and Commitments
//!
//! The identity subsystem hashes at most four field elements at a time, so the
//! permutation is sized to absorb them in one go: width 5, rate 4, capacity 1.
//!
//! # Security Properties
//! - **Collision Resistance**: Hard to find x1, x2 where H(x1) = H(x2)
//! - **Preimage Resistance**: Hard to find x given H(x)
//! - **Determinism**: The in-circuit chip and [`poseidon_hash`] compute the
//!   exact same function, so a witness builder can pre-compute public inputs
//!
//! # Sponge Layout
//! ```text
//! state = [m0, m1, m2, m3, arity * 2^64]
//! ```
//! Unused message slots are zero. The capacity word carries the input length,
//! so `H(a, b)` and `H(a, b, 0)` never collide.
//!
//! # Usage
//! ```ignore
//! use zk_identity_circuits::gadgets::poseidon::poseidon_hash;
//! use pasta_curves::Fp;
//!
//! let nullifier = poseidon_hash(&[secret_key, salt]);
//! let commitment = poseidon_hash(&[age, country_risk, salt, secret_key]);
//! ```

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Fixed, Selector},
    poly::Rotation,
};
use std::marker::PhantomData;

/// Permutation width: t = 5 (4 inputs + 1 capacity)
pub const POSEIDON_WIDTH: usize = 5;
/// Number of message words absorbed per permutation
pub const POSEIDON_RATE: usize = 4;
/// S-box exponent: x^5
pub const POSEIDON_ALPHA: u64 = 5;

/// Number of full rounds (half before, half after the partial rounds)
pub const FULL_ROUNDS: usize = 8;
/// Number of partial rounds for t = 5
pub const PARTIAL_ROUNDS: usize = 60;

const TOTAL_ROUNDS: usize = FULL_ROUNDS + PARTIAL_ROUNDS;

/// Seed for the round-constant generator ("ZKID")
const RC_SEED: u64 = 0x5a4b_4944;

/// Round constants, one row of `POSEIDON_WIDTH` per round.
///
/// Generated by iterating `x -> x^5 + i` from a fixed seed, so both the chip
/// and the standalone hash derive identical values without a lookup file.
fn round_constants<F: PrimeField>() -> Vec<[F; POSEIDON_WIDTH]> {
    let mut x = F::from(RC_SEED);
    let mut constants = Vec::with_capacity(TOTAL_ROUNDS);

    for round in 0..TOTAL_ROUNDS {
        let mut row = [F::ZERO; POSEIDON_WIDTH];
        for (i, slot) in row.iter_mut().enumerate() {
            let idx = (round * POSEIDON_WIDTH + i) as u64;
            x = pow5(x) + F::from(idx + 1);
            *slot = x;
        }
        constants.push(row);
    }
    constants
}

/// Cauchy MDS matrix: M[i][j] = 1 / (x_i + y_j) with x_i = i, y_j = t + j
fn mds_matrix<F: PrimeField>() -> [[F; POSEIDON_WIDTH]; POSEIDON_WIDTH] {
    let mut matrix = [[F::ZERO; POSEIDON_WIDTH]; POSEIDON_WIDTH];

    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            let x = F::from(i as u64);
            let y = F::from((j + POSEIDON_WIDTH) as u64);
            // x + y is in [t, 3t) so it is never zero
            *entry = (x + y).invert().unwrap_or(F::ONE);
        }
    }
    matrix
}

/// Capacity word for an input of the given arity
pub fn domain_tag<F: PrimeField>(arity: usize) -> F {
    F::from_u128((arity as u128) << 64)
}

fn is_full_round(round: usize) -> bool {
    round < FULL_ROUNDS / 2 || round >= FULL_ROUNDS / 2 + PARTIAL_ROUNDS
}

fn pow5<F: PrimeField>(x: F) -> F {
    let x2 = x.square();
    x2.square() * x
}

fn pow5_expr<F: PrimeField>(x: Expression<F>) -> Expression<F> {
    x.clone() * x.clone() * x.clone() * x.clone() * x
}

/// One round applied to a concrete state: add constants, S-box, MDS
fn permute_round<F: PrimeField>(
    state: &[F; POSEIDON_WIDTH],
    rc: &[F; POSEIDON_WIDTH],
    mds: &[[F; POSEIDON_WIDTH]; POSEIDON_WIDTH],
    full: bool,
) -> [F; POSEIDON_WIDTH] {
    let mut sboxed = [F::ZERO; POSEIDON_WIDTH];
    for j in 0..POSEIDON_WIDTH {
        let x = state[j] + rc[j];
        sboxed[j] = if full || j == 0 { pow5(x) } else { x };
    }

    let mut next = [F::ZERO; POSEIDON_WIDTH];
    for i in 0..POSEIDON_WIDTH {
        for j in 0..POSEIDON_WIDTH {
            next[i] += mds[i][j] * sboxed[j];
        }
    }
    next
}

/// Configuration for Poseidon chip
#[derive(Debug, Clone)]
pub struct PoseidonConfig<F: PrimeField> {
    /// State columns (width = 5)
    pub state: [Column<Advice>; POSEIDON_WIDTH],
    /// Round constants, one fixed column per state word
    pub rc: [Column<Fixed>; POSEIDON_WIDTH],
    /// Selector for full rounds
    pub q_full_round: Selector,
    /// Selector for partial rounds
    pub q_partial_round: Selector,
    _marker: PhantomData<F>,
}

/// Poseidon hash chip
///
/// The circuit using this chip must have a constant column enabled
/// (`meta.enable_constant`), which pins the zero padding and domain tag.
#[derive(Debug, Clone)]
pub struct PoseidonChip<F: PrimeField> {
    config: PoseidonConfig<F>,
}

impl<F: PrimeField> PoseidonChip<F> {
    pub fn construct(config: PoseidonConfig<F>) -> Self {
        Self { config }
    }

    /// Configure the Poseidon chip
    ///
    /// Row `r` of a hash region holds the state entering round `r`. Each gate
    /// ties row `r + 1` to row `r`:
    /// `next[i] = sum_j mds[i][j] * sbox(cur[j] + rc[j])`
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        state: [Column<Advice>; POSEIDON_WIDTH],
    ) -> PoseidonConfig<F> {
        let q_full_round = meta.selector();
        let q_partial_round = meta.selector();
        let rc = [(); POSEIDON_WIDTH].map(|_| meta.fixed_column());

        for col in &state {
            meta.enable_equality(*col);
        }

        let mds = mds_matrix::<F>();

        meta.create_gate("poseidon full round", |meta| {
            let q = meta.query_selector(q_full_round);

            let sboxed: Vec<_> = (0..POSEIDON_WIDTH)
                .map(|j| {
                    let cur = meta.query_advice(state[j], Rotation::cur());
                    let c = meta.query_fixed(rc[j], Rotation::cur());
                    pow5_expr(cur + c)
                })
                .collect();

            (0..POSEIDON_WIDTH)
                .map(|i| {
                    let next = meta.query_advice(state[i], Rotation::next());
                    let sum = sboxed
                        .iter()
                        .enumerate()
                        .fold(Expression::Constant(F::ZERO), |acc, (j, s)| {
                            acc + Expression::Constant(mds[i][j]) * s.clone()
                        });
                    q.clone() * (next - sum)
                })
                .collect::<Vec<_>>()
        });

        meta.create_gate("poseidon partial round", |meta| {
            let q = meta.query_selector(q_partial_round);

            let mixed: Vec<_> = (0..POSEIDON_WIDTH)
                .map(|j| {
                    let cur = meta.query_advice(state[j], Rotation::cur());
                    let c = meta.query_fixed(rc[j], Rotation::cur());
                    if j == 0 {
                        pow5_expr(cur + c)
                    } else {
                        cur + c
                    }
                })
                .collect();

            (0..POSEIDON_WIDTH)
                .map(|i| {
                    let next = meta.query_advice(state[i], Rotation::next());
                    let sum = mixed
                        .iter()
                        .enumerate()
                        .fold(Expression::Constant(F::ZERO), |acc, (j, s)| {
                            acc + Expression::Constant(mds[i][j]) * s.clone()
                        });
                    q.clone() * (next - sum)
                })
                .collect::<Vec<_>>()
        });

        PoseidonConfig {
            state,
            rc,
            q_full_round,
            q_partial_round,
            _marker: PhantomData,
        }
    }

    /// Hash up to `POSEIDON_RATE` assigned cells.
    /// Returns H(inputs[0], ..., inputs[n-1])
    pub fn hash(
        &self,
        mut layouter: impl Layouter<F>,
        inputs: &[AssignedCell<F, F>],
    ) -> Result<AssignedCell<F, F>, Error> {
        if inputs.is_empty() || inputs.len() > POSEIDON_RATE {
            return Err(Error::Synthesis);
        }

        let rc = round_constants::<F>();
        let mds = mds_matrix::<F>();
        let arity = inputs.len();

        layouter.assign_region(
            || format!("poseidon hash ({} inputs)", arity),
            |mut region| {
                // Row 0: message words, zero padding, domain tag
                let mut cells = Vec::with_capacity(POSEIDON_WIDTH);
                for i in 0..POSEIDON_RATE {
                    let cell = match inputs.get(i) {
                        Some(input) => input.copy_advice(
                            || format!("input[{}]", i),
                            &mut region,
                            self.config.state[i],
                            0,
                        )?,
                        None => region.assign_advice_from_constant(
                            || format!("padding[{}]", i),
                            self.config.state[i],
                            0,
                            F::ZERO,
                        )?,
                    };
                    cells.push(cell);
                }
                cells.push(region.assign_advice_from_constant(
                    || "domain tag",
                    self.config.state[POSEIDON_WIDTH - 1],
                    0,
                    domain_tag::<F>(arity),
                )?);

                let mut state: Vec<Value<F>> = cells.iter().map(|c| c.value().copied()).collect();
                let mut output = cells[0].clone();

                for round in 0..TOTAL_ROUNDS {
                    let full = is_full_round(round);
                    if full {
                        self.config.q_full_round.enable(&mut region, round)?;
                    } else {
                        self.config.q_partial_round.enable(&mut region, round)?;
                    }

                    for i in 0..POSEIDON_WIDTH {
                        region.assign_fixed(
                            || format!("rc[{}][{}]", round, i),
                            self.config.rc[i],
                            round,
                            || Value::known(rc[round][i]),
                        )?;
                    }

                    let current: Value<Vec<F>> = state.iter().copied().collect();
                    let next = current.map(|words| {
                        let mut s = [F::ZERO; POSEIDON_WIDTH];
                        s.copy_from_slice(&words);
                        permute_round(&s, &rc[round], &mds, full)
                    });

                    state = (0..POSEIDON_WIDTH).map(|i| next.map(|s| s[i])).collect();

                    for (i, val) in state.iter().enumerate() {
                        let cell = region.assign_advice(
                            || format!("state[{}]", i),
                            self.config.state[i],
                            round + 1,
                            || *val,
                        )?;
                        if i == 0 {
                            output = cell;
                        }
                    }
                }

                // Output is first element of final state
                Ok(output)
            },
        )
    }
}

// ============================================================================
// STANDALONE POSEIDON HASH (for use outside circuits)
// ============================================================================

/// Compute the Poseidon hash of 1 to 4 field elements (standalone, no circuit)
///
/// This computes exactly what [`PoseidonChip::hash`] constrains, so the
/// witness builder and the circuit agree on every nullifier and commitment.
///
/// # Panics
/// Panics if `inputs` is empty or longer than [`POSEIDON_RATE`]; every caller
/// in this crate passes a fixed arity.
pub fn poseidon_hash<F: PrimeField>(inputs: &[F]) -> F {
    assert!(
        !inputs.is_empty() && inputs.len() <= POSEIDON_RATE,
        "poseidon arity must be in 1..={}",
        POSEIDON_RATE
    );

    let rc = round_constants::<F>();
    let mds = mds_matrix::<F>();

    let mut state = [F::ZERO; POSEIDON_WIDTH];
    state[..inputs.len()].copy_from_slice(inputs);
    state[POSEIDON_WIDTH - 1] = domain_tag(inputs.len());

    for (round, constants) in rc.iter().enumerate() {
        state = permute_round(&state, constants, &mds, is_full_round(round));
    }

    state[0]
}

/// Nullifier for an identity slot: `H(secret_key, salt)`
pub fn compute_nullifier<F: PrimeField>(secret_key: F, salt: F) -> F {
    poseidon_hash(&[secret_key, salt])
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_proofs::{
        circuit::SimpleFloorPlanner,
        dev::MockProver,
        plonk::{Circuit, Instance},
    };
    use pasta_curves::Fp;

    #[derive(Debug, Clone)]
    struct HashTestConfig {
        poseidon: PoseidonConfig<Fp>,
        input: Column<Advice>,
        instance: Column<Instance>,
    }

    #[derive(Clone, Default)]
    struct HashTestCircuit {
        inputs: Vec<Value<Fp>>,
    }

    impl Circuit<Fp> for HashTestCircuit {
        type Config = HashTestConfig;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self {
                inputs: vec![Value::unknown(); self.inputs.len()],
            }
        }

        fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
            let state = [(); POSEIDON_WIDTH].map(|_| meta.advice_column());
            let input = meta.advice_column();
            let instance = meta.instance_column();
            let constants = meta.fixed_column();

            meta.enable_equality(input);
            meta.enable_equality(instance);
            meta.enable_constant(constants);

            HashTestConfig {
                poseidon: PoseidonChip::configure(meta, state),
                input,
                instance,
            }
        }

        fn synthesize(
            &self,
            config: Self::Config,
            mut layouter: impl Layouter<Fp>,
        ) -> Result<(), Error> {
            let chip = PoseidonChip::construct(config.poseidon.clone());

            let cells = layouter.assign_region(
                || "inputs",
                |mut region| {
                    self.inputs
                        .iter()
                        .enumerate()
                        .map(|(row, v)| {
                            region.assign_advice(|| "input", config.input, row, || *v)
                        })
                        .collect::<Result<Vec<_>, Error>>()
                },
            )?;

            let digest = chip.hash(layouter.namespace(|| "hash"), &cells)?;
            layouter.constrain_instance(digest.cell(), config.instance, 0)
        }
    }

    fn run(inputs: &[Fp], expected: Fp) -> Result<(), Vec<halo2_proofs::dev::VerifyFailure>> {
        let circuit = HashTestCircuit {
            inputs: inputs.iter().map(|v| Value::known(*v)).collect(),
        };
        let prover = MockProver::run(8, &circuit, vec![vec![expected]]).unwrap();
        prover.verify()
    }

    #[test]
    fn test_chip_matches_standalone_hash() {
        let inputs = [
            Fp::from(25u64),
            Fp::from(1u64),
            Fp::from(12345u64),
            Fp::from(0xdead_beefu64),
        ];

        for arity in 1..=POSEIDON_RATE {
            let expected = poseidon_hash(&inputs[..arity]);
            assert_eq!(run(&inputs[..arity], expected), Ok(()), "arity {}", arity);
        }
    }

    #[test]
    fn test_chip_rejects_wrong_digest() {
        let inputs = [Fp::from(7u64), Fp::from(11u64)];
        let wrong = poseidon_hash(&inputs) + Fp::ONE;
        assert!(run(&inputs, wrong).is_err());
    }

    #[test]
    fn test_hash_deterministic() {
        let a = poseidon_hash(&[Fp::from(1u64), Fp::from(2u64)]);
        let b = poseidon_hash(&[Fp::from(1u64), Fp::from(2u64)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_domain_separation_by_arity() {
        let two = poseidon_hash(&[Fp::from(1u64), Fp::from(2u64)]);
        let three = poseidon_hash(&[Fp::from(1u64), Fp::from(2u64), Fp::ZERO]);
        assert_ne!(two, three, "zero padding must not collide with an explicit zero");
    }

    #[test]
    fn test_nullifier_depends_on_salt() {
        let sk = Fp::from(42u64);
        assert_ne!(
            compute_nullifier(sk, Fp::from(1u64)),
            compute_nullifier(sk, Fp::from(2u64))
        );
    }
}
