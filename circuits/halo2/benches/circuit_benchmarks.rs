//! Benchmarks for ZK circuits
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use halo2_proofs::dev::MockProver;
use zk_identity_circuits::{poseidon_hash, CircuitVariant, Fp, WitnessBuilder, K};

fn bench_poseidon(c: &mut Criterion) {
    let inputs = [Fp::from(25u64), Fp::from(1u64), Fp::from(12345u64), Fp::from(42u64)];

    c.bench_function("Poseidon hash (4 inputs)", |b| {
        b.iter(|| poseidon_hash(&inputs));
    });
}

fn bench_personhood_proof(c: &mut Criterion) {
    let request = WitnessBuilder::new()
        .age(25)
        .country_risk(1)
        .unique_id_salt(Fp::from(12345u64))
        .secret_key(Fp::from(42u64))
        .build(CircuitVariant::FullPersonhood)
        .unwrap();

    let circuit = request.circuit();
    let instance = request.instance();

    c.bench_function("FullPersonhood MockProver", |b| {
        b.iter(|| {
            let prover = MockProver::run(K, &circuit, vec![instance.clone()]).unwrap();
            prover.verify().unwrap();
        });
    });
}

criterion_group!(benches, bench_poseidon, bench_personhood_proof);
criterion_main!(benches);
