//! Benchmarks for the protocol hot paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ark_bn254::Fr;
use umbra_core::crypto::{derive, poseidon_hash2, MerkleAccumulator};
use umbra_core::proof::{WithdrawCircuit, WithdrawProofSystem};

fn bench_poseidon_hash2(c: &mut Criterion) {
    let a = Fr::from(1234u64);
    let b = Fr::from(5678u64);

    c.bench_function("poseidon_hash2", |bench| {
        bench.iter(|| poseidon_hash2(black_box(&a), black_box(&b)))
    });
}

fn bench_derive(c: &mut Criterion) {
    c.bench_function("derive_passphrase", |bench| {
        bench.iter(|| derive(black_box("correct horse battery staple")))
    });
}

fn bench_merkle_insert(c: &mut Criterion) {
    c.bench_function("merkle_insert", |bench| {
        bench.iter(|| {
            let mut tree = MerkleAccumulator::new();
            tree.insert(black_box(Fr::from(42u64))).unwrap()
        })
    });
}

fn bench_prove(c: &mut Criterion) {
    let secrets = derive("bench-passphrase");
    let mut tree = MerkleAccumulator::new();
    let index = tree.insert(secrets.commitment).unwrap();
    let path = tree.merkle_proof(index).unwrap();

    let system = WithdrawProofSystem::setup().unwrap();
    let recipient = Fr::from(0xbeefu64);

    c.bench_function("groth16_prove", |bench| {
        bench.iter(|| {
            let circuit = WithdrawCircuit::new(tree.root(), recipient, &secrets, &path);
            system.prove(black_box(circuit)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_poseidon_hash2,
    bench_derive,
    bench_merkle_insert,
    bench_prove
);
criterion_main!(benches);
