//! EC-JPAKE operation benchmarks over the software accelerator

use core::hint::black_box;
use criterion::{
    BenchmarkGroup, Criterion, criterion_group, criterion_main, measurement::Measurement,
};
use ecjpake::{
    ComputeSharedSecret, CurveParams, Ecjpake, GenerateZkp, KeyMaterial, NIST_P256, NoKeyStore,
    Params, RoundOneGenerateKeys, RoundTwoGenerateKeys, SoftPka, VerifyZkp,
};
use hex_literal::hex;

const X1: [u8; 32] = hex!("5c6b8fa9e2d1a4c03f96b7e01d2c8a7f4e3b2a19087f6e5d4c3b2a1908f7e6d5");
const X2: [u8; 32] = hex!("0f1e2d3c4b5a69788796a5b4c3d2e1f00112233445566778899aabbccddeeff0");
const V1: [u8; 32] = hex!("3a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6071829");
const V2: [u8; 32] = hex!("1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef");
const HASH: [u8; 32] = hex!("8a1f0c2e9d4b7a6f5e3c1d2b0a9f8e7d6c5b4a3928170f6e5d4c3b2a19081726");
const PASSWORD: &[u8] = b"threadjpaketest";

const CURVE: &CurveParams = &NIST_P256;

type Driver = Ecjpake<SoftPka>;

fn driver() -> Driver {
    Ecjpake::new(SoftPka::new(), NoKeyStore, Params::polling()).unwrap()
}

fn round_one_op() -> RoundOneGenerateKeys {
    RoundOneGenerateKeys::new(
        CURVE,
        KeyMaterial::plaintext(X1),
        KeyMaterial::plaintext(X2),
        KeyMaterial::plaintext(V1),
        KeyMaterial::plaintext(V2),
    )
}

fn round_two_op(keys: &RoundOneGenerateKeys) -> RoundTwoGenerateKeys {
    RoundTwoGenerateKeys::new(
        CURVE,
        keys.my_private_key2.clone(),
        keys.my_private_v2.clone(),
        KeyMaterial::plaintext(PASSWORD),
        keys.my_public_key1.clone(),
        keys.my_public_key2.clone(),
        keys.my_public_v1.clone(),
        keys.my_public_v2.clone(),
    )
}

fn bench_round_one<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let mut driver = driver();
    group.bench_function("round_one_generate_keys", |b| {
        b.iter(|| black_box(driver.round_one_generate_keys(black_box(round_one_op()))))
    });
}

fn bench_zkp<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let mut driver = driver();
    let keys: RoundOneGenerateKeys = driver
        .round_one_generate_keys(round_one_op())
        .into_output()
        .unwrap();
    let prove = || {
        GenerateZkp::new(
            CURVE,
            KeyMaterial::plaintext(X1),
            KeyMaterial::plaintext(V1),
            HASH,
        )
    };
    let proof: GenerateZkp = driver.generate_zkp(prove()).into_output().unwrap();

    group.bench_function("generate_zkp", |b| {
        b.iter(|| black_box(driver.generate_zkp(black_box(prove()))))
    });

    group.bench_function("verify_zkp", |b| {
        b.iter(|| {
            let op = VerifyZkp::new(
                CURVE,
                keys.my_public_key1.clone(),
                keys.my_public_v1.clone(),
                HASH,
                proof.r.clone(),
            );
            black_box(driver.verify_zkp(black_box(op)))
        })
    });
}

fn bench_round_two<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let mut driver = driver();
    let keys: RoundOneGenerateKeys = driver
        .round_one_generate_keys(round_one_op())
        .into_output()
        .unwrap();
    let two: RoundTwoGenerateKeys = driver
        .round_two_generate_keys(round_two_op(&keys))
        .into_output()
        .unwrap();

    group.bench_function("round_two_generate_keys", |b| {
        b.iter(|| black_box(driver.round_two_generate_keys(black_box(round_two_op(&keys)))))
    });

    group.bench_function("compute_shared_secret", |b| {
        b.iter(|| {
            let op = ComputeSharedSecret::new(
                CURVE,
                two.my_combined_private_key.clone(),
                keys.my_private_key2.clone(),
                keys.my_public_key2.clone(),
                two.my_combined_public_key.clone(),
            );
            black_box(driver.compute_shared_secret(black_box(op)))
        })
    });
}

fn bench_exchange(c: &mut Criterion) {
    let mut group = c.benchmark_group("EC-JPAKE P-256");
    bench_round_one(&mut group);
    bench_zkp(&mut group);
    bench_round_two(&mut group);
    group.finish();
}

criterion_group!(benches, bench_exchange);
criterion_main!(benches);
