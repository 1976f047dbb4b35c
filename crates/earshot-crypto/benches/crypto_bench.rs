//! Performance benchmarks for earshot-crypto.
//!
//! Run with: `cargo bench -p earshot-crypto`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use earshot_crypto::{KeyPair, SharedKey, decrypt, encrypt, fingerprint};
use rand_core::OsRng;

// ============================================================================
// ECDH Benchmarks
// ============================================================================

fn bench_keypair_generate(c: &mut Criterion) {
    c.bench_function("p256_keypair_generate", |b| {
        b.iter(|| KeyPair::generate(&mut OsRng))
    });
}

fn bench_shared_key_derive(c: &mut Criterion) {
    let alice = KeyPair::generate(&mut OsRng);
    let bob = KeyPair::generate(&mut OsRng);
    let bob_public = bob.public_key_bytes();

    c.bench_function("p256_derive_shared_key", |b| {
        b.iter(|| alice.derive_shared_key(black_box(&bob_public)))
    });
}

// ============================================================================
// AEAD Benchmarks
// ============================================================================

fn bench_aead_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead_encrypt");

    // Chat messages are short; larger sizes cover pasted text
    let sizes = [64, 256, 1024, 4096];

    for size in sizes {
        let key = SharedKey::from_bytes([0x42u8; 32]);
        let plaintext = vec![0xAA; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| encrypt(black_box(&key), black_box(&plaintext)))
        });
    }

    group.finish();
}

fn bench_aead_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead_decrypt");

    let sizes = [64, 256, 1024, 4096];

    for size in sizes {
        let key = SharedKey::from_bytes([0x42u8; 32]);
        let plaintext = vec![0xAA; size];

        // Pre-encrypt for the decryption benchmark
        let envelope = encrypt(&key, &plaintext).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| decrypt(black_box(&key), black_box(&envelope)))
        });
    }

    group.finish();
}

fn bench_aead_roundtrip(c: &mut Criterion) {
    let key = SharedKey::from_bytes([0x42u8; 32]);
    let plaintext = vec![0xBB; 256];

    c.bench_function("aead_roundtrip_256", |b| {
        b.iter(|| {
            let envelope = encrypt(black_box(&key), black_box(&plaintext)).unwrap();
            decrypt(black_box(&key), black_box(&envelope))
        })
    });
}

// ============================================================================
// Fingerprint Benchmarks
// ============================================================================

fn bench_fingerprint(c: &mut Criterion) {
    let pair = KeyPair::generate(&mut OsRng);
    let public = pair.public_key_bytes();

    c.bench_function("fingerprint", |b| b.iter(|| fingerprint(black_box(&public))));
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(ecdh_benches, bench_keypair_generate, bench_shared_key_derive,);

criterion_group!(
    aead_benches,
    bench_aead_encrypt,
    bench_aead_decrypt,
    bench_aead_roundtrip,
);

criterion_group!(fingerprint_benches, bench_fingerprint,);

criterion_main!(ecdh_benches, aead_benches, fingerprint_benches);
