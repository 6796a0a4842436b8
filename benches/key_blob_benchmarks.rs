use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keyblob::{
    authorization::{Algorithm, AuthorizationSet, Tag},
    KeyBlob, NONCE_LENGTH, TAG_LENGTH,
};

fn sample_blob(material_len: usize) -> KeyBlob {
    let mut enforced = AuthorizationSet::new();
    enforced.push_algorithm(Algorithm::Aes).unwrap();
    enforced.push_key_size(256).unwrap();
    let mut unenforced = AuthorizationSet::new();
    unenforced.push_blob(Tag::APPLICATION_ID, b"bench").unwrap();

    let mut blob = KeyBlob::new(enforced, unenforced);
    blob.set_encrypted_key(vec![0xA5u8; material_len], [1; NONCE_LENGTH], [2; TAG_LENGTH]);
    blob
}

fn key_blob_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_blob");

    for size in [32usize, 256, 4096].iter() {
        let blob = sample_blob(*size);
        group.bench_with_input(BenchmarkId::new("serialize", size), size, |b, _| {
            b.iter(|| blob.serialize())
        });

        let bytes = blob.serialize().unwrap();
        group.bench_with_input(BenchmarkId::new("parse_versioned", size), size, |b, _| {
            b.iter(|| KeyBlob::from_bytes(&bytes))
        });

        // Same payload in the legacy layout: drop the version byte and the
        // nonce and tag length prefixes
        let material_end = 5 + NONCE_LENGTH + 4 + size;
        let mut legacy = Vec::with_capacity(bytes.len());
        legacy.extend_from_slice(&bytes[5..material_end]);
        legacy.extend_from_slice(&bytes[material_end + 4..]);
        group.bench_with_input(BenchmarkId::new("parse_legacy", size), size, |b, _| {
            b.iter(|| KeyBlob::from_bytes(&legacy))
        });
    }

    group.finish();
}

criterion_group!(benches, key_blob_benchmarks);
criterion_main!(benches);
