//! Benchmarks for TinyCask store operations

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use tinycask::{DataType, Store};

fn open_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
    (temp_dir, store)
}

fn store_benchmarks(c: &mut Criterion) {
    let value = vec![0xABu8; 128];

    // Single key write throughput
    c.bench_function("put_128b", |b| {
        let (_temp, store) = open_store();
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key{}", i);
            store.put(key.as_bytes(), &value).unwrap();
            i += 1;
        });
    });

    // Random read throughput over a populated store
    c.bench_function("get_128b", |b| {
        let (_temp, store) = open_store();
        for i in 0..10_000 {
            store.put(format!("key{}", i).as_bytes(), &value).unwrap();
        }
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key{}", (i * 7919) % 10_000);
            store.get(key.as_bytes()).unwrap();
            i += 1;
        });
    });

    // Merge of a log where 90% of records are stale
    c.bench_function("merge_10k_records", |b| {
        b.iter_batched(
            || {
                let (temp, store) = open_store();
                for i in 0..10_000 {
                    store.put(format!("key{}", i % 1_000).as_bytes(), &value).unwrap();
                }
                (temp, store)
            },
            |(_temp, store)| store.merge().unwrap(),
            BatchSize::PerIteration,
        );
    });

    // Transaction commit of 100 staged puts
    c.bench_function("tx_commit_100", |b| {
        let (_temp, store) = open_store();
        b.iter(|| {
            let tx = store.begin();
            for i in 0..100 {
                tx.put(format!("key{}", i).as_bytes(), &value).unwrap();
            }
            tx.commit().unwrap();
        });
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
