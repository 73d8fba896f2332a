//! Benchmarks for blockstore operations

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use blockstore::BlockStore;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn persist_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist");

    for len in [64usize, 505, 4096, 64 * 1024] {
        let temp_dir = TempDir::new().unwrap();
        let store = BlockStore::open_path(&temp_dir.path().join("bench.dat")).unwrap();
        let data = payload(len);

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| store.persist(data).unwrap());
        });
    }

    group.finish();
}

fn retrieve_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieve");

    for len in [64usize, 505, 4096, 64 * 1024] {
        let temp_dir = TempDir::new().unwrap();
        let store = BlockStore::open_path(&temp_dir.path().join("bench.dat")).unwrap();
        let id = store.persist(&payload(len)).unwrap();

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &id, |b, &id| {
            b.iter(|| store.retrieve(id).unwrap());
        });
    }

    group.finish();
}

fn reuse_benchmarks(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let store = BlockStore::open_path(&temp_dir.path().join("bench.dat")).unwrap();
    let data = payload(2048);

    // Persist + remove keeps the file size constant after the first round
    c.bench_function("persist_remove_cycle", |b| {
        b.iter(|| {
            let id = store.persist(&data).unwrap();
            store.remove(id).unwrap();
        });
    });
}

criterion_group!(benches, persist_benchmarks, retrieve_benchmarks, reuse_benchmarks);
criterion_main!(benches);
