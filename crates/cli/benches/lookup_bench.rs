use cdb::{Cdb, CdbWriter};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;

const N: u32 = 10_000;
const QUERIES: u32 = 1_000;

fn build_db(path: &std::path::Path) {
    let mut w = CdbWriter::create(path).unwrap();
    for i in 0..N {
        w.put(format!("key{i:05}").as_bytes(), i.to_string().as_bytes())
            .unwrap();
    }
    w.finish().unwrap();
}

fn get_hit_file(c: &mut Criterion) {
    c.bench_function("get_hit_file_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.cdb");
                build_db(&path);
                let db = Cdb::open(&path).unwrap();
                (dir, db)
            },
            |(_dir, db)| {
                for i in 0..QUERIES {
                    let key = format!("key{i:05}").into_bytes();
                    criterion::black_box(db.get(&key).unwrap());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn get_hit_mmap(c: &mut Criterion) {
    c.bench_function("get_hit_mmap_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.cdb");
                build_db(&path);
                let db = Cdb::open_mmap(&path).unwrap();
                (dir, db)
            },
            |(_dir, db)| {
                for i in 0..QUERIES {
                    let key = format!("key{i:05}").into_bytes();
                    criterion::black_box(db.get(&key).unwrap());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn get_hit_buffer(c: &mut Criterion) {
    c.bench_function("get_hit_buffer_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.cdb");
                build_db(&path);
                Cdb::new(std::fs::read(&path).unwrap()).unwrap()
            },
            |db| {
                for i in 0..QUERIES {
                    let key = format!("key{i:05}").into_bytes();
                    criterion::black_box(db.get(&key).unwrap());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn get_miss_file(c: &mut Criterion) {
    c.bench_function("get_miss_file_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.cdb");
                build_db(&path);
                let db = Cdb::open(&path).unwrap();
                (dir, db)
            },
            |(_dir, db)| {
                for i in 0..QUERIES {
                    let key = format!("absent{i:05}").into_bytes();
                    criterion::black_box(db.get(&key).unwrap());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    get_hit_file,
    get_hit_mmap,
    get_hit_buffer,
    get_miss_file,
);

criterion_main!(benches);
