use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use erased_collections::Vector;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_push_back(c: &mut Criterion) {
    c.bench_function("vector_push_back_10k", |b| {
        b.iter_batched(
            Vector::<u64>::new,
            |mut v| {
                for x in lcg(1).take(10_000) {
                    v.push_back(x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("std_vec_push_10k", |b| {
        b.iter_batched(
            Vec::<u64>::new,
            |mut v| {
                for x in lcg(1).take(10_000) {
                    v.push(x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_front(c: &mut Criterion) {
    c.bench_function("vector_insert_front_1k", |b| {
        b.iter_batched(
            Vector::<u64>::new,
            |mut v| {
                for x in lcg(3).take(1_000) {
                    v.insert(0, x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_middle(c: &mut Criterion) {
    c.bench_function("vector_erase_middle_1k", |b| {
        b.iter_batched(
            || lcg(5).take(2_000).collect::<Vector<u64>>(),
            |mut v| {
                for _ in 0..1_000 {
                    let mid = v.len() / 2;
                    v.erase(mid);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_clone_strings(c: &mut Criterion) {
    c.bench_function("vector_clone_1k_strings", |b| {
        let v: Vector<String> = lcg(9).take(1_000).map(|x| format!("k{:016x}", x)).collect();
        b.iter(|| black_box(v.clone()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_push_back, bench_insert_front, bench_erase_middle, bench_clone_strings
}
criterion_main!(benches);
