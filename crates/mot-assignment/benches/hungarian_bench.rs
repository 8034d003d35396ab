use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mot_assignment::solve;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_cost_matrix(n: usize, m: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    (0..n)
        .map(|_| (0..m).map(|_| rng.gen_range(0.0..100.0)).collect())
        .collect()
}

fn bench_hungarian(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut group = c.benchmark_group("hungarian_solve");
    for size in [8usize, 32, 64] {
        let cost = random_cost_matrix(size, size, &mut rng);
        group.bench_function(format!("{size}x{size}"), |b| {
            b.iter(|| solve(black_box(&cost)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hungarian);
criterion_main!(benches);
