//! Branch-and-cut on generated knapsack instances

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mipcut::{solve, BoundKind, Model, NodeSelection, SolverConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn random_knapsack(rng: &mut StdRng, items: usize) -> Model {
    let mut model = Model::maximize();
    let mut terms = Vec::with_capacity(items);
    let mut total_weight = 0.0;
    for i in 0..items {
        let x = model.add_integer_variable(format!("x{}", i), rng.gen_range(1.0..20.0));
        let weight: f64 = rng.gen_range(1.0..10.0);
        total_weight += weight;
        terms.push((weight, x));
        model.add_constraint(BoundKind::Upper, 1.0, &[(1.0, x)]);
    }
    model.add_constraint(BoundKind::Upper, total_weight / 2.0, &terms);
    model
}

fn benchmark_node_selection(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let models: Vec<Model> = (0..5).map(|_| random_knapsack(&mut rng, 12)).collect();

    let mut group = c.benchmark_group("knapsack_12");
    for order in [NodeSelection::BestFirst, NodeSelection::DepthFirst, NodeSelection::Hybrid] {
        let config = SolverConfig::default().with_node_selection(order);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{:?}", order)), &config, |b, config| {
            b.iter(|| {
                for model in &models {
                    black_box(solve(black_box(model), config).ok());
                }
            });
        });
    }
    group.finish();
}

fn benchmark_mir_cuts(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let mut model = random_knapsack(&mut rng, 12);
    model.use_mir_cuts = true;
    let config = SolverConfig::default();

    c.bench_function("knapsack_12_mir", |b| {
        b.iter(|| solve(black_box(&model), &config).ok());
    });
}

criterion_group!(benches, benchmark_node_selection, benchmark_mir_cuts);
criterion_main!(benches);
