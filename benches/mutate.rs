mod common;

use criterion::Criterion;
use lineage::{config::MutationRates, mutate::mutate, random::WyRng};

fn bench_mutate(bench: &mut Criterion) {
    let (mut registry, i, o) = common::registry(8, 4);
    let mut rng = WyRng::seeded(1);
    let genotype = common::grown(&mut registry, &i, &o, 0, 20, &mut rng);

    let defaults = MutationRates::default();
    bench.bench_function("mutate-default", |b| {
        b.iter(|| mutate(&genotype, &defaults, &mut registry, &mut rng).unwrap())
    });

    let split = MutationRates {
        split: 1.,
        weight: 0.,
        switch: 0.,
        add: 0.,
        weight_std: 0.,
    };
    bench.bench_function("mutate-split", |b| {
        b.iter(|| mutate(&genotype, &split, &mut registry, &mut rng).unwrap())
    });

    let add = MutationRates {
        add: 1.,
        split: 0.,
        ..split
    };
    bench.bench_function("mutate-add", |b| {
        b.iter(|| mutate(&genotype, &add, &mut registry, &mut rng).unwrap())
    });
}

pub fn benches() {
    let mut criterion = common::criterion();
    bench_mutate(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
