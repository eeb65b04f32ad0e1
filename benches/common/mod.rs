#![allow(dead_code)]

use lineage::{
    config::MutationRates,
    genotype::{Genotype, NodeId, NodeKind},
    mutate::mutate,
    population::founder_spec,
    random::WyRng,
    Registry,
};

pub fn registry(inputs: usize, outputs: usize) -> (Registry, Vec<NodeId>, Vec<NodeId>) {
    let mut r = Registry::with_run(0);
    let i = (0..inputs)
        .map(|_| r.create_node(NodeKind::Input).unwrap())
        .collect();
    let o = (0..outputs)
        .map(|_| r.create_node(NodeKind::Output).unwrap())
        .collect();
    (r, i, o)
}

/// A founder put through `rounds` aggressive mutation passes
pub fn grown(
    registry: &mut Registry,
    inputs: &[NodeId],
    outputs: &[NodeId],
    id: usize,
    rounds: usize,
    rng: &mut WyRng,
) -> Genotype {
    let rates = MutationRates {
        split: 0.1,
        weight: 0.3,
        switch: 0.05,
        add: 0.3,
        weight_std: 0.1,
    };
    let founder = founder_spec(registry.bias(), inputs, outputs, rng);
    let mut genotype = Genotype::from_spec(id, &founder, registry).unwrap();
    for _ in 0..rounds {
        let spec = mutate(&genotype, &rates, registry, rng).unwrap();
        genotype = Genotype::from_spec(id, &spec, registry).unwrap();
    }
    genotype
}

pub fn criterion() -> criterion::Criterion {
    #[cfg(not(feature = "smol_bench"))]
    let criterion = criterion::Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let criterion = {
        use core::time::Duration;
        criterion::Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    criterion
}
