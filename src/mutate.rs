//! The mutation operator. Every connection gene receives at most one of four outcomes, decided by
//! a single uniform draw against cumulative rate thresholds.

use crate::{
    config::MutationRates,
    constants::LINEAGE_NEW_WEIGHT_BOUND,
    error::{NeatError, Result},
    genotype::{ConnectionGene, ConnectionSpec, Genotype, GenotypeSpec, NodeId, NodeKind},
    random::{Breakdown, MutationKind},
    registry::Registry,
};
use fxhash::FxHashSet;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// A connection whose innovation is resolved immediately, so later steps of the same pass see it
fn resolved(
    registry: &mut Registry,
    source: NodeId,
    target: NodeId,
    weight: f64,
    enabled: bool,
) -> Result<ConnectionSpec> {
    Ok(ConnectionSpec {
        innovation: Some(registry.register_connection(source, target)?),
        source,
        target,
        weight,
        enabled,
    })
}

/// Describe a mutated child of `genotype`. The genotype itself is left untouched; new structure
/// is registered through `registry` so that it is shared with the rest of the run.
pub fn mutate(
    genotype: &Genotype,
    rates: &MutationRates,
    registry: &mut Registry,
    rng: &mut impl Rng,
) -> Result<GenotypeSpec> {
    if genotype.run() != registry.run_id() {
        return Err(NeatError::CrossRunMismatch {
            left: genotype.run(),
            right: registry.run_id(),
        });
    }

    let breakdown = Breakdown::mutation(rates);
    let perturb = Uniform::new_inclusive(-rates.weight_std, rates.weight_std).map_err(|e| {
        NeatError::InvalidConfig(format!("weight_std {}: {e}", rates.weight_std))
    })?;
    let bias = registry.bias();

    let mut nodes = genotype.nodes().clone();
    let mut connections = genotype
        .connections()
        .iter()
        .map(ConnectionGene::describe)
        .collect::<Vec<_>>();
    let mut grown = Vec::new();
    let mut deferred = 0;

    for (gene, child) in genotype.connections().iter().zip(connections.iter_mut()) {
        match breakdown.happens(rng) {
            Some(MutationKind::Weight) => child.weight += perturb.sample(rng),
            Some(MutationKind::Switch) => child.enabled = !child.enabled,
            Some(MutationKind::Add) => deferred += 1,
            Some(MutationKind::Split) => {
                let node = registry.register_split(gene.innovation)?;
                if nodes.contains_key(&node) {
                    continue;
                }

                let (weight, enabled) = (child.weight, child.enabled);
                child.enabled = false;
                nodes.insert(node, NodeKind::Hidden);

                grown.push(resolved(registry, gene.source, node, 1., true)?);
                // a split bias gene already feeds the new node from the bias
                if gene.source != bias {
                    grown.push(resolved(registry, bias, node, 0., true)?);
                }
                grown.push(resolved(registry, node, gene.target, weight, enabled)?);
            }
            None => (),
        }
    }
    connections.extend(grown);

    if deferred > 0 {
        let present = connections
            .iter()
            .map(ConnectionSpec::path)
            .collect::<FxHashSet<_>>();
        let sources = nodes
            .iter()
            .filter_map(|(id, kind)| kind.is_source().then_some(*id));
        let targets = nodes
            .iter()
            .filter_map(|(id, kind)| kind.is_target().then_some(*id))
            .collect::<Vec<_>>();

        let mut candidates = Vec::with_capacity(deferred);
        'scan: for source in sources {
            for target in targets.iter().copied() {
                if candidates.len() == deferred {
                    break 'scan;
                }
                if source != target && !present.contains(&(source, target)) {
                    candidates.push((source, target));
                }
            }
        }

        for (source, target) in candidates {
            let weight = rng.random_range(-LINEAGE_NEW_WEIGHT_BOUND..=LINEAGE_NEW_WEIGHT_BOUND);
            connections.push(resolved(registry, source, target, weight, true)?);
        }
    }

    Ok(GenotypeSpec {
        nodes: nodes.into_keys().collect(),
        connections,
        parents: [genotype.id()].into(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{genotype::test::registry_io, random::WyRng};
    use rand::SeedableRng;

    fn rates(split: f64, weight: f64, switch: f64, add: f64) -> MutationRates {
        MutationRates {
            split,
            weight,
            switch,
            add,
            weight_std: 0.1,
        }
    }

    /// every input wired to every output, plus the bias wired to every output
    fn dense(registry: &mut Registry, id: usize, inputs: &[NodeId], outputs: &[NodeId]) -> Genotype {
        let bias = registry.bias();
        let connections = inputs
            .iter()
            .chain([bias].iter())
            .flat_map(|s| {
                outputs
                    .iter()
                    .enumerate()
                    .map(move |(k, t)| ConnectionSpec::new(*s, *t, 0.25 * k as f64, true))
            })
            .collect::<Vec<_>>();
        let spec = GenotypeSpec::new(inputs.iter().chain(outputs).copied(), connections);
        Genotype::from_spec(id, &spec, registry).unwrap()
    }

    #[test]
    fn test_switch_determinism() {
        let (mut r, i, o) = registry_io(3, 2);
        let g = dense(&mut r, 0, &i, &o);
        let p = 0.4;

        for seed in 0..16 {
            let mut rng = WyRng::seed_from_u64(seed);
            let mut replay = rng.clone();
            let child = mutate(&g, &rates(0., 0., p, 0.), &mut r, &mut rng).unwrap();

            assert_eq!(child.connections.len(), g.connections().len());
            assert_eq!(child.nodes, g.describe().nodes);
            for (before, after) in g.connections().iter().zip(child.connections.iter()) {
                let toggled = replay.random::<f64>() < p;
                assert_eq!(before.enabled != after.enabled, toggled);
                assert_eq!(before.weight, after.weight);
                assert_eq!(Some(before.innovation), after.innovation);
            }
        }
    }

    #[test]
    fn test_nothing_happens() {
        let (mut r, i, o) = registry_io(2, 2);
        let g = dense(&mut r, 4, &i, &o);
        let child = mutate(&g, &rates(0., 0., 0., 0.), &mut r, &mut WyRng::seeded(1)).unwrap();
        assert_eq!(child.connections, g.describe().connections);
        assert_eq!(child.parents, std::collections::BTreeSet::from([4]));
    }

    #[test]
    fn test_weight_perturbation_bounded() {
        let (mut r, i, o) = registry_io(4, 3);
        let g = dense(&mut r, 0, &i, &o);
        let child = mutate(&g, &rates(0., 1., 0., 0.), &mut r, &mut WyRng::seeded(2)).unwrap();

        let mut moved = 0;
        for (before, after) in g.connections().iter().zip(child.connections.iter()) {
            assert!((before.weight - after.weight).abs() <= 0.1 + 1e-12);
            assert_eq!(before.enabled, after.enabled);
            moved += (before.weight != after.weight) as usize;
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_split_shape() {
        let (mut r, i, o) = registry_io(1, 1);
        let spec = GenotypeSpec::new([i[0], o[0]], [ConnectionSpec::new(i[0], o[0], 0.7, true)]);
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let child = mutate(&g, &rates(1., 0., 0., 0.), &mut r, &mut WyRng::seeded(3)).unwrap();

        let hidden = r.register_split(g.connections()[0].innovation).unwrap();
        assert!(child.nodes.contains(&hidden));
        assert_eq!(child.connections.len(), 4);
        assert!(!child.connections[0].enabled);

        let paths = child
            .connections
            .iter()
            .map(|c| (c.path(), c.weight, c.enabled))
            .collect::<Vec<_>>();
        assert!(paths.contains(&((i[0], hidden), 1., true)));
        assert!(paths.contains(&((r.bias(), hidden), 0., true)));
        assert!(paths.contains(&((hidden, o[0]), 0.7, true)));

        let built = Genotype::from_spec(1, &child, &mut r).unwrap();
        assert_eq!(built.nodes()[&hidden], NodeKind::Hidden);
    }

    #[test]
    fn test_split_keeps_disabled_flag() {
        let (mut r, i, o) = registry_io(1, 1);
        let spec = GenotypeSpec::new([i[0], o[0]], [ConnectionSpec::new(i[0], o[0], -2., false)]);
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let child = mutate(&g, &rates(1., 0., 0., 0.), &mut r, &mut WyRng::seeded(3)).unwrap();

        let last = child.connections.last().unwrap();
        assert_eq!(last.target, o[0]);
        assert_eq!(last.weight, -2.);
        assert!(!last.enabled);
    }

    #[test]
    fn test_split_idempotent_across_genotypes() {
        let (mut r, i, o) = registry_io(2, 1);
        let a = dense(&mut r, 0, &i, &o);
        let b = dense(&mut r, 1, &i, &o);
        let all = rates(1., 0., 0., 0.);

        let ca = mutate(&a, &all, &mut r, &mut WyRng::seeded(5)).unwrap();
        let nodes_after_a = r.node_count();
        let cb = mutate(&b, &all, &mut r, &mut WyRng::seeded(6)).unwrap();

        assert_eq!(r.node_count(), nodes_after_a);
        assert_eq!(ca.nodes, cb.nodes);
        let inno = |s: &GenotypeSpec| s.connections.iter().map(|c| c.innovation).collect::<Vec<_>>();
        assert_eq!(inno(&ca), inno(&cb));
    }

    #[test]
    fn test_split_guard() {
        let (mut r, i, o) = registry_io(1, 1);
        let inno = r.register_connection(i[0], o[0]).unwrap();
        let hidden = r.register_split(inno).unwrap();

        // the node this gene would split into is already present
        let spec = GenotypeSpec::new(
            [i[0], o[0], hidden],
            [ConnectionSpec::new(i[0], o[0], 0.7, true)],
        );
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let child = mutate(&g, &rates(1., 0., 0., 0.), &mut r, &mut WyRng::seeded(8)).unwrap();

        assert_eq!(child.connections, g.describe().connections);
        assert_eq!(child.nodes, g.describe().nodes);
    }

    #[test]
    fn test_split_bias_gene() {
        let (mut r, _, o) = registry_io(0, 1);
        let spec = GenotypeSpec::new([o[0]], [ConnectionSpec::new(r.bias(), o[0], 0.3, true)]);
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let child = mutate(&g, &rates(1., 0., 0., 0.), &mut r, &mut WyRng::seeded(9)).unwrap();

        assert_eq!(child.connections.len(), 3);
        assert!(Genotype::from_spec(1, &child, &mut r).is_ok());
    }

    #[test]
    fn test_add_order() {
        let (mut r, i, o) = registry_io(2, 1);
        let spec = GenotypeSpec::new(
            [i[0], i[1], o[0]],
            [ConnectionSpec::new(i[0], o[0], 0.5, true)],
        );
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let child = mutate(&g, &rates(0., 0., 0., 1.), &mut r, &mut WyRng::seeded(10)).unwrap();

        assert_eq!(child.connections.len(), 2);
        let added = &child.connections[1];
        assert_eq!(added.path(), (i[1], o[0]));
        assert!(added.enabled);
        assert!((-1. ..=1.).contains(&added.weight));
        assert_eq!(added.innovation, r.lookup_path(i[1], o[0]));
    }

    #[test]
    fn test_add_exhausts_candidates() {
        let (mut r, i, o) = registry_io(2, 2);
        let g = dense(&mut r, 0, &i, &o);
        let child = mutate(&g, &rates(0., 0., 0., 1.), &mut r, &mut WyRng::seeded(11)).unwrap();
        // inputs cannot feed inputs and the bias is never a source, so nothing is left
        assert_eq!(child.connections, g.describe().connections);
    }

    #[test]
    fn test_run_mismatch() {
        let (mut r, i, o) = registry_io(1, 1);
        let g = dense(&mut r, 0, &i, &o);
        let mut other = Registry::with_run(9);
        assert!(matches!(
            mutate(&g, &rates(0., 0., 0., 0.), &mut other, &mut WyRng::seeded(0)),
            Err(NeatError::CrossRunMismatch { left: 1, right: 9 })
        ));
    }
}
