//! Sexual reproduction by aligning the connection genes of two parents on their innovations.

use crate::{
    error::Result,
    genotype::{ConnectionGene, ConnectionSpec, Genotype, GenotypeSpec, NodeKind},
    random::coin,
};
use core::cmp::Ordering;
use rand::Rng;
use std::collections::BTreeSet;

/// One step of an outer join over two innovation-sorted gene lists
#[derive(Debug)]
enum Aligned<'a> {
    Shared(&'a ConnectionGene, &'a ConnectionGene),
    Disjoint(&'a ConnectionGene),
}

fn align<'a>(l: &'a [ConnectionGene], r: &'a [ConnectionGene]) -> Vec<Aligned<'a>> {
    let mut aligned = Vec::with_capacity(l.len().max(r.len()));
    let (mut li, mut ri) = (0, 0);
    loop {
        match (l.get(li), r.get(ri)) {
            (Some(lg), Some(rg)) => match lg.innovation.cmp(&rg.innovation) {
                Ordering::Equal => {
                    aligned.push(Aligned::Shared(lg, rg));
                    li += 1;
                    ri += 1;
                }
                Ordering::Less => {
                    aligned.push(Aligned::Disjoint(lg));
                    li += 1;
                }
                Ordering::Greater => {
                    aligned.push(Aligned::Disjoint(rg));
                    ri += 1;
                }
            },
            (Some(lg), None) => {
                aligned.push(Aligned::Disjoint(lg));
                li += 1;
            }
            (None, Some(rg)) => {
                aligned.push(Aligned::Disjoint(rg));
                ri += 1;
            }
            (None, None) => break aligned,
        }
    }
}

/// Describe a child of `a` and `b`. Shared innovations are always inherited, each taking the
/// weight and enabled flag of a parent picked by coin flip. Innovations held by only one parent
/// are inherited with probability 0.5 regardless of either parent's score.
///
/// The child keeps the bias, every input and output node of either parent, and every node an
/// inherited gene touches.
pub fn crossover(a: &Genotype, b: &Genotype, rng: &mut impl Rng) -> Result<GenotypeSpec> {
    a.same_run(b)?;

    let mut connections = Vec::new();
    for step in align(a.connections(), b.connections()) {
        match step {
            Aligned::Shared(l, r) => {
                let from = if coin(rng) { l } else { r };
                connections.push(from.describe());
            }
            Aligned::Disjoint(gene) => {
                if coin(rng) {
                    connections.push(gene.describe());
                }
            }
        }
    }

    let mut nodes = BTreeSet::new();
    for parent in [a, b] {
        nodes.extend(parent.nodes().iter().filter_map(|(id, kind)| {
            matches!(kind, NodeKind::Bias | NodeKind::Input | NodeKind::Output).then_some(*id)
        }));
    }
    nodes.extend(connections.iter().flat_map(|c: &ConnectionSpec| [c.source, c.target]));

    Ok(GenotypeSpec {
        nodes,
        connections,
        parents: [a.id(), b.id()].into(),
    })
}
