pub mod connection;
pub mod node;
pub mod spec;

pub use connection::{ConnectionGene, Innovation, InnovationId};
pub use node::{Node, NodeId, NodeKind};
pub use spec::{ConnectionSpec, GenotypeSpec};

use crate::{
    error::{NeatError, Result},
    registry::Registry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type GenotypeId = usize;

/// An immutable network description: which registry nodes it holds, and which connection genes
/// join them. Operators never change a genotype, they describe a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    id: GenotypeId,
    run: u64,
    nodes: BTreeMap<NodeId, NodeKind>,
    connections: Vec<ConnectionGene>,
    parents: BTreeSet<GenotypeId>,
}

impl Genotype {
    /// Build and validate a genotype from its description. Connections without an innovation are
    /// registered from their endpoints. The bias node is always part of the result.
    pub fn from_spec(id: GenotypeId, spec: &GenotypeSpec, registry: &mut Registry) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        nodes.insert(registry.bias(), NodeKind::Bias);
        for node in spec.nodes.iter() {
            let kind = registry
                .lookup_node(*node)
                .map_err(|_| {
                    NeatError::InvalidTopology(format!("genotype {id} holds unknown node {node}"))
                })?
                .kind;
            nodes.insert(*node, kind);
        }

        let mut connections = Vec::with_capacity(spec.connections.len());
        for c in spec.connections.iter() {
            for end in [c.source, c.target] {
                if !nodes.contains_key(&end) {
                    return Err(NeatError::InvalidTopology(format!(
                        "genotype {id} connects {} -> {} outside of its nodes",
                        c.source, c.target
                    )));
                }
            }

            let innovation = match c.innovation {
                Some(inno) => {
                    let known = registry.lookup_innovation(inno)?;
                    if known.path() != c.path() {
                        return Err(NeatError::InvalidTopology(format!(
                            "innovation {inno} is {:?}, not {:?}",
                            known.path(),
                            c.path()
                        )));
                    }
                    *known
                }
                None => {
                    let inno = registry.register_connection(c.source, c.target)?;
                    *registry.lookup_innovation(inno)?
                }
            };
            connections.push(ConnectionGene::new(&innovation, c.weight, c.enabled));
        }

        connections.sort_by_key(|c| c.innovation);
        if let Some(pair) = connections
            .windows(2)
            .find(|pair| pair[0].innovation == pair[1].innovation)
        {
            return Err(NeatError::InvalidTopology(format!(
                "genotype {id} carries innovation {} twice",
                pair[0].innovation
            )));
        }

        Ok(Self {
            id,
            run: registry.run_id(),
            nodes,
            connections,
            parents: spec.parents.clone(),
        })
    }

    /// The canonical description of this genotype
    pub fn describe(&self) -> GenotypeSpec {
        GenotypeSpec {
            nodes: self.nodes.keys().copied().collect(),
            connections: self.connections.iter().map(|c| c.describe()).collect(),
            parents: self.parents.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> GenotypeId {
        self.id
    }

    #[inline]
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, NodeKind> {
        &self.nodes
    }

    /// Connection genes, ascending by innovation
    pub fn connections(&self) -> &[ConnectionGene] {
        &self.connections
    }

    pub fn parents(&self) -> &BTreeSet<GenotypeId> {
        &self.parents
    }

    pub fn innovations(&self) -> impl Iterator<Item = InnovationId> + '_ {
        self.connections.iter().map(|c| c.innovation)
    }

    pub fn gene(&self, innovation: InnovationId) -> Option<&ConnectionGene> {
        self.connections
            .binary_search_by_key(&innovation, |c| c.innovation)
            .ok()
            .map(|idx| &self.connections[idx])
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Node ids of one kind, ascending
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter_map(move |(id, k)| (*k == kind).then_some(*id))
    }

    pub fn bias(&self) -> Option<NodeId> {
        self.nodes_of(NodeKind::Bias).next()
    }

    pub fn inputs(&self) -> Vec<NodeId> {
        self.nodes_of(NodeKind::Input).collect()
    }

    pub fn outputs(&self) -> Vec<NodeId> {
        self.nodes_of(NodeKind::Output).collect()
    }

    /// Similarity of node and innovation sets, 1 for identical sets and 0 for disjoint ones.
    /// Symmetric in its arguments.
    pub fn compatibility(&self, other: &Self) -> f64 {
        let shared_nodes = self
            .nodes
            .keys()
            .filter(|n| other.nodes.contains_key(n))
            .count();
        let shared_innos = self.innovations().filter(|i| other.gene(*i).is_some()).count();

        let (ln, rn) = (self.nodes.len(), other.nodes.len());
        let (lc, rc) = (self.connections.len(), other.connections.len());
        let node_total = ln.max(rn);
        let node_diff = ln + rn - 2 * shared_nodes;
        let inno_total = lc.max(rc);
        let inno_diff = lc + rc - 2 * shared_innos;

        let total = node_total + inno_total;
        if total == 0 {
            return 1.;
        }
        // heavily disjoint pairs would score below zero
        ((total as f64 - node_diff as f64 - inno_diff as f64) / total as f64).max(0.)
    }

    /// Fails unless both genotypes were built against the same registry
    pub fn same_run(&self, other: &Self) -> Result<()> {
        if self.run == other.run {
            Ok(())
        } else {
            Err(NeatError::CrossRunMismatch {
                left: self.run,
                right: other.run,
            })
        }
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
