//! The plain description of a genotype. This is what operators produce and what a repository
//! stores; [super::Genotype::from_spec] turns it back into a validated genotype.

use super::{connection::InnovationId, node::NodeId, GenotypeId};
use crate::{
    error::Result,
    serialize::{deserialize_f64_bits, serialize_f64_bits},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// `None` for a connection whose innovation should be looked up, or registered, from its
    /// endpoints when the genotype is built
    pub innovation: Option<InnovationId>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(
        serialize_with = "serialize_f64_bits",
        deserialize_with = "deserialize_f64_bits"
    )]
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionSpec {
    /// A connection between two nodes, innovation resolved later
    pub fn new(source: NodeId, target: NodeId, weight: f64, enabled: bool) -> Self {
        Self {
            innovation: None,
            source,
            target,
            weight,
            enabled,
        }
    }

    #[inline]
    pub fn path(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenotypeSpec {
    pub nodes: BTreeSet<NodeId>,
    pub connections: Vec<ConnectionSpec>,
    pub parents: BTreeSet<GenotypeId>,
}

impl GenotypeSpec {
    pub fn new(
        nodes: impl IntoIterator<Item = NodeId>,
        connections: impl IntoIterator<Item = ConnectionSpec>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            connections: connections.into_iter().collect(),
            parents: BTreeSet::new(),
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = GenotypeId>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_string_roundtrip_is_exact() {
        let spec = GenotypeSpec::new(
            [0, 1, 2],
            [
                ConnectionSpec {
                    innovation: Some(0),
                    source: 1,
                    target: 2,
                    weight: 0.1 + 0.2,
                    enabled: true,
                },
                ConnectionSpec::new(0, 2, -1. / 3., false),
            ],
        )
        .with_parents([4, 9]);

        let s = spec.to_string().unwrap();
        let back = GenotypeSpec::from_str(&s).unwrap();
        assert_eq!(spec, back);
        assert_eq!(s, back.to_string().unwrap());
    }
}
