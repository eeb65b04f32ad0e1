use super::{node::NodeId, spec::ConnectionSpec};
use crate::serialize::{deserialize_f64_bits, serialize_f64_bits};
use serde::{Deserialize, Serialize};

pub type InnovationId = usize;

/// The historical record of a directed edge. Every genotype carrying the edge `source -> target`
/// refers to the same innovation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Innovation {
    pub id: InnovationId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Innovation {
    #[inline]
    pub fn path(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }
}

/// A connection as carried by one genotype. Endpoints are copied from the innovation so that
/// evaluation never needs the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub innovation: InnovationId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(
        serialize_with = "serialize_f64_bits",
        deserialize_with = "deserialize_f64_bits"
    )]
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    pub fn new(innovation: &Innovation, weight: f64, enabled: bool) -> Self {
        Self {
            innovation: innovation.id,
            source: innovation.source,
            target: innovation.target,
            weight,
            enabled,
        }
    }

    #[inline]
    pub fn path(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    pub fn describe(&self) -> ConnectionSpec {
        ConnectionSpec {
            innovation: Some(self.innovation),
            source: self.source,
            target: self.target,
            weight: self.weight,
            enabled: self.enabled,
        }
    }
}
