//! The innovation registry. It hands out stable ids for nodes and connections so that structure
//! evolved independently by two genotypes is recognised as the same structure.

use crate::{
    error::{NeatError, Result},
    genotype::{Innovation, InnovationId, Node, NodeId, NodeKind},
};
use fxhash::FxHashMap;
use log::debug;
use parking_lot::{Mutex, MutexGuard};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::Arc};

/// The id of the bias node in every registry
pub const BIAS: NodeId = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RegistryTables", into = "RegistryTables")]
pub struct Registry {
    run: u64,
    nodes: Vec<Node>,
    innovations: Vec<Innovation>,
    paths: FxHashMap<(NodeId, NodeId), InnovationId>,
    splits: FxHashMap<InnovationId, NodeId>,
}

/// What is persisted of a registry. The lookup indexes are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct RegistryTables {
    run: u64,
    nodes: Vec<Node>,
    innovations: Vec<Innovation>,
}

impl From<Registry> for RegistryTables {
    fn from(registry: Registry) -> Self {
        Self {
            run: registry.run,
            nodes: registry.nodes,
            innovations: registry.innovations,
        }
    }
}

impl TryFrom<RegistryTables> for Registry {
    type Error = NeatError;

    fn try_from(tables: RegistryTables) -> Result<Self> {
        if tables.nodes.first().map(|n| n.kind) != Some(NodeKind::Bias) {
            return Err(NeatError::InvalidTopology(
                "the first registered node must be the bias".into(),
            ));
        }

        let mut registry = Self {
            run: tables.run,
            nodes: Vec::with_capacity(tables.nodes.len()),
            innovations: Vec::with_capacity(tables.innovations.len()),
            paths: FxHashMap::default(),
            splits: FxHashMap::default(),
        };

        for (idx, node) in tables.nodes.into_iter().enumerate() {
            if node.id != idx || (idx != BIAS && node.kind == NodeKind::Bias) {
                return Err(NeatError::InvalidTopology(format!(
                    "node record {} is out of place at {idx}",
                    node.id
                )));
            }
            if let Some(origin) = node.origin {
                if let Some(prior) = registry.splits.insert(origin, node.id) {
                    return Err(NeatError::InvalidTopology(format!(
                        "nodes {prior} and {} both split innovation {origin}",
                        node.id
                    )));
                }
            }
            registry.nodes.push(node);
        }

        for (idx, inno) in tables.innovations.into_iter().enumerate() {
            if inno.id != idx || inno.source == inno.target {
                return Err(NeatError::InvalidTopology(format!(
                    "innovation record {} is out of place at {idx}",
                    inno.id
                )));
            }
            registry.check_node(inno.source)?;
            registry.check_node(inno.target)?;
            if let Some(prior) = registry.paths.insert(inno.path(), inno.id) {
                return Err(NeatError::InvalidTopology(format!(
                    "innovations {prior} and {} both connect {} -> {}",
                    inno.id, inno.source, inno.target
                )));
            }
            registry.innovations.push(inno);
        }

        if let Some((inno, _)) = registry
            .splits
            .iter()
            .find(|(inno, _)| **inno >= registry.innovations.len())
        {
            return Err(NeatError::InvalidTopology(format!(
                "a node was split from unknown innovation {inno}"
            )));
        }

        Ok(registry)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry for a fresh run, holding only the bias node
    pub fn new() -> Self {
        Self::with_run(rand::rng().next_u64())
    }

    pub fn with_run(run: u64) -> Self {
        Self {
            run,
            nodes: vec![Node::founder(BIAS, NodeKind::Bias)],
            innovations: Vec::new(),
            paths: FxHashMap::default(),
            splits: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn run_id(&self) -> u64 {
        self.run
    }

    #[inline]
    pub fn bias(&self) -> NodeId {
        BIAS
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn innovation_count(&self) -> usize {
        self.innovations.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn innovations(&self) -> &[Innovation] {
        &self.innovations
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id < self.nodes.len() {
            Ok(())
        } else {
            Err(NeatError::InvalidTopology(format!("node {id} is not registered")))
        }
    }

    /// A founder node. The bias is a singleton, so asking for it returns the existing node.
    /// Hidden nodes only come from splitting a connection.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        match kind {
            NodeKind::Bias => Ok(BIAS),
            NodeKind::Input | NodeKind::Output => {
                let id = self.nodes.len();
                self.nodes.push(Node::founder(id, kind));
                debug!("run {}: new {kind:?} node {id}", self.run);
                Ok(id)
            }
            NodeKind::Hidden => Err(NeatError::TypeMismatch(
                "hidden nodes are created by splitting a connection".into(),
            )),
        }
    }

    /// The innovation of the directed edge `source -> target`, allocated on first sight
    pub fn register_connection(&mut self, source: NodeId, target: NodeId) -> Result<InnovationId> {
        if source == target {
            return Err(NeatError::InvalidTopology(format!(
                "connection from node {source} to itself"
            )));
        }
        self.check_node(source)?;
        self.check_node(target)?;

        if let Some(id) = self.paths.get(&(source, target)) {
            return Ok(*id);
        }

        let id = self.innovations.len();
        self.innovations.push(Innovation { id, source, target });
        self.paths.insert((source, target), id);
        debug!("run {}: innovation {id} is {source} -> {target}", self.run);
        Ok(id)
    }

    /// The hidden node created by splitting `innovation`. Every genotype splitting the same
    /// innovation receives the same node.
    pub fn register_split(&mut self, innovation: InnovationId) -> Result<NodeId> {
        if innovation >= self.innovations.len() {
            return Err(NeatError::InvalidTopology(format!(
                "innovation {innovation} is not registered"
            )));
        }

        if let Some(id) = self.splits.get(&innovation) {
            return Ok(*id);
        }

        let id = self.nodes.len();
        self.nodes.push(Node::split(id, innovation));
        self.splits.insert(innovation, id);
        debug!("run {}: innovation {innovation} split by node {id}", self.run);
        Ok(id)
    }

    pub fn lookup_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or(NeatError::NotFound { entity: "node", id })
    }

    pub fn lookup_innovation(&self, id: InnovationId) -> Result<&Innovation> {
        self.innovations.get(id).ok_or(NeatError::NotFound {
            entity: "innovation",
            id,
        })
    }

    /// The innovation of an already known edge
    pub fn lookup_path(&self, source: NodeId, target: NodeId) -> Option<InnovationId> {
        self.paths.get(&(source, target)).copied()
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

/// A registry handle for callers that drive operators from several threads at once, such as
/// growing genotypes in parallel outside of a [Run](crate::scenario::Run), which owns its registry
/// outright. Every registration goes through one lock, so two threads splitting the same
/// innovation observe the same node.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<Mutex<Registry>>);

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self(Arc::new(Mutex::new(registry)))
    }

    /// Exclusive access, for operators that register several entries in one pass
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.lock()
    }

    pub fn register_connection(&self, source: NodeId, target: NodeId) -> Result<InnovationId> {
        self.0.lock().register_connection(source, target)
    }

    pub fn register_split(&self, innovation: InnovationId) -> Result<NodeId> {
        self.0.lock().register_split(innovation)
    }

    pub fn create_node(&self, kind: NodeKind) -> Result<NodeId> {
        self.0.lock().create_node(kind)
    }

    pub fn run_id(&self) -> u64 {
        self.0.lock().run_id()
    }
}
