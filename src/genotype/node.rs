use serde::{Deserialize, Serialize};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Bias,
    Input,
    Hidden,
    Output,
}

impl NodeKind {
    /// whether the node may start a connection created by mutation
    pub fn is_source(&self) -> bool {
        match self {
            Self::Input | Self::Hidden => true,
            Self::Bias | Self::Output => false,
        }
    }

    /// whether the node may end a connection created by mutation
    pub fn is_target(&self) -> bool {
        match self {
            Self::Hidden | Self::Output => true,
            Self::Bias | Self::Input => false,
        }
    }
}

/// A node record. Founder nodes have no origin, hidden nodes remember the innovation whose split
/// created them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub origin: Option<usize>,
}

impl Node {
    pub fn founder(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            origin: None,
        }
    }

    pub fn split(id: NodeId, innovation: usize) -> Self {
        Self {
            id,
            kind: NodeKind::Hidden,
            origin: Some(innovation),
        }
    }
}
