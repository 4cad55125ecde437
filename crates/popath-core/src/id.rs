//! Arena index newtypes for navigation graph entities.
//!
//! All IDs are distinct newtype wrappers over `u32`, so a `NodeId` cannot be
//! passed where an `EdgeId` is expected. Nodes and edges never reference each
//! other by pointer: every link in the graph is one of these indices into the
//! arenas owned by [`NavGraph`](crate::graph::NavGraph).

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Index of a node in the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Index of an edge in the edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// Interned owner (visitor) identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl OwnerId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between NodeId and petgraph's NodeIndex<u32>, used when an owner's
// walk is projected onto a petgraph DiGraph.

impl From<NodeIndex<u32>> for NodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex<u32> {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}
