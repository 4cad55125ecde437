//! Owner-tagged edges with walk provenance.
//!
//! An [`Edge`] is identified by `(owner, source, target)`. The source is
//! `None` only for the entry edge into the root sentinel. Walks that pass
//! through the same physical edge from different antecedents share one
//! `Edge` but each add their antecedent to [`Edge::pre_edges`]. This is what
//! keeps `A -> B -> C` apart from `D -> B -> C` during path evaluation.

use smallvec::SmallVec;

use crate::id::{EdgeId, NodeId, OwnerId};

/// A directed, owner-tagged link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    owner: OwnerId,
    source: Option<NodeId>,
    target: NodeId,
    /// Inbound edges of `source` that justify this edge, one per distinct
    /// walk instance. Empty only for root entry edges.
    pre_edges: SmallVec<[EdgeId; 2]>,
}

impl Edge {
    pub(crate) fn new(
        owner: OwnerId,
        source: Option<NodeId>,
        target: NodeId,
        pre_edge: Option<EdgeId>,
    ) -> Self {
        Edge {
            owner,
            source,
            target,
            pre_edges: pre_edge.into_iter().collect(),
        }
    }

    /// The owner whose walk produced this edge.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// The node the walk came from, `None` for a root entry edge.
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// The node the walk moved to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The antecedent edges recorded for this edge.
    pub fn pre_edges(&self) -> &[EdgeId] {
        &self.pre_edges
    }

    /// Returns `true` if `pre_edge` is one of this edge's antecedents.
    pub fn has_pre_edge(&self, pre_edge: EdgeId) -> bool {
        self.pre_edges.contains(&pre_edge)
    }

    /// Returns `true` for the entry edge into the root sentinel.
    pub fn is_entry(&self) -> bool {
        self.source.is_none()
    }

    /// Records another antecedent. Returns `false` if it was already known.
    pub(crate) fn add_pre_edge(&mut self, pre_edge: EdgeId) -> bool {
        if self.has_pre_edge(pre_edge) {
            return false;
        }
        self.pre_edges.push(pre_edge);
        true
    }
}
