//! Walk strategies: the four capabilities the evaluator is parameterized by.
//!
//! - [`Forward`] serves on-demand queries over an unconstrained graph that
//!   may contain revisits and cycles. It starts at the first node of a path
//!   and follows outbound edges, but only those whose antecedent list holds
//!   the edge that led to the current node. That selects one walk instance
//!   instead of every path through a shared node.
//! - [`Backward`] serves incremental booking over a DAG-shaped graph. It
//!   starts at the node just touched and follows inbound edges back towards
//!   the root, prepending names so the rendered path still reads root-first.
//!
//! The evaluator is generic over [`Walk`], so the strategy is fixed per
//! call site and dispatched statically.

use crate::graph::{NavGraph, NODE_PATH_SEPARATOR, ROOT_NODE_NAME};
use crate::id::{EdgeId, NodeId, OwnerId};

/// Traversal capabilities used by [`Evaluator`](crate::evaluate::Evaluator).
pub trait Walk: Sync {
    /// Whether evaluation must be seeded with the edge that led to the
    /// start node.
    const NEEDS_ANTECEDENT: bool;

    /// Returns `true` when no owner-consistent edge continues the walk past
    /// `node`, given that it was reached through `via`.
    fn is_boundary(&self, graph: &NavGraph, node: NodeId, via: Option<EdgeId>, owner: OwnerId) -> bool;

    /// Adds `name` to the path rendered so far.
    fn extend_path(&self, path: &str, name: &str) -> String;

    /// Edges to branch over from `node`.
    fn next_edges(&self, graph: &NavGraph, node: NodeId, via: Option<EdgeId>, owner: OwnerId) -> Vec<EdgeId>;

    /// The node reached by following `edge`.
    fn next_node(&self, graph: &NavGraph, edge: EdgeId) -> Option<NodeId>;
}

/// Root-first traversal along outbound edges of one walk instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

/// Traversal from the most recent node back to the root along inbound edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backward;

impl Forward {
    fn continuations<'g>(
        graph: &'g NavGraph,
        node: NodeId,
        via: Option<EdgeId>,
        owner: OwnerId,
    ) -> impl Iterator<Item = EdgeId> + 'g {
        graph
            .outbound_of(node, owner)
            .filter(move |&id| via.is_some_and(|via| graph.edge_at(id).has_pre_edge(via)))
    }
}

impl Walk for Forward {
    const NEEDS_ANTECEDENT: bool = true;

    fn is_boundary(&self, graph: &NavGraph, node: NodeId, via: Option<EdgeId>, owner: OwnerId) -> bool {
        Self::continuations(graph, node, via, owner).next().is_none()
    }

    fn extend_path(&self, path: &str, name: &str) -> String {
        if path.is_empty() || path == ROOT_NODE_NAME {
            format!("{path}{name}")
        } else {
            format!("{path}{NODE_PATH_SEPARATOR}{name}")
        }
    }

    fn next_edges(&self, graph: &NavGraph, node: NodeId, via: Option<EdgeId>, owner: OwnerId) -> Vec<EdgeId> {
        Self::continuations(graph, node, via, owner).collect()
    }

    fn next_node(&self, graph: &NavGraph, edge: EdgeId) -> Option<NodeId> {
        graph.edge(edge).map(|e| e.target())
    }
}

impl Backward {
    fn predecessors<'g>(
        graph: &'g NavGraph,
        node: NodeId,
        owner: OwnerId,
    ) -> impl Iterator<Item = EdgeId> + 'g {
        graph
            .inbound_of(node, owner)
            .filter(move |&id| !graph.edge_at(id).is_entry())
    }
}

impl Walk for Backward {
    const NEEDS_ANTECEDENT: bool = false;

    fn is_boundary(&self, graph: &NavGraph, node: NodeId, _via: Option<EdgeId>, owner: OwnerId) -> bool {
        Self::predecessors(graph, node, owner).next().is_none()
    }

    fn extend_path(&self, path: &str, name: &str) -> String {
        if path.is_empty() || name == ROOT_NODE_NAME {
            format!("{name}{path}")
        } else {
            format!("{name}{NODE_PATH_SEPARATOR}{path}")
        }
    }

    fn next_edges(&self, graph: &NavGraph, node: NodeId, _via: Option<EdgeId>, owner: OwnerId) -> Vec<EdgeId> {
        Self::predecessors(graph, node, owner).collect()
    }

    fn next_node(&self, graph: &NavGraph, edge: EdgeId) -> Option<NodeId> {
        graph.edge(edge).and_then(|e| e.source())
    }
}
