//! NavGraph: the arena-backed navigation multigraph.
//!
//! [`NavGraph`] owns every [`Node`] and [`Edge`] in two flat arenas. Nodes
//! and edges refer to each other only through [`NodeId`] / [`EdgeId`], so
//! the mutually referencing structure (nodes list edges, edges name nodes,
//! edges list antecedent edges) has a single owner and no reference cycles.
//!
//! Besides the arenas the graph keeps two indices:
//! - the global name index (`name -> NodeId`), insertion ordered;
//! - the per-owner node list, recording each node the first time an owner
//!   visits it.
//!
//! The graph only grows. Nodes and edges are never removed; only visit
//! counters and antecedent lists change after creation. All mutation goes
//! through [`NavGraph::touch`](crate::builder), this module provides the
//! arena primitives and read-only accessors.

use indexmap::IndexMap;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;

use crate::edge::Edge;
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId, OwnerId};
use crate::node::Node;

/// Name of the synthetic node every walk starts from.
pub const ROOT_NODE_NAME: &str = "/";

/// Separator between node names in a rendered path.
pub const NODE_PATH_SEPARATOR: &str = "/";

/// Path node count used when a query does not name one.
pub const DEFAULT_PATH_DEPTH: usize = 3;

/// Where an owner currently stands: the node it is at and the edge it
/// arrived by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub edge: EdgeId,
}

/// The navigation graph arenas and indices.
#[derive(Debug, Default)]
pub struct NavGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Global name index.
    names: IndexMap<String, NodeId>,
    /// Interned owner names; the map index is the `OwnerId`.
    owners: IndexMap<String, OwnerId>,
    /// Nodes each owner has visited, indexed by `OwnerId`, in first-visit order.
    owner_nodes: Vec<Vec<NodeId>>,
}

impl NavGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Looks up an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Finds a node by name. The name is trimmed before lookup.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name.trim()).copied()
    }

    /// Returns the root sentinel, once some owner has entered the graph.
    pub fn root(&self) -> Option<NodeId> {
        self.find_node(ROOT_NODE_NAME)
    }

    /// Resolves an owner name to its interned ID.
    pub fn owner_id(&self, owner: &str) -> Option<OwnerId> {
        self.owners.get(owner.trim()).copied()
    }

    /// Resolves an interned owner ID back to its name.
    pub fn owner_name(&self, owner: OwnerId) -> Option<&str> {
        self.owners
            .get_index(owner.index())
            .map(|(name, _)| name.as_str())
    }

    /// Iterates over all owners in first-seen order.
    pub fn owners(&self) -> impl Iterator<Item = (&str, OwnerId)> {
        self.owners.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Returns the nodes `owner` has visited, in first-visit order.
    pub fn owner_nodes(&self, owner: OwnerId) -> &[NodeId] {
        self.owner_nodes
            .get(owner.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns how many times `owner` visited `node` (0 if never).
    pub fn visits(&self, node: NodeId, owner: OwnerId) -> u32 {
        self.node(node).map_or(0, |n| n.visits(owner))
    }

    /// Finds the edge identified by `(owner, source, target)`.
    pub fn find_edge(&self, owner: OwnerId, source: Option<NodeId>, target: NodeId) -> Option<EdgeId> {
        self.node(target)?.inbound().iter().copied().find(|&id| {
            let edge = self.edge_at(id);
            edge.owner() == owner && edge.source() == source
        })
    }

    /// Iterates over the inbound edges of `node` that belong to `owner`.
    pub fn inbound_of(&self, node: NodeId, owner: OwnerId) -> impl Iterator<Item = EdgeId> + '_ {
        self.node(node)
            .map(Node::inbound)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&id| self.edge_at(id).owner() == owner)
    }

    /// Iterates over the outbound edges of `node` that belong to `owner`.
    pub fn outbound_of(&self, node: NodeId, owner: OwnerId) -> impl Iterator<Item = EdgeId> + '_ {
        self.node(node)
            .map(Node::outbound)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&id| self.edge_at(id).owner() == owner)
    }

    /// Returns `true` if the edges of `owner` form a directed acyclic graph.
    ///
    /// The owner's sourced edges are projected onto a petgraph `DiGraph`
    /// whose node indices line up with the arena's [`NodeId`]s.
    pub fn is_acyclic(&self, owner: OwnerId) -> bool {
        let mut projection = DiGraph::<NodeId, EdgeId, u32>::with_capacity(
            self.nodes.len(),
            self.edges.len(),
        );
        for index in 0..self.nodes.len() {
            projection.add_node(NodeId(index as u32));
        }
        for (index, edge) in self.edges.iter().enumerate() {
            if edge.owner() != owner {
                continue;
            }
            if let Some(source) = edge.source() {
                projection.add_edge(source.into(), edge.target().into(), EdgeId(index as u32));
            }
        }
        !is_cyclic_directed(&projection)
    }

    /// Checks that `position` names an existing node and an edge of `owner`
    /// leading into it.
    pub fn check_position(&self, position: Position, owner: &str) -> Result<(), CoreError> {
        if self.node(position.node).is_none() {
            return Err(CoreError::NodeNotFound { id: position.node });
        }
        let edge = self
            .edge(position.edge)
            .ok_or(CoreError::EdgeNotFound { id: position.edge })?;
        if edge.target() != position.node {
            return Err(CoreError::DetachedAntecedent {
                node: position.node,
                edge: position.edge,
            });
        }
        if self.owner_id(owner) != Some(edge.owner()) {
            return Err(CoreError::ForeignAntecedent {
                edge: position.edge,
                owner: owner.trim().to_string(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Arena primitives (builder only)
    // -----------------------------------------------------------------------

    /// Indexes into the node arena. Only for IDs handed out by this graph.
    pub(crate) fn node_at(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Indexes into the edge arena. Only for IDs handed out by this graph.
    pub(crate) fn edge_at(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub(crate) fn edge_at_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.index()]
    }

    /// Returns the ID for `owner`, interning it on first sight.
    pub(crate) fn intern_owner(&mut self, owner: &str) -> OwnerId {
        if let Some(id) = self.owners.get(owner) {
            return *id;
        }
        let id = OwnerId(self.owners.len() as u32);
        self.owners.insert(owner.to_string(), id);
        self.owner_nodes.push(Vec::new());
        id
    }

    /// Adds a node first visited by `owner` and indexes it by name.
    pub(crate) fn insert_node(&mut self, name: &str, owner: OwnerId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(name.to_string(), owner));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Adds an edge and links it into both endpoints' edge lists.
    pub(crate) fn insert_edge(
        &mut self,
        owner: OwnerId,
        source: Option<NodeId>,
        target: NodeId,
        pre_edge: Option<EdgeId>,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge::new(owner, source, target, pre_edge));
        self.nodes[target.index()].push_inbound(id);
        if let Some(source) = source {
            self.nodes[source.index()].push_outbound(id);
        }
        id
    }

    /// Records that `owner` visited `node` for the first time.
    pub(crate) fn register_owner_node(&mut self, owner: OwnerId, node: NodeId) {
        self.owner_nodes[owner.index()].push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds `/ -> N1 -> N2` for owner "U1" straight from the arena primitives.
    fn chain() -> (NavGraph, OwnerId, Vec<NodeId>, Vec<EdgeId>) {
        let mut graph = NavGraph::new();
        let owner = graph.intern_owner("U1");
        let root = graph.insert_node(ROOT_NODE_NAME, owner);
        let e0 = graph.insert_edge(owner, None, root, None);
        let n1 = graph.insert_node("N1", owner);
        let e1 = graph.insert_edge(owner, Some(root), n1, Some(e0));
        let n2 = graph.insert_node("N2", owner);
        let e2 = graph.insert_edge(owner, Some(n1), n2, Some(e1));
        for node in [root, n1, n2] {
            graph.register_owner_node(owner, node);
        }
        (graph, owner, vec![root, n1, n2], vec![e0, e1, e2])
    }

    #[test]
    fn empty_graph() {
        let graph = NavGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.root().is_none());
        assert!(graph.owners().next().is_none());
        assert!(graph.owner_nodes(OwnerId(3)).is_empty());
    }

    #[test]
    fn insert_edge_links_both_endpoints() {
        let (graph, owner, nodes, edges) = chain();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);

        let root = graph.node(nodes[0]).unwrap();
        assert_eq!(root.inbound(), &[edges[0]]);
        assert_eq!(root.outbound(), &[edges[1]]);

        let n1 = graph.node(nodes[1]).unwrap();
        assert_eq!(n1.inbound(), &[edges[1]]);
        assert_eq!(n1.outbound(), &[edges[2]]);

        let e2 = graph.edge(edges[2]).unwrap();
        assert_eq!(e2.source(), Some(nodes[1]));
        assert_eq!(e2.target(), nodes[2]);
        assert_eq!(e2.pre_edges(), &[edges[1]]);
        assert_eq!(graph.owner_nodes(owner), nodes.as_slice());
    }

    #[test]
    fn lookups_by_name_and_owner() {
        let (graph, owner, nodes, _) = chain();
        assert_eq!(graph.find_node(" N1 "), Some(nodes[1]));
        assert_eq!(graph.root(), Some(nodes[0]));
        assert_eq!(graph.find_node("N9"), None);
        assert_eq!(graph.owner_id("U1"), Some(owner));
        assert_eq!(graph.owner_name(owner), Some("U1"));
        assert_eq!(graph.owner_id("U2"), None);
        assert_eq!(graph.owner_name(OwnerId(5)), None);
    }

    #[test]
    fn find_edge_matches_owner_and_source() {
        let (mut graph, owner, nodes, edges) = chain();
        assert_eq!(graph.find_edge(owner, Some(nodes[0]), nodes[1]), Some(edges[1]));
        assert_eq!(graph.find_edge(owner, None, nodes[0]), Some(edges[0]));
        assert_eq!(graph.find_edge(owner, Some(nodes[0]), nodes[2]), None);

        let other = graph.intern_owner("U2");
        assert_eq!(graph.find_edge(other, Some(nodes[0]), nodes[1]), None);
    }

    #[test]
    fn owner_filtered_edge_iterators() {
        let (mut graph, owner, nodes, edges) = chain();
        let other = graph.intern_owner("U2");
        let entry = graph.insert_edge(other, None, nodes[0], None);

        let mine: Vec<_> = graph.inbound_of(nodes[0], owner).collect();
        assert_eq!(mine, vec![edges[0]]);
        let theirs: Vec<_> = graph.inbound_of(nodes[0], other).collect();
        assert_eq!(theirs, vec![entry]);
        let out: Vec<_> = graph.outbound_of(nodes[1], owner).collect();
        assert_eq!(out, vec![edges[2]]);
        assert_eq!(graph.outbound_of(nodes[1], other).count(), 0);
    }

    #[test]
    fn is_acyclic_per_owner() {
        let (mut graph, owner, nodes, edges) = chain();
        assert!(graph.is_acyclic(owner));

        let other = graph.intern_owner("U2");
        graph.insert_edge(other, Some(nodes[2]), nodes[1], None);
        graph.insert_edge(other, Some(nodes[1]), nodes[2], None);
        assert!(graph.is_acyclic(owner));
        assert!(!graph.is_acyclic(other));

        graph.insert_edge(owner, Some(nodes[2]), nodes[1], Some(edges[2]));
        assert!(!graph.is_acyclic(owner));
    }

    #[test]
    fn check_position_rejects_unknown_and_detached() {
        let (graph, _, nodes, edges) = chain();
        assert!(graph
            .check_position(Position { node: nodes[1], edge: edges[1] }, "U1")
            .is_ok());
        assert_eq!(
            graph.check_position(Position { node: NodeId(40), edge: edges[1] }, "U1"),
            Err(CoreError::NodeNotFound { id: NodeId(40) })
        );
        assert_eq!(
            graph.check_position(Position { node: nodes[1], edge: EdgeId(40) }, "U1"),
            Err(CoreError::EdgeNotFound { id: EdgeId(40) })
        );
        assert_eq!(
            graph.check_position(Position { node: nodes[1], edge: edges[2] }, "U1"),
            Err(CoreError::DetachedAntecedent { node: nodes[1], edge: edges[2] })
        );
    }

    #[test]
    fn check_position_rejects_other_owners_edges() {
        let (mut graph, _, nodes, edges) = chain();
        graph.intern_owner("U2");
        let position = Position { node: nodes[1], edge: edges[1] };
        assert_eq!(
            graph.check_position(position, "U2"),
            Err(CoreError::ForeignAntecedent { edge: edges[1], owner: "U2".into() })
        );
        assert_eq!(
            graph.check_position(position, "U3"),
            Err(CoreError::ForeignAntecedent { edge: edges[1], owner: "U3".into() })
        );
    }
}
