//! Navigation graph nodes.
//!
//! A [`Node`] is a uniquely named resource. It records the edges that lead
//! into it and out of it (as arena indices) and a visit counter per owner.
//! Counters sit behind their own lock so readers evaluating paths and the
//! builder bumping a counter do not need to agree on anything beyond the
//! node itself. Lock order is always graph lock first, node lock second.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;

use crate::id::{EdgeId, OwnerId};

/// A node in the navigation graph.
#[derive(Debug)]
pub struct Node {
    name: String,
    /// Edges whose destination is this node, in creation order.
    inbound: SmallVec<[EdgeId; 4]>,
    /// Edges whose source is this node, in creation order.
    outbound: SmallVec<[EdgeId; 4]>,
    /// Per-owner visit counters. Absence means zero.
    visits: Mutex<HashMap<OwnerId, u32>>,
}

impl Node {
    /// Creates a node first visited by `owner`, so its counter starts at 1.
    pub(crate) fn new(name: String, owner: OwnerId) -> Self {
        let mut visits = HashMap::new();
        visits.insert(owner, 1);
        Node {
            name,
            inbound: SmallVec::new(),
            outbound: SmallVec::new(),
            visits: Mutex::new(visits),
        }
    }

    /// Returns the trimmed, unique node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the edges leading into this node.
    pub fn inbound(&self) -> &[EdgeId] {
        &self.inbound
    }

    /// Returns the edges leaving this node.
    pub fn outbound(&self) -> &[EdgeId] {
        &self.outbound
    }

    /// Returns how many times `owner` visited this node (0 if never).
    pub fn visits(&self, owner: OwnerId) -> u32 {
        self.counters().get(&owner).copied().unwrap_or(0)
    }

    /// Returns the owners that visited this node, in no particular order.
    pub fn visitors(&self) -> Vec<OwnerId> {
        self.counters().keys().copied().collect()
    }

    /// Counts one more visit by `owner` and returns the new count.
    pub(crate) fn add_visit(&self, owner: OwnerId) -> u32 {
        let mut counters = self.counters();
        let count = counters.entry(owner).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    #[cfg(test)]
    pub(crate) fn set_visits(&self, owner: OwnerId, count: u32) {
        self.counters().insert(owner, count);
    }

    pub(crate) fn push_inbound(&mut self, edge: EdgeId) {
        self.inbound.push(edge);
    }

    pub(crate) fn push_outbound(&mut self, edge: EdgeId) {
        self.outbound.push(edge);
    }

    fn counters(&self) -> MutexGuard<'_, HashMap<OwnerId, u32>> {
        // Counters are plain integers; a panic elsewhere cannot leave them torn.
        self.visits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_counts_first_visit() {
        let node = Node::new("N1".into(), OwnerId(0));
        assert_eq!(node.name(), "N1");
        assert_eq!(node.visits(OwnerId(0)), 1);
        assert_eq!(node.visits(OwnerId(1)), 0);
        assert!(node.inbound().is_empty());
        assert!(node.outbound().is_empty());
    }

    #[test]
    fn add_visit_increments_per_owner() {
        let node = Node::new("/".into(), OwnerId(0));
        assert_eq!(node.add_visit(OwnerId(0)), 2);
        node.add_visit(OwnerId(0));
        assert_eq!(node.visits(OwnerId(0)), 3);

        assert_eq!(node.add_visit(OwnerId(1)), 1);
        assert_eq!(node.visits(OwnerId(1)), 1);

        let mut visitors = node.visitors();
        visitors.sort();
        assert_eq!(visitors, vec![OwnerId(0), OwnerId(1)]);
    }

    #[test]
    fn edge_lists_keep_creation_order() {
        let mut node = Node::new("N2".into(), OwnerId(0));
        node.push_inbound(EdgeId(4));
        node.push_inbound(EdgeId(1));
        node.push_outbound(EdgeId(7));
        assert_eq!(node.inbound(), &[EdgeId(4), EdgeId(1)]);
        assert_eq!(node.outbound(), &[EdgeId(7)]);
    }

    #[test]
    fn visit_counter_saturates() {
        let node = Node::new("N1".into(), OwnerId(0));
        node.set_visits(OwnerId(0), u32::MAX - 1);
        assert_eq!(node.add_visit(OwnerId(0)), u32::MAX);
        assert_eq!(node.add_visit(OwnerId(0)), u32::MAX);
    }
}
