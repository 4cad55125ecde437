//! Depth-bounded path enumeration.
//!
//! [`Evaluator`] enumerates every owner-consistent path of exactly
//! `max_depth` nodes reachable from a start node under a [`Walk`] strategy.
//! A path's frequency is the sum of the owner's visit counters along it.
//!
//! Recursion depth never exceeds `max_depth`. Branches fan out over the
//! rayon pool and partial results are merged by insertion on frequency, so
//! equal-frequency paths come back in no particular order.

use rayon::prelude::*;

use crate::error::CoreError;
use crate::graph::NavGraph;
use crate::id::{EdgeId, NodeId, OwnerId};
use crate::rank::{insert_ranked, Ranked, RankedPath};
use crate::walk::Walk;

/// A partial result tagged with the node count its path reached.
#[derive(Debug, Clone)]
struct Tagged {
    depth: usize,
    path: RankedPath,
}

impl Ranked for Tagged {
    fn frequency(&self) -> u32 {
        self.path.frequency
    }
}

/// Path enumeration for one owner, one strategy and one path length.
pub struct Evaluator<'g, W: Walk> {
    graph: &'g NavGraph,
    walk: W,
    owner: OwnerId,
    max_depth: usize,
}

impl<'g, W: Walk> Evaluator<'g, W> {
    /// Creates an evaluator for paths of `max_depth` nodes.
    pub fn new(graph: &'g NavGraph, walk: W, owner: OwnerId, max_depth: usize) -> Result<Self, CoreError> {
        if max_depth == 0 {
            return Err(CoreError::InvalidDepth { depth: max_depth });
        }
        Ok(Evaluator {
            graph,
            walk,
            owner,
            max_depth,
        })
    }

    /// Enumerates the paths starting at `start`, which was reached through
    /// `via`. Results are ordered by descending frequency.
    pub fn paths_from(&self, start: NodeId, via: Option<EdgeId>) -> Result<Vec<RankedPath>, CoreError> {
        if self.graph.node(start).is_none() {
            return Err(CoreError::NodeNotFound { id: start });
        }
        match via {
            Some(edge) if self.graph.edge(edge).is_none() => {
                return Err(CoreError::EdgeNotFound { id: edge });
            }
            None if W::NEEDS_ANTECEDENT => return Err(CoreError::MissingAntecedent),
            _ => {}
        }

        Ok(self
            .descend(start, via, 1, "", 0)
            .into_iter()
            // a start node that is itself a boundary reports depth 1
            .filter(|tagged| tagged.depth == self.max_depth)
            .map(|tagged| tagged.path)
            .collect())
    }

    fn descend(&self, node: NodeId, via: Option<EdgeId>, depth: usize, prefix: &str, frequency: u32) -> Vec<Tagged> {
        let current = self.graph.node_at(node);
        let path = self.walk.extend_path(prefix, current.name());
        let frequency = frequency.saturating_add(current.visits(self.owner));

        if depth == self.max_depth || self.walk.is_boundary(self.graph, node, via, self.owner) {
            return vec![Tagged {
                depth,
                path: RankedPath::new(path, frequency),
            }];
        }

        self.walk
            .next_edges(self.graph, node, via, self.owner)
            .into_par_iter()
            .filter_map(|edge| self.walk.next_node(self.graph, edge).map(|next| (edge, next)))
            .map(|(edge, next)| self.descend(next, Some(edge), depth + 1, &path, frequency))
            .fold(Vec::new, |acc, items| self.accumulate(acc, items, depth))
            .reduce(Vec::new, combine)
    }

    /// Folds one branch's results into a partial list. Paths that ended one
    /// step below `depth` without reaching full length are dropped here.
    fn accumulate(&self, mut acc: Vec<Tagged>, items: Vec<Tagged>, depth: usize) -> Vec<Tagged> {
        for item in items {
            if item.depth == depth + 1 && item.depth != self.max_depth {
                continue;
            }
            insert_ranked(&mut acc, item);
        }
        acc
    }
}

/// Merges two partial lists by inserting each right-hand item on frequency.
fn combine(mut left: Vec<Tagged>, right: Vec<Tagged>) -> Vec<Tagged> {
    if left.is_empty() {
        return right;
    }
    for item in right {
        insert_ranked(&mut left, item);
    }
    left
}
