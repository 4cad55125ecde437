//! PathMiner: the thread-safe graph plus the popular-path query surface.
//!
//! A miner is built for one [`Strategy`], fixed for its lifetime:
//!
//! - [`Strategy::OnDemand`]: touches only grow the graph. A query walks
//!   every node the owner has visited, evaluates all paths of the requested
//!   depth with [`Forward`] and ranks them. Works on graphs with revisits.
//! - [`Strategy::Booked`]: after every touch that moves an owner, the paths
//!   of the booked depth that end at the touched node are evaluated with
//!   [`Backward`] and merge-inserted into that owner's ranked list. Queries
//!   slice the list. Booked entries keep the frequency they had when they
//!   were discovered; a later rediscovery of the same path adds a second
//!   entry. Assumes each owner's walk is a DAG.
//!
//! Locking: the graph sits behind one `RwLock`. A touch holds the write
//! lock for one upsert (plus, when booking, its evaluation), so touches are
//! linearizable. Queries hold the read lock across their evaluation. Visit
//! counters have their own per-node lock, always taken after the graph
//! lock. Booked lists live in a `DashMap`, only ever locked while the graph
//! lock is held or on their own.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::builder::TouchOutcome;
use crate::error::CoreError;
use crate::evaluate::Evaluator;
use crate::graph::{NavGraph, Position, DEFAULT_PATH_DEPTH};
use crate::id::OwnerId;
use crate::rank::{insert_ranked, RankedPath, TopK};
use crate::walk::{Backward, Forward};

/// Ranked paths per owner name.
pub type PathsByOwner = BTreeMap<String, Vec<RankedPath>>;

/// How popular paths are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Evaluate at query time over an unconstrained graph.
    #[default]
    OnDemand,
    /// Book paths of `depth` nodes at ingest time over a DAG.
    Booked { depth: usize },
}

impl Strategy {
    /// The depth used by the query forms that do not name one.
    pub fn default_depth(&self) -> usize {
        match self {
            Strategy::OnDemand => DEFAULT_PATH_DEPTH,
            Strategy::Booked { depth } => *depth,
        }
    }
}

/// The navigation graph together with its popular-path engine.
#[derive(Debug)]
pub struct PathMiner {
    graph: RwLock<NavGraph>,
    strategy: Strategy,
    booked: DashMap<String, Vec<RankedPath>>,
}

impl PathMiner {
    /// Creates an empty miner. A booked depth must be greater than 1.
    pub fn new(strategy: Strategy) -> Result<Self, CoreError> {
        if let Strategy::Booked { depth } = strategy {
            check_depth(depth)?;
        }
        Ok(PathMiner {
            graph: RwLock::new(NavGraph::new()),
            strategy,
            booked: DashMap::new(),
        })
    }

    /// Creates an empty on-demand miner.
    pub fn on_demand() -> Self {
        PathMiner {
            graph: RwLock::new(NavGraph::new()),
            strategy: Strategy::OnDemand,
            booked: DashMap::new(),
        }
    }

    /// Creates an empty miner booking paths of `depth` nodes.
    pub fn booked(depth: usize) -> Result<Self, CoreError> {
        Self::new(Strategy::Booked { depth })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Read access to the graph. Holds the graph lock until dropped.
    pub fn graph(&self) -> RwLockReadGuard<'_, NavGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn graph_mut(&self) -> RwLockWriteGuard<'_, NavGraph> {
        self.graph.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one touch. See [`NavGraph::touch`] for the semantics of
    /// `from`. Under [`Strategy::Booked`], a touch that moves the owner also
    /// books the paths ending at the touched node.
    pub fn touch(&self, name: &str, from: Option<Position>, owner: &str) -> Result<TouchOutcome, CoreError> {
        let mut graph = self.graph_mut();
        let outcome = graph.touch(name, from, owner)?;

        if let (Strategy::Booked { depth }, TouchOutcome::Moved { position, .. }) = (self.strategy, outcome) {
            let owner = owner.trim();
            if let Some(owner_id) = graph.owner_id(owner) {
                let paths = Evaluator::new(&*graph, Backward, owner_id, depth)?.paths_from(position.node, None)?;
                let mut list = self.booked.entry(owner.to_string()).or_default();
                for path in paths {
                    tracing::debug!(owner, path = %path.path, frequency = path.frequency, "path booked");
                    insert_ranked(&mut *list, path);
                }
            }
        }
        Ok(outcome)
    }

    /// Returns the `top_n` most popular paths of `depth` nodes for `owner`.
    ///
    /// An owner that never touched the graph has no paths. A booked miner
    /// only answers for its booked depth.
    pub fn popular_paths(&self, depth: usize, top_n: usize, owner: &str) -> Result<Vec<RankedPath>, CoreError> {
        check_top_n(top_n)?;
        check_depth(depth)?;
        let owner = check_owner(owner)?;

        match self.strategy {
            Strategy::OnDemand => {
                let graph = self.graph();
                match graph.owner_id(owner) {
                    Some(owner_id) => rank_owner(&graph, owner_id, depth, top_n),
                    None => Ok(Vec::new()),
                }
            }
            Strategy::Booked { depth: booked } => {
                check_booked_depth(depth, booked)?;
                Ok(self
                    .booked
                    .get(owner)
                    .map(|list| list.iter().take(top_n).cloned().collect())
                    .unwrap_or_default())
            }
        }
    }

    /// [`popular_paths`](Self::popular_paths) at the strategy's default depth.
    pub fn popular_paths_default(&self, top_n: usize, owner: &str) -> Result<Vec<RankedPath>, CoreError> {
        self.popular_paths(self.strategy.default_depth(), top_n, owner)
    }

    /// Returns the `top_n` most popular paths of `depth` nodes per owner.
    ///
    /// On demand, every owner is evaluated independently in parallel and
    /// appears in the result, possibly with an empty list. Booked, only
    /// owners with at least one booked path appear.
    pub fn all_popular_paths(&self, depth: usize, top_n: usize) -> Result<PathsByOwner, CoreError> {
        check_top_n(top_n)?;
        check_depth(depth)?;

        match self.strategy {
            Strategy::OnDemand => {
                let guard = self.graph();
                let graph: &NavGraph = &guard;
                let owners: Vec<(String, OwnerId)> = graph
                    .owners()
                    .map(|(name, id)| (name.to_string(), id))
                    .collect();
                owners
                    .into_par_iter()
                    .map(|(name, owner_id)| Ok::<_, CoreError>((name, rank_owner(graph, owner_id, depth, top_n)?)))
                    .collect()
            }
            Strategy::Booked { depth: booked } => {
                check_booked_depth(depth, booked)?;
                Ok(self
                    .booked
                    .iter()
                    .filter(|entry| !entry.value().is_empty())
                    .map(|entry| {
                        let top = entry.value().iter().take(top_n).cloned().collect();
                        (entry.key().clone(), top)
                    })
                    .collect())
            }
        }
    }

    /// [`all_popular_paths`](Self::all_popular_paths) at the strategy's
    /// default depth.
    pub fn all_popular_paths_default(&self, top_n: usize) -> Result<PathsByOwner, CoreError> {
        self.all_popular_paths(self.strategy.default_depth(), top_n)
    }
}

/// Evaluates and ranks every path of `owner`: one forward evaluation per
/// (visited node, inbound edge of the owner) pair.
fn rank_owner(graph: &NavGraph, owner: OwnerId, depth: usize, top_n: usize) -> Result<Vec<RankedPath>, CoreError> {
    let evaluator = Evaluator::new(graph, Forward, owner, depth)?;
    let starts: Vec<_> = graph
        .owner_nodes(owner)
        .iter()
        .flat_map(|&node| graph.inbound_of(node, owner).map(move |edge| (node, edge)))
        .collect();

    starts
        .into_par_iter()
        .map(|(node, edge)| evaluator.paths_from(node, Some(edge)))
        .try_fold(
            || TopK::new(top_n),
            |mut top, paths| {
                for path in paths? {
                    top.push(path);
                }
                Ok::<_, CoreError>(top)
            },
        )
        .try_reduce(|| TopK::new(top_n), |left, right| Ok(left.merge(right)))
        .map(TopK::into_vec)
}

fn check_depth(depth: usize) -> Result<(), CoreError> {
    if depth <= 1 {
        return Err(CoreError::InvalidDepth { depth });
    }
    Ok(())
}

fn check_top_n(top_n: usize) -> Result<(), CoreError> {
    if top_n == 0 {
        return Err(CoreError::InvalidTopN);
    }
    Ok(())
}

fn check_owner(owner: &str) -> Result<&str, CoreError> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(CoreError::EmptyOwner);
    }
    Ok(owner)
}

fn check_booked_depth(requested: usize, booked: usize) -> Result<(), CoreError> {
    if requested != booked {
        return Err(CoreError::DepthMismatch { requested, booked });
    }
    Ok(())
}
