//! Error types for popath-core.
//!
//! [`CoreError`] covers precondition violations on the builder and query
//! surface. These signal caller bugs: they are returned before any mutation
//! or traversal happens and are never auto-corrected. [`IngestError`] wraps
//! the failures of the access-log adapter.

use thiserror::Error;

use crate::id::{EdgeId, NodeId};

/// Errors produced by the graph builder, evaluator and query surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The owner identifier was empty after trimming.
    #[error("owner name should not be empty")]
    EmptyOwner,

    /// The node name was empty after trimming.
    #[error("node name should not be empty")]
    EmptyNodeName,

    /// A non-root node was touched without a current position.
    #[error("node '{name}' touched without a parent position")]
    MissingParent { name: String },

    /// The root sentinel was touched with a parent position.
    #[error("root node touched with a parent position")]
    UnexpectedParent,

    /// A node index was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// An edge index was not found in the graph.
    #[error("edge not found: EdgeId({id})", id = id.0)]
    EdgeNotFound { id: EdgeId },

    /// The antecedent edge of a position does not lead into its node.
    #[error("edge {edge} does not lead into node {node}")]
    DetachedAntecedent { node: NodeId, edge: EdgeId },

    /// The antecedent edge of a position belongs to a different owner.
    #[error("edge {edge} does not belong to owner '{owner}'")]
    ForeignAntecedent { edge: EdgeId, owner: String },

    /// Forward evaluation needs the edge that led into the start node.
    #[error("forward evaluation requires an antecedent edge")]
    MissingAntecedent,

    /// Path depth outside the accepted range.
    #[error("path depth should be greater than 1, got {depth}")]
    InvalidDepth { depth: usize },

    /// Top-N must be positive.
    #[error("top N should be greater than 0")]
    InvalidTopN,

    /// A booked graph only answers for the depth it books.
    #[error("graph books paths of depth {booked}, requested depth {requested}")]
    DepthMismatch { requested: usize, booked: usize },
}

/// Errors produced while ingesting an access log.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the access log failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The builder rejected a touch.
    #[error(transparent)]
    Core(#[from] CoreError),
}
