pub mod id;
pub mod error;
pub mod node;
pub mod edge;
pub mod graph;
pub mod builder;
pub mod walk;
pub mod evaluate;
pub mod rank;
pub mod miner;
pub mod ingest;

// Re-export commonly used types
pub use id::{NodeId, EdgeId, OwnerId};
pub use error::{CoreError, IngestError};
pub use graph::{NavGraph, Position, DEFAULT_PATH_DEPTH, NODE_PATH_SEPARATOR, ROOT_NODE_NAME};
pub use builder::TouchOutcome;
pub use walk::{Walk, Forward, Backward};
pub use evaluate::Evaluator;
pub use rank::{RankedPath, TopK};
pub use miner::{PathMiner, PathsByOwner, Strategy};
pub use ingest::{ingest, IngestSummary, LogIngestor, RecordOutcome};
