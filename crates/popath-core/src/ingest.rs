//! Access-log ingestion.
//!
//! An access log holds one record per line, `OWNER<whitespace>NODE`. The
//! adapter remembers where every owner stands so that consecutive records
//! of the same owner form one continuous walk, and a root record starts a
//! new walk.
//!
//! Records the builder would reject are not errors here: malformed lines
//! and non-root records of owners that never entered through the root are
//! logged and skipped. Only read failures and core errors abort ingestion;
//! the records applied before the failure stay in the graph.

use std::collections::HashMap;
use std::io::BufRead;

use crate::builder::TouchOutcome;
use crate::error::{CoreError, IngestError};
use crate::graph::{Position, ROOT_NODE_NAME};
use crate::miner::PathMiner;

/// Counters of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Lines read, including malformed and skipped ones.
    pub lines: usize,
    /// Records that moved an owner.
    pub touches: usize,
    /// Records absorbed because the owner was already at the node.
    pub refreshes: usize,
    /// Malformed or unanchored records.
    pub skipped: usize,
}

/// What became of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Touched,
    Refreshed,
    Skipped,
}

/// Where an owner stands between records.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: Position,
    at_root: bool,
}

/// Splits a log line into `(owner, node)`.
///
/// Returns `None` unless the line holds exactly two whitespace-separated
/// tokens.
pub fn parse_record(line: &str) -> Option<(&str, &str)> {
    let mut tokens = line
        .split(|c: char| matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r'))
        .filter(|token| !token.is_empty());
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(owner), Some(node), None) => Some((owner, node)),
        _ => None,
    }
}

/// Feeds access-log records into a [`PathMiner`].
#[derive(Debug)]
pub struct LogIngestor<'m> {
    miner: &'m PathMiner,
    cursors: HashMap<String, Cursor>,
}

impl<'m> LogIngestor<'m> {
    pub fn new(miner: &'m PathMiner) -> Self {
        LogIngestor {
            miner,
            cursors: HashMap::new(),
        }
    }

    /// Applies one log line.
    pub fn record(&mut self, line: &str) -> Result<RecordOutcome, CoreError> {
        let Some((owner, name)) = parse_record(line) else {
            tracing::warn!(
                line,
                "invalid access record, expected OWNER<whitespace>NODE"
            );
            return Ok(RecordOutcome::Skipped);
        };

        let cursor = self.cursors.get(owner).copied();
        let at_root = name == ROOT_NODE_NAME;
        let from = match (at_root, cursor) {
            (true, Some(cursor)) if cursor.at_root => {
                tracing::debug!(owner, "root refresh absorbed");
                return Ok(RecordOutcome::Refreshed);
            }
            (true, _) => None,
            (false, Some(cursor)) => Some(cursor.position),
            (false, None) => {
                tracing::warn!(owner, node = name, "access record before any root access, skipped");
                return Ok(RecordOutcome::Skipped);
            }
        };

        match self.miner.touch(name, from, owner)? {
            TouchOutcome::Refresh => Ok(RecordOutcome::Refreshed),
            TouchOutcome::Moved { position, .. } => {
                self.cursors
                    .insert(owner.to_string(), Cursor { position, at_root });
                Ok(RecordOutcome::Touched)
            }
        }
    }

    /// Applies every line of `reader` and returns the run's counters.
    ///
    /// Lines that are not valid UTF-8 are skipped like any other malformed
    /// record; only read failures end the run early.
    pub fn ingest<R: BufRead>(&mut self, mut reader: R) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            summary.lines += 1;
            let outcome = match std::str::from_utf8(strip_line_end(&buf)) {
                Ok(line) => self.record(line)?,
                Err(_) => {
                    tracing::warn!(line = summary.lines, "access record is not valid UTF-8, skipped");
                    RecordOutcome::Skipped
                }
            };
            match outcome {
                RecordOutcome::Touched => summary.touches += 1,
                RecordOutcome::Refreshed => summary.refreshes += 1,
                RecordOutcome::Skipped => summary.skipped += 1,
            }
        }
        tracing::info!(
            lines = summary.lines,
            touches = summary.touches,
            refreshes = summary.refreshes,
            skipped = summary.skipped,
            "access log ingested"
        );
        Ok(summary)
    }
}

fn strip_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Ingests a whole access log into `miner` with a fresh set of cursors.
pub fn ingest<R: BufRead>(miner: &PathMiner, reader: R) -> Result<IngestSummary, IngestError> {
    LogIngestor::new(miner).ingest(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor as Input, Read};

    #[test]
    fn parse_record_accepts_two_tokens() {
        assert_eq!(parse_record("U1\tN1"), Some(("U1", "N1")));
        assert_eq!(parse_record("U1 \x0B N1\r"), Some(("U1", "N1")));
        assert_eq!(parse_record("  U1\t/"), Some(("U1", "/")));
        assert_eq!(parse_record("U1"), None);
        assert_eq!(parse_record("U1\tN1\tN2"), None);
        assert_eq!(parse_record(""), None);
        assert_eq!(parse_record("\t\r"), None);
    }

    #[test]
    fn summary_counts_every_line() {
        let miner = PathMiner::on_demand();
        let log = "U1\t/\nU1\tN1\nU1\tN1\ngarbage\nU2\tN1\nU1\t/\nU1\t/\n";
        let summary = ingest(&miner, Input::new(log)).unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                lines: 7,
                touches: 3,
                refreshes: 2,
                skipped: 2,
            }
        );
        assert!(miner.graph().owner_id("U2").is_none());
    }

    #[test]
    fn root_record_restarts_the_walk() {
        let miner = PathMiner::on_demand();
        ingest(&miner, Input::new("U1\t/\nU1\tN1\nU1\t/\nU1\tN2\n")).unwrap();

        let graph = miner.graph();
        let owner = graph.owner_id("U1").unwrap();
        let root = graph.root().unwrap();
        let n2 = graph.find_node("N2").unwrap();
        assert!(graph.find_edge(owner, Some(root), n2).is_some());
        assert_eq!(graph.visits(root, owner), 2);
    }

    #[test]
    fn owners_walk_independently() {
        let miner = PathMiner::on_demand();
        ingest(&miner, Input::new("U1\t/\nU2\t/\nU1\tN1\nU2\tN2\nU1\tN2\n")).unwrap();

        let graph = miner.graph();
        let u1 = graph.owner_id("U1").unwrap();
        let u2 = graph.owner_id("U2").unwrap();
        let n1 = graph.find_node("N1").unwrap();
        let n2 = graph.find_node("N2").unwrap();
        assert!(graph.find_edge(u1, Some(n1), n2).is_some());
        assert!(graph.find_edge(u2, graph.root(), n2).is_some());
        assert!(graph.find_edge(u2, Some(n1), n2).is_none());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn read_failures_propagate() {
        let miner = PathMiner::on_demand();
        let result = ingest(&miner, io::BufReader::new(Broken));
        assert!(matches!(result, Err(IngestError::Io(_))));
    }

    #[test]
    fn records_before_a_failure_are_kept() {
        let miner = PathMiner::on_demand();
        let input = Input::new("U1\t/\nU1\tN1\n").chain(Broken);
        assert!(ingest(&miner, io::BufReader::new(input)).is_err());
        assert!(miner.graph().find_node("N1").is_some());
    }

    #[test]
    fn invalid_utf8_lines_are_skipped() {
        let miner = PathMiner::on_demand();
        let log: &[u8] = b"U1\t/\nU1\tN1\r\nU1\t\xff\xfe\nU1\tN2\nU1\tN3";
        let summary = ingest(&miner, Input::new(log)).unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                lines: 5,
                touches: 4,
                refreshes: 0,
                skipped: 1,
            }
        );

        let graph = miner.graph();
        let owner = graph.owner_id("U1").unwrap();
        let n1 = graph.find_node("N1").unwrap();
        let n2 = graph.find_node("N2").unwrap();
        assert!(graph.find_edge(owner, Some(n1), n2).is_some());
        assert!(graph.find_node("N3").is_some());
    }

    #[test]
    fn line_ends_are_stripped() {
        assert_eq!(strip_line_end(b"U1\tN1\r\n"), b"U1\tN1");
        assert_eq!(strip_line_end(b"U1\tN1\n"), b"U1\tN1");
        assert_eq!(strip_line_end(b"U1\tN1"), b"U1\tN1");
    }
}
