//! Ranked paths and the top-K merge.
//!
//! Rankings are ordered by descending frequency only. An item is inserted in
//! front of the first entry it strictly beats, so equal-frequency entries
//! keep whatever relative order the (parallel) producers delivered them in.
//! No secondary key is applied: tie order is unspecified and may differ
//! between runs.

use serde::{Deserialize, Serialize};

/// A rendered path and its summed visit frequency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedPath {
    /// Node names joined by `/`, the root sentinel rendered as a lone `/`.
    pub path: String,
    /// Sum of the owner's visit counters over the path's nodes.
    pub frequency: u32,
}

impl RankedPath {
    pub fn new(path: impl Into<String>, frequency: u32) -> Self {
        RankedPath {
            path: path.into(),
            frequency,
        }
    }
}

/// Anything that can be placed in a frequency ranking.
pub trait Ranked {
    fn frequency(&self) -> u32;
}

impl Ranked for RankedPath {
    fn frequency(&self) -> u32 {
        self.frequency
    }
}

/// Inserts `item` before the first entry with a strictly lower frequency.
pub fn insert_ranked<T: Ranked>(list: &mut Vec<T>, item: T) {
    let frequency = item.frequency();
    let pos = list
        .iter()
        .position(|existing| frequency > existing.frequency())
        .unwrap_or(list.len());
    list.insert(pos, item);
}

/// A bounded ranking that keeps at most `limit` entries.
#[derive(Debug, Clone)]
pub struct TopK {
    limit: usize,
    items: Vec<RankedPath>,
}

impl TopK {
    pub fn new(limit: usize) -> Self {
        TopK {
            limit,
            items: Vec::with_capacity(limit.min(64)),
        }
    }

    /// Ranks `item`, dropping whatever falls past the limit.
    pub fn push(&mut self, item: RankedPath) {
        insert_ranked(&mut self.items, item);
        self.items.truncate(self.limit);
    }

    /// Folds another partial ranking into this one.
    pub fn merge(mut self, other: TopK) -> TopK {
        for item in other.items {
            self.push(item);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<RankedPath> {
        self.items
    }
}
