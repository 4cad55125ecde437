use std::collections::BTreeMap;
use std::io::Cursor;

use popath_core::{ingest, LogIngestor, NodeId, OwnerId, PathMiner, ROOT_NODE_NAME};
use proptest::prelude::*;

/// Random access logs: `(owner, node)` pairs where node 0 is the root.
/// Every owner enters through the root before its first other record.
fn access_log() -> impl Strategy<Value = String> {
    prop::collection::vec((0..3usize, 0..6usize), 1..60).prop_map(|records| {
        let mut entered = [false; 3];
        let mut log = String::new();
        for (owner, node) in records {
            if !entered[owner] && node != 0 {
                log.push_str(&format!("U{owner}\t/\n"));
            }
            entered[owner] = true;
            if node == 0 {
                log.push_str(&format!("U{owner}\t/\n"));
            } else {
                log.push_str(&format!("U{owner}\tN{node}\n"));
            }
        }
        log
    })
}

fn node_count(path: &str) -> usize {
    match path.strip_prefix(ROOT_NODE_NAME) {
        Some(rest) => 1 + rest.split('/').count(),
        None => path.split('/').count(),
    }
}

fn load(log: &str) -> PathMiner {
    let miner = PathMiner::on_demand();
    ingest(&miner, Cursor::new(log)).unwrap();
    miner
}

fn sorted_all(miner: &PathMiner, depth: usize) -> Vec<(String, Vec<(String, u32)>)> {
    miner
        .all_popular_paths(depth, 10_000)
        .unwrap()
        .into_iter()
        .map(|(owner, paths)| {
            let mut paths: Vec<_> = paths.into_iter().map(|p| (p.path, p.frequency)).collect();
            paths.sort();
            (owner, paths)
        })
        .collect()
}

fn counters(miner: &PathMiner) -> BTreeMap<(OwnerId, NodeId), u32> {
    let graph = miner.graph();
    let counters = graph
        .owners()
        .flat_map(|(_, owner)| graph.owner_nodes(owner).iter().map(move |&node| (owner, node)))
        .map(|(owner, node)| ((owner, node), graph.visits(node, owner)))
        .collect();
    counters
}

proptest! {
    #[test]
    fn paths_have_exactly_the_requested_depth(log in access_log(), depth in 2..5usize) {
        let miner = load(&log);
        for paths in miner.all_popular_paths(depth, 10_000).unwrap().values() {
            for path in paths {
                prop_assert_eq!(node_count(&path.path), depth, "path {}", path.path);
            }
        }
    }

    #[test]
    fn top_n_is_a_sorted_prefix(log in access_log(), depth in 2..4usize, top_n in 1..6usize) {
        let miner = load(&log);
        let full = miner.all_popular_paths(depth, 10_000).unwrap();
        let top = miner.all_popular_paths(depth, top_n).unwrap();

        for (owner, paths) in &top {
            prop_assert!(paths.len() <= top_n);
            prop_assert!(paths.windows(2).all(|w| w[0].frequency >= w[1].frequency));

            let expected: Vec<u32> = full[owner].iter().take(top_n).map(|p| p.frequency).collect();
            let actual: Vec<u32> = paths.iter().map(|p| p.frequency).collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn repeated_records_are_absorbed(log in access_log(), depth in 2..4usize) {
        let doubled: String = log.lines().flat_map(|line| [line, "\n", line, "\n"]).collect();
        let once = load(&log);
        let twice = load(&doubled);
        prop_assert_eq!(sorted_all(&once, depth), sorted_all(&twice, depth));
    }

    #[test]
    fn visit_counters_only_grow(log in access_log()) {
        let lines: Vec<&str> = log.lines().collect();
        let (head, tail) = lines.split_at(lines.len() / 2);
        let miner = PathMiner::on_demand();
        let mut ingestor = LogIngestor::new(&miner);

        let first = ingestor.ingest(Cursor::new(head.join("\n"))).unwrap();
        let before = counters(&miner);
        let second = ingestor.ingest(Cursor::new(tail.join("\n"))).unwrap();
        let after = counters(&miner);

        for (key, visits) in &before {
            prop_assert!(after[key] >= *visits);
        }
        // every touch that moved an owner bumped exactly one counter by one
        let total: u32 = after.values().sum();
        prop_assert_eq!(total as usize, first.touches + second.touches);
    }
}
