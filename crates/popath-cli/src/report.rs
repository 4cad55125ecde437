//! Plain-text rendering of popular-path results.

use std::fmt::Write;

use popath_core::PathsByOwner;

/// Renders `result` in the access-log report layout: a header with the
/// visitor count, then one block per visitor listing its paths in rank
/// order, each block followed by a blank line.
pub fn render(result: &PathsByOwner) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        out,
        "Access log evaluation result: (total user(s) = {})",
        result.len()
    );
    for (visitor, paths) in result {
        let _ = writeln!(out, "Visitor: {visitor}");
        let _ = writeln!(
            out,
            "== Paths (Order by total node access frequencies, total path(s) = {}) ==",
            paths.len()
        );
        for path in paths {
            let _ = writeln!(
                out,
                "{:<40}(total node frequencies: {})",
                path.path, path.frequency
            );
        }
        out.push('\n');
    }
    out
}
