use serde::{Deserialize, Serialize};

use crate::model::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DirStats {
    pub bytes: u64,
    pub files: u64,
    /// Directory nodes, the starting node included.
    pub dirs: u64,
    /// Longest chain of edges below the starting node.
    pub depth: usize,
}

pub fn stats(node: &TreeNode) -> DirStats {
    let mut out = DirStats {
        bytes: node.size,
        ..DirStats::default()
    };
    let mut stack = vec![(node, 0usize)];
    while let Some((n, depth)) = stack.pop() {
        out.depth = out.depth.max(depth);
        if n.is_dir() {
            out.dirs += 1;
        } else {
            out.files += 1;
        }
        stack.extend(n.children().iter().map(|c| (c, depth + 1)));
    }
    out
}
