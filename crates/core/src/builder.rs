use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::error::{BuildError, InvalidReason};
use crate::model::{FileRecord, NodeKind, TreeNode, ROOT_NAME, ROOT_PATH};

/// What to do with empty segments from leading, trailing or doubled slashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySegments {
    /// Empty strings are ordinary names.
    #[default]
    Keep,
    /// Empty segments are dropped before the path is walked.
    Collapse,
    /// The record is rejected.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub empty_segments: EmptySegments,
}

/// Outcome of inserting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Created,
    /// The file was already present; its size was left alone.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    kind: NodeKind,
    path: String,
    size: u64,
    file_count: u64,
    children: Vec<NodeId>,
    by_name: HashMap<String, NodeId>,
}

impl Slot {
    fn new(name: &str, kind: NodeKind, path: String, size: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            path,
            size,
            file_count: u64::from(kind == NodeKind::File),
            children: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

/// Incremental path-tree builder.
///
/// Nodes live in an arena owned by the builder; parents always precede their
/// children. Nothing inside the arena is reachable from outside until
/// [`PathTreeBuilder::finish`] hands the whole tree to the caller.
#[derive(Debug, Clone)]
pub struct PathTreeBuilder {
    options: BuildOptions,
    nodes: Vec<Slot>,
    records_seen: usize,
}

impl Default for PathTreeBuilder {
    fn default() -> Self {
        Self::with_options(BuildOptions::default())
    }
}

impl PathTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        let root = Slot::new(ROOT_NAME, NodeKind::Dir, ROOT_PATH.to_string(), 0);
        Self {
            options,
            nodes: vec![root],
            records_seen: 0,
        }
    }

    /// Place one record in the tree.
    ///
    /// The whole path is checked against the existing tree before anything
    /// is created, so a failed insert leaves the builder unchanged.
    pub fn insert(&mut self, record: &FileRecord) -> Result<Insertion, BuildError> {
        let index = self.records_seen;
        self.records_seen += 1;

        let segments = self.split(index, &record.path)?;
        let Some((leaf, dirs)) = segments.split_last() else {
            return Err(invalid(index, &record.path, InvalidReason::EmptyPath));
        };

        // Walk the part of the path that already exists.
        let mut ancestors = Vec::with_capacity(segments.len());
        let mut current = ROOT;
        ancestors.push(current);
        for segment in dirs {
            let Some(id) = self.lookup(current, segment) else {
                break;
            };
            self.expect_kind(id, NodeKind::Dir)?;
            current = id;
            ancestors.push(current);
        }

        let existing_dirs = ancestors.len() - 1;
        if existing_dirs == dirs.len() {
            if let Some(id) = self.lookup(current, leaf) {
                self.expect_kind(id, NodeKind::File)?;
                debug!(path = %record.path, "duplicate file record ignored");
                return Ok(Insertion::Duplicate);
            }
        }

        for depth in existing_dirs..dirs.len() {
            let path = segments[..=depth].join("/");
            current = self.push_child(current, dirs[depth], NodeKind::Dir, path, 0);
            ancestors.push(current);
        }
        self.push_child(
            current,
            leaf,
            NodeKind::File,
            segments.join("/"),
            record.size,
        );

        for id in ancestors {
            let dir = &mut self.nodes[id.0];
            dir.size = dir.size.saturating_add(record.size);
            dir.file_count = dir.file_count.saturating_add(1);
        }
        Ok(Insertion::Created)
    }

    /// Release the finished tree.
    pub fn finish(self) -> TreeNode {
        // Children always have higher ids than their parent, so a reverse
        // sweep sees every subtree complete before its parent.
        let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(self.nodes.len());
        built.resize_with(self.nodes.len(), || None);
        for (i, slot) in self.nodes.into_iter().enumerate().rev() {
            let children = match slot.kind {
                NodeKind::File => None,
                NodeKind::Dir => Some(
                    slot.children
                        .iter()
                        .filter_map(|c| built[c.0].take())
                        .collect(),
                ),
            };
            built[i] = Some(TreeNode {
                name: slot.name,
                kind: slot.kind,
                path: slot.path,
                size: slot.size,
                file_count: slot.file_count,
                children,
            });
        }
        built[ROOT.0].take().unwrap_or_else(empty_root)
    }

    fn split<'a>(&self, index: usize, path: &'a str) -> Result<Vec<&'a str>, BuildError> {
        if path.trim_matches('/').is_empty() {
            return Err(invalid(index, path, InvalidReason::EmptyPath));
        }
        let parts = path.split('/');
        match self.options.empty_segments {
            EmptySegments::Keep => Ok(parts.collect()),
            EmptySegments::Collapse => Ok(parts.filter(|s| !s.is_empty()).collect()),
            EmptySegments::Reject => {
                let parts: Vec<&str> = parts.collect();
                if parts.iter().any(|s| s.is_empty()) {
                    return Err(invalid(index, path, InvalidReason::EmptySegment));
                }
                Ok(parts)
            }
        }
    }

    fn lookup(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0].by_name.get(name).copied()
    }

    fn expect_kind(&self, id: NodeId, expected: NodeKind) -> Result<(), BuildError> {
        let node = &self.nodes[id.0];
        if node.kind == expected {
            return Ok(());
        }
        warn!(path = %node.path, %expected, found = %node.kind, "structural conflict");
        Err(BuildError::StructuralConflict {
            path: node.path.clone(),
            expected,
            found: node.kind,
        })
    }

    fn push_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        path: String,
        size: u64,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!(%path, %kind, "node created");
        self.nodes.push(Slot::new(name, kind, path, size));
        let parent = &mut self.nodes[parent.0];
        parent.children.push(id);
        parent.by_name.insert(name.to_string(), id);
        id
    }
}

fn invalid(index: usize, path: &str, reason: InvalidReason) -> BuildError {
    BuildError::InvalidRecord {
        index,
        path: path.to_string(),
        reason,
    }
}

fn empty_root() -> TreeNode {
    TreeNode {
        name: ROOT_NAME.to_string(),
        kind: NodeKind::Dir,
        path: ROOT_PATH.to_string(),
        size: 0,
        file_count: 0,
        children: Some(Vec::new()),
    }
}

/// Build a tree from records with default options.
pub fn build_tree<I>(records: I) -> Result<TreeNode, BuildError>
where
    I: IntoIterator,
    I::Item: Borrow<FileRecord>,
{
    build_tree_with(records, BuildOptions::default())
}

/// Build a tree from records. Fails on the first bad record; no partial tree
/// is returned.
pub fn build_tree_with<I>(records: I, options: BuildOptions) -> Result<TreeNode, BuildError>
where
    I: IntoIterator,
    I::Item: Borrow<FileRecord>,
{
    let mut builder = PathTreeBuilder::with_options(options);
    let mut duplicates = 0usize;
    for record in records {
        if builder.insert(record.borrow())? == Insertion::Duplicate {
            duplicates += 1;
        }
    }
    let records = builder.records_seen;
    let root = builder.finish();
    debug!(
        records,
        duplicates,
        files = root.file_count,
        bytes = root.size,
        "tree built"
    );
    Ok(root)
}
