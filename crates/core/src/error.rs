use crate::model::NodeKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("path is empty")]
    EmptyPath,
    #[error("path contains an empty segment")]
    EmptySegment,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("structural conflict at '{path}': expected a {expected}, found a {found}")]
    StructuralConflict {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },
    #[error("invalid record #{index} ('{path}'): {reason}")]
    InvalidRecord {
        index: usize,
        path: String,
        reason: InvalidReason,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot scan '{path}': {source}", path = .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("scan cancelled")]
    Cancelled,
    #[error("scan failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Build(#[from] BuildError),
}
