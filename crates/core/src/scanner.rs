use crossbeam_channel::Sender;
use ignore::{WalkBuilder, WalkState};
use parking_lot::Mutex;
use std::{
    path::{Component, Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::sleep,
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::builder::build_tree;
use crate::error::{BuildError, ScanError};
use crate::model::{FileRecord, TreeNode};
use crate::progress::Progress;

#[derive(Debug, Clone)]
pub enum ScanMsg {
    Progress(Progress),
    File { path: String, bytes: u64 },
    /// A walk error for one entry; the scan carries on.
    Error(String),
    Done(Box<TreeNode>),
    Failed(BuildError),
    Cancelled,
}

pub struct Scanner {
    cancel: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(cancel: Arc<AtomicBool>, paused: Arc<AtomicBool>) -> Self {
        Self { cancel, paused }
    }

    /// Walk `root` and send the resulting tree. Record paths start with the
    /// root directory's own name, the way a directory upload reports them.
    pub fn scan(&self, root: PathBuf, tx: Sender<ScanMsg>) {
        let cancel = self.cancel.clone();
        let paused = self.paused.clone();

        let discovered = Arc::new(AtomicU64::new(0));
        let scanned = Arc::new(AtomicU64::new(0));
        let bytes = Arc::new(Mutex::new(0u64));
        let records: Arc<Mutex<Vec<FileRecord>>> =
            Arc::new(Mutex::new(Vec::with_capacity(4096)));

        let prefix = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        info!(root = %root.display(), "scan started");

        let mut builder = WalkBuilder::new(&root);
        builder
            .hidden(false)
            .git_global(false)
            .follow_links(false)
            .threads(num_cpus::get());

        let walker = builder.build_parallel();
        walker.run(|| {
            let paused = paused.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();
            let discovered = discovered.clone();
            let scanned = scanned.clone();
            let bytes = bytes.clone();
            let records = records.clone();
            let root = root.as_path();
            let prefix = prefix.as_deref();
            Box::new(move |entry| {
                while paused.load(Ordering::Relaxed) {
                    if cancel.load(Ordering::Relaxed) {
                        return WalkState::Quit;
                    }
                    sleep(Duration::from_millis(40));
                }
                if cancel.load(Ordering::Relaxed) {
                    return WalkState::Quit;
                }
                let ent = match entry {
                    Ok(ent) => ent,
                    Err(e) => {
                        warn!(error = %e, "walk error");
                        let _ = tx.send(ScanMsg::Error(e.to_string()));
                        return WalkState::Continue;
                    }
                };
                if !ent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    return WalkState::Continue;
                }
                discovered.fetch_add(1, Ordering::Relaxed);
                let Some(path) = record_path(root, prefix, ent.path()) else {
                    return WalkState::Continue;
                };
                let sz = match ent.metadata() {
                    Ok(md) => md.len(),
                    Err(e) => {
                        // Counted, but left out of the tree.
                        debug!(path = %path, error = %e, "metadata unavailable");
                        scanned.fetch_add(1, Ordering::Relaxed);
                        let _ = tx.send(ScanMsg::Progress(Progress {
                            files: scanned.load(Ordering::Relaxed),
                            discovered: discovered.load(Ordering::Relaxed),
                            bytes: *bytes.lock(),
                        }));
                        return WalkState::Continue;
                    }
                };
                scanned.fetch_add(1, Ordering::Relaxed);
                {
                    let mut b = bytes.lock();
                    *b = b.saturating_add(sz);
                    let _ = tx.send(ScanMsg::Progress(Progress {
                        files: scanned.load(Ordering::Relaxed),
                        discovered: discovered.load(Ordering::Relaxed),
                        bytes: *b,
                    }));
                }
                let _ = tx.send(ScanMsg::File {
                    path: path.clone(),
                    bytes: sz,
                });
                records.lock().push(FileRecord::new(path, sz));
                WalkState::Continue
            })
        });

        if cancel.load(Ordering::Relaxed) {
            info!("scan cancelled");
            let _ = tx.send(ScanMsg::Cancelled);
            return;
        }

        let mut records = std::mem::take(&mut *records.lock());
        // Walker threads interleave; sort so the tree does not. Segment-wise,
        // so `a/x` sorts before `a-b`.
        records.sort_by(|a, b| a.path.split('/').cmp(b.path.split('/')));
        match build_tree(&records) {
            Ok(tree) => {
                info!(files = tree.file_count, bytes = tree.size, "scan finished");
                let _ = tx.send(ScanMsg::Done(Box::new(tree)));
            }
            Err(e) => {
                warn!(error = %e, "tree build failed");
                let _ = tx.send(ScanMsg::Failed(e));
            }
        }
    }
}

/// Slash-joined record path of `path` relative to `root`, prefixed with the
/// root's name when it has one. `None` for the root itself.
fn record_path(root: &Path, prefix: Option<&str>, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = prefix.map(str::to_string).into_iter().collect();
    segments.extend(rel.components().filter_map(|c| match c {
        Component::Normal(s) => Some(match s.to_str() {
            Some(name) => name.to_string(),
            None => {
                // Two such names can collapse into one record.
                let lossy = s.to_string_lossy().into_owned();
                warn!(path = %path.display(), segment = %lossy, "non-UTF-8 name replaced");
                lossy
            }
        }),
        _ => None,
    }));
    if segments.len() == usize::from(prefix.is_some()) {
        return None;
    }
    Some(segments.join("/"))
}

/// Scan `root` on a worker thread and wait for the tree.
pub fn scan_dir(root: impl AsRef<Path>) -> Result<TreeNode, ScanError> {
    let root = root.as_ref().to_path_buf();
    let md = std::fs::metadata(&root).map_err(|source| ScanError::Root {
        path: root.clone(),
        source,
    })?;
    if !md.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(
        Arc::new(AtomicBool::new(false)),
        Arc::new(AtomicBool::new(false)),
    );
    std::thread::spawn(move || scanner.scan(root, tx));

    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::Done(tree) => return Ok(*tree),
            ScanMsg::Failed(e) => return Err(e.into()),
            ScanMsg::Cancelled => return Err(ScanError::Cancelled),
            _ => {}
        }
    }
    Err(ScanError::Failed("scanner stopped without a result".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_prefixes_root_name() {
        let root = Path::new("/data/project");
        let path = root.join("src").join("lib.rs");
        assert_eq!(
            record_path(root, Some("project"), &path).as_deref(),
            Some("project/src/lib.rs")
        );
        assert_eq!(
            record_path(root, None, &path).as_deref(),
            Some("src/lib.rs")
        );
    }

    #[test]
    fn test_record_path_skips_root_and_outsiders() {
        let root = Path::new("/data/project");
        assert!(record_path(root, Some("project"), root).is_none());
        assert!(record_path(root, None, root).is_none());
        assert!(record_path(root, None, Path::new("/elsewhere/x")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_record_path_replaces_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/data");
        let path = root.join(OsStr::from_bytes(b"bad\xffname"));
        assert_eq!(
            record_path(root, None, &path).as_deref(),
            Some("bad\u{fffd}name")
        );
    }

    #[test]
    fn test_scan_dir_rejects_missing_root() {
        let err = scan_dir("/definitely/not/here/filetree").unwrap_err();
        assert!(matches!(err, ScanError::Root { .. }));
    }
}
