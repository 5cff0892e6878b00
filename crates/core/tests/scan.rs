//! Scanner tests against real directories

use filetree_core::{scan_dir, NodeKind, ScanError, ScanMsg, Scanner};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn populated_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("one.txt"), b"1").unwrap();
    fs::write(root.join("sub/two.txt"), b"22").unwrap();
    temp
}

#[test]
fn test_scan_builds_tree_under_root_name() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    fs::create_dir_all(root.join("src/utils")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("src/index.ts"), vec![b'a'; 120]).unwrap();
    fs::write(root.join("src/utils/helper.ts"), vec![b'b'; 80]).unwrap();
    fs::write(root.join("README.md"), vec![b'c'; 30]).unwrap();
    fs::write(root.join(".hidden"), b"hi").unwrap();

    let tree = scan_dir(&root).unwrap();
    assert_eq!(tree.size, 232);
    assert_eq!(tree.file_count, 4);

    let project = tree.child("project").unwrap();
    assert_eq!(project.kind, NodeKind::Dir);
    assert_eq!(project.size, 232);
    assert_eq!(tree.find("project/src").unwrap().size, 200);
    assert_eq!(tree.find("project/src/utils/helper.ts").unwrap().size, 80);
    assert!(tree.find("project/.hidden").is_some());
    // Only files become records, so empty directories do not appear.
    assert!(tree.find("project/empty").is_none());
}

#[test]
fn test_scan_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    for dir in ["b", "a", "c"] {
        fs::create_dir_all(root.join(dir)).unwrap();
        for file in ["2.txt", "1.txt"] {
            fs::write(root.join(dir).join(file), dir.as_bytes()).unwrap();
        }
    }
    let first = scan_dir(&root).unwrap();
    let second = scan_dir(&root).unwrap();
    assert_eq!(first, second);

    let data = first.child("data").unwrap();
    let names: Vec<&str> = data.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_scan_rejects_file_root() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();
    assert!(matches!(scan_dir(&file), Err(ScanError::NotADirectory(_))));
}

#[test]
fn test_scan_siblings_sorted_by_segment() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    fs::create_dir_all(root.join("a")).unwrap();
    fs::write(root.join("a-b"), b"x").unwrap();
    fs::write(root.join("a/c"), b"y").unwrap();
    fs::write(root.join("a.txt"), b"z").unwrap();

    let tree = scan_dir(&root).unwrap();
    let data = tree.child("data").unwrap();
    let names: Vec<&str> = data.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "a-b", "a.txt"]);
}

#[test]
fn test_scan_with_cancel_set_sends_only_cancelled() {
    let temp = populated_dir();
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(
        Arc::new(AtomicBool::new(true)),
        Arc::new(AtomicBool::new(false)),
    );
    scanner.scan(temp.path().join("data"), tx);

    let msgs: Vec<ScanMsg> = rx.try_iter().collect();
    assert!(matches!(msgs.last(), Some(ScanMsg::Cancelled)));
    assert!(!msgs.iter().any(|m| matches!(m, ScanMsg::Done(_))));
    assert!(!msgs.iter().any(|m| matches!(m, ScanMsg::File { .. })));
}

#[test]
fn test_paused_scan_exits_when_cancelled() {
    let temp = populated_dir();
    let cancel = Arc::new(AtomicBool::new(false));
    let paused = Arc::new(AtomicBool::new(true));
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(cancel.clone(), paused);
    let root = temp.path().join("data");
    let handle = thread::spawn(move || scanner.scan(root, tx));

    thread::sleep(Duration::from_millis(150));
    assert!(!handle.is_finished());
    cancel.store(true, Ordering::Relaxed);
    handle.join().unwrap();

    let msgs: Vec<ScanMsg> = rx.try_iter().collect();
    assert!(matches!(msgs.last(), Some(ScanMsg::Cancelled)));
    assert!(!msgs.iter().any(|m| matches!(m, ScanMsg::Done(_))));
}
