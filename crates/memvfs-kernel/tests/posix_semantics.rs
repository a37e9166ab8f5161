//! POSIX-behaviour tests for the in-memory engine.
//!
//! These drive [`MemoryFs`] only through the [`VfsOps`] trait, the same
//! surface a mount adapter uses.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use memvfs_kernel::{MemoryFs, VfsError, VfsOps};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("memvfs_kernel=debug")
        .try_init();
}

fn p(path: &str) -> &Path {
    Path::new(path)
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn write_then_read_back_at_any_offset() {
    init_tracing();
    let fs = MemoryFs::new();
    let cases: &[(&[u8], u64)] = &[
        (b"", 0),
        (b"a", 0),
        (b"hello", 3),
        (b"\0\xff\x10binary", 4096),
        (&[0x5a; 300], 17),
    ];

    for (i, (bytes, offset)) in cases.iter().enumerate() {
        let path = format!("/case-{i}");
        fs.create(p(&path), 0o644).unwrap();
        let written = fs.write(p(&path), *offset, bytes).unwrap();
        assert_eq!(written as usize, bytes.len());

        let back = fs.read(p(&path), *offset, bytes.len() as u32).unwrap();
        assert_eq!(&back, bytes, "case {i}");
    }
}

#[test]
fn gap_before_write_is_zero_filled() {
    let fs = MemoryFs::new();
    fs.create(p("/gap"), 0o644).unwrap();
    fs.write(p("/gap"), 0, b"abc").unwrap();
    fs.write(p("/gap"), 10, b"z").unwrap();

    let data = fs.read_all(p("/gap")).unwrap();
    assert_eq!(data.len(), 11);
    assert!(data[3..10].iter().all(|&b| b == 0));
    assert_eq!(fs.getattr(p("/gap")).unwrap().size, 11);
}

#[test]
fn truncate_to_current_size_is_a_no_op() {
    let fs = MemoryFs::new();
    fs.create(p("/t"), 0o644).unwrap();
    fs.write(p("/t"), 0, b"stable").unwrap();

    fs.truncate(p("/t"), 6).unwrap();
    assert_eq!(fs.read_all(p("/t")).unwrap(), b"stable");

    fs.truncate(p("/t"), 0).unwrap();
    fs.write(p("/t"), 0, b"new").unwrap();
    assert_eq!(fs.read_all(p("/t")).unwrap(), b"new");
    assert_eq!(fs.getattr(p("/t")).unwrap().size, 3);
}

#[test]
fn size_tracks_content_after_every_mutation() {
    let fs = MemoryFs::new();
    fs.create(p("/s"), 0o644).unwrap();

    let check = |expected: u64| {
        let attr = fs.getattr(p("/s")).unwrap();
        let data = fs.read(p("/s"), 0, u32::MAX).unwrap();
        assert_eq!(attr.size, expected);
        assert_eq!(data.len() as u64, expected);
    };

    check(0);
    fs.write(p("/s"), 0, b"12345").unwrap();
    check(5);
    fs.write(p("/s"), 1, b"x").unwrap();
    check(5);
    fs.write(p("/s"), 8, b"yy").unwrap();
    check(10);
    fs.truncate(p("/s"), 2).unwrap();
    check(2);
    fs.truncate(p("/s"), 4).unwrap();
    check(4);
}

#[test]
fn read_past_end_is_empty_not_an_error() {
    let fs = MemoryFs::new();
    fs.create(p("/short"), 0o644).unwrap();
    fs.write(p("/short"), 0, b"abc").unwrap();

    assert_eq!(fs.read(p("/short"), 3, 10).unwrap(), b"");
    assert_eq!(fs.read(p("/short"), 1_000_000, 10).unwrap(), b"");
    assert_eq!(fs.read(p("/short"), 2, 10).unwrap(), b"c");
}

// ============================================================================
// Directories
// ============================================================================

#[test]
fn directory_emptiness_guard() {
    let fs = MemoryFs::new();
    fs.mkdir(p("/d"), 0o755).unwrap();
    fs.mkdir(p("/d/child"), 0o755).unwrap();

    assert!(matches!(
        fs.rmdir(p("/d")).unwrap_err(),
        VfsError::DirectoryNotEmpty(_)
    ));
    fs.rmdir(p("/d/child")).unwrap();
    fs.rmdir(p("/d")).unwrap();

    fs.mkdir(p("/e"), 0o755).unwrap();
    fs.create(p("/e/file"), 0o644).unwrap();
    assert!(matches!(
        fs.rmdir(p("/e")).unwrap_err(),
        VfsError::DirectoryNotEmpty(_)
    ));
    fs.unlink(p("/e/file")).unwrap();
    fs.rmdir(p("/e")).unwrap();
}

#[test]
fn link_counts_follow_child_directories() {
    let fs = MemoryFs::new();
    fs.mkdir(p("/parent"), 0o755).unwrap();
    let before = fs.getattr(p("/parent")).unwrap().nlink;

    const N: u32 = 7;
    for i in 0..N {
        fs.mkdir(p(&format!("/parent/sub{i}")), 0o755).unwrap();
    }
    // Files do not add links
    fs.create(p("/parent/file"), 0o644).unwrap();
    assert_eq!(fs.getattr(p("/parent")).unwrap().nlink, before + N);

    for i in 0..N {
        fs.rmdir(p(&format!("/parent/sub{i}"))).unwrap();
    }
    assert_eq!(fs.getattr(p("/parent")).unwrap().nlink, before);
}

#[test]
fn listing_is_shallow() {
    let fs = MemoryFs::new();
    fs.mkdir(p("/top"), 0o755).unwrap();
    fs.mkdir(p("/top/mid"), 0o755).unwrap();
    fs.create(p("/top/mid/leaf.txt"), 0o644).unwrap();
    fs.create(p("/top/a.txt"), 0o644).unwrap();

    let mut names: Vec<String> = fs
        .readdir(p("/top"))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, vec![".", "..", "a.txt", "mid"]);
}

// ============================================================================
// Rename
// ============================================================================

#[test]
fn rename_of_missing_path_leaves_destination() {
    let fs = MemoryFs::new();
    fs.create(p("/dest"), 0o644).unwrap();
    fs.write(p("/dest"), 0, b"original").unwrap();
    let before = fs.getattr(p("/dest")).unwrap();

    let err = fs.rename(p("/nonexistent"), p("/dest")).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fs.getattr(p("/dest")).unwrap(), before);
    assert_eq!(fs.read_all(p("/dest")).unwrap(), b"original");
}

#[test]
fn rename_carries_content_and_attributes() {
    let fs = MemoryFs::new();
    fs.mkdir(p("/from"), 0o755).unwrap();
    fs.mkdir(p("/to"), 0o755).unwrap();
    fs.create(p("/from/doc"), 0o600).unwrap();
    fs.write(p("/from/doc"), 0, b"payload").unwrap();
    fs.chown(p("/from/doc"), Some(42), Some(43)).unwrap();

    fs.rename(p("/from/doc"), p("/to/doc2")).unwrap();

    let attr = fs.getattr(p("/to/doc2")).unwrap();
    assert_eq!(attr.perm, 0o600);
    assert_eq!((attr.uid, attr.gid), (Some(42), Some(43)));
    assert_eq!(fs.read_all(p("/to/doc2")).unwrap(), b"payload");
    assert!(fs.read(p("/from/doc"), 0, 1).unwrap_err().is_not_found());

    // Moving a file between directories leaves their link counts alone
    assert_eq!(fs.getattr(p("/from")).unwrap().nlink, 2);
    assert_eq!(fs.getattr(p("/to")).unwrap().nlink, 2);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_hello() {
    let fs = MemoryFs::new();
    fs.mkdir(p("/a"), 0o755).unwrap();
    fs.create(p("/a/b.txt"), 0o644).unwrap();
    fs.write(p("/a/b.txt"), 0, b"hello").unwrap();

    assert_eq!(fs.read(p("/a/b.txt"), 0, 5).unwrap(), b"hello");
    assert_eq!(fs.getattr(p("/a/b.txt")).unwrap().size, 5);
    assert!(
        fs.readdir(p("/a"))
            .unwrap()
            .iter()
            .any(|e| e.name == "b.txt" && e.kind.is_file())
    );

    fs.write(p("/a/b.txt"), 0, b"hello").unwrap();
    fs.write(p("/a/b.txt"), 7, b"XY").unwrap();
    assert_eq!(fs.read_all(p("/a/b.txt")).unwrap(), b"hello\0\0XY");
    assert_eq!(fs.getattr(p("/a/b.txt")).unwrap().size, 9);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_mkdir_keeps_link_count_exact() {
    init_tracing();
    let fs = Arc::new(MemoryFs::new());
    fs.mkdir(p("/shared"), 0o755).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                for i in 0..25 {
                    let dir = format!("/shared/t{t}-{i}");
                    fs.mkdir(Path::new(&dir), 0o755).unwrap();
                    let file = format!("{dir}/f");
                    fs.create(Path::new(&file), 0o644).unwrap();
                    fs.write(Path::new(&file), 0, dir.as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(fs.getattr(p("/shared")).unwrap().nlink, 2 + 8 * 25);
    assert_eq!(fs.readdir(p("/shared")).unwrap().len(), 2 + 8 * 25);
    assert_eq!(fs.read_all(p("/shared/t3-7/f")).unwrap(), b"/shared/t3-7");
    assert_eq!(fs.handles_issued(), 8 * 25);
}

#[test]
fn concurrent_renames_never_lose_files() {
    let fs = Arc::new(MemoryFs::new());
    fs.mkdir(p("/left"), 0o755).unwrap();
    fs.mkdir(p("/right"), 0o755).unwrap();
    for i in 0..50 {
        fs.write_all(p(&format!("/left/{i}")), format!("{i}").as_bytes())
            .unwrap();
    }

    let movers: Vec<_> = (0..2)
        .map(|half| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                for i in (half * 25)..(half * 25 + 25) {
                    fs.rename(
                        Path::new(&format!("/left/{i}")),
                        Path::new(&format!("/right/{i}")),
                    )
                    .unwrap();
                }
            })
        })
        .collect();
    for mover in movers {
        mover.join().unwrap();
    }

    assert_eq!(fs.readdir(p("/left")).unwrap().len(), 2);
    assert_eq!(fs.readdir(p("/right")).unwrap().len(), 52);
    assert_eq!(fs.read_all(p("/right/31")).unwrap(), b"31");
}
