//! Contract tests run against every `RawStorage` driver.
//!
//! `MemoryStorage` is the double the filesystem layer is tested with, so it
//! must behave like the on-disk driver in every way the layer relies on.

use platform::{LocalFileStorage, MemoryStorage, RawEntry, RawStorage, StorageError};
use tempfile::TempDir;

/// Volume layout shared by both drivers:
///
/// ```text
/// music/a.wav      "RIFF....WAVE"
/// music/live/      (empty)
/// notes.txt        "hello world"
/// ```
fn memory() -> MemoryStorage {
    MemoryStorage::new()
        .with_file("music/a.wav", b"RIFF\0\0\0\0WAVE".to_vec())
        .with_dir("music/live")
        .with_file("notes.txt", b"hello world".to_vec())
}

fn local() -> (TempDir, LocalFileStorage) {
    let tmp = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join("music/live")).expect("mkdir");
    std::fs::write(tmp.path().join("music/a.wav"), b"RIFF\0\0\0\0WAVE").expect("write");
    std::fs::write(tmp.path().join("notes.txt"), b"hello world").expect("write");
    let storage = LocalFileStorage::new(tmp.path());
    (tmp, storage)
}

fn read_all(storage: &mut dyn RawStorage, path: &str) -> Vec<u8> {
    storage.activate(path).expect("activate");
    let mut out = Vec::new();
    let mut buf = [0u8; 4];
    let mut offset = 0u64;
    loop {
        let n = storage.read_at(offset, &mut buf).expect("read_at");
        if n == 0 {
            return out;
        }
        out.extend_from_slice(buf.get(..n).expect("n <= len"));
        offset = offset.saturating_add(u64::try_from(n).expect("fits"));
    }
}

fn check_positional_reads(storage: &mut dyn RawStorage) {
    assert_eq!(read_all(storage, "notes.txt"), b"hello world");
    assert_eq!(storage.position().expect("position"), 0);
    let mut buf = [0u8; 8];
    assert_eq!(storage.read_at(11, &mut buf).expect("eof read"), 0);
}

fn check_write_position(storage: &mut dyn RawStorage) {
    storage.activate("notes.txt").expect("activate");
    storage.seek(6).expect("seek");
    storage.write(b"W").expect("write");
    assert_eq!(storage.position().expect("position"), 7);
    storage.append(b"!").expect("append");
    assert_eq!(storage.position().expect("position"), 7);
    assert_eq!(read_all(storage, "notes.txt"), b"hello World!");
}

fn check_activation_resets_position(storage: &mut dyn RawStorage) {
    storage.activate("notes.txt").expect("activate");
    storage.seek(5).expect("seek");
    storage.activate("music/a.wav").expect("activate");
    assert_eq!(storage.position().expect("position"), 0);
}

fn check_failed_activation_clears_active(storage: &mut dyn RawStorage) {
    storage.activate("notes.txt").expect("activate");
    assert!(matches!(storage.activate("missing.bin"), Err(StorageError::NotFound(_))));
    assert!(matches!(storage.write(b"x"), Err(StorageError::NoActiveFile)));
    assert!(matches!(storage.activate("music"), Err(StorageError::IsADirectory(_))));
    assert!(matches!(storage.position(), Err(StorageError::NoActiveFile)));
}

fn check_listing(storage: &mut dyn RawStorage) {
    let mut music = storage.list("music").expect("list");
    music.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(
        music,
        vec![RawEntry::file("music/a.wav", 12), RawEntry::directory("music/live")]
    );
    let mut root = storage.list("/").expect("list root");
    root.sort_by(|a, b| a.path.cmp(&b.path));
    let paths: Vec<&str> = root.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["music", "notes.txt"]);
    assert!(storage.list("music/live").expect("empty dir").is_empty());
    assert!(matches!(storage.list("notes.txt"), Err(StorageError::NotADirectory(_))));
    assert!(matches!(storage.list("nope"), Err(StorageError::NotFound(_))));
}

fn check_stat(storage: &mut dyn RawStorage) {
    assert_eq!(storage.stat("/notes.txt/").expect("stat"), RawEntry::file("notes.txt", 11));
    assert_eq!(storage.stat("music").expect("stat"), RawEntry::directory("music"));
    assert!(matches!(storage.stat("nope"), Err(StorageError::NotFound(_))));
}

fn check_create_and_delete(storage: &mut dyn RawStorage) {
    storage.create_file("music/new.bin", 3).expect("create");
    assert!(storage.exists("music/new.bin").expect("exists"));
    assert_eq!(read_all(storage, "music/new.bin"), [0, 0, 0]);
    assert!(matches!(
        storage.create_file("music/new.bin", 0),
        Err(StorageError::AlreadyExists(_))
    ));
    storage.delete_file("music/new.bin").expect("delete");
    assert!(!storage.exists("music/new.bin").expect("exists"));
    assert!(matches!(storage.position(), Err(StorageError::NoActiveFile)));
    assert!(matches!(storage.delete_file("music/new.bin"), Err(StorageError::NotFound(_))));
}

fn check_escape_rejected(storage: &mut dyn RawStorage) {
    assert!(matches!(storage.activate("../x"), Err(StorageError::InvalidPath(_))));
    assert!(matches!(storage.list("music/../.."), Err(StorageError::InvalidPath(_))));
    assert!(matches!(storage.create_file("../x", 0), Err(StorageError::InvalidPath(_))));
}

const CHECKS: &[(&str, fn(&mut dyn RawStorage))] = &[
    ("positional_reads", check_positional_reads),
    ("write_position", check_write_position),
    ("activation_resets_position", check_activation_resets_position),
    ("failed_activation_clears_active", check_failed_activation_clears_active),
    ("listing", check_listing),
    ("stat", check_stat),
    ("create_and_delete", check_create_and_delete),
    ("escape_rejected", check_escape_rejected),
];

#[test]
fn memory_storage_meets_contract() {
    for (name, check) in CHECKS {
        eprintln!("memory: {name}");
        check(&mut memory());
    }
}

#[test]
fn local_storage_meets_contract() {
    for (name, check) in CHECKS {
        eprintln!("local: {name}");
        let (_tmp, mut storage) = local();
        check(&mut storage);
    }
}
