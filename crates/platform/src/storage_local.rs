//! Host-directory `RawStorage` implementation.
//!
//! `LocalFileStorage` implements [`RawStorage`] using `std::fs`. It stands in
//! for an SD card mounted on the host (or the card image used by the desktop
//! tooling). All paths are resolved relative to the root provided at
//! construction and may not escape it.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::STORAGE_ROOT_ENV;
use crate::storage::{join_path, normalize_path, RawEntry, RawStorage, Result, StorageError};

/// The file currently activated for streaming.
struct ActiveFile {
    path: String,
    inner: fs::File,
}

/// A [`RawStorage`] backed by a directory on the host filesystem.
///
/// # Example
/// ```no_run
/// use platform::storage_local::LocalFileStorage;
/// use platform::RawStorage;
///
/// let mut storage = LocalFileStorage::new("/mnt/sd");
/// storage.activate("music/track01.wav").unwrap();
/// let mut header = [0u8; 44];
/// let n = storage.read_at(0, &mut header).unwrap();
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
    active: Option<ActiveFile>,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active: None,
        }
    }

    /// Create from the `STORAGE_ROOT` environment variable.
    ///
    /// Returns `None` if the variable is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(STORAGE_ROOT_ENV).ok().map(Self::new)
    }

    /// Root directory of this volume.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf)> {
        let rel = normalize_path(path)?;
        let full = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        };
        Ok((rel.to_owned(), full))
    }

    fn active_mut(&mut self) -> Result<&mut fs::File> {
        self.active
            .as_mut()
            .map(|active| &mut active.inner)
            .ok_or(StorageError::NoActiveFile)
    }
}

/// Fill `buf` from the current file position, stopping early only at EOF.
fn read_full(file: &mut fs::File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0usize;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match file.read(rest) {
            Ok(0) => break,
            Ok(n) => filled = filled.saturating_add(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl RawStorage for LocalFileStorage {
    fn activate(&mut self, path: &str) -> Result<()> {
        // Drop the previous handle first: a failed switch leaves nothing active.
        self.active = None;
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| StorageError::from_io(e, &rel))?;
        if meta.is_dir() {
            return Err(StorageError::IsADirectory(rel));
        }
        let inner = match OpenOptions::new().read(true).write(true).open(&full) {
            Ok(file) => file,
            // Read-only media still support streaming reads.
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                fs::File::open(&full).map_err(|e| StorageError::from_io(e, &rel))?
            }
            Err(e) => return Err(StorageError::from_io(e, &rel)),
        };
        tracing::trace!(path = %rel, "activated local file");
        self.active = Some(ActiveFile { path: rel, inner });
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let file = self.active_mut()?;
        let write_pos = file.stream_position()?;
        file.seek(SeekFrom::Start(offset))?;
        let read = read_full(file, buf);
        // Reads are positional: put the write position back even if the read failed.
        file.seek(SeekFrom::Start(write_pos))?;
        Ok(read?)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let file = self.active_mut()?;
        file.write_all(data)?;
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        let file = self.active_mut()?;
        let write_pos = file.stream_position()?;
        file.seek(SeekFrom::End(0))?;
        let written = file.write_all(data);
        file.seek(SeekFrom::Start(write_pos))?;
        Ok(written?)
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        let file = self.active_mut()?;
        file.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        let file = self.active_mut()?;
        Ok(file.stream_position()?)
    }

    fn create_file(&mut self, path: &str, initial_size: u64) -> Result<()> {
        let (rel, full) = self.resolve(path)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| StorageError::from_io(e, &rel))?;
        file.set_len(initial_size)?;
        tracing::debug!(path = %rel, initial_size, "created local file");
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| StorageError::from_io(e, &rel))?;
        if meta.is_dir() {
            return Err(StorageError::IsADirectory(rel));
        }
        if self.active.as_ref().is_some_and(|active| active.path == rel) {
            self.active = None;
        }
        fs::remove_file(&full).map_err(|e| StorageError::from_io(e, &rel))?;
        tracing::debug!(path = %rel, "deleted local file");
        Ok(())
    }

    fn exists(&mut self, path: &str) -> Result<bool> {
        let (_, full) = self.resolve(path)?;
        Ok(full.exists())
    }

    fn stat(&mut self, path: &str) -> Result<RawEntry> {
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| StorageError::from_io(e, &rel))?;
        Ok(if meta.is_dir() {
            RawEntry::directory(rel)
        } else {
            RawEntry::file(rel, meta.len())
        })
    }

    fn list(&mut self, path: &str) -> Result<Vec<RawEntry>> {
        let (rel, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| StorageError::from_io(e, &rel))?;
        if !meta.is_dir() {
            return Err(StorageError::NotADirectory(rel));
        }
        let mut entries = Vec::new();
        for dirent in fs::read_dir(&full)? {
            let dirent = dirent?;
            let Some(name) = dirent.file_name().to_str().map(str::to_owned) else {
                tracing::warn!(dir = %rel, "skipping entry with non UTF-8 name");
                continue;
            };
            let meta = dirent.metadata()?;
            let child = join_path(&rel, &name);
            entries.push(if meta.is_dir() {
                RawEntry::directory(child)
            } else {
                RawEntry::file(child, meta.len())
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn storage_with(files: &[(&str, &[u8])]) -> (TempDir, LocalFileStorage) {
        let tmp = TempDir::new().unwrap();
        for (name, contents) in files {
            let full = tmp.path().join(name);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, contents).unwrap();
        }
        let storage = LocalFileStorage::new(tmp.path());
        (tmp, storage)
    }

    #[test]
    fn local_storage_read_full_file() {
        let (_tmp, mut storage) = storage_with(&[("test.bin", b"hello world".as_slice())]);
        storage.activate("test.bin").unwrap();
        let mut buf = [0u8; 11];
        let n = storage.read_at(0, &mut buf).unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn local_storage_short_read_at_eof() {
        let (_tmp, mut storage) = storage_with(&[("short.bin", b"ABCDEFGH".as_slice())]);
        storage.activate("short.bin").unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(storage.read_at(4, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"EFGH");
        assert_eq!(storage.read_at(100, &mut buf).unwrap(), 0);
    }

    #[test]
    fn local_storage_read_does_not_move_write_position() {
        let (_tmp, mut storage) = storage_with(&[("pos.bin", b"ABCDEFGH".as_slice())]);
        storage.activate("pos.bin").unwrap();
        storage.seek(2).unwrap();
        let mut buf = [0u8; 4];
        storage.read_at(4, &mut buf).unwrap();
        assert_eq!(storage.position().unwrap(), 2);
        storage.write(b"zz").unwrap();
        let mut all = [0u8; 8];
        storage.read_at(0, &mut all).unwrap();
        assert_eq!(&all, b"ABzzEFGH");
    }

    #[test]
    fn local_storage_append_keeps_write_position() {
        let (tmp, mut storage) = storage_with(&[("log.txt", b"one".as_slice())]);
        storage.activate("log.txt").unwrap();
        storage.append(b"two").unwrap();
        assert_eq!(storage.position().unwrap(), 0);
        assert_eq!(fs::read(tmp.path().join("log.txt")).unwrap(), b"onetwo");
    }

    #[test]
    fn local_storage_create_zero_filled() {
        let (tmp, mut storage) = storage_with(&[]);
        storage.create_file("blank.bin", 32).unwrap();
        assert_eq!(fs::read(tmp.path().join("blank.bin")).unwrap(), vec![0u8; 32]);
        assert!(matches!(
            storage.create_file("blank.bin", 0),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn local_storage_delete_deactivates() {
        let (_tmp, mut storage) = storage_with(&[("gone.bin", b"x".as_slice())]);
        storage.activate("gone.bin").unwrap();
        storage.delete_file("gone.bin").unwrap();
        assert!(!storage.exists("gone.bin").unwrap());
        assert!(matches!(storage.position(), Err(StorageError::NoActiveFile)));
    }

    #[test]
    fn local_storage_list_is_relative_to_root() {
        let (_tmp, mut storage) = storage_with(&[
            ("music/a.wav", b"RIFF".as_slice()),
            ("music/live/b.wav", b"RIFF".as_slice()),
        ]);
        let mut entries = storage.list("/music").unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            entries,
            vec![RawEntry::file("music/a.wav", 4), RawEntry::directory("music/live")]
        );
    }

    #[test]
    fn local_storage_list_file_is_not_a_directory() {
        let (_tmp, mut storage) = storage_with(&[("a.wav", b"RIFF".as_slice())]);
        assert!(matches!(
            storage.list("a.wav"),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn local_storage_failed_activation_clears_active() {
        let (_tmp, mut storage) = storage_with(&[("a.bin", b"x".as_slice())]);
        storage.activate("a.bin").unwrap();
        assert!(matches!(
            storage.activate("missing.bin"),
            Err(StorageError::NotFound(_))
        ));
        let mut buf = [0u8; 1];
        assert!(matches!(
            storage.read_at(0, &mut buf),
            Err(StorageError::NoActiveFile)
        ));
    }

    #[test]
    fn local_storage_rejects_escape() {
        let (_tmp, mut storage) = storage_with(&[]);
        assert!(matches!(
            storage.stat("../outside"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
