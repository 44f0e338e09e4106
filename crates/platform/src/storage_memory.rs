//! In-memory `RawStorage` implementation.
//!
//! `MemoryStorage` keeps the whole volume in RAM. It is the test double for
//! every layer above the driver and doubles as a scratch RAM disk mounted by
//! configuration (`"memory": true`).
//!
//! The volume has a fixed byte capacity. Growing a file past it fails with
//! [`StorageError::NoSpace`] and allocation failures surface as
//! [`StorageError::Io`] with [`std::io::ErrorKind::OutOfMemory`]; neither
//! aborts the process.

use std::collections::{BTreeMap, BTreeSet, TryReserveError};
use std::io;

use crate::config::DEFAULT_RAM_CAPACITY;
use crate::storage::{normalize_path, parent_path, RawEntry, RawStorage, Result, StorageError};

/// A [`RawStorage`] volume held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    active: Option<String>,
    write_pos: u64,
    activations: usize,
    capacity: u64,
}

impl MemoryStorage {
    /// Create an empty volume (only the root directory exists) of
    /// [`DEFAULT_RAM_CAPACITY`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RAM_CAPACITY)
    }

    /// Create an empty volume that holds at most `capacity` bytes of file data.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(String::new());
        Self {
            files: BTreeMap::new(),
            dirs,
            active: None,
            write_pos: 0,
            activations: 0,
            capacity,
        }
    }

    /// Builder: add a file, creating any missing parent directories.
    ///
    /// Invalid paths (escaping the root) are ignored. Fixture contents count
    /// towards [`used_bytes`](Self::used_bytes) but are not checked against
    /// the capacity.
    #[must_use]
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        if let Ok(rel) = normalize_path(path) {
            self.create_parents(rel);
            self.files.insert(rel.to_owned(), contents.into());
        }
        self
    }

    /// Builder: add an (empty) directory and its parents.
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        if let Ok(rel) = normalize_path(path) {
            self.create_parents(rel);
            self.dirs.insert(rel.to_owned());
        }
        self
    }

    /// Contents of a file, for assertions.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        let rel = normalize_path(path).ok()?;
        self.files.get(rel).map(Vec::as_slice)
    }

    /// Path of the active file, if any.
    #[must_use]
    pub fn active_path(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Capacity of the volume in bytes.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes of file data currently stored.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.files
            .values()
            .fold(0u64, |used, data| used.saturating_add(byte_len(data)))
    }

    /// Number of successful [`RawStorage::activate`] calls so far.
    #[must_use]
    pub fn activation_count(&self) -> usize {
        self.activations
    }

    fn create_parents(&mut self, rel: &str) {
        let mut parent = parent_path(rel);
        while !parent.is_empty() {
            self.dirs.insert(parent.to_owned());
            parent = parent_path(parent);
        }
    }

    /// Check that a file of `current` bytes may grow to `target` bytes.
    fn ensure_room(&self, current: u64, target: u64) -> Result<()> {
        let requested = target.saturating_sub(current);
        let available = self.capacity.saturating_sub(self.used_bytes());
        if requested > available {
            return Err(StorageError::NoSpace {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn active_data(&mut self) -> Result<&mut Vec<u8>> {
        let path = self.active.as_deref().ok_or(StorageError::NoActiveFile)?;
        self.files
            .get_mut(path)
            .ok_or_else(|| StorageError::NotFound(path.to_owned()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a byte offset into a buffer index, saturating on 32-bit targets.
fn to_index(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

fn out_of_memory(_: TryReserveError) -> StorageError {
    StorageError::Io(io::ErrorKind::OutOfMemory.into())
}

/// Zero-extend `file` to `len` bytes without aborting on allocation failure.
fn grow_to(file: &mut Vec<u8>, len: usize) -> Result<()> {
    let extra = len.saturating_sub(file.len());
    if extra > 0 {
        file.try_reserve_exact(extra).map_err(out_of_memory)?;
        file.resize(len, 0);
    }
    Ok(())
}

fn byte_len(data: &[u8]) -> u64 {
    u64::try_from(data.len()).unwrap_or(u64::MAX)
}

impl RawStorage for MemoryStorage {
    fn activate(&mut self, path: &str) -> Result<()> {
        self.active = None;
        self.write_pos = 0;
        let rel = normalize_path(path)?;
        if self.dirs.contains(rel) {
            return Err(StorageError::IsADirectory(rel.to_owned()));
        }
        if !self.files.contains_key(rel) {
            return Err(StorageError::NotFound(rel.to_owned()));
        }
        self.active = Some(rel.to_owned());
        self.activations = self.activations.saturating_add(1);
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.active_data()?;
        let Some(available) = data.get(to_index(offset)..) else {
            return Ok(0);
        };
        let n = available.len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), available.get(..n)) {
            dst.copy_from_slice(src);
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let current = byte_len(self.active_data()?);
        if data.is_empty() {
            return Ok(());
        }
        let end = self.write_pos.saturating_add(byte_len(data));
        self.ensure_room(current, end)?;

        let start = to_index(self.write_pos);
        let file = self.active_data()?;
        let end_index = start.saturating_add(data.len());
        grow_to(file, end_index)?;
        if let Some(dst) = file.get_mut(start..end_index) {
            dst.copy_from_slice(data);
        }
        self.write_pos = end;
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        let current = byte_len(self.active_data()?);
        self.ensure_room(current, current.saturating_add(byte_len(data)))?;
        let file = self.active_data()?;
        file.try_reserve(data.len()).map_err(out_of_memory)?;
        file.extend_from_slice(data);
        Ok(())
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        if self.active.is_none() {
            return Err(StorageError::NoActiveFile);
        }
        self.write_pos = position;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        if self.active.is_none() {
            return Err(StorageError::NoActiveFile);
        }
        Ok(self.write_pos)
    }

    fn create_file(&mut self, path: &str, initial_size: u64) -> Result<()> {
        let rel = normalize_path(path)?;
        if self.files.contains_key(rel) || self.dirs.contains(rel) {
            return Err(StorageError::AlreadyExists(rel.to_owned()));
        }
        let parent = parent_path(rel);
        if !self.dirs.contains(parent) {
            return Err(StorageError::NotFound(parent.to_owned()));
        }
        self.ensure_room(0, initial_size)?;
        let mut data = Vec::new();
        grow_to(&mut data, to_index(initial_size))?;
        self.files.insert(rel.to_owned(), data);
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        let rel = normalize_path(path)?;
        if self.dirs.contains(rel) {
            return Err(StorageError::IsADirectory(rel.to_owned()));
        }
        if self.files.remove(rel).is_none() {
            return Err(StorageError::NotFound(rel.to_owned()));
        }
        if self.active.as_deref() == Some(rel) {
            self.active = None;
        }
        Ok(())
    }

    fn exists(&mut self, path: &str) -> Result<bool> {
        let rel = normalize_path(path)?;
        Ok(self.files.contains_key(rel) || self.dirs.contains(rel))
    }

    fn stat(&mut self, path: &str) -> Result<RawEntry> {
        let rel = normalize_path(path)?;
        if self.dirs.contains(rel) {
            return Ok(RawEntry::directory(rel));
        }
        self.files
            .get(rel)
            .map(|data| RawEntry::file(rel, byte_len(data)))
            .ok_or_else(|| StorageError::NotFound(rel.to_owned()))
    }

    fn list(&mut self, path: &str) -> Result<Vec<RawEntry>> {
        let rel = normalize_path(path)?;
        if !self.dirs.contains(rel) {
            return Err(if self.files.contains_key(rel) {
                StorageError::NotADirectory(rel.to_owned())
            } else {
                StorageError::NotFound(rel.to_owned())
            });
        }
        let is_child = |candidate: &str| !candidate.is_empty() && parent_path(candidate) == rel;
        let dirs = self
            .dirs
            .iter()
            .filter(|d| is_child(d.as_str()))
            .map(|d| RawEntry::directory(d.as_str()));
        let files = self
            .files
            .iter()
            .filter(|(f, _)| is_child(f.as_str()))
            .map(|(f, data)| RawEntry::file(f.as_str(), byte_len(data)));
        Ok(dirs.chain(files).collect())
    }
}
