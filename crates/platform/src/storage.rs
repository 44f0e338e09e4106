//! Raw storage abstraction for block-backed volumes.
//!
//! [`RawStorage`] is the primitive set a volume driver exposes to the
//! filesystem layer: byte-addressed reads against the *active* file, writes at
//! a driver-managed write position, appends, and directory enumeration.
//! It deliberately knows nothing about file types, cursors or prefixes; those
//! live in the `mediafs` crate.
//!
//! Paths are volume-relative and `/`-separated. A leading or trailing `/` is
//! ignored and the empty path names the volume root.

use std::io;

/// Error returned by raw storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The path does not exist on the volume.
    #[error("no such file or directory: {0}")]
    NotFound(String),
    /// A streaming operation was issued before any file was activated.
    #[error("no active file")]
    NoActiveFile,
    /// A directory operation was issued against a regular file.
    #[error("not a directory: {0}")]
    NotADirectory(String),
    /// A file operation was issued against a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),
    /// The file to create already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The path escapes the volume root (contains a `..` component).
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// The volume cannot hold the requested bytes.
    #[error("no space left on volume: {requested} bytes requested, {available} available")]
    NoSpace {
        /// Bytes the operation would have added
        requested: u64,
        /// Bytes still free on the volume
        available: u64,
    },
    /// Underlying medium failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Map a `std::io::Error` raised while touching `path`, keeping the
    /// not-found and already-exists kinds distinguishable.
    #[must_use]
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_owned()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_owned()),
            _ => Self::Io(err),
        }
    }
}

/// Result alias for raw storage operations.
pub type Result<T> = core::result::Result<T, StorageError>;

/// A directory entry as reported by the medium, before any classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Volume-relative path (`/`-separated, no leading slash).
    pub path: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// `true` for directories.
    pub is_directory: bool,
}

impl RawEntry {
    /// Build a regular-file entry.
    #[must_use]
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            is_directory: false,
        }
    }

    /// Build a directory entry.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            is_directory: true,
        }
    }
}

/// Primitive operations of a single storage volume.
///
/// Exactly one file is *active* at a time. [`activate`](RawStorage::activate)
/// replaces it; there is no close. If activation fails the driver must leave
/// no file active, so a failed switch can never redirect I/O into the
/// previously active file.
///
/// The write position is owned by the driver and is reset to 0 on every
/// activation. Reads are positional and never move it.
pub trait RawStorage {
    /// Make `path` the active file.
    fn activate(&mut self, path: &str) -> Result<()>;

    /// Read up to `buf.len()` bytes of the active file starting at `offset`.
    ///
    /// Returns the number of bytes read; 0 at or past end of file.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Overwrite `data` at the write position and advance it.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Append `data` at the end of the active file. The write position is
    /// left where it was.
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Move the write position to an absolute byte offset.
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Current write position of the active file.
    fn position(&mut self) -> Result<u64>;

    /// Create a zero-filled file of `initial_size` bytes.
    fn create_file(&mut self, path: &str, initial_size: u64) -> Result<()>;

    /// Delete a regular file. Deleting the active file deactivates it.
    fn delete_file(&mut self, path: &str) -> Result<()>;

    /// Whether a file or directory exists at `path`.
    fn exists(&mut self, path: &str) -> Result<bool>;

    /// Describe a single file or directory.
    fn stat(&mut self, path: &str) -> Result<RawEntry>;

    /// Enumerate the direct children of the directory at `path`.
    fn list(&mut self, path: &str) -> Result<Vec<RawEntry>>;
}

/// Strip leading/trailing separators and reject `..` components.
///
/// `"/music/"` becomes `"music"`; the root is `""`.
pub fn normalize_path(path: &str) -> Result<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidPath(path.to_owned()));
    }
    Ok(trimmed)
}

/// Join a normalized directory path and a child name.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent directory of a normalized path (`""` for top-level entries).
#[must_use]
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}
