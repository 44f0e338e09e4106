//! StorageBackend: cursor-based file access over a raw volume.
//!
//! [`StorageBackend`] is the object-safe interface the router dispatches to.
//! [`Volume`] implements it on top of any [`RawStorage`] driver:
//!
//! ```text
//! router ──► Volume<R> ──► R: RawStorage (MemoryStorage, LocalFileStorage, ...)
//!              │
//!              ├─ entry table (FileHandle → FileEntry, read cursors live here)
//!              └─ active handle
//! ```
//!
//! Reads go through the active entry's cursor; writes go to the driver's own
//! write position. `seek` moves both.
//!
//! The entry table holds one slot per distinct path passed to `set_file`.
//! Deleting a file frees its slot; handles are never reused, so a handle
//! to a deleted entry stays invalid.

use std::collections::BTreeMap;

use platform::storage::{normalize_path, RawStorage, StorageError};
use tracing::{debug, trace, warn};

use crate::binary::{bmp_line_offset, BmpHeader, WavHeader};
use crate::entry::FileEntry;
use crate::metadata::{parse_media_metadata, HEADER_PROBE_LEN, MIN_SIGNATURE_LEN};

/// Index of a registered entry within one backend.
///
/// Handles are never reused, so handle equality is entry identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileHandle(usize);

impl FileHandle {
    /// Handle for table slot `index`, for backends outside this crate.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Key in the backend's entry table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A random-access volume with one active file and a read cursor.
///
/// Failures are reported through the return value (`false`, `0`, `None`,
/// empty `Vec`) after a `tracing` event; no method panics.
pub trait StorageBackend {
    /// Entries directly under `path`. Non-empty regular files carry parsed
    /// media metadata. Order is backend-defined.
    fn list_directory(&mut self, path: &str) -> Vec<FileEntry>;

    /// A single metadata-enriched entry, `None` when `path` does not exist.
    fn get_file_info(&mut self, path: &str) -> Option<FileEntry>;

    /// Register `entry` and make it the active file.
    ///
    /// An entry whose path is already registered replaces the stored one
    /// under the same handle. The device is only re-activated when the handle
    /// differs from the active one.
    fn set_file(&mut self, entry: FileEntry) -> FileHandle;

    /// Make a previously registered entry active again.
    fn select(&mut self, handle: FileHandle) -> bool;

    /// The active entry, including its read cursor.
    fn active_file(&self) -> Option<&FileEntry>;

    /// Byte at the read cursor. The cursor advances only on success.
    fn read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        if self.read_array(&mut byte) == 1 {
            let [value] = byte;
            Some(value)
        } else {
            None
        }
    }

    /// Read up to `buf.len()` bytes at the cursor and advance it by the
    /// count returned. Short at end of file.
    fn read_array(&mut self, buf: &mut [u8]) -> usize;

    /// Overwrite one byte at the write position.
    fn write(&mut self, byte: u8) -> bool {
        self.write_array(&[byte])
    }

    /// Overwrite `data` at the write position.
    fn write_array(&mut self, data: &[u8]) -> bool;

    /// Append one byte to the active file.
    fn append(&mut self, byte: u8) -> bool {
        self.append_array(&[byte])
    }

    /// Append `data` to the active file.
    fn append_array(&mut self, data: &[u8]) -> bool;

    /// Move the read cursor and the write position to `position`.
    ///
    /// `false` when no file is active.
    fn seek(&mut self, position: u64) -> bool;

    /// Read cursor of the active file, 0 when none is active.
    fn get_position(&self) -> u64;

    /// Create a zero-filled file of `initial_size` bytes.
    fn create_file(&mut self, path: &str, initial_size: u64) -> bool;

    /// Delete a regular file.
    fn delete_file(&mut self, path: &str) -> bool;

    /// Whether a file or directory exists at `path`.
    fn file_exists(&mut self, path: &str) -> bool;

    /// Write a canonical 44-byte PCM WAV header at the write position.
    fn write_audio_header_wav(
        &mut self,
        sample_rate: u32,
        channels: u8,
        bits_per_sample: u8,
        data_size: u32,
    ) -> bool {
        let header = WavHeader {
            sample_rate,
            channels,
            bits_per_sample,
            data_size,
        };
        self.write_array(&header.encode())
    }

    /// Streaming read, same as [`read_array`](StorageBackend::read_array).
    fn read_audio_chunk(&mut self, buf: &mut [u8]) -> usize {
        self.read_array(buf)
    }

    /// Streaming write, same as [`write_array`](StorageBackend::write_array).
    fn write_audio_chunk(&mut self, data: &[u8]) -> bool {
        self.write_array(data)
    }

    /// Write a 54-byte BMP header at the write position.
    ///
    /// `false` when the pixel array size does not fit the 32-bit fields.
    fn write_image_header_bmp(&mut self, width: u32, height: u32, bits_per_pixel: u8) -> bool {
        let header = BmpHeader {
            width,
            height,
            bits_per_pixel,
        };
        match header.encode() {
            Some(bytes) => self.write_array(&bytes),
            None => {
                warn!("BMP {width}x{height}@{bits_per_pixel} exceeds 32-bit size fields");
                false
            }
        }
    }

    /// Positional read of pixel row `line_number`, bypassing the cursor.
    ///
    /// Reads at most `bytes_per_line` bytes into `buf`.
    fn read_image_line(&mut self, buf: &mut [u8], line_number: u32, bytes_per_line: u32) -> usize;

    /// Seek to pixel row `line_number` and write `bytes_per_line` bytes of
    /// `data` there. Rows are written as given (no bottom-up reordering).
    fn write_image_line(&mut self, data: &[u8], line_number: u32, bytes_per_line: u32) -> bool {
        let Some(offset) = bmp_line_offset(line_number, bytes_per_line) else {
            return false;
        };
        let Some(row) = usize::try_from(bytes_per_line)
            .ok()
            .and_then(|len| data.get(..len))
        else {
            warn!(
                "image line {line_number}: buffer holds {} of {bytes_per_line} bytes",
                data.len()
            );
            return false;
        };
        self.seek(offset) && self.write_array(row)
    }
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// [`StorageBackend`] over a [`RawStorage`] driver.
#[derive(Debug)]
pub struct Volume<R> {
    raw: R,
    entries: BTreeMap<FileHandle, FileEntry>,
    next_handle: usize,
    active: Option<FileHandle>,
}

impl<R: RawStorage> Volume<R> {
    /// Wrap a driver. No file is active.
    pub fn new(raw: R) -> Self {
        Self {
            raw,
            entries: BTreeMap::new(),
            next_handle: 0,
            active: None,
        }
    }

    /// The underlying driver.
    pub fn raw(&self) -> &R {
        &self.raw
    }

    /// Consume the volume, returning the driver.
    pub fn into_inner(self) -> R {
        self.raw
    }

    /// A registered entry.
    #[must_use]
    pub fn entry(&self, handle: FileHandle) -> Option<&FileEntry> {
        self.entries.get(&handle)
    }

    /// Handle of the entry registered for `path`.
    #[must_use]
    pub fn handle_of(&self, path: &str) -> Option<FileHandle> {
        self.entries
            .iter()
            .find(|(_, e)| e.path == path)
            .map(|(handle, _)| *handle)
    }

    /// Number of registered entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn active_entry_mut(&mut self) -> Option<&mut FileEntry> {
        let handle = self.active?;
        self.entries.get_mut(&handle)
    }

    fn active_path(&self) -> Option<String> {
        self.active_file().map(|e| e.path.clone())
    }

    /// Point the device at `handle`'s path.
    ///
    /// On failure the previously active file and its write position are
    /// restored; nothing is active only if that restore fails too.
    fn activate(&mut self, handle: FileHandle) -> bool {
        let Some(path) = self.entries.get(&handle).map(|e| e.path.clone()) else {
            return false;
        };
        let previous = self.active.zip(self.active_path());
        let saved_position = previous.as_ref().and_then(|_| self.raw.position().ok());
        match self.raw.activate(&path) {
            Ok(()) => {
                debug!("activated {path}");
                self.active = Some(handle);
                true
            }
            Err(err) => {
                warn!("activate {path}: {err}");
                self.active = None;
                if let Some((previous, previous_path)) = previous {
                    if self.restore(Some(previous_path.as_str()), saved_position) {
                        self.active = Some(previous);
                    }
                }
                false
            }
        }
    }

    /// Parse the header of `entry` in place.
    ///
    /// The device is re-pointed at `entry.path` for the probe and then
    /// restored to the active file and its write position, whether or not
    /// the probe succeeded.
    fn enrich(&mut self, entry: &mut FileEntry) {
        if !entry.wants_metadata() || entry.size < byte_count(MIN_SIGNATURE_LEN) {
            return;
        }
        let probe_len = usize::try_from(entry.size).map_or(HEADER_PROBE_LEN, |size| {
            size.min(HEADER_PROBE_LEN)
        });
        let mut header = [0u8; HEADER_PROBE_LEN];
        let Some(buf) = header.get_mut(..probe_len) else {
            return;
        };

        let previous = self.active_path();
        let result = if previous.as_deref() == Some(entry.path.as_str()) {
            self.raw.read_at(0, buf)
        } else {
            let saved_position = match previous {
                Some(_) => self.raw.position().ok(),
                None => None,
            };
            let probed = match self.raw.activate(&entry.path) {
                Ok(()) => self.raw.read_at(0, buf),
                Err(err) => Err(err),
            };
            self.restore(previous.as_deref(), saved_position);
            probed
        };

        match result {
            Ok(read) => {
                let header = header.get(..read.min(probe_len)).unwrap_or_default();
                entry.apply_metadata(parse_media_metadata(header, entry.file_type));
                trace!("probed {}: {}", entry.path, entry.file_type);
            }
            Err(err) => warn!("metadata probe {}: {err}", entry.path),
        }
    }

    /// Re-point the device at `path` and its write position. Clears the
    /// active handle and returns `false` if the device refuses.
    fn restore(&mut self, path: Option<&str>, position: Option<u64>) -> bool {
        let Some(path) = path else {
            return false;
        };
        if let Err(err) = self.raw.activate(path) {
            warn!("restore {path}: {err}");
            self.active = None;
            return false;
        }
        if let Some(position) = position {
            if let Err(err) = self.raw.seek(position) {
                warn!("restore position {position} of {path}: {err}");
            }
        }
        true
    }
}

fn report(op: &str, result: Result<(), StorageError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("{op}: {err}");
            false
        }
    }
}

fn byte_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl<R: RawStorage> StorageBackend for Volume<R> {
    fn list_directory(&mut self, path: &str) -> Vec<FileEntry> {
        let raw_entries = match self.raw.list(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("list {path}: {err}");
                return Vec::new();
            }
        };
        let mut entries: Vec<FileEntry> = raw_entries.into_iter().map(FileEntry::from).collect();
        for entry in &mut entries {
            self.enrich(entry);
        }
        entries
    }

    fn get_file_info(&mut self, path: &str) -> Option<FileEntry> {
        match self.raw.stat(path) {
            Ok(raw) => {
                let mut entry = FileEntry::from(raw);
                self.enrich(&mut entry);
                Some(entry)
            }
            Err(StorageError::NotFound(_)) => {
                debug!("no such entry: {path}");
                None
            }
            Err(err) => {
                warn!("stat {path}: {err}");
                None
            }
        }
    }

    fn set_file(&mut self, entry: FileEntry) -> FileHandle {
        let handle = match self.handle_of(&entry.path) {
            Some(handle) => {
                let still_active = self.active == Some(handle);
                if let Some(slot) = self.entries.get_mut(&handle) {
                    // The device position survives a same-handle set, so the
                    // read cursor does too.
                    let cursor = slot.read_cursor;
                    *slot = entry;
                    if still_active {
                        slot.read_cursor = cursor;
                    }
                }
                handle
            }
            None => {
                let handle = FileHandle(self.next_handle);
                self.next_handle = self.next_handle.saturating_add(1);
                self.entries.insert(handle, entry);
                handle
            }
        };
        self.select(handle);
        handle
    }

    fn select(&mut self, handle: FileHandle) -> bool {
        if self.active == Some(handle) {
            trace!("handle {} already active", handle.0);
            return true;
        }
        self.activate(handle)
    }

    fn active_file(&self) -> Option<&FileEntry> {
        self.active.and_then(|handle| self.entries.get(&handle))
    }

    fn read_array(&mut self, buf: &mut [u8]) -> usize {
        let Some(cursor) = self.active_file().map(|e| e.read_cursor) else {
            warn!("read with no active file");
            return 0;
        };
        match self.raw.read_at(cursor, buf) {
            Ok(read) => {
                if let Some(entry) = self.active_entry_mut() {
                    entry.read_cursor = entry.read_cursor.saturating_add(byte_count(read));
                }
                read
            }
            Err(err) => {
                warn!("read at {cursor}: {err}");
                0
            }
        }
    }

    fn write_array(&mut self, data: &[u8]) -> bool {
        if self.active.is_none() {
            warn!("write with no active file");
            return false;
        }
        let result = self.raw.write(data);
        report("write", result)
    }

    fn append_array(&mut self, data: &[u8]) -> bool {
        if self.active.is_none() {
            warn!("append with no active file");
            return false;
        }
        let result = self.raw.append(data);
        report("append", result)
    }

    fn seek(&mut self, position: u64) -> bool {
        let Some(entry) = self.active_entry_mut() else {
            return false;
        };
        entry.read_cursor = position;
        let result = self.raw.seek(position);
        report("seek", result)
    }

    fn get_position(&self) -> u64 {
        self.active_file().map_or(0, |e| e.read_cursor)
    }

    fn create_file(&mut self, path: &str, initial_size: u64) -> bool {
        let result = self.raw.create_file(path, initial_size);
        report("create", result)
    }

    fn delete_file(&mut self, path: &str) -> bool {
        let result = self.raw.delete_file(path);
        let deleted = report("delete", result);
        if deleted {
            let path = normalize_path(path).unwrap_or(path);
            if let Some(handle) = self.handle_of(path) {
                self.entries.remove(&handle);
                if self.active == Some(handle) {
                    self.active = None;
                }
            }
        }
        deleted
    }

    fn file_exists(&mut self, path: &str) -> bool {
        self.raw.exists(path).unwrap_or_else(|err| {
            warn!("exists {path}: {err}");
            false
        })
    }

    fn read_image_line(&mut self, buf: &mut [u8], line_number: u32, bytes_per_line: u32) -> usize {
        if self.active.is_none() {
            return 0;
        }
        let Some(offset) = bmp_line_offset(line_number, bytes_per_line) else {
            return 0;
        };
        let len = usize::try_from(bytes_per_line).map_or(buf.len(), |n| n.min(buf.len()));
        let Some(row) = buf.get_mut(..len) else {
            return 0;
        };
        self.raw.read_at(offset, row).unwrap_or_else(|err| {
            warn!("read image line {line_number}: {err}");
            0
        })
    }
}
