//! StorageRouter: `prefix://path` addressing over several backends.
//!
//! ```text
//! "sd://music/a.wav" ──split──► ("sd", "music/a.wav")
//!                                  │
//!                     BackendRegistry["sd"].get_file_info("music/a.wav")
//!                                  │
//!                     entry.path = "sd://" + entry.path
//! ```
//!
//! Path-bearing calls resolve their own backend. Streaming calls go to the
//! backend chosen by the last successful [`StorageRouter::set_file`].

use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use crate::backend::StorageBackend;
use crate::entry::FileEntry;

/// Separator between a backend prefix and the volume-relative path.
pub const PREFIX_SEPARATOR: &str = "://";

/// Address resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The address has no `://` separator.
    #[error("invalid path {0}: must start with a valid prefix")]
    InvalidPath(String),
    /// No backend is registered under the prefix.
    #[error("storage prefix {0} does not exist")]
    UnknownPrefix(String),
}

/// Split `"prefix://relative"` at the first separator.
pub fn split_address(path: &str) -> Result<(&str, &str), RouteError> {
    path.split_once(PREFIX_SEPARATOR)
        .ok_or_else(|| RouteError::InvalidPath(path.to_owned()))
}

fn qualify(prefix: &str, path: &str) -> String {
    format!("{prefix}{PREFIX_SEPARATOR}{path}")
}

// ---------------------------------------------------------------------------
// BackendRegistry
// ---------------------------------------------------------------------------

/// Prefix → backend map. Entries are added or replaced, never removed.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Box<dyn StorageBackend>>,
}

impl BackendRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `backend` under `prefix`, replacing any previous one.
    pub fn add_backend(&mut self, backend: Box<dyn StorageBackend>, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if self.backends.insert(prefix.clone(), backend).is_some() {
            warn!("storage prefix {prefix} re-registered, previous backend replaced");
        } else {
            debug!("registered storage prefix {prefix}");
        }
    }

    /// Backend registered under `prefix`.
    pub fn get_mut(&mut self, prefix: &str) -> Option<&mut (dyn StorageBackend + 'static)> {
        self.backends.get_mut(prefix).map(|backend| &mut **backend)
    }

    /// Backend registered under `prefix`, read-only.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&(dyn StorageBackend + 'static)> {
        self.backends.get(prefix).map(|backend| &**backend)
    }

    /// Whether `prefix` is registered.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.backends.contains_key(prefix)
    }

    /// Registered prefixes in sorted order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl core::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.backends.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// StorageRouter
// ---------------------------------------------------------------------------

/// Routes `prefix://` addresses to registered backends.
#[derive(Debug, Default)]
pub struct StorageRouter {
    registry: BackendRegistry,
    current: Option<String>,
}

impl StorageRouter {
    /// Router over an explicitly built registry.
    #[must_use]
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Register `backend` under `prefix`. Last registration wins.
    pub fn add_backend(&mut self, backend: Box<dyn StorageBackend>, prefix: impl Into<String>) {
        self.registry.add_backend(backend, prefix);
    }

    /// The backend registry.
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Prefix of the backend streaming calls go to.
    #[must_use]
    pub fn current_prefix(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Resolve an address to its backend, prefix and relative path.
    pub fn resolve<'a>(
        &mut self,
        path: &'a str,
    ) -> Result<(&mut (dyn StorageBackend + 'static), &'a str, &'a str), RouteError> {
        let (prefix, relative) = split_address(path)?;
        let backend = self
            .registry
            .get_mut(prefix)
            .ok_or_else(|| RouteError::UnknownPrefix(prefix.to_owned()))?;
        Ok((backend, prefix, relative))
    }

    /// Resolve or log. Every path-bearing operation goes through here.
    fn route<'a>(
        &mut self,
        op: &str,
        path: &'a str,
    ) -> Option<(&mut (dyn StorageBackend + 'static), &'a str, &'a str)> {
        match self.resolve(path) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                error!("{op}: {err}");
                None
            }
        }
    }

    fn current_backend(&mut self, op: &str) -> Option<&mut (dyn StorageBackend + 'static)> {
        let Some(prefix) = self.current.as_deref() else {
            warn!("{op}: no file selected");
            return None;
        };
        self.registry.get_mut(prefix)
    }

    // -- path-bearing operations --------------------------------------------

    /// Routed listing with `prefix://`-qualified paths. Empty on failure.
    pub fn list_directory(&mut self, path: &str) -> Vec<FileEntry> {
        let Some((backend, prefix, relative)) = self.route("list_directory", path) else {
            return Vec::new();
        };
        let mut entries = backend.list_directory(relative);
        for entry in &mut entries {
            entry.path = qualify(prefix, &entry.path);
        }
        entries
    }

    /// Routed, enriched entry with a `prefix://`-qualified path.
    pub fn get_file_info(&mut self, path: &str) -> Option<FileEntry> {
        let (backend, prefix, relative) = self.route("get_file_info", path)?;
        let mut entry = backend.get_file_info(relative)?;
        entry.path = qualify(prefix, &entry.path);
        Some(entry)
    }

    /// Make the file at `path` active on its backend and route streaming
    /// calls there.
    ///
    /// `false` when the address does not resolve, the path is missing or a
    /// directory, or the device cannot activate it. The previously selected
    /// backend stays current in that case, and a backend that fails to
    /// activate keeps its previous active file.
    pub fn set_file(&mut self, path: &str) -> bool {
        let Some((backend, prefix, relative)) = self.route("set_file", path) else {
            return false;
        };
        let Some(entry) = backend.get_file_info(relative) else {
            error!("set_file: {path} not found");
            return false;
        };
        if entry.is_directory {
            error!("set_file: {path} is a directory");
            return false;
        }
        let wanted = entry.path.clone();
        backend.set_file(entry);
        if !backend.active_file().is_some_and(|active| active.path == wanted) {
            error!("set_file: {path} could not be activated");
            return false;
        }
        self.current = Some(prefix.to_owned());
        true
    }

    /// Create a zero-filled file of `initial_size` bytes.
    pub fn create_file(&mut self, path: &str, initial_size: u64) -> bool {
        self.route("create_file", path)
            .is_some_and(|(backend, _, relative)| backend.create_file(relative, initial_size))
    }

    /// Delete a regular file.
    pub fn delete_file(&mut self, path: &str) -> bool {
        self.route("delete_file", path)
            .is_some_and(|(backend, _, relative)| backend.delete_file(relative))
    }

    /// Whether `path` exists on its backend.
    pub fn file_exists(&mut self, path: &str) -> bool {
        self.route("file_exists", path)
            .is_some_and(|(backend, _, relative)| backend.file_exists(relative))
    }

    /// Listing filtered to audio entries.
    pub fn list_audio_files(&mut self, path: &str) -> Vec<FileEntry> {
        let mut entries = self.list_directory(path);
        entries.retain(FileEntry::is_audio);
        entries
    }

    /// Listing filtered to image entries.
    pub fn list_image_files(&mut self, path: &str) -> Vec<FileEntry> {
        let mut entries = self.list_directory(path);
        entries.retain(FileEntry::is_image);
        entries
    }

    // -- streaming operations (current backend) -----------------------------

    /// Active file of the current backend, `prefix://`-qualified.
    #[must_use]
    pub fn current_file(&self) -> Option<FileEntry> {
        let prefix = self.current.as_deref()?;
        let mut entry = self.registry.get(prefix)?.active_file()?.clone();
        entry.path = qualify(prefix, &entry.path);
        Some(entry)
    }

    /// See [`StorageBackend::read`].
    pub fn read(&mut self) -> Option<u8> {
        self.current_backend("read")?.read()
    }

    /// See [`StorageBackend::read_array`].
    pub fn read_array(&mut self, buf: &mut [u8]) -> usize {
        self.current_backend("read_array")
            .map_or(0, |backend| backend.read_array(buf))
    }

    /// See [`StorageBackend::write`].
    pub fn write(&mut self, byte: u8) -> bool {
        self.current_backend("write")
            .is_some_and(|backend| backend.write(byte))
    }

    /// See [`StorageBackend::write_array`].
    pub fn write_array(&mut self, data: &[u8]) -> bool {
        self.current_backend("write_array")
            .is_some_and(|backend| backend.write_array(data))
    }

    /// See [`StorageBackend::append`].
    pub fn append(&mut self, byte: u8) -> bool {
        self.current_backend("append")
            .is_some_and(|backend| backend.append(byte))
    }

    /// See [`StorageBackend::append_array`].
    pub fn append_array(&mut self, data: &[u8]) -> bool {
        self.current_backend("append_array")
            .is_some_and(|backend| backend.append_array(data))
    }

    /// See [`StorageBackend::seek`].
    pub fn seek(&mut self, position: u64) -> bool {
        self.current_backend("seek")
            .is_some_and(|backend| backend.seek(position))
    }

    /// See [`StorageBackend::get_position`]. 0 with no file selected.
    #[must_use]
    pub fn get_position(&self) -> u64 {
        self.current
            .as_deref()
            .and_then(|prefix| self.registry.get(prefix))
            .map_or(0, |backend| backend.get_position())
    }

    /// See [`StorageBackend::write_audio_header_wav`].
    pub fn write_audio_header_wav(
        &mut self,
        sample_rate: u32,
        channels: u8,
        bits_per_sample: u8,
        data_size: u32,
    ) -> bool {
        self.current_backend("write_audio_header_wav")
            .is_some_and(|backend| {
                backend.write_audio_header_wav(sample_rate, channels, bits_per_sample, data_size)
            })
    }

    /// See [`StorageBackend::read_audio_chunk`].
    pub fn read_audio_chunk(&mut self, buf: &mut [u8]) -> usize {
        self.current_backend("read_audio_chunk")
            .map_or(0, |backend| backend.read_audio_chunk(buf))
    }

    /// See [`StorageBackend::write_audio_chunk`].
    pub fn write_audio_chunk(&mut self, data: &[u8]) -> bool {
        self.current_backend("write_audio_chunk")
            .is_some_and(|backend| backend.write_audio_chunk(data))
    }

    /// See [`StorageBackend::write_image_header_bmp`].
    pub fn write_image_header_bmp(&mut self, width: u32, height: u32, bits_per_pixel: u8) -> bool {
        self.current_backend("write_image_header_bmp")
            .is_some_and(|backend| backend.write_image_header_bmp(width, height, bits_per_pixel))
    }

    /// See [`StorageBackend::read_image_line`].
    pub fn read_image_line(&mut self, buf: &mut [u8], line_number: u32, bytes_per_line: u32) -> usize {
        self.current_backend("read_image_line")
            .map_or(0, |backend| backend.read_image_line(buf, line_number, bytes_per_line))
    }

    /// See [`StorageBackend::write_image_line`].
    pub fn write_image_line(&mut self, data: &[u8], line_number: u32, bytes_per_line: u32) -> bool {
        self.current_backend("write_image_line")
            .is_some_and(|backend| backend.write_image_line(data, line_number, bytes_per_line))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use platform::MemoryStorage;

    use super::*;
    use crate::backend::Volume;
    use crate::file_type::FileType;

    fn router() -> StorageRouter {
        let mut router = StorageRouter::default();
        router.add_backend(
            Box::new(Volume::new(
                MemoryStorage::new()
                    .with_file("music/a.wav", b"RIFF\0\0\0\0WAVEfmt ".to_vec())
                    .with_file("music/cover.png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
                    .with_file("music/notes.txt", b"liner notes".to_vec()),
            )),
            "sd",
        );
        router.add_backend(
            Box::new(Volume::new(MemoryStorage::new().with_file("scratch.bin", b"0123456789".to_vec()))),
            "ram",
        );
        router
    }

    #[test]
    fn split_address_on_first_separator() {
        assert_eq!(split_address("sd://music/a.wav"), Ok(("sd", "music/a.wav")));
        assert_eq!(split_address("sd://a://b"), Ok(("sd", "a://b")));
        assert_eq!(split_address("://x"), Ok(("", "x")));
        assert_eq!(
            split_address("music/a.wav"),
            Err(RouteError::InvalidPath("music/a.wav".to_owned()))
        );
    }

    #[test]
    fn resolve_unknown_prefix() {
        let mut router = router();
        assert!(matches!(
            router.resolve("usb://x"),
            Err(RouteError::UnknownPrefix(p)) if p == "usb"
        ));
    }

    #[test]
    fn listing_is_reprefixed() {
        let mut router = router();
        let mut paths: Vec<String> = router
            .list_directory("sd://music")
            .into_iter()
            .map(|e| e.path)
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            ["sd://music/a.wav", "sd://music/cover.png", "sd://music/notes.txt"]
        );
    }

    #[test]
    fn unroutable_addresses_return_defaults() {
        let mut router = router();
        assert!(router.list_directory("usb://music").is_empty());
        assert!(router.list_directory("music").is_empty());
        assert!(router.get_file_info("nope://a").is_none());
        assert!(!router.set_file("music/a.wav"));
        assert!(!router.file_exists("x://y"));
        assert!(!router.create_file("x://y", 0));
        assert!(!router.delete_file("x://y"));
    }

    #[test]
    fn streaming_without_selection_returns_defaults() {
        let mut router = router();
        assert_eq!(router.read(), None);
        assert_eq!(router.read_array(&mut [0u8; 4]), 0);
        assert!(!router.write(1));
        assert!(!router.seek(3));
        assert_eq!(router.get_position(), 0);
        assert!(router.current_file().is_none());
    }

    #[test]
    fn set_file_routes_streaming_calls() {
        let mut router = router();
        assert!(router.set_file("ram://scratch.bin"));
        assert_eq!(router.current_prefix(), Some("ram"));
        assert!(router.seek(4));
        assert_eq!(router.read(), Some(b'4'));
        assert_eq!(router.get_position(), 5);
        let current = router.current_file().unwrap();
        assert_eq!(current.path, "ram://scratch.bin");
        assert_eq!(current.read_cursor, 5);
    }

    #[test]
    fn failed_set_file_keeps_current_backend() {
        let mut router = router();
        assert!(router.set_file("ram://scratch.bin"));
        assert!(!router.set_file("sd://music/missing.wav"));
        assert!(!router.set_file("sd://music"));
        assert_eq!(router.current_prefix(), Some("ram"));
        assert_eq!(router.read(), Some(b'0'));
    }

    #[test]
    fn ram_volume_overflow_is_reported_not_fatal() {
        let mut router = router();
        assert!(router.set_file("ram://scratch.bin"));
        assert!(router.seek(u64::MAX));
        assert!(!router.write(1));
        assert!(!router.write_image_line(&[0; 4], u32::MAX, 4));
        assert!(!router.create_file("ram://big.bin", u64::MAX));
        assert!(!router.file_exists("ram://big.bin"));
        assert!(router.seek(0));
        assert_eq!(router.read(), Some(b'0'));
    }

    #[test]
    fn file_info_is_enriched_and_prefixed() {
        let mut router = router();
        let info = router.get_file_info("sd://music/cover.png").unwrap();
        assert_eq!(info.path, "sd://music/cover.png");
        assert_eq!(info.file_type, FileType::ImagePng);
    }

    #[test]
    fn filtered_listings() {
        let mut router = router();
        let audio = router.list_audio_files("sd://music");
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].path, "sd://music/a.wav");
        let images = router.list_image_files("sd://music");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_type, FileType::ImagePng);
    }

    #[test]
    fn last_registration_wins() {
        let mut router = router();
        router.add_backend(Box::new(Volume::new(MemoryStorage::new())), "ram");
        assert_eq!(router.registry().len(), 2);
        assert!(!router.file_exists("ram://scratch.bin"));
        assert_eq!(router.registry().prefixes().collect::<Vec<_>>(), ["ram", "sd"]);
    }

    #[test]
    fn existence_management_is_routed() {
        let mut router = router();
        assert!(router.create_file("ram://new.bin", 4));
        assert!(router.file_exists("ram://new.bin"));
        assert!(!router.file_exists("sd://new.bin"));
        assert!(router.delete_file("ram://new.bin"));
        assert!(!router.file_exists("ram://new.bin"));
    }
}
