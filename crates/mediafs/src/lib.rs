//! Media-aware virtual filesystem over raw storage volumes.
//!
//! Files are classified by extension and then by content signature, with
//! WAV/BMP/PNG header fields parsed during listings and info queries. A
//! cursor-based stream model sits on top of [`platform::RawStorage`], and a
//! router maps `prefix://path` addresses onto several volumes.
//!
//! # Modules
//!
//! - [`file_type`]: `FileType` and MIME mapping
//! - [`entry`]: `FileEntry` with image/audio attributes
//! - [`metadata`]: magic-byte detection and header parsing
//! - [`binary`]: WAV/BMP header codecs
//! - [`backend`]: `StorageBackend` trait and the `Volume` cursor layer
//! - [`router`]: `StorageRouter` and the prefix registry
//! - [`config`]: JSON mount table
//!
//! # Example
//!
//! ```
//! use mediafs::{FileType, StorageRouter, Volume};
//! use platform::MemoryStorage;
//!
//! let card = MemoryStorage::new().with_file("music/a.txt", b"liner notes".to_vec());
//! let mut router = StorageRouter::default();
//! router.add_backend(Box::new(Volume::new(card)), "sd");
//!
//! let entries = router.list_directory("sd://music");
//! assert_eq!(entries[0].path, "sd://music/a.txt");
//! assert_eq!(entries[0].file_type, FileType::Text);
//!
//! assert!(router.set_file("sd://music/a.txt"));
//! assert_eq!(router.read(), Some(b'l'));
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod backend;
pub mod binary;
pub mod config;
pub mod entry;
pub mod file_type;
pub mod metadata;
pub mod router;

pub use backend::{FileHandle, StorageBackend, Volume};
pub use config::{ConfigError, MountConfig, RouterConfig};
pub use entry::{AudioAttributes, FileEntry, ImageAttributes};
pub use file_type::FileType;
pub use metadata::{parse_media_metadata, signature_type, MediaMetadata};
pub use router::{split_address, BackendRegistry, RouteError, StorageRouter};
