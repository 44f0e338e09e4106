//! Storage Hardware Abstraction Layer.
//!
//! This crate defines the raw volume interface the media filesystem is built
//! on, plus the drivers that implement it without real card hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Tooling (xtask)
//!         ↓
//! Filesystem layer (mediafs: types, metadata, cursor, prefix routing)
//!         ↓
//! Platform HAL (this crate - RawStorage + drivers)
//!         ↓
//! Medium (SD/MMC block device, host directory, RAM)
//! ```
//!
//! # Drivers
//!
//! - [`LocalFileStorage`] - host directory via `std::fs` (mounted card, card image)
//! - [`MemoryStorage`] - RAM volume; test double and scratch disk
//!
//! # Example
//!
//! ```
//! use platform::{MemoryStorage, RawStorage};
//!
//! let mut card = MemoryStorage::new().with_file("hello.txt", b"hi".to_vec());
//! card.activate("hello.txt").unwrap();
//! let mut buf = [0u8; 2];
//! assert_eq!(card.read_at(0, &mut buf).unwrap(), 2);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod storage;
pub mod storage_local;
pub mod storage_memory;

// Re-export the driver interface and drivers
pub use storage::{RawEntry, RawStorage, StorageError};
pub use storage_local::LocalFileStorage;
pub use storage_memory::MemoryStorage;
