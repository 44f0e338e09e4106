//! Platform configuration constants.
//!
//! Central values shared by the storage drivers, the filesystem layer and the
//! tooling. Reference these rather than hardcoding prefixes or variable names.

/// Prefix the SD card volume is mounted under (`sd://...`).
pub const DEFAULT_PREFIX: &str = "sd";

/// Environment variable naming the host directory that backs the default
/// volume (see [`crate::storage_local::LocalFileStorage::from_env`]).
pub const STORAGE_ROOT_ENV: &str = "STORAGE_ROOT";

/// Default size of a RAM volume (256 MiB).
pub const DEFAULT_RAM_CAPACITY: u64 = 268_435_456;

/// Size of the canonical PCM WAV header (RIFF + fmt + data chunk headers).
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the BMP file header plus BITMAPINFOHEADER; pixel rows start here.
pub const BMP_HEADER_SIZE: usize = 54;
