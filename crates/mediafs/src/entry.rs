//! FileEntry: the value object describing one filesystem entry.

use platform::RawEntry;
use serde::Serialize;

use crate::file_type::FileType;
use crate::metadata::MediaMetadata;

/// Image header fields. All zero until a recognised signature is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageAttributes {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bits per pixel (PNG: bit depth per channel)
    pub bits_per_pixel: u8,
}

/// Audio header fields. Populated only from a complete WAV header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AudioAttributes {
    /// Sample rate in Hz (e.g. 44100, 48000)
    pub sample_rate: u32,
    /// Channel count
    pub channels: u8,
    /// Bits per sample
    pub bits_per_sample: u8,
    /// Duration in milliseconds, derived from the data chunk size
    pub duration_ms: u32,
}

/// A file or directory on a storage volume.
///
/// Directories are always [`FileType::Unknown`] with zeroed media attributes.
/// `read_cursor` is only meaningful while the entry is a backend's active file.
/// The default value is the "empty entry" returned by failed lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path, volume-relative inside a backend and `prefix://`-qualified when
    /// returned by the router
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// `true` for directories
    pub is_directory: bool,
    /// Streaming read offset
    pub read_cursor: u64,
    /// Detected type
    pub file_type: FileType,
    /// Image header fields
    pub image: ImageAttributes,
    /// Audio header fields
    pub audio: AudioAttributes,
}

impl FileEntry {
    /// Create an entry, classifying regular files by extension.
    pub fn new(path: impl Into<String>, size: u64, is_directory: bool) -> Self {
        let path = path.into();
        let file_type = if is_directory {
            FileType::Unknown
        } else {
            FileType::from_path(&path)
        };
        Self {
            path,
            size,
            is_directory,
            read_cursor: 0,
            file_type,
            image: ImageAttributes::default(),
            audio: AudioAttributes::default(),
        }
    }

    /// `true` for WAV and MP3 entries.
    #[must_use]
    pub fn is_audio(&self) -> bool {
        self.file_type.is_audio()
    }

    /// `true` for JPEG, PNG and BMP entries.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.file_type.is_image()
    }

    /// MIME type of the detected file type.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.file_type.mime_type()
    }

    /// Whether header parsing applies: a non-empty regular file.
    #[must_use]
    pub fn wants_metadata(&self) -> bool {
        !self.is_directory && self.size > 0
    }

    /// Overwrite type and media attributes with parsed header data.
    ///
    /// Directories are left untouched.
    pub fn apply_metadata(&mut self, metadata: MediaMetadata) {
        if self.is_directory {
            return;
        }
        self.file_type = metadata.file_type;
        self.image = metadata.image;
        self.audio = metadata.audio;
    }
}

impl From<RawEntry> for FileEntry {
    fn from(raw: RawEntry) -> Self {
        Self::new(raw.path, raw.size, raw.is_directory)
    }
}
