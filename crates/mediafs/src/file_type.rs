//! File type classification by extension, plus MIME mapping.
//!
//! Extension matching is case-insensitive and looks only at the last path
//! segment. Content signatures (see [`crate::metadata`]) override the result.

use core::fmt;

use serde::Serialize;

/// Closed set of file kinds the filesystem recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Directories and entries that were never classified.
    #[default]
    Unknown,
    /// Plain text (`.txt`, `.log`)
    Text,
    /// Waveform Audio File Format
    AudioWav,
    /// MPEG Audio Layer III
    AudioMp3,
    /// JPEG/JFIF image
    ImageJpeg,
    /// Portable Network Graphics
    ImagePng,
    /// Windows bitmap
    ImageBmp,
    /// Any other regular file
    Binary,
}

impl FileType {
    /// Classify a regular file by the extension of its last path segment.
    ///
    /// Files without a recognised extension are [`FileType::Binary`].
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        name.rsplit_once('.')
            .map_or(Self::Binary, |(_, ext)| Self::from_extension(ext))
    }

    /// Derive a [`FileType`] from a bare extension (no leading dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        const TABLE: &[(&str, FileType)] = &[
            ("wav", FileType::AudioWav),
            ("mp3", FileType::AudioMp3),
            ("jpg", FileType::ImageJpeg),
            ("jpeg", FileType::ImageJpeg),
            ("png", FileType::ImagePng),
            ("bmp", FileType::ImageBmp),
            ("txt", FileType::Text),
            ("log", FileType::Text),
        ];
        TABLE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(Self::Binary, |&(_, file_type)| file_type)
    }

    /// `true` for WAV and MP3.
    #[must_use]
    pub const fn is_audio(self) -> bool {
        matches!(self, Self::AudioWav | Self::AudioMp3)
    }

    /// `true` for JPEG, PNG and BMP.
    #[must_use]
    pub const fn is_image(self) -> bool {
        matches!(self, Self::ImageJpeg | Self::ImagePng | Self::ImageBmp)
    }

    /// MIME type reported to clients.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::AudioWav => "audio/wav",
            Self::AudioMp3 => "audio/mpeg",
            Self::ImageJpeg => "image/jpeg",
            Self::ImagePng => "image/png",
            Self::ImageBmp => "image/bmp",
            Self::Text => "text/plain",
            Self::Unknown | Self::Binary => "application/octet-stream",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(FileType::from_path("a.wav"), FileType::AudioWav);
        assert_eq!(FileType::from_path("a.mp3"), FileType::AudioMp3);
        assert_eq!(FileType::from_path("a.jpg"), FileType::ImageJpeg);
        assert_eq!(FileType::from_path("a.jpeg"), FileType::ImageJpeg);
        assert_eq!(FileType::from_path("a.png"), FileType::ImagePng);
        assert_eq!(FileType::from_path("a.bmp"), FileType::ImageBmp);
        assert_eq!(FileType::from_path("a.txt"), FileType::Text);
        assert_eq!(FileType::from_path("a.log"), FileType::Text);
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(FileType::from_path("music/TRACK.WAV"), FileType::AudioWav);
        assert_eq!(FileType::from_path("Cover.JpEg"), FileType::ImageJpeg);
    }

    #[test]
    fn test_unrecognised_is_binary() {
        assert_eq!(FileType::from_path("firmware.bin"), FileType::Binary);
        assert_eq!(FileType::from_path("README"), FileType::Binary);
        assert_eq!(FileType::from_path("archive.tar.gz"), FileType::Binary);
    }

    #[test]
    fn test_only_last_segment_counts() {
        assert_eq!(FileType::from_path("album.wav/notes"), FileType::Binary);
        assert_eq!(FileType::from_path("v1.2/readme.txt"), FileType::Text);
    }

    #[test]
    fn test_dotfile_named_like_extension() {
        assert_eq!(FileType::from_path("music/.wav"), FileType::AudioWav);
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(FileType::AudioWav.mime_type(), "audio/wav");
        assert_eq!(FileType::AudioMp3.mime_type(), "audio/mpeg");
        assert_eq!(FileType::ImageJpeg.mime_type(), "image/jpeg");
        assert_eq!(FileType::ImagePng.mime_type(), "image/png");
        assert_eq!(FileType::ImageBmp.mime_type(), "image/bmp");
        assert_eq!(FileType::Text.mime_type(), "text/plain");
        assert_eq!(FileType::Binary.mime_type(), "application/octet-stream");
        assert_eq!(FileType::Unknown.mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_audio_and_image_groups() {
        assert!(FileType::AudioWav.is_audio());
        assert!(FileType::AudioMp3.is_audio());
        assert!(!FileType::ImagePng.is_audio());
        assert!(FileType::ImageJpeg.is_image());
        assert!(FileType::ImagePng.is_image());
        assert!(FileType::ImageBmp.is_image());
        assert!(!FileType::Text.is_image());
        assert!(!FileType::Unknown.is_image());
    }

    #[test]
    fn test_display_is_mime() {
        assert_eq!(FileType::ImagePng.to_string(), "image/png");
    }
}
