//! Metadata: magic-byte type detection and media header parsing.
//!
//! Detection works on the first [`HEADER_PROBE_LEN`] bytes of a file.
//! No storage I/O happens here; the caller supplies the bytes (see
//! [`crate::backend::Volume`] for the probing side).
//!
//! | Type | Signature                                   | Fields extracted            |
//! |------|---------------------------------------------|-----------------------------|
//! | WAV  | `RIFF` @0 and `WAVE` @8                     | rate, channels, bits, duration (≥44 B) |
//! | BMP  | `BM` @0                                     | width, height, bpp (≥30 B)  |
//! | PNG  | `89 50 4E 47 0D 0A 1A 0A` @0                | width, height (BE), depth (≥24 B) |
//! | JPEG | `FF D8 FF` @0                               | none                        |
//!
//! The first match in table order wins. Headers shorter than
//! [`MIN_SIGNATURE_LEN`] keep the extension-based type.

use crate::binary::{be_u32_at, byte_at, le_u32_at, WavHeader};
use crate::entry::{AudioAttributes, ImageAttributes};
use crate::file_type::FileType;

/// Bytes read from offset 0 when probing a file.
pub const HEADER_PROBE_LEN: usize = WavHeader::SIZE;

/// Headers shorter than this are never classified by signature.
pub const MIN_SIGNATURE_LEN: usize = 8;

const BMP_FIELDS_LEN: usize = 30;
const PNG_FIELDS_LEN: usize = 24;

/// PNG file signature.
pub const PNG_SIGNATURE: &[u8; 8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// JPEG SOI marker followed by the first segment marker prefix.
pub const JPEG_SIGNATURE: &[u8; 3] = &[0xFF, 0xD8, 0xFF];
/// BMP file signature.
pub const BMP_SIGNATURE: &[u8; 2] = b"BM";

/// Type and attributes recovered from a header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Signature type, or the caller's fallback
    pub file_type: FileType,
    /// Zeroed unless a BMP or PNG header was parsed
    pub image: ImageAttributes,
    /// Zeroed unless a complete WAV header was parsed
    pub audio: AudioAttributes,
}

/// Detect the file type from its leading bytes.
///
/// Returns `None` when the header is shorter than [`MIN_SIGNATURE_LEN`] or
/// matches no known signature.
pub fn signature_type(header: &[u8]) -> Option<FileType> {
    if header.len() < MIN_SIGNATURE_LEN {
        return None;
    }

    // RIFF container whose form type is WAVE
    if header.starts_with(WavHeader::RIFF) && header.get(8..12) == Some(WavHeader::WAVE.as_slice())
    {
        return Some(FileType::AudioWav);
    }

    if header.starts_with(BMP_SIGNATURE) {
        return Some(FileType::ImageBmp);
    }

    if header.starts_with(PNG_SIGNATURE) {
        return Some(FileType::ImagePng);
    }

    // JPEG dimensions live in a variable-position SOF segment; type only.
    if header.starts_with(JPEG_SIGNATURE) {
        return Some(FileType::ImageJpeg);
    }

    None
}

/// Parse a file header into type and media attributes.
///
/// `fallback` is the extension-derived type, kept when no signature matches.
/// Truncated headers yield the signature's type with zeroed attributes.
pub fn parse_media_metadata(header: &[u8], fallback: FileType) -> MediaMetadata {
    let mut metadata = MediaMetadata {
        file_type: fallback,
        ..MediaMetadata::default()
    };
    let Some(file_type) = signature_type(header) else {
        return metadata;
    };
    metadata.file_type = file_type;
    match file_type {
        FileType::AudioWav => metadata.audio = parse_wav(header).unwrap_or_default(),
        FileType::ImageBmp => metadata.image = parse_bmp(header).unwrap_or_default(),
        FileType::ImagePng => metadata.image = parse_png(header).unwrap_or_default(),
        _ => {}
    }
    metadata
}

/// Canonical 44-byte header fields. Duration is only derived when the byte
/// rate is non-zero.
fn parse_wav(header: &[u8]) -> Option<AudioAttributes> {
    if header.len() < WavHeader::SIZE {
        return None;
    }
    let sample_rate = le_u32_at(header, 24)?;
    let channels = byte_at(header, 22)?;
    let bits_per_sample = byte_at(header, 34)?;
    let data_size = le_u32_at(header, 40)?;

    let byte_rate = u64::from(sample_rate)
        .saturating_mul(u64::from(channels))
        .saturating_mul(u64::from(bits_per_sample / 8));
    let duration_ms = if sample_rate > 0 && channels > 0 && byte_rate > 0 {
        u64::from(data_size)
            .saturating_mul(1000)
            .checked_div(byte_rate)
            .map_or(0, |ms| u32::try_from(ms).unwrap_or(u32::MAX))
    } else {
        0
    };

    Some(AudioAttributes {
        sample_rate,
        channels,
        bits_per_sample,
        duration_ms,
    })
}

fn parse_bmp(header: &[u8]) -> Option<ImageAttributes> {
    if header.len() < BMP_FIELDS_LEN {
        return None;
    }
    Some(ImageAttributes {
        width: le_u32_at(header, 18)?,
        height: le_u32_at(header, 22)?,
        bits_per_pixel: byte_at(header, 28)?,
    })
}

/// IHDR width/height are network byte order. A header ending exactly at the
/// height field reports a bit depth of 0.
fn parse_png(header: &[u8]) -> Option<ImageAttributes> {
    if header.len() < PNG_FIELDS_LEN {
        return None;
    }
    Some(ImageAttributes {
        width: be_u32_at(header, 16)?,
        height: be_u32_at(header, 20)?,
        bits_per_pixel: byte_at(header, 24).unwrap_or(0),
    })
}
