//! Fixed-layout media headers and byte-order helpers.
//!
//! WAV and BMP headers are little-endian throughout; PNG's IHDR fields are
//! big-endian (network order). Every field is written at an explicit offset
//! with an explicit byte order; nothing depends on in-memory struct layout.

use platform::config::{BMP_HEADER_SIZE, WAV_HEADER_SIZE};

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

/// Little-endian `u32` at `offset`, or `None` if the buffer is too short.
#[must_use]
pub fn le_u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = buf.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Big-endian `u32` at `offset`, or `None` if the buffer is too short.
#[must_use]
pub fn be_u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = buf.get(offset..end)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Single byte at `offset`.
#[must_use]
pub fn byte_at(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

// ---------------------------------------------------------------------------
// WavHeader: 44-byte canonical PCM header
// ---------------------------------------------------------------------------

/// Canonical PCM WAV header.
///
/// Layout (44 bytes, all integers little-endian):
/// ```text
/// [0..4]   "RIFF"
/// [4..8]   file_size        u32  (data_size + 36)
/// [8..12]  "WAVE"
/// [12..16] "fmt "
/// [16..20] fmt chunk size   u32  = 16
/// [20..22] audio format     u16  = 1 (PCM)
/// [22..24] channels         u16
/// [24..28] sample_rate      u32
/// [28..32] byte_rate        u32  (sample_rate * channels * bits/8)
/// [32..34] block_align      u16  (channels * bits/8)
/// [34..36] bits_per_sample  u16
/// [36..40] "data"
/// [40..44] data_size        u32
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u8,
    /// Bits per sample (8, 16, 24, 32)
    pub bits_per_sample: u8,
    /// Length of the `data` chunk payload in bytes
    pub data_size: u32,
}

impl WavHeader {
    /// Encoded length in bytes
    pub const SIZE: usize = WAV_HEADER_SIZE;
    /// Container chunk ID
    pub const RIFF: &'static [u8; 4] = b"RIFF";
    /// RIFF form type
    pub const WAVE: &'static [u8; 4] = b"WAVE";
    /// Format chunk ID
    pub const FMT: &'static [u8; 4] = b"fmt ";
    /// Data chunk ID
    pub const DATA: &'static [u8; 4] = b"data";
    /// WAVE_FORMAT_PCM
    pub const FORMAT_PCM: u16 = 1;

    /// Bytes per second of audio. Saturates at `u32::MAX`.
    #[must_use]
    pub fn byte_rate(&self) -> u32 {
        let rate = u64::from(self.sample_rate)
            .saturating_mul(u64::from(self.channels))
            .saturating_mul(u64::from(self.bits_per_sample / 8));
        u32::try_from(rate).unwrap_or(u32::MAX)
    }

    /// Bytes per sample frame (all channels).
    #[must_use]
    pub fn block_align(&self) -> u16 {
        u16::from(self.channels).saturating_mul(u16::from(self.bits_per_sample / 8))
    }

    /// RIFF chunk size: everything after the first 8 bytes.
    #[must_use]
    pub fn file_size(&self) -> u32 {
        self.data_size.saturating_add(36)
    }

    /// Encode the header into a 44-byte buffer.
    ///
    /// # Safety (lint allow)
    /// All range indices are compile-time constants within `[0, SIZE)`.
    /// The buffer is `[u8; Self::SIZE]` so all slices are always valid.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(Self::RIFF);
        buf[4..8].copy_from_slice(&self.file_size().to_le_bytes());
        buf[8..12].copy_from_slice(Self::WAVE);
        buf[12..16].copy_from_slice(Self::FMT);
        buf[16..20].copy_from_slice(&16u32.to_le_bytes());
        buf[20..22].copy_from_slice(&Self::FORMAT_PCM.to_le_bytes());
        buf[22..24].copy_from_slice(&u16::from(self.channels).to_le_bytes());
        buf[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        buf[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        buf[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        buf[34..36].copy_from_slice(&u16::from(self.bits_per_sample).to_le_bytes());
        buf[36..40].copy_from_slice(Self::DATA);
        buf[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        buf
    }
}

// ---------------------------------------------------------------------------
// BmpHeader: 54-byte BITMAPFILEHEADER + BITMAPINFOHEADER
// ---------------------------------------------------------------------------

/// Uncompressed BMP header.
///
/// Layout (54 bytes, all integers little-endian):
/// ```text
/// [0..2]   "BM"
/// [2..6]   file_size        u32  (54 + image_size)
/// [6..10]  reserved         0
/// [10..14] pixel offset     u32  = 54
/// [14..18] info size        u32  = 40
/// [18..22] width            u32
/// [22..26] height           u32
/// [26..28] planes           u16  = 1
/// [28..30] bits_per_pixel   u16
/// [30..34] compression      0 (BI_RGB)
/// [34..38] image_size       u32  (row_size * height)
/// [38..54] resolution / palette counts, 0
/// ```
///
/// Rows are padded to a multiple of 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels (positive: rows stored bottom-up)
    pub height: u32,
    /// Bits per pixel
    pub bits_per_pixel: u8,
}

impl BmpHeader {
    /// Encoded length in bytes; also the pixel array offset
    pub const SIZE: usize = BMP_HEADER_SIZE;
    /// File signature
    pub const MAGIC: &'static [u8; 2] = b"BM";
    /// BITMAPINFOHEADER length
    pub const INFO_SIZE: u32 = 40;

    /// Padded row stride: `ceil(bits_per_pixel * width / 32) * 4`.
    ///
    /// `None` if the stride does not fit in a `u32`.
    #[must_use]
    pub fn row_size(&self) -> Option<u32> {
        let bits = u64::from(self.bits_per_pixel).checked_mul(u64::from(self.width))?;
        let words = bits.checked_add(31)?.checked_div(32)?;
        u32::try_from(words.checked_mul(4)?).ok()
    }

    /// Size of the pixel array in bytes.
    #[must_use]
    pub fn image_size(&self) -> Option<u32> {
        self.row_size()?.checked_mul(self.height)
    }

    /// Total file size: header plus pixel array.
    #[must_use]
    pub fn file_size(&self) -> Option<u32> {
        self.image_size()?.checked_add(u32::try_from(Self::SIZE).ok()?)
    }

    /// Encode the header into a 54-byte buffer.
    ///
    /// Returns `None` when the image is too large for the 32-bit size fields.
    ///
    /// # Safety (lint allow)
    /// All range indices are compile-time constants within `[0, SIZE)`.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn encode(&self) -> Option<[u8; Self::SIZE]> {
        let image_size = self.image_size()?;
        let file_size = self.file_size()?;
        let pixel_offset = u32::try_from(Self::SIZE).ok()?;

        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(Self::MAGIC);
        buf[2..6].copy_from_slice(&file_size.to_le_bytes());
        buf[10..14].copy_from_slice(&pixel_offset.to_le_bytes());
        buf[14..18].copy_from_slice(&Self::INFO_SIZE.to_le_bytes());
        buf[18..22].copy_from_slice(&self.width.to_le_bytes());
        buf[22..26].copy_from_slice(&self.height.to_le_bytes());
        buf[26..28].copy_from_slice(&1u16.to_le_bytes());
        buf[28..30].copy_from_slice(&u16::from(self.bits_per_pixel).to_le_bytes());
        buf[34..38].copy_from_slice(&image_size.to_le_bytes());
        Some(buf)
    }
}

/// Byte offset of pixel row `line_number` in a BMP file.
///
/// `None` on overflow.
#[must_use]
pub fn bmp_line_offset(line_number: u32, bytes_per_line: u32) -> Option<u64> {
    u64::from(line_number)
        .checked_mul(u64::from(bytes_per_line))?
        .checked_add(u64::try_from(BmpHeader::SIZE).ok()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    fn cd_quality() -> WavHeader {
        WavHeader {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            data_size: 176_400,
        }
    }

    #[test]
    fn wav_header_size_is_44_bytes() {
        assert_eq!(cd_quality().encode().len(), 44);
    }

    #[test]
    fn wav_header_chunk_ids() {
        let bytes = cd_quality().encode();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
    }

    #[test]
    fn wav_header_fields_little_endian() {
        let bytes = cd_quality().encode();
        assert_eq!(le_u32_at(&bytes, 4), Some(176_436));
        assert_eq!(le_u32_at(&bytes, 16), Some(16));
        assert_eq!(&bytes[20..22], &[1, 0]);
        assert_eq!(&bytes[22..24], &[2, 0]);
        assert_eq!(le_u32_at(&bytes, 24), Some(44_100));
        assert_eq!(le_u32_at(&bytes, 28), Some(176_400));
        assert_eq!(&bytes[32..34], &[4, 0]);
        assert_eq!(&bytes[34..36], &[16, 0]);
        assert_eq!(le_u32_at(&bytes, 40), Some(176_400));
    }

    #[test]
    fn wav_byte_rate_drops_partial_bytes() {
        let h = WavHeader {
            sample_rate: 8_000,
            channels: 1,
            bits_per_sample: 4,
            data_size: 0,
        };
        assert_eq!(h.byte_rate(), 0);
        assert_eq!(h.block_align(), 0);
    }

    #[test]
    fn wav_file_size_saturates() {
        let h = WavHeader {
            data_size: u32::MAX,
            ..cd_quality()
        };
        assert_eq!(h.file_size(), u32::MAX);
    }

    #[test]
    fn bmp_row_size_padded_to_four_bytes() {
        let h = BmpHeader {
            width: 100,
            height: 50,
            bits_per_pixel: 24,
        };
        // 100 px * 3 B = 300 B, already aligned
        assert_eq!(h.row_size(), Some(300));
        let odd = BmpHeader {
            width: 3,
            height: 1,
            bits_per_pixel: 24,
        };
        // 9 B rounds up to 12
        assert_eq!(odd.row_size(), Some(12));
        let mono = BmpHeader {
            width: 1,
            height: 1,
            bits_per_pixel: 1,
        };
        assert_eq!(mono.row_size(), Some(4));
    }

    #[test]
    fn bmp_header_fields() {
        let h = BmpHeader {
            width: 100,
            height: 50,
            bits_per_pixel: 24,
        };
        let bytes = h.encode().unwrap();
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(le_u32_at(&bytes, 2), Some(54 + 300 * 50));
        assert_eq!(le_u32_at(&bytes, 10), Some(54));
        assert_eq!(le_u32_at(&bytes, 14), Some(40));
        assert_eq!(le_u32_at(&bytes, 18), Some(100));
        assert_eq!(le_u32_at(&bytes, 22), Some(50));
        assert_eq!(&bytes[26..28], &[1, 0]);
        assert_eq!(&bytes[28..30], &[24, 0]);
        assert_eq!(le_u32_at(&bytes, 34), Some(300 * 50));
    }

    #[test]
    fn bmp_oversized_image_rejected() {
        let h = BmpHeader {
            width: u32::MAX,
            height: u32::MAX,
            bits_per_pixel: 32,
        };
        assert_eq!(h.encode(), None);
    }

    #[test]
    fn bmp_line_offset_starts_after_header() {
        assert_eq!(bmp_line_offset(0, 300), Some(54));
        assert_eq!(bmp_line_offset(2, 300), Some(654));
    }

    #[test]
    fn readers_reject_short_buffers() {
        let buf = [0u8; 6];
        assert_eq!(le_u32_at(&buf, 3), None);
        assert_eq!(be_u32_at(&buf, usize::MAX), None);
        assert_eq!(byte_at(&buf, 6), None);
    }

    #[test]
    fn big_endian_reader() {
        let buf = [0u8, 0, 1, 0];
        assert_eq!(be_u32_at(&buf, 0), Some(256));
        assert_eq!(le_u32_at(&buf, 0), Some(65_536));
    }
}
