//! Property-based tests for file classification and header parsing.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

use mediafs::binary::{BmpHeader, WavHeader};
use mediafs::metadata::HEADER_PROBE_LEN;
use mediafs::{parse_media_metadata, signature_type, FileType};

const EXTENSIONS: &[(&str, FileType)] = &[
    ("wav", FileType::AudioWav),
    ("mp3", FileType::AudioMp3),
    ("jpg", FileType::ImageJpeg),
    ("jpeg", FileType::ImageJpeg),
    ("png", FileType::ImagePng),
    ("bmp", FileType::ImageBmp),
    ("txt", FileType::Text),
    ("log", FileType::Text),
];

fn mixed_case(ext: &str, mask: u16) -> String {
    ext.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask.checked_shr(u32::try_from(i).unwrap_or(u32::MAX)).unwrap_or(0) & 1 == 1 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

proptest::proptest! {
    /// Parsing never panics, whatever the header bytes and length.
    #[test]
    fn parse_never_panics(bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..64)) {
        let _ = parse_media_metadata(&bytes, FileType::Binary);
        let _ = signature_type(&bytes);
    }

    /// Extension matching ignores case and directory names.
    #[test]
    fn extension_case_insensitive(
        idx in 0usize..8,
        mask in proptest::num::u16::ANY,
        dir in "[a-z]{1,8}",
        stem in "[a-z0-9_]{1,12}",
    ) {
        let (ext, expected) = EXTENSIONS.get(idx).copied().unwrap_or(("bin", FileType::Binary));
        let path = format!("{dir}/{stem}.{}", mixed_case(ext, mask));
        proptest::prop_assert_eq!(FileType::from_path(&path), expected);
    }

    /// A RIFF/WAVE header is audio whatever the extension claims.
    #[test]
    fn riff_wave_signature_wins(
        idx in 0usize..8,
        sample_rate in 1u32..=192_000,
        channels in 1u8..=8,
        data_size in proptest::num::u32::ANY,
    ) {
        let (_, fallback) = EXTENSIONS.get(idx).copied().unwrap_or(("bin", FileType::Binary));
        let header = WavHeader { sample_rate, channels, bits_per_sample: 16, data_size }.encode();
        let meta = parse_media_metadata(&header, fallback);
        proptest::prop_assert_eq!(meta.file_type, FileType::AudioWav);
        proptest::prop_assert_eq!(meta.audio.sample_rate, sample_rate);
        proptest::prop_assert_eq!(meta.audio.channels, channels);
    }

    /// Duration matches data_size * 1000 / byte_rate computed in 64 bits.
    #[test]
    fn wav_duration_matches_byte_rate(
        sample_rate in 1u32..=192_000,
        channels in 1u8..=8,
        bytes_per_sample in 1u8..=4,
        data_size in proptest::num::u32::ANY,
    ) {
        let bits_per_sample = bytes_per_sample.saturating_mul(8);
        let header = WavHeader { sample_rate, channels, bits_per_sample, data_size }.encode();
        let meta = parse_media_metadata(&header, FileType::Binary);
        let byte_rate = u64::from(sample_rate) * u64::from(channels) * u64::from(bytes_per_sample);
        let expected = u64::from(data_size) * 1000 / byte_rate;
        proptest::prop_assert_eq!(u64::from(meta.audio.duration_ms), expected.min(u64::from(u32::MAX)));
    }

    /// BMP rows are always padded to a multiple of four bytes.
    #[test]
    fn bmp_row_size_is_word_aligned(width in 0u32..=10_000, bits in proptest::sample::select(vec![1u8, 4, 8, 16, 24, 32])) {
        let header = BmpHeader { width, height: 1, bits_per_pixel: bits };
        let row = header.row_size().unwrap_or(0);
        proptest::prop_assert_eq!(row % 4, 0);
        proptest::prop_assert!(u64::from(row) * 8 >= u64::from(width) * u64::from(bits));
    }

    /// Encoded BMP headers parse back to the same dimensions.
    #[test]
    fn bmp_header_fields_survive_parse(width in 1u32..=4096, height in 1u32..=4096, bits in proptest::sample::select(vec![8u8, 24, 32])) {
        let header = BmpHeader { width, height, bits_per_pixel: bits }.encode();
        proptest::prop_assume!(header.is_some());
        let bytes = header.unwrap_or([0; BmpHeader::SIZE]);
        let meta = parse_media_metadata(bytes.get(..HEADER_PROBE_LEN).unwrap_or(&[]), FileType::Binary);
        proptest::prop_assert_eq!(meta.file_type, FileType::ImageBmp);
        proptest::prop_assert_eq!(meta.image.width, width);
        proptest::prop_assert_eq!(meta.image.height, height);
        proptest::prop_assert_eq!(meta.image.bits_per_pixel, bits);
    }
}
