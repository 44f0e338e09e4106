//! xtask mkwav / mkbmp: write blank media files through the router.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use mediafs::binary::{BmpHeader, WavHeader};
use mediafs::StorageRouter;

/// Zero bytes written per call when filling audio data.
const CHUNK_SIZE: usize = 4096;

/// Parameters of a silent PCM file.
#[derive(Debug, Clone, Copy)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u8,
    pub bits: u8,
    pub seconds: u32,
}

impl WavSpec {
    fn data_size(&self) -> Option<u32> {
        let header = WavHeader {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits,
            data_size: 0,
        };
        header.byte_rate().checked_mul(self.seconds)
    }
}

/// Entry point for `xtask mkwav`.
pub fn wav(router: &mut StorageRouter, address: &str, spec: &WavSpec) -> Result<()> {
    let written = write_wav(router, address, spec)?;
    println!("{} {address} ({written} bytes)", "created".green().bold());
    Ok(())
}

/// Entry point for `xtask mkbmp`.
pub fn bmp(router: &mut StorageRouter, address: &str, width: u32, height: u32, bpp: u8) -> Result<()> {
    let written = write_bmp(router, address, width, height, bpp)?;
    println!("{} {address} ({written} bytes)", "created".green().bold());
    Ok(())
}

/// Create `address` and make it the routed active file.
fn create_and_open(router: &mut StorageRouter, address: &str) -> Result<()> {
    if router.file_exists(address) {
        bail!("{address} already exists");
    }
    if !router.create_file(address, 0) {
        bail!("could not create {address}");
    }
    if !router.set_file(address) {
        bail!("could not open {address}");
    }
    Ok(())
}

/// Header plus zeroed data. Returns the file size.
pub(crate) fn write_wav(router: &mut StorageRouter, address: &str, spec: &WavSpec) -> Result<u64> {
    let data_size = spec
        .data_size()
        .context("audio data does not fit a 32-bit WAV chunk")?;
    if data_size == 0 && spec.seconds > 0 {
        bail!(
            "{} Hz, {} ch, {}-bit produces no sample data",
            spec.sample_rate,
            spec.channels,
            spec.bits
        );
    }
    create_and_open(router, address)?;
    if !router.write_audio_header_wav(spec.sample_rate, spec.channels, spec.bits, data_size) {
        bail!("failed to write WAV header to {address}");
    }

    let zeros = [0u8; CHUNK_SIZE];
    let mut remaining = u64::from(data_size);
    while remaining > 0 {
        let n = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        let chunk = zeros.get(..n).unwrap_or(&zeros);
        if !router.write_audio_chunk(chunk) {
            bail!("failed to write audio data to {address}");
        }
        remaining = remaining.saturating_sub(u64::try_from(n).unwrap_or(u64::MAX));
    }
    Ok(u64::from(data_size).saturating_add(44))
}

/// Header plus zeroed rows, written one line at a time. Returns the file size.
pub(crate) fn write_bmp(
    router: &mut StorageRouter,
    address: &str,
    width: u32,
    height: u32,
    bpp: u8,
) -> Result<u64> {
    let header = BmpHeader {
        width,
        height,
        bits_per_pixel: bpp,
    };
    let (Some(row_size), Some(file_size)) = (header.row_size(), header.file_size()) else {
        bail!("{width}x{height} at {bpp} bpp is too large for BMP");
    };
    create_and_open(router, address)?;
    if !router.write_image_header_bmp(width, height, bpp) {
        bail!("failed to write BMP header to {address}");
    }
    let row = vec![0u8; usize::try_from(row_size)?];
    for line in 0..height {
        if !router.write_image_line(&row, line, row_size) {
            bail!("failed to write row {line} to {address}");
        }
    }
    Ok(u64::from(file_size))
}
