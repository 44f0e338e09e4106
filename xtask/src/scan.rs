//! xtask scan: walk a directory mount and tally what the router detects.
//!
//! The walk happens on the host path behind the mount (walkdir); every file
//! found is then looked up through the router, so the tally reflects
//! signature-based detection rather than file extensions.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use mediafs::{split_address, FileType, RouterConfig, StorageRouter};
use walkdir::WalkDir;

/// Totals gathered by one scan.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ScanReport {
    pub files: usize,
    pub bytes: u64,
    /// File count per MIME type
    pub by_mime: BTreeMap<&'static str, usize>,
    /// Summed duration of WAV files with a parsed header
    pub audio_ms: u64,
    /// Images whose dimensions were recovered
    pub sized_images: usize,
    /// Files whose content contradicted their extension
    pub retyped: usize,
}

/// Entry point called from main.rs
pub fn run(config: &RouterConfig, router: &mut StorageRouter, address: &str) -> Result<()> {
    println!("Scanning: {}", address.cyan());
    let report = scan(config, router, address)?;
    print_report(&report);
    Ok(())
}

/// Walk the host directory behind `address` and classify every file.
pub(crate) fn scan(
    config: &RouterConfig,
    router: &mut StorageRouter,
    address: &str,
) -> Result<ScanReport> {
    let (prefix, relative) = split_address(address)?;
    // Later mounts override earlier ones for the same prefix.
    let Some(mount) = config.mounts.iter().rev().find(|m| m.prefix == prefix) else {
        bail!("no mount for prefix {prefix}");
    };
    let Some(root) = mount.root.as_deref() else {
        bail!("{prefix}:// is a memory mount; scan needs a directory");
    };

    let mut report = ScanReport::default();
    for dirent in WalkDir::new(root.join(relative)).sort_by_file_name() {
        let dirent = dirent.context("walking mount")?;
        if !dirent.file_type().is_file() {
            continue;
        }
        let Some(volume_path) = volume_path(root, dirent.path()) else {
            tracing::warn!("skipping {}: not a UTF-8 path", dirent.path().display());
            continue;
        };
        let routed = format!("{prefix}://{volume_path}");
        let Some(entry) = router.get_file_info(&routed) else {
            continue;
        };

        report.files = report.files.saturating_add(1);
        report.bytes = report.bytes.saturating_add(entry.size);
        let count = report.by_mime.entry(entry.mime_type()).or_default();
        *count = count.saturating_add(1);
        if entry.file_type != FileType::from_path(&entry.path) {
            report.retyped = report.retyped.saturating_add(1);
        }
        if entry.file_type == FileType::AudioWav {
            report.audio_ms = report.audio_ms.saturating_add(u64::from(entry.audio.duration_ms));
        }
        if entry.is_image() && entry.image.width > 0 {
            report.sized_images = report.sized_images.saturating_add(1);
        }
    }
    Ok(report)
}

/// `/`-separated path of `full` relative to the mount root.
fn volume_path(root: &Path, full: &Path) -> Option<String> {
    let rel = full.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.iter().map(|part| part.to_str()).collect();
    Some(parts?.join("/"))
}

fn print_report(report: &ScanReport) {
    println!("Found {} files ({} bytes)", report.files, report.bytes);
    for (mime, count) in &report.by_mime {
        println!("  {mime:<28} {count:>6}");
    }
    println!(
        "Audio: {} s of WAV   Images: {} with dimensions",
        report.audio_ms / 1000,
        report.sized_images
    );
    if report.retyped > 0 {
        println!(
            "{}",
            format!("{} files detected by content, not extension", report.retyped).yellow()
        );
    }
}
