//! xtask ls / info: routed listings with type and media columns.

use anyhow::{bail, Result};
use colored::Colorize;
use mediafs::{FileEntry, StorageRouter};

/// Entry point for `xtask ls`.
pub fn ls(router: &mut StorageRouter, address: &str, json: bool) -> Result<()> {
    let entries = list_entries(router, address)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    println!("{}", address.cyan().bold());
    for entry in &entries {
        let line = format_entry(entry);
        if entry.is_directory {
            println!("  {}", line.blue());
        } else {
            println!("  {line}");
        }
    }
    println!("{}", format!("{} entries", entries.len()).dimmed());
    Ok(())
}

/// Entry point for `xtask info`.
pub fn info(router: &mut StorageRouter, address: &str, json: bool) -> Result<()> {
    let Some(entry) = router.get_file_info(address) else {
        bail!("no such file or directory: {address}");
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}", format_entry(&entry));
    }
    Ok(())
}

/// Routed listing, sorted by path. An empty result for a path that does not
/// exist is an error rather than an empty directory.
pub(crate) fn list_entries(router: &mut StorageRouter, address: &str) -> Result<Vec<FileEntry>> {
    let mut entries = router.list_directory(address);
    if entries.is_empty() && !router.file_exists(address) {
        bail!("no such directory: {address}");
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// One listing line: path, size, MIME and whatever media fields were parsed.
pub(crate) fn format_entry(entry: &FileEntry) -> String {
    if entry.is_directory {
        return format!("{}/", entry.path);
    }
    let mut line = format!("{:<40} {:>10}  {}", entry.path, entry.size, entry.mime_type());
    if entry.is_audio() && entry.audio.sample_rate > 0 {
        let audio = entry.audio;
        line.push_str(&format!(
            "  {} Hz {}ch {}-bit {}",
            audio.sample_rate,
            audio.channels,
            audio.bits_per_sample,
            format_duration(audio.duration_ms)
        ));
    }
    if entry.is_image() && entry.image.width > 0 {
        let image = entry.image;
        line.push_str(&format!("  {}x{}", image.width, image.height));
        if image.bits_per_pixel > 0 {
            line.push_str(&format!(" {}bpp", image.bits_per_pixel));
        }
    }
    line
}

/// `m:ss.mmm`
fn format_duration(ms: u32) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}
