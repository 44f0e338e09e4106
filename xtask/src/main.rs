// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod create;
mod list;
mod scan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mediafs::{RouterConfig, StorageRouter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Media filesystem tools for SD card volumes", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON mount table; defaults to $STORAGE_ROOT (or .) mounted as sd://
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log more (-v debug, -vv trace); otherwise RUST_LOG or warn
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory with detected types and media fields
    Ls {
        /// Routed address, e.g. sd://music
        address: String,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one enriched entry
    Info {
        /// Routed address, e.g. sd://music/track01.wav
        address: String,
        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Walk a directory mount recursively and tally file types
    Scan {
        /// Routed address of the directory to walk
        address: String,
    },
    /// Create a silent PCM WAV file
    Mkwav {
        /// Routed address of the new file
        address: String,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long, default_value_t = 2)]
        channels: u8,
        #[arg(long, default_value_t = 16)]
        bits: u8,
        #[arg(long, default_value_t = 1)]
        seconds: u32,
    },
    /// Create a blank uncompressed BMP file
    Mkbmp {
        /// Routed address of the new file
        address: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, default_value_t = 24)]
        bpp: u8,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<RouterConfig> {
    match path {
        Some(path) => RouterConfig::load(path)
            .with_context(|| format!("loading mounts from {}", path.display())),
        None => Ok(RouterConfig::from_env()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let mut router: StorageRouter = config.build_router().context("building storage router")?;

    match cli.command {
        Commands::Ls { address, json } => list::ls(&mut router, &address, json),
        Commands::Info { address, json } => list::info(&mut router, &address, json),
        Commands::Scan { address } => scan::run(&config, &mut router, &address),
        Commands::Mkwav {
            address,
            sample_rate,
            channels,
            bits,
            seconds,
        } => create::wav(
            &mut router,
            &address,
            &create::WavSpec {
                sample_rate,
                channels,
                bits,
                seconds,
            },
        ),
        Commands::Mkbmp {
            address,
            width,
            height,
            bpp,
        } => create::bmp(&mut router, &address, width, height, bpp),
    }
}
