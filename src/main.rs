use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::mpsc;

use thumbrs::core::extract::AutoExtractor;
use thumbrs::core::info::load_preview;
use thumbrs::core::media::MediaItem;
use thumbrs::core::worker::{ThumbnailerConfig, ThumbnailerService, UiMessage};
use thumbrs::services::fs::{media_match_hash, media_unique_name};
use thumbrs::services::scanner::{self, ScanOptions};
use thumbrs::services::storage;

/// Edge of the square preview rendered by the `info` command.
const PREVIEW_EDGE: u32 = 480;

#[derive(Parser, Debug)]
#[command(name = "thumbrs", version, about = "CLI for generating media thumbnails")]
struct Cli {
    /// Optional JSON settings file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate thumbnails for every media file under a directory
    Generate {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
        /// Directory to write thumbnails into (default: user cache dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Show metadata and preview dimensions for a single media file
    Info {
        #[arg(short, long, value_name = "FILE")]
        path: PathBuf,
    },

    /// Print the subtitle-matching hash of a media file
    Hash {
        #[arg(short, long, value_name = "FILE")]
        path: PathBuf,
    },

    /// List mounted volumes and their free space
    Volumes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    thumbnailer: ThumbnailerConfig,
    scan: ScanOptions,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { path, out } => generate(&path, out, settings),

        Commands::Info { path } => {
            let extractor = AutoExtractor::new();
            let preview = load_preview(&path, &extractor, PREVIEW_EDGE)?;
            let info = &preview.info;

            println!("🗂  {}", info.title);
            println!("   path:     {}", info.path.display());
            println!("   size:     {}", HumanBytes(info.size_bytes));
            if let Some(modified) = &info.modified_at {
                println!("   modified: {}", modified);
            }
            match &preview.image {
                Some(image) => println!("   preview:  {}x{} px", image.width(), image.height()),
                None => println!("   preview:  unavailable"),
            }
            Ok(())
        }

        Commands::Hash { path } => {
            let hash = media_match_hash(&path)
                .with_context(|| format!("Failed to hash {}", path.display()))?;
            println!("{hash}");
            Ok(())
        }

        Commands::Volumes => {
            for volume in storage::volumes() {
                println!("💾 {} ({})", volume.name, volume.mount_point);
                println!(
                    "   {} free of {}",
                    HumanBytes(volume.available_capacity),
                    HumanBytes(volume.total_capacity)
                );
            }
            Ok(())
        }
    }
}

/// Run the thumbnail pipeline over a directory, acting as its consumer:
/// drain worker messages, persist each published thumbnail, and acknowledge
/// the rendezvous barrier once the item is safely on disk.
fn generate(dir: &Path, out: Option<PathBuf>, settings: Settings) -> Result<()> {
    let out_dir = out.unwrap_or_else(default_cache_dir);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    println!("▶ Scanning for media in: {}", dir.display());
    let files = scanner::discover_media(dir, &settings.scan)?;
    if files.is_empty() {
        println!("No media files found.");
        return Ok(());
    }
    let total = files.len();
    println!("Found {} media file(s)", total);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let service =
        ThumbnailerService::spawn(Arc::new(AutoExtractor::new()), tx, settings.thumbnailer);
    let barrier = service.barrier();
    for file in files {
        service.add_job(MediaItem::new(file));
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?);

    let mut serviced = 0usize;
    let mut written = 0usize;
    while let Some(message) = rx.blocking_recv() {
        match message {
            UiMessage::ShowProgress => {}
            UiMessage::HideProgress => {
                // The worker goes idle again once every queued job has been
                // serviced or skipped.
                if serviced == total {
                    break;
                }
            }
            UiMessage::SetStatusText { text, .. } => {
                if !text.is_empty() {
                    serviced += 1;
                    bar.set_message(text);
                }
            }
            UiMessage::ItemUpdated(mut item) => {
                match save_thumbnail(&mut item, &out_dir) {
                    Ok(dest) => {
                        written += 1;
                        log::debug!("wrote {}", dest.display());
                    }
                    Err(e) => log::warn!("failed to write thumbnail for {}: {}", item.file_name, e),
                }
                bar.inc(1);
                if barrier.arrive().is_err() {
                    break;
                }
            }
        }
    }

    bar.finish_and_clear();
    service.stop();
    println!(
        "✅ Wrote {} of {} thumbnail(s) to {}",
        written,
        total,
        out_dir.display()
    );
    Ok(())
}

fn save_thumbnail(item: &mut MediaItem, out_dir: &Path) -> Result<PathBuf> {
    let image = item
        .take_thumbnail()
        .context("published item carried no thumbnail")?;
    let modified = fs::metadata(&item.path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH);
    let name = media_unique_name(&item.path.to_string_lossy(), modified);
    let dest = out_dir.join(format!("{name}.png"));
    image.save(&dest)?;
    Ok(dest)
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Could not read settings file {:?}", path))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Malformed settings file {:?}", path))
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("thumbrs")
        .join("thumbnails")
}
