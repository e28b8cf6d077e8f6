use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam::channel::Receiver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use photo_librarian_core::{
    logging, CancelToken, Config, DeletePair, IndexOutcome, PhotoLibrary, ProgressEvent,
};

#[derive(Parser)]
#[command(name = "photo-librarian")]
#[command(about = "Index a photo library and detect duplicate images")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rotating log files (defaults to stderr logging)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the library index from the photo tree
    Index {
        /// Root of the photo tree (overrides the config file)
        #[arg(long)]
        photos: Option<PathBuf>,

        /// Root of the thumbnail tree (overrides the config file)
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },

    /// Generate thumbnails for every image in the library
    Thumbnails {
        /// Root of the photo tree (overrides the config file)
        #[arg(long)]
        photos: Option<PathBuf>,

        /// Root of the thumbnail tree (overrides the config file)
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },

    /// Detect duplicate and near-duplicate images across the index
    Detect {
        /// Maximum hash distance for two images to count as duplicates
        #[arg(long)]
        threshold: Option<u64>,
    },

    /// Delete images and prune them from the persisted artifacts
    Delete {
        /// JSON file holding an array of {original, thumbnail} pairs
        pairs: PathBuf,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "photo-librarian.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Initialize logging: rotating files when a directory is given, stderr
    // otherwise
    match &cli.log_dir {
        Some(dir) => logging::init_logger(dir)
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?,
        None => env_logger::init(),
    }

    // Set up configuration
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    // A Ctrl-C requests cancellation at the next batch boundary
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install Ctrl-C handler")?;

    match cli.command {
        Commands::Index { photos, thumbnails } => {
            apply_root_overrides(&mut config, photos, thumbnails);
            config.validate()?;
            let library = PhotoLibrary::new(config);

            let (tx, rx) = crossbeam::channel::unbounded();
            let bar = spawn_progress_bar(rx, "Indexing");
            let outcome = library.build_index(Some(&tx), &cancel);
            drop(tx);
            let _ = bar.join();

            match outcome? {
                IndexOutcome::Complete(records) => {
                    println!("Indexed {} images", records.len());
                }
                IndexOutcome::Cancelled => {
                    println!("Cancelled; previous index left untouched");
                }
            }
            Ok(())
        }

        Commands::Thumbnails { photos, thumbnails } => {
            apply_root_overrides(&mut config, photos, thumbnails);
            config.validate()?;
            let library = PhotoLibrary::new(config);

            let (tx, rx) = crossbeam::channel::unbounded();
            let bar = spawn_progress_bar(rx, "Generating thumbnails");
            let generated = library.generate_thumbnails(Some(&tx), &cancel);
            drop(tx);
            let _ = bar.join();

            println!("Generated {} thumbnails", generated?);
            Ok(())
        }

        Commands::Detect { threshold } => {
            if let Some(threshold) = threshold {
                config.hash_threshold = threshold;
            }
            let library = PhotoLibrary::new(config);

            let (tx, rx) = crossbeam::channel::unbounded();
            let bar = spawn_progress_bar(rx, "Detecting duplicates");
            let report = library.detect_duplicates(Some(&tx), &cancel);
            drop(tx);
            let _ = bar.join();

            let report = report?;
            println!(
                "Found {} duplicate groups ({} hash, {} exif)",
                report.len(),
                report.hash.len(),
                report.exif.len()
            );
            Ok(())
        }

        Commands::Delete { pairs } => {
            let contents = std::fs::read_to_string(&pairs)
                .with_context(|| format!("failed to read {}", pairs.display()))?;
            let selected: Vec<DeletePair> = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse {}", pairs.display()))?;

            let library = PhotoLibrary::new(config);
            let deleted = library.delete_images(&selected)?;
            println!("Deleted {} images", deleted);
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn apply_root_overrides(
    config: &mut Config,
    photos: Option<PathBuf>,
    thumbnails: Option<PathBuf>,
) {
    if let Some(photos) = photos {
        config.photos_root = photos;
    }
    if let Some(thumbnails) = thumbnails {
        config.thumbnails_root = thumbnails;
    }
}

/// Render engine progress events on a dedicated thread so the library stays
/// free of any presentation dependency
fn spawn_progress_bar(rx: Receiver<ProgressEvent>, message: &str) -> thread::JoinHandle<()> {
    let message = message.to_string();
    thread::spawn(move || {
        let bar = ProgressBar::hidden();
        let mut visible = false;

        for event in rx {
            match event {
                ProgressEvent::Indexing { processed, total }
                | ProgressEvent::Thumbnails { processed, total }
                | ProgressEvent::Detecting { processed, total } => {
                    if !visible {
                        bar.set_length(total as u64);
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                                .unwrap()
                                .progress_chars("##-"),
                        );
                        bar.set_message(message.clone());
                        bar.set_draw_target(ProgressDrawTarget::stderr());
                        visible = true;
                    }
                    bar.set_position(processed as u64);
                }
                ProgressEvent::Classified {
                    thumbnail,
                    label,
                    confidence,
                } => {
                    info!("Classified {} as {} ({:.1}%)", thumbnail, label, confidence);
                }
            }
        }

        if visible {
            bar.finish_and_clear();
        }
    })
}
