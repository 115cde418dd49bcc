use clap::{Parser, Subcommand};
use image_intake::output::{self, InspectResult, RecordReport};
use image_intake::{EditIntent, HashAlgorithm, ImageConfig, ImageFormat, ImageManager, ImageRecord, config};
use log::debug;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "image-intake")]
#[command(about = "Validate, convert and fingerprint images")]
#[command(long_about = "\
Validate, convert and fingerprint images

A SOURCE is a file path, a directory (inspect only), an http(s) URL, a
protocol-relative //host/path URL or a data: URL. Formats are sniffed from
the bytes, never from the name.

Examples:

  image-intake inspect photos/ --recursive
  image-intake convert dawn.jpg --output out --format webp --width 400 --height 300
  image-intake convert https://example.com/a.png --output out --max-width 1024
  image-intake hash dawn.jpg --algorithm dct --algorithm sha256

Set RUST_LOG=debug to see each validation decision.
Run 'image-intake gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); stock defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Image to convert
    source: String,

    /// Directory the converted image is written to
    #[arg(long, short)]
    output: PathBuf,

    /// Target format (jpeg, png, gif, webp, bmp, tiff, ico)
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Shrink so the width is at most this, keeping the aspect ratio
    #[arg(long)]
    max_width: Option<u32>,

    /// Shrink so the height is at most this, keeping the aspect ratio
    #[arg(long)]
    max_height: Option<u32>,

    /// Encoder quality 1-100 (lossy formats only)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// File name inside the output directory; defaults to the content name
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate sources and print what they are
    Inspect {
        /// Files, directories or URLs
        #[arg(required = true)]
        sources: Vec<String>,

        /// Descend into subdirectories
        #[arg(long, short)]
        recursive: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resize and/or re-encode one image and save the result
    Convert(ConvertArgs),
    /// Print named hashes of one image in hex
    Hash {
        source: String,

        /// Algorithm name, repeatable; all algorithms when omitted
        #[arg(long = "algorithm", short)]
        algorithms: Vec<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config_path = cli.config;

    match cli.command {
        Command::Inspect {
            sources,
            recursive,
            json,
        } => {
            let manager = build_manager(config_path.as_deref())?;
            let sources = expand_sources(&sources, recursive);
            let results: Vec<InspectResult> = sources
                .par_iter()
                .map(|source| inspect(&manager, source))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                output::print_inspect_output(&results);
            }

            let failed = results.iter().filter(|r| !r.is_ok()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} sources failed", results.len()).into());
            }
        }
        Command::Convert(args) => {
            let manager = build_manager(config_path.as_deref())?;
            let record = ingest(&manager, &args.source)?;
            let mut intent = EditIntent::new(&record)
                .format(args.format)
                .width(args.width)
                .height(args.height)
                .quality(args.quality);
            if let Some(width) = args.max_width {
                intent = intent.max_width(width);
            }
            if let Some(height) = args.max_height {
                intent = intent.max_height(height);
            }

            let converted = manager.convert_to(&intent)?;
            let saved = manager.save_to(&converted, &args.output, args.name.as_deref())?;
            output::print_convert_output(&args.source, &record, &saved);
        }
        Command::Hash { source, algorithms } => {
            let manager = build_manager(config_path.as_deref())?;
            let record = ingest(&manager, &source)?;
            let names: Vec<String> = if algorithms.is_empty() {
                HashAlgorithm::ALL.iter().map(|a| a.to_string()).collect()
            } else {
                algorithms
            };

            let mut hashes = Vec::with_capacity(names.len());
            for name in names {
                let hash = manager.hash(&record, &name)?;
                hashes.push((name, hash));
            }
            output::print_hash_output(&source, &hashes);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn build_manager(config_path: Option<&Path>) -> Result<ImageManager, Box<dyn std::error::Error>> {
    let image_config = match config_path {
        Some(path) => config::load_config(path)?,
        None => ImageConfig::default(),
    };
    Ok(ImageManager::new(image_config)?)
}

/// Anything that isn't a URL is a path.
fn is_url(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("data:")
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || source.starts_with("//")
}

fn ingest(manager: &ImageManager, source: &str) -> image_intake::Result<ImageRecord> {
    if is_url(source) {
        manager.from_url(source)
    } else {
        manager.from_file(source)
    }
}

fn inspect(manager: &ImageManager, source: &str) -> InspectResult {
    let record = match ingest(manager, source) {
        Ok(record) => record,
        Err(e) => return InspectResult::failed(source, e),
    };
    match manager.is_animated(&record) {
        Ok(animated) => InspectResult::ok(source, RecordReport::new(&record, animated)),
        Err(e) => InspectResult::failed(source, e),
    }
}

/// Replace directory sources by the files inside them, sorted by path.
fn expand_sources(sources: &[String], recursive: bool) -> Vec<String> {
    let mut expanded = Vec::new();
    for source in sources {
        if is_url(source) || !Path::new(source).is_dir() {
            expanded.push(source.clone());
            continue;
        }
        let before = expanded.len();
        let walker = WalkDir::new(source)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                expanded.push(entry.path().display().to_string());
            }
        }
        debug!("Expanded {source} to {} files", expanded.len() - before);
    }
    expanded
}
