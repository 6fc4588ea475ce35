use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use image::{DynamicImage, ImageReader};
use tracing_subscriber::EnvFilter;

use mtgscan::detection::ocr::OcrsRecognizer;
use mtgscan::{
    CardScanner, DebugSink, DirectorySink, NoopSink, Region, ScanConfig, ScryfallCatalog, canonicalize,
};

#[derive(Parser)]
#[command(name = "mtgscan")]
#[command(about = "Identify Magic: The Gathering cards from scanned images")]
#[command(version)]
struct Cli {
    /// Card images, upright and cropped to the card edges
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Write one decklist line per identified card
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// TOML file overriding layout and threshold defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Skip OCR step (segmentation only)
    #[arg(long)]
    skip_ocr: bool,

    /// Do not look readings up in the card catalog
    #[arg(long)]
    offline: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    let mut scanner = CardScanner::new(config.clone());
    if !args.skip_ocr {
        scanner = scanner.with_recognizer(Box::new(OcrsRecognizer::from_cache()?));
    }

    let catalog = if args.offline || args.skip_ocr {
        None
    } else {
        Some(ScryfallCatalog::new(&config.catalog)?)
    };

    let debug_sink = match args.debug_out {
        Some(dir) => Some(DirectorySink::new(dir)?),
        None => None,
    };

    let mut output = match &args.output {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => None,
    };

    let mut failures = 0;
    for (index, path) in args.images.iter().enumerate() {
        let img = match load_image(path) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("Skipping {}: {:#}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let card_sink: Box<dyn DebugSink> = match &debug_sink {
            Some(sink) => Box::new(DirectorySink::new(sink.root().join(card_label(index, path)))?),
            None => Box::new(NoopSink),
        };

        println!("\n=== {} ({}x{}) ===", path.display(), img.width(), img.height());

        if args.skip_ocr {
            for region in [Region::Title, Region::CollectorLine, Region::SetLine] {
                match scanner.segment_region(&img, region, card_sink.as_ref()) {
                    Ok(Some(segmentation)) => println!(
                        "{:<15} {} glyphs, crop {}x{}",
                        region.name(),
                        segmentation.glyphs.len(),
                        segmentation.crop.width(),
                        segmentation.crop.height()
                    ),
                    Ok(None) => println!("{:<15} no text found", region.name()),
                    Err(e) => println!("{:<15} failed: {:#}", region.name(), e),
                }
            }
            continue;
        }

        let reading = match scanner.scan(&img, card_sink.as_ref()) {
            Ok(reading) => reading,
            Err(e) => {
                eprintln!("Skipping {}: {:#}", path.display(), e);
                failures += 1;
                continue;
            }
        };
        println!("title:            {}", reading.title);
        println!("set code:         {}", reading.set_code.as_deref().unwrap_or("-"));
        println!("collector number: {}", reading.collector_number.as_deref().unwrap_or("-"));

        let line = match &catalog {
            Some(catalog) => {
                let card_match = canonicalize(catalog, &reading);
                println!("match:            {} ({})", card_match.decklist_line(), card_match.tier());
                card_match.decklist_line()
            }
            None => reading.title.clone(),
        };

        if let Some(out) = output.as_mut() {
            if !line.is_empty() {
                writeln!(out, "{}", line)?;
            }
        }
    }

    if let Some(mut out) = output {
        out.flush()?;
    }

    if failures == args.images.len() {
        anyhow::bail!("no card could be read");
    }
    Ok(())
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))
}

/// Debug subdirectory name for one card, unique within a run
fn card_label(index: usize, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "card".to_string());
    format!("{:02}_{}", index + 1, stem)
}
