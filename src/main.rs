use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nfc_locator::batch::{collect_images, BatchContext, BatchProcessor};
use nfc_locator::dataset::write_json;
use nfc_locator::marking::{check_geometries, mark_record, read_geometries};
use nfc_locator::{Detector, DetectorConfig, Rect};

#[derive(Parser)]
#[command(name = "nfc-locator")]
#[command(about = "Locate hand-drawn NFC antenna markers on device photos")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Detector thresholds as JSON (partial files allowed)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect markers in every image below a folder (brand/model/image layout)
    Detect {
        /// Folder (or single image) to scan
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Accepted records
        #[arg(short, long, value_name = "FILE", default_value = "nfc_locations.json")]
        output: PathBuf,

        /// Images kept aside for review, with reasons
        #[arg(long, value_name = "FILE")]
        unmatched: Option<PathBuf>,

        /// Training annotations (boxes relative to the whole image)
        #[arg(long, value_name = "FILE")]
        annotations: Option<PathBuf>,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Process images on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Turn a marker drawn on a device frame into a dataset record
    Mark {
        #[arg(long)]
        brand: String,

        #[arg(long)]
        model: String,

        /// Device frame size in pixels, e.g. 360x780
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        frame: (u32, u32),

        /// Marker rectangle inside the frame, e.g. 120,200,80,60
        #[arg(long, value_name = "X,Y,W,H", value_parser = parse_rect)]
        marker: Rect,
    },

    /// Validate raw marker geometries (one object or an array) from a JSON file
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
        _ => Err(format!("expected X,Y,W,H, got '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "nfc_locator=debug,info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectorConfig::default(),
    };

    match args.command {
        Command::Detect {
            input,
            output,
            unmatched,
            annotations,
            debug_out,
            parallel,
        } => {
            let mut detector = Detector::new(config)?;
            if let Some(debug_dir) = debug_out {
                detector = detector.with_debug(debug_dir)?;
            }

            let files = collect_images(&input)
                .with_context(|| format!("Failed to list images in {}", input.display()))?;
            log::info!("Found {} images in {}", files.len(), input.display());

            let processor = BatchProcessor::new(&detector, &input)?;
            let mut ctx = BatchContext::new(files.len());
            if parallel {
                processor.run_parallel(&files, &mut ctx);
            } else {
                processor.run(&files, &mut ctx);
            }

            write_json(&output, &ctx.results)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            if let Some(path) = unmatched {
                write_json(&path, &ctx.unmatched)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if let Some(path) = annotations {
                let out_of_range = ctx.annotations.out_of_range();
                if !out_of_range.is_empty() {
                    log::warn!("Annotations outside [0, 1]: {:?}", out_of_range);
                }
                write_json(&path, &ctx.annotations)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            println!("=== NFC Marker Detection Results ===");
            println!("{}", ctx.summary());
            println!("Records written to {}", output.display());
        }

        Command::Mark {
            brand,
            model,
            frame,
            marker,
        } => {
            let record = match mark_record(&brand, &model, frame, &marker, &config) {
                Ok(record) => record,
                Err(reason) => bail!("Marker {} on {}x{} frame rejected: {}", marker, frame.0, frame.1, reason),
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Check { file } => {
            let geometries = read_geometries(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut rejected = 0;
            for (i, verdict) in check_geometries(&geometries, &config.validation).iter().enumerate() {
                match verdict {
                    Ok(accepted) => println!(
                        "  #{}: accepted (device aspect {:.3}, marker area {:.2}%)",
                        i + 1,
                        accepted.device_aspect,
                        accepted.area_ratio * 100.0
                    ),
                    Err(reason) => {
                        rejected += 1;
                        println!("  #{}: {}", i + 1, reason);
                    }
                }
            }
            println!("{} of {} geometries rejected", rejected, geometries.len());
        }
    }

    Ok(())
}
