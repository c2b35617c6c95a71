//! Medley - Batch toolbox for video, document and file maintenance
//!
//! This is the main entry point for the medley CLI. It parses the command
//! line, loads configuration, hands the work to the Toolbox, and renders
//! the resulting batch report to the user.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use medley::batch::{BatchReport, Outcome};
use medley::cli::{Args, Commands};
use medley::config::{Config, CropRegion};
use medley::media::ClipRange;
use medley::workflow::Toolbox;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let toolbox = Toolbox::new(config.clone())?;

    // Execute command
    let mut failures = 0;
    match args.command {
        Commands::CropVideos { input_dir, output_dir, x, y, width, height } => {
            info!("Cropping videos in: {}", input_dir.display());

            let region = match (x, y, width, height) {
                (None, None, None, None) => None,
                (x, y, width, height) => Some(CropRegion {
                    x: x.unwrap_or(config.crop.x),
                    y: y.unwrap_or(config.crop.y),
                    width: width.unwrap_or(config.crop.width),
                    height: height.unwrap_or(config.crop.height),
                }),
            };

            let report = toolbox
                .crop_videos(&input_dir, output_dir.as_deref(), region)
                .await?;
            failures = render_report("crop-videos", &report);
        }
        Commands::Cut { input, ranges, output_dir } => {
            info!("Cutting clips from: {}", input.display());

            let ranges = ranges
                .iter()
                .map(|text| ClipRange::parse(text))
                .collect::<medley::error::Result<Vec<_>>>()?;

            let report = toolbox
                .cut_video(&input, &ranges, output_dir.as_deref())
                .await?;
            failures = render_report("cut", &report);
        }
        Commands::ExtractFrames { input, output_dir, fps } => {
            info!("Extracting frames from: {}", input.display());

            let pattern = toolbox.extract_frames(&input, &output_dir, fps).await?;
            println!("Frames written to {}", pattern.display());
        }
        Commands::MergeFiles { input_dir, output, extension } => {
            info!("Merging .{} files in: {}", extension, input_dir.display());

            let summary = toolbox
                .merge_files(&input_dir, output.as_deref(), &extension)
                .await?;
            println!(
                "Merged {} files into {}",
                summary.file_count,
                summary.output.display()
            );
        }
        Commands::ImagesToPdf { root_dir } => {
            info!("Composing PDFs under: {}", root_dir.display());

            let report = toolbox.images_to_pdf(&root_dir).await?;
            failures = render_report("images-to-pdf", &report);
        }
        Commands::NumberPdf { root_dir, font_size, margin } => {
            info!("Numbering PDFs under: {}", root_dir.display());

            let report = toolbox.number_pdfs(&root_dir, font_size, margin).await?;
            failures = render_report("number-pdf", &report);
        }
        Commands::Nup { root_dir } => {
            info!("Creating 2-up layouts under: {}", root_dir.display());

            let report = toolbox.nup_pdfs(&root_dir).await?;
            failures = render_report("nup", &report);
        }
        Commands::Dedup { reference_dir, candidate_dir, output_dir } => {
            info!("Checking {} against {}", candidate_dir.display(), reference_dir.display());

            let outcome = toolbox
                .dedup(&reference_dir, &candidate_dir, &output_dir)
                .await?;

            if outcome.duplicates.is_empty() {
                println!("No duplicates found. All candidate files are unique.");
            } else {
                println!("Duplicates already present in the reference folder:");
                for name in &outcome.duplicates {
                    println!("  {}", name);
                }
            }
            let unique = outcome.report.succeeded() - outcome.duplicates.len();
            println!("Unique files copied to {}: {}", output_dir.display(), unique);

            failures = render_report("dedup", &outcome.report);
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print the batch report and return the number of failed items.
fn render_report(command: &str, report: &BatchReport) -> usize {
    println!(
        "\n{}: {} ok, {} failed (of {})",
        command,
        report.succeeded(),
        report.failed(),
        report.len()
    );

    for result in report.failures() {
        if let Outcome::Failure(reason) = &result.outcome {
            println!("  FAILED {}: {}", result.item.label, reason.trim());
        }
    }

    report.failed()
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let medley_dir = std::env::current_dir()?.join(".medley");
    let log_dir = medley_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "medley.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
