use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crop every video in a folder to a fixed region
    CropVideos {
        /// Folder containing the videos
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output folder (default: <input-dir>/cropped)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Left edge of the crop region in pixels
        #[arg(short = 'x', long)]
        x: Option<u32>,

        /// Top edge of the crop region in pixels
        #[arg(short = 'y', long)]
        y: Option<u32>,

        /// Crop width in pixels
        #[arg(short = 'W', long)]
        width: Option<u32>,

        /// Crop height in pixels
        #[arg(short = 'H', long)]
        height: Option<u32>,
    },

    /// Cut one or more clips out of a video without re-encoding
    Cut {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Clip range START-END (SS, MM:SS or HH:MM:SS); repeatable
        #[arg(short, long = "range", required = true)]
        ranges: Vec<String>,

        /// Output folder (default: next to the input file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Sample frames from a video at a fixed rate
    ExtractFrames {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for the extracted frames
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Frames per second to sample
        #[arg(short, long, default_value = "1.0")]
        fps: f32,
    },

    /// Merge text or source files from a folder into one annotated file,
    /// ordered by the date in their names
    MergeFiles {
        /// Folder containing the files to merge
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output file (default: <input-dir>/merged_<ext>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File extension to merge
        #[arg(short, long, default_value = "py")]
        extension: String,
    },

    /// Compose the images of every subfolder into one PDF per subfolder
    ImagesToPdf {
        /// Folder whose subfolders hold the images
        #[arg(short, long)]
        root_dir: PathBuf,
    },

    /// Stamp page numbers onto every PDF found under a folder, in place
    NumberPdf {
        /// Folder to search for PDFs (one level of subfolders deep)
        #[arg(short, long)]
        root_dir: PathBuf,

        /// Font size of the stamped numbers
        #[arg(short, long)]
        font_size: Option<f32>,

        /// Distance of the numbers from the bottom edge
        #[arg(short, long)]
        margin: Option<f32>,
    },

    /// Create a two-pages-per-sheet companion for every PDF under a folder
    Nup {
        /// Folder to search for PDFs (one level of subfolders deep)
        #[arg(short, long)]
        root_dir: PathBuf,
    },

    /// Copy the files from one folder that do not already exist (by
    /// content) anywhere under a reference folder
    Dedup {
        /// Folder whose content is considered already present
        #[arg(short, long)]
        reference_dir: PathBuf,

        /// Folder with candidate files to check
        #[arg(short, long)]
        candidate_dir: PathBuf,

        /// Folder receiving the unique files
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}
