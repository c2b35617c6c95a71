//! Medley - Batch toolbox for video, document and file maintenance
//!
//! A collection of batch file-processing commands sharing one execution
//! core: video cropping, clip cutting and frame extraction via ffmpeg,
//! date-ordered file merging, content-hash duplicate detection, and PDF
//! composition, numbering and 2-up layout.

pub mod batch;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod media;
pub mod merge;
pub mod pdf;
pub mod scan;
pub mod workflow;
