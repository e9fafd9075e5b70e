use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::DEFAULT_COMPRESSION_LEVEL;
use crate::domain::{ShareCount, Threshold};

/// Validates a threshold argument (1..=1000)
fn validate_threshold(s: &str) -> Result<Threshold, String> {
    let value: u16 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    Threshold::new(value).map_err(|e| e.to_string())
}

/// Validates a share count argument (1..=1000)
fn validate_share_count(s: &str) -> Result<ShareCount, String> {
    let value: u16 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    ShareCount::new(value).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "shardpipe")]
#[command(about = "Split files into threshold share files and recover them from any k shares")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Secret-share a file into n share files (prompts for an entropy seed)
    Split {
        /// Threshold: minimum number of shares needed to reconstruct
        #[arg(short, long, value_parser = validate_threshold)]
        threshold: Threshold,

        /// Number of share files to create
        #[arg(short, long, value_parser = validate_share_count)]
        shares: ShareCount,

        /// File to split
        file: PathBuf,
    },
    /// Reconstruct a secret-shared file from k share files
    Recover {
        /// Where to write the reconstructed file
        output: PathBuf,

        /// Share files (their count is the threshold)
        #[arg(required = true)]
        shares: Vec<PathBuf>,
    },
    /// Disperse a file into n erasure-coded share files
    Disperse {
        /// Threshold: minimum number of shares needed to reconstruct
        #[arg(short, long, value_parser = validate_threshold)]
        threshold: Threshold,

        /// Number of share files to create
        #[arg(short, long, value_parser = validate_share_count)]
        shares: ShareCount,

        /// File to disperse
        file: PathBuf,
    },
    /// Reassemble a dispersed file from k share files
    Reassemble {
        /// Where to write the reconstructed file
        output: PathBuf,

        /// Share files (their count is the threshold)
        #[arg(required = true)]
        shares: Vec<PathBuf>,
    },
    /// Compress a file with a built-in round-trip self-check
    Compress {
        /// zstd compression level (1-22)
        #[arg(short, long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
        level: i32,

        /// File to compress
        input: PathBuf,

        /// Where to write the compressed file
        output: PathBuf,
    },
    /// Decompress a zstd file
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Where to write the decompressed file
        output: PathBuf,
    },
}
