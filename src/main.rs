use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use shardpipe::cli::{Cli, Commands};
use shardpipe::commands::{
    compress_file, decompress_file, disperse_file, reassemble_file, recover_file, split_file,
};
use shardpipe::domain::SplitConfig;

/// Read an entropy seed securely from stdin (hidden input when TTY available)
fn read_seed() -> Result<Zeroizing<String>> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("Enter a random seed phrase:");
        rpassword::read_password()
            .map(Zeroizing::new)
            .context("Failed to read seed from stdin")
    } else {
        // Non-interactive mode (piped input) - read directly from stdin
        let stdin = io::stdin();
        let mut handle = stdin.lock();
        let mut seed = Zeroizing::new(String::new());
        handle
            .read_line(&mut seed)
            .context("Failed to read seed from stdin")?;
        let trimmed = Zeroizing::new(seed.trim().to_string());
        Ok(trimmed)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            threshold,
            shares,
            file,
        } => {
            let config = SplitConfig::new(threshold, shares)?;
            let seed = read_seed()?;
            split_file(config, &file, seed.as_bytes())?;
        }
        Commands::Recover { output, shares } => {
            recover_file(&shares, &output)?;
        }
        Commands::Disperse {
            threshold,
            shares,
            file,
        } => {
            let config = SplitConfig::new(threshold, shares)?;
            disperse_file(config, &file)?;
        }
        Commands::Reassemble { output, shares } => {
            reassemble_file(&shares, &output)?;
        }
        Commands::Compress {
            level,
            input,
            output,
        } => {
            compress_file(&input, &output, level)?;
        }
        Commands::Decompress { input, output } => {
            decompress_file(&input, &output)?;
        }
    }

    Ok(())
}
