use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::codec;
use crate::domain::{ChannelTag, SplitConfig, Threshold};
use crate::error::PipelineResult;
use crate::pipeline::{
    ByteSink, ChannelRouter, FileSink, FileSource, PUMP_CHUNK, Pump, SinkHandle,
};
use crate::scheme::{
    ChannelCombiner, DispersalCombiner, DispersalSplitter, LaneSink, SecretCombiner,
    SecretSplitter,
};
use crate::verify;

/// Default zstd compression level (good balance of speed and ratio)
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Maximum zstd compression level (best ratio, slowest)
pub const MAX_COMPRESSION_LEVEL: i32 = 22;

/// Split a file into `n` secret-share files, any `k` of which reconstruct it
///
/// Produces `<input>.000` through `<input>.NNN`, each starting with its
/// 4-byte channel tag. The seed feeds the share randomness; equal seeds give
/// equal shares. Parameters are validated at [`SplitConfig`] construction,
/// before any file is created or opened.
///
/// # Errors
/// Returns an error if any share file cannot be created or the input cannot
/// be read. No partial-result cleanup is attempted on mid-stream failure.
pub fn split_file(config: SplitConfig, input: &Path, seed: &[u8]) -> Result<()> {
    let mut splitter = SecretSplitter::new(config, seed)?;
    let mut pump = Pump::new(
        FileSource::open(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?,
    );
    let mut router = register_share_sinks(input, u32::from(*config.share_count()))?;
    let total = pump.pump_all_into(|chunk| splitter.absorb(chunk, &mut router))?;
    splitter.finish(&mut router)?;

    debug!(
        threshold = *config.threshold(),
        shares = *config.share_count(),
        bytes = total,
        "secret split complete"
    );
    Ok(())
}

/// Reconstruct a secret-shared file from `k` share files
///
/// The threshold is the number of supplied share files; their order does not
/// matter. Each share's channel tag is read from its 4-byte header before any
/// payload bytes are consumed.
///
/// # Errors
/// Returns an error if fewer than one or more than 1000 shares are supplied,
/// a share cannot be read, or the shares do not form a consistent set.
pub fn recover_file(inputs: &[PathBuf], output: &Path) -> Result<()> {
    run_recovery(inputs, output, SecretCombiner::new)?;
    debug!(shares = inputs.len(), output = %output.display(), "secret recovery complete");
    Ok(())
}

/// Split a file into `n` erasure-coded dispersal files, any `k` of which
/// reconstruct it
///
/// Same file layout as [`split_file`], but shares are about `1/k` of the
/// input size and individually leak their stripe of the data.
///
/// # Errors
/// Returns an error if any share file cannot be created or the input cannot
/// be read.
pub fn disperse_file(config: SplitConfig, input: &Path) -> Result<()> {
    let mut splitter = DispersalSplitter::new(config)?;
    let mut pump = Pump::new(
        FileSource::open(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?,
    );
    let mut router = register_share_sinks(input, u32::from(*config.share_count()))?;
    let total = pump.pump_all_into(|chunk| splitter.absorb(chunk, &mut router))?;
    splitter.finish(&mut router)?;

    debug!(
        threshold = *config.threshold(),
        shares = *config.share_count(),
        bytes = total,
        "dispersal complete"
    );
    Ok(())
}

/// Reconstruct a dispersed file from `k` share files
///
/// # Errors
/// Same contract as [`recover_file`].
pub fn reassemble_file(inputs: &[PathBuf], output: &Path) -> Result<()> {
    run_recovery(inputs, output, DispersalCombiner::new)?;
    debug!(shares = inputs.len(), output = %output.display(), "reassembly complete");
    Ok(())
}

/// Compress a file with a built-in round-trip check
///
/// The compressed stream is decompressed in the same pass and compared
/// byte-for-byte against the source; a divergence is reported as a
/// comparison mismatch without deleting the already-written output.
///
/// # Errors
/// Returns an error on I/O failure or when the round-trip check finds a
/// mismatch.
pub fn compress_file(input: &Path, output: &Path, level: i32) -> Result<()> {
    let level = level.clamp(1, MAX_COMPRESSION_LEVEL);
    verify::compress_with_verification(input, output, level)
        .with_context(|| format!("Failed to compress {}", input.display()))?;
    Ok(())
}

/// Decompress a zstd file
///
/// # Errors
/// Returns an error on I/O failure or a malformed compressed stream.
pub fn decompress_file(input: &Path, output: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open input {}", input.display()))?,
    );
    let mut writer = BufWriter::new(File::create(output)?);
    zstd::stream::copy_decode(reader, &mut writer)
        .with_context(|| format!("Failed to decompress {}", input.display()))?;
    writer.flush()?;
    Ok(())
}

/// Creates the `n` share files and binds each to its channel. Every share
/// self-identifies: the 4-byte tag header goes out synchronously before the
/// route is attached.
fn register_share_sinks(base: &Path, n: u32) -> PipelineResult<ChannelRouter> {
    let mut router = ChannelRouter::new();
    for index in 0..n {
        let tag = ChannelTag::new(index)?;
        let path = codec::share_path(base, *tag);
        let mut sink = FileSink::create(&path)?;
        sink.write(&codec::encode_tag(*tag))?;
        router.register(*tag, Rc::new(RefCell::new(sink)));
    }
    Ok(router)
}

/// Drives the synchronized bounded pump over `k` share readers into a
/// combining transform.
///
/// Reader 0 leads: it pulls one bounded chunk, then every other reader pulls
/// the same amount, in index order, before the next round. Without this
/// lockstep a channel's cursor could outrun the others and bytes from
/// different logical positions would be combined. Once reader 0 is
/// exhausted, the remaining readers drain fully to flush tail data.
fn run_recovery<C, F>(inputs: &[PathBuf], output: &Path, build: F) -> Result<()>
where
    C: ChannelCombiner + 'static,
    F: FnOnce(Threshold, &[u32], SinkHandle) -> PipelineResult<C>,
{
    let threshold = Threshold::new(u16::try_from(inputs.len()).unwrap_or(u16::MAX))?;
    let k = inputs.len();

    let mut pumps = Vec::with_capacity(k);
    let mut tags = Vec::with_capacity(k);
    for path in inputs {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open share {}", path.display()))?;
        let tag = codec::read_tag(&mut file)
            .with_context(|| format!("Failed to read tag header of {}", path.display()))?;
        tags.push(tag);
        pumps.push(Pump::new(FileSource::from_file(file)));
    }

    let out_sink: SinkHandle = Rc::new(RefCell::new(FileSink::create(output)?));
    let combiner = Rc::new(RefCell::new(build(threshold, &tags, out_sink)?));
    let mut router = ChannelRouter::new();
    for (lane, &tag) in tags.iter().enumerate() {
        router.register(
            tag,
            Rc::new(RefCell::new(LaneSink::new(combiner.clone(), lane))),
        );
    }

    while pumps[0].pump_into(PUMP_CHUNK, |chunk| router.write(tags[0], chunk))? > 0 {
        for i in 1..k {
            pumps[i].pump_into(PUMP_CHUNK, |chunk| router.write(tags[i], chunk))?;
        }
    }
    for (i, pump) in pumps.iter_mut().enumerate() {
        pump.pump_all_into(|chunk| router.write(tags[i], chunk))?;
    }
    router.signal_end()?;
    combiner.borrow().ensure_finished()?;
    Ok(())
}
