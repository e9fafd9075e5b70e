//! Self-checked compression
//!
//! Compression gets a built-in correctness oracle: the source bytes fan out
//! under two channel tags, one leg going straight into an equality comparison
//! and the other through compress -> decompress before landing in the same
//! comparison. Compressed bytes are simultaneously written to the real
//! output, so a passing run costs no extra pass over the data.
//!
//! ```text
//! source --+--> compress --+--> output file
//!          |               |
//!          |               +--> decompress --+
//!          |                                 v
//!          +------------------------> comparison
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ByteSink, ChannelRouter, FileSource, Pump, SinkHandle};

/// Router tag for the bytes headed into the compressor.
const TAG_DATA: u32 = 0;
/// Router tag for the raw bytes headed into the comparison.
const TAG_RAW: u32 = 1;

/// Comparison channel fed by the decompression leg.
pub const CH_DECODED: usize = 0;
/// Comparison channel fed directly from the source.
pub const CH_RAW: usize = 1;

/// Equality-comparison sink over two channels.
///
/// Streams are compared position by position as bytes arrive; the first
/// divergence is recorded and reported. Only the unmatched tail of the
/// leading channel is buffered.
#[derive(Default)]
pub struct ComparisonSink {
    bufs: [VecDeque<u8>; 2],
    ended: [bool; 2],
    compared: u64,
    mismatch: Option<u64>,
}

impl ComparisonSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, channel: usize, data: &[u8]) -> PipelineResult<()> {
        self.bufs[channel].extend(data.iter().copied());
        self.advance()
    }

    fn advance(&mut self) -> PipelineResult<()> {
        loop {
            let (Some(&a), Some(&b)) = (self.bufs[0].front(), self.bufs[1].front()) else {
                return Ok(());
            };
            if a != b {
                self.mismatch = Some(self.compared);
                return Err(PipelineError::ComparisonMismatch {
                    position: self.compared,
                });
            }
            self.bufs[0].pop_front();
            self.bufs[1].pop_front();
            self.compared += 1;
        }
    }

    /// Marks one channel as complete. Once both channels have ended, any
    /// leftover bytes mean the streams diverged in length.
    pub fn channel_end(&mut self, channel: usize) -> PipelineResult<()> {
        self.ended[channel] = true;
        if self.ended.iter().all(|&e| e)
            && !(self.bufs[0].is_empty() && self.bufs[1].is_empty())
        {
            self.mismatch = Some(self.compared);
            return Err(PipelineError::ComparisonMismatch {
                position: self.compared,
            });
        }
        Ok(())
    }

    pub fn mismatch_position(&self) -> Option<u64> {
        self.mismatch
    }

    /// Asserts both channels ended and matched over their whole length.
    pub fn verify_complete(&self) -> PipelineResult<()> {
        if let Some(position) = self.mismatch {
            return Err(PipelineError::ComparisonMismatch { position });
        }
        if !self.ended.iter().all(|&e| e) {
            return Err(PipelineError::Precondition(
                "comparison ended before both channels were complete".into(),
            ));
        }
        Ok(())
    }
}

/// Binds one comparison channel behind the sink interface so a router route
/// can feed it.
struct ChannelProbe {
    comparison: Rc<RefCell<ComparisonSink>>,
    channel: usize,
}

impl ByteSink for ChannelProbe {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()> {
        self.comparison.borrow_mut().accept(self.channel, data)
    }

    fn signal_end(&mut self) -> PipelineResult<()> {
        self.comparison.borrow_mut().channel_end(self.channel)
    }
}

/// Binds one comparison channel behind `std::io::Write` so the zstd decoder
/// can feed it.
struct ChannelIo {
    comparison: Rc<RefCell<ComparisonSink>>,
    channel: usize,
}

impl Write for ChannelIo {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.comparison
            .borrow_mut()
            .accept(self.channel, buf)
            .map_err(std::io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Tees compressed bytes into the real output and into the verification
/// decoder.
struct TeeWriter {
    out: BufWriter<File>,
    verify: zstd::stream::write::Decoder<'static, ChannelIo>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.out.write_all(buf)?;
        self.verify.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()?;
        self.verify.flush()
    }
}

/// The compressing sink: source bytes in, tee'd compressed bytes out.
struct CompressorSink {
    encoder: Option<zstd::stream::Encoder<'static, TeeWriter>>,
}

impl ByteSink for CompressorSink {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.write_all(data)?;
        }
        Ok(())
    }

    fn signal_end(&mut self) -> PipelineResult<()> {
        if let Some(encoder) = self.encoder.take() {
            let mut tee = encoder.finish()?;
            tee.flush()?;
        }
        Ok(())
    }
}

/// Compresses `input` into `output` at the given zstd level, verifying the
/// round trip in the same pass.
///
/// On mismatch the already-written output is left on disk (it may still be
/// useful for forensics) and [`PipelineError::ComparisonMismatch`] reports
/// the first diverging byte position.
pub fn compress_with_verification(
    input: &Path,
    output: &Path,
    level: i32,
) -> PipelineResult<()> {
    let comparison = Rc::new(RefCell::new(ComparisonSink::new()));
    let raw_probe: SinkHandle = Rc::new(RefCell::new(ChannelProbe {
        comparison: comparison.clone(),
        channel: CH_RAW,
    }));
    let verify = zstd::stream::write::Decoder::new(ChannelIo {
        comparison: comparison.clone(),
        channel: CH_DECODED,
    })?;
    let tee = TeeWriter {
        out: BufWriter::new(File::create(output)?),
        verify,
    };
    let compressor: SinkHandle = Rc::new(RefCell::new(CompressorSink {
        encoder: Some(zstd::stream::Encoder::new(tee, level)?),
    }));

    let mut router = ChannelRouter::new();
    // The comparison is finalized explicitly below, one channel at a time,
    // after the codec chain has flushed; automatic end propagation on the
    // raw route would signal it too early.
    router.register_with(TAG_RAW, raw_probe, false);
    router.register(TAG_DATA, compressor);

    let result = (|| -> PipelineResult<()> {
        let mut pump = Pump::new(FileSource::open(input)?);
        let total = pump.pump_all_into(|chunk| {
            router.write(TAG_DATA, chunk)?;
            router.write(TAG_RAW, chunk)
        })?;
        router.signal_end()?;
        comparison.borrow_mut().channel_end(CH_RAW)?;
        comparison.borrow_mut().channel_end(CH_DECODED)?;
        debug!(bytes = total, level, "self-checked compression complete");
        Ok(())
    })();

    // A mismatch may surface wrapped in an I/O error from inside the codec
    // chain; prefer the recorded position over the wrapped form.
    if let Some(position) = comparison.borrow().mismatch_position() {
        return Err(PipelineError::ComparisonMismatch { position });
    }
    result?;
    comparison.borrow().verify_complete()
}
