//! Bounded chunked pump
//!
//! The pump is the unit of suspension for the whole pipeline: each call moves
//! at most a bounded number of bytes from a source into the caller's delivery
//! closure, so no stage ever holds more than one chunk in flight. Multi-source
//! recovery leans on this to keep independently-read share files aligned.

use crate::error::PipelineResult;
use crate::pipeline::ByteSource;

/// Bytes moved per pump step.
pub const PUMP_CHUNK: usize = 256;

/// Drives bounded pulls from a source into a destination closure.
///
/// Tracks the read cursor implicitly and an exhausted flag explicitly; each
/// orchestration is one-shot, so the cursor never needs resetting.
pub struct Pump<S: ByteSource> {
    source: S,
    exhausted: bool,
}

impl<S: ByteSource> Pump<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pulls up to `limit` bytes, handing each raw chunk to `deliver`.
    /// Returns the number of bytes moved; 0 once the source is exhausted.
    pub fn pump_into<F>(&mut self, limit: usize, mut deliver: F) -> PipelineResult<usize>
    where
        F: FnMut(&[u8]) -> PipelineResult<()>,
    {
        if self.exhausted {
            return Ok(0);
        }
        let mut buf = [0u8; PUMP_CHUNK];
        let mut moved = 0;
        while moved < limit {
            let want = (limit - moved).min(PUMP_CHUNK);
            let got = self.source.pull(&mut buf[..want])?;
            if got == 0 {
                self.exhausted = true;
                break;
            }
            deliver(&buf[..got])?;
            moved += got;
        }
        Ok(moved)
    }

    /// Pulls until the source is exhausted.
    pub fn pump_all_into<F>(&mut self, mut deliver: F) -> PipelineResult<u64>
    where
        F: FnMut(&[u8]) -> PipelineResult<()>,
    {
        let mut total = 0u64;
        loop {
            let moved = self.pump_into(PUMP_CHUNK, &mut deliver)?;
            if moved == 0 {
                return Ok(total);
            }
            total += moved as u64;
        }
    }
}
