//! Threshold transforms: secret sharing and information dispersal
//!
//! Both transforms ride the same GF(2^16) Reed-Solomon backend
//! ([`reed_solomon_erasure::galois_16`]), which is what allows share counts
//! up to 1000 (a GF(2^8) field caps indices at 255):
//!
//! - [`secret`]: per block, the data shards are the secret block plus `k - 1`
//!   uniformly random blocks, and each share receives one *parity* shard.
//!   Any `k` parity shards determine every data shard; any fewer reveal
//!   nothing, because the random blocks act as a one-time pad. Each share is
//!   roughly the size of the input.
//! - [`dispersal`]: the input is striped across `k` data shards and `n - k`
//!   parity shards are appended; share `t` receives coded shard `t`. Each
//!   share is roughly `1/k` of the input.
//!
//! Splitters consume the input in fixed blocks (every share receives
//! [`STRIDE`] bytes per full block) and fan the labeled output across a
//! [`ChannelRouter`](crate::pipeline::ChannelRouter). Combiners buffer one
//! lane per share and reconstruct as soon as every lane holds an aligned
//! block, which keeps memory bounded and the channels in lockstep.
//!
//! A non-empty input stream is terminated by a `0x01` marker byte and
//! zero-padded to the block granularity; recovery strips the padding and
//! treats a missing marker as evidence of wrong or corrupt shares. An empty
//! input produces empty payloads and recovers to zero bytes.

pub mod dispersal;
pub mod secret;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ByteSink, SinkHandle};

pub use dispersal::{DispersalCombiner, DispersalSplitter};
pub use secret::{SecretCombiner, SecretSplitter};

/// Bytes each share receives per full processing block.
pub const STRIDE: usize = 256;

/// Terminates the padded input stream.
pub(crate) const END_MARKER: u8 = 0x01;

/// Fan-in consumer fed by per-share lanes.
///
/// `lane` is the position of a share in the attach order (0-based), fixed at
/// construction together with its extracted channel tag.
pub trait ChannelCombiner {
    fn accept(&mut self, lane: usize, data: &[u8]) -> PipelineResult<()>;
    fn lane_end(&mut self, lane: usize) -> PipelineResult<()>;
    fn ensure_finished(&self) -> PipelineResult<()>;
}

/// Adapter binding one combiner lane behind the [`ByteSink`] interface, so a
/// router route can feed it.
pub struct LaneSink<C: ChannelCombiner> {
    combiner: Rc<RefCell<C>>,
    lane: usize,
}

impl<C: ChannelCombiner> LaneSink<C> {
    pub fn new(combiner: Rc<RefCell<C>>, lane: usize) -> Self {
        Self { combiner, lane }
    }
}

impl<C: ChannelCombiner> ByteSink for LaneSink<C> {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()> {
        self.combiner.borrow_mut().accept(self.lane, data)
    }

    fn signal_end(&mut self) -> PipelineResult<()> {
        self.combiner.borrow_mut().lane_end(self.lane)
    }
}

/// Derives a deterministic RNG from an entropy seed phrase.
///
/// The phrase is widened to a full 32-byte seed by hashing, so short phrases
/// still key the whole RNG state.
pub(crate) fn seeded_rng(seed: &[u8]) -> StdRng {
    StdRng::from_seed(*blake3::hash(seed).as_bytes())
}

/// Reinterprets a byte slice as GF(2^16) symbols. `bytes.len()` must be even.
pub(crate) fn to_elems(bytes: &[u8]) -> Vec<[u8; 2]> {
    debug_assert!(bytes.len().is_multiple_of(2));
    bytes.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
}

/// Flattens GF(2^16) symbols back into bytes.
pub(crate) fn from_elems(elems: &[[u8; 2]]) -> Vec<u8> {
    elems.iter().flatten().copied().collect()
}

/// Round up to the nearest even number.
pub(crate) fn even_ceil(n: usize) -> usize {
    if n.is_multiple_of(2) { n } else { n + 1 }
}

/// Per-share lane buffers for a combiner.
///
/// Lanes fill independently as the synchronized pump delivers chunks; blocks
/// are popped only when every lane can supply an aligned slice.
pub(crate) struct LaneSet {
    lanes: Vec<VecDeque<u8>>,
    ended: Vec<bool>,
}

impl LaneSet {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            lanes: (0..k).map(|_| VecDeque::new()).collect(),
            ended: vec![false; k],
        }
    }

    pub(crate) fn push(&mut self, lane: usize, data: &[u8]) {
        self.lanes[lane].extend(data.iter().copied());
    }

    /// Marks a lane as ended; returns true once every lane has ended.
    pub(crate) fn end(&mut self, lane: usize) -> bool {
        self.ended[lane] = true;
        self.ended.iter().all(|&e| e)
    }

    pub(crate) fn all_have(&self, len: usize) -> bool {
        self.lanes.iter().all(|lane| lane.len() >= len)
    }

    /// Pops an aligned `len`-byte block from every lane.
    pub(crate) fn pop_blocks(&mut self, len: usize) -> Vec<Vec<u8>> {
        self.lanes
            .iter_mut()
            .map(|lane| lane.drain(..len).collect())
            .collect()
    }

    /// Pops whatever remains in every lane, enforcing that the tails line up
    /// (equal length, whole symbols).
    pub(crate) fn pop_rest(&mut self) -> PipelineResult<Vec<Vec<u8>>> {
        let rest: Vec<Vec<u8>> = self
            .lanes
            .iter_mut()
            .map(|lane| lane.drain(..).collect())
            .collect();
        let len = rest[0].len();
        if rest.iter().any(|tail| tail.len() != len) {
            return Err(PipelineError::Precondition(
                "share payloads have unequal lengths".into(),
            ));
        }
        if !len.is_multiple_of(2) {
            return Err(PipelineError::Precondition(
                "share payload is not a whole number of symbols".into(),
            ));
        }
        Ok(rest)
    }
}

/// Staged output buffer that withholds the last few bytes until the stream
/// ends, so the padding marker can be stripped before it is ever emitted.
pub(crate) struct TailBuffer {
    pending: Vec<u8>,
    holdback: usize,
    emitted: u64,
}

impl TailBuffer {
    pub(crate) fn new(holdback: usize) -> Self {
        Self {
            pending: Vec::new(),
            holdback,
            emitted: 0,
        }
    }

    /// Stages reconstructed bytes, emitting everything but the holdback tail.
    pub(crate) fn stage(&mut self, bytes: &[u8], out: &SinkHandle) -> PipelineResult<()> {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > self.holdback {
            let cut = self.pending.len() - self.holdback;
            out.borrow_mut().write(&self.pending[..cut])?;
            self.emitted += cut as u64;
            self.pending.drain(..cut);
        }
        Ok(())
    }

    /// Strips the zero padding and end marker, flushes the remaining data
    /// bytes, and signals end-of-stream on the output sink.
    pub(crate) fn finish(&mut self, out: &SinkHandle) -> PipelineResult<()> {
        if self.emitted == 0 && self.pending.is_empty() {
            // Empty stream: nothing was ever split.
            return out.borrow_mut().signal_end();
        }
        while self.pending.last() == Some(&0) {
            self.pending.pop();
        }
        if self.pending.pop() != Some(END_MARKER) {
            return Err(PipelineError::Precondition(
                "end-of-data marker missing; shares are corrupt, mismatched, or insufficient"
                    .into(),
            ));
        }
        if !self.pending.is_empty() {
            out.borrow_mut().write(&self.pending)?;
            self.emitted += self.pending.len() as u64;
            self.pending.clear();
        }
        out.borrow_mut().signal_end()
    }
}
