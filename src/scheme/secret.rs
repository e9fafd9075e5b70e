//! Threshold secret sharing transform
//!
//! Split side: every block of input becomes data shard 0, shards 1..k are
//! freshly drawn random blocks, and the n parity shards computed over them
//! are what the shares actually receive. Combine side: the k parity shards
//! are placed back at their tagged positions and the missing data shards are
//! reconstructed; shard 0 is the secret block.

use rand::RngCore;
use rand::rngs::StdRng;
use reed_solomon_erasure::galois_16::ReedSolomon;

use crate::domain::{SplitConfig, Threshold};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ChannelRouter, SinkHandle};
use crate::scheme::{
    ChannelCombiner, END_MARKER, LaneSet, STRIDE, TailBuffer, from_elems, seeded_rng, to_elems,
};

/// Splits an input stream into `n` labeled secret shares, any `k` of which
/// reconstruct it.
pub struct SecretSplitter {
    k: usize,
    n: usize,
    rs: ReedSolomon,
    rng: StdRng,
    buf: Vec<u8>,
    seen: u64,
}

impl SecretSplitter {
    pub fn new(config: SplitConfig, seed: &[u8]) -> PipelineResult<Self> {
        let k = *config.threshold() as usize;
        let n = *config.share_count() as usize;
        let rs = ReedSolomon::new(k, n)?;
        Ok(Self {
            k,
            n,
            rs,
            rng: seeded_rng(seed),
            buf: Vec::new(),
            seen: 0,
        })
    }

    /// Absorbs input bytes, fanning completed blocks across channels
    /// `0..n` of the router.
    pub fn absorb(&mut self, input: &[u8], router: &mut ChannelRouter) -> PipelineResult<()> {
        self.seen += input.len() as u64;
        self.buf.extend_from_slice(input);
        while self.buf.len() >= STRIDE {
            let block: Vec<u8> = self.buf.drain(..STRIDE).collect();
            self.emit_block(&block, router)?;
        }
        Ok(())
    }

    /// Emits the marker-terminated tail block and signals end-of-stream on
    /// every route. An empty input emits no payload at all.
    pub fn finish(&mut self, router: &mut ChannelRouter) -> PipelineResult<()> {
        if self.seen > 0 {
            self.buf.push(END_MARKER);
            if !self.buf.len().is_multiple_of(2) {
                self.buf.push(0);
            }
            let block = std::mem::take(&mut self.buf);
            self.emit_block(&block, router)?;
        }
        router.signal_end()
    }

    fn emit_block(&mut self, block: &[u8], router: &mut ChannelRouter) -> PipelineResult<()> {
        let words = block.len() / 2;
        let mut shards: Vec<Vec<[u8; 2]>> = Vec::with_capacity(self.k + self.n);
        shards.push(to_elems(block));
        for _ in 1..self.k {
            let mut pad = vec![0u8; block.len()];
            self.rng.fill_bytes(&mut pad);
            shards.push(to_elems(&pad));
        }
        shards.extend(std::iter::repeat_with(|| vec![[0u8; 2]; words]).take(self.n));
        self.rs.encode(&mut shards)?;
        for (t, shard) in shards[self.k..].iter().enumerate() {
            router.write(t as u32, &from_elems(shard))?;
        }
        Ok(())
    }
}

/// Recombines `k` tagged share payloads into the original stream.
pub struct SecretCombiner {
    k: usize,
    tags: Vec<u32>,
    rs: ReedSolomon,
    parity_total: usize,
    lanes: LaneSet,
    tail: TailBuffer,
    out: SinkHandle,
    done: bool,
}

impl SecretCombiner {
    /// `tags[lane]` is the channel tag extracted from the share attached at
    /// that lane. The original share count is not needed: the coding matrix
    /// rows for parity shards depend only on the threshold and the row
    /// index, so a coder sized to the highest tag seen is compatible with
    /// the one used at split time.
    pub fn new(threshold: Threshold, tags: &[u32], out: SinkHandle) -> PipelineResult<Self> {
        let k = *threshold as usize;
        if tags.len() != k {
            return Err(PipelineError::Precondition(format!(
                "expected {} tagged shares, got {}",
                k,
                tags.len()
            )));
        }
        let max_tag = tags.iter().copied().max().unwrap_or(0) as usize;
        let parity_total = max_tag + 1;
        let rs = ReedSolomon::new(k, parity_total)?;
        Ok(Self {
            k,
            tags: tags.to_vec(),
            rs,
            parity_total,
            lanes: LaneSet::new(k),
            tail: TailBuffer::new(4),
            out,
            done: false,
        })
    }

    fn drain_blocks(&mut self) -> PipelineResult<()> {
        while self.lanes.all_have(STRIDE) {
            let blocks = self.lanes.pop_blocks(STRIDE);
            self.reconstruct(&blocks)?;
        }
        Ok(())
    }

    fn reconstruct(&mut self, blocks: &[Vec<u8>]) -> PipelineResult<()> {
        let mut shards: Vec<Option<Vec<[u8; 2]>>> = vec![None; self.k + self.parity_total];
        for (lane, block) in blocks.iter().enumerate() {
            shards[self.k + self.tags[lane] as usize] = Some(to_elems(block));
        }
        self.rs.reconstruct_data(&mut shards)?;
        let secret = shards[0].take().ok_or_else(|| {
            PipelineError::Precondition("reconstruction left the data shard empty".into())
        })?;
        self.tail.stage(&from_elems(&secret), &self.out)
    }

    fn finish(&mut self) -> PipelineResult<()> {
        self.drain_blocks()?;
        let rest = self.lanes.pop_rest()?;
        if !rest[0].is_empty() {
            self.reconstruct(&rest)?;
        }
        self.tail.finish(&self.out)?;
        self.done = true;
        Ok(())
    }
}

impl ChannelCombiner for SecretCombiner {
    fn accept(&mut self, lane: usize, data: &[u8]) -> PipelineResult<()> {
        self.lanes.push(lane, data);
        self.drain_blocks()
    }

    fn lane_end(&mut self, lane: usize) -> PipelineResult<()> {
        if self.lanes.end(lane) {
            self.finish()?;
        }
        Ok(())
    }

    fn ensure_finished(&self) -> PipelineResult<()> {
        if self.done {
            Ok(())
        } else {
            Err(PipelineError::Precondition(
                "combine ended before every share lane was drained".into(),
            ))
        }
    }
}
