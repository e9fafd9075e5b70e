//! Information dispersal transform
//!
//! Split side: every block of input is striped across the k data shards and
//! `n - k` parity shards are computed; share `t` receives coded shard `t`.
//! Total stored size is roughly `n/k` times the input instead of `n` times,
//! at the cost of individual shares leaking their slice of the data. Combine
//! side: present shards are placed at their tagged positions, missing data
//! shards are reconstructed, and the stripes are concatenated in order.

use reed_solomon_erasure::galois_16::ReedSolomon;

use crate::domain::{SplitConfig, Threshold};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ChannelRouter, SinkHandle};
use crate::scheme::{
    ChannelCombiner, END_MARKER, LaneSet, STRIDE, TailBuffer, even_ceil, from_elems, to_elems,
};

/// Splits an input stream into `n` erasure-coded shares, any `k` of which
/// reconstruct it.
pub struct DispersalSplitter {
    k: usize,
    n: usize,
    /// Absent when `n == k`: pure striping needs no parity.
    rs: Option<ReedSolomon>,
    buf: Vec<u8>,
    seen: u64,
}

impl DispersalSplitter {
    pub fn new(config: SplitConfig) -> PipelineResult<Self> {
        let k = *config.threshold() as usize;
        let n = *config.share_count() as usize;
        let rs = if n > k {
            Some(ReedSolomon::new(k, n - k)?)
        } else {
            None
        };
        Ok(Self {
            k,
            n,
            rs,
            buf: Vec::new(),
            seen: 0,
        })
    }

    /// Absorbs input bytes, fanning completed blocks across channels
    /// `0..n` of the router.
    pub fn absorb(&mut self, input: &[u8], router: &mut ChannelRouter) -> PipelineResult<()> {
        self.seen += input.len() as u64;
        self.buf.extend_from_slice(input);
        let block_len = self.k * STRIDE;
        while self.buf.len() >= block_len {
            let block: Vec<u8> = self.buf.drain(..block_len).collect();
            self.emit_block(&block, router)?;
        }
        Ok(())
    }

    /// Emits the marker-terminated tail block (zero-padded so all stripes
    /// stay the same even length) and signals end-of-stream on every route.
    pub fn finish(&mut self, router: &mut ChannelRouter) -> PipelineResult<()> {
        if self.seen > 0 {
            self.buf.push(END_MARKER);
            let shard_len = even_ceil(self.buf.len().div_ceil(self.k));
            self.buf.resize(self.k * shard_len, 0);
            let block = std::mem::take(&mut self.buf);
            self.emit_block(&block, router)?;
        }
        router.signal_end()
    }

    fn emit_block(&mut self, block: &[u8], router: &mut ChannelRouter) -> PipelineResult<()> {
        let shard_len = block.len() / self.k;
        let mut shards: Vec<Vec<[u8; 2]>> = block
            .chunks_exact(shard_len)
            .map(to_elems)
            .collect();
        if let Some(rs) = &self.rs {
            let words = shard_len / 2;
            shards.extend(
                std::iter::repeat_with(|| vec![[0u8; 2]; words]).take(self.n - self.k),
            );
            rs.encode(&mut shards)?;
        }
        for (t, shard) in shards.iter().enumerate() {
            router.write(t as u32, &from_elems(shard))?;
        }
        Ok(())
    }
}

/// Recombines `k` tagged dispersal shares into the original stream.
pub struct DispersalCombiner {
    k: usize,
    tags: Vec<u32>,
    rs: ReedSolomon,
    total: usize,
    lanes: LaneSet,
    tail: TailBuffer,
    out: SinkHandle,
    done: bool,
}

impl DispersalCombiner {
    /// `tags[lane]` is the channel tag extracted from the share attached at
    /// that lane; tags below the threshold name data stripes, higher tags
    /// name parity shards. As with secret recovery, the original share count
    /// is unnecessary because parity rows depend only on the threshold and
    /// the row index.
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
        let total = (max_tag + 1).max(k + 1);
        let rs = ReedSolomon::new(k, total - k)?;
        Ok(Self {
            k,
            tags: tags.to_vec(),
            rs,
            total,
            lanes: LaneSet::new(k),
            tail: TailBuffer::new(2 * k + 2),
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
        let mut shards: Vec<Option<Vec<[u8; 2]>>> = vec![None; self.total];
        for (lane, block) in blocks.iter().enumerate() {
            shards[self.tags[lane] as usize] = Some(to_elems(block));
        }
        self.rs.reconstruct_data(&mut shards)?;
        let mut stripe = Vec::with_capacity(self.k * blocks[0].len());
        for shard in shards.iter().take(self.k) {
            let elems = shard.as_ref().ok_or_else(|| {
                PipelineError::Precondition("reconstruction left a data stripe empty".into())
            })?;
            stripe.extend_from_slice(&from_elems(elems));
        }
        self.tail.stage(&stripe, &self.out)
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

impl ChannelCombiner for DispersalCombiner {
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
