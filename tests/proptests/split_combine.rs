//! Property tests for split/combine workflows

use std::cell::RefCell;
use std::rc::Rc;

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use shardpipe::domain::{ShareCount, SplitConfig, Threshold};
use shardpipe::error::PipelineResult;
use shardpipe::pipeline::{ChannelRouter, VecSink};
use shardpipe::scheme::{
    ChannelCombiner, DispersalCombiner, DispersalSplitter, STRIDE, SecretCombiner,
    SecretSplitter,
};

/// Wrapper for valid threshold and share count pairs, kept small so each
/// property run stays fast.
#[derive(Clone, Copy, Debug)]
struct ValidParams {
    threshold: u16,
    num_shares: u16,
}

impl Arbitrary for ValidParams {
    fn arbitrary(g: &mut Gen) -> Self {
        // Share count between 1 and 8
        let num_shares = (u16::arbitrary(g) % 8) + 1;

        // Threshold between 1 and num_shares
        let threshold = (u16::arbitrary(g) % num_shares) + 1;

        ValidParams {
            threshold,
            num_shares,
        }
    }
}

fn config(params: ValidParams) -> SplitConfig {
    SplitConfig::new(
        Threshold::new(params.threshold).unwrap(),
        ShareCount::new(params.num_shares).unwrap(),
    )
    .unwrap()
}

/// Splits a payload in memory, returning all n share payloads.
fn split_secret(params: ValidParams, data: &[u8], seed: &[u8]) -> Vec<Vec<u8>> {
    let sinks: Vec<Rc<RefCell<VecSink>>> = (0..params.num_shares)
        .map(|_| Rc::new(RefCell::new(VecSink::new())))
        .collect();
    let mut router = ChannelRouter::new();
    for (t, sink) in sinks.iter().enumerate() {
        router.register(t as u32, sink.clone());
    }
    let mut splitter = SecretSplitter::new(config(params), seed).unwrap();
    splitter.absorb(data, &mut router).unwrap();
    splitter.finish(&mut router).unwrap();
    sinks.iter().map(|s| s.borrow().data.clone()).collect()
}

fn split_dispersal(params: ValidParams, data: &[u8]) -> Vec<Vec<u8>> {
    let sinks: Vec<Rc<RefCell<VecSink>>> = (0..params.num_shares)
        .map(|_| Rc::new(RefCell::new(VecSink::new())))
        .collect();
    let mut router = ChannelRouter::new();
    for (t, sink) in sinks.iter().enumerate() {
        router.register(t as u32, sink.clone());
    }
    let mut splitter = DispersalSplitter::new(config(params)).unwrap();
    splitter.absorb(data, &mut router).unwrap();
    splitter.finish(&mut router).unwrap();
    sinks.iter().map(|s| s.borrow().data.clone()).collect()
}

/// Feeds the selected tagged payloads through a combiner in bounded chunks.
fn combine<C, F>(k: u16, tagged: &[(u32, &[u8])], build: F) -> PipelineResult<Vec<u8>>
where
    C: ChannelCombiner,
    F: FnOnce(Threshold, &[u32], shardpipe::pipeline::SinkHandle) -> PipelineResult<C>,
{
    let out = Rc::new(RefCell::new(VecSink::new()));
    let tags: Vec<u32> = tagged.iter().map(|(t, _)| *t).collect();
    let mut combiner = build(Threshold::new(k).unwrap(), &tags, out.clone())?;
    for (lane, (_, payload)) in tagged.iter().enumerate() {
        for chunk in payload.chunks(STRIDE) {
            combiner.accept(lane, chunk)?;
        }
    }
    for lane in 0..tagged.len() {
        combiner.lane_end(lane)?;
    }
    combiner.ensure_finished()?;
    let data = out.borrow().data.clone();
    Ok(data)
}

/// Deterministically selects `count` distinct share indices from `0..n`.
/// Simple seeded shuffle, same idiom as a Fisher-Yates over the index list.
fn select_indices(n: usize, count: usize, selection_seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut seed = selection_seed;
    for i in 0..indices.len() {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let range = indices.len() - i;
        let offset = (seed % range as u64) as usize;
        indices.swap(i, i + offset);
    }
    indices.truncate(count);
    indices
}

/// Splitting and recombining any k-subset of secret shares recovers the input
#[quickcheck]
fn prop_secret_round_trip(data: Vec<u8>, params: ValidParams, selection_seed: u64) -> bool {
    let shares = split_secret(params, &data, b"property seed");
    if shares.len() != params.num_shares as usize {
        return false;
    }

    let selected = select_indices(
        params.num_shares as usize,
        params.threshold as usize,
        selection_seed,
    );
    let tagged: Vec<(u32, &[u8])> = selected
        .iter()
        .map(|&i| (i as u32, shares[i].as_slice()))
        .collect();

    match combine(params.threshold, &tagged, SecretCombiner::new) {
        Ok(recovered) => recovered == data,
        Err(_) => false,
    }
}

/// Splitting and recombining any k-subset of dispersal shares recovers the input
#[quickcheck]
fn prop_dispersal_round_trip(data: Vec<u8>, params: ValidParams, selection_seed: u64) -> bool {
    let shares = split_dispersal(params, &data);

    let selected = select_indices(
        params.num_shares as usize,
        params.threshold as usize,
        selection_seed,
    );
    let tagged: Vec<(u32, &[u8])> = selected
        .iter()
        .map(|&i| (i as u32, shares[i].as_slice()))
        .collect();

    match combine(params.threshold, &tagged, DispersalCombiner::new) {
        Ok(recovered) => recovered == data,
        Err(_) => false,
    }
}

/// Every secret share of a non-empty payload has the same payload length
#[quickcheck]
fn prop_secret_share_lengths_align(data: Vec<u8>, params: ValidParams) -> bool {
    let shares = split_secret(params, &data, b"length seed");
    let len = shares[0].len();
    shares.iter().all(|s| s.len() == len)
}

/// Dispersal shares carry roughly a k-th of the payload each
#[quickcheck]
fn prop_dispersal_shares_are_fractional(params: ValidParams) -> bool {
    let data = vec![0xABu8; 8 * 1024];
    let shares = split_dispersal(params, &data);
    let k = params.threshold as usize;
    // Stripe size plus at most one block of padding overhead.
    let bound = data.len() / k + 2 * STRIDE;
    shares.iter().all(|s| s.len() <= bound)
}

/// Presenting fewer lanes than the threshold is rejected up front
#[quickcheck]
fn prop_too_few_lanes_rejected(data: Vec<u8>, params: ValidParams) -> bool {
    if params.threshold < 2 {
        return true; // nothing below a 2-threshold to withhold
    }
    let shares = split_secret(params, &data, b"insufficient seed");
    let short = params.threshold - 1;
    let tagged: Vec<(u32, &[u8])> = (0..short)
        .map(|i| (u32::from(i), shares[i as usize].as_slice()))
        .collect();

    combine(params.threshold, &tagged, SecretCombiner::new).is_err()
}

/// Different seeds give different shares for the same payload
#[quickcheck]
fn prop_seed_changes_secret_shares(params: ValidParams) -> bool {
    if params.threshold < 2 {
        // A 1-threshold secret share is the data itself; no randomness involved.
        return true;
    }
    let data = vec![0x42u8; 512];
    let a = split_secret(params, &data, b"seed one");
    let b = split_secret(params, &data, b"seed two");
    a != b
}
