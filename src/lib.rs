//! Threshold share file pipeline
//!
//! Splits a byte stream into `n` tagged share files so that any `k` of them
//! reconstruct the original exactly, via threshold secret sharing or
//! information dispersal, plus a self-verifying zstd compression pipeline.
//! The moving parts are a small synchronous filter graph: tagged channel
//! routing ([`pipeline::ChannelRouter`]), bounded chunked pumping
//! ([`pipeline::Pump`]), share framing ([`codec`]), and the threshold
//! transforms ([`scheme`]).

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod commands;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod scheme;
pub mod verify;

pub use error::{PipelineError, PipelineResult};
