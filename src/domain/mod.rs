//! Domain types for the share file pipeline
//!
//! This module contains validated newtypes and configuration for file splitting:
//! - [`Threshold`] - Minimum shares required for reconstruction (1..=1000)
//! - [`ShareCount`] - Total number of share files to create (1..=1000)
//! - [`ChannelTag`] - Routing key persisted as a share file header (0..=999)
//! - [`SplitConfig`] - Validated threshold and share count pair

mod channel_tag;
mod config;
mod share_count;
mod threshold;

pub use channel_tag::ChannelTag;
pub use config::SplitConfig;
pub use share_count::ShareCount;
pub use threshold::Threshold;
