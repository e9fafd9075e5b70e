//! `ChannelTag` newtype for share routing

use crate::error::{PipelineError, PipelineResult};

/// Channel identifier for one share's data stream (0..=999)
///
/// A tag is a routing key, not a resource: it names the channel a share's
/// bytes travel on and is persisted as the 4-byte big-endian header of the
/// share file. Tags created here are bounded by the filename scheme; tags
/// read back from share files during recovery are used as raw `u32` routing
/// keys and are deliberately not re-validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChannelTag(u32);

impl ChannelTag {
    /// Maximum valid channel tag (999)
    pub const MAX: u32 = 999;

    /// Creates a new channel tag
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidArgument`] if the tag exceeds 999.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardpipe::domain::ChannelTag;
    ///
    /// let tag = ChannelTag::new(0).unwrap();
    /// assert_eq!(*tag, 0);
    ///
    /// assert!(ChannelTag::new(999).is_ok());
    /// assert!(ChannelTag::new(1000).is_err());
    /// ```
    pub fn new(value: u32) -> PipelineResult<Self> {
        if value > Self::MAX {
            return Err(PipelineError::InvalidArgument(format!(
                "channel tag {value} is not in range [0, 999]"
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for ChannelTag {
    type Target = u32;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
