//! Threshold newtype for share reconstruction

use crate::error::{PipelineError, PipelineResult};

/// Minimum number of shares required to reconstruct a stream (1..=1000)
///
/// Invariant: 1 <= threshold <= 1000 (enforced at construction)
/// The upper bound comes from the share file naming scheme, which zero-pads
/// the share index to exactly three decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(u16);

impl Threshold {
    /// Minimum valid threshold
    pub const MIN: u16 = 1;

    /// Maximum valid threshold (1000)
    pub const MAX: u16 = 1000;

    /// Creates a new threshold, returning an error if outside `[1, 1000]`
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidArgument`] if the value is 0 or
    /// greater than 1000.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardpipe::domain::Threshold;
    ///
    /// let threshold = Threshold::new(3).unwrap();
    /// assert_eq!(*threshold, 3);
    ///
    /// // A 1-of-n split is degenerate but well-defined
    /// assert!(Threshold::new(1).is_ok());
    ///
    /// // Out of range
    /// assert!(Threshold::new(0).is_err());
    /// assert!(Threshold::new(1001).is_err());
    /// ```
    pub fn new(value: u16) -> PipelineResult<Self> {
        if value < Self::MIN || value > Self::MAX {
            return Err(PipelineError::InvalidArgument(format!(
                "{value} is not in range [1, 1000]"
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for Threshold {
    type Target = u16;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
