//! Share file framing
//!
//! Each share file self-identifies with a 4-byte big-endian channel tag
//! header, written synchronously before any payload bytes and read back
//! before any payload bytes are consumed. The filename carries the same
//! index as a zero-padded three-digit suffix (`data.000` .. `data.999`),
//! which is what bounds thresholds and share counts to 1000.
//!
//! Tags are encoded and decoded through explicit big-endian helpers; the
//! header is never reinterpreted in place from raw memory.
//!
//! # Examples
//!
//! ```rust
//! use shardpipe::codec;
//!
//! let header = codec::encode_tag(7);
//! assert_eq!(header, [0, 0, 0, 7]);
//! assert_eq!(codec::decode_tag(header), 7);
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;

/// Length of the share file header in bytes.
pub const TAG_LEN: usize = 4;

/// Encodes a channel tag as the 4-byte big-endian share header.
#[must_use]
pub fn encode_tag(tag: u32) -> [u8; TAG_LEN] {
    tag.to_be_bytes()
}

/// Decodes a 4-byte big-endian share header into a channel tag.
#[must_use]
pub fn decode_tag(header: [u8; TAG_LEN]) -> u32 {
    u32::from_be_bytes(header)
}

/// Reads exactly the 4-byte tag header from a share reader.
///
/// Must be called before any payload bytes are consumed; the reader is left
/// positioned at the first payload byte.
///
/// # Errors
/// Returns an I/O error if the reader holds fewer than 4 bytes.
pub fn read_tag<R: Read>(reader: &mut R) -> PipelineResult<u32> {
    let mut header = [0u8; TAG_LEN];
    reader.read_exact(&mut header)?;
    Ok(decode_tag(header))
}

/// Builds the share file path for `base` and a share index:
/// `<base>.<index zero-padded to 3 digits>`.
#[must_use]
pub fn share_path(base: &Path, index: u32) -> PathBuf {
    PathBuf::from(format!("{}.{:03}", base.display(), index))
}
