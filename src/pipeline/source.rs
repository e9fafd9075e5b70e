//! Byte sources: the producing end of a pipeline edge

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::PipelineResult;

/// Producing end of a pipeline edge.
///
/// `pull` reads up to `buf.len()` bytes and returns how many were produced;
/// 0 means the source is exhausted (never a transient condition).
pub trait ByteSource {
    fn pull(&mut self, buf: &mut [u8]) -> PipelineResult<usize>;
}

/// File-backed source with buffered reads.
pub struct FileSource {
    reader: BufReader<File>,
}

impl FileSource {
    pub fn open(path: &Path) -> PipelineResult<Self> {
        Ok(Self::from_file(File::open(path)?))
    }

    /// Wraps an already-open file, preserving its current read position.
    /// Recovery uses this after consuming the 4-byte tag header.
    pub fn from_file(file: File) -> Self {
        Self {
            reader: BufReader::new(file),
        }
    }
}

impl ByteSource for FileSource {
    fn pull(&mut self, buf: &mut [u8]) -> PipelineResult<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// In-memory source over a byte buffer, used by tests.
pub struct SliceSource {
    data: Vec<u8>,
    pos: usize,
}

impl SliceSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource {
    fn pull(&mut self, buf: &mut [u8]) -> PipelineResult<usize> {
        let remaining = self.data.len() - self.pos;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
