//! Byte sinks: the consuming end of a pipeline edge

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use crate::error::PipelineResult;

/// Consuming end of a pipeline edge.
///
/// `write` takes the bytes verbatim; `signal_end` marks end-of-stream and is
/// delivered at most once per sink (the router deduplicates shared sinks).
pub trait ByteSink {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()>;

    fn signal_end(&mut self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Shared sink handle.
///
/// The graph is single-threaded, so plain `Rc<RefCell<_>>` is enough; several
/// routes may point at the same sink.
pub type SinkHandle = Rc<RefCell<dyn ByteSink>>;

/// File-backed sink with buffered writes.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> PipelineResult<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl ByteSink for FileSink {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn signal_end(&mut self) -> PipelineResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, used by tests and as a combine staging target.
#[derive(Default)]
pub struct VecSink {
    pub data: Vec<u8>,
    pub ended: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteSink for VecSink {
    fn write(&mut self, data: &[u8]) -> PipelineResult<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn signal_end(&mut self) -> PipelineResult<()> {
        self.ended = true;
        Ok(())
    }
}
