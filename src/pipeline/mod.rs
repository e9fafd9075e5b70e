//! Filter-graph plumbing: sources, sinks, the chunked pump, and the
//! channel router
//!
//! A pipeline is a small directed graph of nodes with single-owner edges.
//! Sources expose a uniform pull interface ("read up to N bytes, 0 means
//! exhausted"); sinks consume byte slices and an explicit end-of-stream
//! signal. A [`Pump`] moves a bounded chunk per step from a source into
//! whatever the orchestrator wires behind it, and a [`ChannelRouter`] fans
//! tagged writes out across registered sinks. Everything is synchronous and
//! single-threaded; shared sinks are `Rc<RefCell<_>>` handles.

mod pump;
mod router;
mod sink;
mod source;

pub use pump::{PUMP_CHUNK, Pump};
pub use router::ChannelRouter;
pub use sink::{ByteSink, FileSink, SinkHandle, VecSink};
pub use source::{ByteSource, FileSource, SliceSource};
