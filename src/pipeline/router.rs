//! Channel router: fan-out by tag
//!
//! Forwards tagged byte ranges to the sink registered for that channel, or to
//! a default sink, and propagates end-of-stream to every distinct sink exactly
//! once. The route table is owned by the router instance; routes are
//! registered before the first byte flows and stay fixed for the pump cycle.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::PipelineResult;
use crate::pipeline::SinkHandle;

struct Route {
    sink: SinkHandle,
    propagate_end: bool,
}

/// Fan-out node: routes `write(tag, bytes)` to one of several registered
/// sinks. A write whose tag has no route and no default route is silently
/// dropped.
#[derive(Default)]
pub struct ChannelRouter {
    routes: BTreeMap<u32, Route>,
    default_route: Option<Route>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a channel to a destination sink (end propagation on).
    pub fn register(&mut self, tag: u32, sink: SinkHandle) {
        self.register_with(tag, sink, true);
    }

    /// Binds a channel to a destination sink. Routes with
    /// `propagate_end = false` are skipped by [`signal_end`](Self::signal_end);
    /// the orchestrator finalizes those sinks itself.
    pub fn register_with(&mut self, tag: u32, sink: SinkHandle, propagate_end: bool) {
        self.routes.insert(
            tag,
            Route {
                sink,
                propagate_end,
            },
        );
    }

    /// Binds the fallback sink for any unmatched tag.
    pub fn register_default(&mut self, sink: SinkHandle) {
        self.default_route = Some(Route {
            sink,
            propagate_end: true,
        });
    }

    /// Forwards `data` verbatim to the sink bound to `tag`, falling back to
    /// the default sink, or dropping the bytes when neither exists.
    pub fn write(&mut self, tag: u32, data: &[u8]) -> PipelineResult<()> {
        let route = match self.routes.get(&tag) {
            Some(route) => route,
            None => match &self.default_route {
                Some(route) => route,
                None => {
                    trace!(tag, len = data.len(), "dropping unrouted write");
                    return Ok(());
                }
            },
        };
        route.sink.borrow_mut().write(data)
    }

    /// Signals end-of-stream to every distinct sink exactly once, in tag
    /// order (default route last). Routes registered with
    /// `propagate_end = false` are skipped.
    pub fn signal_end(&mut self) -> PipelineResult<()> {
        let mut signaled: Vec<SinkHandle> = Vec::new();
        let routes = self
            .routes
            .values()
            .chain(self.default_route.as_ref())
            .filter(|route| route.propagate_end);
        for route in routes {
            if signaled.iter().any(|seen| std::rc::Rc::ptr_eq(seen, &route.sink)) {
                continue;
            }
            route.sink.borrow_mut().signal_end()?;
            signaled.push(route.sink.clone());
        }
        Ok(())
    }
}
