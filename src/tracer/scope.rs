//! Scopes and the tracer that mints them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::tracer::span::{FinishedSpan, Span};

type SpanSink = Arc<Mutex<Vec<FinishedSpan>>>;

/// Handle through which one span is closed.
///
/// Closing delivers the finished span to the tracer's sink. Closing twice
/// is a no-op: the span is accounted exactly once no matter how many close
/// attempts race down different control-flow paths.
pub struct Scope {
    span: Span,
    closed: bool,
    sink: SpanSink,
}

impl Scope {
    /// The span managed by this scope.
    ///
    /// Mutations after the scope has closed are lost; the finished span was
    /// already snapshotted.
    pub fn span(&mut self) -> &mut Span {
        &mut self.span
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the scope, delivering the span to the sink. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            tracing::debug!(span = self.span.name(), "scope already closed, ignoring");
            return;
        }
        self.closed = true;
        self.sink.lock().push(self.span.finish());
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Safety net: a scope abandoned while open still accounts its span
        // once. The executor and registry close explicitly on every path,
        // so this only fires for caller-managed scopes.
        if !self.closed {
            tracing::debug!(span = self.span.name(), "scope dropped while open, closing");
            self.close();
        }
    }
}

/// Injectable tracer facade.
///
/// Mints scopes and collects finished spans in memory. Cheap to clone; all
/// clones share one sink. Tests instantiate their own tracer, so nothing
/// here is process-global.
#[derive(Clone, Default)]
pub struct Tracer {
    sink: SpanSink,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a span and return the scope that will close it.
    pub fn start_span(&self, name: impl Into<String>) -> Scope {
        Scope {
            span: Span::new(name),
            closed: false,
            sink: Arc::clone(&self.sink),
        }
    }

    /// Snapshot of all spans finished so far, in close order.
    pub fn finished(&self) -> Vec<FinishedSpan> {
        self.sink.lock().clone()
    }

    /// Drain finished spans, handing them to the transport layer.
    pub fn drain(&self) -> Vec<FinishedSpan> {
        std::mem::take(&mut *self.sink.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_delivers_span_once() {
        let tracer = Tracer::new();
        let mut scope = tracer.start_span("op");
        scope.close();
        scope.close();
        assert_eq!(tracer.finished().len(), 1);
        assert_eq!(tracer.finished()[0].name, "op");
    }

    #[test]
    fn test_drop_closes_open_scope() {
        let tracer = Tracer::new();
        {
            let mut scope = tracer.start_span("abandoned");
            scope.span().set_tag("k", "v");
        }
        let finished = tracer.finished();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].tags.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_mutation_after_close_is_lost() {
        let tracer = Tracer::new();
        let mut scope = tracer.start_span("op");
        scope.close();
        scope.span().set_tag("late", "ignored");
        assert!(tracer.finished()[0].tags.is_empty());
    }

    #[test]
    fn test_drain_empties_sink() {
        let tracer = Tracer::new();
        tracer.start_span("a").close();
        tracer.start_span("b").close();
        assert_eq!(tracer.drain().len(), 2);
        assert!(tracer.finished().is_empty());
    }
}
