use std::collections::HashMap;

/// Observability span collaborator (§6): `trace(name, attrs) -> scope`,
/// scoped acquisition with guaranteed close, never raises.
pub trait Tracer: Send + Sync {
    type Scope;

    fn trace(&self, name: &str, attrs: &HashMap<String, String>) -> Self::Scope;
}

/// Default `tracing`-crate-backed implementation. The returned guard's
/// `Drop` closes the span; it never panics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

pub struct TracingScope {
    _span_guard: tracing::span::EnteredSpan,
}

impl Tracer for TracingTracer {
    type Scope = TracingScope;

    fn trace(&self, name: &str, attrs: &HashMap<String, String>) -> Self::Scope {
        let span = tracing::info_span!("cortex.op", name = %name, attrs = ?attrs);
        TracingScope {
            _span_guard: span.entered(),
        }
    }
}
