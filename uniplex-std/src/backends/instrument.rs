//! Span instrumentation for backends.

use uniplex_core::{
    Args, Backend, BackendId, Dispatchable, DomainSet, InvokeResult, Multimethod, Outcome, Value,
};

/// A backend that runs every invocation of the backend it wraps inside an
/// `info` span named `uniplex.invoke`.
///
/// Nested multimethod calls made by the inner backend show up as children
/// of that span. Without the `tracing` feature no span is created.
pub struct TracingBackend<B> {
    inner: B,
}

impl<B: Backend> TracingBackend<B> {
    /// Wrap `inner`.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: Backend> Backend for TracingBackend<B> {
    fn domains(&self) -> &DomainSet {
        self.inner.domains()
    }

    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        self.inner.convert(dispatchables, coerce)
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        #[cfg(feature = "tracing")]
        let _entered = tracing::info_span!(
            "uniplex.invoke",
            backend = self.inner.name(),
            method = method.name(),
            domain = %method.domain(),
        )
        .entered();
        self.inner.invoke(method, args)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn identity(&self) -> BackendId {
        self.inner.identity()
    }
}
