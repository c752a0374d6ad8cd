//! Conditional backend for predicate-gated handling.

use uniplex_core::{
    Args, Backend, BackendId, Dispatchable, DomainSet, InvokeResult, Multimethod, Outcome, Value,
};

/// A backend that only handles calls its predicate accepts and declines the
/// rest.
///
/// # Example
///
/// ```rust,ignore
/// // Only serve `add`; everything else falls through to the next backend.
/// let adder = ConditionalBackend::new(numeric, |method, _| method.name() == "add");
/// ```
pub struct ConditionalBackend<B, P> {
    inner: B,
    predicate: P,
}

impl<B, P> ConditionalBackend<B, P>
where
    B: Backend,
    P: Fn(&Multimethod, &Args) -> bool + Send + Sync + 'static,
{
    /// Gate `inner` behind `predicate`.
    pub fn new(inner: B, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<B, P> Backend for ConditionalBackend<B, P>
where
    B: Backend,
    P: Fn(&Multimethod, &Args) -> bool + Send + Sync + 'static,
{
    fn domains(&self) -> &DomainSet {
        self.inner.domains()
    }

    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        self.inner.convert(dispatchables, coerce)
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        if !(self.predicate)(method, &args) {
            return Ok(Outcome::Unimplemented);
        }
        self.inner.invoke(method, args)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn identity(&self) -> BackendId {
        self.inner.identity()
    }
}
