//! Testing utilities for uniplex.
//!
//! Test doubles for checking which backend a call reaches and what it sees.
//!
//! # Features
//!
//! - [`RecordingBackend`]: records every invocation it receives
//! - [`CountingBackend`]: counts invocations and conversions
//! - [`DecliningBackend`]: serves a domain but declines every conversion
//! - [`FailingBackend`]: fails every invocation with an [`InjectedError`]
//!
//! All doubles are cheap to clone and clones share their records, so a test
//! can keep one clone for inspection and hand another to the runtime. Each
//! clone is a distinct backend as far as resolution is concerned.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use thiserror::Error;
use uniplex_core::{
    Args, Backend, Dispatchable, DomainSet, InvokeResult, Multimethod, Outcome, Value,
};

// ============================================================================
// Recording Backend
// ============================================================================

/// One invocation seen by a [`RecordingBackend`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Name of the multimethod that was called.
    pub method: String,
    /// The arguments the backend received, after replacement.
    pub args: Args,
}

/// A backend that records all invocations it receives.
///
/// By default it declines every call after recording it, so resolution
/// continues past it.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingBackend::new("numeric").with_result(Value::new(0_i64));
/// let _guard = set_backend(Arc::new(recorder.clone()));
///
/// add.call(args![1_i64, 2_i64])?;
///
/// assert_eq!(recorder.count(), 1);
/// assert_eq!(recorder.calls()[0].method, "add");
/// ```
#[derive(Clone)]
pub struct RecordingBackend {
    domains: DomainSet,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    result: Option<Value>,
}

impl RecordingBackend {
    /// Create a recording backend for `domains` that declines.
    pub fn new(domains: impl Into<DomainSet>) -> Self {
        Self {
            domains: domains.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            result: None,
        }
    }

    /// Answer every call with `result` instead of declining.
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a clone of the recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Backend for RecordingBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        self.lock().push(RecordedCall {
            method: method.name().to_string(),
            args,
        });
        Ok(self.result.clone().into())
    }

    fn name(&self) -> &str {
        "RecordingBackend"
    }
}

// ============================================================================
// Counting Backend
// ============================================================================

/// A backend that counts conversions and invocations, then declines.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingBackend::new("numeric");
/// register_backend(Arc::new(counter.clone()));
///
/// add.call(args![1_i64, 2_i64])?;
///
/// assert_eq!(counter.invocations(), 1);
/// ```
#[derive(Clone)]
pub struct CountingBackend {
    domains: DomainSet,
    conversions: Arc<AtomicUsize>,
    invocations: Arc<AtomicUsize>,
}

impl CountingBackend {
    /// Create a counting backend for `domains`.
    pub fn new(domains: impl Into<DomainSet>) -> Self {
        Self {
            domains: domains.into(),
            conversions: Arc::new(AtomicUsize::new(0)),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the converter ran.
    pub fn conversions(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }

    /// Number of times the invoker ran.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Reset both counters.
    pub fn reset(&self) {
        self.conversions.store(0, Ordering::SeqCst);
        self.invocations.store(0, Ordering::SeqCst);
    }
}

impl Backend for CountingBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn convert(&self, dispatchables: &[Dispatchable], _coerce: bool) -> Outcome<Vec<Value>> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        Outcome::Success(uniplex_core::raw_values(dispatchables))
    }

    fn invoke(&self, _method: &Multimethod, _args: Args) -> InvokeResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Unimplemented)
    }

    fn name(&self) -> &str {
        "CountingBackend"
    }
}

// ============================================================================
// Declining Backend
// ============================================================================

/// A backend that serves its domains but never accepts any argument.
///
/// Its invoker must never run; if it does, it fails the call.
#[derive(Clone)]
pub struct DecliningBackend {
    domains: DomainSet,
}

impl DecliningBackend {
    /// Create a declining backend for `domains`.
    pub fn new(domains: impl Into<DomainSet>) -> Self {
        Self {
            domains: domains.into(),
        }
    }
}

impl Backend for DecliningBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn convert(&self, _dispatchables: &[Dispatchable], _coerce: bool) -> Outcome<Vec<Value>> {
        Outcome::Unimplemented
    }

    fn invoke(&self, method: &Multimethod, _args: Args) -> InvokeResult {
        Err(InjectedError(format!("`{}` reached a declining backend", method.name())).into())
    }

    fn name(&self) -> &str {
        "DecliningBackend"
    }
}

// ============================================================================
// Failing Backend
// ============================================================================

/// The error raised by [`FailingBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("injected failure: {0}")]
pub struct InjectedError(pub String);

/// A backend that fails every invocation.
#[derive(Clone)]
pub struct FailingBackend {
    domains: DomainSet,
    message: String,
}

impl FailingBackend {
    /// Create a failing backend for `domains`.
    pub fn new(domains: impl Into<DomainSet>, message: impl Into<String>) -> Self {
        Self {
            domains: domains.into(),
            message: message.into(),
        }
    }
}

impl Backend for FailingBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn invoke(&self, _method: &Multimethod, _args: Args) -> InvokeResult {
        Err(InjectedError(self.message.clone()).into())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniplex_core::{DispatchError, Registry, TypeTag, set_backend};

    const NUMBER: TypeTag = TypeTag::new("number");

    fn method(name: &str) -> Multimethod {
        Multimethod::builder(name, "testing-tests")
            .extractor(|args: &Args| Ok(vec![Dispatchable::new(args.get(0)?.clone(), NUMBER)]))
            .registry(Arc::new(Registry::new()))
            .build()
    }

    #[test]
    fn test_recording_backend_records_and_declines() {
        let recorder = RecordingBackend::new("testing-tests");
        let _guard = set_backend(Arc::new(recorder.clone()));

        let err = method("probe").call(Args::new().with(1_i64)).unwrap_err();
        assert!(err.is_not_implemented());
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.calls()[0].method, "probe");

        recorder.clear();
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_counting_backend_counts_both_stages() {
        let counter = CountingBackend::new("testing-tests");
        let _guard = set_backend(Arc::new(counter.clone()));

        let _ = method("probe").call(Args::new().with(1_i64));
        assert_eq!(counter.conversions(), 1);
        assert_eq!(counter.invocations(), 1);

        counter.reset();
        assert_eq!(counter.invocations(), 0);
    }

    #[test]
    fn test_declining_backend_never_invokes() {
        let _guard = set_backend(Arc::new(DecliningBackend::new("testing-tests")));
        let err = method("probe").call(Args::new().with(1_i64)).unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_failing_backend_propagates() {
        let _guard = set_backend(Arc::new(FailingBackend::new("testing-tests", "boom")));
        let err = method("probe").call(Args::new().with(1_i64)).unwrap_err();
        match err {
            DispatchError::Backend { source, .. } => {
                let injected = source.downcast_ref::<InjectedError>().unwrap();
                assert_eq!(injected.0, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
