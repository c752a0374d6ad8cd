//! # Backends
//!
//! A backend is a capability provider: it declares the domains it serves,
//! optionally converts dispatchable arguments into values it understands,
//! and executes multimethod calls.
//!
//! # Usage Patterns
//!
//! 1. **Struct implementation**: `impl Backend for MyBackend`
//! 2. **Closures**: `FnBackend::new("numeric", |method, args| ...)`
//!
//! Backends are shared as [`BackendRef`] and identified by allocation, so the
//! same `Arc` pushed twice is the same backend, while two `Arc::new` calls on
//! equal values are two different backends.

use crate::{
    dispatchable::{Dispatchable, raw_values},
    domain::DomainSet,
    multimethod::Multimethod,
    outcome::{InvokeResult, Outcome},
    value::{Args, Value},
};
use std::{fmt, sync::Arc};

/// A capability provider for one or more domains.
///
/// Only [`invoke`](Backend::invoke) and [`domains`](Backend::domains) are
/// required. The default [`convert`](Backend::convert) accepts every
/// dispatchable unchanged.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a uniplex `Backend`",
    label = "missing `Backend` implementation",
    note = "Backends must declare their domains and implement `invoke`."
)]
pub trait Backend: Send + Sync + 'static {
    /// The domains this backend serves.
    fn domains(&self) -> &DomainSet;

    /// Convert dispatchables into the values this backend works with.
    ///
    /// Must return exactly one value per dispatchable, in order, or
    /// [`Outcome::Unimplemented`] to decline. `coerce` is the caller's
    /// request; whether a given value may actually be coerced is up to the
    /// converter, see [`Dispatchable::may_coerce`].
    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        let _ = coerce;
        Outcome::Success(raw_values(dispatchables))
    }

    /// Execute `method` with the final, post-replacement arguments.
    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult;

    /// A human readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns `true` if this backend serves `domain`.
    fn serves(&self, domain: &str) -> bool {
        self.domains().contains(domain)
    }

    /// The identity used for skipping and de-duplication.
    ///
    /// Wrappers forward this to the wrapped backend, so that a wrapped
    /// backend skipping itself also hides its wrapper.
    fn identity(&self) -> BackendId {
        BackendId::of(self)
    }
}

/// A shared backend handle.
pub type BackendRef = Arc<dyn Backend>;

// Lets wrappers take either a concrete backend or a shared handle.
impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn domains(&self) -> &DomainSet {
        (**self).domains()
    }

    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        (**self).convert(dispatchables, coerce)
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        (**self).invoke(method, args)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn serves(&self, domain: &str) -> bool {
        (**self).serves(domain)
    }

    fn identity(&self) -> BackendId {
        (**self).identity()
    }
}

/// Identity of a live backend, derived from its address.
///
/// `BackendId::of(&*arc)` and `BackendId::of(self)` inside the backend's own
/// methods agree, which is what lets a backend skip itself.
/// Resolution compares [`Backend::identity`], which defaults to this.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(usize);

impl BackendId {
    /// The identity of `backend`.
    pub fn of<B: Backend + ?Sized>(backend: &B) -> Self {
        Self(backend as *const B as *const () as usize)
    }
}

impl fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backend").field(&self.name()).finish()
    }
}

impl fmt::Debug for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendId({:#x})", self.0)
    }
}

type InvokeFn = dyn Fn(&Multimethod, Args) -> InvokeResult + Send + Sync;
type ConvertFn = dyn Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync;

/// A backend assembled from closures.
///
/// # Example
///
/// ```rust,ignore
/// let backend = FnBackend::new("numeric", |method, args| {
///     if method.name() != "add" {
///         return Ok(Outcome::Unimplemented);
///     }
///     let (a, b) = (args.arg::<i64>(0)?, args.arg::<i64>(1)?);
///     Ok(Outcome::value(a + b))
/// })
/// .with_converter(|ds, _coerce| ...)
/// .into_ref();
/// ```
pub struct FnBackend {
    name: String,
    domains: DomainSet,
    invoker: Box<InvokeFn>,
    converter: Option<Box<ConvertFn>>,
}

impl FnBackend {
    /// Create a backend for `domains` around an invoker closure.
    pub fn new<F>(domains: impl Into<DomainSet>, invoker: F) -> Self
    where
        F: Fn(&Multimethod, Args) -> InvokeResult + Send + Sync + 'static,
    {
        Self {
            name: "FnBackend".to_string(),
            domains: domains.into(),
            invoker: Box::new(invoker),
            converter: None,
        }
    }

    /// Attach a converter.
    pub fn with_converter<C>(mut self, converter: C) -> Self
    where
        C: Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync + 'static,
    {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Set the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Share the backend.
    pub fn into_ref(self) -> BackendRef {
        Arc::new(self)
    }
}

impl Backend for FnBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        match &self.converter {
            Some(converter) => converter(dispatchables, coerce),
            None => Outcome::Success(raw_values(dispatchables)),
        }
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        (self.invoker)(method, args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FnBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBackend")
            .field("name", &self.name)
            .field("domains", &self.domains)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}
