//! # Resolution
//!
//! Decides which implementation runs for one multimethod call.
//!
//! 1. Extract the dispatchables.
//! 2. Order the candidates: scoped backends innermost first, then registered
//!    backends in registration order, then the global backend. Backends that
//!    do not serve the domain or are currently skipped are left out, and a
//!    backend reachable through several layers is only tried once, at its
//!    highest-priority position.
//! 3. For each candidate: convert, replace, invoke. A decline moves on (or
//!    ends the search for an `ONLY` candidate); a failure propagates.
//! 4. Fall back to the default implementation, then to
//!    [`DispatchError::NotImplemented`].
//!
//! No lock or thread-local borrow is held while backend code runs, so
//! backends may freely re-enter the resolver.

use crate::{
    backend::BackendRef,
    dispatchable::{Dispatchable, TypeTag},
    domain::Domain,
    error::DispatchError,
    multimethod::Multimethod,
    outcome::Outcome,
    registry::Registry,
    scope::{ScopeFlags, get_state},
    value::{Args, Value},
};
use std::collections::HashSet;

/// One backend in the order it will be tried.
#[derive(Clone)]
pub struct Candidate {
    /// The backend.
    pub backend: BackendRef,
    /// Options it was activated with.
    pub flags: ScopeFlags,
}

/// Candidates for `domain`, in resolution order, as seen from the calling
/// thread.
pub fn candidates(domain: &str, registry: &Registry) -> Vec<Candidate> {
    let state = get_state();
    let skipped = state.skipped();
    let (registered, global) = registry.snapshot();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut admit = |backend: &BackendRef, flags: ScopeFlags| {
        let id = backend.identity();
        if backend.serves(domain) && !skipped.contains(&id) && seen.insert(id) {
            out.push(Candidate {
                backend: BackendRef::clone(backend),
                flags,
            });
        }
    };

    for (backend, flags) in state.backends() {
        admit(backend, flags);
    }
    for backend in &registered {
        admit(backend, ScopeFlags::empty());
    }
    if let Some(global) = &global {
        admit(&global.backend, global.flags);
    }
    out
}

/// Resolve and run one call of `method`.
pub(crate) fn resolve(method: &Multimethod, args: Args) -> Result<Value, DispatchError> {
    let dispatchables = method.extract(&args)?;
    let candidates = candidates(method.domain().as_str(), method.registry());

    let mut tried = 0;
    for candidate in &candidates {
        tried += 1;
        match attempt(method, &args, &dispatchables, candidate)? {
            Outcome::Success(value) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    method = method.name(),
                    backend = candidate.backend.name(),
                    "call handled"
                );
                return Ok(value);
            }
            Outcome::Unimplemented if candidate.flags.only() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    method = method.name(),
                    backend = candidate.backend.name(),
                    "exclusive backend declined"
                );
                return Err(not_implemented(method, tried));
            }
            Outcome::Unimplemented => {}
        }
    }

    match method.call_default(&args) {
        Some(result) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(method = method.name(), tried, "falling back to default");
            result
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!(method = method.name(), tried, "no backend implemented call");
            Err(not_implemented(method, tried))
        }
    }
}

fn attempt(
    method: &Multimethod,
    args: &Args,
    dispatchables: &[Dispatchable],
    candidate: &Candidate,
) -> Result<Outcome, DispatchError> {
    let backend = &candidate.backend;
    let converted = match backend.convert(dispatchables, candidate.flags.coerce()) {
        Outcome::Success(converted) if converted.len() == dispatchables.len() => converted,
        Outcome::Success(_) | Outcome::Unimplemented => {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                method = method.name(),
                backend = backend.name(),
                "conversion declined"
            );
            return Ok(Outcome::Unimplemented);
        }
    };

    let call_args = method.replace(args, converted)?;
    let outcome = backend.invoke(method, call_args).map_err(|err| {
        DispatchError::lift(err, |source| DispatchError::Backend {
            name: method.name().to_string(),
            backend: backend.name().to_string(),
            source,
        })
    })?;

    #[cfg(feature = "tracing")]
    if outcome.is_unimplemented() {
        tracing::trace!(
            method = method.name(),
            backend = backend.name(),
            "invocation declined"
        );
    }
    Ok(outcome)
}

fn not_implemented(method: &Multimethod, tried: usize) -> DispatchError {
    DispatchError::NotImplemented {
        name: method.name().to_string(),
        domain: method.domain().clone(),
        tried,
    }
}

/// Find the first candidate in `domain` whose converter accepts `value`.
///
/// Useful for picking a backend from a value once and then scoping it with
/// [`set_backend`](crate::set_backend).
pub fn determine_backend(
    value: Value,
    tag: TypeTag,
    domain: impl Into<Domain>,
    coerce: bool,
) -> Result<BackendRef, DispatchError> {
    determine_backend_in(Registry::global(), value, tag, domain, coerce)
}

/// [`determine_backend`] against a specific registry.
pub fn determine_backend_in(
    registry: &Registry,
    value: Value,
    tag: TypeTag,
    domain: impl Into<Domain>,
    coerce: bool,
) -> Result<BackendRef, DispatchError> {
    let domain = domain.into();
    let probe = [Dispatchable::new(value, tag)];
    candidates(domain.as_str(), registry)
        .into_iter()
        .find(|c| {
            c.backend
                .convert(&probe, coerce || c.flags.coerce())
                .is_success()
        })
        .map(|c| c.backend)
        .ok_or(DispatchError::NoMatchingBackend { domain, tag })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::FnBackend,
        scope::{set_backend, set_backend_with, skip_backend},
    };
    use std::sync::Arc;

    const DOMAIN: &str = "resolver-tests";
    const NUMBER: TypeTag = TypeTag::new("number");

    fn named(name: &'static str) -> BackendRef {
        Arc::new(
            FnBackend::new(DOMAIN, move |_, _| Ok(Outcome::value(name))).named(name),
        )
    }

    fn declining(name: &'static str) -> BackendRef {
        Arc::new(FnBackend::new(DOMAIN, |_, _| Ok(Outcome::Unimplemented)).named(name))
    }

    fn method(registry: &Arc<Registry>) -> Multimethod {
        Multimethod::builder("probe", DOMAIN)
            .extractor(|args| Ok(vec![Dispatchable::new(args.get(0)?.clone(), NUMBER)]))
            .registry(Arc::clone(registry))
            .build()
    }

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.backend.name()).collect()
    }

    #[test]
    fn test_candidate_order_across_layers() {
        let registry = Arc::new(Registry::new());
        registry.register_backend(named("registered"));
        registry.set_global_backend(named("global"), ScopeFlags::empty());
        let _outer = set_backend(named("outer"));
        let _inner = set_backend(named("inner"));

        let candidates = candidates(DOMAIN, &registry);
        assert_eq!(
            names(&candidates),
            vec!["inner", "outer", "registered", "global"]
        );
    }

    #[test]
    fn test_duplicate_backend_tried_once() {
        let registry = Arc::new(Registry::new());
        let b = named("both");
        registry.register_backend(b.clone());
        let _scoped = set_backend_with(b, ScopeFlags::COERCE);

        let candidates = candidates(DOMAIN, &registry);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].flags.coerce());
    }

    #[test]
    fn test_skip_hides_every_layer() {
        let registry = Arc::new(Registry::new());
        let b = named("hidden");
        registry.register_backend(b.clone());
        registry.set_global_backend(b.clone(), ScopeFlags::empty());
        let _scoped = set_backend(b.clone());
        let _skip = skip_backend(&*b);

        assert!(candidates(DOMAIN, &registry).is_empty());
    }

    #[test]
    fn test_only_stops_before_lower_layers() {
        let registry = Arc::new(Registry::new());
        registry.register_backend(named("registered"));
        let method = method(&registry);
        let _only = set_backend_with(declining("picky"), ScopeFlags::ONLY);

        let err = method.call(Args::new().with(1_i64)).unwrap_err();
        assert!(matches!(err, DispatchError::NotImplemented { tried: 1, .. }));
    }

    #[test]
    fn test_mismatched_conversion_length_declines() {
        let registry = Arc::new(Registry::new());
        let method = method(&registry);
        let broken = FnBackend::new(DOMAIN, |_, _| Ok(Outcome::value("broken")))
            .with_converter(|_, _| Outcome::Success(Vec::new()))
            .into_ref();
        let _fallback = set_backend(named("fallback"));
        let _broken = set_backend(broken);

        let value = method.call(Args::new().with(1_i64)).unwrap();
        assert_eq!(*value.get::<&str>().unwrap(), "fallback");
    }

    #[test]
    fn test_determine_backend_picks_first_acceptor() {
        let registry = Registry::new();
        let ints = FnBackend::new(DOMAIN, |_, _| Ok(Outcome::Unimplemented))
            .with_converter(|ds, _| {
                if ds.iter().all(|d| d.value().is::<i64>()) {
                    Outcome::Success(crate::dispatchable::raw_values(ds))
                } else {
                    Outcome::Unimplemented
                }
            })
            .named("ints")
            .into_ref();
        registry.register_backend(ints);

        let found = determine_backend_in(&registry, Value::new(3_i64), NUMBER, DOMAIN, false)
            .unwrap();
        assert_eq!(found.name(), "ints");

        let err = determine_backend_in(&registry, Value::new("x"), NUMBER, DOMAIN, false)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoMatchingBackend { .. }));
    }
}
