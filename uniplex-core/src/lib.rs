//! # uniplex-core
//!
//! Core types and the resolution engine of the uniplex multiple-dispatch
//! runtime.
//!
//! API authors define [`Multimethod`]s; backend providers implement
//! [`Backend`]. A call to a multimethod is routed to the first backend, in
//! priority order, that accepts the arguments and handles the call.
//!
//! # Priority Layers
//!
//! ## Layer 1: Scoped backends ([`set_backend`])
//!
//! Per-thread, innermost first. Pushed and popped by RAII guards; a backend
//! activated with [`ScopeFlags::ONLY`] ends the search when it declines.
//!
//! ## Layer 2: Registered backends ([`register_backend`])
//!
//! Process-wide, in registration order. Meant for reference implementations
//! that should work without any caller ceremony.
//!
//! ## Layer 3: Global backend ([`set_global_backend`])
//!
//! A single process-wide slot tried after everything else.
//!
//! ## Fallback: the multimethod's default implementation
//!
//! # Re-entrancy
//!
//! Backends may call multimethods from inside [`Backend::invoke`]. To delegate
//! a call to the next candidate, a backend hides itself with
//! [`skip_backend`] and calls the same multimethod again.
//!
//! # Error Types
//!
//! - [`DispatchError`] - Everything a call can fail with
//! - [`ArgumentError`] - Argument access failures inside extractors and backends

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod backend;
mod dispatchable;
mod domain;
mod error;
mod multimethod;
mod outcome;
mod registry;
mod resolver;
mod scope;
mod value;

// Re-exports
pub use backend::{Backend, BackendId, BackendRef, FnBackend};
pub use dispatchable::{Dispatchable, TypeTag, raw_values};
pub use domain::{Domain, DomainSet};
pub use error::{ArgumentError, BoxError, DispatchError};
pub use multimethod::{Multimethod, MultimethodBuilder};
pub use outcome::{InvokeResult, Outcome};
pub use registry::{
    GlobalBackend, Registry, clear_backends, clear_global_backend, register_backend,
    set_global_backend,
};
pub use resolver::{Candidate, candidates, determine_backend, determine_backend_in};
pub use scope::{
    ScopeFlags, ScopeGuard, State, StateGuard, get_state, reset_state, set_backend,
    set_backend_with, set_state, skip_backend,
};
pub use value::{Args, Value};
