//! # uniplex - Backend-Pluggable Multiple Dispatch
//!
//! `uniplex` lets API authors declare operations once and lets any number of
//! independently written backends implement them. Which backend runs is
//! decided per call, from the caller's scoped configuration and the
//! process-wide registry.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uniplex::prelude::*;
//! use std::sync::Arc;
//!
//! const NUMBER: TypeTag = TypeTag::new("number");
//!
//! // API author: declare the operation.
//! let add = Multimethod::builder("add", "numeric")
//!     .extractor(extract::all_of_type(NUMBER))
//!     .replacer(extract::replace_all())
//!     .build();
//!
//! // Backend provider: implement it.
//! let ints = FnBackend::new("numeric", |_, args| {
//!     Ok(Outcome::value(args.arg::<i64>(0)? + args.arg::<i64>(1)?))
//! })
//! .with_converter(convert::accept_type::<i64>())
//! .into_ref();
//!
//! // Caller: pick the backend for a scope.
//! let _guard = set_backend(ints);
//! let sum = add.call(args![1_i64, 2_i64])?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use uniplex_core::{
    // Values
    Args,
    // Errors
    ArgumentError,
    // Backends
    Backend,
    BackendId,
    BackendRef,
    BoxError,
    // Resolution
    Candidate,
    DispatchError,
    // Dispatch
    Dispatchable,
    Domain,
    DomainSet,
    FnBackend,
    // Registry
    GlobalBackend,
    InvokeResult,
    // Multimethods
    Multimethod,
    MultimethodBuilder,
    Outcome,
    Registry,
    // Scopes
    ScopeFlags,
    ScopeGuard,
    State,
    StateGuard,
    TypeTag,
    Value,
    args,
    candidates,
    clear_backends,
    clear_global_backend,
    determine_backend,
    determine_backend_in,
    get_state,
    raw_values,
    register_backend,
    reset_state,
    set_backend,
    set_backend_with,
    set_global_backend,
    set_state,
    skip_backend,
};

/// Ready-made extractors and replacers.
pub mod extract {
    #![allow(clippy::wildcard_imports)]
    pub use uniplex_std::extract::*;
}

/// Ready-made converters.
pub mod convert {
    #![allow(clippy::wildcard_imports)]
    pub use uniplex_std::convert::*;
}

/// Standard backend wrappers.
pub mod backends {
    pub use uniplex_std::backends::{
        conditional::ConditionalBackend, instrument::TracingBackend, logging::LoggingBackend,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use uniplex_std::testing::*;
}

/// Link-time backend collection.
#[cfg(feature = "inventory")]
pub mod collected {
    pub use uniplex_std::collected::{
        CollectedBackend, collected_names, register_collected, register_collected_in,
    };
    pub use uniplex_std::submit_backend;
}

/// Prelude module - common imports for uniplex.
///
/// # Usage
///
/// ```rust,ignore
/// use uniplex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Args, Backend, BackendRef, BoxError, DispatchError, Dispatchable, FnBackend,
        InvokeResult, Multimethod, Outcome, ScopeFlags, TypeTag, Value, args, convert, extract,
        register_backend, set_backend, set_backend_with, set_global_backend, skip_backend,
    };
}

#[cfg(feature = "inventory")]
pub use inventory;
