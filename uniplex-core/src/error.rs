//! Error types for uniplex.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`DispatchError`] - Everything a multimethod call can fail with
//! - [`ArgumentError`] - Failures of the argument access helpers on [`Args`]
//!
//! Declining a call is *not* an error; see [`Outcome::Unimplemented`].
//!
//! [`Args`]: crate::Args
//! [`Outcome::Unimplemented`]: crate::Outcome::Unimplemented

use crate::{dispatchable::TypeTag, domain::Domain};
use thiserror::Error;

/// A boxed error type for failures raised by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a multimethod call.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Every candidate declined and the multimethod has no default.
    #[error("no backend implemented `{name}` in domain `{domain}` ({tried} candidates tried)")]
    NotImplemented {
        /// Multimethod name.
        name: String,
        /// Multimethod domain.
        domain: Domain,
        /// Number of candidates that declined.
        tried: usize,
    },

    /// No candidate accepted a value in [`determine_backend`](crate::determine_backend).
    #[error("no backend in domain `{domain}` accepts values tagged `{tag}`")]
    NoMatchingBackend {
        /// Domain that was searched.
        domain: Domain,
        /// Tag of the probed value.
        tag: TypeTag,
    },

    /// The extractor rejected the call arguments.
    #[error("argument extraction failed for `{name}`")]
    Extract {
        /// Multimethod name.
        name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// The replacer could not rebuild the call arguments.
    #[error("argument replacement failed for `{name}`")]
    Replace {
        /// Multimethod name.
        name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// A backend committed to the call and then failed.
    #[error("backend `{backend}` failed while executing `{name}`")]
    Backend {
        /// Multimethod name.
        name: String,
        /// Name of the failing backend.
        backend: String,
        /// The failure raised by the backend, untouched.
        #[source]
        source: BoxError,
    },

    /// The default implementation failed.
    #[error("default implementation of `{name}` failed")]
    Default {
        /// Multimethod name.
        name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Returns `true` for resolution exhaustion.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, DispatchError::NotImplemented { .. })
    }

    /// Wrap a collaborator failure, passing nested dispatch errors through as-is.
    ///
    /// A backend that re-enters the resolver and propagates its error with `?`
    /// hands back a boxed `DispatchError`; that error is surfaced unchanged.
    pub(crate) fn lift(err: BoxError, wrap: impl FnOnce(BoxError) -> DispatchError) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(nested) => *nested,
            Err(err) => wrap(err),
        }
    }
}

/// Errors from the argument access helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// No positional argument at this index.
    #[error("missing positional argument {index}")]
    MissingPositional {
        /// Requested index.
        index: usize,
    },

    /// No keyword argument with this name.
    #[error("missing keyword argument `{0}`")]
    MissingKeyword(String),

    /// The argument holds a different type.
    #[error("expected argument of type `{expected}`, found `{found}`")]
    Type {
        /// Requested type.
        expected: &'static str,
        /// Actual payload type.
        found: &'static str,
    },
}
