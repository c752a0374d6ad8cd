//! Three-way call outcomes.
//!
//! Converters and invokers answer with an [`Outcome`]; invokers additionally
//! wrap it in a `Result` so that a committed failure is distinct from a
//! decline:
//!
//! - `Ok(Outcome::Success(v))` - handled, resolution stops with `v`
//! - `Ok(Outcome::Unimplemented)` - declined, try the next candidate
//! - `Err(e)` - failed, propagates to the caller immediately

use crate::{error::BoxError, value::Value};

/// Result of a conversion or invocation attempt.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = Value> {
    /// The candidate handled the request.
    Success(T),
    /// The candidate does not apply; try the next one.
    Unimplemented,
}

/// What a backend invoker returns.
pub type InvokeResult = Result<Outcome<Value>, BoxError>;

impl<T> Outcome<T> {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns `true` for [`Outcome::Unimplemented`].
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Outcome::Unimplemented)
    }

    /// Map the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(t) => Outcome::Success(f(t)),
            Outcome::Unimplemented => Outcome::Unimplemented,
        }
    }

    /// The success payload, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(t) => Some(t),
            Outcome::Unimplemented => None,
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(t) => Outcome::Success(t),
            None => Outcome::Unimplemented,
        }
    }
}

impl Outcome<Value> {
    /// Wrap a concrete result.
    pub fn value<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Outcome::Success(Value::new(value))
    }
}
