//! # Dispatchable Arguments
//!
//! An extractor turns call arguments into a sequence of [`Dispatchable`]s,
//! one per position that takes part in dispatch. Converters inspect the
//! [`TypeTag`] to recognise "their kind" of argument and the coercible flag
//! to decide whether a lossy conversion is allowed.

use crate::value::Value;
use std::{any::Any, fmt};

/// An opaque marker chosen by the multimethod author.
///
/// The tag names the *role* of an argument (say, "array" or "dtype"), not
/// necessarily the Rust type of its payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Create a tag.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The tag name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One dispatch-relevant argument.
///
/// Dispatchables are coercible unless marked otherwise.
#[derive(Clone, Debug)]
pub struct Dispatchable {
    value: Value,
    type_tag: TypeTag,
    coercible: bool,
}

impl Dispatchable {
    /// Wrap an already type-erased value.
    pub fn new(value: Value, type_tag: TypeTag) -> Self {
        Self {
            value,
            type_tag,
            coercible: true,
        }
    }

    /// Wrap a concrete value.
    pub fn of<T: Any + Send + Sync>(value: T, type_tag: TypeTag) -> Self {
        Self::new(Value::new(value), type_tag)
    }

    /// Forbid lossy conversion of this argument.
    pub fn non_coercible(mut self) -> Self {
        self.coercible = false;
        self
    }

    /// Set the coercible flag explicitly.
    pub fn with_coercible(mut self, coercible: bool) -> Self {
        self.coercible = coercible;
        self
    }

    /// The wrapped value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The author-chosen tag.
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Whether a converter may coerce this value when asked to.
    pub fn coercible(&self) -> bool {
        self.coercible
    }

    /// Returns `true` if a converter may coerce this value given the
    /// caller's coerce request.
    pub fn may_coerce(&self, coerce_requested: bool) -> bool {
        coerce_requested && self.coercible
    }

    /// Unwrap the value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl PartialEq for Dispatchable {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag == other.type_tag
            && self.coercible == other.coercible
            && self.value.ptr_eq(&other.value)
    }
}

/// Unwrap the raw values of a dispatchable sequence, preserving order.
pub fn raw_values(dispatchables: &[Dispatchable]) -> Vec<Value> {
    dispatchables.iter().map(|d| d.value().clone()).collect()
}
