//! # Opaque Values and Call Arguments
//!
//! The runtime never interprets the arguments it routes. A [`Value`] is a
//! type-erased, reference-counted payload, and [`Args`] is the uniform call
//! shape every multimethod receives: an ordered positional list plus a
//! keyword map.
//!
//! # Example
//!
//! ```rust,ignore
//! let args = Args::new().with(2_i64).with(3_i64).with_keyword("scale", 0.5_f64);
//! assert_eq!(*args.arg::<i64>(0)?, 2);
//! ```

use crate::error::ArgumentError;
use std::{
    any::{Any, type_name},
    collections::BTreeMap,
    fmt,
    sync::Arc,
};

/// A type-erased, shared argument value.
///
/// Cloning is O(1): only the reference count changes.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns `true` if the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the payload as a `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Borrow the payload as a `T`, reporting the mismatch otherwise.
    pub fn get<T: Any>(&self) -> Result<&T, ArgumentError> {
        self.downcast_ref::<T>().ok_or_else(|| ArgumentError::Type {
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }

    /// The Rust type name of the payload, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both values share the same payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_name)
    }
}

/// The arguments of one multimethod call.
#[derive(Clone, Debug, Default)]
pub struct Args {
    positional: Vec<Value>,
    keyed: BTreeMap<String, Value>,
}

impl Args {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an argument list from already wrapped positional values.
    pub fn from_values(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keyed: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.positional.push(Value::new(value));
        self
    }

    /// Append an already wrapped positional argument.
    pub fn with_value(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    /// Set a keyword argument.
    pub fn with_keyword<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.keyed.insert(key.into(), Value::new(value));
        self
    }

    /// Set an already wrapped keyword argument.
    pub fn with_keyword_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.keyed.insert(key.into(), value);
        self
    }

    /// The positional arguments, in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// The keyword arguments.
    pub fn keyed(&self) -> &BTreeMap<String, Value> {
        &self.keyed
    }

    /// Replace the positional argument at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), ArgumentError> {
        let slot = self
            .positional
            .get_mut(index)
            .ok_or(ArgumentError::MissingPositional { index })?;
        *slot = value;
        Ok(())
    }

    /// Insert or replace a keyword argument.
    pub fn set_keyword(&mut self, key: impl Into<String>, value: Value) {
        self.keyed.insert(key.into(), value);
    }

    /// The positional argument at `index`.
    pub fn get(&self, index: usize) -> Result<&Value, ArgumentError> {
        self.positional
            .get(index)
            .ok_or(ArgumentError::MissingPositional { index })
    }

    /// The keyword argument named `key`.
    pub fn keyword(&self, key: &str) -> Result<&Value, ArgumentError> {
        self.keyed
            .get(key)
            .ok_or_else(|| ArgumentError::MissingKeyword(key.to_string()))
    }

    /// The positional argument at `index`, downcast to `T`.
    pub fn arg<T: Any>(&self, index: usize) -> Result<&T, ArgumentError> {
        self.get(index)?.get::<T>()
    }

    /// The keyword argument named `key`, downcast to `T`.
    pub fn kwarg<T: Any>(&self, key: &str) -> Result<&T, ArgumentError> {
        self.keyword(key)?.get::<T>()
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Returns `true` if there are neither positional nor keyword arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyed.is_empty()
    }

    /// Split into positional and keyword parts.
    pub fn into_parts(self) -> (Vec<Value>, BTreeMap<String, Value>) {
        (self.positional, self.keyed)
    }
}

/// Build an [`Args`] from positional expressions.
///
/// ```rust,ignore
/// let args = args![1_i64, 2_i64];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}
