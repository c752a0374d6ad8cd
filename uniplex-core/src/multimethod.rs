//! # Multimethods
//!
//! A [`Multimethod`] is a named, domain-scoped dispatch point. It is built
//! once from three pieces supplied by the API author:
//!
//! - an **extractor**, which picks the dispatch-relevant arguments out of a
//!   call and tags them as [`Dispatchable`]s;
//! - an optional **replacer**, which writes converted values back into the
//!   call; without one, backends see the original arguments;
//! - an optional **default**, run with the original arguments when every
//!   backend declines.
//!
//! # Example
//!
//! ```rust,ignore
//! const NUMBER: TypeTag = TypeTag::new("number");
//!
//! let add = Multimethod::builder("add", "numeric")
//!     .extractor(|args| Ok(args.positional().iter().cloned()
//!         .map(|v| Dispatchable::new(v, NUMBER)).collect()))
//!     .replacer(|_, converted| Ok(Args::from_values(converted)))
//!     .default(|args| Ok(Value::new(args.arg::<i64>(0)? + args.arg::<i64>(1)?)))
//!     .build();
//!
//! let sum = add.call(args![1_i64, 2_i64])?;
//! ```

use crate::{
    dispatchable::Dispatchable,
    domain::Domain,
    error::{BoxError, DispatchError},
    registry::Registry,
    resolver,
    value::{Args, Value},
};
use std::{fmt, sync::Arc};

type ExtractFn = dyn Fn(&Args) -> Result<Vec<Dispatchable>, BoxError> + Send + Sync;
type ReplaceFn = dyn Fn(&Args, Vec<Value>) -> Result<Args, BoxError> + Send + Sync;
type DefaultFn = dyn Fn(&Args) -> Result<Value, BoxError> + Send + Sync;

struct Inner {
    name: String,
    domain: Domain,
    extractor: Box<ExtractFn>,
    replacer: Option<Box<ReplaceFn>>,
    default: Option<Box<DefaultFn>>,
    registry: Arc<Registry>,
}

/// A callable multimethod handle.
///
/// Cloning is O(1) and clones refer to the same multimethod.
#[derive(Clone)]
pub struct Multimethod {
    inner: Arc<Inner>,
}

impl Multimethod {
    /// Start defining a multimethod.
    pub fn builder(name: impl Into<String>, domain: impl Into<Domain>) -> MultimethodBuilder {
        MultimethodBuilder {
            name: name.into(),
            domain: domain.into(),
            extractor: None,
            replacer: None,
            default: None,
            registry: None,
        }
    }

    /// The multimethod name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The multimethod domain.
    pub fn domain(&self) -> &Domain {
        &self.inner.domain
    }

    /// The registry consulted below the scoped backends.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Returns `true` if a default implementation was declared.
    pub fn has_default(&self) -> bool {
        self.inner.default.is_some()
    }

    /// Returns `true` if `other` is a handle to the same multimethod.
    pub fn same_as(&self, other: &Multimethod) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call the multimethod, resolving the implementation through the
    /// current thread's backend stack and the registry.
    pub fn call(&self, args: Args) -> Result<Value, DispatchError> {
        resolver::resolve(self, args)
    }

    /// Run the extractor.
    pub fn extract(&self, args: &Args) -> Result<Vec<Dispatchable>, DispatchError> {
        (self.inner.extractor)(args).map_err(|source| DispatchError::Extract {
            name: self.inner.name.clone(),
            source,
        })
    }

    /// Rebuild the call arguments from converted values.
    ///
    /// Without a replacer the original arguments are returned untouched.
    pub fn replace(&self, args: &Args, converted: Vec<Value>) -> Result<Args, DispatchError> {
        match &self.inner.replacer {
            Some(replacer) => replacer(args, converted).map_err(|source| DispatchError::Replace {
                name: self.inner.name.clone(),
                source,
            }),
            None => Ok(args.clone()),
        }
    }

    /// Run the default implementation, if there is one.
    pub fn call_default(&self, args: &Args) -> Option<Result<Value, DispatchError>> {
        let default = self.inner.default.as_ref()?;
        Some(default(args).map_err(|err| {
            DispatchError::lift(err, |source| DispatchError::Default {
                name: self.inner.name.clone(),
                source,
            })
        }))
    }
}

impl fmt::Debug for Multimethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multimethod")
            .field("name", &self.inner.name)
            .field("domain", &self.inner.domain)
            .field("replacer", &self.inner.replacer.is_some())
            .field("default", &self.inner.default.is_some())
            .finish()
    }
}

fn no_dispatchables(_: &Args) -> Result<Vec<Dispatchable>, BoxError> {
    Ok(Vec::new())
}

/// Builder returned by [`Multimethod::builder`].
pub struct MultimethodBuilder {
    name: String,
    domain: Domain,
    extractor: Option<Box<ExtractFn>>,
    replacer: Option<Box<ReplaceFn>>,
    default: Option<Box<DefaultFn>>,
    registry: Option<Arc<Registry>>,
}

impl MultimethodBuilder {
    /// Set the extractor. Without one, no argument takes part in dispatch.
    pub fn extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Args) -> Result<Vec<Dispatchable>, BoxError> + Send + Sync + 'static,
    {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Set the replacer.
    pub fn replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(&Args, Vec<Value>) -> Result<Args, BoxError> + Send + Sync + 'static,
    {
        self.replacer = Some(Box::new(replacer));
        self
    }

    /// Set the default implementation.
    pub fn default<F>(mut self, default: F) -> Self
    where
        F: Fn(&Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.default = Some(Box::new(default));
        self
    }

    /// Resolve against `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Multimethod {
        Multimethod {
            inner: Arc::new(Inner {
                name: self.name,
                domain: self.domain,
                extractor: self.extractor.unwrap_or_else(|| Box::new(no_dispatchables)),
                replacer: self.replacer,
                default: self.default,
                registry: self
                    .registry
                    .unwrap_or_else(|| Arc::clone(Registry::global())),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatchable::TypeTag;

    const NUMBER: TypeTag = TypeTag::new("number");

    fn identity_method() -> Multimethod {
        Multimethod::builder("first", "multimethod-tests")
            .extractor(|args| Ok(vec![Dispatchable::new(args.get(0)?.clone(), NUMBER)]))
            .build()
    }

    #[test]
    fn test_extract_reports_missing_argument() {
        let method = identity_method();
        let err = method.extract(&Args::new()).unwrap_err();
        assert!(matches!(err, DispatchError::Extract { ref name, .. } if name == "first"));
    }

    #[test]
    fn test_replace_without_replacer_keeps_originals() {
        let method = identity_method();
        let args = Args::new().with(1_i64);
        let replaced = method.replace(&args, vec![Value::new(99_i64)]).unwrap();
        assert_eq!(*replaced.arg::<i64>(0).unwrap(), 1);
    }

    #[test]
    fn test_replace_with_replacer() {
        let method = Multimethod::builder("first", "multimethod-tests")
            .replacer(|_, converted| Ok(Args::from_values(converted)))
            .build();
        let replaced = method
            .replace(&Args::new().with(1_i64), vec![Value::new(99_i64)])
            .unwrap();
        assert_eq!(*replaced.arg::<i64>(0).unwrap(), 99);
    }

    #[test]
    fn test_clones_are_the_same_multimethod() {
        let method = identity_method();
        assert!(method.same_as(&method.clone()));
        assert!(!method.same_as(&identity_method()));
        assert!(!method.has_default());
    }
}
