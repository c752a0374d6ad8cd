//! Logging wrapper for backend observation.

use uniplex_core::{
    Args, Backend, BackendId, Dispatchable, DomainSet, InvokeResult, Multimethod, Outcome, Value,
};

/// A backend that logs every conversion and invocation of the backend it
/// wraps.
///
/// Events are emitted at `debug` level under the `tracing` feature; without
/// it the wrapper is a pure pass-through.
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: Backend> LoggingBackend<B> {
    /// Wrap `inner`.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backend> Backend for LoggingBackend<B> {
    fn domains(&self) -> &DomainSet {
        self.inner.domains()
    }

    fn convert(&self, dispatchables: &[Dispatchable], coerce: bool) -> Outcome<Vec<Value>> {
        let outcome = self.inner.convert(dispatchables, coerce);
        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                backend = self.inner.name(),
                count = dispatchables.len(),
                coerce,
                accepted = outcome.is_success(),
                "convert"
            );
        }
        outcome
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                backend = self.inner.name(),
                method = method.name(),
                ?args,
                "invoke"
            );
        }
        let result = self.inner.invoke(method, args);
        #[cfg(feature = "tracing")]
        {
            match &result {
                Ok(Outcome::Success(value)) => {
                    tracing::debug!(backend = self.inner.name(), ?value, "invoke succeeded")
                }
                Ok(Outcome::Unimplemented) => {
                    tracing::debug!(backend = self.inner.name(), "invoke declined")
                }
                Err(error) => {
                    tracing::debug!(backend = self.inner.name(), %error, "invoke failed")
                }
            }
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn identity(&self) -> BackendId {
        self.inner.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uniplex_core::{FnBackend, Registry, TypeTag, set_backend};

    const NUMBER: TypeTag = TypeTag::new("number");

    #[test]
    fn test_logging_is_transparent() {
        let registry = Arc::new(Registry::new());
        let method = Multimethod::builder("double", "logging-tests")
            .extractor(|args: &Args| Ok(vec![Dispatchable::new(args.get(0)?.clone(), NUMBER)]))
            .registry(registry)
            .build();
        let inner = FnBackend::new("logging-tests", |_, args| {
            Ok(Outcome::value(args.arg::<i64>(0)? * 2))
        })
        .named("doubler");
        let backend = Arc::new(LoggingBackend::new(inner));
        assert_eq!(backend.name(), "doubler");

        let _guard = set_backend(backend);
        let result = method.call(Args::new().with(21_i64)).unwrap();
        assert_eq!(result.downcast_ref::<i64>(), Some(&42));
    }

    #[test]
    fn test_logging_forwards_identity() {
        let inner: Arc<FnBackend> = Arc::new(FnBackend::new("logging-tests", |_, _| {
            Ok(Outcome::Unimplemented)
        }));
        let wrapped = LoggingBackend::new(inner.clone());
        assert_eq!(wrapped.identity(), inner.identity());
    }
}
