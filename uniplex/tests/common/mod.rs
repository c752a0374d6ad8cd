#![allow(dead_code)]

use uniplex::{
    Args, Backend, BackendRef, BoxError, DomainSet, FnBackend, InvokeResult, Multimethod, Outcome,
    TypeTag, Value, convert, extract, skip_backend,
};

pub const NUMBER: TypeTag = TypeTag::new("number");

// ============================================================================
// Multimethods
// ============================================================================

fn sum_ints(args: &Args) -> Result<i64, BoxError> {
    args.positional()
        .iter()
        .map(|value| -> Result<i64, BoxError> { Ok(*value.get::<i64>()?) })
        .sum()
}

fn sum_floats(args: &Args) -> Result<f64, BoxError> {
    args.positional()
        .iter()
        .map(|value| -> Result<f64, BoxError> { Ok(*value.get::<f64>()?) })
        .sum()
}

/// `add` over integers, with a default implementation.
pub fn add_method(domain: &'static str) -> Multimethod {
    Multimethod::builder("add", domain)
        .extractor(extract::all_of_type(NUMBER))
        .replacer(extract::replace_all())
        .default(|args| Ok(Value::new(sum_ints(args)?)))
        .build()
}

/// `sum` has no default: if every backend declines, the call fails.
pub fn sum_method(domain: &'static str) -> Multimethod {
    Multimethod::builder("sum", domain)
        .extractor(extract::all_of_type(NUMBER))
        .replacer(extract::replace_all())
        .build()
}

// ============================================================================
// Backends
// ============================================================================

pub fn int_backend(domain: &'static str) -> BackendRef {
    FnBackend::new(domain, |_, args| {
        Ok(Outcome::value(format!("int:{}", sum_ints(&args)?)))
    })
    .with_converter(convert::accept_type::<i64>())
    .named("int")
    .into_ref()
}

pub fn float_backend(domain: &'static str) -> BackendRef {
    FnBackend::new(domain, |_, args| {
        Ok(Outcome::value(format!("float:{}", sum_floats(&args)?)))
    })
    .with_converter(convert::accept_type::<f64>())
    .named("float")
    .into_ref()
}

pub fn parse_int(value: &Value) -> Option<i64> {
    value.downcast_ref::<&str>()?.parse().ok()
}

/// Accepts integers, and numeric strings when coercion is requested.
pub fn coercing_backend(domain: &'static str) -> BackendRef {
    FnBackend::new(domain, |_, args| Ok(Outcome::value(sum_ints(&args)?)))
        .with_converter(convert::coerce_into(parse_int))
        .named("coercing")
        .into_ref()
}

/// Hides itself, re-enters the multimethod and wraps whatever the rest of
/// the stack computes.
pub struct MetaBackend {
    domains: DomainSet,
}

impl MetaBackend {
    pub fn new(domain: &'static str) -> Self {
        Self {
            domains: domain.into(),
        }
    }
}

impl Backend for MetaBackend {
    fn domains(&self) -> &DomainSet {
        &self.domains
    }

    fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
        let _skip = skip_backend(self);
        let inner = method.call(args)?;
        Ok(Outcome::value(format!("meta({})", inner.get::<String>()?)))
    }

    fn name(&self) -> &str {
        "meta"
    }
}

// ============================================================================
// Assertions
// ============================================================================

pub fn text(value: &Value) -> &str {
    value
        .downcast_ref::<String>()
        .map(String::as_str)
        .unwrap_or("<not a string>")
}
