//! Ready-made converters for [`FnBackend::with_converter`].
//!
//! All converters here decline the whole call as soon as one dispatchable is
//! unacceptable; a converter never guesses.
//!
//! [`FnBackend::with_converter`]: uniplex_core::FnBackend::with_converter

use std::any::Any;
use uniplex_core::{Dispatchable, Outcome, TypeTag, Value};

/// Lift a single-value converter over a dispatchable sequence.
pub fn per_value<F>(
    convert: F,
) -> impl Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync + 'static
where
    F: Fn(&Dispatchable, bool) -> Outcome<Value> + Send + Sync + 'static,
{
    move |dispatchables, coerce| {
        let mut converted = Vec::with_capacity(dispatchables.len());
        for dispatchable in dispatchables {
            match convert(dispatchable, coerce) {
                Outcome::Success(value) => converted.push(value),
                Outcome::Unimplemented => return Outcome::Unimplemented,
            }
        }
        Outcome::Success(converted)
    }
}

/// Pass values through unchanged if every tag is one of `tags`.
pub fn accept_tags<const N: usize>(
    tags: [TypeTag; N],
) -> impl Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync + 'static {
    per_value(move |dispatchable, _| {
        if tags.contains(&dispatchable.type_tag()) {
            Outcome::Success(dispatchable.value().clone())
        } else {
            Outcome::Unimplemented
        }
    })
}

/// Pass values through unchanged if every payload is a `T`.
pub fn accept_type<T: Any>()
-> impl Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync + 'static {
    per_value(|dispatchable, _| {
        if dispatchable.value().is::<T>() {
            Outcome::Success(dispatchable.value().clone())
        } else {
            Outcome::Unimplemented
        }
    })
}

/// Accept `T` payloads as they are; cast anything else with `cast`, but only
/// where coercion was requested and the dispatchable is coercible.
pub fn coerce_into<T, F>(
    cast: F,
) -> impl Fn(&[Dispatchable], bool) -> Outcome<Vec<Value>> + Send + Sync + 'static
where
    T: Any + Send + Sync,
    F: Fn(&Value) -> Option<T> + Send + Sync + 'static,
{
    per_value(move |dispatchable, coerce| {
        let value = dispatchable.value();
        if value.is::<T>() {
            return Outcome::Success(value.clone());
        }
        if !dispatchable.may_coerce(coerce) {
            return Outcome::Unimplemented;
        }
        cast(value).map(Value::new).into()
    })
}
