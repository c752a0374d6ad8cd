//! Ready-made extractors and replacers.
//!
//! Most multimethods dispatch on some positional arguments and leave the
//! rest alone. These helpers cover that shape:
//!
//! ```rust,ignore
//! const ARRAY: TypeTag = TypeTag::new("array");
//!
//! let add = Multimethod::builder("add", "numeric")
//!     .extractor(all_of_type(ARRAY))
//!     .replacer(replace_all())
//!     .build();
//!
//! let clip = Multimethod::builder("clip", "numeric")
//!     .extractor(positional([0], ARRAY))
//!     .replacer(replace_positional([0]))
//!     .build();
//! ```

use uniplex_core::{ArgumentError, Args, BoxError, Dispatchable, TypeTag, Value};

/// Mark every positional argument with `tag`.
pub fn all_of_type(
    tag: TypeTag,
) -> impl Fn(&Args) -> Result<Vec<Dispatchable>, BoxError> + Send + Sync + 'static {
    move |args| {
        Ok(args
            .positional()
            .iter()
            .map(|value| Dispatchable::new(value.clone(), tag))
            .collect())
    }
}

/// Mark the positional arguments at `indices` with `tag`.
///
/// A missing index is an extraction error.
pub fn positional<const N: usize>(
    indices: [usize; N],
    tag: TypeTag,
) -> impl Fn(&Args) -> Result<Vec<Dispatchable>, BoxError> + Send + Sync + 'static {
    move |args| {
        indices
            .iter()
            .map(|&index| -> Result<Dispatchable, BoxError> {
                Ok(Dispatchable::new(args.get(index)?.clone(), tag))
            })
            .collect()
    }
}

/// Replace all positional arguments with the converted values, keeping the
/// keyword arguments.
pub fn replace_all()
-> impl Fn(&Args, Vec<Value>) -> Result<Args, BoxError> + Send + Sync + 'static {
    |args, converted| {
        let (_, keyed) = args.clone().into_parts();
        Ok(keyed
            .into_iter()
            .fold(Args::from_values(converted), |acc, (key, value)| {
                acc.with_keyword_value(key, value)
            }))
    }
}

/// Write converted values back into the positions they were taken from.
///
/// Pairs with [`positional`] given the same indices.
pub fn replace_positional<const N: usize>(
    indices: [usize; N],
) -> impl Fn(&Args, Vec<Value>) -> Result<Args, BoxError> + Send + Sync + 'static {
    move |args, converted| {
        let mut out = args.clone();
        for (&index, value) in indices.iter().zip(converted) {
            out.set(index, value)?;
        }
        Ok(out)
    }
}

/// Mark a keyword argument, if present, with `tag`.
pub fn keyword(
    key: &'static str,
    tag: TypeTag,
) -> impl Fn(&Args) -> Result<Vec<Dispatchable>, BoxError> + Send + Sync + 'static {
    move |args| match args.keyword(key) {
        Ok(value) => Ok(vec![Dispatchable::new(value.clone(), tag)]),
        Err(ArgumentError::MissingKeyword(_)) => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY: TypeTag = TypeTag::new("array");

    #[test]
    fn test_all_of_type_tags_every_positional() {
        let args = Args::new().with(1_i64).with(2_i64).with_keyword("k", 3_i64);
        let ds = all_of_type(ARRAY)(&args).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.iter().all(|d| d.type_tag() == ARRAY));
    }

    #[test]
    fn test_positional_missing_index_fails() {
        let args = Args::new().with(1_i64);
        assert!(positional([0], ARRAY)(&args).is_ok());
        assert!(positional([0, 1], ARRAY)(&args).is_err());
    }

    #[test]
    fn test_replace_positional_round_trip() {
        let args = Args::new().with(1_i64).with("keep").with(3_i64);
        let replaced =
            replace_positional([0, 2])(&args, vec![Value::new(10_i64), Value::new(30_i64)])
                .unwrap();
        assert_eq!(*replaced.arg::<i64>(0).unwrap(), 10);
        assert_eq!(*replaced.arg::<&str>(1).unwrap(), "keep");
        assert_eq!(*replaced.arg::<i64>(2).unwrap(), 30);
    }

    #[test]
    fn test_replace_all_keeps_keywords() {
        let args = Args::new().with(1_i64).with_keyword("axis", 0_usize);
        let replaced = replace_all()(&args, vec![Value::new(2.0_f64)]).unwrap();
        assert_eq!(*replaced.arg::<f64>(0).unwrap(), 2.0);
        assert_eq!(*replaced.kwarg::<usize>("axis").unwrap(), 0);
    }

    #[test]
    fn test_keyword_is_optional() {
        let with = Args::new().with_keyword("dtype", "f64");
        let without = Args::new();
        assert_eq!(keyword("dtype", ARRAY)(&with).unwrap().len(), 1);
        assert!(keyword("dtype", ARRAY)(&without).unwrap().is_empty());
    }
}
