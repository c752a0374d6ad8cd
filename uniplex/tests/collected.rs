#![cfg(feature = "inventory")]

mod common;

use common::{add_method, text};
use uniplex::{
    BackendRef, FnBackend, Outcome, args,
    collected::{collected_names, register_collected},
    convert,
};

fn collected_ints() -> BackendRef {
    FnBackend::new("it-collected", |_, args| {
        Ok(Outcome::value(format!("collected:{}", args.len())))
    })
    .with_converter(convert::accept_type::<i64>())
    .named("collected-ints")
    .into_ref()
}

uniplex::collected::submit_backend!(collected_ints, "collected-ints");

#[test]
fn test_collected_backends_are_registered() {
    assert!(collected_names().contains(&"collected-ints"));
    assert!(register_collected() >= 1);

    let add = add_method("it-collected");
    assert_eq!(text(&add.call(args![1_i64, 2_i64]).unwrap()), "collected:2");
}
