//! Backend wrappers.
//!
//! Every wrapper forwards [`Backend::identity`] to the backend it wraps, so
//! skipping the inner backend also hides the wrapper.
//!
//! [`Backend::identity`]: uniplex_core::Backend::identity

pub mod conditional;
pub mod instrument;
pub mod logging;
