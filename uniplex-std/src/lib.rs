//! # uniplex-std
//!
//! Standard building blocks for the uniplex multiple-dispatch runtime.
//!
//! This crate provides:
//! - **Extractors and replacers**: [`extract`]
//! - **Converters**: [`convert`]
//! - **Backend wrappers**: Logging, Tracing spans, Conditional
//! - **Test doubles**: [`testing`]
//! - **Link-time collection** (feature `inventory`): `collected`

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use uniplex_core;

// Modules
pub mod backends;
#[cfg(feature = "inventory")]
pub mod collected;
pub mod convert;
pub mod extract;
pub mod testing;

#[cfg(feature = "inventory")]
pub use inventory;
