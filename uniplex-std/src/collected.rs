//! Link-time backend collection via `inventory`.
//!
//! Crates providing backends submit a constructor with [`submit_backend!`];
//! the application registers everything that was linked in with a single
//! [`register_collected`] call at startup.
//!
//! ```rust,ignore
//! fn numpy_like() -> BackendRef {
//!     Arc::new(NumpyLike::default())
//! }
//!
//! uniplex_std::submit_backend!(numpy_like, "numpy-like");
//!
//! fn main() {
//!     uniplex_std::collected::register_collected();
//! }
//! ```
//!
//! [`submit_backend!`]: crate::submit_backend

use std::sync::Arc;
use uniplex_core::{BackendRef, Registry};

/// A backend constructor collected via `inventory`.
pub struct CollectedBackend {
    /// Builds the backend instance.
    pub ctor: fn() -> BackendRef,
    /// Name for debugging.
    pub name: &'static str,
}

impl CollectedBackend {
    /// Create a new collected backend entry.
    pub const fn new(ctor: fn() -> BackendRef, name: &'static str) -> Self {
        Self { ctor, name }
    }
}

inventory::collect!(CollectedBackend);

/// Submit a backend constructor for collection.
///
/// The constructor is a `fn() -> BackendRef`; it runs once per
/// [`register_collected`](crate::collected::register_collected) call.
#[macro_export]
macro_rules! submit_backend {
    ($ctor:path, $name:expr) => {
        $crate::inventory::submit! {
            $crate::collected::CollectedBackend::new($ctor, $name)
        }
    };
}

/// Names of every collected backend, sorted.
pub fn collected_names() -> Vec<&'static str> {
    let mut names: Vec<_> = inventory::iter::<CollectedBackend>
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    names.sort_unstable();
    names
}

/// Register every collected backend in the process-wide registry.
///
/// Entries are registered sorted by name, so the order does not depend on
/// link order. Returns the number of backends newly registered.
pub fn register_collected() -> usize {
    register_collected_in(Registry::global())
}

/// Register every collected backend in `registry`.
pub fn register_collected_in(registry: &Arc<Registry>) -> usize {
    let mut entries: Vec<&CollectedBackend> =
        inventory::iter::<CollectedBackend>.into_iter().collect();
    entries.sort_by_key(|entry| entry.name);

    let mut added = 0;
    for entry in entries {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!(backend = entry.name, "registering collected backend");
        }
        if registry.register_backend((entry.ctor)()) {
            added += 1;
        }
    }
    added
}
