//! Process-wide backend registry.
//!
//! The registry is the lowest-priority layer of resolution, consulted below
//! every scoped backend. It holds:
//!
//! - **registered** backends, tried in registration order without any
//!   caller ceremony;
//! - at most one **global** backend, tried last.
//!
//! Mutations take a write lock and are visible to every thread at once.
//! Resolution only ever takes a read lock, and only long enough to clone
//! the candidate handles.

use crate::{
    backend::{Backend, BackendRef},
    scope::ScopeFlags,
};
use std::{
    fmt,
    sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// The global backend slot.
#[derive(Clone)]
pub struct GlobalBackend {
    /// The backend.
    pub backend: BackendRef,
    /// Its activation options.
    pub flags: ScopeFlags,
}

#[derive(Default)]
struct RegistryState {
    registered: Vec<BackendRef>,
    global: Option<GlobalBackend>,
}

/// Shared, lock-protected registered and global backends.
#[derive(Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

static GLOBAL_REGISTRY: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by multimethods that were not given
    /// their own.
    pub fn global() -> &'static Arc<Registry> {
        &GLOBAL_REGISTRY
    }

    // A panicking writer cannot leave the state half-updated: every mutation
    // below is a single push, assignment or retain.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `backend` to the registered list.
    ///
    /// Returns `false` if this exact backend was already registered.
    pub fn register_backend(&self, backend: BackendRef) -> bool {
        let id = backend.identity();
        let mut state = self.write();
        if state.registered.iter().any(|b| b.identity() == id) {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(backend = backend.name(), "backend registered");
        state.registered.push(backend);
        true
    }

    /// Install `backend` as the global backend, replacing any previous one.
    pub fn set_global_backend(&self, backend: BackendRef, flags: ScopeFlags) {
        #[cfg(feature = "tracing")]
        tracing::debug!(backend = backend.name(), ?flags, "global backend set");
        self.write().global = Some(GlobalBackend { backend, flags });
    }

    /// Empty the global slot, returning what was there.
    pub fn clear_global_backend(&self) -> Option<BackendRef> {
        #[cfg(feature = "tracing")]
        tracing::debug!("global backend cleared");
        self.write().global.take().map(|g| g.backend)
    }

    /// Remove backends serving `domain`: registered ones if `registered`,
    /// the global one if `globals`.
    pub fn clear_backends(&self, domain: &str, registered: bool, globals: bool) {
        let mut state = self.write();
        if registered {
            state.registered.retain(|b| !b.serves(domain));
        }
        if globals
            && state
                .global
                .as_ref()
                .is_some_and(|g| g.backend.serves(domain))
        {
            state.global = None;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(domain, registered, globals, "backends cleared");
    }

    /// Snapshot of the registered backends, in registration order.
    pub fn registered(&self) -> Vec<BackendRef> {
        self.read().registered.clone()
    }

    /// Snapshot of the global slot.
    pub fn global_backend(&self) -> Option<GlobalBackend> {
        self.read().global.clone()
    }

    /// Snapshot both layers under a single read lock.
    pub(crate) fn snapshot(&self) -> (Vec<BackendRef>, Option<GlobalBackend>) {
        let state = self.read();
        (state.registered.clone(), state.global.clone())
    }

    /// Returns `true` if `backend` is registered.
    pub fn is_registered(&self, backend: &dyn Backend) -> bool {
        let id = backend.identity();
        self.read().registered.iter().any(|b| b.identity() == id)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Registry")
            .field(
                "registered",
                &state.registered.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field(
                "global",
                &state.global.as_ref().map(|g| (g.backend.name(), g.flags)),
            )
            .finish()
    }
}

/// Register `backend` in the process-wide registry.
pub fn register_backend(backend: BackendRef) -> bool {
    Registry::global().register_backend(backend)
}

/// Set the process-wide global backend.
pub fn set_global_backend(backend: BackendRef, flags: ScopeFlags) {
    Registry::global().set_global_backend(backend, flags)
}

/// Clear the process-wide global backend.
pub fn clear_global_backend() -> Option<BackendRef> {
    Registry::global().clear_global_backend()
}

/// Remove backends serving `domain` from the process-wide registry.
pub fn clear_backends(domain: &str, registered: bool, globals: bool) {
    Registry::global().clear_backends(domain, registered, globals)
}
