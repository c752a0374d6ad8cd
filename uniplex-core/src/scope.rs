//! # Scoped Backend Stack
//!
//! Every thread owns a stack of frames. [`set_backend`] pushes a backend
//! frame, [`skip_backend`] pushes a skip frame, and the returned
//! [`ScopeGuard`] pops it again when dropped, whether the scope ends by
//! returning, by `?`, or by unwinding.
//!
//! Frames never cross threads. To run work on another thread with the
//! caller's configuration, carry a [`State`] snapshot over and install it
//! with [`set_state`].
//!
//! ```rust,ignore
//! let _numeric = set_backend(gpu_backend.clone());
//! {
//!     let _strict = set_backend_with(exact_backend.clone(), ScopeFlags::ONLY);
//!     add.call(args![1_i64, 2_i64])?; // exact_backend, nothing else
//! }
//! add.call(args![1_i64, 2_i64])?; // gpu_backend first again
//! ```

use crate::backend::{Backend, BackendId, BackendRef};
use bitflags::bitflags;
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

bitflags! {
    /// Activation options for a scoped or global backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScopeFlags: u8 {
        /// Ask the backend's converter to coerce coercible arguments.
        const COERCE = 1 << 0;
        /// If this backend declines, stop: no lower candidate and no
        /// default implementation is tried.
        const ONLY = 1 << 1;
    }
}

impl ScopeFlags {
    /// Build flags from the two boolean options.
    pub fn from_options(coerce: bool, only: bool) -> Self {
        let mut flags = ScopeFlags::empty();
        flags.set(ScopeFlags::COERCE, coerce);
        flags.set(ScopeFlags::ONLY, only);
        flags
    }

    /// Whether coercion is requested.
    pub fn coerce(self) -> bool {
        self.contains(ScopeFlags::COERCE)
    }

    /// Whether a decline ends the search.
    pub fn only(self) -> bool {
        self.contains(ScopeFlags::ONLY)
    }
}

#[derive(Clone)]
enum Frame {
    Use {
        id: u64,
        backend: BackendRef,
        flags: ScopeFlags,
    },
    Skip {
        id: u64,
        backend: BackendId,
    },
}

impl Frame {
    fn id(&self) -> u64 {
        match self {
            Frame::Use { id, .. } | Frame::Skip { id, .. } => *id,
        }
    }
}

/// A snapshot of one thread's backend stack.
#[derive(Clone, Default)]
pub struct State {
    frames: Vec<Frame>,
}

impl State {
    /// Number of active frames, skip frames included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The active backends with their flags, innermost first.
    pub fn backends(&self) -> impl Iterator<Item = (&BackendRef, ScopeFlags)> {
        self.frames.iter().rev().filter_map(|frame| match frame {
            Frame::Use { backend, flags, .. } => Some((backend, *flags)),
            Frame::Skip { .. } => None,
        })
    }

    /// The identities of all skipped backends.
    pub fn skipped(&self) -> HashSet<BackendId> {
        self.frames
            .iter()
            .filter_map(|frame| match frame {
                Frame::Skip { backend, .. } => Some(*backend),
                Frame::Use { .. } => None,
            })
            .collect()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for frame in &self.frames {
            match frame {
                Frame::Use { backend, flags, .. } => {
                    list.entry(&format_args!("use {} {:?}", backend.name(), flags));
                }
                Frame::Skip { backend, .. } => {
                    list.entry(&format_args!("skip {backend:?}"));
                }
            }
        }
        list.finish()
    }
}

// Process-wide, so frames carried to another thread in a `State` never share
// an id with frames pushed there.
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static STATE: RefCell<State> = const { RefCell::new(State { frames: Vec::new() }) };
    // Number of live `StateGuard`s, and the frames released while at least
    // one of them holds a swapped-out stack.
    static STATE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static RELEASED: RefCell<HashSet<u64>> = RefCell::new(HashSet::new());
}

fn next_frame_id() -> u64 {
    NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)
}

fn push(frame: Frame) -> ScopeGuard {
    let id = frame.id();
    STATE.with(|state| state.borrow_mut().frames.push(frame));
    ScopeGuard {
        id,
        _not_send: PhantomData,
    }
}

/// Releases one frame of the current thread's backend stack on drop.
#[must_use = "the frame is released as soon as the guard is dropped"]
pub struct ScopeGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // The thread-locals may already be gone during thread teardown.
        let removed = STATE
            .try_with(|state| {
                let mut state = state.borrow_mut();
                let pos = state.frames.iter().rposition(|f| f.id() == self.id)?;
                Some(state.frames.remove(pos))
            })
            .ok()
            .flatten();

        // A swapped-out stack may hold a copy of this frame; keep it from
        // coming back when that stack is restored.
        if STATE_DEPTH.try_with(Cell::get).unwrap_or(0) > 0 {
            let _ = RELEASED.try_with(|released| released.borrow_mut().insert(self.id));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(frame = self.id, found = removed.is_some(), "frame released");

        // The frame may hold the last handle to its backend, whose `Drop`
        // is free to use the stack again.
        drop(removed);
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}

/// Make `backend` the highest-priority candidate until the guard drops.
pub fn set_backend(backend: BackendRef) -> ScopeGuard {
    set_backend_with(backend, ScopeFlags::empty())
}

/// Like [`set_backend`], with coercion and exclusivity options.
pub fn set_backend_with(backend: BackendRef, flags: ScopeFlags) -> ScopeGuard {
    #[cfg(feature = "tracing")]
    tracing::trace!(backend = backend.name(), ?flags, "backend scope entered");
    push(Frame::Use {
        id: next_frame_id(),
        backend,
        flags,
    })
}

/// Hide `backend` from every layer of resolution until the guard drops.
///
/// A backend calls this on itself before re-entering a multimethod to
/// delegate to the next candidate:
///
/// ```rust,ignore
/// fn invoke(&self, method: &Multimethod, args: Args) -> InvokeResult {
///     let _skip = skip_backend(self);
///     let inner = method.call(args)?;
///     Ok(Outcome::Success(self.wrap(inner)))
/// }
/// ```
pub fn skip_backend(backend: &dyn Backend) -> ScopeGuard {
    #[cfg(feature = "tracing")]
    tracing::trace!(backend = backend.name(), "skip scope entered");
    push(Frame::Skip {
        id: next_frame_id(),
        backend: backend.identity(),
    })
}

/// Snapshot the current thread's backend stack.
pub fn get_state() -> State {
    STATE.with(|state| state.borrow().clone())
}

/// Replace the current thread's backend stack with `state` until the guard
/// drops, then restore the previous stack.
///
/// Frames whose guards are dropped in the meantime are not restored.
pub fn set_state(state: &State) -> StateGuard {
    let previous = STATE.with(|current| current.replace(state.clone()));
    STATE_DEPTH.with(|depth| depth.set(depth.get() + 1));
    StateGuard {
        previous: Some(previous),
        _not_send: PhantomData,
    }
}

/// Run with an empty backend stack until the guard drops.
pub fn reset_state() -> StateGuard {
    set_state(&State::default())
}

/// Restores a previous backend stack on drop.
#[must_use = "the previous state is restored as soon as the guard is dropped"]
pub struct StateGuard {
    previous: Option<State>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        let Some(mut previous) = self.previous.take() else {
            return;
        };
        let depth = STATE_DEPTH
            .try_with(|depth| {
                let remaining = depth.get().saturating_sub(1);
                depth.set(remaining);
                remaining
            })
            .unwrap_or(0);

        let mut released_frames = Vec::new();
        let _ = RELEASED.try_with(|released| {
            let mut released = released.borrow_mut();
            if !released.is_empty() {
                let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut previous.frames)
                    .into_iter()
                    .partition(|frame| released.contains(&frame.id()));
                previous.frames = kept;
                released_frames = gone;
            }
            if depth == 0 {
                released.clear();
            }
        });

        // Frames leaving the stack are dropped only after it is swapped back,
        // with nothing borrowed.
        let replaced = STATE.try_with(|state| state.replace(previous));
        drop(replaced);
        drop(released_frames);
    }
}

impl fmt::Debug for StateGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::FnBackend, domain::DomainSet, outcome::Outcome};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    };

    fn backend(name: &str) -> BackendRef {
        Arc::new(FnBackend::new("scope-tests", |_, _| Ok(Outcome::Unimplemented)).named(name))
    }

    fn active_names() -> Vec<String> {
        get_state()
            .backends()
            .map(|(b, _)| b.name().to_string())
            .collect()
    }

    #[test]
    fn test_nested_scopes_are_innermost_first() {
        let _outer = set_backend(backend("outer"));
        {
            let _inner = set_backend_with(backend("inner"), ScopeFlags::ONLY);
            assert_eq!(active_names(), vec!["inner", "outer"]);
            let state = get_state();
            let (_, flags) = state.backends().next().unwrap();
            assert!(flags.only());
            assert!(!flags.coerce());
        }
        assert_eq!(active_names(), vec!["outer"]);
    }

    #[test]
    fn test_guard_released_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _guard = set_backend(backend("doomed"));
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(get_state().is_empty());
    }

    #[test]
    fn test_out_of_order_drop_removes_own_frame() {
        let first = set_backend(backend("first"));
        let second = set_backend(backend("second"));
        drop(first);
        assert_eq!(active_names(), vec!["second"]);
        drop(second);
        assert!(get_state().is_empty());
    }

    #[test]
    fn test_skip_frames_are_not_backends() {
        let b = backend("skipped");
        let _skip = skip_backend(&*b);
        let state = get_state();
        assert_eq!(state.len(), 1);
        assert_eq!(state.backends().count(), 0);
        assert!(state.skipped().contains(&b.identity()));
    }

    #[test]
    fn test_set_state_restores_previous() {
        let _outer = set_backend(backend("outer"));
        let snapshot = get_state();
        {
            let _reset = reset_state();
            assert!(get_state().is_empty());
            {
                let _restored = set_state(&snapshot);
                assert_eq!(active_names(), vec!["outer"]);
            }
            assert!(get_state().is_empty());
        }
        assert_eq!(active_names(), vec!["outer"]);
    }

    #[test]
    fn test_guard_dropped_under_reset_state_stays_released() {
        let guard = set_backend(backend("released"));
        let reset = reset_state();
        drop(guard);
        drop(reset);
        assert!(get_state().is_empty(), "frame survived its guard: {:?}", get_state());
    }

    #[test]
    fn test_guard_dropped_under_copied_state_stays_released() {
        let guard = set_backend(backend("copied"));
        let copy = set_state(&get_state());
        drop(guard);
        assert!(get_state().is_empty());
        drop(copy);
        assert!(get_state().is_empty());
    }

    #[test]
    fn test_carried_state_keeps_caller_frames_apart() {
        let _caller = set_backend(backend("caller"));
        let snapshot = get_state();

        let (inside, after) = std::thread::spawn(move || {
            let own = set_backend(backend("own"));
            let carried = set_state(&snapshot);
            drop(own);
            let inside = active_names();
            drop(carried);
            (inside, active_names())
        })
        .join()
        .unwrap();

        assert_eq!(inside, vec!["caller"]);
        assert!(after.is_empty());
        assert_eq!(active_names(), vec!["caller"]);
    }

    struct InspectsStackOnDrop {
        domains: DomainSet,
        depth_seen: Arc<AtomicUsize>,
    }

    impl Backend for InspectsStackOnDrop {
        fn domains(&self) -> &DomainSet {
            &self.domains
        }

        fn invoke(&self, _: &crate::Multimethod, _: crate::Args) -> crate::InvokeResult {
            Ok(Outcome::Unimplemented)
        }
    }

    impl Drop for InspectsStackOnDrop {
        fn drop(&mut self) {
            self.depth_seen
                .store(get_state().len() + 1, AtomicOrdering::SeqCst);
        }
    }

    fn inspecting(depth_seen: &Arc<AtomicUsize>) -> BackendRef {
        Arc::new(InspectsStackOnDrop {
            domains: "scope-tests".into(),
            depth_seen: depth_seen.clone(),
        })
    }

    #[test]
    fn test_last_handle_dropped_outside_stack_borrow() {
        let depth_seen = Arc::new(AtomicUsize::new(0));
        let guard = set_backend(inspecting(&depth_seen));
        drop(guard);
        assert_eq!(depth_seen.load(AtomicOrdering::SeqCst), 1);

        let depth_seen = Arc::new(AtomicUsize::new(0));
        let guard = set_backend(inspecting(&depth_seen));
        let reset = reset_state();
        drop(guard);
        assert_eq!(depth_seen.load(AtomicOrdering::SeqCst), 0);
        drop(reset);
        assert_eq!(depth_seen.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_scopes_are_thread_local() {
        let _guard = set_backend(backend("main"));
        let seen = std::thread::spawn(|| get_state().len()).join().unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_flags_from_options() {
        assert_eq!(ScopeFlags::from_options(false, false), ScopeFlags::empty());
        assert_eq!(
            ScopeFlags::from_options(true, true),
            ScopeFlags::COERCE | ScopeFlags::ONLY
        );
    }
}
