//! Freeze controller: the one-way mutable → frozen lifecycle transition.
//!
//! Registration mutates a buffer of [`PendingRoute`]s; nothing is published
//! to the live registry until freeze, at which point every pending route is
//! applied in one batch. This guarantees the observable route set never
//! flickers during the mutable phase. The transition itself is guarded by
//! a `once`-primitive so it runs exactly once even under concurrent
//! callers (the first incoming request freezes the router implicitly if
//! the caller never froze it explicitly).

use crate::constraint::ConstraintSet;
use crate::handler::Handler;
use crate::pattern::Pattern;
use http::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A route captured during the mutable phase, awaiting compilation.
pub struct PendingRoute {
    pub method: Method,
    pub pattern: Pattern,
    pub handlers: Vec<Arc<dyn Handler>>,
    pub constraints: ConstraintSet,
    /// `Some(version)` routes this registration into that version's tree
    /// instead of the main tree at freeze time.
    pub version: Option<String>,
}

/// Buffers pending routes and enforces the one-way freeze transition.
///
/// Late registration, after the router has frozen, *returns*
/// [`crate::error::AlreadyFrozenError`] rather than panicking — this keeps
/// the library usable in request-handling contexts that must not unwind,
/// at the cost of requiring callers to check the result.
pub struct FreezeController {
    frozen: AtomicBool,
    pending: Mutex<Vec<PendingRoute>>,
}

impl Default for FreezeController {
    fn default() -> Self {
        Self {
            frozen: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }
}

impl FreezeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Buffer a route for later compilation, returning its index so a
    /// route handle can later mutate its constraint set in place. Fails if
    /// the router has already frozen.
    pub fn buffer(
        &self,
        route: PendingRoute,
    ) -> Result<usize, crate::error::AlreadyFrozenError> {
        if self.is_frozen() {
            return Err(crate::error::AlreadyFrozenError);
        }
        // Lock after the fast-path check; a freeze racing in here is caught
        // by the atomic swap below since `take_pending` is only ever
        // called once, from inside `freeze_once`.
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.push(route);
        Ok(pending.len() - 1)
    }

    /// Mutate the pending record at `index` in place (used by the
    /// route-builder's `Where*` constraint family, which attaches
    /// constraints after initial registration but before freeze).
    pub fn edit_pending(&self, index: usize, f: impl FnOnce(&mut PendingRoute)) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(route) = pending.get_mut(index) {
            f(route);
        }
    }

    /// Perform the one-way transition exactly once. `build` receives every
    /// buffered pending route and is responsible for compiling the registry
    /// and the compiled lookup layer; it runs under the `once` guard so
    /// concurrent callers never race the build itself.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// router was already frozen (by this or a prior call).
    pub fn freeze_once(&self, build: impl FnOnce(Vec<PendingRoute>)) -> bool {
        if self.frozen.swap(true, Ordering::AcqRel) {
            return false;
        }
        let pending = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
        build(pending);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlreadyFrozenError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn route(path: &str) -> PendingRoute {
        PendingRoute {
            method: Method::GET,
            pattern: Pattern::parse(path).unwrap(),
            handlers: Vec::new(),
            constraints: ConstraintSet::new(),
            version: None,
        }
    }

    #[test]
    fn buffering_after_freeze_fails() {
        let controller = FreezeController::new();
        controller.freeze_once(|_pending| {});
        let err = controller.buffer(route("/a")).unwrap_err();
        assert_eq!(err, AlreadyFrozenError);
    }

    #[test]
    fn freeze_once_runs_build_exactly_once() {
        let controller = FreezeController::new();
        controller.buffer(route("/a")).unwrap();
        controller.buffer(route("/b")).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(0usize));
        let calls2 = calls.clone();
        let seen2 = seen.clone();
        let first = controller.freeze_once(move |pending| {
            calls2.fetch_add(1, Ordering::SeqCst);
            *seen2.lock().unwrap() = pending.len();
        });
        let second = controller.freeze_once(|_pending| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert!(first);
        assert!(!second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn is_frozen_reflects_transition_state() {
        let controller = FreezeController::new();
        assert!(!controller.is_frozen());
        controller.freeze_once(|_| {});
        assert!(controller.is_frozen());
    }
}
