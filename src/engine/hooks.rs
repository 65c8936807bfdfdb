//! Hooks - component-local state addressed by call order.
//!
//! A [`Scope`] is the explicit invocation context for one render pass
//! of one root. Component functions receive it by `&mut` and call
//! hooks through it; each call takes the next ordinal slot in the
//! root's cache. Components must call hooks in the same order and
//! count on every invocation - violations are recorded on the scope
//! and surfaced as errors by `render` instead of silently corrupting
//! slot state.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::registry::{CleanupFn, Registry, Slot, store_slot};
use crate::host::NodeId;
use crate::types::{RenderError, Value};

// =============================================================================
// Effect Dependencies
// =============================================================================

/// Dependency list of a `use_effect` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Deps {
    /// No list given: the effect re-runs on every render.
    Always,
    /// Re-run when any positional entry differs from the previous
    /// render's list (length changes count as differing).
    List(Vec<Value>),
}

impl From<Vec<Value>> for Deps {
    fn from(list: Vec<Value>) -> Self {
        Deps::List(list)
    }
}

/// Build a [`Deps`] list from values convertible to [`Value`].
///
/// `deps![]` is the run-once list; `deps![x, y]` re-runs when `x` or
/// `y` changes.
#[macro_export]
macro_rules! deps {
    () => { $crate::engine::Deps::List(::std::vec::Vec::new()) };
    ($($dep:expr),+ $(,)?) => {
        $crate::engine::Deps::List(::std::vec![$($crate::types::Value::from($dep)),+])
    };
}

// =============================================================================
// Scope
// =============================================================================

/// Invocation context threaded through component calls.
///
/// Holds the root being rendered and the running slot cursor. Nested
/// component invocations under the same root share this scope, so
/// their hooks continue the same ordinal sequence; a fresh top-level
/// `render` builds a fresh scope starting at slot zero.
pub struct Scope {
    registry: Rc<RefCell<Registry>>,
    root: NodeId,
    cursor: usize,
    violation: Option<RenderError>,
}

impl Scope {
    pub(crate) fn new(registry: Rc<RefCell<Registry>>, root: NodeId) -> Self {
        Self {
            registry,
            root,
            cursor: 0,
            violation: None,
        }
    }

    /// The root this scope renders into.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn slots_used(&self) -> usize {
        self.cursor
    }

    pub(crate) fn take_violation(&mut self) -> Option<RenderError> {
        self.violation.take()
    }

    fn next_slot(&mut self) -> usize {
        let slot = self.cursor;
        self.cursor += 1;
        slot
    }

    /// Record the first contract violation seen this pass.
    fn flag(&mut self, err: RenderError) {
        if self.violation.is_none() {
            self.violation = Some(err);
        }
    }

    // -------------------------------------------------------------------------
    // use_state
    // -------------------------------------------------------------------------

    /// Allocate or read a state slot holding `initial`.
    ///
    /// The first render stores the value; later renders return the
    /// stored one. The setter replaces the stored value and schedules
    /// a deferred re-render of this root.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state), computing the initial value
    /// lazily on first render only.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, SetState<T>) {
        let slot = self.next_slot();

        let mut mismatch = None;
        let existing: Option<T> = {
            let registry = self.registry.borrow();
            match registry.roots.get(&self.root).and_then(|e| e.cache.get(slot)) {
                Some(Slot::State(value)) => match value.downcast_ref::<T>() {
                    Some(value) => Some(value.clone()),
                    None => {
                        mismatch = Some(RenderError::HookType { slot });
                        None
                    }
                },
                Some(Slot::Effect { .. }) => {
                    mismatch = Some(RenderError::HookKind { slot });
                    None
                }
                None => None,
            }
        };
        if let Some(err) = mismatch {
            self.flag(err);
        }

        let value = match existing {
            Some(value) => value,
            None => {
                // First use of this slot (or a re-initialization after a
                // flagged mismatch). The initializer runs with no borrow
                // held.
                let value = init();
                let mut registry = self.registry.borrow_mut();
                if let Some(entry) = registry.roots.get_mut(&self.root) {
                    store_slot(&mut entry.cache, slot, Slot::State(Rc::new(value.clone())));
                }
                value
            }
        };

        let setter = SetState {
            registry: Rc::downgrade(&self.registry),
            root: self.root,
            slot,
            _marker: PhantomData,
        };
        (value, setter)
    }

    // -------------------------------------------------------------------------
    // use_effect
    // -------------------------------------------------------------------------

    /// Run a side effect when its dependencies change.
    ///
    /// The first render always runs the effect. Later renders run it
    /// when `deps` is [`Deps::Always`], when no prior list exists, or
    /// when any positional entry differs. Cleanup-then-effect runs
    /// synchronously, inline, in hook-declaration order.
    pub fn use_effect(&mut self, deps: impl Into<Deps>, effect: impl FnOnce()) {
        self.effect_slot(deps.into(), move || {
            effect();
            None
        });
    }

    /// Like [`use_effect`](Self::use_effect), storing the returned
    /// cleanup and invoking it before the next run (or on unmount).
    pub fn use_effect_cleanup(
        &mut self,
        deps: impl Into<Deps>,
        effect: impl FnOnce() -> CleanupFn,
    ) {
        self.effect_slot(deps.into(), move || Some(effect()));
    }

    fn effect_slot(&mut self, deps: Deps, effect: impl FnOnce() -> Option<CleanupFn>) {
        let slot = self.next_slot();

        enum Decision {
            New,
            Changed,
            Unchanged,
            WrongKind,
        }

        let mut mismatch = None;
        // Decide whether the effect runs, taking the old cleanup out if
        // so. `None` means the dependencies are unchanged.
        let run: Option<Option<CleanupFn>> = {
            let mut registry = self.registry.borrow_mut();
            let Some(entry) = registry.roots.get_mut(&self.root) else {
                return;
            };

            let decision = match entry.cache.get(slot) {
                // First invocation for this slot: unconditionally
                // changed.
                None => Decision::New,
                Some(Slot::Effect { deps: prev, .. }) => {
                    let changed = match (&deps, prev.as_ref()) {
                        (Deps::Always, _) => true,
                        (_, None) => true,
                        (Deps::List(now), Some(before)) => now != before,
                    };
                    if changed {
                        Decision::Changed
                    } else {
                        Decision::Unchanged
                    }
                }
                Some(Slot::State(_)) => Decision::WrongKind,
            };

            let placeholder = || Slot::Effect {
                deps: None,
                cleanup: None,
            };
            match decision {
                Decision::New => {
                    // Placeholder keeps the cursor aligned while the
                    // effect body runs.
                    store_slot(&mut entry.cache, slot, placeholder());
                    Some(None)
                }
                Decision::Changed => match &mut entry.cache[slot] {
                    Slot::Effect { cleanup, .. } => Some(cleanup.take()),
                    Slot::State(_) => Some(None),
                },
                Decision::Unchanged => None,
                Decision::WrongKind => {
                    mismatch = Some(RenderError::HookKind { slot });
                    entry.cache[slot] = placeholder();
                    Some(None)
                }
            }
        };
        if let Some(err) = mismatch {
            self.flag(err);
        }

        let Some(old_cleanup) = run else {
            return;
        };

        // Cleanup first, then the effect, both outside any registry
        // borrow - either may call setters.
        if let Some(cleanup) = old_cleanup {
            cleanup();
        }
        let next_cleanup = effect();

        let stored = match deps {
            Deps::Always => None,
            Deps::List(list) => Some(list),
        };
        let mut registry = self.registry.borrow_mut();
        if let Some(entry) = registry.roots.get_mut(&self.root) {
            store_slot(
                &mut entry.cache,
                slot,
                Slot::Effect {
                    deps: stored,
                    cleanup: next_cleanup,
                },
            );
        }
    }
}

// =============================================================================
// SetState
// =============================================================================

/// Setter half of a `use_state` pair.
///
/// Holds only a weak registry reference plus the slot address, so it
/// can be cloned into event handlers freely. Once the runtime is gone
/// or the root evicted, every call is a silent no-op.
pub struct SetState<T> {
    registry: Weak<RefCell<Registry>>,
    root: NodeId,
    slot: usize,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            root: self.root,
            slot: self.slot,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> SetState<T> {
    /// Replace the stored value, then schedule a re-render of the
    /// root. The render itself is deferred to the next `flush`; code
    /// after this call still observes its own pre-update copy.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Replace the stored value with `f(current)`, then schedule a
    /// re-render. The updater sees the value as already modified by
    /// earlier setter calls this tick.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        // The updater runs with no borrow held; it may call other
        // setters.
        let current: T = {
            let registry = registry.borrow();
            let Some(entry) = registry.roots.get(&self.root) else {
                return;
            };
            let Some(Slot::State(value)) = entry.cache.get(self.slot) else {
                return;
            };
            let Some(value) = value.downcast_ref::<T>() else {
                return;
            };
            value.clone()
        };
        let next = f(&current);

        let mut registry = registry.borrow_mut();
        {
            let Some(entry) = registry.roots.get_mut(&self.root) else {
                return;
            };
            let Some(slot) = entry.cache.get_mut(self.slot) else {
                return;
            };
            *slot = Slot::State(Rc::new(next));
        }
        registry.schedule(self.root);
        trace!(root = ?self.root, slot = self.slot, "state updated, re-render scheduled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::RootEntry;

    fn registry_with_root(root: NodeId) -> Rc<RefCell<Registry>> {
        let registry = Rc::new(RefCell::new(Registry::new()));
        registry.borrow_mut().roots.insert(root, RootEntry::new());
        registry
    }

    #[test]
    fn test_state_persists_across_scopes() {
        let root = NodeId(1);
        let registry = registry_with_root(root);

        let mut scope = Scope::new(registry.clone(), root);
        let (value, set) = scope.use_state(0i64);
        assert_eq!(value, 0);

        set.set(5);
        assert_eq!(registry.borrow().queue.len(), 1);

        let mut scope = Scope::new(registry.clone(), root);
        let (value, _) = scope.use_state(0i64);
        assert_eq!(value, 5);
    }

    #[test]
    fn test_update_sees_current_value() {
        let root = NodeId(1);
        let registry = registry_with_root(root);

        let mut scope = Scope::new(registry.clone(), root);
        let (_, set) = scope.use_state(1i64);

        set.update(|v| v + 1);
        set.update(|v| v * 10);

        let mut scope = Scope::new(registry.clone(), root);
        let (value, _) = scope.use_state(1i64);
        assert_eq!(value, 20);
        // Two independent re-renders scheduled, no coalescing.
        assert_eq!(registry.borrow().queue.len(), 2);
    }

    #[test]
    fn test_lazy_initializer_runs_once() {
        let root = NodeId(1);
        let registry = registry_with_root(root);
        let runs = Rc::new(RefCell::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            let mut scope = Scope::new(registry.clone(), root);
            let (value, _) = scope.use_state_with(move || {
                *runs.borrow_mut() += 1;
                42i64
            });
            assert_eq!(value, 42);
        }
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn test_setter_after_eviction_is_noop() {
        let root = NodeId(1);
        let registry = registry_with_root(root);

        let mut scope = Scope::new(registry.clone(), root);
        let (_, set) = scope.use_state(0i64);

        registry.borrow_mut().roots.remove(&root);
        set.set(9);
        assert_eq!(registry.borrow().queue.len(), 0);
    }

    #[test]
    fn test_effect_runs_on_first_render_and_on_change() {
        let root = NodeId(1);
        let registry = registry_with_root(root);
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let pass = |dep: i64| {
            let log = log.clone();
            let mut scope = Scope::new(registry.clone(), root);
            scope.use_effect_cleanup(deps![dep], move || {
                log.borrow_mut().push("effect");
                let log = log.clone();
                Box::new(move || log.borrow_mut().push("cleanup"))
            });
        };

        pass(1);
        pass(1);
        pass(2);

        // dep = 1, 1, 2: effect twice, cleanup before the rerun.
        assert_eq!(*log.borrow(), vec!["effect", "cleanup", "effect"]);
    }

    #[test]
    fn test_effect_without_deps_runs_every_render() {
        let root = NodeId(1);
        let registry = registry_with_root(root);
        let runs = Rc::new(RefCell::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            let mut scope = Scope::new(registry.clone(), root);
            scope.use_effect(Deps::Always, move || *runs.borrow_mut() += 1);
        }
        assert_eq!(*runs.borrow(), 3);
    }

    #[test]
    fn test_effect_with_empty_deps_runs_once() {
        let root = NodeId(1);
        let registry = registry_with_root(root);
        let runs = Rc::new(RefCell::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            let mut scope = Scope::new(registry.clone(), root);
            scope.use_effect(deps![], move || *runs.borrow_mut() += 1);
        }
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn test_kind_mismatch_is_flagged() {
        let root = NodeId(1);
        let registry = registry_with_root(root);

        let mut scope = Scope::new(registry.clone(), root);
        let _ = scope.use_state(0i64);

        let mut scope = Scope::new(registry.clone(), root);
        scope.use_effect(Deps::Always, || {});
        assert!(matches!(
            scope.take_violation(),
            Some(RenderError::HookKind { slot: 0 })
        ));
    }

    #[test]
    fn test_type_mismatch_is_flagged() {
        let root = NodeId(1);
        let registry = registry_with_root(root);

        let mut scope = Scope::new(registry.clone(), root);
        let _ = scope.use_state(0i64);

        let mut scope = Scope::new(registry.clone(), root);
        let (value, _) = scope.use_state("fresh".to_string());
        assert_eq!(value, "fresh");
        assert!(matches!(
            scope.take_violation(),
            Some(RenderError::HookType { slot: 0 })
        ));
    }
}
