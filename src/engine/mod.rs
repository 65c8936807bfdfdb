//! Render engine - runtime context, render entry point, scheduler.
//!
//! A [`Runtime`] owns one host plus the registry of render roots. It
//! is the explicit context object for everything the engine keeps
//! across renders: hook slot caches, the last node/props per root, and
//! the queue of scheduled re-renders.
//!
//! # Re-render model
//!
//! The subtree under a root is discarded and rebuilt on every render
//! pass - there is no tree diff and no key matching. Hook state
//! survives because it lives in the registry keyed by root, not in the
//! host tree. Setters never render synchronously; they enqueue a pass
//! that runs at the next [`Runtime::flush`].

pub mod hooks;
pub(crate) mod registry;

pub use hooks::{Deps, Scope, SetState};
pub use registry::CleanupFn;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::host::{Host, NodeId};
use crate::renderer::materialize;
use crate::types::RenderError;
use crate::vnode::{Props, VNode};
use registry::{Registry, RootEntry, Slot};

// =============================================================================
// Runtime
// =============================================================================

/// Whether two successive root nodes belong to the same render
/// lineage. Component roots compare by function identity; everything
/// else shares the root's anonymous lineage.
fn same_lineage(prev: &VNode, next: &VNode) -> bool {
    match (prev, next) {
        // Fresh entry: `component` still holds its initial placeholder.
        (VNode::Empty, _) => true,
        (VNode::Component(a), VNode::Component(b)) => std::rc::Rc::ptr_eq(&a.func, &b.func),
        (VNode::Component(_), _) | (_, VNode::Component(_)) => false,
        _ => true,
    }
}

/// The engine context: one host, many independent render roots.
pub struct Runtime<H: Host> {
    registry: Rc<RefCell<Registry>>,
    host: H,
}

impl<H: Host> Runtime<H> {
    pub fn new(host: H) -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
            host,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Render `node` into the host container `root`.
    ///
    /// Records `node`/`props` for later state-triggered re-renders,
    /// resolves a component node by invoking it with a fresh [`Scope`],
    /// then clears the container and materializes the output - the full
    /// subtree is torn down and rebuilt every time.
    ///
    /// An empty `node` is an idempotent no-op. An empty *output* leaves
    /// the container's current children in place.
    pub fn render(&self, node: &VNode, props: &Props, root: NodeId) -> Result<(), RenderError> {
        if node.is_empty() {
            return Ok(());
        }
        trace!(root = ?root, "render pass");

        let stale_cleanups: Vec<CleanupFn> = {
            let mut registry = self.registry.borrow_mut();
            let entry = registry.roots.entry(root).or_insert_with(RootEntry::new);
            let mut cleanups = Vec::new();
            if !same_lineage(&entry.component, node) {
                // A different component took over this root: the slot
                // cache belongs to the old lineage.
                debug!(root = ?root, "root lineage replaced, hook cache reset");
                for slot in entry.cache.drain(..) {
                    if let Slot::Effect {
                        cleanup: Some(cleanup),
                        ..
                    } = slot
                    {
                        cleanups.push(cleanup);
                    }
                }
                entry.expected_slots = None;
            }
            entry.component = node.clone();
            entry.props = props.clone();
            cleanups
        };
        for cleanup in stale_cleanups {
            cleanup();
        }

        // Fresh scope per top-level pass: slot addressing starts at
        // zero for this root. Nested foreign `render` calls build their
        // own scopes, so no counter save/restore is needed.
        let mut scope = Scope::new(self.registry.clone(), root);

        let output = match node {
            VNode::Component(comp) => {
                let func = comp.func.clone();
                func(&mut scope, &comp.props, &comp.children)
            }
            other => other.clone(),
        };

        // A violation in the top-level invocation aborts before the
        // host is touched.
        if let Some(err) = scope.take_violation() {
            return Err(err);
        }

        if !output.is_empty() {
            self.host.clear_children(root);
            materialize(&self.host, &mut scope, &output, root)?;
        }

        if let Some(err) = scope.take_violation() {
            return Err(err);
        }

        // Slot-count contract, checked after materialization so hooks
        // in nested components are included.
        let used = scope.slots_used();
        let mut registry = self.registry.borrow_mut();
        if let Some(entry) = registry.roots.get_mut(&root) {
            match entry.expected_slots {
                Some(expected) if expected != used => {
                    return Err(RenderError::HookCount { expected, used });
                }
                _ => entry.expected_slots = Some(used),
            }
        }
        Ok(())
    }

    /// Drain the render queue, re-rendering each scheduled root with
    /// its recorded node and props.
    ///
    /// This is the defined flush point for deferred re-renders: call it
    /// after dispatching host events. Roots evicted after scheduling
    /// are skipped silently. Returns the number of completed passes so
    /// callers can observe that scheduled work ran.
    pub fn flush(&self) -> Result<usize, RenderError> {
        let mut completed = 0;
        loop {
            let root = self.registry.borrow_mut().queue.pop_front();
            let Some(root) = root else { break };

            let target = {
                let registry = self.registry.borrow();
                registry
                    .roots
                    .get(&root)
                    .map(|entry| (entry.component.clone(), entry.props.clone()))
            };
            let Some((node, props)) = target else { continue };

            self.render(&node, &props, root)?;
            completed += 1;
        }
        if completed > 0 {
            trace!(completed, "flush drained");
        }
        Ok(completed)
    }

    /// Number of re-renders currently scheduled.
    pub fn pending(&self) -> usize {
        self.registry.borrow().queue.len()
    }

    /// Evict a root: run its outstanding effect cleanups in slot
    /// order, drop its entry, and clear the host subtree. Setters that
    /// still address the root become silent no-ops.
    pub fn unmount(&self, root: NodeId) {
        let entry = self.registry.borrow_mut().roots.remove(&root);
        let Some(entry) = entry else { return };
        debug!(root = ?root, "unmount");

        // Cleanups run outside the registry borrow; they may call
        // setters.
        for slot in entry.cache {
            if let Slot::Effect {
                cleanup: Some(cleanup),
                ..
            } = slot
            {
                cleanup();
            }
        }
        self.host.clear_children(root);
    }
}
