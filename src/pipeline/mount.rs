//! Mount API - application lifecycle and event loop.
//!
//! `mount` renders a node tree into a fresh terminal host and takes
//! over the terminal. The returned [`MountHandle`] drives the loop:
//! poll an input event, translate it through the host, flush any
//! re-renders the handlers scheduled, redraw.
//!
//! # Example
//!
//! ```ignore
//! use ember_tui::pipeline::mount;
//! use ember_tui::host::TerminalOptions;
//!
//! let handle = mount(app_node, Props::new(), TerminalOptions::default())?;
//!
//! // Option 1: blocking event loop.
//! handle.run()?;
//!
//! // Option 2: tick manually in your own loop.
//! while handle.tick(Duration::from_millis(50))? {
//!     // Your logic here
//! }
//!
//! handle.unmount();
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event;
use tracing::debug;

use crate::engine::Runtime;
use crate::host::{InputOutcome, NodeId, TerminalHost, TerminalOptions};
use crate::types::{HostError, RenderError};
use crate::vnode::{Props, VNode};

// =============================================================================
// Mount
// =============================================================================

/// Render `node` into a new terminal host and take over the terminal.
///
/// The render runs before the terminal is touched, so a failing
/// component leaves the shell untouched.
pub fn mount(
    node: VNode,
    props: Props,
    options: TerminalOptions,
) -> Result<MountHandle, RenderError> {
    let host = TerminalHost::new(options);
    let runtime = Runtime::new(host.clone());
    let root = host.root();

    runtime.render(&node, &props, root)?;
    host.enter()?;
    host.draw()?;
    debug!("mounted");

    Ok(MountHandle {
        runtime,
        host,
        root,
        running: Rc::new(Cell::new(true)),
    })
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle over a mounted application.
///
/// Dropping the handle unmounts: the root is evicted (running its
/// effect cleanups) and the terminal restored.
pub struct MountHandle {
    runtime: Runtime<TerminalHost>,
    host: TerminalHost,
    root: NodeId,
    running: Rc<Cell<bool>>,
}

impl MountHandle {
    /// Run the blocking event loop until quit.
    pub fn run(&self) -> Result<(), RenderError> {
        while self.tick(Duration::from_millis(50))? {}
        Ok(())
    }

    /// One loop iteration: poll input, flush scheduled renders, redraw
    /// if anything changed. Returns `false` once stopped.
    pub fn tick(&self, timeout: Duration) -> Result<bool, RenderError> {
        if !self.running.get() {
            return Ok(false);
        }

        let mut dirty = false;
        if event::poll(timeout).map_err(HostError::from)? {
            let input = event::read().map_err(HostError::from)?;
            match self.host.handle_input(&input) {
                InputOutcome::Quit => {
                    self.running.set(false);
                    return Ok(false);
                }
                InputOutcome::Handled => dirty = true,
                InputOutcome::Ignored => {}
            }
        }

        if self.runtime.pending() > 0 {
            self.runtime.flush()?;
            dirty = true;
        }
        if dirty {
            self.host.draw()?;
        }
        Ok(true)
    }

    /// Request a graceful stop; the current `run` loop exits on its
    /// next iteration.
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn runtime(&self) -> &Runtime<TerminalHost> {
        &self.runtime
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    /// Tear down explicitly. Equivalent to dropping the handle.
    pub fn unmount(self) {}
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.running.set(false);
        self.runtime.unmount(self.root);
        // Best effort: never panic in drop over a broken terminal.
        let _ = self.host.leave();
        debug!("unmounted");
    }
}
