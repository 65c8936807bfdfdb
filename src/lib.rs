//! # ember-tui
//!
//! Hook-based component rendering engine for terminal UIs.
//!
//! Application code describes a UI as a tree of virtual nodes;
//! component functions keep per-instance state through hooks addressed
//! by call order. The engine materializes node trees into a host UI
//! tree behind a trait boundary and re-renders a root whenever one of
//! its state setters fires.
//!
//! ## Architecture
//!
//! ```text
//! create_element → VNode tree → render → materialize → Host tree
//!                      ↑                                   │
//!                      └── flush ←─ queue ←─ SetState ←────┘ (events)
//! ```
//!
//! The re-render model is deliberately naive: the subtree under a root
//! is cleared and rebuilt on every pass. There is no tree diff and no
//! key matching - hook state survives because it lives in the runtime's
//! registry, keyed by root, not in the host tree.
//!
//! ## Modules
//!
//! - [`types`] - prop values, events, error kinds
//! - [`vnode`] - the virtual node model and `create_element`
//! - [`engine`] - the runtime: render, hooks, scheduler
//! - [`host`] - the host boundary plus memory and terminal hosts
//! - [`pipeline`] - mounting an app onto the terminal
//! - [`primitives`] - `box`/`text`/`button` node constructors
//! - [`state`] - the global pub/sub store

pub mod engine;
pub mod host;
pub mod pipeline;
pub mod primitives;
pub(crate) mod renderer;
pub mod state;
pub mod types;
pub mod vnode;

// Re-export commonly used items

pub use types::{Event, EventHandler, HostError, RenderError, Value, handler};

pub use vnode::{
    Child, Children, ComponentFn, ComponentNode, ElementNode, NodeType, Props, VNode, component,
    create_element,
};

pub use engine::{CleanupFn, Deps, Runtime, Scope, SetState};

pub use host::{
    Host, InputOutcome, MemoryHost, NodeId, RenderMode, TerminalHost, TerminalOptions,
};

pub use pipeline::{MountHandle, mount};

pub use primitives::{box_primitive, button, fragment, text};

pub use state::{get_state, reset_store, set_state, snapshot, subscribe, unsubscribe};
