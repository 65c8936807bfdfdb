//! Host boundary - the UI tree operations the engine consumes.
//!
//! The engine never owns a UI tree. It drives an implementation of
//! [`Host`]: create nodes, wire props and listeners, attach, and clear
//! subtrees before a rebuild. Hosts are cheap cloneable handles over
//! interior-mutable trees so event handlers, the runtime, and tests
//! can share one tree.

pub mod memory;
pub mod terminal;

pub use memory::MemoryHost;
pub use terminal::{InputOutcome, RenderMode, TerminalHost, TerminalOptions};

use crate::types::{EventHandler, HostError, Value};

/// Handle to one node in a host tree.
///
/// Ids are allocated monotonically and never reused, so a rebuilt
/// subtree is observably made of brand-new nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

/// A live UI tree the engine can materialize into.
pub trait Host {
    /// Create a detached element node of the given tag kind. Hosts
    /// reject tags they do not understand.
    fn create_element(&self, tag: &str) -> Result<NodeId, HostError>;

    /// Create a detached text node with literal content.
    fn create_text(&self, content: &str) -> NodeId;

    /// Append a child at the end of a parent's child list.
    fn append(&self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Set or overwrite a named attribute on an element.
    fn set_attribute(&self, node: NodeId, name: &str, value: &Value);

    /// Set one style field on an element.
    fn set_style(&self, node: NodeId, field: &str, value: &str);

    /// Set the class attribute on an element.
    fn set_class(&self, node: NodeId, class: &str);

    /// Subscribe a callback under an event name.
    fn add_listener(&self, node: NodeId, event: &str, handler: EventHandler);

    /// Detach and drop every descendant of a node.
    fn clear_children(&self, node: NodeId);
}
