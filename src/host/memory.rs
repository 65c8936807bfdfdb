//! In-memory host tree.
//!
//! The reference [`Host`] implementation: an arena of nodes with
//! parent/child links, attribute and listener storage, and a query
//! surface for inspecting what a render produced. The terminal host
//! draws from one of these; tests drive events through `dispatch`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Host, NodeId};
use crate::types::{Event, EventHandler, HostError, Value};

// =============================================================================
// Tree Storage
// =============================================================================

enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        styles: Vec<(String, String)>,
        class: Option<String>,
        listeners: Vec<(String, EventHandler)>,
    },
    Text(String),
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Tree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl Tree {
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Drop a subtree from the arena.
    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

// =============================================================================
// MemoryHost
// =============================================================================

/// Cheap cloneable handle over a shared in-memory tree.
#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Rc<RefCell<Tree>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container node usable as a render root.
    pub fn create_root(&self) -> NodeId {
        self.inner.borrow_mut().alloc(NodeKind::Element {
            tag: "root".to_string(),
            attrs: Vec::new(),
            styles: Vec::new(),
            class: None,
            listeners: Vec::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(&node)
    }

    /// Total number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(&node)?.kind {
            NodeKind::Text(content) => Some(content.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.inner.borrow().nodes.get(&node)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn class(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(&node)?.kind {
            NodeKind::Element { class, .. } => class.clone(),
            NodeKind::Text(_) => None,
        }
    }

    pub fn style(&self, node: NodeId, field: &str) -> Option<String> {
        match &self.inner.borrow().nodes.get(&node)?.kind {
            NodeKind::Element { styles, .. } => styles
                .iter()
                .find(|(n, _)| n == field)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn styles(&self, node: NodeId) -> Vec<(String, String)> {
        match self.inner.borrow().nodes.get(&node).map(|n| &n.kind) {
            Some(NodeKind::Element { styles, .. }) => styles.clone(),
            _ => Vec::new(),
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Concatenated text of every descendant text node, in order.
    pub fn text_content(&self, node: NodeId) -> String {
        let tree = self.inner.borrow();
        let mut out = String::new();
        collect_text(&tree, node, &mut out);
        out
    }

    /// Every element with the given tag under `root`, depth-first.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let tree = self.inner.borrow();
        let mut out = Vec::new();
        collect_tagged(&tree, root, tag, &mut out);
        out
    }

    pub fn has_listener(&self, node: NodeId, event: &str) -> bool {
        match self.inner.borrow().nodes.get(&node).map(|n| &n.kind) {
            Some(NodeKind::Element { listeners, .. }) => {
                listeners.iter().any(|(name, _)| name == event)
            }
            _ => false,
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Invoke every listener subscribed to `event.name` on `node`.
    ///
    /// Returns the number of listeners called. Handlers run with no
    /// tree borrow held, so they are free to mutate the tree or
    /// schedule renders.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let matching: Vec<EventHandler> = {
            match self.inner.borrow().nodes.get(&node).map(|n| &n.kind) {
                Some(NodeKind::Element { listeners, .. }) => listeners
                    .iter()
                    .filter(|(name, _)| *name == event.name)
                    .map(|(_, handler)| handler.clone())
                    .collect(),
                _ => Vec::new(),
            }
        };
        for handler in &matching {
            handler(event);
        }
        matching.len()
    }
}

fn collect_text(tree: &Tree, id: NodeId, out: &mut String) {
    let Some(node) = tree.nodes.get(&id) else { return };
    if let NodeKind::Text(content) = &node.kind {
        out.push_str(content);
    }
    for child in &node.children {
        collect_text(tree, *child, out);
    }
}

fn collect_tagged(tree: &Tree, id: NodeId, tag: &str, out: &mut Vec<NodeId>) {
    let Some(node) = tree.nodes.get(&id) else { return };
    if let NodeKind::Element { tag: t, .. } = &node.kind {
        if t == tag {
            out.push(id);
        }
    }
    for child in &node.children {
        collect_tagged(tree, *child, tag, out);
    }
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for MemoryHost {
    fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
        if tag.is_empty() {
            return Err(HostError::UnknownTag(tag.to_string()));
        }
        Ok(self.inner.borrow_mut().alloc(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            styles: Vec::new(),
            class: None,
            listeners: Vec::new(),
        }))
    }

    fn create_text(&self, content: &str) -> NodeId {
        self.inner
            .borrow_mut()
            .alloc(NodeKind::Text(content.to_string()))
    }

    fn append(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let mut tree = self.inner.borrow_mut();
        if !tree.nodes.contains_key(&parent) {
            return Err(HostError::Detached(parent));
        }
        let Some(node) = tree.nodes.get_mut(&child) else {
            return Err(HostError::Detached(child));
        };
        node.parent = Some(parent);
        if let Some(p) = tree.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        Ok(())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &Value) {
        let Some(text) = value.as_attr_text() else { return };
        let mut tree = self.inner.borrow_mut();
        if let Some(NodeKind::Element { attrs, .. }) =
            tree.nodes.get_mut(&node).map(|n| &mut n.kind)
        {
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = text,
                None => attrs.push((name.to_string(), text)),
            }
        }
    }

    fn set_style(&self, node: NodeId, field: &str, value: &str) {
        let mut tree = self.inner.borrow_mut();
        if let Some(NodeKind::Element { styles, .. }) =
            tree.nodes.get_mut(&node).map(|n| &mut n.kind)
        {
            match styles.iter_mut().find(|(n, _)| n == field) {
                Some(entry) => entry.1 = value.to_string(),
                None => styles.push((field.to_string(), value.to_string())),
            }
        }
    }

    fn set_class(&self, node: NodeId, class: &str) {
        let mut tree = self.inner.borrow_mut();
        if let Some(NodeKind::Element { class: slot, .. }) =
            tree.nodes.get_mut(&node).map(|n| &mut n.kind)
        {
            *slot = Some(class.to_string());
        }
    }

    fn add_listener(&self, node: NodeId, event: &str, handler: EventHandler) {
        let mut tree = self.inner.borrow_mut();
        if let Some(NodeKind::Element { listeners, .. }) =
            tree.nodes.get_mut(&node).map(|n| &mut n.kind)
        {
            listeners.push((event.to_string(), handler));
        }
    }

    fn clear_children(&self, node: NodeId) {
        let mut tree = self.inner.borrow_mut();
        let children = match tree.nodes.get_mut(&node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        for child in children {
            tree.remove_subtree(child);
        }
    }
}
