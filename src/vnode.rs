//! Virtual node model - declarative UI descriptions.
//!
//! A [`VNode`] is an immutable description of one UI element, text run,
//! or component invocation. Nodes are built fresh on every render pass,
//! carry no identity beyond their structure, and are never mutated
//! after construction.
//!
//! Node kinds are modeled as tagged variants rather than runtime type
//! inspection: an element names a host tag, a component references a
//! Rust function invoked with the current hook [`Scope`].

use std::fmt;
use std::rc::Rc;

use crate::engine::Scope;
use crate::types::Value;

// =============================================================================
// Props
// =============================================================================

/// Ordered name → value property map.
///
/// Insertion order is preserved so attribute application and style
/// fields hit the host deterministically. Setting an existing name
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: Vec<(String, Value)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value under the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Remove a property, returning its value if present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a [`Props`] map from `name => value` pairs.
#[macro_export]
macro_rules! props {
    () => { $crate::vnode::Props::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut p = $crate::vnode::Props::new();
        $(p.set($name, $value);)+
        p
    }};
}

// =============================================================================
// Virtual Nodes
// =============================================================================

/// A component function: props and normalized children in, node tree
/// out.
///
/// The [`Scope`] is the explicit invocation context - hook calls go
/// through it, addressed by call order within the render pass. The
/// children argument is the normalized `children` entry the node was
/// constructed with; typed props cannot carry nodes, so it travels
/// alongside them.
pub type ComponentFn = Rc<dyn Fn(&mut Scope, &Props, &Children) -> VNode>;

/// Immutable declarative description of one UI node.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    /// Renders nothing. The no-op input/output of `render`.
    Empty,
    /// Text leaf, materialized as a host text node.
    Text(String),
    /// Ordered sequence, materialized entry by entry into the same
    /// container.
    Seq(Vec<VNode>),
    Element(ElementNode),
    Component(ComponentNode),
}

/// A plain element node naming a host tag kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub props: Props,
    pub children: Children,
}

/// A component-function node, resolved by invoking the function.
#[derive(Clone)]
pub struct ComponentNode {
    pub name: &'static str,
    pub func: ComponentFn,
    pub props: Props,
    pub children: Children,
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("name", &self.name)
            .field("props", &self.props)
            .finish()
    }
}

impl PartialEq for ComponentNode {
    fn eq(&self, other: &Self) -> bool {
        // Function references compare by identity.
        Rc::ptr_eq(&self.func, &other.func)
            && self.props == other.props
            && self.children == other.children
    }
}

/// Normalized children of an element.
///
/// Exactly one surviving child stays unwrapped; anything else is the
/// full ordered sequence, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    None,
    One(Box<VNode>),
    Many(Vec<VNode>),
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    /// Whether this node renders nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            VNode::Empty => true,
            VNode::Seq(items) => items.is_empty(),
            _ => false,
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

/// The `type` argument of [`create_element`]: a host tag or a
/// component function.
#[derive(Clone)]
pub enum NodeType {
    Tag(String),
    Component { name: &'static str, func: ComponentFn },
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        NodeType::Tag(tag.to_string())
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::Tag(tag)
    }
}

/// Wrap a component function as a node type.
pub fn component(
    name: &'static str,
    func: impl Fn(&mut Scope, &Props, &Children) -> VNode + 'static,
) -> NodeType {
    NodeType::Component {
        name,
        func: Rc::new(func),
    }
}

/// One entry of a `create_element` children list.
///
/// `Empty` is the nullish entry dropped during flattening; `List` is a
/// nested sequence flattened one level deep.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Empty,
    Node(VNode),
    List(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        match node {
            VNode::Empty => Child::Empty,
            other => Child::Node(other),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Node(VNode::Text(text.to_string()))
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Node(VNode::Text(text))
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::Node(VNode::Text(n.to_string()))
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Child::Node(VNode::Text(n.to_string()))
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Child::Node(VNode::Text(crate::types::format_num(n)))
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        match child {
            Some(c) => c.into(),
            None => Child::Empty,
        }
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(list: Vec<T>) -> Self {
        Child::List(list.into_iter().map(Into::into).collect())
    }
}

/// Build a children list from heterogeneous entries.
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::<$crate::vnode::Child>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::vnode::Child::from($child)),+]
    };
}

/// Construct a virtual node.
///
/// The children list is flattened one level deep in order, dropping
/// nullish entries; deeper nesting survives as [`VNode::Seq`]. Exactly
/// one surviving child is stored unwrapped. A caller-supplied
/// `children` prop is always discarded in favor of the computed value.
///
/// Pure: no side effects, no global state.
pub fn create_element(ty: impl Into<NodeType>, mut props: Props, children: Vec<Child>) -> VNode {
    props.remove("children");
    let flat = flatten_children(children);
    let children = match flat.len() {
        1 => Children::One(Box::new(flat.into_iter().next().unwrap())),
        _ => Children::Many(flat),
    };
    match ty.into() {
        NodeType::Tag(tag) => VNode::Element(ElementNode {
            tag,
            props,
            children,
        }),
        NodeType::Component { name, func } => VNode::Component(ComponentNode {
            name,
            func,
            props,
            children,
        }),
    }
}

/// Flatten one level deep, dropping nullish entries.
pub(crate) fn flatten_children(children: Vec<Child>) -> Vec<VNode> {
    let mut out = Vec::new();
    for child in children {
        match child {
            Child::Empty => {}
            Child::Node(node) => out.push(node),
            Child::List(items) => {
                for item in items {
                    match item {
                        Child::Empty => {}
                        Child::Node(node) => out.push(node),
                        // Deeper nesting stays a sequence.
                        Child::List(inner) => out.push(VNode::Seq(to_seq(inner))),
                    }
                }
            }
        }
    }
    out
}

fn to_seq(items: Vec<Child>) -> Vec<VNode> {
    items
        .into_iter()
        .filter_map(|child| match child {
            Child::Empty => None,
            Child::Node(node) => Some(node),
            Child::List(inner) => Some(VNode::Seq(to_seq(inner))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::handler;

    fn element(node: &VNode) -> &ElementNode {
        match node {
            VNode::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_flattens_one_level() {
        let node = create_element("box", Props::new(), children!["a", vec!["b", "c"]]);
        assert_eq!(
            element(&node).children,
            Children::Many(vec![
                VNode::text("a"),
                VNode::text("b"),
                VNode::text("c"),
            ])
        );
    }

    #[test]
    fn test_single_child_unwrapped() {
        let node = create_element("box", Props::new(), children!["only"]);
        assert_eq!(
            element(&node).children,
            Children::One(Box::new(VNode::text("only")))
        );
    }

    #[test]
    fn test_no_children_is_empty_sequence() {
        let node = create_element("box", Props::new(), children![]);
        assert_eq!(element(&node).children, Children::Many(vec![]));
    }

    #[test]
    fn test_nullish_entries_dropped() {
        let absent: Option<&str> = None;
        let node = create_element(
            "box",
            Props::new(),
            children![absent, "a", vec![Some("b"), None::<&str>]],
        );
        assert_eq!(
            element(&node).children,
            Children::Many(vec![VNode::text("a"), VNode::text("b")])
        );
    }

    #[test]
    fn test_deep_nesting_survives_as_seq() {
        let node = create_element(
            "box",
            Props::new(),
            children![vec![Child::from("a"), Child::List(vec!["b".into(), "c".into()])]],
        );
        assert_eq!(
            element(&node).children,
            Children::Many(vec![
                VNode::text("a"),
                VNode::Seq(vec![VNode::text("b"), VNode::text("c")]),
            ])
        );
    }

    #[test]
    fn test_children_prop_is_overwritten() {
        let node = create_element(
            "box",
            props! { "children" => "bogus", "id" => "keep" },
            children!["real"],
        );
        let el = element(&node);
        assert!(el.props.get("children").is_none());
        assert_eq!(el.props.get("id"), Some(&Value::Str("keep".into())));
        assert_eq!(el.children, Children::One(Box::new(VNode::text("real"))));
    }

    #[test]
    fn test_idempotent_construction() {
        let build = || {
            create_element(
                "box",
                props! { "id" => "x", "width" => 4i64 },
                children!["a", vec!["b"]],
            )
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_numbers_become_text() {
        let node = create_element("box", Props::new(), children![3i64]);
        assert_eq!(element(&node).children, Children::One(Box::new(VNode::text("3"))));
    }

    #[test]
    fn test_props_set_replaces() {
        let mut props = Props::new();
        props.set("color", "red");
        props.set("color", "blue");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("color"), Some(&Value::Str("blue".into())));
    }

    #[test]
    fn test_handler_props_compare_by_identity() {
        let h = handler(|_| {});
        let a = create_element("box", props! { "onClick" => h.clone() }, children![]);
        let b = create_element("box", props! { "onClick" => h }, children![]);
        assert_eq!(a, b);
    }
}
