//! Core types for ember-tui.
//!
//! These types define the foundation that everything builds on: the
//! prop value variants that flow from virtual nodes into the host tree,
//! the event surface, and the error kinds the engine can raise.

use std::fmt;
use std::io;
use std::rc::Rc;

use crate::host::NodeId;

// =============================================================================
// Events
// =============================================================================

/// An event delivered to a listener subscribed on a host node.
///
/// `name` is the derived event name (`"click"`, `"input"`, ...).
/// `value` carries the payload for value-bearing events such as text
/// input; click-like events leave it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub value: Option<String>,
}

impl Event {
    /// Create a payload-less event.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Create an event carrying a value payload.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Event callback type (Rc for shared ownership in closures).
///
/// Handlers are cloned into the host tree when a node materializes and
/// may be invoked any number of times, so they are `Fn`, not `FnOnce`.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Wrap a closure as a handler prop value.
pub fn handler(f: impl Fn(&Event) + 'static) -> Value {
    Value::Handler(Rc::new(f))
}

// =============================================================================
// Prop Values
// =============================================================================

/// A property value carried by a virtual node.
///
/// The variants mirror what the host boundary understands: plain
/// attributes (`Bool`/`Num`/`Str`), a style mapping applied field by
/// field, and event handlers. `Null` and `Bool(false)` are never set as
/// host attributes.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    /// Style mapping, applied one field at a time in order.
    Style(Vec<(String, String)>),
    Handler(EventHandler),
}

impl Value {
    /// Build a style mapping value.
    pub fn style<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Value::Style(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Render the value as attribute text, if it has a text form.
    ///
    /// `Null`, style mappings, and handlers have none.
    pub fn as_attr_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Num(n) => Some(format_num(*n)),
            Value::Str(s) => Some(s.clone()),
            Value::Null | Value::Style(_) | Value::Handler(_) => None,
        }
    }
}

/// Format a number the way it would appear as text content.
///
/// Whole values print without a trailing `.0` so counters read "3",
/// not "3.0".
pub(crate) fn format_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Style(a), Value::Style(b)) => a == b,
            // Handlers compare by identity, not structure.
            (Value::Handler(a), Value::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Style(fields) => f.debug_tuple("Style").field(fields).finish(),
            Value::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Num(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Num(v as f64)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Num(v as f64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Num(v as f64)
    }
}

impl From<EventHandler> for Value {
    fn from(v: EventHandler) -> Self {
        Value::Handler(v)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failures raised by a host implementation.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host does not know how to create this element kind.
    #[error("unknown element tag {0:?}")]
    UnknownTag(String),

    /// A node handle that no longer refers to a live node.
    #[error("node {0:?} is not attached to the host tree")]
    Detached(NodeId),

    /// Terminal I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures raised by the render engine.
///
/// Hook-contract violations are detected per render pass instead of
/// silently corrupting slot state; host failures propagate unchanged.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A root used a different number of hook slots than its previous
    /// render. Components must call hooks in the same order and count
    /// on every invocation.
    #[error("hook count changed across renders: expected {expected}, used {used}")]
    HookCount { expected: usize, used: usize },

    /// A slot allocated for one hook kind was reused as another
    /// (state slot read by use_effect or vice versa).
    #[error("hook slot {slot} reused as a different hook kind")]
    HookKind { slot: usize },

    /// A state slot was read with a different value type than it holds.
    #[error("hook slot {slot} holds a different state type")]
    HookType { slot: usize },

    /// An `on*` prop whose value is not a handler.
    #[error("listener prop {name:?} is not a handler")]
    BadListener { name: String },

    #[error(transparent)]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from(1i64), Value::Num(1.0));
        assert_eq!(Value::from("a"), Value::Str("a".into()));
        assert_ne!(Value::Null, Value::Bool(false));

        let h = handler(|_| {});
        let h2 = h.clone();
        assert_eq!(h, h2);
        assert_ne!(h, handler(|_| {}));
    }

    #[test]
    fn test_attr_text() {
        assert_eq!(Value::from(true).as_attr_text().as_deref(), Some("true"));
        assert_eq!(Value::from(3i64).as_attr_text().as_deref(), Some("3"));
        assert_eq!(Value::from(1.5).as_attr_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Null.as_attr_text(), None);
        assert_eq!(handler(|_| {}).as_attr_text(), None);
    }

    #[test]
    fn test_style_builder() {
        let style = Value::style([("color", "red"), ("bold", "true")]);
        match style {
            Value::Style(fields) => {
                assert_eq!(fields[0], ("color".to_string(), "red".to_string()));
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected style, got {other:?}"),
        }
    }
}
