//! Tree realization - turning virtual nodes into host mutations.
//!
//! `materialize` walks a resolved node tree and emits host operations:
//! text nodes, element creation with prop classification, listener
//! subscription, and recursive descent into children. Component nodes
//! encountered mid-tree are invoked inline with the render pass's
//! scope - only the top-level `render` does root bookkeeping.
//!
//! The engine validates nothing about tags; a host that does not
//! recognize an element kind fails loudly and the error propagates
//! unchanged.

use crate::engine::Scope;
use crate::host::{Host, NodeId};
use crate::types::{RenderError, Value};
use crate::vnode::{Children, ElementNode, VNode};

/// Materialize `node` into `container`.
pub(crate) fn materialize<H: Host>(
    host: &H,
    scope: &mut Scope,
    node: &VNode,
    container: NodeId,
) -> Result<(), RenderError> {
    match node {
        VNode::Empty => Ok(()),
        VNode::Text(content) => {
            let text = host.create_text(content);
            host.append(container, text)?;
            Ok(())
        }
        VNode::Seq(items) => {
            for item in items {
                materialize(host, scope, item, container)?;
            }
            Ok(())
        }
        VNode::Component(comp) => {
            let func = comp.func.clone();
            let output = func(scope, &comp.props, &comp.children);
            materialize(host, scope, &output, container)
        }
        VNode::Element(el) => materialize_element(host, scope, el, container),
    }
}

fn materialize_element<H: Host>(
    host: &H,
    scope: &mut Scope,
    el: &ElementNode,
    container: NodeId,
) -> Result<(), RenderError> {
    let node = host.create_element(&el.tag)?;

    for (name, value) in el.props.iter() {
        if let Some(event) = event_name(name) {
            match value {
                Value::Handler(handler) => host.add_listener(node, &event, handler.clone()),
                _ => {
                    return Err(RenderError::BadListener {
                        name: name.to_string(),
                    });
                }
            }
        } else if let Value::Style(fields) = value {
            for (field, v) in fields {
                host.set_style(node, field, v);
            }
        } else if name == "className" {
            if let Some(class) = value.as_attr_text() {
                host.set_class(node, &class);
            }
        } else {
            // false/null attributes are omitted, not stringified.
            match value {
                Value::Bool(false) | Value::Null => {}
                other => host.set_attribute(node, name, other),
            }
        }
    }

    match &el.children {
        Children::None => {}
        Children::One(child) => materialize(host, scope, child, node)?,
        Children::Many(list) => {
            for child in list {
                materialize(host, scope, child, node)?;
            }
        }
    }

    host.append(container, node)?;
    Ok(())
}

/// Derive an event name from an `on`-prefixed prop: `onClick` becomes
/// `click`. The prefix must be followed by an uppercase letter, so
/// ordinary names like `once` stay attributes.
fn event_name(name: &str) -> Option<String> {
    let rest = name.strip_prefix("on")?;
    let first = rest.chars().next()?;
    if first.is_ascii_uppercase() {
        Some(rest.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_derivation() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onKeyDown").as_deref(), Some("keydown"));
        assert_eq!(event_name("once"), None);
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("className"), None);
    }
}
