//! Primitive node constructors for the terminal host's tag set.
//!
//! Thin wrappers over [`create_element`] so application code reads as
//! structure rather than tag strings.

use crate::vnode::{Child, Props, VNode, create_element, flatten_children};

/// Block container. Children stack vertically in the terminal host.
pub fn box_primitive(props: Props, children: Vec<Child>) -> VNode {
    create_element("box", props, children)
}

/// Inline styled text run.
pub fn text(props: Props, children: Vec<Child>) -> VNode {
    create_element("text", props, children)
}

/// Focusable button, drawn as `[ label ]`.
pub fn button(props: Props, children: Vec<Child>) -> VNode {
    create_element("button", props, children)
}

/// Group children without introducing a host element.
pub fn fragment(children: Vec<Child>) -> VNode {
    VNode::Seq(flatten_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use crate::{children, props};

    #[test]
    fn test_primitives_name_their_tags() {
        for (node, tag) in [
            (box_primitive(Props::new(), children![]), "box"),
            (text(Props::new(), children![]), "text"),
            (button(Props::new(), children![]), "button"),
        ] {
            match node {
                VNode::Element(el) => assert_eq!(el.tag, tag),
                other => panic!("expected element, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_fragment_flattens() {
        let absent: Option<&str> = None;
        let frag = fragment(children!["a", absent, vec!["b", "c"]]);
        assert_eq!(
            frag,
            VNode::Seq(vec![
                VNode::text("a"),
                VNode::text("b"),
                VNode::text("c"),
            ])
        );
    }

    #[test]
    fn test_props_flow_through() {
        let node = button(props! { "id" => "ok" }, children!["go"]);
        match node {
            VNode::Element(el) => {
                assert_eq!(el.props.get("id"), Some(&Value::Str("ok".into())));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }
}
