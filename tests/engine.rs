//! Integration suite: the engine's observable behavior over the
//! public surface, driven through the in-memory host.

use std::cell::RefCell;
use std::rc::Rc;

use ember_tui::{
    Children, Event, HostError, MemoryHost, NodeId, Props, RenderError, Runtime, Scope,
    TerminalHost, TerminalOptions, VNode, Value, children, component, create_element, deps,
    handler, props,
};

fn setup() -> (MemoryHost, Runtime<MemoryHost>, NodeId) {
    let host = MemoryHost::new();
    let root = host.create_root();
    let runtime = Runtime::new(host.clone());
    (host, runtime, root)
}

/// Every node currently under `root`, depth-first.
fn descendants(host: &MemoryHost, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = host.children(root);
    stack.reverse();
    while let Some(id) = stack.pop() {
        out.push(id);
        let mut kids = host.children(id);
        kids.reverse();
        stack.extend(kids);
    }
    out
}

// =============================================================================
// Counter scenario
// =============================================================================

fn counter(scope: &mut Scope, _props: &Props, _children: &Children) -> VNode {
    let (count, set) = scope.use_state(0i64);
    create_element(
        "box",
        Props::new(),
        children![
            create_element(
                "button",
                props! { "onClick" => handler(move |_| set.update(|v| v + 1)) },
                children!["inc"],
            ),
            create_element("text", Props::new(), children![count]),
        ],
    )
}

#[test]
fn counter_clicks_through_deferred_renders() {
    let (host, runtime, root) = setup();
    let app = create_element(component("Counter", counter), Props::new(), children![]);
    runtime.render(&app, &Props::new(), root).unwrap();

    let value = |host: &MemoryHost| {
        let text_el = host.find_all(root, "text")[0];
        host.text_content(text_el)
    };
    assert_eq!(value(&host), "0");

    // One click; nothing changes until the deferred render runs.
    let button = host.find_all(root, "button")[0];
    assert_eq!(host.dispatch(button, &Event::new("click")), 1);
    assert_eq!(value(&host), "0");
    assert_eq!(runtime.pending(), 1);
    assert_eq!(runtime.flush().unwrap(), 1);
    assert_eq!(value(&host), "1");

    // Two more clicks before the next flush: two independent passes,
    // both observing the settled value.
    let button = host.find_all(root, "button")[0];
    host.dispatch(button, &Event::new("click"));
    host.dispatch(button, &Event::new("click"));
    assert_eq!(runtime.pending(), 2);
    assert_eq!(runtime.flush().unwrap(), 2);
    assert_eq!(value(&host), "3");
}

#[test]
fn rebuild_replaces_every_host_node() {
    let (host, runtime, root) = setup();
    let app = create_element(component("Counter", counter), Props::new(), children![]);
    runtime.render(&app, &Props::new(), root).unwrap();

    let before = descendants(&host, root);
    assert!(!before.is_empty());

    let button = host.find_all(root, "button")[0];
    host.dispatch(button, &Event::new("click"));
    runtime.flush().unwrap();

    let after = descendants(&host, root);
    assert_eq!(before.len(), after.len());
    // No node instance survives reconciliation.
    for id in &before {
        assert!(!after.contains(id));
        assert!(!host.contains(*id));
    }
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn false_and_null_attributes_are_omitted() {
    let (host, runtime, root) = setup();
    let node = create_element(
        "box",
        props! {
            "disabled" => false,
            "aria" => Value::Null,
            "focusable" => true,
            "width" => 80i64,
            "title" => "hi"
        },
        children![],
    );
    runtime.render(&node, &Props::new(), root).unwrap();

    let el = host.children(root)[0];
    assert_eq!(host.attr(el, "disabled"), None);
    assert_eq!(host.attr(el, "aria"), None);
    assert_eq!(host.attr(el, "focusable").as_deref(), Some("true"));
    assert_eq!(host.attr(el, "width").as_deref(), Some("80"));
    assert_eq!(host.attr(el, "title").as_deref(), Some("hi"));
}

#[test]
fn style_and_class_props_reach_the_host() {
    let (host, runtime, root) = setup();
    let node = create_element(
        "text",
        props! {
            "style" => Value::style([("color", "red"), ("bold", "true")]),
            "className" => "headline"
        },
        children!["hello"],
    );
    runtime.render(&node, &Props::new(), root).unwrap();

    let el = host.children(root)[0];
    assert_eq!(host.style(el, "color").as_deref(), Some("red"));
    assert_eq!(host.style(el, "bold").as_deref(), Some("true"));
    assert_eq!(host.class(el).as_deref(), Some("headline"));
    assert_eq!(host.attr(el, "className"), None);
}

#[test]
fn non_handler_listener_prop_is_an_error() {
    let (_host, runtime, root) = setup();
    let node = create_element("box", props! { "onClick" => "nope" }, children![]);
    let err = runtime.render(&node, &Props::new(), root).unwrap_err();
    assert!(matches!(err, RenderError::BadListener { name } if name == "onClick"));
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn effect_runs_only_when_dependency_changes() {
    let (_host, runtime, root) = setup();
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let comp = {
        let log = log.clone();
        component("Effector", move |scope, props, _children| {
            let x = match props.get("x") {
                Some(Value::Num(n)) => *n as i64,
                _ => 0,
            };
            let log = log.clone();
            scope.use_effect_cleanup(deps![x], move || {
                log.borrow_mut().push(format!("effect {x}"));
                let log = log.clone();
                Box::new(move || log.borrow_mut().push("cleanup".to_string()))
            });
            create_element("box", Props::new(), children![x])
        })
    };

    for x in [1i64, 1, 2] {
        let node = create_element(comp.clone(), props! { "x" => x }, children![]);
        runtime.render(&node, &Props::new(), root).unwrap();
    }

    assert_eq!(
        *log.borrow(),
        vec!["effect 1".to_string(), "cleanup".into(), "effect 2".into()]
    );
}

// =============================================================================
// Lineage and hook contract
// =============================================================================

#[test]
fn swapping_the_root_component_starts_a_fresh_lineage() {
    let (host, runtime, root) = setup();
    let cleaned = Rc::new(RefCell::new(false));

    let first = {
        let cleaned = cleaned.clone();
        component("First", move |scope, _props, _children| {
            let (a, _) = scope.use_state(1i64);
            let (b, _) = scope.use_state(2i64);
            let cleaned = cleaned.clone();
            scope.use_effect_cleanup(deps![], move || {
                Box::new(move || *cleaned.borrow_mut() = true)
            });
            create_element("box", Props::new(), children![a + b])
        })
    };
    let second = component("Second", |scope, _props, _children| {
        let (v, _) = scope.use_state(9i64);
        create_element("box", Props::new(), children![v])
    });

    let node = create_element(first, Props::new(), children![]);
    runtime.render(&node, &Props::new(), root).unwrap();
    assert_eq!(host.text_content(root), "3");

    // Different component, same root: no HookCount error, stale
    // effect cleaned up.
    let node = create_element(second, Props::new(), children![]);
    runtime.render(&node, &Props::new(), root).unwrap();
    assert_eq!(host.text_content(root), "9");
    assert!(*cleaned.borrow());
}

#[test]
fn conditional_hook_use_fails_with_a_distinct_error() {
    let (_host, runtime, root) = setup();
    let flaky = component("Flaky", |scope, _props, _children| {
        let (first, set) = scope.use_state(true);
        if first {
            set.set(false);
        } else {
            let _ = scope.use_state(0i64);
        }
        create_element("box", Props::new(), children![])
    });
    let node = create_element(flaky, Props::new(), children![]);
    runtime.render(&node, &Props::new(), root).unwrap();

    let err = runtime.flush().unwrap_err();
    assert!(matches!(
        err,
        RenderError::HookCount {
            expected: 1,
            used: 2
        }
    ));
}

// =============================================================================
// Host boundary
// =============================================================================

#[test]
fn terminal_host_rejects_unknown_tags_loudly() {
    let host = TerminalHost::new(TerminalOptions::default());
    let runtime = Runtime::new(host.clone());
    let root = host.root();

    let node = create_element("div", Props::new(), children!["nope"]);
    let err = runtime.render(&node, &Props::new(), root).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Host(HostError::UnknownTag(tag)) if tag == "div"
    ));
}

#[test]
fn terminal_host_renders_into_its_tree() {
    let host = TerminalHost::new(TerminalOptions::default());
    let runtime = Runtime::new(host.clone());
    let root = host.root();

    let app = create_element(component("Counter", counter), Props::new(), children![]);
    runtime.render(&app, &Props::new(), root).unwrap();
    assert_eq!(host.tree().find_all(root, "button").len(), 1);
    assert_eq!(host.tree().text_content(root), "inc0");
}
