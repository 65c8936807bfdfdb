//! Interactive counter.
//!
//! Tab focuses the buttons, Enter/Space (or a mouse click) activates
//! them, q quits. Run with `RUST_LOG=ember_tui=trace` to watch the
//! render passes on stderr.

use ember_tui::{
    Children, Props, Scope, TerminalOptions, VNode, Value, box_primitive, button, children,
    component, create_element, handler, mount, props, text,
};

fn counter(scope: &mut Scope, _props: &Props, _children: &Children) -> VNode {
    let (count, set) = scope.use_state(0i64);
    let bump = set.clone();

    box_primitive(
        Props::new(),
        children![
            text(
                props! { "style" => Value::style([("bold", "true"), ("color", "cyan")]) },
                children![format!("count: {count}")],
            ),
            box_primitive(
                Props::new(),
                children![
                    button(
                        props! { "onClick" => handler(move |_| bump.update(|v| v + 1)) },
                        children!["+1"],
                    ),
                    " ",
                    button(
                        props! { "onClick" => handler(move |_| set.set(0)) },
                        children!["reset"],
                    ),
                ],
            ),
            text(
                props! { "style" => Value::style([("dim", "true")]) },
                children!["tab: focus   enter/click: press   q: quit"],
            ),
        ],
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = create_element(component("Counter", counter), Props::new(), children![]);
    let handle = mount(app, Props::new(), TerminalOptions::default())?;
    handle.run()?;
    handle.unmount();
    Ok(())
}
