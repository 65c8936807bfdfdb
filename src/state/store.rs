//! Global store - a process-wide mutable state container with
//! synchronous change notification.
//!
//! A deliberately simple pub/sub utility, orthogonal to the render
//! engine: `set_state` shallow-merges entries into one flat map and
//! notifies every subscriber before returning. Subscribers take no
//! arguments; they read whatever they care about back out with
//! `get_state`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::types::Value;

thread_local! {
    static STATE: RefCell<HashMap<String, Value>> = RefCell::new(HashMap::new());

    // Subscription slots; `None` after unsubscribe so ids stay stable.
    static SUBSCRIBERS: RefCell<Vec<Option<Rc<dyn Fn()>>>> = RefCell::new(Vec::new());
}

/// Shallow-merge `partial` into the global state, then synchronously
/// notify every subscriber.
pub fn set_state(partial: &[(&str, Value)]) {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        for (key, value) in partial {
            state.insert((*key).to_string(), value.clone());
        }
    });
    trace!(entries = partial.len(), "store updated");

    // Listeners run with no borrow held so they can subscribe or set
    // state themselves.
    let listeners: Vec<Rc<dyn Fn()>> =
        SUBSCRIBERS.with(|subs| subs.borrow().iter().flatten().cloned().collect());
    for listener in listeners {
        listener();
    }
}

/// Read one entry of the global state.
pub fn get_state(key: &str) -> Option<Value> {
    STATE.with(|state| state.borrow().get(key).cloned())
}

/// Copy of the whole state map.
pub fn snapshot() -> HashMap<String, Value> {
    STATE.with(|state| state.borrow().clone())
}

/// Register a no-argument change listener. Returns an id for
/// [`unsubscribe`].
pub fn subscribe(listener: impl Fn() + 'static) -> usize {
    SUBSCRIBERS.with(|subs| {
        let mut subs = subs.borrow_mut();
        subs.push(Some(Rc::new(listener)));
        subs.len() - 1
    })
}

/// Remove a listener. Unknown ids are ignored.
pub fn unsubscribe(id: usize) {
    SUBSCRIBERS.with(|subs| {
        if let Some(slot) = subs.borrow_mut().get_mut(id) {
            *slot = None;
        }
    });
}

/// Clear state and subscribers (test support).
pub fn reset_store() {
    STATE.with(|state| state.borrow_mut().clear());
    SUBSCRIBERS.with(|subs| subs.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_state_merges_and_notifies() {
        reset_store();
        let notified = Rc::new(Cell::new(0));

        let counter = notified.clone();
        subscribe(move || counter.set(counter.get() + 1));

        set_state(&[("count", Value::from(1i64)), ("name", Value::from("a"))]);
        set_state(&[("count", Value::from(2i64))]);

        assert_eq!(get_state("count"), Some(Value::Num(2.0)));
        assert_eq!(get_state("name"), Some(Value::Str("a".into())));
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        reset_store();
        let notified = Rc::new(Cell::new(0));

        let counter = notified.clone();
        let id = subscribe(move || counter.set(counter.get() + 1));

        set_state(&[("x", Value::Bool(true))]);
        unsubscribe(id);
        set_state(&[("x", Value::Bool(false))]);

        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn test_subscriber_ids_stay_stable() {
        reset_store();
        let hits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let first = hits.clone();
        let a = subscribe(move || first.borrow_mut().push("a"));
        let second = hits.clone();
        let _b = subscribe(move || second.borrow_mut().push("b"));

        unsubscribe(a);
        set_state(&[("k", Value::Null)]);
        assert_eq!(*hits.borrow(), vec!["b"]);
    }
}
