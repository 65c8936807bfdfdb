//! App-level state utilities.

pub mod store;

pub use store::{get_state, reset_store, set_state, snapshot, subscribe, unsubscribe};
