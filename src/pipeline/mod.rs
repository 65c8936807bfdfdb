//! Application pipeline - mounting a node tree onto the terminal and
//! driving the event loop.

pub mod mount;

pub use mount::{MountHandle, mount};
