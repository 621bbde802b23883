//! Server core functionality
//!
//! Shared application state, the route table and the listener.

pub mod core;

pub use core::{AppState, Server, SharedState, router};
