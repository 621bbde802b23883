//! Error handling
//!
//! Error types for the guard, listing, mutation and archive layers, plus
//! their mapping onto HTTP responses.

pub mod handlers;
pub mod types;

pub use types::*;
