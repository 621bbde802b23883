//! Middleware module
//!
//! Layers applied to every route.

pub mod logging;

pub use logging::log_request;
