//! Transfer module for the file manager
//!
//! Bridges the blocking filesystem core and async HTTP bodies for folder
//! downloads and uploads.

pub mod channel;
pub mod file_ops;

// Re-export key types and functions
pub use channel::{BodyChunk, ChannelReader, ChannelWriter};
pub use file_ops::{archive_body, receiver_stream, spawn_upload};
