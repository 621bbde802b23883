//! Folder archives
//!
//! Streams a directory subtree as a ZIP archive into any `Write` sink
//! without buffering the archive in memory.

pub mod streamer;
pub mod zip_writer;

pub use streamer::{ArchiveSummary, stream_directory};
pub use zip_writer::{ZipStreamWriter, stream_writer};
