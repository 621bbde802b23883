//! HTTP protocol layer
//!
//! Request parameters, route handlers, the directory page and the response
//! helpers shared between them.

pub mod commands;
pub mod handlers;
pub mod render;
pub mod responses;

pub use commands::{BrowseQuery, CreateFolderForm, EntryQuery};
pub use handlers::{browse, create_folder, delete, download, upload};
