//! File system storage management
//!
//! Path validation against the root boundary, directory listing, and the
//! create/write/delete operations built on top of validated paths.

pub mod filesystem;
pub mod listing;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used types
pub use listing::list_directory;
pub use operations::EntryMutator;
pub use results::{DirectoryEntry, EntryKind};
pub use validation::{PathGuard, ValidatedPath};
