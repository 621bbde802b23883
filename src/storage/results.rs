//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::time::SystemTime;

/// Kind of a directory entry, taken from the entry's own type bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }
}

/// One child of a listed directory
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size for files, `None` for folders
    pub size: Option<u64>,
    pub modified_at: SystemTime,
}

impl DirectoryEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}
