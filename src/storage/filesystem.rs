//! File system helpers
//!
//! Small existence checks shared by the storage operations. None of them
//! follow a final symlink.

use std::fs;
use std::io;
use std::path::Path;

/// Check whether anything (file, folder or symlink) exists at `path`
pub fn entry_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Check if a real directory (not a symlink to one) exists at `path`
pub fn directory_exists(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}
