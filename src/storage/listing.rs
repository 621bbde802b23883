//! Directory listing
//!
//! Reads a single directory level into [`DirectoryEntry`] values. Entries
//! whose metadata cannot be read are skipped so one bad entry does not
//! fail the whole listing. So are names that are not valid UTF-8: links
//! and forms carry names as text, and a lossy name would point at a
//! different entry.

use log::{info, warn};
use std::fs;

use crate::error::ListError;
use crate::storage::results::{DirectoryEntry, EntryKind};
use crate::storage::validation::ValidatedPath;

/// Lists the contents of a directory, in the order the filesystem returns them
pub fn list_directory(dir: &ValidatedPath) -> Result<Vec<DirectoryEntry>, ListError> {
    let reader = fs::read_dir(dir.as_path())
        .map_err(|e| ListError::NotReadable(dir.as_path().to_path_buf(), e))?;

    let mut entries = Vec::new();

    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read an entry of {}: {}", dir, e);
                continue;
            }
        };
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping entry of {} with a non UTF-8 name: {:?}", dir, raw);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Failed to get type for {}: {}", name, e);
                continue;
            }
        };
        let kind = if file_type.is_dir() {
            EntryKind::Folder
        } else {
            EntryKind::File
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to get info for {}: {}", name, e);
                continue;
            }
        };
        let modified_at = match metadata.modified() {
            Ok(time) => time,
            Err(e) => {
                warn!("Failed to get modification time for {}: {}", name, e);
                continue;
            }
        };

        let size = match kind {
            EntryKind::File => Some(metadata.len()),
            EntryKind::Folder => None,
        };

        entries.push(DirectoryEntry {
            name,
            kind,
            size,
            modified_at,
        });
    }

    info!("Listed directory {} - {} entries", dir, entries.len());

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::validation::PathGuard;

    #[test]
    fn test_counts_files_and_folders() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), b"abc").unwrap();
        fs::write(temp.path().join("b.bin"), vec![0u8; 2048]).unwrap();
        fs::write(temp.path().join("empty"), b"").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::create_dir(temp.path().join("other")).unwrap();

        let guard = PathGuard::new(temp.path()).unwrap();
        let entries = list_directory(&guard.root_path()).unwrap();
        assert_eq!(entries.len(), 5);

        for entry in &entries {
            match entry.kind {
                EntryKind::File => assert!(entry.size.is_some(), "{} has no size", entry.name),
                EntryKind::Folder => assert!(entry.size.is_none(), "{} has a size", entry.name),
            }
        }

        let b = entries.iter().find(|e| e.name == "b.bin").unwrap();
        assert_eq!(b.size, Some(2048));
        let empty = entries.iter().find(|e| e.name == "empty").unwrap();
        assert_eq!(empty.size, Some(0));
    }

    #[test]
    fn test_is_not_recursive() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub/inner")).unwrap();
        fs::write(temp.path().join("sub/inner/file.txt"), b"x").unwrap();

        let guard = PathGuard::new(temp.path()).unwrap();
        let entries = list_directory(&guard.root_path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "sub");
        assert!(entries[0].is_folder());
    }

    #[test]
    fn test_order_matches_read_dir() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::write(temp.path().join(name), name).unwrap();
        }

        let expected: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        let guard = PathGuard::new(temp.path()).unwrap();
        let names: Vec<String> = list_directory(&guard.root_path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_unreadable_directory() {
        let temp = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(temp.path()).unwrap();
        // Validated but never created
        let missing = guard.validate("gone").unwrap();
        assert!(matches!(
            list_directory(&missing),
            Err(ListError::NotReadable(..))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("plain.txt"), b"x").unwrap();
        let raw = OsStr::from_bytes(b"bad-\xff.txt");
        // Some filesystems refuse such names outright
        if fs::write(temp.path().join(raw), b"y").is_err() {
            return;
        }

        let guard = PathGuard::new(temp.path()).unwrap();
        let entries = list_directory(&guard.root_path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["plain.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_folder_is_not_a_folder() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let guard = PathGuard::new(temp.path()).unwrap();
        let entries = list_directory(&guard.root_path()).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert_eq!(link.kind, EntryKind::File);
    }
}
