//! Storage operations
//!
//! Create, write and delete on validated paths. Every operation is a single
//! attempt: failures are reported to the caller, never retried.

use log::{error, info};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::MutateError;
use crate::storage::filesystem::entry_exists;
use crate::storage::validation::{PathGuard, ValidatedPath};

/// Performs mutations below the guard's root boundary
#[derive(Debug, Clone)]
pub struct EntryMutator {
    guard: PathGuard,
    default_folder_name: String,
}

impl EntryMutator {
    pub fn new(guard: PathGuard, default_folder_name: impl Into<String>) -> Self {
        Self {
            guard,
            default_folder_name: default_folder_name.into(),
        }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Creates a folder inside `parent` and returns the name used.
    ///
    /// Without a name, the default base name is tried first, then
    /// `"<base> (1)"`, `"<base> (2)"` and so on until one is free.
    pub fn create_folder(
        &self,
        parent: &ValidatedPath,
        requested_name: Option<&str>,
    ) -> Result<String, MutateError> {
        let requested = requested_name.filter(|name| !name.trim().is_empty());

        let (name, folder_path) = match requested {
            Some(name) => (name.to_string(), self.guard.validate_child(parent, name)?),
            None => self.next_free_folder(parent)?,
        };

        if let Err(e) = fs::create_dir(folder_path.as_path()) {
            error!("Failed to create folder at {}: {}", folder_path, e);
            return Err(MutateError::Create(folder_path.into_path_buf(), e));
        }

        info!("Folder '{}' created at {}", name, folder_path);
        Ok(name)
    }

    fn next_free_folder(
        &self,
        parent: &ValidatedPath,
    ) -> Result<(String, ValidatedPath), MutateError> {
        let base = &self.default_folder_name;
        let mut name = base.clone();
        let mut count = 1u64;

        loop {
            let candidate = self.guard.validate_child(parent, &name)?;
            let taken = entry_exists(candidate.as_path())
                .map_err(|e| MutateError::Create(candidate.as_path().to_path_buf(), e))?;
            if !taken {
                return Ok((name, candidate));
            }
            name = format!("{base} ({count})");
            count += 1;
        }
    }

    /// Writes `content` to `dest`, replacing any existing file.
    ///
    /// The old file is removed before the new one is written, so a failure
    /// part way through leaves `dest` absent: the partial file is removed
    /// too. Returns the number of bytes written.
    pub fn write_file<R: Read + ?Sized>(
        &self,
        dest: &ValidatedPath,
        content: &mut R,
    ) -> Result<u64, MutateError> {
        let path = dest.as_path();

        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(write_error(
                    path,
                    io::Error::other("destination is a directory"),
                ));
            }
            Ok(_) => {
                fs::remove_file(path).map_err(|e| {
                    error!("Failed to remove existing file {}: {}", path.display(), e);
                    write_error(path, e)
                })?;
                info!("Removed existing file: {}", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(write_error(path, e)),
        }

        let mut file = File::create(path).map_err(|e| {
            error!("Failed to create file at {}: {}", path.display(), e);
            write_error(path, e)
        })?;

        let copied = io::copy(content, &mut file).and_then(|n| file.flush().map(|_| n));
        let written = match copied {
            Ok(n) => n,
            Err(e) => {
                error!("Error saving file to {}: {}", path.display(), e);
                drop(file);
                // A partial file is not left behind under the final name
                let _ = fs::remove_file(path);
                return Err(write_error(path, e));
            }
        };

        info!("Saved {} ({} bytes)", path.display(), written);
        Ok(written)
    }

    /// Removes a file, or a folder with everything below it.
    pub fn delete_entry(&self, path: &ValidatedPath) -> Result<(), MutateError> {
        let target = path.as_path();

        if self.guard.is_root(path) {
            return Err(MutateError::Delete(
                target.to_path_buf(),
                io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "refusing to delete the root directory",
                ),
            ));
        }

        let metadata = match fs::symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MutateError::NotFound(target.to_path_buf()));
            }
            Err(e) => return Err(MutateError::Delete(target.to_path_buf(), e)),
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };

        match result {
            Ok(()) => {
                info!("Deleted {}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MutateError::NotFound(target.to_path_buf()))
            }
            Err(e) => {
                error!("Failed to delete {}: {}", target.display(), e);
                Err(MutateError::Delete(target.to_path_buf(), e))
            }
        }
    }

    /// Creates `path` and any missing ancestors. Succeeds if it already exists.
    pub fn ensure_directory_exists(&self, path: &ValidatedPath) -> Result<(), MutateError> {
        fs::create_dir_all(path.as_path()).map_err(|e| {
            error!("Failed to create directory {}: {}", path, e);
            MutateError::Create(path.as_path().to_path_buf(), e)
        })
    }
}

fn write_error(path: &Path, e: io::Error) -> MutateError {
    MutateError::Write(path.to_path_buf(), e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FOLDER_NAME;
    use crate::storage::filesystem::directory_exists;
    use tempfile::TempDir;

    fn setup() -> (TempDir, EntryMutator) {
        let temp = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(temp.path()).unwrap();
        (temp, EntryMutator::new(guard, DEFAULT_FOLDER_NAME))
    }

    #[test]
    fn test_default_folder_names_count_up() {
        let (temp, mutator) = setup();
        let root = mutator.guard().root_path();

        assert_eq!(mutator.create_folder(&root, None).unwrap(), "New Folder");
        assert_eq!(mutator.create_folder(&root, None).unwrap(), "New Folder (1)");
        assert_eq!(mutator.create_folder(&root, Some("  ")).unwrap(), "New Folder (2)");

        assert!(temp.path().join("New Folder").is_dir());
        assert!(temp.path().join("New Folder (1)").is_dir());
        assert!(temp.path().join("New Folder (2)").is_dir());
    }

    #[test]
    fn test_default_name_skips_existing_file() {
        let (temp, mutator) = setup();
        fs::write(temp.path().join("New Folder"), b"not a folder").unwrap();

        let root = mutator.guard().root_path();
        assert_eq!(mutator.create_folder(&root, None).unwrap(), "New Folder (1)");
    }

    #[test]
    fn test_named_folder() {
        let (temp, mutator) = setup();
        let root = mutator.guard().root_path();

        assert_eq!(mutator.create_folder(&root, Some("photos")).unwrap(), "photos");
        assert!(temp.path().join("photos").is_dir());

        // Explicit names are not renamed on collision
        assert!(matches!(
            mutator.create_folder(&root, Some("photos")),
            Err(MutateError::Create(..))
        ));
        assert!(matches!(
            mutator.create_folder(&root, Some("../escape")),
            Err(MutateError::Rejected(_))
        ));
    }

    #[test]
    fn test_write_file_replaces_content() {
        let (temp, mutator) = setup();
        let dest = mutator.guard().validate("notes.txt").unwrap();

        let first = mutator
            .write_file(&dest, &mut &b"first version, longer"[..])
            .unwrap();
        assert_eq!(first, 21);

        mutator.write_file(&dest, &mut &b"second"[..]).unwrap();
        assert_eq!(fs::read(temp.path().join("notes.txt")).unwrap(), b"second");
    }

    #[test]
    fn test_write_file_refuses_directory() {
        let (temp, mutator) = setup();
        fs::create_dir(temp.path().join("dir")).unwrap();
        let dest = mutator.guard().validate("dir").unwrap();

        assert!(matches!(
            mutator.write_file(&dest, &mut &b"x"[..]),
            Err(MutateError::Write(..))
        ));
        assert!(temp.path().join("dir").is_dir());
    }

    #[test]
    fn test_write_file_missing_parent() {
        let (_temp, mutator) = setup();
        let dest = mutator.guard().validate("missing/file.txt").unwrap();
        assert!(matches!(
            mutator.write_file(&dest, &mut &b"x"[..]),
            Err(MutateError::Write(..))
        ));
    }

    #[test]
    fn test_delete_entry() {
        let (temp, mutator) = setup();
        fs::create_dir_all(temp.path().join("tree/a/b")).unwrap();
        fs::write(temp.path().join("tree/a/b/file.txt"), b"x").unwrap();
        fs::write(temp.path().join("tree/top.txt"), b"y").unwrap();
        fs::write(temp.path().join("single.txt"), b"z").unwrap();

        let tree = mutator.guard().validate("tree").unwrap();
        mutator.delete_entry(&tree).unwrap();
        assert!(!temp.path().join("tree").exists());

        let single = mutator.guard().validate("single.txt").unwrap();
        mutator.delete_entry(&single).unwrap();
        assert!(!temp.path().join("single.txt").exists());

        assert!(matches!(
            mutator.delete_entry(&single),
            Err(MutateError::NotFound(_))
        ));
    }

    #[test]
    fn test_padded_names_are_distinct_entries() {
        let (temp, mutator) = setup();
        fs::write(temp.path().join("a.txt"), b"keep").unwrap();
        fs::write(temp.path().join("a.txt "), b"drop").unwrap();
        let root = mutator.guard().root_path();

        let padded = mutator.guard().validate_child_entry(&root, "a.txt ").unwrap();
        mutator.delete_entry(&padded).unwrap();
        assert!(!temp.path().join("a.txt ").exists());
        assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"keep");

        assert_eq!(mutator.create_folder(&root, Some(" spaced")).unwrap(), " spaced");
        assert!(temp.path().join(" spaced").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_symlink_keeps_target() {
        use std::os::unix::fs::symlink;

        let (temp, mutator) = setup();
        fs::create_dir_all(temp.path().join("real/inner")).unwrap();
        fs::write(temp.path().join("real/inner/data.txt"), b"data").unwrap();
        symlink(temp.path().join("real"), temp.path().join("link")).unwrap();
        let root = mutator.guard().root_path();

        let link = mutator.guard().validate_child_entry(&root, "link").unwrap();
        mutator.delete_entry(&link).unwrap();

        assert!(fs::symlink_metadata(temp.path().join("link")).is_err());
        assert_eq!(
            fs::read(temp.path().join("real/inner/data.txt")).unwrap(),
            b"data"
        );
    }

    #[test]
    fn test_delete_root_is_refused() {
        let (temp, mutator) = setup();
        let root = mutator.guard().root_path();
        assert!(matches!(
            mutator.delete_entry(&root),
            Err(MutateError::Delete(..))
        ));
        assert!(temp.path().is_dir());
    }

    #[test]
    fn test_ensure_directory_exists() {
        let (temp, mutator) = setup();
        let nested = mutator.guard().validate("x/y/z").unwrap();

        mutator.ensure_directory_exists(&nested).unwrap();
        mutator.ensure_directory_exists(&nested).unwrap();
        assert!(directory_exists(&temp.path().join("x/y/z")));

        fs::write(temp.path().join("plain"), b"x").unwrap();
        let file = mutator.guard().validate("plain").unwrap();
        assert!(matches!(
            mutator.ensure_directory_exists(&file),
            Err(MutateError::Create(..))
        ));
    }
}
