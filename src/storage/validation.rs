//! Path validation
//!
//! Every path supplied by a client goes through [`PathGuard`] before it is
//! used for I/O. The guard normalizes the candidate, resolves symlinks of
//! the part that exists, and checks the result against the root boundary
//! component by component.

use log::{debug, warn};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::GuardError;

/// An absolute path proven to lie inside the root boundary.
///
/// Every directory component is symlink-resolved. The last component is
/// too, except for paths from [`PathGuard::validate_child_entry`], where it
/// may name a link itself. Only [`PathGuard`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    path: PathBuf,
}

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }

    /// Final component as a (lossy) string, if any
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Lossy string form, used for links and redirects
    pub fn to_string_lossy(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Validates candidate paths against a fixed root boundary.
///
/// Holds no mutable state; a single guard is shared by all requests.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Creates a guard for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GuardError> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|e| GuardError::InvalidRoot(root.to_path_buf(), e))?;

        if !canonical.is_dir() {
            return Err(GuardError::InvalidRoot(
                canonical,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        Ok(Self { root: canonical })
    }

    /// The canonical root boundary
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The root boundary as a validated path
    pub fn root_path(&self) -> ValidatedPath {
        ValidatedPath {
            path: self.root.clone(),
        }
    }

    pub fn is_root(&self, path: &ValidatedPath) -> bool {
        path.path == self.root
    }

    /// Validates a candidate that may or may not exist yet.
    ///
    /// Relative candidates are taken relative to the root. An empty
    /// candidate is the root itself.
    pub fn validate(&self, candidate: &str) -> Result<ValidatedPath, GuardError> {
        self.resolve(candidate).map(|(path, _)| path)
    }

    /// Validates a candidate that must already exist.
    pub fn validate_existing(&self, candidate: &str) -> Result<ValidatedPath, GuardError> {
        let (path, exists) = self.resolve(candidate)?;
        if !exists {
            return Err(GuardError::NotFound(candidate.to_string()));
        }
        Ok(path)
    }

    /// Validates `name` as an entry strictly below `base`.
    pub fn validate_child(
        &self,
        base: &ValidatedPath,
        name: &str,
    ) -> Result<ValidatedPath, GuardError> {
        if name.trim().is_empty() || Path::new(name).has_root() {
            return Err(GuardError::PathRejected(name.to_string()));
        }

        let joined = base.path.join(name);
        let child = self.validate(&joined.to_string_lossy())?;

        if child.path == base.path || !child.path.starts_with(&base.path) {
            warn!(
                "Path {} is not a child of {}",
                child.path.display(),
                base.path.display()
            );
            return Err(GuardError::PathRejected(name.to_string()));
        }

        Ok(child)
    }

    /// Like [`validate_child`](Self::validate_child), but a symlink as the
    /// last component is kept as the link rather than followed. Used where
    /// the entry itself is acted on, e.g. removed.
    pub fn validate_child_entry(
        &self,
        base: &ValidatedPath,
        name: &str,
    ) -> Result<ValidatedPath, GuardError> {
        if name.trim().is_empty() || name.contains('\0') || Path::new(name).has_root() {
            return Err(GuardError::PathRejected(name.escape_default().to_string()));
        }

        let joined = normalize_lexically(&base.path.join(name));
        let last = match joined.components().next_back() {
            Some(Component::Normal(last)) => last.to_os_string(),
            _ => return Err(GuardError::PathRejected(name.to_string())),
        };
        if joined == base.path || !joined.starts_with(&base.path) {
            warn!("Entry {} is not below {}", name, base.path.display());
            return Err(GuardError::PathRejected(name.to_string()));
        }

        let parent = joined
            .parent()
            .ok_or_else(|| GuardError::PathRejected(name.to_string()))?;
        let (parent, _) = self.resolve_path(parent, name)?;
        if !parent.path.starts_with(&base.path) {
            warn!(
                "Parent of {} resolves to {} outside {}",
                name,
                parent.path.display(),
                base.path.display()
            );
            return Err(GuardError::PathRejected(name.to_string()));
        }

        let entry = parent.path.join(last);
        debug!("Entry is safe: {}", entry.display());
        Ok(ValidatedPath { path: entry })
    }

    /// Normalizes, resolves and boundary-checks a candidate. The flag is
    /// `true` when the full path existed at resolution time.
    fn resolve(&self, candidate: &str) -> Result<(ValidatedPath, bool), GuardError> {
        if candidate.contains('\0') {
            return Err(GuardError::PathRejected(candidate.escape_default().to_string()));
        }
        self.resolve_path(Path::new(candidate), candidate)
    }

    fn resolve_path(&self, raw: &Path, candidate: &str) -> Result<(ValidatedPath, bool), GuardError> {
        let absolute = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.root.join(raw)
        };
        let normalized = normalize_lexically(&absolute);

        let (resolved, exists) = resolve_existing_prefix(&normalized)
            .map_err(|reason| GuardError::PathRejected(format!("{candidate} ({reason})")))?;

        if !resolved.starts_with(&self.root) {
            warn!(
                "Path {} resolves to {} outside root {}",
                candidate,
                resolved.display(),
                self.root.display()
            );
            return Err(GuardError::PathRejected(candidate.to_string()));
        }

        debug!("Path is safe: {}", resolved.display());
        Ok((ValidatedPath { path: resolved }, exists))
    }
}

/// Collapses `.` and `..` without touching the filesystem. `..` at the
/// top of an absolute path stays at the top.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Canonicalizes the deepest existing ancestor of `path` and re-attaches
/// the missing tail. A file in the middle of the path ends the existing
/// part the same way a missing entry does.
fn resolve_existing_prefix(path: &Path) -> Result<(PathBuf, bool), String> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match fs::symlink_metadata(&existing) {
            Ok(metadata) => {
                let mut resolved = match existing.canonicalize() {
                    Ok(canonical) => canonical,
                    Err(_) if metadata.file_type().is_symlink() => {
                        return Err(format!("dangling symlink {}", existing.display()));
                    }
                    Err(e) => return Err(e.to_string()),
                };
                let exists = tail.is_empty();
                while let Some(part) = tail.pop() {
                    resolved.push(part);
                }
                return Ok((resolved, exists));
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                match (existing.file_name(), existing.parent()) {
                    (Some(name), Some(parent)) => {
                        tail.push(name.to_os_string());
                        existing = parent.to_path_buf();
                    }
                    _ => return Err("no existing ancestor".to_string()),
                }
            }
            Err(e) => return Err(e.to_string()),
        }
    }
}
