//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Path guard errors
#[derive(Debug)]
pub enum GuardError {
    /// Candidate escapes the root boundary or cannot be resolved safely.
    PathRejected(String),
    /// Candidate is inside the boundary but does not exist.
    NotFound(String),
    /// The configured root is missing or not a directory.
    InvalidRoot(PathBuf, io::Error),
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::PathRejected(p) => write!(f, "Invalid path or access denied: {}", p),
            GuardError::NotFound(p) => write!(f, "File or folder not found: {}", p),
            GuardError::InvalidRoot(p, e) => {
                write!(f, "Invalid root directory {}: {}", p.display(), e)
            }
        }
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::InvalidRoot(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Directory listing errors
#[derive(Debug)]
pub enum ListError {
    NotReadable(PathBuf, io::Error),
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::NotReadable(p, e) => {
                write!(f, "Unable to read directory {}: {}", p.display(), e)
            }
        }
    }
}

impl std::error::Error for ListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListError::NotReadable(_, e) => Some(e),
        }
    }
}

/// Create, write and delete errors
#[derive(Debug)]
pub enum MutateError {
    NotFound(PathBuf),
    Create(PathBuf, io::Error),
    Write(PathBuf, io::Error),
    Delete(PathBuf, io::Error),
    /// A derived child path failed validation.
    Rejected(GuardError),
}

impl fmt::Display for MutateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutateError::NotFound(p) => write!(f, "File or folder not found: {}", p.display()),
            MutateError::Create(p, e) => write!(f, "Failed to create {}: {}", p.display(), e),
            MutateError::Write(p, e) => write!(f, "Failed to save file to {}: {}", p.display(), e),
            MutateError::Delete(p, e) => write!(f, "Failed to delete {}: {}", p.display(), e),
            MutateError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MutateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MutateError::Create(_, e) | MutateError::Write(_, e) | MutateError::Delete(_, e) => {
                Some(e)
            }
            MutateError::Rejected(e) => Some(e),
            MutateError::NotFound(_) => None,
        }
    }
}

impl From<GuardError> for MutateError {
    fn from(error: GuardError) -> Self {
        MutateError::Rejected(error)
    }
}

/// Archive streaming errors
#[derive(Debug)]
pub enum ArchiveError {
    /// Reading a source file or writing to the sink failed.
    Io(io::Error),
    /// Traversal of the source tree failed.
    Walk(walkdir::Error),
    /// The archive encoder refused an entry.
    Zip(zip::result::ZipError),
    /// Entry exceeds what a non-ZIP64 archive can describe.
    TooLarge(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Io(e) => write!(f, "Archive I/O error: {}", e),
            ArchiveError::Walk(e) => write!(f, "Archive walk error: {}", e),
            ArchiveError::Zip(e) => write!(f, "Archive encoding error: {}", e),
            ArchiveError::TooLarge(what) => write!(f, "Archive limit exceeded: {}", what),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            ArchiveError::Walk(e) => Some(e),
            ArchiveError::Zip(e) => Some(e),
            ArchiveError::TooLarge(_) => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(error: io::Error) -> Self {
        ArchiveError::Io(error)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(error: zip::result::ZipError) -> Self {
        match error {
            zip::result::ZipError::Io(e) => ArchiveError::Io(e),
            other => ArchiveError::Zip(other),
        }
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(error: walkdir::Error) -> Self {
        ArchiveError::Walk(error)
    }
}

/// General file manager error that encompasses all error types
#[derive(Debug)]
pub enum FileManagerError {
    Guard(GuardError),
    List(ListError),
    Mutate(MutateError),
    Archive(ArchiveError),
    IoError(io::Error),
    /// A blocking worker panicked or was cancelled.
    TaskFailed(String),
}

impl fmt::Display for FileManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileManagerError::Guard(e) => write!(f, "{}", e),
            FileManagerError::List(e) => write!(f, "{}", e),
            FileManagerError::Mutate(e) => write!(f, "{}", e),
            FileManagerError::Archive(e) => write!(f, "{}", e),
            FileManagerError::IoError(e) => write!(f, "I/O error: {}", e),
            FileManagerError::TaskFailed(e) => write!(f, "Background task failed: {}", e),
        }
    }
}

impl std::error::Error for FileManagerError {}

impl From<GuardError> for FileManagerError {
    fn from(error: GuardError) -> Self {
        FileManagerError::Guard(error)
    }
}

impl From<ListError> for FileManagerError {
    fn from(error: ListError) -> Self {
        FileManagerError::List(error)
    }
}

impl From<MutateError> for FileManagerError {
    fn from(error: MutateError) -> Self {
        match error {
            MutateError::Rejected(e) => FileManagerError::Guard(e),
            other => FileManagerError::Mutate(other),
        }
    }
}

impl From<ArchiveError> for FileManagerError {
    fn from(error: ArchiveError) -> Self {
        FileManagerError::Archive(error)
    }
}

impl From<io::Error> for FileManagerError {
    fn from(error: io::Error) -> Self {
        FileManagerError::IoError(error)
    }
}

impl From<tokio::task::JoinError> for FileManagerError {
    fn from(error: tokio::task::JoinError) -> Self {
        FileManagerError::TaskFailed(error.to_string())
    }
}
