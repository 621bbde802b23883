//! Folder archive streaming
//!
//! Walks a validated folder depth-first and writes every file and folder
//! below it into a [`ZipStreamWriter`] as it goes.

use log::{debug, info};
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::archive::zip_writer::stream_writer;
use crate::error::ArchiveError;
use crate::storage::ValidatedPath;

/// Totals for one streamed archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Streams the subtree below `dir` into `sink` as a ZIP archive.
///
/// `dir` itself gets no entry; everything below it is named relative to
/// it. Symlinks are skipped. The first I/O error aborts the walk; the
/// archive trailer is still written before the error is returned.
pub fn stream_directory<W: Write>(
    dir: &ValidatedPath,
    sink: W,
) -> Result<ArchiveSummary, ArchiveError> {
    let mut zip = stream_writer(sink);
    let mut bytes_read = 0u64;

    for entry in WalkDir::new(dir.as_path()).min_depth(1).follow_links(false) {
        let entry = entry?;
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            debug!("Skipping symlink {}", entry.path().display());
            continue;
        }

        let relative = entry.path().strip_prefix(dir.as_path()).map_err(|_| {
            ArchiveError::Io(std::io::Error::other(format!(
                "{} is outside {}",
                entry.path().display(),
                dir
            )))
        })?;
        let name = archive_name(relative);
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if file_type.is_dir() {
            zip.add_directory(&format!("{name}/"), modified)?;
        } else if file_type.is_file() {
            let mut file = File::open(entry.path())?;
            bytes_read += zip.add_file(&name, modified, &mut file)?;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }

    let entries = zip.entry_count();
    let bytes_written = zip.finish()?;

    info!(
        "Archived {} ({} entries, {} bytes in, {} bytes out)",
        dir, entries, bytes_read, bytes_written
    );

    Ok(ArchiveSummary {
        entries,
        bytes_read,
        bytes_written,
    })
}

/// Entry name with `/` separators, whatever the host uses
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
