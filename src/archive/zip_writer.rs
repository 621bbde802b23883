//! Streaming ZIP writer
//!
//! Thin layer over `zip`'s stream mode: records go out strictly in order,
//! file entries carry a data descriptor instead of a patched header, and
//! nothing ever seeks back. `zip` writes the central directory on `finish`,
//! or from its own `Drop` when the writer is abandoned part way.
//!
//! On top of that this layer counts output bytes and refuses archives that
//! would need ZIP64.

use chrono::{DateTime as LocalDateTime, Datelike, Local, Timelike};
use std::io::{self, Read, Seek, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::ArchiveError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;
const MAX_ENTRIES: usize = u16::MAX as usize;
const MAX_CLASSIC_SIZE: u64 = u32::MAX as u64;

const FILE_MODE: u32 = 0o644;
const DIRECTORY_MODE: u32 = 0o755;

/// Counts bytes passed through to the sink
struct CountingWriter<W> {
    inner: W,
    written: Arc<AtomicU64>,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub struct ZipStreamWriter<S: Write + Seek> {
    zip: ZipWriter<S>,
    written: Arc<AtomicU64>,
    entries: usize,
}

/// Starts an archive on a sink that cannot seek
pub fn stream_writer<W: Write>(sink: W) -> ZipStreamWriter<impl Write + Seek> {
    let written = Arc::new(AtomicU64::new(0));
    let counting = CountingWriter {
        inner: sink,
        written: Arc::clone(&written),
    };

    ZipStreamWriter {
        zip: ZipWriter::new_stream(counting),
        written,
        entries: 0,
    }
}

impl<S: Write + Seek> ZipStreamWriter<S> {
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn bytes_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Adds a folder marker (stored, no payload). `name` ends with `/`.
    pub fn add_directory(&mut self, name: &str, modified: SystemTime) -> Result<(), ArchiveError> {
        self.check_limits()?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(zip_timestamp(modified))
            .unix_permissions(DIRECTORY_MODE);
        self.zip.add_directory(name, options)?;
        self.entries += 1;
        Ok(())
    }

    /// Adds a deflated file entry, copying `reader` through in chunks.
    /// Returns the number of uncompressed bytes read.
    pub fn add_file<R: Read + ?Sized>(
        &mut self,
        name: &str,
        modified: SystemTime,
        reader: &mut R,
    ) -> Result<u64, ArchiveError> {
        self.check_limits()?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip_timestamp(modified))
            .unix_permissions(FILE_MODE);
        self.zip.start_file(name, options)?;
        self.entries += 1;

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut uncompressed = 0u64;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ArchiveError::Io(e)),
            };
            uncompressed += n as u64;
            if uncompressed > MAX_CLASSIC_SIZE {
                return Err(ArchiveError::TooLarge(format!("{name} is larger than 4 GiB")));
            }
            self.zip.write_all(&buffer[..n])?;
        }
        Ok(uncompressed)
    }

    /// Writes the central directory and returns the total archive size.
    pub fn finish(self) -> Result<u64, ArchiveError> {
        let ZipStreamWriter { zip, written, .. } = self;
        zip.finish()?;
        Ok(written.load(Ordering::Relaxed))
    }

    fn check_limits(&self) -> Result<(), ArchiveError> {
        if self.entries >= MAX_ENTRIES {
            return Err(ArchiveError::TooLarge(format!(
                "more than {MAX_ENTRIES} entries"
            )));
        }
        if self.bytes_written() > MAX_CLASSIC_SIZE {
            return Err(ArchiveError::TooLarge(
                "archive is larger than 4 GiB".to_string(),
            ));
        }
        Ok(())
    }
}

/// Local time as a ZIP timestamp, clamped to the representable 1980..=2107 range
fn zip_timestamp(time: SystemTime) -> DateTime {
    let local: LocalDateTime<Local> = time.into();
    let year = local.year().clamp(1980, 2107);
    if year != local.year() {
        return if year == 1980 {
            DateTime::default()
        } else {
            DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default()
        };
    }

    DateTime::from_date_and_time(
        year as u16,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second().min(59) as u8,
    )
    .unwrap_or_default()
}
