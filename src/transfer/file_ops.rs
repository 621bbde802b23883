//! Module `file_ops`
//!
//! Runs the blocking archive and upload work on worker threads and wires
//! it to HTTP bodies: folder downloads become a streamed response body,
//! upload chunks are fed into the file writer as they arrive.

use axum::body::{Body, Bytes};
use futures::stream::{self, Stream};
use log::{error, info};
use std::io;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::archive::stream_directory;
use crate::error::MutateError;
use crate::storage::{EntryMutator, ValidatedPath};
use crate::transfer::channel::{BodyChunk, ChannelReader, ChannelWriter};

const ARCHIVE_CHUNK_SIZE: usize = 64 * 1024;
// Chunks in flight between the archive thread and the socket
const ARCHIVE_CHANNEL_DEPTH: usize = 4;
const UPLOAD_CHANNEL_DEPTH: usize = 8;

/// Starts archiving `dir` and returns the response body that carries it.
///
/// Bytes reach the client while the walk is still running. If the walk
/// fails the body ends with an error, which truncates the download.
pub fn archive_body(dir: ValidatedPath) -> Body {
    let (sender, receiver) = mpsc::channel::<BodyChunk>(ARCHIVE_CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter::new(sender, ARCHIVE_CHUNK_SIZE);
        match stream_directory(&dir, &mut writer) {
            Ok(summary) => {
                info!(
                    "Folder download complete: {} ({} entries, {} bytes)",
                    dir, summary.entries, summary.bytes_written
                );
            }
            Err(e) => {
                error!("Error creating ZIP for {}: {}", dir, e);
                writer.abort(e);
            }
        }
    });

    Body::from_stream(receiver_stream(receiver))
}

/// Adapts a chunk receiver into a body stream
pub fn receiver_stream(
    receiver: mpsc::Receiver<BodyChunk>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|chunk| (chunk, receiver))
    })
}

/// Starts a blocking writer for `dest`. Send the upload's chunks through
/// the returned sender and drop it to mark the end of the content.
pub fn spawn_upload(
    mutator: EntryMutator,
    dest: ValidatedPath,
) -> (
    mpsc::Sender<BodyChunk>,
    JoinHandle<Result<u64, MutateError>>,
) {
    let (sender, receiver) = mpsc::channel::<BodyChunk>(UPLOAD_CHANNEL_DEPTH);

    let handle = tokio::task::spawn_blocking(move || {
        let mut reader = ChannelReader::new(receiver);
        mutator.write_file(&dest, &mut reader)
    });

    (sender, handle)
}
