//! Channel-backed I/O adapters
//!
//! The archive streamer and the upload writer are synchronous and run on
//! blocking worker threads. These adapters connect them to async response
//! and request bodies through bounded tokio channels, so backpressure from
//! the network reaches the filesystem loop.

use axum::body::Bytes;
use std::fmt;
use std::io::{self, Read, Write};
use tokio::sync::mpsc;

/// Chunks travelling to or from an HTTP body
pub type BodyChunk = io::Result<Bytes>;

/// `Write` sink that forwards data as chunks into a response body.
///
/// Must be used from a blocking thread, never from async code. Once the
/// receiving side is gone every write fails with `BrokenPipe`.
pub struct ChannelWriter {
    sender: mpsc::Sender<BodyChunk>,
    buffer: Vec<u8>,
    chunk_size: usize,
}

impl ChannelWriter {
    pub fn new(sender: mpsc::Sender<BodyChunk>, chunk_size: usize) -> Self {
        Self {
            sender,
            buffer: Vec::with_capacity(chunk_size),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Sends what is buffered, then an error item so the body ends
    /// abnormally instead of looking complete.
    pub fn abort(mut self, reason: impl fmt::Display) {
        let _ = self.send_buffer();
        let _ = self
            .sender
            .blocking_send(Err(io::Error::other(reason.to_string())));
    }

    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.chunk_size));
        self.sender
            .blocking_send(Ok(Bytes::from(chunk)))
            .map_err(|_| closed_error())
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.sender.is_closed() {
            return Err(closed_error());
        }
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= self.chunk_size {
            self.send_buffer()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let _ = self.send_buffer();
    }
}

/// `Read` source fed with chunks from a request body.
///
/// Must be used from a blocking thread. Reads return end of file once all
/// senders are dropped; an error chunk is returned as a read error.
pub struct ChannelReader {
    receiver: mpsc::Receiver<BodyChunk>,
    current: Bytes,
}

impl ChannelReader {
    pub fn new(receiver: mpsc::Receiver<BodyChunk>) -> Self {
        Self {
            receiver,
            current: Bytes::new(),
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.receiver.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = self.current.slice(n..);
        Ok(n)
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "response body closed by client")
}
