// ABOUTME: Chunked message transport — Outbox splits messages into length-prefixed chunks, Inbox reassembles them
// ABOUTME: Built on tokio's AsyncRead/AsyncWrite so either half can sit on any duplex byte stream

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::BoltResult;
use crate::packstream::decode_message;
use crate::packstream::Value;

pub const DEFAULT_CAPACITY: usize = 8192;
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 16384;

/// Assembles one outgoing message into length-prefixed chunks bounded by
/// `max_chunk_size`. The buffer is always transmittable in place: every
/// time `end` advances, the current chunk's length prefix is rewritten.
pub struct Outbox {
    max_chunk_size: usize,
    header: usize,
    start: usize,
    end: usize,
    data: BytesMut,
    /// Set once `write`/`chunk` touches the buffer; cleared by `clear`.
    /// Distinguishes a freshly cleared outbox (nothing to send) from one
    /// whose last chunk happens to be an intentional zero-length terminator
    /// — both have `start == end`, so the cursors alone can't tell them apart.
    dirty: bool,
}

impl Outbox {
    pub fn new(capacity: usize, max_chunk_size: usize) -> Self {
        let mut data = BytesMut::with_capacity(capacity);
        data.put_bytes(0, capacity.max(2));
        Self {
            max_chunk_size,
            header: 0,
            start: 2,
            end: 2,
            data,
            dirty: false,
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Resets the buffer for a new message, discarding any previous content.
    pub fn clear(&mut self) {
        self.header = 0;
        self.start = 2;
        self.end = 2;
        self.dirty = false;
        self.ensure_capacity(2);
        self.data[0..2].copy_from_slice(&[0, 0]);
    }

    fn ensure_capacity(&mut self, upto: usize) {
        if self.data.len() < upto {
            let grow = upto - self.data.len();
            self.data.put_bytes(0, grow);
        }
    }

    /// Appends bytes to the current chunk, opening new chunks as needed so
    /// no chunk payload exceeds `max_chunk_size`.
    pub fn write(&mut self, mut bytes: &[u8]) {
        if !bytes.is_empty() {
            self.dirty = true;
        }
        while !bytes.is_empty() {
            let chunk_size = self.end - self.start;
            let remaining = self.max_chunk_size - chunk_size;
            if remaining == 0 || (remaining < bytes.len() && bytes.len() <= self.max_chunk_size) {
                self.chunk();
                continue;
            }
            let take = bytes.len().min(remaining);
            let new_end = self.end + take;
            self.ensure_capacity(new_end);
            self.data[self.end..new_end].copy_from_slice(&bytes[..take]);
            self.end = new_end;
            let new_chunk_size = (self.end - self.start) as u16;
            self.data[self.header..self.header + 2].copy_from_slice(&new_chunk_size.to_be_bytes());
            bytes = &bytes[take..];
        }
    }

    /// Closes the current chunk, opening a fresh 2-byte placeholder header.
    /// Calling this with an empty current chunk writes the zero-length
    /// message terminator.
    pub fn chunk(&mut self) {
        self.dirty = true;
        self.header = self.end;
        self.start = self.header + 2;
        self.end = self.start;
        self.ensure_capacity(self.start);
        self.data[self.header..self.start].copy_from_slice(&[0, 0]);
    }

    /// Returns the bytes ready to flush: every chunk written so far,
    /// including a just-closed zero-length terminator chunk. Empty if
    /// nothing has been written since the last `clear`.
    pub fn view(&self) -> &[u8] {
        if self.dirty {
            &self.data[..self.end]
        } else {
            &self.data[..0]
        }
    }

    pub async fn flush_to<W: AsyncWrite + Unpin>(&mut self, writer: &mut W) -> BoltResult<()> {
        writer.write_all(self.view()).await?;
        writer.flush().await?;
        self.clear();
        Ok(())
    }
}

/// Reassembles chunks read from the socket into complete `(tag, fields)`
/// messages, skipping standalone NOOP chunks.
pub struct Inbox<R> {
    reader: R,
    scratch: BytesMut,
}

impl<R: AsyncRead + Unpin> Inbox<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scratch: BytesMut::new(),
        }
    }

    /// Reads one complete message, transparently skipping any number of
    /// leading NOOP (zero-length) chunks.
    pub async fn fetch_message(&mut self) -> BoltResult<(u8, Vec<Value>)> {
        self.scratch.clear();
        let mut chunk_size = 0u16;
        loop {
            while chunk_size == 0 {
                chunk_size = self.read_chunk_size().await?;
                if chunk_size == 0 {
                    debug!("S: <NOOP>");
                }
            }
            self.read_exact_into_scratch(chunk_size).await?;
            chunk_size = self.read_chunk_size().await?;
            if chunk_size == 0 {
                let mut cur = std::io::Cursor::new(self.scratch.as_ref());
                let (tag, fields) = decode_message(&mut cur)?;
                return Ok((tag, fields));
            }
        }
    }

    async fn read_chunk_size(&mut self) -> BoltResult<u16> {
        let mut header = [0u8; 2];
        self.reader.read_exact(&mut header).await?;
        Ok(u16::from_be_bytes(header))
    }

    async fn read_exact_into_scratch(&mut self, len: u16) -> BoltResult<()> {
        let mut buf = vec![0u8; len as usize];
        self.reader.read_exact(&mut buf).await?;
        self.scratch.extend_from_slice(&buf);
        Ok(())
    }
}
