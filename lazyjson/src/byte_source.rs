// SPDX-License-Identifier: Apache-2.0

//! The byte-level input contract, plus an in-memory source for tests and demos.
//!
//! Any `std::io::Read + std::io::Seek` type is a [`ByteSource`] already, so a
//! `File`, a `BufReader<File>` or an `io::Cursor<Vec<u8>>` can be handed to a
//! [`Cursor`](crate::Cursor) directly.
//!
//! [`ChunkSource`] serves a byte slice in bounded chunks and counts what it
//! serves, which makes it useful to check how much of a document an operation
//! actually touched.

use std::io::{Read, Seek, SeekFrom};

use crate::Position;

/// A seekable byte input.
pub trait ByteSource {
    /// Read data into the provided buffer.
    /// Returns the number of bytes read.
    ///
    /// # Contract
    /// - A return value of 0 **MUST** indicate end of data at the current position
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Move to an absolute position.
    fn seek(&mut self, pos: Position) -> std::io::Result<()>;

    /// The current absolute position.
    fn tell(&mut self) -> std::io::Result<Position>;
}

impl<T: Read + Seek> ByteSource for T {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            match Read::read(self, buf) {
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn seek(&mut self, pos: Position) -> std::io::Result<()> {
        Seek::seek(self, SeekFrom::Start(pos)).map(|_| ())
    }

    fn tell(&mut self) -> std::io::Result<Position> {
        self.stream_position()
    }
}

/// A [`ByteSource`] over a byte slice that serves at most `chunk_size` bytes
/// per read.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use lazyjson::{ChunkSource, Node};
///
/// let source = RefCell::new(ChunkSource::new(br#"{"status": "ok"}"#, 4));
/// let node = Node::new(&source, 0).unwrap();
/// assert_eq!(node.index("status").unwrap().value().unwrap(), "ok");
/// ```
#[derive(Debug)]
pub struct ChunkSource<'a> {
    data: &'a [u8],
    pos: usize,
    chunk_size: usize,
    bytes_served: u64,
    reads: u64,
}

impl<'a> ChunkSource<'a> {
    /// Create a source that returns at most `chunk_size` bytes per read
    /// (minimum 1).
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
            bytes_served: 0,
            reads: 0,
        }
    }

    /// Create a source that serves as much as each read asks for.
    pub fn full_slice(data: &'a [u8]) -> Self {
        Self::new(data, usize::MAX)
    }

    /// Total bytes handed out by `read` since construction.
    pub fn bytes_served(&self) -> u64 {
        self.bytes_served
    }

    /// Number of `read` calls that returned data.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Length of the underlying slice.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the underlying slice is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Read for ChunkSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.data.get(self.pos..).unwrap_or(&[]);
        let to_copy = remaining.len().min(buf.len()).min(self.chunk_size);
        if to_copy == 0 {
            return Ok(0);
        }

        buf[..to_copy].copy_from_slice(&remaining[..to_copy]);
        self.pos += to_copy;
        self.bytes_served += to_copy as u64;
        self.reads += 1;
        Ok(to_copy)
    }
}

impl Seek for ChunkSource<'_> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => (self.data.len() as u64).checked_add_signed(delta),
            SeekFrom::Current(delta) => (self.pos as u64).checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            )
        })?;
        self.pos = usize::try_from(target)
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
        Ok(target)
    }
}
