// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io;
use std::io::{Read, Seek, SeekFrom};

use log::trace;

use super::{MediaSource, ReadBytes};

const END_OF_STREAM_ERROR_STR: &str = "end of stream";

#[inline(always)]
fn end_of_stream_error<T>() -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::UnexpectedEof, END_OF_STREAM_ERROR_STR))
}

/// `SourceStreamOptions` specifies the buffering and positioning behaviour of a `SourceStream`.
pub struct SourceStreamOptions {
    /// The read-ahead buffer size. Must be > 0.
    pub buffer_len: usize,
    /// The number of bytes at the start of the source that precede the container (e.g., an
    /// ID3v2 tag). All positions reported by the stream are relative to this offset.
    pub base_offset: u64,
}

impl Default for SourceStreamOptions {
    fn default() -> Self {
        SourceStreamOptions { buffer_len: 32 * 1024, base_offset: 0 }
    }
}

/// A `SourceStream` is the common reader type for Boxwise. By using type erasure and dynamic
/// dispatch, `SourceStream` wraps and hides the inner reader from the consumer, allowing any
/// [`MediaSource`] (a file, an in-memory cursor, or host supplied callbacks) to be used.
///
/// Reads are serviced from a fixed-length read-ahead buffer. Seeks that land within the buffered
/// window do not touch the inner source.
pub struct SourceStream<'s> {
    /// The source reader.
    inner: Box<dyn MediaSource + 's>,
    /// The read-ahead buffer.
    buf: Box<[u8]>,
    /// The read position within the buffer.
    read_pos: usize,
    /// The number of valid bytes in the buffer.
    end_pos: usize,
    /// Absolute position of the inner source. This is the position of the byte following the
    /// last buffered byte.
    abs_pos: u64,
    /// Absolute position that relative position 0 maps to.
    base: u64,
    /// Cached total length of the source, if known.
    byte_len: Option<u64>,
}

impl<'s> SourceStream<'s> {
    /// Instantiates a new `SourceStream` and positions it at the base offset.
    pub fn new(
        mut source: Box<dyn MediaSource + 's>,
        options: SourceStreamOptions,
    ) -> io::Result<Self> {
        assert!(options.buffer_len > 0);

        let byte_len = source.byte_len();

        if options.base_offset > 0 {
            source.seek(SeekFrom::Start(options.base_offset))?;
        }

        Ok(SourceStream {
            inner: source,
            buf: vec![0; options.buffer_len].into_boxed_slice(),
            read_pos: 0,
            end_pos: 0,
            abs_pos: options.base_offset,
            base: options.base_offset,
            byte_len,
        })
    }

    /// Gets the base offset of the stream.
    pub fn base_offset(&self) -> u64 {
        self.base
    }

    /// Gets the length of the stream past the base offset, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len.map(|len| len.saturating_sub(self.base))
    }

    /// Returns if the underlying source is seekable.
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// Unwraps this `SourceStream`, returning the underlying source.
    pub fn into_inner(self) -> Box<dyn MediaSource + 's> {
        self.inner
    }

    #[inline(always)]
    fn unread_buffer_len(&self) -> usize {
        self.end_pos - self.read_pos
    }

    /// If the buffer has been exhausted, fetch a new block of data to replenish the buffer.
    fn fetch(&mut self) -> io::Result<()> {
        if self.read_pos == self.end_pos {
            let len = loop {
                match self.inner.read(&mut self.buf) {
                    Ok(len) => break len,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            };

            self.read_pos = 0;
            self.end_pos = len;
            self.abs_pos += len as u64;
        }
        Ok(())
    }

    /// If the buffer has been exhausted, fetch a new block of data. If the source is exhausted,
    /// return an end-of-stream error.
    fn fetch_or_eof(&mut self) -> io::Result<()> {
        self.fetch()?;

        if self.read_pos == self.end_pos {
            return end_of_stream_error();
        }
        Ok(())
    }

    /// Seek to a position relative to the base offset.
    pub fn seek(&mut self, pos: u64) -> io::Result<u64> {
        let target = self.base.checked_add(pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek position overflows")
        })?;

        // The absolute position of the first byte in the buffer.
        let buf_start = self.abs_pos - self.end_pos as u64;

        if target >= buf_start && target <= self.abs_pos {
            // Seek within the buffered window.
            self.read_pos = (target - buf_start) as usize;
        }
        else {
            trace!("source seek to {} (+{})", pos, self.base);

            self.inner.seek(SeekFrom::Start(target))?;
            self.read_pos = 0;
            self.end_pos = 0;
            self.abs_pos = target;
        }

        Ok(pos)
    }
}

impl Read for SourceStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Large reads with an empty buffer bypass the buffer.
        if self.unread_buffer_len() == 0 && buf.len() >= self.buf.len() {
            let len = self.inner.read(buf)?;
            self.read_pos = 0;
            self.end_pos = 0;
            self.abs_pos += len as u64;
            return Ok(len);
        }

        self.fetch()?;

        let len = cmp::min(self.unread_buffer_len(), buf.len());
        buf[..len].copy_from_slice(&self.buf[self.read_pos..self.read_pos + len]);
        self.read_pos += len;

        Ok(len)
    }
}

impl ReadBytes for SourceStream<'_> {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        self.fetch_or_eof()?;

        let value = self.buf[self.read_pos];
        self.read_pos += 1;

        Ok(value)
    }

    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        let mut bytes = [0; 3];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn read_buf_exact(&mut self, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let count = Read::read(self, buf)?;

            if count == 0 {
                return end_of_stream_error();
            }

            buf = &mut buf[count..];
        }

        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        let pos = ReadBytes::pos(self);
        let target = pos.checked_add(count).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "ignore count overflows")
        })?;

        // Skipping past the known end of the source is an end-of-stream condition, not a seek.
        if let Some(len) = self.byte_len() {
            if target > len {
                return end_of_stream_error();
            }
        }

        self.seek(target)?;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.abs_pos - self.unread_buffer_len() as u64 - self.base
    }
}
