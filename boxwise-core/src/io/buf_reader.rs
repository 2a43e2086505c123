// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io;

use super::{FiniteStream, ReadBytes};

#[inline(always)]
fn underrun_error<T>() -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "buffer underrun"))
}

/// A `BufReader` reads bytes from a byte buffer.
///
/// Atom payloads are decoded from a `BufReader` over exactly the payload bytes, so a decoder can
/// never read past the end of its atom.
pub struct BufReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    /// Instantiate a new `BufReader` with a given byte buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        BufReader { buf, pos: 0 }
    }

    /// Returns a reference to the next `len` bytes in the buffer and advances the stream.
    pub fn read_buf_bytes_ref(&mut self, len: usize) -> io::Result<&'a [u8]> {
        if self.buf.len() - self.pos < len {
            return underrun_error();
        }
        self.pos += len;
        Ok(&self.buf[self.pos - len..self.pos])
    }

    /// Returns `true` if every byte of the buffer has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Returns a reference to the remaining bytes in the buffer and advances the stream to the end.
    pub fn read_buf_bytes_available_ref(&mut self) -> &'a [u8] {
        let pos = self.pos;
        self.pos = self.buf.len();
        &self.buf[pos..]
    }
}

impl ReadBytes for BufReader<'_> {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        if self.buf.len() - self.pos < 1 {
            return underrun_error();
        }

        self.pos += 1;
        Ok(self.buf[self.pos - 1])
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        if self.buf.len() - self.pos < 2 {
            return underrun_error();
        }

        let mut bytes: [u8; 2] = [0u8; 2];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + 2]);
        self.pos += 2;

        Ok(bytes)
    }

    #[inline(always)]
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        if self.buf.len() - self.pos < 3 {
            return underrun_error();
        }

        let mut bytes: [u8; 3] = [0u8; 3];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + 3]);
        self.pos += 3;

        Ok(bytes)
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        if self.buf.len() - self.pos < 4 {
            return underrun_error();
        }

        let mut bytes: [u8; 4] = [0u8; 4];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;

        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = cmp::min(self.buf.len() - self.pos, buf.len());
        buf[..len].copy_from_slice(&self.buf[self.pos..self.pos + len]);
        self.pos += len;

        Ok(len)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let len = buf.len();

        if self.buf.len() - self.pos < len {
            return underrun_error();
        }

        buf.copy_from_slice(&self.buf[self.pos..self.pos + len]);
        self.pos += len;

        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        if ((self.buf.len() - self.pos) as u64) < count {
            return underrun_error();
        }

        self.pos += count as usize;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos as u64
    }
}

impl FiniteStream for BufReader<'_> {
    #[inline(always)]
    fn byte_len(&self) -> u64 {
        self.buf.len() as u64
    }

    #[inline(always)]
    fn bytes_read(&self) -> u64 {
        self.pos as u64
    }

    #[inline(always)]
    fn bytes_available(&self) -> u64 {
        (self.buf.len() - self.pos) as u64
    }
}
