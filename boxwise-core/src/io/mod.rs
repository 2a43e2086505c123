// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements composable byte-level I/O.
//!
//! The following nomenclature is used to denote where the data being read is sourced from:
//!  * A `Stream` consumes any source implementing [`MediaSource`].
//!  * A `Reader` consumes a `&[u8]`.
//!
//! All `Reader`s and `Stream`s implement the [`ReadBytes`] trait. Serialization goes through the
//! [`WriteBytes`] trait, and in-place modification of a file goes through [`MediaSink`].

use std::io;

mod buf_reader;
mod source_stream;

pub use buf_reader::BufReader;
pub use source_stream::{SourceStream, SourceStreamOptions};

/// `MediaSource` is a composite trait of [`std::io::Read`] and [`std::io::Seek`]. A source *must*
/// implement this trait to be used by [`SourceStream`].
///
/// Despite requiring the [`std::io::Seek`] trait, seeking is an optional capability that can be
/// queried at runtime.
pub trait MediaSource: io::Read + io::Seek + Send + Sync {
    /// Returns if the source is seekable. This may be an expensive operation.
    fn is_seekable(&self) -> bool;

    /// Returns the length in bytes, if available. This may be an expensive operation.
    fn byte_len(&self) -> Option<u64>;
}

impl MediaSource for std::fs::File {
    fn is_seekable(&self) -> bool {
        // If the file's metadata is available, and the file is a regular file (i.e., not a FIFO,
        // etc.), then the MediaSource will be seekable. Otherwise assume it is not. Note that
        // metadata() follows symlinks.
        match self.metadata() {
            Ok(metadata) => metadata.is_file(),
            _ => false,
        }
    }

    fn byte_len(&self) -> Option<u64> {
        match self.metadata() {
            Ok(metadata) => Some(metadata.len()),
            _ => None,
        }
    }
}

impl<T: std::convert::AsRef<[u8]> + Send + Sync> MediaSource for io::Cursor<T> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        // Get the underlying container, usually &Vec<T>.
        let inner = self.get_ref();
        // Get slice from the underlying container, &[T], for the len() function.
        Some(inner.as_ref().len() as u64)
    }
}

impl<S: MediaSource + ?Sized> MediaSource for &mut S {
    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn byte_len(&self) -> Option<u64> {
        (**self).byte_len()
    }
}

/// `SourceCallbacks` is the minimal read, seek, and tell interface a host application may supply
/// when it owns the underlying file handle (e.g., a virtual file system).
pub trait SourceCallbacks: Send + Sync {
    /// Read up-to `buf.len()` bytes, returning the number of bytes read. Zero signals the end of
    /// the source.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Seek to an absolute position.
    fn seek(&mut self, pos: u64) -> io::Result<()>;

    /// Get the current absolute position.
    fn tell(&mut self) -> io::Result<u64>;

    /// Get the total length of the source, if known.
    fn byte_len(&self) -> Option<u64> {
        None
    }
}

/// `CallbackSource` wraps a [`SourceCallbacks`] implementation and exposes it as a
/// [`MediaSource`].
pub struct CallbackSource<C: SourceCallbacks> {
    inner: C,
}

impl<C: SourceCallbacks> CallbackSource<C> {
    /// Instantiates a new `CallbackSource` by taking ownership of the callbacks.
    pub fn new(inner: C) -> Self {
        CallbackSource { inner }
    }

    /// Gets a reference to the callbacks.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Unwraps this `CallbackSource`, returning the callbacks.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: SourceCallbacks> MediaSource for CallbackSource<C> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        self.inner.byte_len()
    }
}

impl<C: SourceCallbacks> io::Read for CallbackSource<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<C: SourceCallbacks> io::Seek for CallbackSource<C> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let base = match pos {
            io::SeekFrom::Start(pos) => {
                self.inner.seek(pos)?;
                return Ok(pos);
            }
            io::SeekFrom::Current(delta) => (self.inner.tell()?, delta),
            io::SeekFrom::End(delta) => match self.inner.byte_len() {
                Some(len) => (len, delta),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "source length is unknown",
                    ))
                }
            },
        };

        let pos = base.0.checked_add_signed(base.1).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;

        self.inner.seek(pos)?;
        Ok(pos)
    }
}

/// `MediaSink` is the writable counterpart of [`MediaSource`]. It is used when rewriting the
/// container in place, and therefore must also support changing its length.
pub trait MediaSink: io::Read + io::Write + io::Seek {
    /// Truncate or extend the sink to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl MediaSink for std::fs::File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        std::fs::File::set_len(self, len)
    }
}

impl MediaSink for io::Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length too large"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl<S: MediaSink + ?Sized> MediaSink for &mut S {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// `ReadBytes` provides methods to read bytes and interpret them as big-endian unsigned integers.
pub trait ReadBytes {
    /// Reads a single byte from the stream and returns it or an error.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Reads two bytes from the stream and returns them in read-order or an error.
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]>;

    /// Reads three bytes from the stream and returns them in read-order or an error.
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]>;

    /// Reads four bytes from the stream and returns them in read-order or an error.
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Reads up-to the number of bytes required to fill buf or returns an error.
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Reads exactly the number of bytes required to fill be provided buffer or returns an error.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Reads a single unsigned byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_u8(&mut self) -> io::Result<u8> {
        self.read_byte()
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_double_bytes()?))
    }

    /// Reads three bytes from the stream and interprets them as an unsigned 24-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u24(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        buf[1..4].clone_from_slice(&self.read_triple_bytes()?);
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// Reads eight bytes from the stream and interprets them as an unsigned 64-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.read_buf_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads exactly the number of bytes requested, and returns a boxed slice of the data or an
    /// error.
    fn read_boxed_slice_exact(&mut self, len: usize) -> io::Result<Box<[u8]>> {
        let mut buf = vec![0u8; len];
        self.read_buf_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }

    /// Ignores the specified number of bytes from the stream or returns an error.
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;
}

impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        (*self).read_triple_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (*self).read_buf(buf)
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        (*self).ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// A `FiniteStream` is a stream that has a known length in bytes.
pub trait FiniteStream {
    /// Returns the length of the the stream in bytes.
    fn byte_len(&self) -> u64;

    /// Returns the number of bytes that have been read.
    fn bytes_read(&self) -> u64;

    /// Returns the number of bytes available for reading.
    fn bytes_available(&self) -> u64;
}

impl<F: FiniteStream> FiniteStream for &mut F {
    fn byte_len(&self) -> u64 {
        (**self).byte_len()
    }

    fn bytes_read(&self) -> u64 {
        (**self).bytes_read()
    }

    fn bytes_available(&self) -> u64 {
        (**self).bytes_available()
    }
}

/// `WriteBytes` provides methods to write big-endian unsigned integers and byte buffers.
pub trait WriteBytes {
    /// Writes the entire buffer or returns an error.
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Gets the number of bytes written so far.
    fn pos(&self) -> u64;

    #[inline(always)]
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_buf(&[value])
    }

    #[inline(always)]
    fn write_be_u16(&mut self, value: u16) -> io::Result<()> {
        self.write_buf(&value.to_be_bytes())
    }

    #[inline(always)]
    fn write_be_u24(&mut self, value: u32) -> io::Result<()> {
        debug_assert!(value < 1 << 24);
        self.write_buf(&value.to_be_bytes()[1..])
    }

    #[inline(always)]
    fn write_be_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_buf(&value.to_be_bytes())
    }

    #[inline(always)]
    fn write_be_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_buf(&value.to_be_bytes())
    }
}

impl WriteBytes for Vec<u8> {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.len() as u64
    }
}

impl<W: WriteBytes> WriteBytes for &mut W {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        (*self).write_buf(buf)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom};

    use super::*;

    struct VecCallbacks {
        data: Vec<u8>,
        pos: u64,
    }

    impl SourceCallbacks for VecCallbacks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let start = (self.pos as usize).min(self.data.len());
            let len = buf.len().min(self.data.len() - start);
            buf[..len].copy_from_slice(&self.data[start..start + len]);
            self.pos += len as u64;
            Ok(len)
        }

        fn seek(&mut self, pos: u64) -> io::Result<()> {
            self.pos = pos;
            Ok(())
        }

        fn tell(&mut self) -> io::Result<u64> {
            Ok(self.pos)
        }

        fn byte_len(&self) -> Option<u64> {
            Some(self.data.len() as u64)
        }
    }

    #[test]
    fn verify_callback_source_seek() {
        let mut source = CallbackSource::new(VecCallbacks { data: (0..16).collect(), pos: 0 });

        assert_eq!(source.seek(SeekFrom::Start(4)).unwrap(), 4);
        assert_eq!(source.seek(SeekFrom::Current(2)).unwrap(), 6);
        assert_eq!(source.seek(SeekFrom::End(-2)).unwrap(), 14);
        assert!(source.seek(SeekFrom::Current(-20)).is_err());

        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[14, 15]);
    }

    #[test]
    fn verify_write_bytes() {
        let mut buf = Vec::new();
        buf.write_be_u16(0x0102).unwrap();
        buf.write_be_u24(0x030405).unwrap();
        buf.write_be_u32(0x06070809).unwrap();
        buf.write_u8(0x0a).unwrap();

        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(WriteBytes::pos(&buf), 10);
    }

    #[test]
    fn verify_cursor_sink_set_len() {
        let mut sink = io::Cursor::new(vec![1u8; 8]);
        sink.set_len(4).unwrap();
        assert_eq!(sink.get_ref().len(), 4);
        sink.set_len(6).unwrap();
        assert_eq!(sink.get_ref(), &[1, 1, 1, 1, 0, 0]);
    }
}
