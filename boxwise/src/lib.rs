// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Boxwise
//!
//! Boxwise is a pure Rust library to inspect ISO/MP4 containers and to read and rewrite their
//! iTunes metadata.
//!
//! # Usage
//!
//! The following steps describe a basic usage of Boxwise:
//!
//! 1.  Make sure the [`MediaSource`][core::io::MediaSource] trait is implemented for whatever
//!     source you are using. This trait is already implemented for `std::fs::File` and
//!     `std::io::Cursor`. Sources that are only reachable through callbacks may be adapted with
//!     [`CallbackSource`][core::io::CallbackSource].
//! 2.  If the container is preceded by other data (e.g., an ID3v2 tag), find its length. Boxwise
//!     calls this the leading offset. All positions reported by Boxwise are relative to it.
//! 3.  Call [`isomp4::open`] to parse the container into an [`AtomTree`][isomp4::AtomTree].
//! 4.  Query the tree. Tracks expose their timing and sample placement through
//!     [`SampleTable`][isomp4::SampleTable], and [`isomp4::read_tags`] converts the iTunes item
//!     list into a [`TagRecord`][metadata::TagRecord].
//! 5.  To change the tags of a file, fill a `TagRecord` and call [`write_tags`] with a writable
//!     [`MediaSink`][core::io::MediaSink].
//!
//! The [`read_file_tags`] and [`write_file_tags`] functions perform steps 3 to 5 for a file
//! path.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::debug;

pub use boxwise_core as core;
pub use boxwise_format_isomp4 as isomp4;
pub use boxwise_metadata as metadata;

use boxwise_core::errors::Result;
use boxwise_core::io::{MediaSink, MediaSource};
use boxwise_format_isomp4::{ParseOptions, Placement, WriteOptions};
use boxwise_metadata::TagRecord;

/// Read the iTunes metadata of the container following `leading_offset` bytes of `source`.
pub fn read_tags(source: Box<dyn MediaSource + '_>, leading_offset: u64) -> Result<TagRecord> {
    let tree = isomp4::open(source, leading_offset, &ParseOptions::default())?;
    Ok(isomp4::read_tags(&tree.atoms))
}

/// Replace the iTunes metadata of the container following `leading_offset` bytes of `sink` with
/// `tags`, including the replay gain fields of the record.
pub fn write_tags<S: MediaSink + MediaSource>(
    sink: &mut S,
    leading_offset: u64,
    tags: &TagRecord,
    options: &WriteOptions,
) -> Result<Placement> {
    isomp4::write_tags(sink, leading_offset, tags, &tags.replay_gain, options)
}

/// Read the iTunes metadata of a file.
pub fn read_file_tags<P: AsRef<Path>>(path: P, leading_offset: u64) -> Result<TagRecord> {
    let file = File::open(path.as_ref())?;
    read_tags(Box::new(file), leading_offset)
}

/// Replace the iTunes metadata of a file.
pub fn write_file_tags<P: AsRef<Path>>(
    path: P,
    leading_offset: u64,
    tags: &TagRecord,
    options: &WriteOptions,
) -> Result<Placement> {
    let mut file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

    let placement = write_tags(&mut file, leading_offset, tags, options)?;

    file.sync_all()?;

    debug!("updated tags of {}", path.as_ref().display());

    Ok(placement)
}
