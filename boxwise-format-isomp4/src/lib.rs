// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO/MP4 container support for Boxwise.
//!
//! A container is parsed into an [`AtomTree`] of typed atoms. The tree can be queried for sample
//! timing and placement information, searched by path, and rendered for inspection. The iTunes
//! item list of a container can be read into a generic [`TagRecord`] and written back, relocating
//! the movie atom when the new metadata no longer fits.
//!
//! [`TagRecord`]: boxwise_metadata::TagRecord

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Boxwise crates. Please see the workspace Cargo.toml for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

pub mod atoms;
pub mod dump;
pub mod find;
pub mod fourcc;
pub mod fp;
pub mod parser;
pub mod rewrite;
pub mod sample_table;
pub mod tags;

#[cfg(test)]
mod fixtures;

pub use parser::{open, read_atom, AtomTree, ParseOptions};
pub use rewrite::{write_tags, Placement, WriteOptions};
pub use sample_table::SampleTable;
pub use tags::read_tags;
