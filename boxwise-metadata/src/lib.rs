// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! This crate implements the container-independent metadata model of Boxwise: the generic tag
//! record exchanged with the host application, the replay gain fields, the standard genre table,
//! and the map between iTunes item codes and canonical tag names.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod genres;
pub mod itunes;
pub mod record;
pub mod replaygain;

pub use record::{is_internal_key, Tag, TagFlags, TagRecord};
pub use replaygain::{ReplayGain, ReplayGainField};
