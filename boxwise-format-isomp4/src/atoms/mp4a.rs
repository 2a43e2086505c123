// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::Result;
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{AtomHeader, AtomPayload, SoundDescription};

/// MPEG-4 audio sample entry. The elementary stream descriptor (`esds`) follows as a child.
#[derive(Clone, Debug, Default)]
pub struct Mp4aAtom {
    /// General sound sample description.
    pub sound_desc: SoundDescription,
}

impl AtomPayload for Mp4aAtom {
    fn read<B: ReadBytes>(reader: &mut B, _header: AtomHeader) -> Result<Self> {
        let sound_desc = SoundDescription::read(reader)?;

        Ok(Mp4aAtom { sound_desc })
    }

    fn payload_len(&self) -> u64 {
        self.sound_desc.encoded_len()
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        self.sound_desc.write(writer)
    }
}
