// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};
use crate::fp::{FpU16, FpU8};

/// Track header atom.
#[derive(Clone, Debug, Default)]
pub struct TkhdAtom {
    pub version: u8,
    /// Track header flags.
    pub flags: u32,
    /// Creation time.
    pub ctime: u64,
    /// Modification time.
    pub mtime: u64,
    /// Track identifier.
    pub id: u32,
    /// Track duration in the timescale units specified in the movie header. This value is equal to
    /// the sum of the durations of all the track's edits.
    pub duration: u64,
    /// Layer.
    pub layer: u16,
    /// Grouping identifier.
    pub alternate_group: u16,
    /// Preferred volume for track playback.
    pub volume: FpU8,
    /// The transformation matrix.
    pub matrix: [u32; 9],
    /// Visual presentation width.
    pub width: FpU16,
    /// Visual presentation height.
    pub height: FpU16,
}

impl AtomPayload for TkhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut tkhd = TkhdAtom { version, flags, ..Default::default() };

        // Version 0 uses 32-bit time values, verion 1 used 64-bit values.
        match version {
            0 => {
                tkhd.ctime = u64::from(reader.read_be_u32()?);
                tkhd.mtime = u64::from(reader.read_be_u32()?);
                tkhd.id = reader.read_be_u32()?;
                let _ = reader.read_be_u32()?; // Reserved
                tkhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                tkhd.ctime = reader.read_be_u64()?;
                tkhd.mtime = reader.read_be_u64()?;
                tkhd.id = reader.read_be_u32()?;
                let _ = reader.read_be_u32()?; // Reserved
                tkhd.duration = reader.read_be_u64()?;
            }
            _ => return decode_error("isomp4 (tkhd): invalid version"),
        }

        // Reserved
        let _ = reader.read_be_u64()?;

        tkhd.layer = reader.read_be_u16()?;
        tkhd.alternate_group = reader.read_be_u16()?;
        tkhd.volume = FpU8::parse_raw(reader.read_be_u16()?);

        // Reserved
        let _ = reader.read_be_u16()?;

        for value in tkhd.matrix.iter_mut() {
            *value = reader.read_be_u32()?;
        }

        tkhd.width = FpU16::parse_raw(reader.read_be_u32()?);
        tkhd.height = FpU16::parse_raw(reader.read_be_u32()?);

        Ok(tkhd)
    }

    fn payload_len(&self) -> u64 {
        match self.version {
            0 => 84,
            _ => 96,
        }
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;

        if self.version == 0 {
            writer.write_be_u32(self.ctime as u32)?;
            writer.write_be_u32(self.mtime as u32)?;
            writer.write_be_u32(self.id)?;
            writer.write_be_u32(0)?;
            writer.write_be_u32(self.duration as u32)?;
        }
        else {
            writer.write_be_u64(self.ctime)?;
            writer.write_be_u64(self.mtime)?;
            writer.write_be_u32(self.id)?;
            writer.write_be_u32(0)?;
            writer.write_be_u64(self.duration)?;
        }

        writer.write_be_u64(0)?;
        writer.write_be_u16(self.layer)?;
        writer.write_be_u16(self.alternate_group)?;
        writer.write_be_u16(self.volume.raw())?;
        writer.write_be_u16(0)?;

        for &value in &self.matrix {
            writer.write_be_u32(value)?;
        }

        writer.write_be_u32(self.width.raw())?;
        writer.write_be_u32(self.height.raw())?;
        Ok(())
    }
}
