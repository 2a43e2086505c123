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

/// Movie header atom.
#[derive(Clone, Debug, Default)]
pub struct MvhdAtom {
    /// Version 0 uses 32-bit time values, version 1 uses 64-bit values.
    pub version: u8,
    pub flags: u32,
    /// The creation time.
    pub ctime: u64,
    /// The modification time.
    pub mtime: u64,
    /// Timescale for the movie expressed as the number of units per second.
    pub timescale: u32,
    /// The duration of the movie in `timescale` units.
    pub duration: u64,
    /// The preferred rate to play the movie.
    pub rate: FpU16,
    /// The preferred volume to play the movie.
    pub volume: FpU8,
    pub reserved: [u8; 10],
    /// The transformation matrix.
    pub matrix: [u32; 9],
    pub preview_time: u32,
    pub preview_duration: u32,
    pub poster_time: u32,
    pub selection_time: u32,
    pub selection_duration: u32,
    pub current_time: u32,
    pub next_track_id: u32,
}

impl AtomPayload for MvhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut mvhd = MvhdAtom { version, flags, ..Default::default() };

        match version {
            0 => {
                mvhd.ctime = u64::from(reader.read_be_u32()?);
                mvhd.mtime = u64::from(reader.read_be_u32()?);
                mvhd.timescale = reader.read_be_u32()?;
                mvhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                mvhd.ctime = reader.read_be_u64()?;
                mvhd.mtime = reader.read_be_u64()?;
                mvhd.timescale = reader.read_be_u32()?;
                mvhd.duration = reader.read_be_u64()?;
            }
            _ => return decode_error("isomp4 (mvhd): invalid version"),
        }

        mvhd.rate = FpU16::parse_raw(reader.read_be_u32()?);
        mvhd.volume = FpU8::parse_raw(reader.read_be_u16()?);

        reader.read_buf_exact(&mut mvhd.reserved)?;
        for value in mvhd.matrix.iter_mut() {
            *value = reader.read_be_u32()?;
        }

        mvhd.preview_time = reader.read_be_u32()?;
        mvhd.preview_duration = reader.read_be_u32()?;
        mvhd.poster_time = reader.read_be_u32()?;
        mvhd.selection_time = reader.read_be_u32()?;
        mvhd.selection_duration = reader.read_be_u32()?;
        mvhd.current_time = reader.read_be_u32()?;
        mvhd.next_track_id = reader.read_be_u32()?;

        Ok(mvhd)
    }

    fn payload_len(&self) -> u64 {
        match self.version {
            0 => 100,
            _ => 112,
        }
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;

        if self.version == 0 {
            writer.write_be_u32(self.ctime as u32)?;
            writer.write_be_u32(self.mtime as u32)?;
            writer.write_be_u32(self.timescale)?;
            writer.write_be_u32(self.duration as u32)?;
        }
        else {
            writer.write_be_u64(self.ctime)?;
            writer.write_be_u64(self.mtime)?;
            writer.write_be_u32(self.timescale)?;
            writer.write_be_u64(self.duration)?;
        }

        writer.write_be_u32(self.rate.raw())?;
        writer.write_be_u16(self.volume.raw())?;
        writer.write_buf(&self.reserved)?;
        for &value in &self.matrix {
            writer.write_be_u32(value)?;
        }
        writer.write_be_u32(self.preview_time)?;
        writer.write_be_u32(self.preview_duration)?;
        writer.write_be_u32(self.poster_time)?;
        writer.write_be_u32(self.selection_time)?;
        writer.write_be_u32(self.selection_duration)?;
        writer.write_be_u32(self.current_time)?;
        writer.write_be_u32(self.next_track_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use crate::atoms::AtomType;

    use super::*;

    #[test]
    fn verify_mvhd_versions() {
        for version in [0u8, 1] {
            let mvhd = MvhdAtom {
                version,
                ctime: 1,
                mtime: 2,
                timescale: 1000,
                duration: 5000,
                rate: FpU16::new(1),
                volume: FpU8::new(1),
                next_track_id: 2,
                ..Default::default()
            };

            let mut buf = Vec::new();
            mvhd.write(&mut buf).unwrap();
            assert_eq!(buf.len() as u64, mvhd.payload_len());

            let header = AtomHeader::new(AtomType::MovieHeader, 0, 8 + buf.len() as u64, 8);
            let read = MvhdAtom::read(&mut BufReader::new(&buf), header).unwrap();

            assert_eq!(read.timescale, 1000);
            assert_eq!(read.duration, 5000);
            assert_eq!(read.rate, FpU16::new(1));
            assert_eq!(read.next_track_id, 2);
        }
    }
}
