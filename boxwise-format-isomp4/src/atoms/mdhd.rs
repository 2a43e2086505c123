// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

/// Media header atom.
#[derive(Clone, Debug, Default)]
pub struct MdhdAtom {
    pub version: u8,
    pub flags: u32,
    /// Creation time.
    pub ctime: u64,
    /// Modification time.
    pub mtime: u64,
    /// Timescale.
    pub timescale: u32,
    /// Duration of the media in timescale units.
    pub duration: u64,
    /// Packed ISO-639-2/T language code.
    pub language: u16,
    pub quality: u16,
}

impl MdhdAtom {
    /// Get the language as a three letter code. Returns an empty string if the code is invalid.
    pub fn language(&self) -> String {
        let code = self.language;

        // An ISO language code outside of these bounds is not valid.
        if code < 0x400 || code > 0x7fff {
            String::new()
        }
        else {
            let chars = [
                ((code >> 10) & 0x1f) as u8 + 0x60,
                ((code >> 5) & 0x1f) as u8 + 0x60,
                ((code >> 0) & 0x1f) as u8 + 0x60,
            ];

            String::from_utf8_lossy(&chars).to_string()
        }
    }
}

impl AtomPayload for MdhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut mdhd = MdhdAtom { version, flags, ..Default::default() };

        match version {
            0 => {
                mdhd.ctime = u64::from(reader.read_be_u32()?);
                mdhd.mtime = u64::from(reader.read_be_u32()?);
                mdhd.timescale = reader.read_be_u32()?;
                mdhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                mdhd.ctime = reader.read_be_u64()?;
                mdhd.mtime = reader.read_be_u64()?;
                mdhd.timescale = reader.read_be_u32()?;
                mdhd.duration = reader.read_be_u64()?;
            }
            _ => {
                return decode_error("isomp4 (mdhd): invalid version");
            }
        }

        mdhd.language = reader.read_be_u16()?;
        mdhd.quality = reader.read_be_u16()?;

        Ok(mdhd)
    }

    fn payload_len(&self) -> u64 {
        match self.version {
            0 => 24,
            _ => 36,
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

        writer.write_be_u16(self.language)?;
        writer.write_be_u16(self.quality)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_mdhd_language() {
        // "und"
        let mdhd = MdhdAtom { language: 0x55c4, ..Default::default() };
        assert_eq!(mdhd.language(), "und");

        let mdhd = MdhdAtom { language: 0, ..Default::default() };
        assert_eq!(mdhd.language(), "");
    }
}
