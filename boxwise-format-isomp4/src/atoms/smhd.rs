// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};
use crate::fp::FpI8;

/// Sound header atom.
#[derive(Clone, Debug, Default)]
pub struct SmhdAtom {
    pub version: u8,
    pub flags: u32,
    /// Stereo balance.
    pub balance: FpI8,
}

impl AtomPayload for SmhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        if header.data_len() != Some(4) {
            return decode_error("isomp4 (smhd): atom size is not 16 bytes");
        }

        // Stereo balance
        let balance = FpI8::parse_raw(reader.read_be_u16()? as i16);

        // Reserved.
        let _ = reader.read_be_u16()?;

        Ok(SmhdAtom { version, flags, balance })
    }

    fn payload_len(&self) -> u64 {
        8
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_be_u16(self.balance.raw() as u16)?;
        writer.write_be_u16(0)?;
        Ok(())
    }
}
