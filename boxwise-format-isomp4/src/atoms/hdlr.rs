// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};
use crate::fourcc::FourCc;

/// Handler atom.
#[derive(Clone, Debug, Default)]
pub struct HdlrAtom {
    pub version: u8,
    pub flags: u32,
    /// Always 0 for MP4, but for QuickTime this contains the component type.
    pub component_type: [u8; 4],
    /// Handler type (e.g., `soun`, `mdir`).
    pub handler_type: FourCc,
    /// Reserved for MP4, but for QuickTime this is the component manufacturer.
    pub manufacturer: [u8; 4],
    pub component_flags: u32,
    pub component_flags_mask: u32,
    /// The raw component name. Either a length-prefixed (QuickTime) or a null-terminated (MP4)
    /// string.
    pub raw_name: Box<[u8]>,
}

impl HdlrAtom {
    /// The handler atom of an iTunes metadata atom.
    pub fn itunes_metadata() -> HdlrAtom {
        HdlrAtom {
            handler_type: FourCc::new(*b"mdir"),
            manufacturer: *b"appl",
            raw_name: Box::new([0]),
            ..Default::default()
        }
    }

    /// Human readable handler name.
    pub fn name(&self) -> String {
        let name = match self.raw_name.split_first() {
            // Length-prefixed.
            Some((&len, rest)) if usize::from(len) == rest.len() => rest,
            // Null-terminated.
            _ => {
                let raw = &self.raw_name[..];
                let end = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
                &raw[..end]
            }
        };

        String::from_utf8_lossy(name).to_string()
    }
}

impl AtomPayload for HdlrAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let data_len = header
            .data_len()
            .ok_or(Error::DecodeError("isomp4 (hdlr): expected atom size to be known"))?;

        if data_len < 20 {
            return decode_error("isomp4 (hdlr): atom is too small");
        }

        let component_type = reader.read_quad_bytes()?;
        let handler_type = FourCc::new(reader.read_quad_bytes()?);
        let manufacturer = reader.read_quad_bytes()?;
        let component_flags = reader.read_be_u32()?;
        let component_flags_mask = reader.read_be_u32()?;

        let raw_name = reader.read_boxed_slice_exact((data_len - 20) as usize)?;

        Ok(HdlrAtom {
            version,
            flags,
            component_type,
            handler_type,
            manufacturer,
            component_flags,
            component_flags_mask,
            raw_name,
        })
    }

    fn payload_len(&self) -> u64 {
        24 + self.raw_name.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_buf(&self.component_type)?;
        writer.write_buf(&self.handler_type.get())?;
        writer.write_buf(&self.manufacturer)?;
        writer.write_be_u32(self.component_flags)?;
        writer.write_be_u32(self.component_flags_mask)?;
        writer.write_buf(&self.raw_name)?;
        Ok(())
    }
}
