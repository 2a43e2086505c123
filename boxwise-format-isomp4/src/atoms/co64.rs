// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

/// Chunk offset atom (64-bit version).
#[derive(Clone, Debug, Default)]
pub struct Co64Atom {
    pub version: u8,
    pub flags: u32,
    /// Absolute file offsets of each chunk.
    pub chunk_offsets: Vec<u64>,
}

impl AtomPayload for Co64Atom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("isomp4 (co64): atom size is less than 16 bytes"),
            None => return decode_error("isomp4 (co64): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / 8 {
            return decode_error("isomp4 (co64): invalid entry count");
        }

        let mut chunk_offsets = Vec::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            chunk_offsets.push(reader.read_be_u64()?);
        }

        Ok(Co64Atom { version, flags, chunk_offsets })
    }

    fn payload_len(&self) -> u64 {
        8 + 8 * self.chunk_offsets.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_be_u32(self.chunk_offsets.len() as u32)?;

        for offset in &self.chunk_offsets {
            writer.write_be_u64(*offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use crate::atoms::AtomType;

    use super::*;

    #[test]
    fn verify_co64_read_write() {
        let data = [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0];
        let header = AtomHeader::new(AtomType::ChunkOffset64, 0, 8 + data.len() as u64, 8);

        let co64 = Co64Atom::read(&mut BufReader::new(&data), header).unwrap();
        assert_eq!(co64.chunk_offsets, vec![1 << 32]);

        let mut buf = Vec::new();
        co64.write(&mut buf).unwrap();
        assert_eq!(buf, data);
    }
}
