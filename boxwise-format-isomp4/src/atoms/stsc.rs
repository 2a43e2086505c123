// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleToChunkEntry {
    /// The 1-based index of the first chunk of the run.
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_desc_index: u32,
}

/// Sample to Chunk Atom
#[derive(Clone, Debug, Default)]
pub struct StscAtom {
    pub version: u8,
    pub flags: u32,
    /// Entries. The run of the last entry applies to all remaining chunks.
    pub entries: Vec<SampleToChunkEntry>,
}

impl AtomPayload for StscAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("isomp4 (stsc): atom size is less than 16 bytes"),
            None => return decode_error("isomp4 (stsc): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / 12 {
            return decode_error("isomp4 (stsc): invalid entry count");
        }

        let mut entries = Vec::<SampleToChunkEntry>::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let first_chunk = reader.read_be_u32()?;

            // Validate that first chunk is indexed from 1
            if first_chunk == 0 {
                return decode_error("isomp4 (stsc): entry's first chunk index should be from 1");
            }

            // Validate that first_chunk is monotonic across all entries.
            if let Some(prev) = entries.last() {
                if first_chunk <= prev.first_chunk {
                    return decode_error("isomp4 (stsc): entry's first chunk not monotonic");
                }
            }

            let samples_per_chunk = reader.read_be_u32()?;

            if samples_per_chunk == 0 {
                return decode_error("isomp4 (stsc): entry has 0 samples per chunk");
            }

            entries.push(SampleToChunkEntry {
                first_chunk,
                samples_per_chunk,
                sample_desc_index: reader.read_be_u32()?,
            });
        }

        Ok(StscAtom { version, flags, entries })
    }

    fn payload_len(&self) -> u64 {
        8 + 12 * self.entries.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_be_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            writer.write_be_u32(entry.first_chunk)?;
            writer.write_be_u32(entry.samples_per_chunk)?;
            writer.write_be_u32(entry.sample_desc_index)?;
        }
        Ok(())
    }
}
