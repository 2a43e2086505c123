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
pub struct SampleDurationEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Time-to-sample atom.
#[derive(Clone, Debug, Default)]
pub struct SttsAtom {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SampleDurationEntry>,
}

impl SttsAtom {
    /// The total number of samples described by the table.
    pub fn total_sample_count(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.sample_count)).sum()
    }

    /// The total duration of all samples in timescale units.
    pub fn total_duration(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.sample_count) * u64::from(entry.sample_delta))
            .sum()
    }

    /// Get the duration of the 1-based sample `sample_num`. The duration is taken from the first
    /// entry whose cumulative sample count reaches `sample_num`. Returns 0 if no entry does, or if
    /// `sample_num` is 0.
    pub fn sample_duration(&self, sample_num: u64) -> u32 {
        if sample_num == 0 {
            return 0;
        }

        let mut count = 0;

        for entry in &self.entries {
            count += u64::from(entry.sample_count);

            if count >= sample_num {
                return entry.sample_delta;
            }
        }

        0
    }
}

impl AtomPayload for SttsAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("isomp4 (stts): atom size is less than 16 bytes"),
            None => return decode_error("isomp4 (stts): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / 8 {
            return decode_error("isomp4 (stts): invalid entry count");
        }

        let mut entries = Vec::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let sample_count = reader.read_be_u32()?;
            let sample_delta = reader.read_be_u32()?;

            entries.push(SampleDurationEntry { sample_count, sample_delta });
        }

        Ok(SttsAtom { version, flags, entries })
    }

    fn payload_len(&self) -> u64 {
        8 + 8 * self.entries.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_be_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            writer.write_be_u32(entry.sample_count)?;
            writer.write_be_u32(entry.sample_delta)?;
        }
        Ok(())
    }
}
