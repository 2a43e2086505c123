// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleSize {
    Constant(u32),
    Variable(Vec<u32>),
}

impl Default for SampleSize {
    fn default() -> Self {
        SampleSize::Variable(Vec::new())
    }
}

/// Sample Size Atom
#[derive(Clone, Debug, Default)]
pub struct StszAtom {
    pub version: u8,
    pub flags: u32,
    /// The total number of samples.
    pub sample_count: u32,
    /// A vector of `sample_count` sample sizes, or a constant size for all samples.
    pub sample_sizes: SampleSize,
}

impl StszAtom {
    /// Get the size of the 0-based sample `sample`. Returns 0 if the sample is out of range.
    pub fn sample_size(&self, sample: u64) -> u32 {
        match &self.sample_sizes {
            SampleSize::Constant(size) => *size,
            SampleSize::Variable(entries) => usize::try_from(sample)
                .ok()
                .and_then(|sample| entries.get(sample))
                .copied()
                .unwrap_or(0),
        }
    }
}

impl AtomPayload for StszAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        // minimum data size is 8 bytes
        let len = match header.data_len() {
            Some(len) if len >= 8 => len,
            Some(_) => return decode_error("isomp4 (stsz): atom size is less than 20 bytes"),
            None => return decode_error("isomp4 (stsz): expected atom size to be known"),
        };

        let sample_size = reader.read_be_u32()?;
        let sample_count = reader.read_be_u32()?;

        let sample_sizes = if sample_size == 0 {
            if u64::from(sample_count) != (len - 8) / 4 {
                return decode_error("isomp4 (stsz): invalid sample count");
            }

            let mut entries = Vec::with_capacity(sample_count as usize);

            for _ in 0..sample_count {
                entries.push(reader.read_be_u32()?);
            }

            SampleSize::Variable(entries)
        }
        else {
            SampleSize::Constant(sample_size)
        };

        Ok(StszAtom { version, flags, sample_count, sample_sizes })
    }

    fn payload_len(&self) -> u64 {
        match &self.sample_sizes {
            SampleSize::Constant(_) => 12,
            SampleSize::Variable(entries) => 12 + 4 * entries.len() as u64,
        }
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;

        match &self.sample_sizes {
            SampleSize::Constant(size) => {
                writer.write_be_u32(*size)?;
                writer.write_be_u32(self.sample_count)?;
            }
            SampleSize::Variable(entries) => {
                writer.write_be_u32(0)?;
                writer.write_be_u32(entries.len() as u32)?;

                for entry in entries {
                    writer.write_be_u32(*entry)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use crate::atoms::AtomType;

    use super::*;

    fn read_stsz(data: &[u8]) -> Result<StszAtom> {
        let header = AtomHeader::new(AtomType::SampleSize, 0, 8 + data.len() as u64, 8);
        StszAtom::read(&mut BufReader::new(data), header)
    }

    #[test]
    fn verify_stsz_constant() {
        let stsz = read_stsz(&[0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 9]).unwrap();
        assert_eq!(stsz.sample_sizes, SampleSize::Constant(256));
        assert_eq!(stsz.sample_count, 9);
        assert_eq!(stsz.sample_size(0), 256);
        assert_eq!(stsz.sample_size(1000), 256);
    }

    #[test]
    fn verify_stsz_variable() {
        let data = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 10, 0, 0, 0, 20];
        let stsz = read_stsz(&data).unwrap();
        assert_eq!(stsz.sample_sizes, SampleSize::Variable(vec![10, 20]));
        assert_eq!(stsz.sample_size(1), 20);
        assert_eq!(stsz.sample_size(2), 0);
        assert_eq!(stsz.payload_len(), data.len() as u64);

        // Sample count disagrees with the table length.
        let data = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 10, 0, 0, 0, 20];
        assert!(read_stsz(&data).is_err());
    }
}
