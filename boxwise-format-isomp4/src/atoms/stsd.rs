// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{unsupported_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};
use crate::fp::FpU16;

/// An atom that introduces a list of entries stored as its children. Used by the sample
/// description (`stsd`) and data reference (`dref`) atoms.
#[derive(Clone, Debug, Default)]
pub struct EntryListAtom {
    pub version: u8,
    pub flags: u32,
    /// The number of entries declared. The entries themselves are the children of the atom.
    pub entry_count: u32,
}

impl AtomPayload for EntryListAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let entry_count = reader.read_be_u32()?;

        Ok(EntryListAtom { version, flags, entry_count })
    }

    fn payload_len(&self) -> u64 {
        8
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_be_u32(self.entry_count)?;
        Ok(())
    }
}

/// The sound description common to all audio sample entries.
#[derive(Clone, Debug, Default)]
pub struct SoundDescription {
    pub reserved: [u8; 6],
    pub data_ref_index: u16,
    /// Sound description version. Versions 1 and 2 append extra fields.
    pub version: u16,
    pub revision: u16,
    pub vendor: [u8; 4],
    pub num_channels: u16,
    pub bits_per_sample: u16,
    pub compression_id: u16,
    pub packet_size: u16,
    pub sample_rate: FpU16,
    /// The raw fields appended by version 1 and 2 descriptions.
    pub extension: Box<[u8]>,
}

impl SoundDescription {
    /// Length of a version 0 sound description.
    pub const BASE_LEN: u64 = 28;

    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<SoundDescription> {
        let mut reserved = [0; 6];
        reader.read_buf_exact(&mut reserved)?;

        let data_ref_index = reader.read_be_u16()?;

        let version = reader.read_be_u16()?;
        let revision = reader.read_be_u16()?;
        let vendor = reader.read_quad_bytes()?;

        let num_channels = reader.read_be_u16()?;
        let bits_per_sample = reader.read_be_u16()?;
        let compression_id = reader.read_be_u16()?;
        let packet_size = reader.read_be_u16()?;
        let sample_rate = FpU16::parse_raw(reader.read_be_u32()?);

        let extension = match version {
            0 => Box::default(),
            // Version 1 appends 4 32-bit fields (samples/packet, bytes/packet, bytes/frame, and
            // bytes/sample).
            1 => reader.read_boxed_slice_exact(16)?,
            // Version 2 appends a structure size, a 64-bit sample rate, a channel count, and 5
            // 32-bit LPCM fields.
            2 => reader.read_boxed_slice_exact(36)?,
            _ => return unsupported_error("isomp4: unknown sound sample description version"),
        };

        Ok(SoundDescription {
            reserved,
            data_ref_index,
            version,
            revision,
            vendor,
            num_channels,
            bits_per_sample,
            compression_id,
            packet_size,
            sample_rate,
            extension,
        })
    }

    pub fn encoded_len(&self) -> u64 {
        SoundDescription::BASE_LEN + self.extension.len() as u64
    }

    pub fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        writer.write_buf(&self.reserved)?;
        writer.write_be_u16(self.data_ref_index)?;
        writer.write_be_u16(self.version)?;
        writer.write_be_u16(self.revision)?;
        writer.write_buf(&self.vendor)?;
        writer.write_be_u16(self.num_channels)?;
        writer.write_be_u16(self.bits_per_sample)?;
        writer.write_be_u16(self.compression_id)?;
        writer.write_be_u16(self.packet_size)?;
        writer.write_be_u32(self.sample_rate.raw())?;
        writer.write_buf(&self.extension)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use super::*;

    #[test]
    fn verify_sound_description() {
        #[rustfmt::skip]
        let data = [
            0, 0, 0, 0, 0, 0, 0, 1, // reserved, data reference index
            0, 0, 0, 0, 0, 0, 0, 0, // version, revision, vendor
            0, 2, 0, 16, 0, 0, 0, 0, // channels, bits per sample, compression id, packet size
            0xac, 0x44, 0, 0, // sample rate
        ];

        let desc = SoundDescription::read(&mut BufReader::new(&data)).unwrap();
        assert_eq!(desc.data_ref_index, 1);
        assert_eq!(desc.num_channels, 2);
        assert_eq!(desc.bits_per_sample, 16);
        assert_eq!(desc.sample_rate.integer(), 44100);
        assert_eq!(desc.encoded_len(), 28);

        let mut buf = Vec::new();
        desc.write(&mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn verify_sound_description_version_1() {
        let mut data = vec![0u8; 44];
        data[9] = 1;

        let desc = SoundDescription::read(&mut BufReader::new(&data)).unwrap();
        assert_eq!(desc.encoded_len(), 44);

        data[9] = 3;
        assert!(SoundDescription::read(&mut BufReader::new(&data)).is_err());
    }
}
