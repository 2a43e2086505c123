// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{AtomHeader, AtomPayload, SoundDescription};

/// Apple Lossless audio sample entry.
#[derive(Clone, Debug, Default)]
pub struct AlacAtom {
    /// General sound sample description.
    pub sound_desc: SoundDescription,
    /// The codec configuration following the sound description. This is normally a nested
    /// `alac` atom holding the ALAC magic cookie.
    pub config: Box<[u8]>,
}

impl AlacAtom {
    /// Get the ALAC magic cookie, if the configuration is a well-formed nested atom.
    pub fn magic_cookie(&self) -> Option<&[u8]> {
        // Nested atom header and extended header.
        let cookie = self.config.get(12..)?;

        match cookie.len() {
            24 | 48 if &self.config[4..8] == b"alac" => Some(cookie),
            _ => None,
        }
    }
}

impl AtomPayload for AlacAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        let data_len = header
            .data_len()
            .ok_or(Error::DecodeError("isomp4 (alac): expected atom size to be known"))?;

        let sound_desc = SoundDescription::read(reader)?;

        let config_len = match data_len.checked_sub(sound_desc.encoded_len()) {
            Some(len) => len as usize,
            None => return decode_error("isomp4 (alac): atom too small for sound description"),
        };

        let config = reader.read_boxed_slice_exact(config_len)?;

        Ok(AlacAtom { sound_desc, config })
    }

    fn payload_len(&self) -> u64 {
        self.sound_desc.encoded_len() + self.config.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        self.sound_desc.write(writer)?;
        writer.write_buf(&self.config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use crate::atoms::AtomType;

    use super::*;

    #[test]
    fn verify_alac_config() {
        let mut data = vec![0u8; 28];
        data[17] = 2;
        data[19] = 16;

        // Nested alac atom with a 24 byte magic cookie.
        data.extend_from_slice(&[0, 0, 0, 36, b'a', b'l', b'a', b'c', 0, 0, 0, 0]);
        data.extend((0..24).map(|i| i as u8));

        let header = AtomHeader::new(AtomType::AudioSampleEntryAlac, 0, 8 + data.len() as u64, 8);
        let alac = AlacAtom::read(&mut BufReader::new(&data), header).unwrap();

        assert_eq!(alac.sound_desc.num_channels, 2);
        assert_eq!(alac.config.len(), 36);
        assert_eq!(alac.magic_cookie().map(|c| c.len()), Some(24));
        assert_eq!(alac.payload_len(), data.len() as u64);

        let mut buf = Vec::new();
        alac.write(&mut buf).unwrap();
        assert_eq!(buf, data);
    }
}
