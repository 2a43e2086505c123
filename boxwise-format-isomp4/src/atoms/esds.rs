// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::{decode_error, Error, Result};
use boxwise_core::io::{BufReader, FiniteStream, ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

use log::debug;

const ES_DESCRIPTOR: u8 = 0x03;
const DECODER_CONFIG_DESCRIPTOR: u8 = 0x04;
const DECODER_SPECIFIC_DESCRIPTOR: u8 = 0x05;

/// The minimum length of an ES descriptor carrying a decoder configuration.
const MIN_ES_DESCRIPTOR_LEN: u32 = 20;
/// The length of the fixed fields of a decoder configuration descriptor.
const MIN_DECODER_CONFIG_LEN: u32 = 13;

fn read_descriptor_header<B: ReadBytes>(reader: &mut B) -> Result<(u8, u32)> {
    let tag = reader.read_u8()?;

    let mut size = 0;

    for _ in 0..4 {
        let val = reader.read_u8()?;
        size = (size << 7) | u32::from(val & 0x7f);
        if val & 0x80 == 0 {
            break;
        }
    }

    Ok((tag, size))
}

/// Elementary stream descriptor atom.
///
/// The decoder configuration is decoded, but the descriptors are kept verbatim so that the atom
/// is written back unchanged.
#[derive(Clone, Debug, Default)]
pub struct EsdsAtom {
    pub version: u8,
    pub flags: u32,
    pub es_id: u16,
    pub object_type: u8,
    pub stream_type: u8,
    pub buffer_size: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    /// The decoder specific configuration. For AAC this is the AudioSpecificConfig.
    pub audio_specific_config: Box<[u8]>,
    /// The raw descriptors.
    descriptors: Box<[u8]>,
}

impl EsdsAtom {
    /// Get the raw descriptors.
    pub fn descriptors(&self) -> &[u8] {
        &self.descriptors
    }

    fn read_descriptors(&mut self) -> Result<()> {
        let mut reader = BufReader::new(&self.descriptors);

        let (mut tag, mut len) = read_descriptor_header(&mut reader)?;

        // The ES descriptor wrapping the decoder configuration is optional in practice.
        if tag == ES_DESCRIPTOR {
            if len < MIN_ES_DESCRIPTOR_LEN {
                return decode_error("isomp4 (esds): es descriptor is too small");
            }

            self.es_id = reader.read_be_u16()?;
            let es_flags = reader.read_u8()?;

            // Stream dependence flag.
            if es_flags & 0x80 != 0 {
                let _depends_on_es_id = reader.read_be_u16()?;
            }

            // URL flag.
            if es_flags & 0x40 != 0 {
                let url_len = reader.read_u8()?;
                reader.ignore_bytes(u64::from(url_len))?;
            }

            // OCR stream flag.
            if es_flags & 0x20 != 0 {
                let _ocr_es_id = reader.read_be_u16()?;
            }

            (tag, len) = read_descriptor_header(&mut reader)?;
        }

        if tag != DECODER_CONFIG_DESCRIPTOR {
            return decode_error("isomp4 (esds): missing decoder config descriptor");
        }

        if len < MIN_DECODER_CONFIG_LEN {
            return decode_error("isomp4 (esds): decoder config descriptor is too small");
        }

        self.object_type = reader.read_u8()?;
        self.stream_type = reader.read_u8()?;
        self.buffer_size = reader.read_be_u24()?;
        self.max_bitrate = reader.read_be_u32()?;
        self.avg_bitrate = reader.read_be_u32()?;

        if len == MIN_DECODER_CONFIG_LEN {
            debug!("esds has no decoder specific info");
            return Ok(());
        }

        let (tag, len) = read_descriptor_header(&mut reader)?;

        if tag != DECODER_SPECIFIC_DESCRIPTOR {
            return decode_error("isomp4 (esds): missing decoder specific descriptor");
        }

        if u64::from(len) > reader.bytes_available() {
            return decode_error("isomp4 (esds): decoder specific descriptor exceeds atom");
        }

        self.audio_specific_config = reader.read_boxed_slice_exact(len as usize)?;

        Ok(())
    }
}

impl AtomPayload for EsdsAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        // The ES descriptors occupy the rest of the atom.
        let ds_len = header
            .data_len()
            .ok_or(Error::DecodeError("isomp4 (esds): expected atom size to be known"))?;

        let descriptors = reader.read_boxed_slice_exact(ds_len as usize)?;

        let mut esds = EsdsAtom { version, flags, descriptors, ..Default::default() };
        esds.read_descriptors()?;

        Ok(esds)
    }

    fn payload_len(&self) -> u64 {
        4 + self.descriptors.len() as u64
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)?;
        writer.write_buf(&self.descriptors)?;
        Ok(())
    }
}
