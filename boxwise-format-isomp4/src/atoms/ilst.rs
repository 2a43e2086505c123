// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Items of the iTunes metadata list (`ilst`) atom.
//!
//! Every child of `ilst` is an item. The type of the item is its tag code, and its value is stored
//! in a nested `data` atom. Freeform items (`----`) additionally carry `mean` and `name` atoms
//! that together identify the tag.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};
use smallvec::SmallVec;

use crate::atoms::{write_header, AtomHeader, AtomPayload, AtomType};

/// Data type indicator of a data atom holding implicitly typed big-endian values.
pub const DATA_TYPE_IMPLICIT: u32 = 0;
/// Data type indicator of a data atom holding UTF-8 text.
pub const DATA_TYPE_UTF8: u32 = 1;
/// Data type indicator of a data atom holding big-endian signed integers.
pub const DATA_TYPE_SIGNED_INT: u32 = 21;

/// The size of the header and fields preceding the value of a `data` atom.
const DATA_ATOM_FIXED_LEN: u64 = 16;
/// The size of the header and fields preceding the string of a `mean` or `name` atom.
const STRING_ATOM_FIXED_LEN: u64 = 12;

/// The value of a metadata item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaValue {
    /// An array of big-endian 16-bit values, e.g., the genre index or track number.
    Values(SmallVec<[u16; 3]>),
    /// UTF-8 text.
    Text(String),
    /// A freeform item identified by a namespace and name.
    Custom { mean: String, name: String, text: String },
}

/// A metadata item atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaItemAtom {
    /// The version and flags of the `data` atom. The low byte of the flags is the data type.
    pub data_flags: u32,
    /// The locale field of the `data` atom.
    pub locale: u32,
    pub value: MetaValue,
}

impl MetaItemAtom {
    /// Create a text item.
    pub fn text(text: &str) -> Self {
        MetaItemAtom {
            data_flags: DATA_TYPE_UTF8,
            locale: 0,
            value: MetaValue::Text(text.to_string()),
        }
    }

    /// Create an item holding an array of 16-bit values.
    pub fn values(values: &[u16]) -> Self {
        MetaItemAtom {
            data_flags: DATA_TYPE_IMPLICIT,
            locale: 0,
            value: MetaValue::Values(SmallVec::from_slice(values)),
        }
    }

    /// Create a freeform item.
    pub fn custom(mean: &str, name: &str, text: &str) -> Self {
        MetaItemAtom {
            data_flags: DATA_TYPE_UTF8,
            locale: 0,
            value: MetaValue::Custom {
                mean: mean.to_string(),
                name: name.to_string(),
                text: text.to_string(),
            },
        }
    }

    /// The name of a freeform item.
    pub fn custom_name(&self) -> Option<&str> {
        match &self.value {
            MetaValue::Custom { name, .. } => Some(name),
            _ => None,
        }
    }

    fn data_len(&self) -> u64 {
        match &self.value {
            MetaValue::Values(values) => 2 * values.len() as u64,
            MetaValue::Text(text) => text.len() as u64,
            MetaValue::Custom { text, .. } => text.len() as u64,
        }
    }
}

/// Read the header of a nested atom, checking its type and that it uses the 32-bit size form.
fn read_nested_header<B: ReadBytes>(
    reader: &mut B,
    atom_type: AtomType,
    min_len: u64,
) -> Result<u64> {
    let header = AtomHeader::read(reader)?;

    if header.atom_type() != atom_type {
        return decode_error("isomp4 (ilst): unexpected atom in metadata item");
    }

    if header.header_len() != u64::from(AtomHeader::HEADER_SIZE) {
        return decode_error("isomp4 (ilst): unexpected 64-bit atom in metadata item");
    }

    match header.atom_len() {
        Some(len) if len.get() >= min_len => Ok(len.get() - min_len),
        _ => decode_error("isomp4 (ilst): nested atom too small"),
    }
}

/// Read a `mean` or `name` atom.
fn read_string_atom<B: ReadBytes>(reader: &mut B, atom_type: AtomType) -> Result<String> {
    let len = read_nested_header(reader, atom_type, STRING_ATOM_FIXED_LEN)?;

    if reader.read_be_u32()? != 0 {
        return decode_error("isomp4 (ilst): unexpected version or flags");
    }

    let buf = reader.read_boxed_slice_exact(len as usize)?;

    match String::from_utf8(buf.into_vec()) {
        Ok(value) => Ok(value),
        Err(_) => decode_error("isomp4 (ilst): invalid utf-8 name"),
    }
}

/// Read a `data` atom, returning the flags, locale, and value bytes.
fn read_data_atom<B: ReadBytes>(reader: &mut B) -> Result<(u32, u32, Box<[u8]>)> {
    let len = read_nested_header(reader, AtomType::MetaTagData, DATA_ATOM_FIXED_LEN)?;

    let data_flags = reader.read_be_u32()?;
    let locale = reader.read_be_u32()?;

    let data = reader.read_boxed_slice_exact(len as usize)?;

    Ok((data_flags, locale, data))
}

fn parse_text(data: Box<[u8]>) -> Result<String> {
    match String::from_utf8(data.into_vec()) {
        Ok(text) => Ok(text),
        Err(_) => decode_error("isomp4 (ilst): invalid utf-8 text"),
    }
}

fn parse_values(data: &[u8]) -> Result<SmallVec<[u16; 3]>> {
    if data.len() % 2 != 0 {
        return decode_error("isomp4 (ilst): odd length value array");
    }

    Ok(data.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect())
}

impl AtomPayload for MetaItemAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        if header.atom_type() == AtomType::FreeFormTag {
            let mean = read_string_atom(reader, AtomType::MetaTagMeaning)?;
            let name = read_string_atom(reader, AtomType::MetaTagName)?;

            let (data_flags, locale, data) = read_data_atom(reader)?;

            if data_flags & 0xff != DATA_TYPE_UTF8 {
                return decode_error("isomp4 (ilst): freeform item is not text");
            }

            let text = parse_text(data)?;

            return Ok(MetaItemAtom {
                data_flags,
                locale,
                value: MetaValue::Custom { mean, name, text },
            });
        }

        let (data_flags, locale, data) = read_data_atom(reader)?;

        let value = match data_flags & 0xff {
            DATA_TYPE_IMPLICIT | DATA_TYPE_SIGNED_INT => MetaValue::Values(parse_values(&data)?),
            DATA_TYPE_UTF8 => MetaValue::Text(parse_text(data)?),
            _ => return decode_error("isomp4 (ilst): unsupported data type"),
        };

        Ok(MetaItemAtom { data_flags, locale, value })
    }

    fn payload_len(&self) -> u64 {
        let names_len = match &self.value {
            MetaValue::Custom { mean, name, .. } => {
                2 * STRING_ATOM_FIXED_LEN + mean.len() as u64 + name.len() as u64
            }
            _ => 0,
        };

        names_len + DATA_ATOM_FIXED_LEN + self.data_len()
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        if let MetaValue::Custom { mean, name, .. } = &self.value {
            for (atom_type, value) in
                [(AtomType::MetaTagMeaning, mean), (AtomType::MetaTagName, name)]
            {
                let len = STRING_ATOM_FIXED_LEN + value.len() as u64;
                write_header(writer, atom_type, len, AtomHeader::HEADER_SIZE)?;
                writer.write_be_u32(0)?;
                writer.write_buf(value.as_bytes())?;
            }
        }

        let len = DATA_ATOM_FIXED_LEN + self.data_len();
        write_header(writer, AtomType::MetaTagData, len, AtomHeader::HEADER_SIZE)?;
        writer.write_be_u32(self.data_flags)?;
        writer.write_be_u32(self.locale)?;

        match &self.value {
            MetaValue::Values(values) => {
                for value in values {
                    writer.write_be_u16(*value)?;
                }
            }
            MetaValue::Text(text) | MetaValue::Custom { text, .. } => {
                writer.write_buf(text.as_bytes())?;
            }
        }
        Ok(())
    }
}
