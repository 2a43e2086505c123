// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::num::NonZero;

use boxwise_core::errors::{decode_error, unsupported_error, Result};
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::fourcc::FourCc;

pub(crate) mod alac;
pub(crate) mod co64;
pub(crate) mod esds;
pub(crate) mod ftyp;
pub(crate) mod hdlr;
pub(crate) mod ilst;
pub(crate) mod mdhd;
pub(crate) mod meta;
pub(crate) mod mp4a;
pub(crate) mod mvhd;
pub(crate) mod smhd;
pub(crate) mod stco;
pub(crate) mod stsc;
pub(crate) mod stsd;
pub(crate) mod stsz;
pub(crate) mod stts;
pub(crate) mod tkhd;

pub use self::meta::MetaAtom;
pub use alac::AlacAtom;
pub use co64::Co64Atom;
pub use esds::EsdsAtom;
pub use ftyp::FtypAtom;
pub use hdlr::HdlrAtom;
pub use ilst::{MetaItemAtom, MetaValue};
pub use mdhd::MdhdAtom;
pub use mp4a::Mp4aAtom;
pub use mvhd::MvhdAtom;
pub use smhd::SmhdAtom;
pub use stco::StcoAtom;
pub use stsc::{SampleToChunkEntry, StscAtom};
pub use stsd::{EntryListAtom, SoundDescription};
pub use stsz::{SampleSize, StszAtom};
pub use stts::{SampleDurationEntry, SttsAtom};
pub use tkhd::TkhdAtom;

macro_rules! atom_types {
    ($($name:ident => $code:literal,)*) => {
        /// Atom types.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum AtomType {
            $($name,)*
            Other([u8; 4]),
        }

        impl From<[u8; 4]> for AtomType {
            fn from(val: [u8; 4]) -> Self {
                match &val {
                    $($code => AtomType::$name,)*
                    _ => AtomType::Other(val),
                }
            }
        }

        impl AtomType {
            /// Get the four character code of the atom type.
            pub fn fourcc(&self) -> FourCc {
                match self {
                    $(AtomType::$name => FourCc::new(*$code),)*
                    AtomType::Other(val) => FourCc::new(*val),
                }
            }
        }
    };
}

atom_types! {
    AudioSampleEntryAlac => b"alac",
    AudioSampleEntryMp4a => b"mp4a",
    ChunkOffset => b"stco",
    ChunkOffset64 => b"co64",
    CustomGenreTag => b"\xa9gen",
    DataInfo => b"dinf",
    DataReference => b"dref",
    DiskNumberTag => b"disk",
    Edit => b"edts",
    Esds => b"esds",
    FileType => b"ftyp",
    Free => b"free",
    FreeFormTag => b"----",
    GenreTag => b"gnre",
    Handler => b"hdlr",
    LyricsTag => b"\xa9lyr",
    Media => b"mdia",
    MediaData => b"mdat",
    MediaHeader => b"mdhd",
    MediaInfo => b"minf",
    Meta => b"meta",
    MetaList => b"ilst",
    MetaTagData => b"data",
    MetaTagMeaning => b"mean",
    MetaTagName => b"name",
    Movie => b"moov",
    MovieHeader => b"mvhd",
    SampleDescription => b"stsd",
    SampleSize => b"stsz",
    SampleTable => b"stbl",
    SampleToChunk => b"stsc",
    Skip => b"skip",
    SoundMediaHeader => b"smhd",
    TimeToSample => b"stts",
    Track => b"trak",
    TrackHeader => b"tkhd",
    TrackNumberTag => b"trkn",
    TrackReference => b"tref",
    UserData => b"udta",
    Wide => b"wide",
}

impl AtomType {
    /// Returns `true` if the atom type is a pure container whose payload is only child atoms.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            AtomType::Movie
                | AtomType::Track
                | AtomType::Media
                | AtomType::MediaInfo
                | AtomType::DataInfo
                | AtomType::SampleTable
                | AtomType::UserData
                | AtomType::TrackReference
                | AtomType::Edit
                | AtomType::MetaList
        )
    }

    /// Returns `true` if the atom type marks unused space.
    pub fn is_free_space(&self) -> bool {
        matches!(self, AtomType::Free | AtomType::Skip)
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fourcc(), f)
    }
}

/// Common atom header.
#[derive(Copy, Clone, Debug)]
pub struct AtomHeader {
    /// The atom type.
    atom_type: AtomType,
    /// The size of all read headers.
    header_len: u8,
    /// The position of the atom.
    atom_pos: u64,
    /// The total size of the atom including all headers. `None` if the atom spans the remainder
    /// of the stream.
    atom_len: Option<NonZero<u64>>,
}

impl AtomHeader {
    /// Size of a standard atom header.
    pub const HEADER_SIZE: u8 = 8;
    /// Size of a standard atom header with a 64-bit size.
    pub const LARGE_HEADER_SIZE: u8 = AtomHeader::HEADER_SIZE + 8;

    /// Create a header for an atom of known size.
    pub fn new(atom_type: AtomType, atom_pos: u64, atom_len: u64, header_len: u8) -> Self {
        AtomHeader { atom_type, header_len, atom_pos, atom_len: NonZero::new(atom_len) }
    }

    /// Reads an atom header from the provided `ReadBytes`.
    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<AtomHeader> {
        let atom_pos = reader.pos();

        let atom_len = u64::from(reader.read_be_u32()?);
        let atom_type = AtomType::from(reader.read_quad_bytes()?);

        let (header_len, atom_len) = match atom_len {
            0 => {
                // An atom size of 0 indicates the atom spans the remainder of the stream or file.
                (AtomHeader::HEADER_SIZE, None)
            }
            1 => {
                // An atom size of 1 indicates a 64-bit atom size should be read.
                let large_atom_len = reader.read_be_u64()?;

                // The atom size should be atleast the size of the header.
                if large_atom_len < u64::from(AtomHeader::LARGE_HEADER_SIZE) {
                    return decode_error("isomp4: atom size is invalid");
                }

                (AtomHeader::LARGE_HEADER_SIZE, NonZero::new(large_atom_len))
            }
            _ => {
                // The atom size should be atleast the size of the header.
                if atom_len < u64::from(AtomHeader::HEADER_SIZE) {
                    return decode_error("isomp4: atom size is invalid");
                }

                (AtomHeader::HEADER_SIZE, NonZero::new(atom_len))
            }
        };

        Ok(AtomHeader { atom_type, atom_pos, atom_len, header_len })
    }

    /// Get the atom type.
    pub fn atom_type(&self) -> AtomType {
        self.atom_type
    }

    /// Get the atom position.
    pub fn atom_pos(&self) -> u64 {
        self.atom_pos
    }

    /// If known, get the total atom size.
    pub fn atom_len(&self) -> Option<NonZero<u64>> {
        self.atom_len
    }

    /// Get the atom's header size.
    pub fn header_len(&self) -> u64 {
        u64::from(self.header_len)
    }

    /// If the atom size is known, get the total payload data size.
    pub fn data_len(&self) -> Option<u64> {
        self.atom_len.map(|atom_len| atom_len.get() - u64::from(self.header_len))
    }

    /// Resolve an atom that spans the remainder of the stream to a known size.
    pub fn resolve_len(&mut self, atom_len: u64) -> Result<()> {
        if atom_len < u64::from(self.header_len) {
            return decode_error("isomp4: atom size is invalid");
        }
        self.atom_len = NonZero::new(atom_len);
        Ok(())
    }

    /// Read the version and flags extended atom header fields.
    ///
    /// On success, consumes 4 bytes from the payload size.
    pub fn read_extended_header<B: ReadBytes>(&mut self, reader: &mut B) -> Result<(u8, u32)> {
        // If the payload size is known, then check that 4 bytes of the payload is available to be
        // read as the extended header.
        if let Some(data_len) = self.data_len() {
            if data_len < 4 {
                return decode_error("isomp4: atom too small for extended header");
            }
        }

        // Read the extended header fields.
        let header = (reader.read_u8()?, reader.read_be_u24()?);
        // Adjust the header size.
        self.header_len += 4;

        Ok(header)
    }
}

/// Write an atom header. A header length of 16 selects the 64-bit size form.
pub fn write_header<W: WriteBytes>(
    writer: &mut W,
    atom_type: AtomType,
    atom_len: u64,
    header_len: u8,
) -> Result<()> {
    if header_len == AtomHeader::LARGE_HEADER_SIZE {
        writer.write_be_u32(1)?;
        writer.write_buf(&atom_type.fourcc().get())?;
        writer.write_be_u64(atom_len)?;
    }
    else {
        let atom_len = match u32::try_from(atom_len) {
            Ok(atom_len) => atom_len,
            Err(_) => return decode_error("isomp4: atom size does not fit a 32-bit header"),
        };
        writer.write_be_u32(atom_len)?;
        writer.write_buf(&atom_type.fourcc().get())?;
    }
    Ok(())
}

/// Write the version and flags extended atom header fields.
pub fn write_extended_header<W: WriteBytes>(writer: &mut W, version: u8, flags: u32) -> Result<()> {
    writer.write_u8(version)?;
    writer.write_be_u24(flags)?;
    Ok(())
}

/// The typed payload of an atom.
pub trait AtomPayload: Sized {
    /// Read the payload. For leaf atoms the reader is bounded to the payload of the atom. For
    /// atoms with children, only the fields preceding the children are read.
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self>;

    /// The length of the payload when written, excluding the atom header and any children.
    fn payload_len(&self) -> u64;

    /// Write the payload.
    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()>;
}

/// The payload of an atom.
#[derive(Clone, Debug)]
pub enum AtomData {
    /// A pure container. The value of the atom is its children.
    Container,
    Meta(MetaAtom),
    FileType(FtypAtom),
    MovieHeader(MvhdAtom),
    TrackHeader(TkhdAtom),
    MediaHeader(MdhdAtom),
    Handler(HdlrAtom),
    SoundMediaHeader(SmhdAtom),
    SampleDescription(EntryListAtom),
    DataReference(EntryListAtom),
    TimeToSample(SttsAtom),
    SampleToChunk(StscAtom),
    SampleSize(StszAtom),
    ChunkOffset(StcoAtom),
    ChunkOffset64(Co64Atom),
    Alac(AlacAtom),
    Mp4a(Mp4aAtom),
    Esds(EsdsAtom),
    /// An item of the `ilst` atom.
    MetaItem(MetaItemAtom),
    /// A known atom whose payload failed to decode. The raw payload is kept if it was retained.
    Opaque(Option<Box<[u8]>>),
    /// An unrecognised atom. The raw payload is kept if it was retained.
    Unknown(Option<Box<[u8]>>),
}

impl AtomData {
    /// The length of the payload when written, excluding the atom header and any children.
    /// `None` if the payload was not retained.
    pub fn payload_len(&self) -> Option<u64> {
        let len = match self {
            AtomData::Container => 0,
            AtomData::Meta(atom) => atom.payload_len(),
            AtomData::FileType(atom) => atom.payload_len(),
            AtomData::MovieHeader(atom) => atom.payload_len(),
            AtomData::TrackHeader(atom) => atom.payload_len(),
            AtomData::MediaHeader(atom) => atom.payload_len(),
            AtomData::Handler(atom) => atom.payload_len(),
            AtomData::SoundMediaHeader(atom) => atom.payload_len(),
            AtomData::SampleDescription(atom) => atom.payload_len(),
            AtomData::DataReference(atom) => atom.payload_len(),
            AtomData::TimeToSample(atom) => atom.payload_len(),
            AtomData::SampleToChunk(atom) => atom.payload_len(),
            AtomData::SampleSize(atom) => atom.payload_len(),
            AtomData::ChunkOffset(atom) => atom.payload_len(),
            AtomData::ChunkOffset64(atom) => atom.payload_len(),
            AtomData::Alac(atom) => atom.payload_len(),
            AtomData::Mp4a(atom) => atom.payload_len(),
            AtomData::Esds(atom) => atom.payload_len(),
            AtomData::MetaItem(atom) => atom.payload_len(),
            AtomData::Opaque(raw) | AtomData::Unknown(raw) => raw.as_ref()?.len() as u64,
        };
        Some(len)
    }

    /// Returns `true` if an atom with this payload may have children.
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            AtomData::Container
                | AtomData::Meta(_)
                | AtomData::SampleDescription(_)
                | AtomData::DataReference(_)
                | AtomData::Mp4a(_)
        )
    }

    /// Write the payload.
    pub fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        match self {
            AtomData::Container => Ok(()),
            AtomData::Meta(atom) => atom.write(writer),
            AtomData::FileType(atom) => atom.write(writer),
            AtomData::MovieHeader(atom) => atom.write(writer),
            AtomData::TrackHeader(atom) => atom.write(writer),
            AtomData::MediaHeader(atom) => atom.write(writer),
            AtomData::Handler(atom) => atom.write(writer),
            AtomData::SoundMediaHeader(atom) => atom.write(writer),
            AtomData::SampleDescription(atom) => atom.write(writer),
            AtomData::DataReference(atom) => atom.write(writer),
            AtomData::TimeToSample(atom) => atom.write(writer),
            AtomData::SampleToChunk(atom) => atom.write(writer),
            AtomData::SampleSize(atom) => atom.write(writer),
            AtomData::ChunkOffset(atom) => atom.write(writer),
            AtomData::ChunkOffset64(atom) => atom.write(writer),
            AtomData::Alac(atom) => atom.write(writer),
            AtomData::Mp4a(atom) => atom.write(writer),
            AtomData::Esds(atom) => atom.write(writer),
            AtomData::MetaItem(atom) => atom.write(writer),
            AtomData::Opaque(Some(raw)) | AtomData::Unknown(Some(raw)) => {
                writer.write_buf(raw)?;
                Ok(())
            }
            AtomData::Opaque(None) | AtomData::Unknown(None) => {
                unsupported_error("isomp4: cannot write an atom whose payload was not retained")
            }
        }
    }
}

/// Bytes at the end of an atom that could not be read as children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Remainder {
    /// The children cover the atom.
    #[default]
    None,
    /// The unread bytes.
    Retained(Box<[u8]>),
    /// The number of unread bytes. The atom cannot be written.
    Skipped(u64),
}

impl Remainder {
    /// The number of bytes not covered by the children.
    pub fn len(&self) -> u64 {
        match self {
            Remainder::None => 0,
            Remainder::Retained(raw) => raw.len() as u64,
            Remainder::Skipped(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node of the atom tree.
#[derive(Clone, Debug)]
pub struct Atom {
    pub atom_type: AtomType,
    /// Position of the atom relative to the start of the container.
    pub pos: u64,
    /// Declared size of the atom, including the header.
    pub size: u64,
    /// Length of the header, 8 or 16.
    pub header_len: u8,
    pub data: AtomData,
    pub children: Vec<Atom>,
    /// Bytes following the last child that are not themselves a child.
    pub remainder: Remainder,
}

impl Atom {
    /// Create a new atom without children. The size is computed from the payload.
    pub fn new(atom_type: AtomType, data: AtomData) -> Atom {
        let mut atom = Atom {
            atom_type,
            pos: 0,
            size: 0,
            header_len: AtomHeader::HEADER_SIZE,
            data,
            children: Vec::new(),
            remainder: Remainder::None,
        };
        atom.update_size();
        atom
    }

    /// Create a new, empty, pure container.
    pub fn new_container(atom_type: AtomType) -> Atom {
        Atom::new(atom_type, AtomData::Container)
    }

    /// Get the header of the atom.
    pub fn header(&self) -> AtomHeader {
        AtomHeader::new(self.atom_type, self.pos, self.size, self.header_len)
    }

    /// The length of the atom excluding the header.
    pub fn data_len(&self) -> u64 {
        self.size.saturating_sub(u64::from(self.header_len))
    }

    /// The position following the atom.
    pub fn end(&self) -> u64 {
        self.pos.saturating_add(self.size)
    }

    /// Get the first child of the given type.
    pub fn child(&self, atom_type: AtomType) -> Option<&Atom> {
        self.children.iter().find(|child| child.atom_type == atom_type)
    }

    /// Get the first child of the given type mutably.
    pub fn child_mut(&mut self, atom_type: AtomType) -> Option<&mut Atom> {
        self.children.iter_mut().find(|child| child.atom_type == atom_type)
    }

    /// Recompute the declared size of the atom, and all its children, bottom-up. Returns the new
    /// size.
    ///
    /// An atom whose payload was not retained keeps its declared payload length. The remainder
    /// always follows the children.
    pub fn update_size(&mut self) -> u64 {
        let payload_len = self.data.payload_len().unwrap_or_else(|| self.data_len());

        let children_len: u64 = self.children.iter_mut().map(|child| child.update_size()).sum();

        let body_len = payload_len + children_len + self.remainder.len();

        let fits_small = body_len + u64::from(AtomHeader::HEADER_SIZE) <= u64::from(u32::MAX);

        if self.header_len != AtomHeader::LARGE_HEADER_SIZE && fits_small {
            self.header_len = AtomHeader::HEADER_SIZE;
        }
        else {
            self.header_len = AtomHeader::LARGE_HEADER_SIZE;
        }

        self.size = u64::from(self.header_len) + body_len;
        self.size
    }

    /// Write the atom, and all its children. The declared sizes must be current.
    pub fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        if let Remainder::Skipped(_) = self.remainder {
            return unsupported_error("isomp4: cannot write an atom that was not fully read");
        }

        let start = writer.pos();

        write_header(writer, self.atom_type, self.size, self.header_len)?;

        self.data.write(writer)?;

        for child in &self.children {
            child.write(writer)?;
        }

        if let Remainder::Retained(raw) = &self.remainder {
            writer.write_buf(raw)?;
        }

        if writer.pos() - start != self.size {
            return decode_error("isomp4: written atom length does not match its declared size");
        }

        Ok(())
    }

    /// Recompute sizes and serialize the atom to a new buffer.
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        let len = self.update_size();

        let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        self.write(&mut buf)?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use boxwise_core::io::BufReader;

    use super::*;

    #[test]
    fn verify_atom_type_codes() {
        assert_eq!(AtomType::from(*b"moov"), AtomType::Movie);
        assert_eq!(AtomType::from(*b"\xa9gen"), AtomType::CustomGenreTag);
        assert_eq!(AtomType::from(*b"MOOV"), AtomType::Other(*b"MOOV"));
        assert_eq!(AtomType::MetaList.fourcc(), FourCc::new(*b"ilst"));
        assert_eq!(AtomType::Other(*b"abcd").fourcc(), FourCc::new(*b"abcd"));
        assert!(AtomType::SampleTable.is_container());
        assert!(!AtomType::Meta.is_container());
    }

    #[test]
    fn verify_header_read() {
        let data = [0, 0, 0, 16, b'f', b'r', b'e', b'e'];
        let header = AtomHeader::read(&mut BufReader::new(&data)).unwrap();
        assert_eq!(header.atom_type(), AtomType::Free);
        assert_eq!(header.data_len(), Some(8));

        let data = [0, 0, 0, 1, b'm', b'd', b'a', b't', 0, 0, 0, 0, 0, 0, 0, 24];
        let header = AtomHeader::read(&mut BufReader::new(&data)).unwrap();
        assert_eq!(header.header_len(), 16);
        assert_eq!(header.data_len(), Some(8));

        let data = [0, 0, 0, 0, b'm', b'd', b'a', b't'];
        let header = AtomHeader::read(&mut BufReader::new(&data)).unwrap();
        assert!(header.atom_len().is_none());

        let data = [0, 0, 0, 7, b'f', b'r', b'e', b'e'];
        assert!(AtomHeader::read(&mut BufReader::new(&data)).is_err());
    }

    #[test]
    fn verify_update_size_and_serialize() {
        let mut udta = Atom::new_container(AtomType::UserData);
        let mut ilst = Atom::new_container(AtomType::MetaList);
        let raw = vec![1, 2, 3].into_boxed_slice();
        ilst.children.push(Atom::new(AtomType::Other(*b"abcd"), AtomData::Unknown(Some(raw))));
        udta.children.push(ilst);

        let buf = udta.serialize().unwrap();

        assert_eq!(udta.size, 27);
        assert_eq!(udta.children[0].size, 19);
        assert_eq!(buf.len(), 27);
        assert_eq!(&buf[..8], &[0, 0, 0, 27, b'u', b'd', b't', b'a']);
        assert_eq!(&buf[16..27], &[0, 0, 0, 11, b'a', b'b', b'c', b'd', 1, 2, 3]);
    }

    #[test]
    fn verify_unretained_payload_is_unsupported() {
        let mut atom = Atom::new_container(AtomType::UserData);
        let mut unknown = Atom::new(AtomType::Other(*b"xxxx"), AtomData::Unknown(None));
        unknown.size = 20;
        atom.children.push(unknown);

        // The declared payload length is preserved when sizing.
        assert_eq!(atom.update_size(), 28);

        let err = atom.serialize().unwrap_err();
        assert!(matches!(err, boxwise_core::errors::Error::Unsupported(_)));
    }

    #[test]
    fn verify_remainder() {
        let mut udta = Atom::new_container(AtomType::UserData);
        udta.children.push(Atom::new_container(AtomType::MetaList));
        udta.remainder = Remainder::Retained(vec![0; 4].into_boxed_slice());

        // The remainder is written after the children.
        let buf = udta.serialize().unwrap();
        assert_eq!(udta.size, 20);
        assert_eq!(&buf[8..16], &[0, 0, 0, 8, b'i', b'l', b's', b't']);
        assert_eq!(&buf[16..], &[0, 0, 0, 0]);

        udta.remainder = Remainder::Skipped(100);
        assert_eq!(udta.update_size(), 116);

        let mut moov = Atom::new_container(AtomType::Movie);
        moov.children.push(udta);

        let err = moov.serialize().unwrap_err();
        assert!(matches!(err, boxwise_core::errors::Error::Unsupported(_)));
    }
}
