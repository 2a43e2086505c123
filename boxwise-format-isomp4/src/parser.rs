// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive descent over size-prefixed atoms.

use boxwise_core::errors::{decode_error, Result};
use boxwise_core::io::{BufReader, MediaSource, ReadBytes, SourceStream, SourceStreamOptions};

use log::{trace, warn};

use crate::atoms::*;
use crate::find::{find, find_mut};

/// The default bound on the payload bytes buffered for a single leaf atom.
pub const DEFAULT_MAX_PAYLOAD_LEN: u64 = 64 * 1024 * 1024;

/// Options that control how a container is parsed.
#[derive(Copy, Clone, Debug)]
pub struct ParseOptions {
    /// Keep the raw bytes of unrecognised, and undecodable, leaf atoms nested within a container
    /// so that the tree can be serialized again. Top-level leaves are never retained.
    pub retain_unknown: bool,
    /// The maximum payload length of a leaf atom that will be read into memory.
    pub max_payload_len: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { retain_unknown: false, max_payload_len: DEFAULT_MAX_PAYLOAD_LEN }
    }
}

/// A parsed container.
#[derive(Clone, Debug)]
pub struct AtomTree {
    /// The top-level atoms.
    pub atoms: Vec<Atom>,
    /// The number of bytes preceding the container in the source.
    pub leading_offset: u64,
    /// The length of the source past the leading offset, if known.
    pub byte_len: Option<u64>,
}

impl AtomTree {
    /// Find an atom by a `/`-separated path of atom types.
    pub fn find(&self, path: &str) -> Option<&Atom> {
        find(&self.atoms, path)
    }

    /// Find an atom by a `/`-separated path of atom types, mutably.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut Atom> {
        find_mut(&mut self.atoms, path)
    }

    /// Get the first top-level atom of the given type.
    pub fn top_level(&self, atom_type: AtomType) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.atom_type == atom_type)
    }

    /// The position following the last top-level atom.
    pub fn end(&self) -> u64 {
        self.atoms.iter().map(|atom| atom.end()).max().unwrap_or(0)
    }
}

/// Parse all top-level atoms of the container following `leading_offset` bytes of the source.
///
/// Parsing stops at the first top-level atom whose header cannot be read. An error is returned
/// only if no top-level atom could be read.
pub fn open(
    source: Box<dyn MediaSource + '_>,
    leading_offset: u64,
    options: &ParseOptions,
) -> Result<AtomTree> {
    let stream_opts = SourceStreamOptions { base_offset: leading_offset, ..Default::default() };

    let mut stream = SourceStream::new(source, stream_opts)?;

    let byte_len = stream.byte_len();

    let mut parser = Parser { stream: &mut stream, options: *options };

    let atoms = parser.read_top_level(byte_len)?;

    Ok(AtomTree { atoms, leading_offset, byte_len })
}

/// Read a single atom, and all its children, from the current position of a stream. The atom
/// is treated as a top-level atom.
pub fn read_atom(stream: &mut SourceStream<'_>, options: &ParseOptions) -> Result<Atom> {
    let mut header = AtomHeader::read(stream)?;

    if header.atom_len().is_none() {
        match stream.byte_len() {
            Some(byte_len) => header.resolve_len(byte_len.saturating_sub(header.atom_pos()))?,
            None => return decode_error("isomp4: atom size is unknown"),
        }
    }

    let mut parser = Parser { stream, options: *options };

    let atom = parser.read_atom(header, None)?;
    let end = atom.end();

    parser.stream.seek(end)?;

    Ok(atom)
}

struct Parser<'a, 's> {
    stream: &'a mut SourceStream<'s>,
    options: ParseOptions,
}

impl<'s> Parser<'_, 's> {
    fn read_top_level_header(&mut self, pos: u64, byte_len: Option<u64>) -> Result<AtomHeader> {
        self.stream.seek(pos)?;

        let mut header = AtomHeader::read(&mut *self.stream)?;

        // An atom of size 0 spans the remainder of the source.
        if header.atom_len().is_none() {
            match byte_len {
                Some(byte_len) => header.resolve_len(byte_len - pos)?,
                None => return decode_error("isomp4: atom size is unknown"),
            }
        }

        Ok(header)
    }

    fn read_top_level(&mut self, byte_len: Option<u64>) -> Result<Vec<Atom>> {
        let mut atoms = Vec::new();
        let mut pos = 0;

        loop {
            if let Some(byte_len) = byte_len {
                if pos + u64::from(AtomHeader::HEADER_SIZE) > byte_len {
                    break;
                }
            }

            let header = match self.read_top_level_header(pos, byte_len) {
                Ok(header) => header,
                Err(err) if atoms.is_empty() => return Err(err),
                Err(err) => {
                    if !err.is_end_of_stream() {
                        warn!("isomp4: stopped reading top-level atoms at {}: {}", pos, err);
                    }
                    break;
                }
            };

            // An atom that overruns the source is not an atom, for example a trailing tag.
            if let (Some(byte_len), Some(atom_len)) = (byte_len, header.atom_len()) {
                if pos.saturating_add(atom_len.get()) > byte_len {
                    warn!(
                        "isomp4: atom {} at {} extends past the end of the source",
                        header.atom_type(),
                        pos
                    );
                    break;
                }
            }

            let atom = match self.read_atom(header, None) {
                Ok(atom) => atom,
                Err(err) if atoms.is_empty() => return Err(err),
                Err(err) => {
                    warn!("isomp4: stopped reading top-level atoms at {}: {}", pos, err);
                    break;
                }
            };

            pos = atom.end();
            atoms.push(atom);
        }

        if atoms.is_empty() {
            return decode_error("isomp4: no atoms found");
        }

        Ok(atoms)
    }

    /// Read the children of a parent atom spanning `pos..end`. Reading stops at the first child
    /// that cannot be read, and the bytes from there to `end` are returned as the remainder.
    fn read_children(
        &mut self,
        parent: AtomType,
        mut pos: u64,
        end: u64,
    ) -> (Vec<Atom>, Remainder) {
        let mut children = Vec::new();

        while pos < end {
            if end - pos < u64::from(AtomHeader::HEADER_SIZE) {
                warn!("isomp4: {} trailing bytes in atom {}", end - pos, parent);
                break;
            }

            let header = match self.read_child_header(pos) {
                Ok(header) => header,
                Err(err) => {
                    warn!("isomp4: failed to read child of atom {}: {}", parent, err);
                    break;
                }
            };

            let atom_len = match header.atom_len() {
                Some(atom_len) if atom_len.get() <= end - pos => atom_len.get(),
                Some(_) => {
                    warn!(
                        "isomp4: atom {} exceeds its parent {}",
                        header.atom_type(),
                        parent
                    );
                    break;
                }
                None => {
                    warn!(
                        "isomp4: atom {} of unknown size within {}",
                        header.atom_type(),
                        parent
                    );
                    break;
                }
            };

            match self.read_atom(header, Some(parent)) {
                Ok(atom) => children.push(atom),
                Err(err) => {
                    warn!("isomp4: failed to read atom {}: {}", header.atom_type(), err);
                    break;
                }
            }

            pos += atom_len;
        }

        let remainder = if pos < end { self.read_remainder(pos, end) } else { Remainder::None };

        (children, remainder)
    }

    fn read_child_header(&mut self, pos: u64) -> Result<AtomHeader> {
        self.stream.seek(pos)?;
        AtomHeader::read(&mut *self.stream)
    }

    /// Read the unparsed bytes `pos..end` at the end of a parent atom.
    fn read_remainder(&mut self, pos: u64, end: u64) -> Remainder {
        let len = end - pos;

        if self.options.retain_unknown && len <= self.options.max_payload_len {
            match self.read_range(pos, len) {
                Ok(raw) => return Remainder::Retained(raw),
                Err(err) => warn!("isomp4: failed to read {} bytes at {}: {}", len, pos, err),
            }
        }

        Remainder::Skipped(len)
    }

    fn read_range(&mut self, pos: u64, len: u64) -> Result<Box<[u8]>> {
        self.stream.seek(pos)?;
        Ok(self.stream.read_boxed_slice_exact(len as usize)?)
    }

    /// Read the atom following `header`. The size of the atom must be known.
    fn read_atom(&mut self, header: AtomHeader, parent: Option<AtomType>) -> Result<Atom> {
        let atom_type = header.atom_type();
        let pos = header.atom_pos();

        let size = match header.atom_len() {
            Some(size) => size.get(),
            None => return decode_error("isomp4: atom size is unknown"),
        };

        trace!("atom: type={} pos={} size={}", atom_type, pos, size);

        let mut atom = Atom {
            atom_type,
            pos,
            size,
            header_len: header.header_len() as u8,
            data: AtomData::Container,
            children: Vec::new(),
            remainder: Remainder::None,
        };

        let nested = parent.is_some();

        // Every child of an item list is an item, whatever its type.
        if parent == Some(AtomType::MetaList) {
            atom.data = self.read_leaf(header, nested, |reader, header| {
                MetaItemAtom::read(reader, header).map(AtomData::MetaItem)
            })?;
            return Ok(atom);
        }

        if atom_type.is_container() {
            let (children, remainder) =
                self.read_children(atom_type, pos + header.header_len(), atom.end());
            atom.children = children;
            atom.remainder = remainder;
            return Ok(atom);
        }

        match atom_type {
            AtomType::Meta => {
                atom.data = self.read_fields(&mut atom, header, nested, |reader, header| {
                    MetaAtom::read(reader, header).map(AtomData::Meta)
                })?;
            }
            AtomType::SampleDescription => {
                atom.data = self.read_fields(&mut atom, header, nested, |reader, header| {
                    EntryListAtom::read(reader, header).map(AtomData::SampleDescription)
                })?;
            }
            AtomType::DataReference => {
                atom.data = self.read_fields(&mut atom, header, nested, |reader, header| {
                    EntryListAtom::read(reader, header).map(AtomData::DataReference)
                })?;
            }
            AtomType::AudioSampleEntryMp4a => {
                atom.data = self.read_fields(&mut atom, header, nested, |reader, header| {
                    Mp4aAtom::read(reader, header).map(AtomData::Mp4a)
                })?;
            }
            _ => atom.data = self.read_known_leaf(header, nested)?,
        }

        Ok(atom)
    }

    /// Read a leaf atom by its type. Unrecognised atoms are only read if they are to be retained.
    fn read_known_leaf(&mut self, header: AtomHeader, nested: bool) -> Result<AtomData> {
        macro_rules! leaf {
            ($atom:ty, $variant:ident) => {
                self.read_leaf(header, nested, |reader, header| {
                    <$atom>::read(reader, header).map(AtomData::$variant)
                })
            };
        }

        match header.atom_type() {
            AtomType::FileType => leaf!(FtypAtom, FileType),
            AtomType::MovieHeader => leaf!(MvhdAtom, MovieHeader),
            AtomType::TrackHeader => leaf!(TkhdAtom, TrackHeader),
            AtomType::MediaHeader => leaf!(MdhdAtom, MediaHeader),
            AtomType::Handler => leaf!(HdlrAtom, Handler),
            AtomType::SoundMediaHeader => leaf!(SmhdAtom, SoundMediaHeader),
            AtomType::TimeToSample => leaf!(SttsAtom, TimeToSample),
            AtomType::SampleToChunk => leaf!(StscAtom, SampleToChunk),
            AtomType::SampleSize => leaf!(StszAtom, SampleSize),
            AtomType::ChunkOffset => leaf!(StcoAtom, ChunkOffset),
            AtomType::ChunkOffset64 => leaf!(Co64Atom, ChunkOffset64),
            AtomType::AudioSampleEntryAlac => leaf!(AlacAtom, Alac),
            AtomType::Esds => leaf!(EsdsAtom, Esds),
            _ => {
                if nested && self.options.retain_unknown {
                    Ok(AtomData::Unknown(self.read_raw(header)?))
                }
                else {
                    Ok(AtomData::Unknown(None))
                }
            }
        }
    }

    /// Read the payload of an atom, if it is within the payload length bound.
    fn read_raw(&mut self, header: AtomHeader) -> Result<Option<Box<[u8]>>> {
        let data_len = header.data_len().unwrap_or(0);

        if data_len > self.options.max_payload_len {
            warn!(
                "isomp4: atom {} payload of {} bytes exceeds the limit",
                header.atom_type(),
                data_len
            );
            return Ok(None);
        }

        self.stream.seek(header.atom_pos() + header.header_len())?;

        Ok(Some(self.stream.read_boxed_slice_exact(data_len as usize)?))
    }

    /// Read the payload of a leaf atom and decode it. The decoder is given a reader bounded to
    /// the payload. If decoding fails, or leaves payload bytes unread, the atom is opaque.
    fn read_leaf<F>(&mut self, header: AtomHeader, nested: bool, decode: F) -> Result<AtomData>
    where
        F: FnOnce(&mut BufReader<'_>, AtomHeader) -> Result<AtomData>,
    {
        let buf = match self.read_raw(header)? {
            Some(buf) => buf,
            None => return Ok(AtomData::Opaque(None)),
        };

        let mut reader = BufReader::new(&buf);

        let result = match decode(&mut reader, header) {
            Ok(_) if !reader.is_exhausted() => {
                decode_error("isomp4: atom payload has trailing bytes")
            }
            result => result,
        };

        match result {
            Ok(data) => Ok(data),
            Err(err) => {
                warn!("isomp4: failed to decode atom {}: {}", header.atom_type(), err);

                let retain = nested && self.options.retain_unknown;
                Ok(AtomData::Opaque(if retain { Some(buf) } else { None }))
            }
        }
    }

    /// Read the fields of an atom preceding its children directly from the stream, and then the
    /// children. If the fields fail to decode, the atom is opaque and has no children.
    fn read_fields<F>(
        &mut self,
        atom: &mut Atom,
        header: AtomHeader,
        nested: bool,
        decode: F,
    ) -> Result<AtomData>
    where
        F: FnOnce(&mut SourceStream<'s>, AtomHeader) -> Result<AtomData>,
    {
        let result = match decode(&mut *self.stream, header) {
            Ok(_) if self.stream.pos() > atom.end() => {
                decode_error("isomp4: atom fields exceed the atom size")
            }
            result => result,
        };

        match result {
            Ok(data) => {
                let fields_end = self.stream.pos();
                let (children, remainder) =
                    self.read_children(atom.atom_type, fields_end, atom.end());
                atom.children = children;
                atom.remainder = remainder;
                Ok(data)
            }
            Err(err) => {
                warn!("isomp4: failed to decode atom {}: {}", header.atom_type(), err);

                if nested && self.options.retain_unknown {
                    Ok(AtomData::Opaque(self.read_raw(header)?))
                }
                else {
                    Ok(AtomData::Opaque(None))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use boxwise_core::io::{CallbackSource, SourceCallbacks};

    use crate::fixtures::*;
    use crate::tags::{custom_item, genre_item, read_tags, text_item, track_disc_item};

    use super::*;

    fn parse_with(buf: Vec<u8>, options: &ParseOptions) -> Result<AtomTree> {
        open(Box::new(Cursor::new(buf)), 0, options)
    }

    fn parse(buf: Vec<u8>) -> AtomTree {
        parse_with(buf, &ParseOptions::default()).unwrap()
    }

    fn retaining() -> ParseOptions {
        ParseOptions { retain_unknown: true, ..Default::default() }
    }

    #[test]
    fn verify_round_trip() {
        let mut udta = udta(vec![
            text_item(AtomType::from(*b"\xa9nam"), "Title"),
            genre_item("Rock"),
            track_disc_item(AtomType::TrackNumberTag, 1, 9),
            custom_item("replaygain_track_gain", "-3.000000"),
            raw(AtomType::from(*b"covr"), 40, 0xd8),
        ]);
        udta.children.push(raw(AtomType::from(*b"XTRA"), 12, 7));

        let mut atoms = [
            ftyp(),
            moov(vec![mvhd(), alac_trak([1000, 1300]), udta]),
            raw(AtomType::MediaData, 1000, 0xaa),
        ];
        let buf = file(&mut atoms);

        let mut tree = parse_with(buf.clone(), &retaining()).unwrap();
        assert_eq!(tree.atoms.len(), 3);
        assert_eq!(tree.byte_len, Some(buf.len() as u64));

        let moov = &mut tree.atoms[1];
        let (pos, size) = (moov.pos as usize, moov.size as usize);
        assert_eq!(moov.serialize().unwrap(), &buf[pos..pos + size]);

        // Items that cannot be decoded are kept as they are.
        let covr = tree.find("moov/udta/meta/ilst/covr").unwrap();
        assert!(matches!(covr.data, AtomData::Opaque(Some(_))));

        let name = tree.find("moov/udta/meta/ilst/\u{a9}nam").unwrap();
        assert!(matches!(name.data, AtomData::MetaItem(_)));
    }

    #[test]
    fn verify_atom_positions() {
        let mut atoms = [ftyp(), moov(vec![mvhd(), alac_trak([0, 0])])];
        let buf = file(&mut atoms);

        let tree = parse(buf);

        let mvhd = tree.find("moov/mvhd").unwrap();
        assert_eq!(mvhd.pos, 28 + 8);

        let stsd = tree.find("moov/trak/mdia/minf/stbl/stsd").unwrap();
        assert!(matches!(stsd.data, AtomData::SampleDescription(_)));
        assert_eq!(stsd.children.len(), 1);
        assert_eq!(stsd.children[0].pos, stsd.pos + 16);

        match &stsd.children[0].data {
            AtomData::Alac(alac) => {
                assert_eq!(alac.sound_desc.num_channels, 2);
                assert!(alac.magic_cookie().is_some());
            }
            _ => panic!("expected an alac sample entry"),
        }
    }

    #[test]
    fn verify_unknown_atom_is_skipped() {
        let mut trak = alac_trak([0, 0]);
        trak.children.insert(0, raw(AtomType::from(*b"zzzz"), 20, 0x55));

        let mut atoms = [ftyp(), moov(vec![trak, mvhd()])];
        let buf = file(&mut atoms);

        let tree = parse(buf);

        let trak = tree.find("moov/trak").unwrap();
        assert_eq!(trak.children.len(), 3);
        assert!(matches!(trak.children[0].data, AtomData::Unknown(None)));
        assert_eq!(trak.children[0].size, 28);
        assert_eq!(trak.children[1].atom_type, AtomType::TrackHeader);

        assert!(tree.find("moov/mvhd").is_some());
    }

    #[test]
    fn verify_undecodable_atom_is_opaque() {
        // A sample size atom with a bad sample count.
        let stsz = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9, 0, 0, 0, 1];

        let mut stbl = Atom::new_container(AtomType::SampleTable);
        stbl.children.push(Atom::new(
            AtomType::SampleSize,
            AtomData::Unknown(Some(stsz.to_vec().into_boxed_slice())),
        ));
        stbl.children.push(raw(AtomType::ChunkOffset, 8, 0));

        let mut atoms = [ftyp(), moov(vec![stbl])];
        let buf = file(&mut atoms);

        let tree = parse_with(buf.clone(), &retaining()).unwrap();
        let stbl = tree.find("moov/stbl").unwrap();

        match &stbl.children[0].data {
            AtomData::Opaque(Some(raw)) => assert_eq!(&raw[..], &stsz),
            data => panic!("expected an opaque atom, got {:?}", data),
        }
        assert!(matches!(stbl.children[1].data, AtomData::ChunkOffset(_)));

        let tree = parse(buf);
        let stbl = tree.find("moov/stbl").unwrap();
        assert!(matches!(stbl.children[0].data, AtomData::Opaque(None)));
    }

    #[test]
    fn verify_child_exceeding_parent() {
        let mut buf = file(&mut [ftyp()]);
        // A moov of 24 bytes whose only child claims 32 bytes.
        buf.extend_from_slice(b"\0\0\0\x18moov\0\0\0\x20udta\0\0\0\0\0\0\0\0");
        buf.extend(file(&mut [raw(AtomType::MediaData, 4, 0)]));

        let tree = parse(buf.clone());
        assert_eq!(tree.atoms.len(), 3);
        assert!(tree.atoms[1].children.is_empty());
        assert_eq!(tree.atoms[1].remainder, Remainder::Skipped(16));
        assert_eq!(tree.atoms[2].atom_type, AtomType::MediaData);

        // The unread bytes are kept, so the movie atom is written back unchanged.
        let mut tree = parse_with(buf.clone(), &retaining()).unwrap();
        let moov = &mut tree.atoms[1];
        assert!(matches!(&moov.remainder, Remainder::Retained(raw) if raw.len() == 16));
        assert_eq!(moov.serialize().unwrap(), &buf[28..52]);
    }

    #[test]
    fn verify_trailing_bytes_in_parent() {
        let mut atoms = [ftyp(), moov(vec![mvhd()])];
        let mut buf = file(&mut atoms);

        // Grow the movie atom by 4 bytes that cannot hold a child.
        let moov_len = atoms[1].size as u32 + 4;
        buf[28..32].copy_from_slice(&moov_len.to_be_bytes());
        buf.extend_from_slice(&[0; 4]);

        let mut tree = parse_with(buf.clone(), &retaining()).unwrap();
        let moov = &mut tree.atoms[1];
        assert_eq!(moov.children.len(), 1);
        assert_eq!(moov.remainder, Remainder::Retained(vec![0; 4].into_boxed_slice()));
        assert_eq!(moov.serialize().unwrap(), &buf[28..]);
    }

    #[test]
    fn verify_top_level_overrun() {
        let mut buf = file(&mut [ftyp(), moov(vec![mvhd()])]);
        let container_len = buf.len() as u64;

        // A trailing ID3v1 tag is not an atom.
        let mut trailer = b"TAG".to_vec();
        trailer.resize(128, b' ');
        buf.extend(trailer);

        let tree = parse(buf);
        assert_eq!(tree.atoms.len(), 2);
        assert_eq!(tree.end(), container_len);

        // A truncated atom.
        let mut buf = file(&mut [ftyp(), raw(AtomType::MediaData, 100, 0xaa)]);
        buf.truncate(80);

        let tree = parse(buf);
        assert_eq!(tree.atoms.len(), 1);
        assert_eq!(tree.end(), 28);
    }

    #[test]
    fn verify_open_ended_atom() {
        let mut buf = file(&mut [ftyp()]);
        buf.extend_from_slice(b"\0\0\0\0mdat");
        buf.extend_from_slice(&[0xaa; 100]);

        let tree = parse(buf);
        assert_eq!(tree.atoms[1].atom_type, AtomType::MediaData);
        assert_eq!(tree.atoms[1].size, 108);
        assert_eq!(tree.end(), 28 + 108);
    }

    #[test]
    fn verify_truncated_top_level() {
        let mut buf = file(&mut [ftyp()]);
        buf.extend_from_slice(b"\0\0\0\x04bad!\0\0");

        let tree = parse(buf);
        assert_eq!(tree.atoms.len(), 1);

        assert!(parse_with(b"\0\0\0\x04bad!".to_vec(), &ParseOptions::default()).is_err());
        assert!(parse_with(Vec::new(), &ParseOptions::default()).is_err());
    }

    #[test]
    fn verify_leading_offset() {
        let mut buf = vec![0xff; 7];
        buf.extend(file(&mut [ftyp(), moov(vec![mvhd()])]));

        let tree = open(Box::new(Cursor::new(buf)), 7, &ParseOptions::default()).unwrap();
        assert_eq!(tree.leading_offset, 7);
        assert_eq!(tree.atoms[1].pos, 28);
        assert!(matches!(tree.atoms[0].data, AtomData::FileType(_)));
    }

    #[test]
    fn verify_payload_limit() {
        let mut atoms = [ftyp(), moov(vec![raw(AtomType::from(*b"big!"), 64, 0)])];
        let buf = file(&mut atoms);

        let options = ParseOptions { retain_unknown: true, max_payload_len: 32 };
        let tree = parse_with(buf, &options).unwrap();

        let big = &tree.atoms[1].children[0];
        assert!(matches!(big.data, AtomData::Unknown(None)));
        assert_eq!(big.size, 72);
    }

    #[test]
    fn verify_read_atom() {
        let buf = file(&mut [ftyp(), moov(vec![mvhd()])]);
        let source = Box::new(Cursor::new(buf));

        let mut stream = SourceStream::new(source, Default::default()).unwrap();

        let ftyp = read_atom(&mut stream, &ParseOptions::default()).unwrap();
        assert_eq!(ftyp.atom_type, AtomType::FileType);

        let moov = read_atom(&mut stream, &ParseOptions::default()).unwrap();
        assert_eq!(moov.pos, 28);
        assert_eq!(moov.children[0].atom_type, AtomType::MovieHeader);
    }

    /// Callbacks over a buffer that do not report the length of the source.
    struct StreamCallbacks {
        data: Vec<u8>,
        pos: u64,
    }

    impl SourceCallbacks for StreamCallbacks {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let start = (self.pos as usize).min(self.data.len());
            let len = buf.len().min(self.data.len() - start);
            buf[..len].copy_from_slice(&self.data[start..start + len]);
            self.pos += len as u64;
            Ok(len)
        }

        fn seek(&mut self, pos: u64) -> std::io::Result<()> {
            self.pos = pos;
            Ok(())
        }

        fn tell(&mut self) -> std::io::Result<u64> {
            Ok(self.pos)
        }
    }

    fn open_callbacks(data: Vec<u8>, leading_offset: u64) -> Result<AtomTree> {
        let source = CallbackSource::new(StreamCallbacks { data, pos: 0 });
        open(Box::new(source), leading_offset, &ParseOptions::default())
    }

    #[test]
    fn verify_unknown_length_source() {
        let items = vec![text_item(AtomType::from(*b"\xa9ART"), "Artist")];

        let mut buf = b"junk".to_vec();
        buf.extend(file(&mut [
            ftyp(),
            moov(vec![mvhd(), alac_trak([0, 0]), udta(items)]),
            raw(AtomType::MediaData, 10, 0xaa),
        ]));

        let tree = open_callbacks(buf, 4).unwrap();
        assert_eq!(tree.byte_len, None);

        let types: Vec<AtomType> = tree.atoms.iter().map(|atom| atom.atom_type).collect();
        assert_eq!(types, [AtomType::FileType, AtomType::Movie, AtomType::MediaData]);
        assert_eq!(tree.atoms[1].pos, 28);
        assert!(tree.find("moov/trak/mdia/minf/stbl/stsz").is_some());
        assert_eq!(read_tags(&tree.atoms).find("artist"), Some("Artist"));

        // Without a length, an atom of size 0 cannot be resolved.
        let mut buf = file(&mut [ftyp()]);
        buf.extend_from_slice(b"\0\0\0\0mdat");
        buf.extend_from_slice(&[0xaa; 16]);

        let tree = open_callbacks(buf.clone(), 0).unwrap();
        assert_eq!(tree.atoms.len(), 1);
        assert_eq!(tree.atoms[0].atom_type, AtomType::FileType);

        assert!(open_callbacks(buf[28..].to_vec(), 0).is_err());
    }
}
