// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory containers for tests.

use crate::atoms::*;
use crate::fourcc::FourCc;
use crate::fp::{FpU16, FpU8};

pub fn ftyp() -> Atom {
    let ftyp = FtypAtom {
        major: FourCc::new(*b"M4A "),
        minor: [0, 0, 2, 0],
        compatible: vec![FourCc::new(*b"M4A "), FourCc::new(*b"mp42"), FourCc::new(*b"isom")],
    };
    Atom::new(AtomType::FileType, AtomData::FileType(ftyp))
}

pub fn mvhd() -> Atom {
    let mvhd = MvhdAtom {
        timescale: 1000,
        duration: 2000,
        rate: FpU16::new(1),
        volume: FpU8::new(1),
        matrix: [0x10000, 0, 0, 0, 0x10000, 0, 0, 0, 0x4000_0000],
        next_track_id: 2,
        ..Default::default()
    };
    Atom::new(AtomType::MovieHeader, AtomData::MovieHeader(mvhd))
}

/// An ALAC audio track of 4 samples in 2 chunks at the given chunk offsets.
pub fn alac_trak(chunk_offsets: [u32; 2]) -> Atom {
    let tkhd = TkhdAtom { flags: 7, id: 1, duration: 2000, ..Default::default() };

    let mdhd =
        MdhdAtom { timescale: 44100, duration: 4096, language: 0x55c4, ..Default::default() };

    let hdlr = HdlrAtom {
        handler_type: FourCc::new(*b"soun"),
        raw_name: Box::new(*b"SoundHandler\0"),
        ..Default::default()
    };

    let sound_desc = SoundDescription {
        data_ref_index: 1,
        num_channels: 2,
        bits_per_sample: 16,
        sample_rate: FpU16::new(44100),
        ..Default::default()
    };

    let mut config = vec![0, 0, 0, 36, b'a', b'l', b'a', b'c', 0, 0, 0, 0];
    config.extend_from_slice(&[0, 0, 16, 0, 0, 16, 40, 10, 14, 2, 0, 255, 0, 0, 0, 0]);
    config.extend_from_slice(&[0, 0, 0, 0, 0, 0, 172, 68]);

    let alac = AlacAtom { sound_desc, config: config.into_boxed_slice() };

    let mut stsd = Atom::new(
        AtomType::SampleDescription,
        AtomData::SampleDescription(EntryListAtom { entry_count: 1, ..Default::default() }),
    );
    stsd.children.push(Atom::new(AtomType::AudioSampleEntryAlac, AtomData::Alac(alac)));

    let stts = SttsAtom {
        entries: vec![SampleDurationEntry { sample_count: 4, sample_delta: 1024 }],
        ..Default::default()
    };

    let stsc = StscAtom {
        entries: vec![SampleToChunkEntry {
            first_chunk: 1,
            samples_per_chunk: 2,
            sample_desc_index: 1,
        }],
        ..Default::default()
    };

    let stsz = StszAtom {
        sample_count: 4,
        sample_sizes: SampleSize::Variable(vec![100, 200, 300, 400]),
        ..Default::default()
    };

    let stco = StcoAtom { chunk_offsets: chunk_offsets.to_vec(), ..Default::default() };

    let mut stbl = Atom::new_container(AtomType::SampleTable);
    stbl.children.extend([
        stsd,
        Atom::new(AtomType::TimeToSample, AtomData::TimeToSample(stts)),
        Atom::new(AtomType::SampleToChunk, AtomData::SampleToChunk(stsc)),
        Atom::new(AtomType::SampleSize, AtomData::SampleSize(stsz)),
        Atom::new(AtomType::ChunkOffset, AtomData::ChunkOffset(stco)),
    ]);

    let smhd = AtomData::SoundMediaHeader(SmhdAtom::default());

    let mut minf = Atom::new_container(AtomType::MediaInfo);
    minf.children.extend([Atom::new(AtomType::SoundMediaHeader, smhd), stbl]);

    let mut mdia = Atom::new_container(AtomType::Media);
    mdia.children.extend([
        Atom::new(AtomType::MediaHeader, AtomData::MediaHeader(mdhd)),
        Atom::new(AtomType::Handler, AtomData::Handler(hdlr)),
        minf,
    ]);

    let mut trak = Atom::new_container(AtomType::Track);
    trak.children.extend([Atom::new(AtomType::TrackHeader, AtomData::TrackHeader(tkhd)), mdia]);

    trak
}

pub fn moov(children: Vec<Atom>) -> Atom {
    let mut moov = Atom::new_container(AtomType::Movie);
    moov.children = children;
    moov
}

/// A `moov/udta/meta/ilst` chain holding the given items.
pub fn udta(items: Vec<Atom>) -> Atom {
    let mut ilst = Atom::new_container(AtomType::MetaList);
    ilst.children = items;

    let mut meta = Atom::new(AtomType::Meta, AtomData::Meta(MetaAtom::default()));
    let hdlr = AtomData::Handler(HdlrAtom::itunes_metadata());
    meta.children.push(Atom::new(AtomType::Handler, hdlr));
    meta.children.push(ilst);

    let mut udta = Atom::new_container(AtomType::UserData);
    udta.children.push(meta);
    udta
}

/// A leaf atom with a raw payload of `len` bytes.
pub fn raw(atom_type: AtomType, len: usize, fill: u8) -> Atom {
    Atom::new(atom_type, AtomData::Unknown(Some(vec![fill; len].into_boxed_slice())))
}

/// Serialize atoms one after another.
pub fn file(atoms: &mut [Atom]) -> Vec<u8> {
    let mut buf = Vec::new();
    for atom in atoms {
        buf.extend(atom.serialize().unwrap());
    }
    buf
}
