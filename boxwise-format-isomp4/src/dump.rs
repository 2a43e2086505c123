// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Human readable atom tree listing.

use std::fmt;

use crate::atoms::{Atom, AtomData, MetaValue, SampleSize};

/// Write one line per atom, and recursively its children, indented by 4 spaces per level of
/// `depth`.
pub fn dump<W: fmt::Write>(atoms: &[Atom], depth: usize, out: &mut W) -> fmt::Result {
    for atom in atoms {
        let indent = 4 * depth;
        write!(out, "{:indent$}{} pos={} size={}", "", atom.atom_type, atom.pos, atom.size)?;
        summarize(&atom.data, out)?;
        if !atom.remainder.is_empty() {
            write!(out, " remainder={}", atom.remainder.len())?;
        }
        writeln!(out)?;

        dump(&atom.children, depth + 1, out)?;
    }
    Ok(())
}

fn summarize<W: fmt::Write>(data: &AtomData, out: &mut W) -> fmt::Result {
    match data {
        AtomData::Container | AtomData::Meta(_) => Ok(()),
        AtomData::FileType(ftyp) => {
            write!(out, " major={} compatible=[", ftyp.major)?;
            for (i, brand) in ftyp.compatible.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write!(out, "{}", brand)?;
            }
            out.write_str("]")
        }
        AtomData::MovieHeader(mvhd) => {
            write!(out, " timescale={} duration={}", mvhd.timescale, mvhd.duration)
        }
        AtomData::TrackHeader(tkhd) => write!(out, " id={} duration={}", tkhd.id, tkhd.duration),
        AtomData::MediaHeader(mdhd) => write!(
            out,
            " timescale={} duration={} language={}",
            mdhd.timescale,
            mdhd.duration,
            mdhd.language()
        ),
        AtomData::Handler(hdlr) => {
            write!(out, " handler={} name={:?}", hdlr.handler_type, hdlr.name())
        }
        AtomData::SoundMediaHeader(smhd) => write!(out, " balance={}", smhd.balance),
        AtomData::SampleDescription(stsd) | AtomData::DataReference(stsd) => {
            write!(out, " entries={}", stsd.entry_count)
        }
        AtomData::TimeToSample(stts) => write!(
            out,
            " entries={} samples={} duration={}",
            stts.entries.len(),
            stts.total_sample_count(),
            stts.total_duration()
        ),
        AtomData::SampleToChunk(stsc) => write!(out, " entries={}", stsc.entries.len()),
        AtomData::SampleSize(stsz) => match &stsz.sample_sizes {
            SampleSize::Constant(size) => {
                write!(out, " samples={} constant={}", stsz.sample_count, size)
            }
            SampleSize::Variable(sizes) => write!(out, " samples={}", sizes.len()),
        },
        AtomData::ChunkOffset(stco) => write!(out, " chunks={}", stco.chunk_offsets.len()),
        AtomData::ChunkOffset64(co64) => write!(out, " chunks={}", co64.chunk_offsets.len()),
        AtomData::Alac(alac) => write!(
            out,
            " channels={} bits={} rate={}",
            alac.sound_desc.num_channels,
            alac.sound_desc.bits_per_sample,
            alac.sound_desc.sample_rate
        ),
        AtomData::Mp4a(mp4a) => write!(
            out,
            " channels={} bits={} rate={}",
            mp4a.sound_desc.num_channels,
            mp4a.sound_desc.bits_per_sample,
            mp4a.sound_desc.sample_rate
        ),
        AtomData::Esds(esds) => write!(
            out,
            " object_type={:#x} avg_bitrate={} max_bitrate={}",
            esds.object_type,
            esds.avg_bitrate,
            esds.max_bitrate
        ),
        AtomData::MetaItem(item) => match &item.value {
            MetaValue::Values(values) => write!(out, " values={:?}", values.as_slice()),
            MetaValue::Text(text) => write!(out, " text={:?}", text),
            MetaValue::Custom { mean, name, text } => {
                write!(out, " mean={:?} name={:?} text={:?}", mean, name, text)
            }
        },
        AtomData::Opaque(_) => out.write_str(" (undecodable)"),
        AtomData::Unknown(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::atoms::AtomType;
    use crate::fixtures::*;
    use crate::tags::text_item;

    use super::*;

    #[test]
    fn verify_dump() {
        let mut atoms = [
            ftyp(),
            moov(vec![mvhd(), udta(vec![text_item(AtomType::from(*b"\xa9nam"), "Title")])]),
        ];
        file(&mut atoms);

        let mut out = String::new();
        dump(&atoms, 0, &mut out).unwrap();

        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "ftyp pos=0 size=28 major=M4A  compatible=[M4A , mp42, isom]");
        assert_eq!(lines[1], "moov pos=0 size=206");
        assert_eq!(lines[2], "    mvhd pos=0 size=108 timescale=1000 duration=2000");
        assert_eq!(lines[5], "            hdlr pos=0 size=33 handler=mdir name=\"\"");
        assert_eq!(lines[7], "                ©nam pos=0 size=29 text=\"Title\"");
        assert_eq!(lines.len(), 8);
    }
}
