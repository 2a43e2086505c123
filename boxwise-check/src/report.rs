// Boxwise Check Tool
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text reports printed by the check tool.

use std::fmt::Write;

use boxwise::isomp4::atoms::{Atom, AtomData, AtomType};
use boxwise::isomp4::dump::dump;
use boxwise::isomp4::{AtomTree, SampleTable};
use boxwise::metadata::{ReplayGainField, TagFlags, TagRecord};

/// The minimum padding for keys.
const MIN_PAD: usize = 20;
/// The maximum padding for keys.
const MAX_PAD: usize = 40;

#[derive(Copy, Clone)]
enum Bullet {
    None,
    Num(usize),
}

impl std::fmt::Display for Bullet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The bullet must occupy 4 characters.
        match self {
            Bullet::None => write!(f, "    "),
            Bullet::Num(num) => write!(f, "[{:0>2}]", num),
        }
    }
}

/// A hierarchical list rendered into a string.
#[derive(Default)]
struct Report {
    out: String,
}

impl Report {
    fn header(&mut self, title: &str) {
        self.out += &format!("| // {} //\n", title);
    }

    fn blank(&mut self) {
        self.out += "|\n";
    }

    fn one(&mut self, value: &str, bullet: Bullet, depth: usize) {
        let indent = 5 * depth;
        self.out += &format!("|{:indent$}{} {}\n", "", bullet, value);
    }

    fn pair_custom(&mut self, key: &str, value: &str, bullet: Bullet, pad: usize, depth: usize) {
        let indent = 5 * depth;
        self.out += &format!("|{:indent$}{} {} {}\n", "", bullet, pad_key(key, pad), value);
    }

    fn pair<T: std::fmt::Display>(&mut self, key: &str, value: &T, bullet: Bullet, depth: usize) {
        self.pair_custom(key, &value.to_string(), bullet, MIN_PAD, depth)
    }
}

/// Pad a key.
fn pad_key(key: &str, pad: usize) -> String {
    if key.chars().count() <= pad {
        format!("{:<pad$}", key)
    }
    else {
        // Key length too large.
        let truncated: String = key.chars().take(pad - 2).collect();
        format!("{:.<pad$}", truncated)
    }
}

fn fmt_time(secs: f64) -> String {
    let whole = secs.trunc() as u64;

    let hours = whole / (60 * 60);
    let mins = (whole % (60 * 60)) / 60;
    let secs = (whole % 60) as f64 + secs.fract();

    format!("{}:{:0>2}:{:0>6.3}", hours, mins, secs)
}

/// Render the atom tree.
pub fn dump_tree(tree: &AtomTree) -> String {
    let mut out = String::new();

    if tree.leading_offset > 0 {
        let _ = writeln!(out, "(container starts at byte {})", tree.leading_offset);
    }

    // Writing to a string cannot fail.
    let _ = dump(&tree.atoms, 0, &mut out);
    out
}

/// Render a tag record.
pub fn tags(record: &TagRecord) -> String {
    let mut report = Report::default();

    report.blank();
    report.header("Tags");

    if record.is_empty() {
        report.one("(none)", Bullet::None, 1);
    }
    else {
        let pad = record.iter().map(|tag| tag.key.chars().count()).max().unwrap_or(MIN_PAD);
        let pad = pad.clamp(MIN_PAD, MAX_PAD);

        for (idx, tag) in record.iter().enumerate() {
            report.pair_custom(&tag.key, &tag.value, Bullet::Num(idx + 1), pad, 1);
        }
    }

    if !record.replay_gain.is_empty() {
        report.blank();
        report.header("Replay Gain");

        for field in ReplayGainField::ALL {
            if let Some(value) = record.replay_gain.formatted(field) {
                report.pair_custom(field.tag_name(), &value, Bullet::None, MIN_PAD + 2, 1);
            }
        }
    }

    if record.flags.contains(TagFlags::ITUNES) {
        report.blank();
        report.pair("Format:", &"iTunes", Bullet::None, 1);
    }

    report.blank();
    report.out
}

fn handler_type(trak: &Atom) -> Option<String> {
    let hdlr = trak.child(AtomType::Media)?.child(AtomType::Handler)?;

    match &hdlr.data {
        AtomData::Handler(hdlr) => Some(hdlr.handler_type.to_string()),
        _ => None,
    }
}

fn sample_entry(trak: &Atom) -> Option<String> {
    let stsd = boxwise::isomp4::find::find(
        std::slice::from_ref(trak),
        "trak/mdia/minf/stbl/stsd",
    )?;

    stsd.children.first().map(|entry| entry.atom_type.to_string())
}

/// Render the sample tables of the tracks of a container. If `only_track` is given, only the
/// track with that 1-based index is rendered. If `sample` is given, the placement of that 0-based
/// sample is rendered as well.
pub fn samples(tree: &AtomTree, only_track: Option<usize>, sample: Option<u64>) -> String {
    let mut report = Report::default();

    report.blank();
    report.header("Tracks");

    let traks: Vec<&Atom> = match tree.find("moov") {
        Some(moov) => {
            moov.children.iter().filter(|atom| atom.atom_type == AtomType::Track).collect()
        }
        None => Vec::new(),
    };

    if let Some(idx) = only_track {
        if idx == 0 || idx > traks.len() {
            report.one(&format!("no track {} (found {})", idx, traks.len()), Bullet::None, 1);
            report.blank();
            return report.out;
        }
    }

    for (i, trak) in traks.iter().enumerate() {
        if only_track.is_some_and(|idx| idx != i + 1) {
            continue;
        }

        let bullet = Bullet::Num(i + 1);

        let table = match SampleTable::for_track(trak) {
            Some(table) => table,
            None => {
                report.one("no sample table", bullet, 1);
                continue;
            }
        };

        let tkhd = trak.child(AtomType::TrackHeader).map(|atom| &atom.data);

        if let Some(AtomData::TrackHeader(tkhd)) = tkhd {
            report.pair("Track ID:", &tkhd.id, bullet, 1);
        }
        else {
            report.one("", bullet, 1);
        }

        if let Some(handler) = handler_type(trak) {
            report.pair("Handler:", &handler, Bullet::None, 1);
        }
        if let Some(entry) = sample_entry(trak) {
            report.pair("Sample Entry:", &entry, Bullet::None, 1);
        }
        if let Some(rate) = table.sample_rate() {
            report.pair("Timescale:", &rate, Bullet::None, 1);
        }

        let count = table.total_sample_count();

        report.pair("Samples:", &count, Bullet::None, 1);
        report.pair("Duration:", &table.total_duration(), Bullet::None, 1);

        if let Some(secs) = table.duration_secs() {
            report.pair("Length:", &fmt_time(secs), Bullet::None, 1);
        }

        if let Some(n) = sample {
            if n < count {
                let offset = table.sample_byte_offset(n);

                report.one(&format!("Sample {}:", n), Bullet::None, 1);
                report.pair("Size:", &table.sample_size(n), Bullet::None, 2);
                report.pair("Offset:", &offset, Bullet::None, 2);
                report.pair("File Offset:", &(offset + tree.leading_offset), Bullet::None, 2);
                report.pair("Duration:", &table.sample_duration(n + 1), Bullet::None, 2);
            }
            else {
                report.one(&format!("Sample {}: out of range", n), Bullet::None, 1);
            }
        }
    }

    report.blank();
    report.out
}

#[cfg(test)]
mod tests {
    use boxwise::isomp4::atoms::*;

    use super::*;

    fn tree() -> AtomTree {
        let stts = SttsAtom {
            entries: vec![SampleDurationEntry { sample_count: 3, sample_delta: 1024 }],
            ..Default::default()
        };
        let stsc = StscAtom {
            entries: vec![SampleToChunkEntry {
                first_chunk: 1,
                samples_per_chunk: 3,
                sample_desc_index: 1,
            }],
            ..Default::default()
        };
        let stsz = StszAtom {
            sample_count: 3,
            sample_sizes: SampleSize::Constant(10),
            ..Default::default()
        };
        let stco = StcoAtom { chunk_offsets: vec![500], ..Default::default() };

        let mut stbl = Atom::new_container(AtomType::SampleTable);
        stbl.children.extend([
            Atom::new(AtomType::TimeToSample, AtomData::TimeToSample(stts)),
            Atom::new(AtomType::SampleToChunk, AtomData::SampleToChunk(stsc)),
            Atom::new(AtomType::SampleSize, AtomData::SampleSize(stsz)),
            Atom::new(AtomType::ChunkOffset, AtomData::ChunkOffset(stco)),
        ]);

        let mut minf = Atom::new_container(AtomType::MediaInfo);
        minf.children.push(stbl);

        let mdhd = MdhdAtom { timescale: 48000, ..Default::default() };

        let mut mdia = Atom::new_container(AtomType::Media);
        mdia.children.push(Atom::new(AtomType::MediaHeader, AtomData::MediaHeader(mdhd)));
        mdia.children.push(minf);

        let tkhd = TkhdAtom { id: 7, ..Default::default() };

        let mut trak = Atom::new_container(AtomType::Track);
        trak.children.push(Atom::new(AtomType::TrackHeader, AtomData::TrackHeader(tkhd)));
        trak.children.push(mdia);

        let mut moov = Atom::new_container(AtomType::Movie);
        moov.children.push(trak);

        AtomTree { atoms: vec![moov], leading_offset: 100, byte_len: None }
    }

    #[test]
    fn verify_fmt_time() {
        assert_eq!(fmt_time(0.0), "0:00:00.000");
        assert_eq!(fmt_time(3723.5), "1:02:03.500");
    }

    #[test]
    fn verify_pad_key() {
        assert_eq!(pad_key("artist", 8), "artist  ");
        assert_eq!(pad_key("musicbrainz_trackid", 8), "musicb..");
    }

    #[test]
    fn verify_tags_report() {
        let mut record = TagRecord::new();
        record.append("artist", "Someone").append("title", "Something");
        record.replay_gain.album_peak = Some(0.5);
        record.flags |= TagFlags::ITUNES;

        let out = tags(&record);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[1], "| // Tags //");
        assert_eq!(lines[2], format!("|     [01] {:<20} Someone", "artist"));
        assert_eq!(lines[3], format!("|     [02] {:<20} Something", "title"));
        assert_eq!(lines[5], "| // Replay Gain //");
        assert_eq!(lines[6], format!("|          {:<22} 0.500000", "replaygain_album_peak"));
        assert!(out.contains("iTunes"));
    }

    #[test]
    fn verify_samples_report() {
        let out = samples(&tree(), None, Some(2));

        assert!(out.contains(&format!("[01] {:<20} 7", "Track ID:")));
        assert!(out.contains(&format!("{:<20} 3\n", "Samples:")));
        assert!(out.contains(&format!("{:<20} 0:00:00.064", "Length:")));
        assert!(out.contains(&format!("{:<20} 520\n", "Offset:")));
        assert!(out.contains(&format!("{:<20} 620\n", "File Offset:")));

        let out = samples(&tree(), Some(2), None);
        assert!(out.contains("no track 2 (found 1)"));

        let out = samples(&tree(), Some(1), Some(3));
        assert!(out.contains("Sample 3: out of range"));
    }
}
