// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rewriting the metadata of a container.
//!
//! The movie atom is rebuilt in memory, and then written back either over its old slot, into a
//! run of free space, or after the last top-level atom. The media data is never moved, so the
//! chunk offsets of the sample tables stay valid.

use std::io::{Seek, SeekFrom, Write};

use boxwise_core::errors::{decode_error, unsupported_error, Result};
use boxwise_core::io::{MediaSink, MediaSource};
use boxwise_metadata::{ReplayGain, TagRecord};

use log::{debug, warn};

use crate::atoms::{write_header, Atom, AtomData, AtomHeader, AtomType, HdlrAtom, MetaAtom};
use crate::parser::{open, AtomTree, ParseOptions};
use crate::tags::{build_items, is_replaced_item};

/// Options that control how a container is rewritten.
#[derive(Copy, Clone, Debug, Default)]
pub struct WriteOptions {
    /// If the movie atom does not fit its old slot, try to place it in a run of free space
    /// between the file type atom and the media data before appending it to the container.
    pub reclaim_free_space: bool,
}

/// Where the new movie atom is written. Positions are relative to the start of the container.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Overwrite the old movie atom, followed by a free atom of `padding` bytes.
    InPlace { pos: u64, padding: u64 },
    /// Rename the old movie atom to free, append the new movie atom at `new_pos`, and set the
    /// container length to `truncate_to`.
    Relocate { tombstone_pos: u64, new_pos: u64, truncate_to: u64 },
    /// Write the new movie atom into free space at `pos`, followed by a free atom of `padding`
    /// bytes, and rename the old movie atom to free.
    Reclaim { tombstone_pos: u64, pos: u64, padding: u64 },
}

/// Get the index of a child, appending a new child if there is none.
fn child_index(parent: &mut Atom, atom_type: AtomType, create: impl FnOnce() -> Atom) -> usize {
    match parent.children.iter().position(|child| child.atom_type == atom_type) {
        Some(idx) => idx,
        None => {
            debug!("creating {} atom within {}", atom_type, parent.atom_type);
            parent.children.push(create());
            parent.children.len() - 1
        }
    }
}

fn new_meta() -> Atom {
    let mut meta = Atom::new(AtomType::Meta, AtomData::Meta(MetaAtom::default()));
    let hdlr = Atom::new(AtomType::Handler, AtomData::Handler(HdlrAtom::itunes_metadata()));
    meta.children.push(hdlr);
    meta
}

/// Replace the iTunes metadata items of the movie atom with those of a tag record, creating the
/// `udta/meta/ilst` chain if required.
pub fn update_metadata(
    tree: &mut AtomTree,
    tags: &TagRecord,
    replay_gain: &ReplayGain,
) -> Result<()> {
    let moov = match tree.atoms.iter_mut().find(|atom| atom.atom_type == AtomType::Movie) {
        Some(moov) => moov,
        None => return decode_error("isomp4: missing moov atom"),
    };

    let idx = child_index(moov, AtomType::UserData, || Atom::new_container(AtomType::UserData));
    let udta = &mut moov.children[idx];

    let idx = child_index(udta, AtomType::Meta, new_meta);
    let meta = &mut udta.children[idx];

    if !matches!(meta.data, AtomData::Meta(_)) {
        return unsupported_error("isomp4: cannot update an undecodable meta atom");
    }

    let idx = child_index(meta, AtomType::MetaList, || Atom::new_container(AtomType::MetaList));
    let ilst = &mut meta.children[idx];

    ilst.children.retain(|item| !is_replaced_item(item));
    ilst.children.extend(build_items(tags, replay_gain));

    moov.update_size();

    Ok(())
}

/// Returns `true` if an atom of `len` bytes can be written over a slot of `slot_len` bytes. The
/// atom must fill the slot exactly, or leave room for a free atom.
fn fits(len: u64, slot_len: u64) -> bool {
    len == slot_len || len + u64::from(AtomHeader::HEADER_SIZE) <= slot_len
}

/// The combined length of the contiguous free space atoms at the start of `atoms`, the first of
/// which must begin at `pos`.
fn free_run_len(atoms: &[Atom], mut pos: u64) -> u64 {
    let mut len = 0;

    for atom in atoms {
        if !atom.atom_type.is_free_space() || atom.pos != pos {
            break;
        }
        len += atom.size;
        pos = atom.end();
    }

    len
}

/// Find a run of free space between the file type atom and the first media data atom that fits
/// an atom of `len` bytes. Returns the position and length of the run.
fn find_free_space(atoms: &[Atom], len: u64) -> Option<(u64, u64)> {
    let start = atoms.iter().position(|atom| atom.atom_type == AtomType::FileType)? + 1;
    let end = atoms.iter().position(|atom| atom.atom_type == AtomType::MediaData)?;

    let mut i = start;

    while i < end {
        let atom = &atoms[i];

        if atom.atom_type.is_free_space() {
            let run_len = free_run_len(&atoms[i..end], atom.pos);

            if fits(len, run_len) {
                return Some((atom.pos, run_len));
            }

            // Skip past the run.
            while i < end && atoms[i].atom_type.is_free_space() {
                i += 1;
            }
        }
        else {
            i += 1;
        }
    }

    None
}

/// Decide where a new movie atom of `new_len` bytes is written in the container described by
/// the tree it was parsed from.
pub fn plan_placement(old: &AtomTree, new_len: u64, options: &WriteOptions) -> Result<Placement> {
    let idx = match old.atoms.iter().position(|atom| atom.atom_type == AtomType::Movie) {
        Some(idx) => idx,
        None => return decode_error("isomp4: missing moov atom"),
    };

    let moov = &old.atoms[idx];

    // The old slot includes any free space directly following the movie atom.
    let extent = moov.size + free_run_len(&old.atoms[idx + 1..], moov.end());

    if fits(new_len, extent) {
        return Ok(Placement::InPlace { pos: moov.pos, padding: extent - new_len });
    }

    if options.reclaim_free_space {
        if let Some((pos, run_len)) = find_free_space(&old.atoms, new_len) {
            let padding = run_len - new_len;
            return Ok(Placement::Reclaim { tombstone_pos: moov.pos, pos, padding });
        }
    }

    // Anything following the last atom, such as a trailing tag, is overwritten.
    let new_pos = match old.byte_len {
        Some(byte_len) => old.end().min(byte_len),
        None => old.end(),
    };

    if let Some(byte_len) = old.byte_len {
        if byte_len > new_pos {
            warn!("isomp4: discarding {} bytes following the last atom", byte_len - new_pos);
        }
    }

    Ok(Placement::Relocate { tombstone_pos: moov.pos, new_pos, truncate_to: new_pos + new_len })
}

fn write_at<S: MediaSink + ?Sized>(sink: &mut S, pos: u64, buf: &[u8]) -> Result<()> {
    sink.seek(SeekFrom::Start(pos))?;
    sink.write_all(buf)?;
    Ok(())
}

/// Write a free atom header spanning `padding` bytes at `pos`.
fn write_padding<S: MediaSink + ?Sized>(sink: &mut S, pos: u64, padding: u64) -> Result<()> {
    if padding == 0 {
        return Ok(());
    }

    let header_len = if padding > u64::from(u32::MAX) {
        AtomHeader::LARGE_HEADER_SIZE
    }
    else {
        AtomHeader::HEADER_SIZE
    };

    let mut header = Vec::with_capacity(usize::from(header_len));
    write_header(&mut header, AtomType::Free, padding, header_len)?;

    write_at(sink, pos, &header)
}

/// Rename the atom at `pos` to free.
fn write_tombstone<S: MediaSink + ?Sized>(sink: &mut S, pos: u64) -> Result<()> {
    write_at(sink, pos + 4, &AtomType::Free.fourcc().get())
}

/// Write a serialized movie atom according to `placement`. The leading offset of the tree is
/// added to every position.
pub fn apply_placement<S: MediaSink + ?Sized>(
    sink: &mut S,
    tree: &AtomTree,
    buf: &[u8],
    placement: &Placement,
) -> Result<()> {
    let base = tree.leading_offset;
    let len = buf.len() as u64;

    match *placement {
        Placement::InPlace { pos, padding } => {
            write_at(sink, base + pos, buf)?;
            write_padding(sink, base + pos + len, padding)?;
        }
        Placement::Relocate { tombstone_pos, new_pos, truncate_to } => {
            write_at(sink, base + new_pos, buf)?;
            sink.set_len(base + truncate_to)?;
            write_tombstone(sink, base + tombstone_pos)?;
        }
        Placement::Reclaim { tombstone_pos, pos, padding } => {
            write_at(sink, base + pos, buf)?;
            write_padding(sink, base + pos + len, padding)?;
            write_tombstone(sink, base + tombstone_pos)?;
        }
    }

    sink.flush()?;

    Ok(())
}

/// Replace the iTunes metadata of the container following `leading_offset` bytes of `sink`.
///
/// The new movie atom is fully serialized before anything is written. Returns where it was
/// written.
pub fn write_tags<S: MediaSink + MediaSource>(
    sink: &mut S,
    leading_offset: u64,
    tags: &TagRecord,
    replay_gain: &ReplayGain,
    options: &WriteOptions,
) -> Result<Placement> {
    let parse_opts = ParseOptions { retain_unknown: true, ..Default::default() };

    let tree = open(Box::new(&mut *sink), leading_offset, &parse_opts)?;

    let mut updated = tree.clone();
    update_metadata(&mut updated, tags, replay_gain)?;

    let buf = match updated.atoms.iter_mut().find(|atom| atom.atom_type == AtomType::Movie) {
        Some(moov) => moov.serialize()?,
        None => return decode_error("isomp4: missing moov atom"),
    };

    let placement = plan_placement(&tree, buf.len() as u64, options)?;

    debug!("writing {} byte moov atom: {:?}", buf.len(), placement);

    apply_placement(sink, &tree, &buf, &placement)?;

    Ok(placement)
}
