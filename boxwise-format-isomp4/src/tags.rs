// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion between iTunes metadata items and the generic tag record.

use boxwise_metadata::genres::{genre_index, genre_name};
use boxwise_metadata::itunes::{
    is_known_code, itunes_tag_for_name, tag_name_for_code, ITUNES_NAMESPACE,
};
use boxwise_metadata::{ReplayGain, ReplayGainField, TagFlags, TagRecord};

use log::debug;

use crate::atoms::{Atom, AtomData, AtomType, MetaItemAtom, MetaValue};
use crate::find::find;

/// The path of the item list atom.
pub const ILST_PATH: &str = "moov/udta/meta/ilst";

/// Keys that are written by dedicated item builders instead of as text items.
const DEDICATED_KEYS: [&str; 5] = ["track", "numtracks", "disc", "numdiscs", "genre"];

/// Read the iTunes metadata items of a parsed container into a tag record.
pub fn read_tags(atoms: &[Atom]) -> TagRecord {
    let mut record = TagRecord::new();

    let ilst = match find(atoms, ILST_PATH) {
        Some(ilst) => ilst,
        None => return record,
    };

    if !ilst.children.is_empty() {
        record.flags |= TagFlags::ITUNES;
    }

    for atom in &ilst.children {
        let item = match &atom.data {
            AtomData::MetaItem(item) => item,
            _ => continue,
        };

        let code = atom.atom_type.fourcc().get();

        // Freeform items are identified by their name.
        let name = item.custom_name().map_or(&code[..], |name| name.as_bytes());

        if let Some(field) = std::str::from_utf8(name).ok().and_then(ReplayGainField::from_tag_name)
        {
            if let MetaValue::Custom { text, .. } = &item.value {
                if !record.replay_gain.set_from_str(field, text) {
                    debug!("ignoring invalid replay gain value {:?}", text);
                }
            }
            continue;
        }

        let key = match tag_name_for_code(name) {
            Some(key) => key,
            None => continue,
        };

        match &item.value {
            MetaValue::Text(text) | MetaValue::Custom { text, .. } => {
                for part in text.split('\0') {
                    record.append(key, part);
                }
            }
            MetaValue::Values(values) => match atom.atom_type {
                AtomType::TrackNumberTag => read_index_total(&mut record, values, "track"),
                AtomType::DiskNumberTag => read_index_total(&mut record, values, "disc"),
                _ if key == "genre" => {
                    if let Some(genre) = values.first().and_then(|&id| genre_name(id)) {
                        record.replace(key, genre);
                    }
                }
                _ => {
                    if let Some(value) = values.first() {
                        record.replace(key, &value.to_string());
                    }
                }
            },
        }
    }

    record
}

/// Read the index and total of a track or disc number item, stored as [0, index, total].
fn read_index_total(record: &mut TagRecord, values: &[u16], key: &str) {
    if values.len() < 3 {
        return;
    }

    let total_key = match key {
        "track" => "numtracks",
        _ => "numdiscs",
    };

    if values[1] != 0 {
        record.replace(key, &values[1].to_string());
    }
    if values[2] != 0 {
        record.replace(total_key, &values[2].to_string());
    }
}

/// Create a text item.
pub fn text_item(atom_type: AtomType, text: &str) -> Atom {
    Atom::new(atom_type, AtomData::MetaItem(MetaItemAtom::text(text)))
}

/// Create a genre item. A standard genre is stored as its index, any other genre as text.
pub fn genre_item(name: &str) -> Atom {
    match genre_index(name) {
        0 => text_item(AtomType::CustomGenreTag, name),
        id => Atom::new(AtomType::GenreTag, AtomData::MetaItem(MetaItemAtom::values(&[id]))),
    }
}

/// Create a track or disc number item.
pub fn track_disc_item(atom_type: AtomType, index: u16, total: u16) -> Atom {
    Atom::new(atom_type, AtomData::MetaItem(MetaItemAtom::values(&[0, index, total])))
}

/// Create a freeform item in the iTunes namespace.
pub fn custom_item(name: &str, text: &str) -> Atom {
    let item = MetaItemAtom::custom(ITUNES_NAMESPACE, name, text);
    Atom::new(AtomType::FreeFormTag, AtomData::MetaItem(item))
}

/// Returns `true` if the item is replaced when tags are written. These are the items with a
/// mapped code, and all freeform items.
pub fn is_replaced_item(atom: &Atom) -> bool {
    match &atom.data {
        AtomData::MetaItem(item) if item.custom_name().is_some() => true,
        _ => is_known_code(&atom.atom_type.fourcc().get()),
    }
}

/// Parse the leading decimal number of a value, e.g. "3/12". Returns 0 if there is none.
fn parse_number(value: &str) -> u16 {
    let value = value.trim_start();
    let end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());

    value[..end].parse::<u16>().unwrap_or(0)
}

/// Build the items for a tag record, in write order.
pub fn build_items(tags: &TagRecord, replay_gain: &ReplayGain) -> Vec<Atom> {
    let mut items = Vec::new();

    for tag in tags.iter() {
        if tag.is_internal() || DEDICATED_KEYS.iter().any(|key| tag.key.eq_ignore_ascii_case(key))
        {
            continue;
        }

        let itunes = itunes_tag_for_name(&tag.key);

        for value in tag.value.split('\0') {
            let item = match itunes {
                Some(itunes) if itunes.is_atom_code() => match <[u8; 4]>::try_from(itunes.code) {
                    Ok(code) => text_item(AtomType::from(code), value),
                    Err(_) => continue,
                },
                Some(itunes) => {
                    let name = std::str::from_utf8(itunes.code).unwrap_or(tag.key.as_str());
                    custom_item(name, value)
                }
                None => custom_item(&tag.key, value),
            };
            items.push(item);
        }
    }

    if let Some(genre) = tags.find("genre").and_then(|genre| genre.split('\0').next()) {
        items.push(genre_item(genre));
    }

    let number = |key: &str| tags.find(key).map_or(0, parse_number);

    let (track, numtracks) = (number("track"), number("numtracks"));

    if track != 0 || numtracks != 0 {
        items.push(track_disc_item(AtomType::TrackNumberTag, track, numtracks));
    }

    let (disc, numdiscs) = (number("disc"), number("numdiscs"));

    if disc != 0 || numdiscs != 0 {
        items.push(track_disc_item(AtomType::DiskNumberTag, disc, numdiscs));
    }

    for field in ReplayGainField::ALL {
        if let Some(value) = replay_gain.formatted(field) {
            items.push(custom_item(field.tag_name(), &value));
        }
    }

    items
}
