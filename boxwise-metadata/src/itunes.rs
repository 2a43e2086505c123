// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! iTunes metadata support.
//!
//! iTunes stores each tag as an item in the `ilst` atom. Most items are identified by a
//! four-character code, several of which begin with the copyright symbol (0xA9 in Mac OS Roman).
//! Items without a code are stored as freeform `----` items identified by a name.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// The Mac OS Roman copyright symbol that prefixes many iTunes item codes.
pub const COPYRIGHT_SYMBOL: u8 = 0xa9;

/// The namespace of freeform items written by Boxwise.
pub const ITUNES_NAMESPACE: &str = "com.apple.iTunes";

/// An entry of the iTunes tag map.
#[derive(Copy, Clone, Debug)]
pub struct ItunesTag {
    /// The item code. A four byte code is an atom type; anything else is a freeform item name.
    pub code: &'static [u8],
    /// The canonical tag name.
    pub name: &'static str,
}

impl ItunesTag {
    /// Returns `true` if the code is an atom type rather than a freeform item name.
    pub fn is_atom_code(&self) -> bool {
        self.code.len() == 4
    }
}

macro_rules! itunes_tag {
    ($code:expr, $name:expr) => {
        ItunesTag { code: $code, name: $name }
    };
}

/// The map between iTunes item codes and canonical tag names. Order matters: when a name maps to
/// several codes, the first is used for writing.
pub const ITUNES_TAGS: &[ItunesTag] = &[
    itunes_tag!(b"\xa9alb", "album"),
    itunes_tag!(b"\xa9art", "artist"),
    itunes_tag!(b"aART", "band"),
    itunes_tag!(b"\xa9cmt", "comment"),
    itunes_tag!(b"\xa9day", "year"),
    itunes_tag!(b"\xa9nam", "title"),
    itunes_tag!(b"\xa9gen", "genre"),
    itunes_tag!(b"gnre", "genre"),
    itunes_tag!(b"trkn", "track"),
    itunes_tag!(b"disk", "disc"),
    itunes_tag!(b"\xa9wrt", "composer"),
    itunes_tag!(b"\xa9too", "encoder"),
    itunes_tag!(b"tmpo", "bpm"),
    itunes_tag!(b"cprt", "copyright"),
    itunes_tag!(b"\xa9grp", "grouping"),
    itunes_tag!(b"cpil", "compilation"),
    itunes_tag!(b"pcst", "podcast"),
    itunes_tag!(b"catg", "category"),
    itunes_tag!(b"keyw", "keyword"),
    itunes_tag!(b"desc", "description"),
    itunes_tag!(b"\xa9lyr", "lyrics"),
    itunes_tag!(b"purd", "purchase date"),
    itunes_tag!(b"MusicBrainz Track Id", "musicbrainz_trackid"),
];

lazy_static! {
    static ref NAME_BY_CODE: HashMap<Vec<u8>, &'static str> = {
        let mut m = HashMap::new();
        for tag in ITUNES_TAGS {
            m.entry(tag.code.to_ascii_lowercase()).or_insert(tag.name);
        }
        m
    };
}

lazy_static! {
    static ref TAG_BY_NAME: HashMap<&'static str, ItunesTag> = {
        let mut m = HashMap::new();
        for tag in ITUNES_TAGS {
            m.entry(tag.name).or_insert(*tag);
        }
        m
    };
}

/// Try to map an item code (an atom type or a freeform item name) to a canonical tag name. The
/// match is case-insensitive.
pub fn tag_name_for_code(code: &[u8]) -> Option<&'static str> {
    NAME_BY_CODE.get(&code.to_ascii_lowercase()).copied()
}

/// Try to map a canonical tag name to its iTunes tag entry. The match is case-insensitive.
pub fn itunes_tag_for_name(name: &str) -> Option<ItunesTag> {
    TAG_BY_NAME.get(name.to_lowercase().as_str()).copied()
}

/// Returns `true` if the code is any code of the tag map.
pub fn is_known_code(code: &[u8]) -> bool {
    tag_name_for_code(code).is_some()
}

/// Render an item code for display, mapping the copyright symbol to `©` and other non-ASCII bytes
/// to `?`.
pub fn display_code(code: &[u8]) -> String {
    code.iter()
        .map(|&b| match b {
            COPYRIGHT_SYMBOL => '©',
            b if b.is_ascii_graphic() || b == b' ' => char::from(b),
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_code_to_name() {
        assert_eq!(tag_name_for_code(b"\xa9art"), Some("artist"));
        // iTunes itself writes the artist code in upper case.
        assert_eq!(tag_name_for_code(b"\xa9ART"), Some("artist"));
        assert_eq!(tag_name_for_code(b"gnre"), Some("genre"));
        assert_eq!(tag_name_for_code(b"trkn"), Some("track"));
        assert_eq!(tag_name_for_code(b"disk"), Some("disc"));
        assert_eq!(tag_name_for_code(b"musicbrainz track id"), Some("musicbrainz_trackid"));
        assert_eq!(tag_name_for_code(b"covr"), None);
        assert!(is_known_code(b"PURD"));
    }

    #[test]
    fn verify_name_to_code() {
        let tag = itunes_tag_for_name("Artist").unwrap();
        assert_eq!(tag.code, b"\xa9art");
        assert!(tag.is_atom_code());

        // The first code wins for names with several codes.
        assert_eq!(itunes_tag_for_name("genre").unwrap().code, b"\xa9gen");

        let tag = itunes_tag_for_name("musicbrainz_trackid").unwrap();
        assert!(!tag.is_atom_code());
        assert_eq!(tag.code, b"MusicBrainz Track Id");

        assert!(itunes_tag_for_name("mood").is_none());
    }

    #[test]
    fn verify_display_code() {
        assert_eq!(display_code(b"\xa9nam"), "©nam");
        assert_eq!(display_code(b"----"), "----");
        assert_eq!(display_code(&[0, b'a', b'b', b'c']), "?abc");
    }
}
