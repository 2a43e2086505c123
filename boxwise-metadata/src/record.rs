// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generic tag record exchanged with the host application.

use std::fmt;

use bitflags::bitflags;

use crate::replaygain::ReplayGain;

/// The characters that mark a key as internal to the host application. Internal keys are never
/// written to a file.
pub const INTERNAL_KEY_PREFIXES: [char; 3] = [':', '!', '_'];

/// Returns `true` if the key is reserved for internal use by the host application.
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with(INTERNAL_KEY_PREFIXES)
}

bitflags! {
    /// Flags indicating which tag formats were found while reading a file.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct TagFlags: u32 {
        /// iTunes-style `ilst` metadata items were present.
        const ITUNES = 1 << 0;
    }
}

/// A `Tag` encapsulates a key-value pair of metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The canonical, lowercase key (e.g., "artist").
    pub key: String,
    /// The value of the `Tag`.
    pub value: String,
}

impl Tag {
    /// Create a new `Tag`. The key is normalized to lowercase.
    pub fn new(key: &str, value: &str) -> Tag {
        Tag { key: key.to_lowercase(), value: value.to_string() }
    }

    /// Returns true if the `Tag` is internal to the host application.
    pub fn is_internal(&self) -> bool {
        is_internal_key(&self.key)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ key=\"{}\", value=\"{}\" }}", self.key, self.value.escape_debug())
    }
}

/// `TagRecord` is an ordered sequence of tags plus the replay gain fields and format flags of a
/// single item. A key may appear more than once; each occurrence is one value of a multi-valued
/// field.
#[derive(Clone, Debug, Default)]
pub struct TagRecord {
    tags: Vec<Tag>,
    /// Replay gain values, kept apart from the generic tags.
    pub replay_gain: ReplayGain,
    /// Tag formats found while reading.
    pub flags: TagFlags,
}

impl TagRecord {
    /// Instantiate an empty `TagRecord`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Gets an immutable slice to the `Tag`s in the record.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns an iterator over the `Tag`s in the record.
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Returns `true` if the record contains no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Appends a value for a key, keeping any existing values of that key.
    pub fn append(&mut self, key: &str, value: &str) -> &mut Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Replaces all values of a key with a single value. The new value takes the position of the
    /// first existing value, or is appended if the key is not present.
    pub fn replace(&mut self, key: &str, value: &str) -> &mut Self {
        let key = key.to_lowercase();

        match self.tags.iter().position(|tag| tag.key == key) {
            Some(first) => {
                self.tags[first].value = value.to_string();

                let mut i = 0;
                self.tags.retain(|tag| {
                    let keep = i <= first || tag.key != key;
                    i += 1;
                    keep
                });
            }
            None => self.tags.push(Tag { key, value: value.to_string() }),
        }
        self
    }

    /// Gets the first value of a key. The key match is case-insensitive.
    pub fn find(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|tag| tag.key.eq_ignore_ascii_case(key)).map(|tag| tag.value.as_str())
    }

    /// Gets all values of a key in record order. The key match is case-insensitive.
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.key.eq_ignore_ascii_case(key))
            .map(|tag| tag.value.as_str())
    }

    /// Removes all values of a key. Returns the number of values removed.
    pub fn remove(&mut self, key: &str) -> usize {
        let len = self.tags.len();
        self.tags.retain(|tag| !tag.key.eq_ignore_ascii_case(key));
        len - self.tags.len()
    }

    /// Removes every tag, replay gain value, and flag.
    pub fn clear(&mut self) {
        self.tags.clear();
        self.replay_gain = Default::default();
        self.flags = TagFlags::empty();
    }
}

impl<'a> IntoIterator for &'a TagRecord {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_internal_keys() {
        assert!(is_internal_key(":URI"));
        assert!(is_internal_key("!decoder"));
        assert!(is_internal_key("_playlist"));
        assert!(!is_internal_key("artist"));
        assert!(!is_internal_key(""));
        assert!(Tag::new(":FILETYPE", "MP4").is_internal());
    }

    #[test]
    fn verify_record_multi_value() {
        let mut record = TagRecord::new();
        record.append("Artist", "A").append("title", "T").append("artist", "B");

        assert_eq!(record.find("ARTIST"), Some("A"));
        assert_eq!(record.find_all("artist").collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(record.tags()[0].key, "artist");

        record.replace("artist", "C");
        assert_eq!(record.find_all("artist").collect::<Vec<_>>(), ["C"]);
        assert_eq!(record.tags()[0].value, "C");
        assert_eq!(record.tags().len(), 2);

        assert_eq!(record.remove("title"), 1);
        assert_eq!(record.remove("title"), 0);
        assert_eq!(record.iter().count(), 1);
    }

    #[test]
    fn verify_record_replace_appends() {
        let mut record = TagRecord::new();
        record.append("album", "X");
        record.replace("track", "5");

        assert_eq!(record.tags()[1], Tag::new("track", "5"));

        record.flags |= TagFlags::ITUNES;
        record.clear();
        assert!(record.is_empty());
        assert!(record.flags.is_empty());
    }
}
