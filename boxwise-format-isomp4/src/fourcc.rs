// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use boxwise_metadata::itunes::display_code;

/// A four character code, such as an atom type or an `ftyp` brand (reference: http://ftyps.com/).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
#[repr(transparent)]
pub struct FourCc {
    val: [u8; 4],
}

impl FourCc {
    /// Construct a new FourCC code from the given byte array.
    pub const fn new(val: [u8; 4]) -> Self {
        Self { val }
    }

    /// Get the raw bytes of the code.
    pub const fn get(&self) -> [u8; 4] {
        self.val
    }

    /// Try to construct a FourCC code from a byte slice. Returns `None` unless the slice is
    /// exactly four bytes long.
    pub fn from_slice(val: &[u8]) -> Option<Self> {
        <[u8; 4]>::try_from(val).ok().map(FourCc::new)
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(val: [u8; 4]) -> Self {
        FourCc::new(val)
    }
}

impl AsRef<[u8]> for FourCc {
    fn as_ref(&self) -> &[u8] {
        &self.val
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_code(&self.val))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.val) {
            Ok(name) => f.write_str(name),
            _ => write!(f, "{}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_fourcc_display() {
        assert_eq!(FourCc::new(*b"moov").to_string(), "moov");
        assert_eq!(FourCc::new(*b"\xa9nam").to_string(), "©nam");
        assert_eq!(format!("{:?}", FourCc::new(*b"\xa9nam")), "©nam");
        assert_eq!(FourCc::from_slice(b"ilst"), Some(FourCc::new(*b"ilst")));
        assert_eq!(FourCc::from_slice(b"moo"), None);
    }
}
