// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::atoms::Atom;
use crate::fourcc::FourCc;

/// Convert a path component to an atom type code. Characters up to U+00FF map to a single byte,
/// so "©nam" is the code `A9 6E 61 6D`.
fn path_code(part: &str) -> Option<FourCc> {
    let mut code = [0; 4];
    let mut len = 0;

    for c in part.chars() {
        if len == 4 {
            return None;
        }
        code[len] = u8::try_from(u32::from(c)).ok()?;
        len += 1;
    }

    if len == 4 {
        Some(FourCc::new(code))
    }
    else {
        None
    }
}

/// Find an atom by a `/`-separated path of atom types, e.g. "moov/udta/meta/ilst". Each path
/// component matches the first immediate child of that type. Matching is case-sensitive.
pub fn find<'a>(atoms: &'a [Atom], path: &str) -> Option<&'a Atom> {
    let mut parts = path.split('/');

    let code = path_code(parts.next()?)?;
    let mut atom = atoms.iter().find(|atom| atom.atom_type.fourcc() == code)?;

    for part in parts {
        let code = path_code(part)?;
        atom = atom.children.iter().find(|child| child.atom_type.fourcc() == code)?;
    }

    Some(atom)
}

/// Find an atom by a `/`-separated path of atom types, mutably.
pub fn find_mut<'a>(atoms: &'a mut [Atom], path: &str) -> Option<&'a mut Atom> {
    let mut parts = path.split('/');

    let code = path_code(parts.next()?)?;
    let mut atom = atoms.iter_mut().find(|atom| atom.atom_type.fourcc() == code)?;

    for part in parts {
        let code = path_code(part)?;
        atom = atom.children.iter_mut().find(|child| child.atom_type.fourcc() == code)?;
    }

    Some(atom)
}

#[cfg(test)]
mod tests {
    use crate::atoms::{AtomData, AtomType};

    use super::*;

    fn tree() -> Vec<Atom> {
        let mut ilst = Atom::new_container(AtomType::MetaList);
        ilst.children.push(Atom::new(AtomType::from(*b"\xa9nam"), AtomData::Unknown(None)));

        let mut udta = Atom::new_container(AtomType::UserData);
        udta.children.push(ilst);

        let mut moov = Atom::new_container(AtomType::Movie);
        moov.children.push(Atom::new_container(AtomType::Track));
        moov.children.push(udta);

        vec![Atom::new_container(AtomType::FileType), moov]
    }

    #[test]
    fn verify_find() {
        let mut atoms = tree();

        assert_eq!(find(&atoms, "moov").unwrap().atom_type, AtomType::Movie);
        assert_eq!(find(&atoms, "moov/udta/ilst").unwrap().atom_type, AtomType::MetaList);
        assert!(find(&atoms, "moov/udta/ilst/©nam").is_some());

        // Only immediate children match.
        assert!(find(&atoms, "moov/ilst").is_none());
        assert!(find(&atoms, "MOOV").is_none());
        assert!(find(&atoms, "moov/udt").is_none());
        assert!(find(&atoms, "moov/").is_none());
        assert!(find(&atoms, "").is_none());

        find_mut(&mut atoms, "moov/udta").unwrap().children.clear();
        assert!(find(&atoms, "moov/udta/ilst").is_none());
    }
}
