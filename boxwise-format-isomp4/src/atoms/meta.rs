// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boxwise_core::errors::Result;
use boxwise_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{write_extended_header, AtomHeader, AtomPayload};

/// Metadata atom. The version and flags precede the children (`hdlr`, `ilst`, ...).
#[derive(Clone, Debug, Default)]
pub struct MetaAtom {
    pub version: u8,
    pub flags: u32,
}

impl AtomPayload for MetaAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        Ok(MetaAtom { version, flags })
    }

    fn payload_len(&self) -> u64 {
        4
    }

    fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        write_extended_header(writer, self.version, self.flags)
    }
}
