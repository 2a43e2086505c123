// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed point values stored in movie, track, and sample entry headers. Each type keeps the raw
//! value so that it can be written back unchanged.

use std::fmt;

/// An unsigned 16.16-bit fixed point value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpU16(u32);

impl FpU16 {
    pub fn new(val: u16) -> Self {
        Self(u32::from(val) << 16)
    }

    pub fn parse_raw(val: u32) -> Self {
        Self(val)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    /// The integer part of the value.
    pub fn integer(&self) -> u16 {
        (self.0 >> 16) as u16
    }
}

impl From<FpU16> for f64 {
    fn from(fp: FpU16) -> Self {
        f64::from(fp.0) / f64::from(1u32 << 16)
    }
}

impl fmt::Display for FpU16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f64::from(*self))
    }
}

/// An unsigned 8.8-bit fixed point value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpU8(u16);

impl FpU8 {
    pub fn new(val: u8) -> Self {
        Self(u16::from(val) << 8)
    }

    pub fn parse_raw(val: u16) -> Self {
        Self(val)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }
}

impl From<FpU8> for f32 {
    fn from(fp: FpU8) -> Self {
        f32::from(fp.0) / f32::from(1u16 << 8)
    }
}

impl fmt::Display for FpU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f32::from(*self))
    }
}

/// A signed 8.8-bit fixed point value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpI8(i16);

impl FpI8 {
    pub fn new(val: i8) -> Self {
        Self(i16::from(val) * 0x100)
    }

    pub fn parse_raw(val: i16) -> Self {
        Self(val)
    }

    pub fn raw(&self) -> i16 {
        self.0
    }
}

impl From<FpI8> for f32 {
    fn from(fp: FpI8) -> Self {
        f32::from(fp.0) / f32::from(1u16 << 8)
    }
}

impl fmt::Display for FpI8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f32::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_fixed_point() {
        assert_eq!(FpU16::new(44100).raw(), 0xac44_0000);
        assert_eq!(FpU16::parse_raw(0xac44_8000).integer(), 44100);
        assert_eq!(f64::from(FpU16::parse_raw(0x0001_8000)), 1.5);

        assert_eq!(f32::from(FpU8::new(1)), 1.0);
        assert_eq!(f32::from(FpI8::parse_raw(-0x80)), -0.5);
        assert_eq!(FpI8::new(-1).raw(), -0x100);
    }
}
