// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Replay gain fields.

/// One of the four well-known replay gain fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplayGainField {
    AlbumGain,
    AlbumPeak,
    TrackGain,
    TrackPeak,
}

impl ReplayGainField {
    /// All fields, in the order they are written to a file.
    pub const ALL: [ReplayGainField; 4] = [
        ReplayGainField::AlbumGain,
        ReplayGainField::AlbumPeak,
        ReplayGainField::TrackGain,
        ReplayGainField::TrackPeak,
    ];

    /// The tag name the field is stored under in files.
    pub fn tag_name(&self) -> &'static str {
        match self {
            ReplayGainField::AlbumGain => "replaygain_album_gain",
            ReplayGainField::AlbumPeak => "replaygain_album_peak",
            ReplayGainField::TrackGain => "replaygain_track_gain",
            ReplayGainField::TrackPeak => "replaygain_track_peak",
        }
    }

    /// Get the field stored under a tag name. The match is case-insensitive.
    pub fn from_tag_name(name: &str) -> Option<ReplayGainField> {
        ReplayGainField::ALL.into_iter().find(|field| field.tag_name().eq_ignore_ascii_case(name))
    }
}

/// Replay gain values of an item. Gains are in dB, peaks are linear amplitudes.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ReplayGain {
    pub album_gain: Option<f32>,
    pub album_peak: Option<f32>,
    pub track_gain: Option<f32>,
    pub track_peak: Option<f32>,
}

impl ReplayGain {
    /// Gets a field.
    pub fn get(&self, field: ReplayGainField) -> Option<f32> {
        match field {
            ReplayGainField::AlbumGain => self.album_gain,
            ReplayGainField::AlbumPeak => self.album_peak,
            ReplayGainField::TrackGain => self.track_gain,
            ReplayGainField::TrackPeak => self.track_peak,
        }
    }

    /// Sets or clears a field.
    pub fn set(&mut self, field: ReplayGainField, value: Option<f32>) {
        let slot = match field {
            ReplayGainField::AlbumGain => &mut self.album_gain,
            ReplayGainField::AlbumPeak => &mut self.album_peak,
            ReplayGainField::TrackGain => &mut self.track_gain,
            ReplayGainField::TrackPeak => &mut self.track_peak,
        };
        *slot = value;
    }

    /// Sets a field from a decimal string. A leading number is accepted even if followed by other
    /// text (e.g., "-6.20 dB"). Returns `false`, leaving the field untouched, if no number could
    /// be parsed.
    pub fn set_from_str(&mut self, field: ReplayGainField, value: &str) -> bool {
        match parse_leading_decimal(value) {
            Some(value) => {
                self.set(field, Some(value));
                true
            }
            None => false,
        }
    }

    /// Gets a field formatted as a decimal string with six fractional digits.
    pub fn formatted(&self, field: ReplayGainField) -> Option<String> {
        self.get(field).map(|value| format!("{:.6}", value))
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        ReplayGainField::ALL.iter().all(|&field| self.get(field).is_none())
    }
}

fn parse_leading_decimal(value: &str) -> Option<f32> {
    let value = value.trim_start();

    let end = value
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(value.len());

    value[..end].parse::<f32>().ok().filter(|value| value.is_finite())
}
