// Boxwise
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Queries over the sample table (`stbl`) of a track.
//!
//! All queries are pure and return 0 when a table they need is absent. Sample indices passed to
//! `sample_duration` are 1-based, while those passed to `sample_size` and `sample_byte_offset`
//! are 0-based.

use crate::atoms::{
    Atom, AtomData, AtomType, Co64Atom, MdhdAtom, SampleSize, StcoAtom, StscAtom, StszAtom,
    SttsAtom,
};

/// A view over the tables of a sample table atom.
#[derive(Copy, Clone, Debug, Default)]
pub struct SampleTable<'a> {
    stts: Option<&'a SttsAtom>,
    stsc: Option<&'a StscAtom>,
    stsz: Option<&'a StszAtom>,
    stco: Option<&'a StcoAtom>,
    co64: Option<&'a Co64Atom>,
    mdhd: Option<&'a MdhdAtom>,
}

impl<'a> SampleTable<'a> {
    /// Gather the tables of a sample table atom.
    pub fn new(stbl: &'a Atom) -> Self {
        let mut table = SampleTable::default();

        for child in &stbl.children {
            match &child.data {
                AtomData::TimeToSample(stts) => table.stts = table.stts.or(Some(stts)),
                AtomData::SampleToChunk(stsc) => table.stsc = table.stsc.or(Some(stsc)),
                AtomData::SampleSize(stsz) => table.stsz = table.stsz.or(Some(stsz)),
                AtomData::ChunkOffset(stco) => table.stco = table.stco.or(Some(stco)),
                AtomData::ChunkOffset64(co64) => table.co64 = table.co64.or(Some(co64)),
                _ => (),
            }
        }

        table
    }

    /// Gather the sample table and media header of a track atom. Returns `None` if the track has
    /// no sample table.
    pub fn for_track(trak: &'a Atom) -> Option<Self> {
        let mdia = trak.child(AtomType::Media)?;
        let stbl = mdia.child(AtomType::MediaInfo)?.child(AtomType::SampleTable)?;

        let mut table = SampleTable::new(stbl);

        if let Some(AtomData::MediaHeader(mdhd)) =
            mdia.child(AtomType::MediaHeader).map(|atom| &atom.data)
        {
            table.mdhd = Some(mdhd);
        }

        Some(table)
    }

    /// The total number of samples.
    pub fn total_sample_count(&self) -> u64 {
        self.stts.map_or(0, |stts| stts.total_sample_count())
    }

    /// Get the duration of the 1-based sample `sample_num`.
    pub fn sample_duration(&self, sample_num: u64) -> u32 {
        self.stts.map_or(0, |stts| stts.sample_duration(sample_num))
    }

    /// The total duration of all samples in timescale units.
    pub fn total_duration(&self) -> u64 {
        self.stts.map_or(0, |stts| stts.total_duration())
    }

    /// Get the size of the 0-based sample `sample`.
    pub fn sample_size(&self, sample: u64) -> u32 {
        self.stsz.map_or(0, |stsz| stsz.sample_size(sample))
    }

    /// Get the byte offset of the 0-based sample `sample`, relative to the start of the
    /// container.
    pub fn sample_byte_offset(&self, sample: u64) -> u64 {
        self.try_sample_byte_offset(sample).unwrap_or(0)
    }

    /// The sample rate of the track, taken from the media timescale.
    pub fn sample_rate(&self) -> Option<u32> {
        self.mdhd.map(|mdhd| mdhd.timescale).filter(|&timescale| timescale > 0)
    }

    /// The duration of the track in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.sample_rate().map(|rate| self.total_duration() as f64 / f64::from(rate))
    }

    fn chunk_offset(&self, chunk: u64) -> Option<u64> {
        let chunk = usize::try_from(chunk).ok()?;

        match (self.co64, self.stco) {
            (Some(co64), _) => co64.chunk_offsets.get(chunk).copied(),
            (None, Some(stco)) => stco.chunk_offsets.get(chunk).map(|&offset| u64::from(offset)),
            (None, None) => None,
        }
    }

    fn try_sample_byte_offset(&self, sample: u64) -> Option<u64> {
        let entries = &self.stsc?.entries;
        let stsz = self.stsz?;

        // Find the run of chunks containing the sample. The run of the last entry spans all
        // remaining chunks.
        let mut run_start = 0u64;
        let mut run = entries.first()?;

        for (i, entry) in entries.iter().enumerate() {
            run = entry;

            let next = match entries.get(i + 1) {
                Some(next) => next,
                None => break,
            };

            let run_chunks = u64::from(next.first_chunk.saturating_sub(entry.first_chunk));
            let run_len = run_chunks * u64::from(entry.samples_per_chunk);

            if run_start.saturating_add(run_len) > sample {
                break;
            }

            run_start = run_start.saturating_add(run_len);
        }

        let samples_per_chunk = u64::from(run.samples_per_chunk);

        if samples_per_chunk == 0 {
            return None;
        }

        // The chunk containing the sample, and the first sample of that chunk.
        let chunk_in_run = (sample - run_start) / samples_per_chunk;
        let chunk = u64::from(run.first_chunk.saturating_sub(1)) + chunk_in_run;
        let chunk_first_sample = run_start + chunk_in_run * samples_per_chunk;

        let chunk_offset = self.chunk_offset(chunk)?;

        let offset_in_chunk = match &stsz.sample_sizes {
            SampleSize::Constant(size) => u64::from(*size) * (sample - chunk_first_sample),
            SampleSize::Variable(sizes) => {
                let start = usize::try_from(chunk_first_sample).ok()?;
                let end = usize::try_from(sample).ok()?;

                sizes.get(start..end)?.iter().map(|&size| u64::from(size)).sum()
            }
        };

        Some(chunk_offset + offset_in_chunk)
    }
}

/// The total number of samples of a sample table atom.
pub fn total_sample_count(stbl: &Atom) -> u64 {
    SampleTable::new(stbl).total_sample_count()
}

/// Get the duration of the 1-based sample `sample_num` of a sample table atom.
pub fn sample_duration(stbl: &Atom, sample_num: u64) -> u32 {
    SampleTable::new(stbl).sample_duration(sample_num)
}

/// The total duration of all samples of a sample table atom in timescale units.
pub fn total_duration(stbl: &Atom) -> u64 {
    SampleTable::new(stbl).total_duration()
}

/// Get the size of the 0-based sample `sample` of a sample table atom.
pub fn sample_size(stbl: &Atom, sample: u64) -> u32 {
    SampleTable::new(stbl).sample_size(sample)
}

/// Get the byte offset of the 0-based sample `sample` of a sample table atom.
pub fn sample_byte_offset(stbl: &Atom, sample: u64) -> u64 {
    SampleTable::new(stbl).sample_byte_offset(sample)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::atoms::{SampleDurationEntry, SampleToChunkEntry};

    use super::*;

    fn stbl(children: Vec<AtomData>) -> Atom {
        let mut stbl = Atom::new_container(AtomType::SampleTable);

        for data in children {
            let atom_type = match &data {
                AtomData::TimeToSample(_) => AtomType::TimeToSample,
                AtomData::SampleToChunk(_) => AtomType::SampleToChunk,
                AtomData::SampleSize(_) => AtomType::SampleSize,
                AtomData::ChunkOffset(_) => AtomType::ChunkOffset,
                AtomData::ChunkOffset64(_) => AtomType::ChunkOffset64,
                _ => unreachable!(),
            };
            stbl.children.push(Atom::new(atom_type, data));
        }

        stbl
    }

    fn stsc(entries: &[(u32, u32)]) -> AtomData {
        AtomData::SampleToChunk(StscAtom {
            entries: entries
                .iter()
                .map(|&(first_chunk, samples_per_chunk)| SampleToChunkEntry {
                    first_chunk,
                    samples_per_chunk,
                    sample_desc_index: 1,
                })
                .collect(),
            ..Default::default()
        })
    }

    fn stsz(sample_sizes: SampleSize, sample_count: u32) -> AtomData {
        AtomData::SampleSize(StszAtom { sample_count, sample_sizes, ..Default::default() })
    }

    fn stco(chunk_offsets: Vec<u32>) -> AtomData {
        AtomData::ChunkOffset(StcoAtom { chunk_offsets, ..Default::default() })
    }

    #[test]
    fn verify_missing_tables() {
        let table = stbl(vec![]);

        assert_eq!(total_sample_count(&table), 0);
        assert_eq!(sample_duration(&table, 1), 0);
        assert_eq!(total_duration(&table), 0);
        assert_eq!(sample_size(&table, 0), 0);
        assert_eq!(sample_byte_offset(&table, 0), 0);

        // An empty sample-to-chunk table.
        let table = stbl(vec![stsc(&[]), stsz(SampleSize::Constant(4), 4), stco(vec![100])]);
        assert_eq!(sample_byte_offset(&table, 1), 0);
    }

    #[test]
    fn verify_sample_byte_offset() {
        // Chunks 1 and 2 hold 2 samples each, chunk 3 and later hold 1 sample each.
        let table = stbl(vec![
            stsc(&[(1, 2), (3, 1)]),
            stsz(SampleSize::Variable(vec![10, 20, 30, 40, 50, 60]), 6),
            stco(vec![1000, 2000, 3000, 4000]),
        ]);

        let expected = [1000, 1010, 2000, 2030, 3000, 4000];

        for (sample, &offset) in expected.iter().enumerate() {
            assert_eq!(sample_byte_offset(&table, sample as u64), offset, "sample {}", sample);
        }

        // Past the chunk offset table.
        assert_eq!(sample_byte_offset(&table, 6), 0);
    }

    #[test]
    fn verify_co64_preferred() {
        let table = stbl(vec![
            stsc(&[(1, 4)]),
            stsz(SampleSize::Constant(100), 8),
            stco(vec![0, 0]),
            AtomData::ChunkOffset64(Co64Atom {
                chunk_offsets: vec![1 << 32, (1 << 32) + 400],
                ..Default::default()
            }),
        ]);

        assert_eq!(sample_byte_offset(&table, 3), (1 << 32) + 300);
        assert_eq!(sample_byte_offset(&table, 5), (1 << 32) + 500);
    }

    #[test]
    fn verify_generated_stts() {
        let mut rng = SmallRng::seed_from_u64(0x5151);

        for _ in 0..50 {
            let entries: Vec<SampleDurationEntry> = (0..rng.random_range(1..8))
                .map(|_| SampleDurationEntry {
                    sample_count: rng.random_range(0..20),
                    sample_delta: rng.random_range(1..4096),
                })
                .collect();

            let expanded: Vec<u32> = entries
                .iter()
                .flat_map(|entry| {
                    std::iter::repeat(entry.sample_delta).take(entry.sample_count as usize)
                })
                .collect();

            let stts = SttsAtom { entries, ..Default::default() };
            let table = stbl(vec![AtomData::TimeToSample(stts)]);

            assert_eq!(total_sample_count(&table), expanded.len() as u64);
            assert_eq!(
                total_duration(&table),
                expanded.iter().map(|&delta| u64::from(delta)).sum::<u64>()
            );

            for (i, &delta) in expanded.iter().enumerate() {
                assert_eq!(sample_duration(&table, i as u64 + 1), delta);
            }

            assert_eq!(sample_duration(&table, expanded.len() as u64 + 1), 0);
        }
    }

    #[test]
    fn verify_generated_sample_offsets() {
        let mut rng = SmallRng::seed_from_u64(0x0ff5e7);

        for _ in 0..50 {
            // Generate the sample-to-chunk runs.
            let mut runs = Vec::new();
            let mut first_chunk = 1;

            for _ in 0..rng.random_range(1..5) {
                runs.push((first_chunk, rng.random_range(1..8)));
                first_chunk += rng.random_range(1..4);
            }

            let num_chunks = first_chunk + rng.random_range(0..4) - 1;

            // The number of samples in each chunk.
            let chunk_lens: Vec<u32> = (1..=num_chunks)
                .map(|chunk| runs.iter().rev().find(|run| run.0 <= chunk).map_or(0, |run| run.1))
                .collect();

            let num_samples: u32 = chunk_lens.iter().sum();

            let uniform = rng.random_bool(0.5);

            let sizes: Vec<u32> = if uniform {
                vec![rng.random_range(1..2048); num_samples as usize]
            }
            else {
                (0..num_samples).map(|_| rng.random_range(1..2048)).collect()
            };

            // Lay the chunks out contiguously.
            let base = 4096;
            let mut chunk_offsets = Vec::new();
            let mut sample = 0;
            let mut offset = base;

            for len in &chunk_lens {
                chunk_offsets.push(offset);
                for _ in 0..*len {
                    offset += sizes[sample];
                    sample += 1;
                }
            }

            let sample_sizes = if uniform {
                SampleSize::Constant(sizes[0])
            }
            else {
                SampleSize::Variable(sizes.clone())
            };

            let table =
                stbl(vec![stsc(&runs), stsz(sample_sizes, num_samples), stco(chunk_offsets)]);

            let mut expected = u64::from(base);
            let mut prev = 0;

            for (n, &size) in sizes.iter().enumerate() {
                let offset = sample_byte_offset(&table, n as u64);

                assert_eq!(offset, expected, "sample {} of {:?}", n, runs);
                assert!(offset >= prev);

                expected += u64::from(size);
                prev = offset;
            }
        }
    }

    #[test]
    fn verify_track_helpers() {
        let mut stbl = stbl(vec![AtomData::TimeToSample(SttsAtom {
            entries: vec![SampleDurationEntry { sample_count: 44100, sample_delta: 2 }],
            ..Default::default()
        })]);
        stbl.update_size();

        let mut minf = Atom::new_container(AtomType::MediaInfo);
        minf.children.push(stbl);

        let mdhd = MdhdAtom { timescale: 44100, ..Default::default() };

        let mut mdia = Atom::new_container(AtomType::Media);
        mdia.children.push(Atom::new(AtomType::MediaHeader, AtomData::MediaHeader(mdhd)));
        mdia.children.push(minf);

        let mut trak = Atom::new_container(AtomType::Track);
        trak.children.push(mdia);

        let table = SampleTable::for_track(&trak).unwrap();
        assert_eq!(table.sample_rate(), Some(44100));
        assert_eq!(table.duration_secs(), Some(2.0));

        let empty = Atom::new_container(AtomType::Track);
        assert!(SampleTable::for_track(&empty).is_none());
    }
}
