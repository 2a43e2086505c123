// Boxwise Check Tool
// Copyright (c) 2024-2026 The Project Boxwise Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use boxwise::core::errors::{Error, Result};
use boxwise::isomp4::{self, ParseOptions, Placement, WriteOptions};
use boxwise::metadata::{ReplayGainField, TagRecord};

use clap::{Parser, Subcommand};
use log::{info, warn};

mod report;

#[derive(Parser, Debug)]
#[command(name = "Boxwise Check", version, about = "Inspect and tag ISO/MP4 files")]
struct Args {
    /// The number of bytes preceding the container (e.g., an ID3v2 tag)
    #[arg(long, global = true, default_value_t = 0)]
    offset: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the atom tree
    Dump {
        /// The input file path
        path: PathBuf,
    },
    /// Print the iTunes tags
    Tags {
        /// The input file path
        path: PathBuf,
    },
    /// Print the sample tables of the audio tracks
    Samples {
        /// The input file path
        path: PathBuf,
        /// Only print the track with this 1-based index
        #[arg(long)]
        track: Option<usize>,
        /// Print the size, byte offset, and duration of this 0-based sample
        #[arg(long)]
        sample: Option<u64>,
    },
    /// Replace tags and write them back to the file
    Write {
        /// The input file path
        path: PathBuf,
        /// A tag to set, as key=value. An empty value removes the key. Repeat a key to set
        /// several values.
        #[arg(long = "tag", value_parser = parse_key_value, required = true)]
        tags: Vec<(String, String)>,
        /// Write into free space between the file type and media data atoms when possible
        #[arg(long)]
        reclaim: bool,
    },
}

fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_lowercase(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

fn open(path: &Path, offset: u64) -> Result<isomp4::AtomTree> {
    let file = Box::new(File::open(path)?);
    isomp4::open(file, offset, &ParseOptions::default())
}

/// Apply `key=value` assignments to a tag record. The first assignment of a key replaces all its
/// previous values, later assignments of the same key append.
fn apply_assignments(record: &mut TagRecord, assignments: &[(String, String)]) {
    let mut assigned: Vec<&str> = Vec::new();

    for (key, value) in assignments {
        if let Some(field) = ReplayGainField::from_tag_name(key) {
            if value.is_empty() {
                record.replay_gain.set(field, None);
            }
            else if !record.replay_gain.set_from_str(field, value) {
                warn!("ignoring invalid replay gain value '{}' for {}", value, key);
            }
            continue;
        }

        if !assigned.contains(&key.as_str()) {
            record.remove(key);
            assigned.push(key.as_str());
        }

        if !value.is_empty() {
            record.append(key, value);
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Dump { path } => {
            let tree = open(&path, args.offset)?;
            print!("{}", report::dump_tree(&tree));
        }
        Command::Tags { path } => {
            let tree = open(&path, args.offset)?;
            print!("{}", report::tags(&isomp4::read_tags(&tree.atoms)));
        }
        Command::Samples { path, track, sample } => {
            let tree = open(&path, args.offset)?;
            print!("{}", report::samples(&tree, track, sample));
        }
        Command::Write { path, tags, reclaim } => {
            let mut record = boxwise::read_file_tags(&path, args.offset)?;
            apply_assignments(&mut record, &tags);

            let options = WriteOptions { reclaim_free_space: reclaim };

            match boxwise::write_file_tags(&path, args.offset, &record, &options)? {
                Placement::InPlace { pos, padding } => {
                    info!("rewrote movie atom in place at {} ({} bytes of padding)", pos, padding);
                }
                Placement::Relocate { new_pos, .. } => {
                    info!("relocated movie atom to {}", new_pos)
                }
                Placement::Reclaim { pos, .. } => {
                    info!("moved movie atom into free space at {}", pos)
                }
            }
        }
    }

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => (),
        Err(Error::Unsupported(err)) => {
            eprintln!("Unsupported: {}", err);
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    }
}
