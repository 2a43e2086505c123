use std::io::Cursor;

use boxwise::isomp4::parser::{open, ParseOptions};
use boxwise::isomp4::sample_table::SampleTable;
use boxwise::isomp4::tags::read_tags;
use boxwise::isomp4::AtomTree;

/// Parse a container with every atom retained, then exercise the read-only queries on the tree.
pub fn fuzz_parse(data: Vec<u8>) -> Option<AtomTree> {
    let options = ParseOptions { retain_unknown: true, ..Default::default() };

    let tree = open(Box::new(Cursor::new(data)), 0, &options).ok()?;

    let _ = read_tags(&tree.atoms);

    if let Some(moov) = tree.find("moov") {
        for trak in moov.children.iter().filter_map(SampleTable::for_track) {
            let count = trak.total_sample_count().min(4096);
            for sample in 0..count {
                let _ = trak.sample_size(sample);
                let _ = trak.sample_byte_offset(sample);
                let _ = trak.sample_duration(sample + 1);
            }
        }
    }

    let mut out = String::new();
    let _ = boxwise::isomp4::dump::dump(&tree.atoms, 0, &mut out);

    Some(tree)
}
