#![no_main]
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use boxwise::isomp4::WriteOptions;
use boxwise::metadata::TagRecord;

fuzz_target!(|data: Vec<u8>| {
    let mut tags = TagRecord::new();
    tags.append("artist", "Fuzz Artist").append("track", "3").append("genre", "Blues");

    // Any rewrite that succeeds must leave a container that parses again.
    let mut sink = Cursor::new(data);
    if boxwise::write_tags(&mut sink, 0, &tags, &WriteOptions::default()).is_ok() {
        assert!(boxwise::read_tags(Box::new(sink), 0).is_ok());
    }
});
