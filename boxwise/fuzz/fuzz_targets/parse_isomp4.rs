#![no_main]
use libfuzzer_sys::fuzz_target;
use boxwise_fuzz::fuzz_parse;

fuzz_target!(|data: Vec<u8>| {
    let _ = fuzz_parse(data);
});
