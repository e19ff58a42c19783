#![no_main]

use libfuzzer_sys::fuzz_target;
use bertlv::{Builder, Parser};

fuzz_target!(|data: &[u8]| {
    // Copy the stream through a builder. The rebuilt form can be longer
    // than the input because the encoder never uses the one-octet long
    // length form, so give the builder some headroom.
    let mut builder = Builder::new(64, 16, 0);
    builder.begin(data.len().saturating_mul(2) + 8);
    let mut parser = Parser::new(16);
    if parser.parse(data, &mut builder).is_ok() {
        let rebuilt = builder.finish_into_bytes().expect("rebuild failed");
        // The rebuilt document must itself parse.
        let mut copy = Builder::new(64, 16, 0);
        copy.begin(rebuilt.len());
        let mut parser = Parser::new(16);
        parser.parse(&rebuilt, &mut copy).expect("reparse failed");
        let twice = copy.finish_into_bytes().expect("refinish failed");
        // Once normalized, rebuilding is a fixed point.
        assert_eq!(rebuilt, twice);
    }
});
