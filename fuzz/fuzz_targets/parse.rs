#![no_main]

use libfuzzer_sys::fuzz_target;
use bertlv::{Frames, Parser, Tag, Visitor};

struct Accept;

impl<'a> Visitor<'a> for Accept {
    fn primitive(
        &mut self, _: &Frames, _: usize, _: Tag, _: &'a [u8]
    ) -> bool {
        true
    }

    fn begin_constructed(&mut self, _: &Frames, _: usize, _: Tag) -> bool {
        true
    }

    fn finish_constructed(&mut self, _: &Frames, _: usize, _: Tag) -> bool {
        true
    }
}

fuzz_target!(|data: &[u8]| {
    let mut parser = Parser::new(16);
    let _ = parser.parse(data, &mut Accept);
});
