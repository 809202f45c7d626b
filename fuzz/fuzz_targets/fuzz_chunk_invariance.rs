#![no_main]

use formsink::{Multipart, ParseFailure, PartHeaders, PartSink};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Default, PartialEq)]
struct Record {
    names: Vec<String>,
    bodies: Vec<Vec<u8>>,
    ended: usize,
}

impl PartSink for Record {
    fn on_part_begin(&mut self, headers: &PartHeaders) {
        self.names.push(headers.name().to_owned());
        self.bodies.push(Vec::new());
    }

    fn on_part_data(&mut self, chunk: &[u8]) {
        if let Some(body) = self.bodies.last_mut() {
            body.extend_from_slice(chunk);
        }
    }

    fn on_part_end(&mut self) {
        self.ended += 1;
    }
}

fn run(data: &[u8], chunk_size: usize) -> (Record, Result<(), ParseFailure>) {
    let mut record = Record::default();
    let result = {
        let mut multipart = Multipart::builder("X-BOUNDARY")
            .expect("boundary")
            .register_with("all", &mut record, |_| true)
            .build();

        data.chunks(chunk_size)
            .try_for_each(|chunk| multipart.feed(chunk))
            .and_then(|_| multipart.finish())
    };
    (record, result)
}

fuzz_target!(|input: &[u8]| {
    let (chunk_size, data) = match input.split_first() {
        Some((first, rest)) => (usize::from(*first).max(1), rest),
        None => return,
    };

    let whole = run(data, data.len().max(1));
    assert_eq!(run(data, chunk_size), whole);
    assert_eq!(run(data, 1), whole);
});
