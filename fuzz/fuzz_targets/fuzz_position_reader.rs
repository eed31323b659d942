#![no_main]

use libfuzzer_sys::fuzz_target;
use maps_filter::{Classifier, Mode, Thresholds, position::Reader};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(Cursor::new(data));
    let Ok(header) = reader.read_header() else {
        return;
    };

    let mutation = Classifier::new(Mode::Mutation, Thresholds::default(), header.libraries.clone());
    let genotyping = Classifier::new(Mode::Genotyping, Thresholds::default(), header.libraries);

    // Parse errors and fatal allele mismatches are fine; panics are not
    for record in reader.take(1000).flatten() {
        if let Ok(outcome) = mutation.classify(&record) {
            let _ = format!("{outcome:?}");
        }
        let _ = genotyping.classify(&record);
    }
});
