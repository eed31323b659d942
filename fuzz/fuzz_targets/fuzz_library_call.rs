#![no_main]

use libfuzzer_sys::fuzz_target;
use maps_filter::call::{LibraryCall, LibraryObservation};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    let Ok(call) = LibraryCall::parse(&input) else {
        return;
    };
    let _ = call.to_string();
    let genotype = call.token();
    assert_eq!(genotype.is_called(), call.is_called());

    let observation = LibraryObservation::new(call, 100);
    if let LibraryCall::Homozygous { pct, .. } = observation.call {
        let _ = observation.allele_coverage(pct);
    }
});
