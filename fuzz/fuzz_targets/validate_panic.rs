#![no_main]
use libfuzzer_sys::fuzz_target;
use mathguard_core::{DelimiterTable, KatexEngine, Segment, Validator, segment};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let table = DelimiterTable::shared();

    // Segmentation must always reproduce the input.
    if let Ok(segments) = segment(&text, table) {
        let joined: String = segments.iter().map(Segment::raw).collect();
        assert_eq!(joined, text);
    }

    let comparison = Validator::new(&KatexEngine).compare(&text);
    assert_eq!(comparison.direct.is_valid, comparison.direct.errors.is_empty());
});
