#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_layout::panels::wrap::partition_lines;

fuzz_target!(|input: (Vec<f32>, f32)| {
    let (footprints, extent) = input;
    let lines = partition_lines(&footprints, extent);

    // Lines are non-empty, contiguous, and cover every footprint once.
    let mut next = 0;
    for line in &lines {
        assert!(!line.is_empty(), "empty line");
        assert_eq!(line.start, next, "gap or overlap between lines");
        next = line.end;
    }
    assert_eq!(next, footprints.len(), "footprints left unplaced");
});
