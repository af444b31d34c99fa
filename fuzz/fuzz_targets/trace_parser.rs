#![no_main]

use compile_timer::attribution::resolve_parents;
use compile_timer::trace::parse_trace_str;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Parsing and containment must never panic, whatever the trace holds
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(unit) = parse_trace_str(input, Path::new("fuzz.json")) {
            let _ = resolve_parents(&unit.sources);
        }
    }
});
