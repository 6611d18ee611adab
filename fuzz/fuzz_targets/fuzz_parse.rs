#![no_main]

use kestrel_core::parser::{ParseOptions, parse_program_with};
use kestrel_core::source::SourceText;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };

    // Bit 0 selects module goal, bit 1 forces strict mode.
    let mut options = if flags & 1 == 0 {
        ParseOptions::default()
    } else {
        ParseOptions::module()
    };
    options.strict |= flags & 2 != 0;

    let source = SourceText::new(text);
    let first = parse_program_with(&source, options);
    let second = parse_program_with(&source, options);
    assert_eq!(first, second, "parsing must be deterministic");

    if let Err(error) = first {
        assert!(error.line >= 1, "error lines are 1-based");
        assert!(error.column >= 1, "error columns are 1-based");
    }
});
