#![no_main]

use kestrel_core::parser::preparser::preparse;
use kestrel_core::parser::{FunctionParseType, parse_function_body, parse_program};
use kestrel_core::source::SourceText;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let source = SourceText::new(text);

    // The checker and the tree builder must agree on validity.
    let checked = preparse(&source);
    assert_eq!(checked.is_ok(), parse_program(&source).is_ok());

    // Every recorded non-arrow function must re-parse on its own.  Arrows
    // depend on their enclosing function for `new.target` and `super`.
    if let Ok(result) = checked {
        for function in result.functions.iter().filter(|f| f.parse_type == FunctionParseType::Normal) {
            let body = parse_function_body(&function.source(&source), function.options());
            assert!(body.is_ok(), "lazy re-parse of {:?} failed: {body:?}", function.name);
        }
    }
});
