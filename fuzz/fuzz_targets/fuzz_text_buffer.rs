#![no_main]

use kestrel_core::source::{Encoding, TextBuffer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, bytes)) = data.split_first() else {
        return;
    };
    let encoding = match selector % 3 {
        0 => Encoding::Ascii,
        1 => Encoding::Utf8,
        _ => Encoding::Utf16,
    };

    let buffer = TextBuffer::new(bytes, encoding, 0, bytes.len());

    // Walking the buffer character by character must stay in bounds and
    // always advance.
    let mut index = 0;
    while index < buffer.len() {
        let code = buffer.char_code(index);
        let _ = buffer.char_at(index);
        let width = buffer.char_length(code);
        assert!(width >= 1);
        index += width;
    }
    let _ = buffer.slice(0, buffer.len());
});
