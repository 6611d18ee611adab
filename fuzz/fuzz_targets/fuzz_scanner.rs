#![no_main]

use kestrel_core::parser::scanner::Scanner;
use kestrel_core::parser::token::{Token, TokenKind};
use kestrel_core::source::SourceText;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);
    let source = SourceText::new(&text);
    let mut scanner = Scanner::new(&source);
    let mut token = Token::default();
    let strict = flags & 1 != 0;

    // The scanner must make progress on every token and stop at end of input
    // or at the first error.
    let mut last_end = 0;
    loop {
        let kind = scanner.next_token(&mut token, strict);
        if kind == TokenKind::Eof || kind.is_error() {
            break;
        }
        assert!(token.location.begin >= last_end);
        assert!(token.location.begin < token.location.end);
        last_end = token.location.end;
    }
});
