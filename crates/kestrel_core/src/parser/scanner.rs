//! JavaScript lexer (scanner).
//!
//! The [`Scanner`] reads units from a [`TextBuffer`] and writes one token at a
//! time into a caller-owned scratch [`Token`].  It never allocates a token
//! stream and never panics: malformed input produces a
//! [`TokenKind::Error`] / [`TokenKind::UnterminatedError`] token and leaves a
//! message in [`Scanner::error_message`].
//!
//! Whether a `/` starts a regular expression is decided by the parser, which
//! asks for a re-scan through [`Scanner::scan_regex`].

use crate::source::{SourceText, TextBuffer};

use super::token::{Token, TokenKind, TokenLocation, TokenValue, keyword_kind};

// ─────────────────────────────────────────────────────────────────────────────
// Character classification
// ─────────────────────────────────────────────────────────────────────────────

/// Class of an ASCII unit.
///
/// The identifier classes must stay at the end of the enum: a unit can
/// continue an identifier iff its class is `>= IdentifierBegin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Invalid,
    Whitespace,
    LineTerminator,
    Bang,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Question,
    Tilde,
    Quote,
    BackQuote,
    Dot,
    Slash,
    Backslash,
    Semicolon,
    Equal,
    Less,
    Greater,
    Plus,
    Minus,
    Star,
    Percent,
    Ampersand,
    Caret,
    Pipe,
    // identifier classes
    IdentifierBegin,
    Zero,
    Number,
}

const fn build_char_classes() -> [CharClass; 128] {
    let mut table = [CharClass::Invalid; 128];
    let mut i = 0;
    while i < 128 {
        let c = i as u8;
        table[i] = match c {
            b'\t' | 0x0B | 0x0C | b' ' => CharClass::Whitespace,
            b'\n' | b'\r' => CharClass::LineTerminator,
            b'!' => CharClass::Bang,
            b'(' => CharClass::LeftParen,
            b')' => CharClass::RightParen,
            b'[' => CharClass::LeftBracket,
            b']' => CharClass::RightBracket,
            b'{' => CharClass::LeftBrace,
            b'}' => CharClass::RightBrace,
            b',' => CharClass::Comma,
            b':' => CharClass::Colon,
            b'?' => CharClass::Question,
            b'~' => CharClass::Tilde,
            b'"' | b'\'' => CharClass::Quote,
            b'`' => CharClass::BackQuote,
            b'.' => CharClass::Dot,
            b'/' => CharClass::Slash,
            b'\\' => CharClass::Backslash,
            b';' => CharClass::Semicolon,
            b'=' => CharClass::Equal,
            b'<' => CharClass::Less,
            b'>' => CharClass::Greater,
            b'+' => CharClass::Plus,
            b'-' => CharClass::Minus,
            b'*' => CharClass::Star,
            b'%' => CharClass::Percent,
            b'&' => CharClass::Ampersand,
            b'^' => CharClass::Caret,
            b'|' => CharClass::Pipe,
            b'$' | b'_' | b'a'..=b'z' | b'A'..=b'Z' => CharClass::IdentifierBegin,
            b'0' => CharClass::Zero,
            b'1'..=b'9' => CharClass::Number,
            _ => CharClass::Invalid,
        };
        i += 1;
    }
    table
}

static CHAR_CLASSES: [CharClass; 128] = build_char_classes();

/// Class of `code`; non-ASCII code points are classified through their
/// Unicode properties.
fn char_class(code: u32) -> CharClass {
    if code < 128 {
        return CHAR_CLASSES[code as usize];
    }
    if is_line_terminator(code) {
        CharClass::LineTerminator
    } else if is_whitespace(code) {
        CharClass::Whitespace
    } else if is_identifier_start(code) {
        CharClass::IdentifierBegin
    } else {
        CharClass::Invalid
    }
}

/// Returns `true` for *LineTerminator* code points.
fn is_line_terminator(code: u32) -> bool {
    matches!(code, 0x0A | 0x0D | 0x2028 | 0x2029)
}

/// Returns `true` for *WhiteSpace* code points (line terminators excluded).
fn is_whitespace(code: u32) -> bool {
    matches!(
        code,
        0x09 | 0x0B | 0x0C | 0x20   // TAB, VT, FF, SPACE
        | 0xA0                      // NO-BREAK SPACE
        | 0xFEFF                    // BOM
        | 0x1680                    // OGHAM SPACE MARK
        | 0x2000..=0x200A           // EN QUAD … HAIR SPACE
        | 0x202F | 0x205F | 0x3000
    )
}

/// Returns `true` for code points that may start an identifier.
fn is_identifier_start(code: u32) -> bool {
    if code < 128 {
        return CHAR_CLASSES[code as usize] == CharClass::IdentifierBegin;
    }
    char::from_u32(code).is_some_and(char::is_alphabetic)
}

/// Returns `true` for code points that may continue an identifier.
fn is_identifier_part(code: u32) -> bool {
    if code < 128 {
        return CHAR_CLASSES[code as usize] >= CharClass::IdentifierBegin;
    }
    code == 0x200C || code == 0x200D || char::from_u32(code).is_some_and(char::is_alphanumeric)
}

fn hex_value(code: u32) -> Option<u32> {
    char::from_u32(code).and_then(|c| c.to_digit(16))
}

fn push_code_point(out: &mut String, code: u32) {
    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
}

// ─────────────────────────────────────────────────────────────────────────────
// ScannerState
// ─────────────────────────────────────────────────────────────────────────────

/// A plain copy of the scanner's position, taken by [`Scanner::save`] and
/// re-applied by [`Scanner::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScannerState {
    /// Next unit to read.
    pub position: usize,
    /// Current 1-based line.
    pub line: u32,
    /// First unit of the current line.
    pub line_begin: usize,
    /// Line on which the previous token ended.
    pub last_line: u32,
    /// End offset of the previous token.
    pub last_token_end: usize,
    /// Whether a line terminator preceded the current token.
    pub has_line_terminator: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

type Scanned = (TokenKind, TokenValue);

/// JavaScript lexer over a [`SourceText`] span.
///
/// # Example
///
/// ```
/// use kestrel_core::parser::scanner::Scanner;
/// use kestrel_core::parser::token::{Token, TokenKind};
/// use kestrel_core::source::SourceText;
///
/// let source = SourceText::new("let x = 42;");
/// let mut scanner = Scanner::new(&source);
/// let mut token = Token::default();
/// while scanner.next_token(&mut token, false) != TokenKind::Eof {
///     println!("{:?}", token.kind);
/// }
/// ```
pub struct Scanner<'src> {
    buffer: &'src TextBuffer,
    position: usize,
    end: usize,
    line: u32,
    line_begin: usize,
    last_line: u32,
    last_token_end: usize,
    has_line_terminator: bool,
    error: Option<String>,
}

impl<'src> Scanner<'src> {
    /// Create a scanner positioned at the start of `source`.
    pub fn new(source: &'src SourceText) -> Self {
        let begin = source.begin();
        Self {
            buffer: source.buffer(),
            position: begin,
            end: source.end(),
            line: source.start_line(),
            line_begin: begin,
            last_line: source.start_line(),
            last_token_end: begin,
            has_line_terminator: false,
            error: None,
        }
    }

    /// The buffer being scanned.
    pub fn buffer(&self) -> &'src TextBuffer {
        self.buffer
    }

    /// Next unit to read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current 1-based line.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// First unit of the current line.
    pub fn line_begin(&self) -> usize {
        self.line_begin
    }

    /// Line on which the previous token ended.
    pub fn last_line(&self) -> u32 {
        self.last_line
    }

    /// End offset of the previous token.
    pub fn last_token_end(&self) -> usize {
        self.last_token_end
    }

    /// Whether a line terminator appeared between the previous token and the
    /// current one.
    pub fn has_line_terminator(&self) -> bool {
        self.has_line_terminator
    }

    /// The message left by the last failed scan, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Snapshot of the position state.
    pub fn save(&self) -> ScannerState {
        ScannerState {
            position: self.position,
            line: self.line,
            line_begin: self.line_begin,
            last_line: self.last_line,
            last_token_end: self.last_token_end,
            has_line_terminator: self.has_line_terminator,
        }
    }

    /// Re-apply a snapshot taken by [`save`](Self::save).
    pub fn restore(&mut self, state: ScannerState) {
        self.set_position(state.position);
        self.line = state.line;
        self.line_begin = state.line_begin;
        self.last_line = state.last_line;
        self.last_token_end = state.last_token_end;
        self.has_line_terminator = state.has_line_terminator;
    }

    /// Re-seek to `position` and clear any pending error.  Line tracking is
    /// left alone; use [`restore`](Self::restore) to rewind lines as well.
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.end);
        self.error = None;
    }

    /// Code point `offset` units past the current position, or `0` past the
    /// end of the span.
    pub fn peek(&self, offset: usize) -> u32 {
        let index = self.position + offset;
        if index < self.end {
            self.buffer.char_code(index)
        } else {
            0
        }
    }

    /// Returns `true` when the next significant character is `:`.
    pub fn is_next_token_colon(&mut self) -> bool {
        let saved = self.save();
        let colon = self.skip_trivia().is_ok() && self.current() == u32::from(b':');
        self.restore(saved);
        colon
    }

    // ── Low-level helpers ───────────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.position >= self.end
    }

    fn current(&self) -> u32 {
        self.peek(0)
    }

    fn advance(&mut self) {
        let code = self.current();
        self.position += self.buffer.char_length(code);
    }

    /// Consume one line terminator (CRLF counts once) and start a new line.
    fn consume_line_terminator(&mut self) {
        if self.current() == 0x0D && self.peek(1) == 0x0A {
            self.position += 2;
        } else {
            self.advance();
        }
        self.line += 1;
        self.line_begin = self.position;
    }

    fn fail(&mut self, message: &str) -> Scanned {
        self.error = Some(message.to_owned());
        (TokenKind::Error, TokenValue::None)
    }

    fn fail_unterminated(&mut self, message: &str) -> Scanned {
        self.error = Some(message.to_owned());
        (TokenKind::UnterminatedError, TokenValue::None)
    }

    fn punctuator(&mut self, length: usize, kind: TokenKind) -> Scanned {
        self.position += length;
        (kind, TokenValue::None)
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Skip whitespace and comments.  On an unterminated block comment the
    /// location of the comment is returned as the error.
    fn skip_trivia(&mut self) -> Result<(), TokenLocation> {
        loop {
            let code = self.current();
            if self.at_end() {
                return Ok(());
            }
            if is_line_terminator(code) {
                self.consume_line_terminator();
                self.has_line_terminator = true;
            } else if is_whitespace(code) {
                self.advance();
            } else if code == u32::from(b'/') && self.peek(1) == u32::from(b'/') {
                while !self.at_end() && !is_line_terminator(self.current()) {
                    self.advance();
                }
            } else if code == u32::from(b'/') && self.peek(1) == u32::from(b'*') {
                let start = TokenLocation {
                    line: self.line,
                    line_begin: self.line_begin,
                    begin: self.position,
                    end: self.position,
                };
                self.position += 2;
                loop {
                    if self.at_end() {
                        return Err(TokenLocation {
                            end: self.position,
                            ..start
                        });
                    }
                    let c = self.current();
                    if c == u32::from(b'*') && self.peek(1) == u32::from(b'/') {
                        self.position += 2;
                        break;
                    }
                    if is_line_terminator(c) {
                        self.consume_line_terminator();
                        self.has_line_terminator = true;
                    } else {
                        self.advance();
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    // ── Main entry point ────────────────────────────────────────────────────

    /// Scan the next token into `token` and return its kind.
    ///
    /// `strict` selects strict-mode lexing: legacy octal literals and escapes
    /// are rejected and strict-only reserved words come back as
    /// [`TokenKind::ReservedStrict`].
    pub fn next_token(&mut self, token: &mut Token, strict: bool) -> TokenKind {
        self.error = None;
        self.last_token_end = self.position;
        self.last_line = self.line;
        self.has_line_terminator = false;

        if let Err(location) = self.skip_trivia() {
            self.error = Some("Unterminated multiline comment".to_owned());
            token.kind = TokenKind::UnterminatedError;
            token.value = TokenValue::None;
            token.location = location;
            return token.kind;
        }

        token.location = TokenLocation {
            line: self.line,
            line_begin: self.line_begin,
            begin: self.position,
            end: self.position,
        };
        let (kind, value) = self.scan(strict);
        token.kind = kind;
        token.value = value;
        token.location.end = self.position;
        kind
    }

    fn scan(&mut self, strict: bool) -> Scanned {
        if self.at_end() {
            return (TokenKind::Eof, TokenValue::None);
        }
        let code = self.current();
        let next = self.peek(1);
        let eq = u32::from(b'=');
        match char_class(code) {
            CharClass::IdentifierBegin | CharClass::Backslash => self.scan_identifier(strict),
            CharClass::Zero | CharClass::Number => self.scan_number(strict),
            CharClass::Quote => self.scan_string(code, strict),
            CharClass::Dot => {
                if char_class(next) >= CharClass::Zero {
                    self.scan_number(strict)
                } else if next == u32::from(b'.') && self.peek(2) == u32::from(b'.') {
                    self.punctuator(3, TokenKind::DotDotDot)
                } else {
                    self.punctuator(1, TokenKind::Dot)
                }
            }
            CharClass::LeftParen => self.punctuator(1, TokenKind::LeftParen),
            CharClass::RightParen => self.punctuator(1, TokenKind::RightParen),
            CharClass::LeftBracket => self.punctuator(1, TokenKind::LeftBracket),
            CharClass::RightBracket => self.punctuator(1, TokenKind::RightBracket),
            CharClass::LeftBrace => self.punctuator(1, TokenKind::LeftBrace),
            CharClass::RightBrace => self.punctuator(1, TokenKind::RightBrace),
            CharClass::Comma => self.punctuator(1, TokenKind::Comma),
            CharClass::Colon => self.punctuator(1, TokenKind::Colon),
            CharClass::Question => self.punctuator(1, TokenKind::Question),
            CharClass::Semicolon => self.punctuator(1, TokenKind::Semicolon),
            CharClass::Tilde => self.punctuator(1, TokenKind::Tilde),
            CharClass::BackQuote => self.punctuator(1, TokenKind::BackQuote),
            CharClass::Bang => {
                if next == eq && self.peek(2) == eq {
                    self.punctuator(3, TokenKind::BangEqualEqual)
                } else if next == eq {
                    self.punctuator(2, TokenKind::BangEqual)
                } else {
                    self.punctuator(1, TokenKind::Bang)
                }
            }
            CharClass::Equal => {
                if next == eq && self.peek(2) == eq {
                    self.punctuator(3, TokenKind::EqualEqualEqual)
                } else if next == eq {
                    self.punctuator(2, TokenKind::EqualEqual)
                } else if next == u32::from(b'>') {
                    self.punctuator(2, TokenKind::Arrow)
                } else {
                    self.punctuator(1, TokenKind::Equal)
                }
            }
            CharClass::Less => {
                if next == u32::from(b'<') {
                    if self.peek(2) == eq {
                        self.punctuator(3, TokenKind::LessLessEqual)
                    } else {
                        self.punctuator(2, TokenKind::LessLess)
                    }
                } else if next == eq {
                    self.punctuator(2, TokenKind::LessEqual)
                } else {
                    self.punctuator(1, TokenKind::Less)
                }
            }
            CharClass::Greater => {
                let gt = u32::from(b'>');
                if next == gt && self.peek(2) == gt {
                    if self.peek(3) == eq {
                        self.punctuator(4, TokenKind::GreaterGreaterGreaterEqual)
                    } else {
                        self.punctuator(3, TokenKind::GreaterGreaterGreater)
                    }
                } else if next == gt {
                    if self.peek(2) == eq {
                        self.punctuator(3, TokenKind::GreaterGreaterEqual)
                    } else {
                        self.punctuator(2, TokenKind::GreaterGreater)
                    }
                } else if next == eq {
                    self.punctuator(2, TokenKind::GreaterEqual)
                } else {
                    self.punctuator(1, TokenKind::Greater)
                }
            }
            CharClass::Plus => self.operator(next, b'+', TokenKind::Plus, TokenKind::PlusPlus, TokenKind::PlusEqual),
            CharClass::Minus => self.operator(next, b'-', TokenKind::Minus, TokenKind::MinusMinus, TokenKind::MinusEqual),
            CharClass::Ampersand => self.operator(
                next,
                b'&',
                TokenKind::Ampersand,
                TokenKind::AmpersandAmpersand,
                TokenKind::AmpersandEqual,
            ),
            CharClass::Pipe => self.operator(next, b'|', TokenKind::Pipe, TokenKind::PipePipe, TokenKind::PipeEqual),
            CharClass::Star => self.assign_operator(next, TokenKind::Star, TokenKind::StarEqual),
            CharClass::Slash => self.assign_operator(next, TokenKind::Slash, TokenKind::SlashEqual),
            CharClass::Percent => self.assign_operator(next, TokenKind::Percent, TokenKind::PercentEqual),
            CharClass::Caret => self.assign_operator(next, TokenKind::Caret, TokenKind::CaretEqual),
            CharClass::Whitespace | CharClass::LineTerminator | CharClass::Invalid => {
                let message = match char::from_u32(code) {
                    Some(c) if !c.is_control() => format!("Invalid character '{c}'"),
                    _ => format!("Invalid character '\\u{{{code:04X}}}'"),
                };
                self.fail(&message)
            }
        }
    }

    /// `op`, `op op` or `op=`.
    fn operator(&mut self, next: u32, op: u8, single: TokenKind, double: TokenKind, assign: TokenKind) -> Scanned {
        if next == u32::from(op) {
            self.punctuator(2, double)
        } else if next == u32::from(b'=') {
            self.punctuator(2, assign)
        } else {
            self.punctuator(1, single)
        }
    }

    /// `op` or `op=`.
    fn assign_operator(&mut self, next: u32, single: TokenKind, assign: TokenKind) -> Scanned {
        if next == u32::from(b'=') {
            self.punctuator(2, assign)
        } else {
            self.punctuator(1, single)
        }
    }

    // ── Identifiers and keywords ────────────────────────────────────────────

    /// Decode a `\u` escape with the position on the `u`.
    fn scan_unicode_escape(&mut self) -> Option<u32> {
        self.position += 1;
        if self.current() == u32::from(b'{') {
            self.position += 1;
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(d) = hex_value(self.current()) {
                value = value * 16 + d;
                if value > 0x10_FFFF {
                    return None;
                }
                self.position += 1;
                digits += 1;
            }
            if digits == 0 || self.current() != u32::from(b'}') {
                return None;
            }
            self.position += 1;
            Some(value)
        } else {
            let mut value = 0u32;
            for _ in 0..4 {
                let d = hex_value(self.current())?;
                value = value * 16 + d;
                self.position += 1;
            }
            Some(value)
        }
    }

    fn scan_identifier(&mut self, strict: bool) -> Scanned {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            let code = self.current();
            if code == u32::from(b'\\') && !self.at_end() {
                if self.peek(1) != u32::from(b'u') {
                    return self.fail("Invalid escape in identifier");
                }
                self.position += 1;
                let valid = match self.scan_unicode_escape() {
                    Some(decoded) if name.is_empty() => is_identifier_start(decoded).then_some(decoded),
                    Some(decoded) => is_identifier_part(decoded).then_some(decoded),
                    None => None,
                };
                let Some(decoded) = valid else {
                    return self.fail("Invalid unicode escape in identifier");
                };
                push_code_point(&mut name, decoded);
                escaped = true;
            } else if !self.at_end() && is_identifier_part(code) {
                push_code_point(&mut name, code);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match keyword_kind(&name) {
            Some(_) if escaped => return self.fail("Keyword must not contain escaped characters"),
            Some(TokenKind::ReservedStrict) if !strict => TokenKind::Identifier,
            Some(kind) => kind,
            None => TokenKind::Identifier,
        };
        (kind, TokenValue::Str(name))
    }

    // ── Numbers ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, strict: bool) -> Scanned {
        let begin = self.position;
        let first = self.current();
        let marker = self.peek(1) | 0x20;

        let value = if first == u32::from(b'0') && marker == u32::from(b'x') {
            self.scan_radix_literal(16)
        } else if first == u32::from(b'0') && marker == u32::from(b'o') {
            self.scan_radix_literal(8)
        } else if first == u32::from(b'0') && marker == u32::from(b'b') {
            self.scan_radix_literal(2)
        } else if first == u32::from(b'0') && char_class(self.peek(1)) >= CharClass::Zero {
            self.position += 1;
            let digits_begin = self.position;
            let mut octal = true;
            while char_class(self.current()) >= CharClass::Zero {
                if self.current() >= u32::from(b'8') {
                    octal = false;
                }
                self.position += 1;
            }
            if strict {
                return if octal {
                    self.fail("Octal literals are not allowed in strict mode")
                } else {
                    self.fail("Decimal integer literals with a leading zero are forbidden in strict mode")
                };
            }
            if octal {
                let digits = self.buffer.slice(digits_begin, self.position);
                Some(digits.chars().fold(0f64, |acc, c| acc * 8.0 + f64::from(c as u32 - u32::from(b'0'))))
            } else {
                self.scan_decimal_tail(begin)
            }
        } else {
            self.skip_decimal_digits();
            self.scan_decimal_tail(begin)
        };

        let Some(value) = value else {
            return self.fail("Invalid numeric literal");
        };
        let after = self.current();
        if !self.at_end() && (is_identifier_start(after) || after == u32::from(b'\\') || char_class(after) >= CharClass::Zero) {
            return self.fail("No identifiers allowed directly after numeric literal");
        }
        (TokenKind::Number, TokenValue::Number(value))
    }

    fn skip_decimal_digits(&mut self) {
        while matches!(char_class(self.current()), CharClass::Zero | CharClass::Number) {
            self.position += 1;
        }
    }

    /// Fraction and exponent of a decimal literal that started at `begin`.
    fn scan_decimal_tail(&mut self, begin: usize) -> Option<f64> {
        if self.current() == u32::from(b'.') {
            self.position += 1;
            self.skip_decimal_digits();
        }
        if self.current() | 0x20 == u32::from(b'e') {
            self.position += 1;
            if matches!(self.current(), 0x2B | 0x2D) {
                self.position += 1;
            }
            if !matches!(char_class(self.current()), CharClass::Zero | CharClass::Number) {
                return None;
            }
            self.skip_decimal_digits();
        }
        self.buffer.slice(begin, self.position).parse::<f64>().ok()
    }

    /// `0x…`, `0o…` or `0b…` with at least one digit.
    fn scan_radix_literal(&mut self, radix: u32) -> Option<f64> {
        self.position += 2;
        let mut value = 0f64;
        let mut digits = 0;
        while let Some(d) = char::from_u32(self.current()).and_then(|c| c.to_digit(radix)) {
            value = value * f64::from(radix) + f64::from(d);
            self.position += 1;
            digits += 1;
        }
        (digits > 0).then_some(value)
    }

    // ── Strings ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self, quote: u32, strict: bool) -> Scanned {
        self.position += 1;
        let mut cooked = String::new();
        loop {
            if self.at_end() || is_line_terminator(self.current()) {
                return self.fail_unterminated("Unterminated string literal");
            }
            let code = self.current();
            if code == quote {
                self.position += 1;
                break;
            }
            if code != u32::from(b'\\') {
                push_code_point(&mut cooked, code);
                self.advance();
                continue;
            }

            self.position += 1;
            if self.at_end() {
                return self.fail_unterminated("Unterminated string literal");
            }
            let escape = self.current();
            if is_line_terminator(escape) {
                self.consume_line_terminator();
                continue;
            }
            match char::from_u32(escape).unwrap_or('\u{FFFD}') {
                'n' => self.escape(&mut cooked, '\n'),
                't' => self.escape(&mut cooked, '\t'),
                'r' => self.escape(&mut cooked, '\r'),
                'b' => self.escape(&mut cooked, '\u{8}'),
                'f' => self.escape(&mut cooked, '\u{C}'),
                'v' => self.escape(&mut cooked, '\u{B}'),
                '0' if char_class(self.peek(1)) < CharClass::Zero => self.escape(&mut cooked, '\0'),
                'x' => {
                    match (hex_value(self.peek(1)), hex_value(self.peek(2))) {
                        (Some(hi), Some(lo)) => {
                            push_code_point(&mut cooked, hi * 16 + lo);
                            self.position += 3;
                        }
                        _ => return self.fail("\\x can only be followed by a hex character sequence"),
                    }
                }
                'u' => {
                    let Some(mut decoded) = self.scan_unicode_escape() else {
                        return self.fail("\\u can only be followed by a Unicode character sequence");
                    };
                    if (0xD800..=0xDBFF).contains(&decoded)
                        && self.current() == u32::from(b'\\')
                        && self.peek(1) == u32::from(b'u')
                    {
                        let saved = self.position;
                        self.position += 1;
                        match self.scan_unicode_escape() {
                            Some(lo) if (0xDC00..=0xDFFF).contains(&lo) => {
                                decoded = (decoded - 0xD800) * 0x400 + (lo - 0xDC00) + 0x1_0000;
                            }
                            _ => self.position = saved,
                        }
                    }
                    push_code_point(&mut cooked, decoded);
                }
                '0'..='7' => {
                    if strict {
                        return self.fail("Octal escape sequences are not allowed in strict mode");
                    }
                    let mut value = 0u32;
                    let mut digits = 0;
                    while digits < 3 && matches!(self.current(), 0x30..=0x37) {
                        let next = value * 8 + (self.current() - 0x30);
                        if next > 0xFF {
                            break;
                        }
                        value = next;
                        self.position += 1;
                        digits += 1;
                    }
                    push_code_point(&mut cooked, value);
                }
                '8' | '9' if strict => {
                    return self.fail("\\8 and \\9 are not allowed in strict mode");
                }
                _ => {
                    push_code_point(&mut cooked, escape);
                    self.advance();
                }
            }
        }
        (TokenKind::String, TokenValue::Str(cooked))
    }

    fn escape(&mut self, cooked: &mut String, c: char) {
        cooked.push(c);
        self.position += 1;
    }

    // ── Regular expressions ─────────────────────────────────────────────────

    /// Re-scan the current `/` or `/=` token as a regular-expression literal.
    ///
    /// `prefix` is the part of the pattern already consumed by the operator
    /// token (`""` for `/`, `"="` for `/=`); scanning continues at the
    /// current position, which must be the end of that token.
    pub fn scan_regex(&mut self, token: &mut Token, prefix: &str) -> TokenKind {
        self.error = None;
        let mut pattern = String::from(prefix);
        let mut in_class = false;
        loop {
            let code = self.current();
            if self.at_end() || is_line_terminator(code) {
                let (kind, value) = self.fail_unterminated("Unterminated regular expression literal");
                return self.finish_regex(token, kind, value);
            }
            if code == u32::from(b'/') && !in_class {
                self.position += 1;
                break;
            }
            if code == u32::from(b'[') {
                in_class = true;
            } else if code == u32::from(b']') {
                in_class = false;
            } else if code == u32::from(b'\\') {
                push_code_point(&mut pattern, code);
                self.position += 1;
                let escaped = self.current();
                if self.at_end() || is_line_terminator(escaped) {
                    let (kind, value) = self.fail_unterminated("Unterminated regular expression literal");
                    return self.finish_regex(token, kind, value);
                }
                push_code_point(&mut pattern, escaped);
                self.advance();
                continue;
            }
            push_code_point(&mut pattern, code);
            self.advance();
        }

        let mut flags = String::new();
        while !self.at_end() && is_identifier_part(self.current()) {
            push_code_point(&mut flags, self.current());
            self.advance();
        }
        self.finish_regex(token, TokenKind::RegExp, TokenValue::RegExp { pattern, flags })
    }

    fn finish_regex(&mut self, token: &mut Token, kind: TokenKind, value: TokenValue) -> TokenKind {
        token.kind = kind;
        token.value = value;
        token.location.end = self.position;
        kind
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Scan `src` to EOF (or the first error) and return every token.
    fn tokens_with(src: &str, strict: bool) -> Vec<Token> {
        let source = SourceText::new(src);
        let mut scanner = Scanner::new(&source);
        let mut out = Vec::new();
        loop {
            let mut token = Token::default();
            let kind = scanner.next_token(&mut token, strict);
            if kind == TokenKind::Eof {
                break;
            }
            out.push(token);
            if kind.is_error() {
                break;
            }
        }
        out
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokens_with(src, false).into_iter().map(|t| t.kind).collect()
    }

    fn first(src: &str, strict: bool) -> (Token, Option<String>) {
        let source = SourceText::new(src);
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, strict);
        (token, scanner.error_message().map(str::to_owned))
    }

    // ── Character classes ────────────────────────────────────────────────────

    #[test]
    fn test_identifier_classes_are_last() {
        assert!(CharClass::Zero >= CharClass::IdentifierBegin);
        assert!(CharClass::Number >= CharClass::IdentifierBegin);
        assert!(CharClass::Pipe < CharClass::IdentifierBegin);
        assert!(is_identifier_part(u32::from(b'7')));
        assert!(!is_identifier_start(u32::from(b'7')));
        assert!(is_identifier_start(u32::from('é')));
    }

    // ── Keywords / identifiers ───────────────────────────────────────────────

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("var foo = function bar() { return this; }"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Function,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::Return,
                TokenKind::This,
                TokenKind::Semicolon,
                TokenKind::RightBrace,
            ]
        );
    }

    #[test]
    fn test_strict_reserved_words() {
        assert_eq!(first("yield", false).0.kind, TokenKind::Identifier);
        assert_eq!(first("yield", true).0.kind, TokenKind::ReservedStrict);
        assert_eq!(first("enum", false).0.kind, TokenKind::Reserved);
    }

    #[test]
    fn test_identifier_unicode_escape() {
        let (token, _) = first("\\u0061bc", false);
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.str_value(), Some("abc"));
        assert_eq!(token.location.end, 8);
    }

    #[test]
    fn test_escaped_keyword_rejected() {
        let (token, error) = first("v\\u0061r", false);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(error.as_deref(), Some("Keyword must not contain escaped characters"));
    }

    #[test]
    fn test_non_ascii_identifier() {
        let (token, _) = first("café = 1", false);
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.str_value(), Some("café"));
        assert_eq!(token.location.end, 5);
    }

    // ── Numbers ──────────────────────────────────────────────────────────────

    fn number(src: &str) -> f64 {
        match first(src, false).0.value {
            TokenValue::Number(n) => n,
            other => panic!("expected number for {src}, got {other:?}"),
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number("42"), 42.0);
        assert_eq!(number("3.25"), 3.25);
        assert_eq!(number(".5"), 0.5);
        assert_eq!(number("1e3"), 1000.0);
        assert_eq!(number("2.5E-1"), 0.25);
        assert_eq!(number("0xFF"), 255.0);
        assert_eq!(number("0o17"), 15.0);
        assert_eq!(number("0b101"), 5.0);
        assert_eq!(number("017"), 15.0);
        assert_eq!(number("019"), 19.0);
    }

    #[test]
    fn test_legacy_octal_rejected_in_strict_mode() {
        let (token, error) = first("017", true);
        assert_eq!(token.kind, TokenKind::Error);
        assert!(error.unwrap().contains("Octal"));
        let (token, error) = first("09", true);
        assert_eq!(token.kind, TokenKind::Error);
        assert!(error.unwrap().contains("leading zero"));
    }

    #[test]
    fn test_identifier_after_number_rejected() {
        let (token, error) = first("3in x", false);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(error.as_deref(), Some("No identifiers allowed directly after numeric literal"));
    }

    #[test]
    fn test_bad_radix_and_exponent() {
        assert_eq!(first("0x", false).0.kind, TokenKind::Error);
        assert_eq!(first("1e+", false).0.kind, TokenKind::Error);
    }

    // ── Strings ──────────────────────────────────────────────────────────────

    fn string(src: &str) -> String {
        first(src, false).0.str_value().map(str::to_owned).unwrap_or_default()
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string(r#""a\nb""#), "a\nb");
        assert_eq!(string(r"'\x41B\u{43}'"), "ABC");
        assert_eq!(string(r#""😀""#), "😀");
        assert_eq!(string(r#""\q""#), "q");
        assert_eq!(string(r#""\0""#), "\0");
        assert_eq!(string(r#""\101""#), "A");
    }

    #[test]
    fn test_string_line_continuation() {
        let source = SourceText::new("'a\\\nb' x");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        assert_eq!(token.str_value(), Some("ab"));
        assert_eq!(token.location.line, 1);
        scanner.next_token(&mut token, false);
        assert_eq!(token.location.line, 2);
        assert!(!scanner.has_line_terminator());
    }

    #[test]
    fn test_octal_escape_rejected_in_strict_mode() {
        let (token, error) = first(r#""\07""#, true);
        assert_eq!(token.kind, TokenKind::Error);
        assert!(error.unwrap().contains("Octal escape"));
    }

    #[test]
    fn test_unterminated_string_location() {
        let tokens = tokens_with("x = 1;\n  'abc", false);
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::UnterminatedError);
        assert_eq!(last.location.line, 2);
        assert_eq!(last.location.begin_column(), 2);
    }

    #[test]
    fn test_bad_hex_escape() {
        let (token, error) = first(r#""\xZZ""#, false);
        assert_eq!(token.kind, TokenKind::Error);
        assert!(error.unwrap().starts_with("\\x"));
    }

    // ── Punctuators ──────────────────────────────────────────────────────────

    #[test]
    fn test_punctuators_maximal_munch() {
        assert_eq!(
            kinds(">>>= >>> >>= >> >= > === == => = !== != !"),
            vec![
                TokenKind::GreaterGreaterGreaterEqual,
                TokenKind::GreaterGreaterGreater,
                TokenKind::GreaterGreaterEqual,
                TokenKind::GreaterGreater,
                TokenKind::GreaterEqual,
                TokenKind::Greater,
                TokenKind::EqualEqualEqual,
                TokenKind::EqualEqual,
                TokenKind::Arrow,
                TokenKind::Equal,
                TokenKind::BangEqualEqual,
                TokenKind::BangEqual,
                TokenKind::Bang,
            ]
        );
        assert_eq!(
            kinds("a++ + ++b ... . ?:"),
            vec![
                TokenKind::Identifier,
                TokenKind::PlusPlus,
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::Identifier,
                TokenKind::DotDotDot,
                TokenKind::Dot,
                TokenKind::Question,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_invalid_character() {
        let (token, error) = first("@", false);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(error.as_deref(), Some("Invalid character '@'"));
    }

    #[test]
    fn test_backquote_is_a_token() {
        assert_eq!(kinds("`"), vec![TokenKind::BackQuote]);
    }

    // ── Comments and line terminators ────────────────────────────────────────

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a // one\n/* two */ b /* x\n y */ c"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_line_terminator_flags() {
        let source = SourceText::new("a\nb /*\n*/ c d");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        assert!(!scanner.has_line_terminator());
        scanner.next_token(&mut token, false);
        assert!(scanner.has_line_terminator());
        assert_eq!(token.location.line, 2);
        scanner.next_token(&mut token, false);
        assert!(scanner.has_line_terminator(), "terminator inside a block comment counts");
        scanner.next_token(&mut token, false);
        assert!(!scanner.has_line_terminator());
        assert_eq!(scanner.last_line(), 3);
    }

    #[test]
    fn test_crlf_is_one_line() {
        let tokens = tokens_with("a\r\nb\u{2028}c", false);
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[2].location.line, 3);
        assert_eq!(tokens[2].location.begin_column(), 0);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (token, error) = first("  /* never closed", false);
        assert_eq!(token.kind, TokenKind::UnterminatedError);
        assert_eq!(token.location.begin, 2);
        assert_eq!(error.as_deref(), Some("Unterminated multiline comment"));
    }

    // ── Regular expressions ──────────────────────────────────────────────────

    #[test]
    fn test_scan_regex_from_slash() {
        let source = SourceText::new("/a[/]b\\//gi;");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        assert_eq!(scanner.next_token(&mut token, false), TokenKind::Slash);
        assert_eq!(scanner.scan_regex(&mut token, ""), TokenKind::RegExp);
        assert_eq!(
            token.value,
            TokenValue::RegExp {
                pattern: "a[/]b\\/".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(token.location.begin, 0);
        assert_eq!(scanner.next_token(&mut token, false), TokenKind::Semicolon);
    }

    #[test]
    fn test_scan_regex_from_slash_equal() {
        let source = SourceText::new("/=x/");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        assert_eq!(scanner.next_token(&mut token, false), TokenKind::SlashEqual);
        scanner.scan_regex(&mut token, "=");
        assert_eq!(
            token.value,
            TokenValue::RegExp {
                pattern: "=x".into(),
                flags: String::new()
            }
        );
    }

    #[test]
    fn test_unterminated_regex() {
        let source = SourceText::new("/abc\n/");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        assert_eq!(scanner.scan_regex(&mut token, ""), TokenKind::UnterminatedError);
    }

    // ── Save / restore ───────────────────────────────────────────────────────

    #[test]
    fn test_save_restore_rescans_same_token() {
        let source = SourceText::new("a\n  b c");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        let saved = scanner.save();
        scanner.next_token(&mut token, false);
        let b = token.clone();
        scanner.next_token(&mut token, false);
        scanner.restore(saved);
        scanner.next_token(&mut token, false);
        assert_eq!(token, b);
        assert!(scanner.has_line_terminator());
    }

    #[test]
    fn test_set_position_clears_error() {
        let source = SourceText::new("@ x");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        assert!(scanner.error_message().is_some());
        scanner.set_position(1);
        assert!(scanner.error_message().is_none());
        assert_eq!(scanner.next_token(&mut token, false), TokenKind::Identifier);
    }

    #[test]
    fn test_is_next_token_colon() {
        let source = SourceText::new("label /* c */ : x");
        let mut scanner = Scanner::new(&source);
        let mut token = Token::default();
        scanner.next_token(&mut token, false);
        let position = scanner.position();
        assert!(scanner.is_next_token_colon());
        assert_eq!(scanner.position(), position);
    }

    #[test]
    fn test_sub_source_line_numbers() {
        let source = SourceText::new("xx\nfunction () { a }").sub_source(12, 20, 2);
        let tokens = tokens_with_source(&source);
        assert_eq!(tokens[0].kind, TokenKind::LeftParen);
        assert_eq!(tokens[0].location.line, 2);
    }

    fn tokens_with_source(source: &SourceText) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        let mut out = Vec::new();
        let mut token = Token::default();
        while scanner.next_token(&mut token, false) != TokenKind::Eof {
            out.push(token.clone());
        }
        out
    }
}
