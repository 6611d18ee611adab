//! Source text and the encoding-aware unit buffer the scanner reads from.
//!
//! A [`TextBuffer`] stores the raw units of a source file in one of three
//! [`Encoding`]s and decodes the logical character that *begins* at any unit
//! offset.  Offsets handed out by the scanner are unit offsets into this
//! buffer, so they stay stable no matter how wide individual characters are.
//!
//! A [`SourceText`] is an immutable view `(buffer, url, start_line, span)`
//! over a shared buffer.  Sub-views created with [`SourceText::sub_source`]
//! let a caller re-parse one function of a larger file while still reporting
//! line numbers relative to that file.

use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// The unit encoding of a [`TextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// One byte per character; bytes above 0x7F are passed through unchanged.
    Ascii,
    /// Variable-width UTF-8 (1–6 byte sequences are accepted).
    #[default]
    Utf8,
    /// 16-bit code units with surrogate pairs.
    Utf16,
}

// ─────────────────────────────────────────────────────────────────────────────
// TextBuffer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Units {
    Narrow(Box<[u8]>),
    Wide(Box<[u16]>),
}

/// A frozen, encoding-aware view of source units.
///
/// Decoding is total: any index outside `[0, len)` yields the sentinel `0`
/// and malformed sequences are decoded best-effort.  Rejecting invalid
/// characters is the scanner's job, not the buffer's.
#[derive(Debug)]
pub struct TextBuffer {
    units: Units,
    encoding: Encoding,
}

impl TextBuffer {
    /// Build a buffer from `length` units of `text` starting at unit `offset`.
    ///
    /// For [`Encoding::Utf16`] the bytes are read as little-endian pairs and
    /// `offset`/`length` count 16-bit units.  The range is clamped to the
    /// available input.
    pub fn new(text: &[u8], encoding: Encoding, offset: usize, length: usize) -> Self {
        match encoding {
            Encoding::Ascii | Encoding::Utf8 => {
                let begin = offset.min(text.len());
                let end = begin.saturating_add(length).min(text.len());
                Self {
                    units: Units::Narrow(text[begin..end].into()),
                    encoding,
                }
            }
            Encoding::Utf16 => {
                let wide: Vec<u16> = text
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                Self::from_utf16(&wide, offset, length)
            }
        }
    }

    /// Build a UTF-16 buffer from `length` code units starting at `offset`.
    pub fn from_utf16(text: &[u16], offset: usize, length: usize) -> Self {
        let begin = offset.min(text.len());
        let end = begin.saturating_add(length).min(text.len());
        Self {
            units: Units::Wide(text[begin..end].into()),
            encoding: Encoding::Utf16,
        }
    }

    /// The encoding this buffer was built with.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of addressable units.
    pub fn len(&self) -> usize {
        match &self.units {
            Units::Narrow(bytes) => bytes.len(),
            Units::Wide(wide) => wide.len(),
        }
    }

    /// Returns `true` when the buffer holds no units.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw unit stored at `index`, or `0` when out of range.
    pub fn unit(&self, index: usize) -> u32 {
        match &self.units {
            Units::Narrow(bytes) => bytes.get(index).map_or(0, |&b| u32::from(b)),
            Units::Wide(wide) => wide.get(index).map_or(0, |&u| u32::from(u)),
        }
    }

    /// Decode the code point that begins at unit `index`.
    pub fn char_code(&self, index: usize) -> u32 {
        match (&self.units, self.encoding) {
            (Units::Narrow(bytes), Encoding::Utf8) => decode_utf8_at(bytes, index),
            (Units::Wide(wide), _) => decode_utf16_at(wide, index),
            (Units::Narrow(bytes), _) => bytes.get(index).map_or(0, |&b| u32::from(b)),
        }
    }

    /// Decode the character that begins at unit `index`.
    ///
    /// Code points that are not valid Unicode scalar values (lone surrogates,
    /// out-of-range UTF-8 sequences) decode to U+FFFD.
    pub fn char_at(&self, index: usize) -> char {
        char::from_u32(self.char_code(index)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Number of units `code` occupies in this buffer's encoding.
    pub fn char_length(&self, code: u32) -> usize {
        match self.encoding {
            Encoding::Ascii => 1,
            Encoding::Utf8 => match code {
                0..=0x7F => 1,
                0x80..=0x7FF => 2,
                0x800..=0xFFFF => 3,
                0x1_0000..=0x1F_FFFF => 4,
                0x20_0000..=0x3FF_FFFF => 5,
                _ => 6,
            },
            Encoding::Utf16 => {
                if code >= 0x1_0000 {
                    2
                } else {
                    1
                }
            }
        }
    }

    /// Decode the units in `[begin, end)` into a `String`.
    pub fn slice(&self, begin: usize, end: usize) -> String {
        let end = end.min(self.len());
        let mut out = String::with_capacity(end.saturating_sub(begin));
        let mut index = begin;
        while index < end {
            let code = self.char_code(index);
            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            index += self.char_length(code);
        }
        out
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        TextBuffer::new(text.as_bytes(), Encoding::Utf8, 0, text.len())
    }
}

/// Continuation byte `index`, biased by 0x80; missing bytes read as zero.
fn continuation(bytes: &[u8], index: usize) -> u32 {
    bytes
        .get(index)
        .map_or(0, |&b| u32::from(b).wrapping_sub(0x80) & 0x3F)
}

fn decode_utf8_at(bytes: &[u8], index: usize) -> u32 {
    let Some(&lead) = bytes.get(index) else {
        return 0;
    };
    let lead = u32::from(lead);
    let cont = |k: usize| continuation(bytes, index + k);
    match lead {
        0x00..=0x7F => lead,
        0xC0..=0xDF => ((lead & 0x1F) << 6) | cont(1),
        0xE0..=0xEF => ((lead & 0x0F) << 12) | (cont(1) << 6) | cont(2),
        0xF0..=0xF7 => ((lead & 0x07) << 18) | (cont(1) << 12) | (cont(2) << 6) | cont(3),
        0xF8..=0xFB => {
            ((lead & 0x03) << 24) | (cont(1) << 18) | (cont(2) << 12) | (cont(3) << 6) | cont(4)
        }
        0xFC..=0xFD => {
            ((lead & 0x01) << 30)
                | (cont(1) << 24)
                | (cont(2) << 18)
                | (cont(3) << 12)
                | (cont(4) << 6)
                | cont(5)
        }
        // Stray continuation byte or 0xFE/0xFF: pass the byte through.
        _ => lead,
    }
}

fn decode_utf16_at(wide: &[u16], index: usize) -> u32 {
    let Some(&unit) = wide.get(index) else {
        return 0;
    };
    let hi = u32::from(unit);
    if (0xD800..=0xDBFF).contains(&hi)
        && let Some(&next) = wide.get(index + 1)
    {
        let lo = u32::from(next);
        if (0xDC00..=0xDFFF).contains(&lo) {
            return (hi - 0xD800) * 0x400 + (lo - 0xDC00) + 0x1_0000;
        }
    }
    hi
}

// ─────────────────────────────────────────────────────────────────────────────
// SourceText
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable `(buffer, url, start_line, span)` view of source code.
#[derive(Debug, Clone)]
pub struct SourceText {
    buffer: Arc<TextBuffer>,
    url: Arc<str>,
    start_line: u32,
    begin: usize,
    end: usize,
}

impl SourceText {
    /// Source text covering all of `text`, decoded as UTF-8, starting at
    /// line 1 with an empty URL.
    pub fn new(text: &str) -> Self {
        Self::from_buffer(TextBuffer::from(text), "", 1)
    }

    /// Source text covering an entire buffer.
    pub fn from_buffer(buffer: TextBuffer, url: &str, start_line: u32) -> Self {
        let end = buffer.len();
        Self {
            buffer: Arc::new(buffer),
            url: Arc::from(url),
            start_line,
            begin: 0,
            end,
        }
    }

    /// Replace the URL reported in diagnostics.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Arc::from(url);
        self
    }

    /// A view of `[begin, end)` in the same buffer whose first line is
    /// reported as `start_line`.
    pub fn sub_source(&self, begin: usize, end: usize, start_line: u32) -> Self {
        let end = end.min(self.buffer.len());
        Self {
            buffer: Arc::clone(&self.buffer),
            url: Arc::clone(&self.url),
            start_line,
            begin: begin.min(end),
            end,
        }
    }

    /// The shared unit buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// URL (or file name) used in diagnostics.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Line number of the first unit of the span.
    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    /// First unit offset of the span (inclusive).
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Last unit offset of the span (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Decoded text of the whole span.
    pub fn text(&self) -> String {
        self.buffer.slice(self.begin, self.end)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── UTF-8 ────────────────────────────────────────────────────────────────

    #[test]
    fn test_utf8_ascii_passthrough() {
        let buf = TextBuffer::from("abc");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.char_code(0), u32::from('a'));
        assert_eq!(buf.char_code(2), u32::from('c'));
    }

    #[test]
    fn test_utf8_multibyte_sequences() {
        // é (2 bytes), € (3 bytes), 😀 (4 bytes)
        let buf = TextBuffer::from("é€😀");
        assert_eq!(buf.char_at(0), 'é');
        assert_eq!(buf.char_length(buf.char_code(0)), 2);
        assert_eq!(buf.char_at(2), '€');
        assert_eq!(buf.char_length(buf.char_code(2)), 3);
        assert_eq!(buf.char_at(5), '😀');
        assert_eq!(buf.char_length(buf.char_code(5)), 4);
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_utf8_legacy_five_and_six_byte_leads() {
        let five = [0xF8, 0x88, 0x80, 0x80, 0x80];
        let buf = TextBuffer::new(&five, Encoding::Utf8, 0, five.len());
        assert_eq!(buf.char_code(0), 0x20_0000);
        assert_eq!(buf.char_length(0x20_0000), 5);

        let six = [0xFC, 0x84, 0x80, 0x80, 0x80, 0x80];
        let buf = TextBuffer::new(&six, Encoding::Utf8, 0, six.len());
        assert_eq!(buf.char_code(0), 0x400_0000);
        assert_eq!(buf.char_length(0x400_0000), 6);
    }

    #[test]
    fn test_utf8_truncated_sequence_is_best_effort() {
        let bytes = [0xE2, 0x82];
        let buf = TextBuffer::new(&bytes, Encoding::Utf8, 0, bytes.len());
        // Missing continuation byte decodes as zero bits; no panic.
        assert_eq!(buf.char_code(0), (0x02 << 12) | (0x02 << 6));
    }

    #[test]
    fn test_out_of_range_reads_return_sentinel() {
        let buf = TextBuffer::from("x");
        assert_eq!(buf.char_code(1), 0);
        assert_eq!(buf.char_code(usize::MAX), 0);
        assert_eq!(buf.unit(10), 0);
    }

    #[test]
    fn test_offset_and_length_window() {
        let buf = TextBuffer::new(b"hello world", Encoding::Ascii, 6, 5);
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.slice(0, 5), "world");
    }

    // ── UTF-16 ───────────────────────────────────────────────────────────────

    #[test]
    fn test_utf16_surrogate_pair_combines() {
        let units: Vec<u16> = "a😀b".encode_utf16().collect();
        let buf = TextBuffer::from_utf16(&units, 0, units.len());
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.char_at(1), '😀');
        assert_eq!(buf.char_length(buf.char_code(1)), 2);
        assert_eq!(buf.char_at(3), 'b');
        assert_eq!(buf.slice(0, 4), "a😀b");
    }

    #[test]
    fn test_utf16_lone_high_surrogate() {
        let units = [0xD800, u16::from(b'x')];
        let buf = TextBuffer::from_utf16(&units, 0, units.len());
        assert_eq!(buf.char_code(0), 0xD800);
        assert_eq!(buf.char_at(0), char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn test_utf16_from_le_bytes() {
        let bytes = [b'h', 0, b'i', 0];
        let buf = TextBuffer::new(&bytes, Encoding::Utf16, 0, 2);
        assert_eq!(buf.slice(0, 2), "hi");
    }

    // ── SourceText ───────────────────────────────────────────────────────────

    #[test]
    fn test_sub_source_shares_buffer() {
        let src = SourceText::new("var a = 1; function f() {}").with_url("main.js");
        let sub = src.sub_source(11, 26, 7);
        assert_eq!(sub.text(), "function f() {}");
        assert_eq!(sub.start_line(), 7);
        assert_eq!(sub.url(), "main.js");
        assert!(std::ptr::eq(src.buffer(), sub.buffer()));
    }

    #[test]
    fn test_source_text_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceText>();
    }
}
