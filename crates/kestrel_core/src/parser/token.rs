//! Token model: kinds, classification table, values and locations.
//!
//! Token kinds are a plain closed enum.  Everything the parser needs to know
//! about a kind in O(1) (keyword? unary? binary precedence with and without
//! `in`? error?) comes from the explicit [`TokenKind::info`] table instead of
//! bits packed into the discriminant.

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A unit offset + line/column location in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Unit offset from the beginning of the text buffer.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, in units.
    pub column: u32,
}

/// A half-open `[start, end)` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
}

impl Span {
    /// Span from `start` to `end`.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Where a token sits in the text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenLocation {
    /// 1-based line of the token's first unit.
    pub line: u32,
    /// Unit offset of the first unit of that line.
    pub line_begin: usize,
    /// First unit of the token (inclusive).
    pub begin: usize,
    /// Last unit of the token (exclusive).
    pub end: usize,
}

impl TokenLocation {
    /// 0-based column of the token start.
    pub fn begin_column(&self) -> usize {
        self.begin - self.line_begin
    }

    /// 0-based column of the token end, measured from the token's line.
    pub fn end_column(&self) -> usize {
        self.end - self.line_begin
    }

    /// The token start as a [`Position`] with a 1-based column.
    pub fn start_position(&self) -> Position {
        Position {
            offset: self.begin,
            line: self.line,
            column: self.begin_column() as u32 + 1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Sentinels ──────────────────────────────────────────────────────────
    /// End of input.
    Eof,
    /// The scanner rejected the input; the message is in the scanner.
    Error,
    /// A string, comment or escape ran into the end of the line or input.
    UnterminatedError,

    // ── Names and literals ─────────────────────────────────────────────────
    /// An identifier that is not a reserved word.
    Identifier,
    /// A future reserved word that is never a valid identifier (`enum`).
    Reserved,
    /// A word that is an identifier in sloppy mode but reserved in strict
    /// mode (`implements`, `static`, `yield`, …).
    ReservedStrict,
    /// Quoted string literal; the value holds the cooked text.
    String,
    /// Numeric literal.
    Number,
    /// Regular expression literal, produced only by a parser-driven re-scan.
    RegExp,

    // ── Keywords ───────────────────────────────────────────────────────────
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// `break`
    Break,
    /// `case`
    Case,
    /// `catch`
    Catch,
    /// `class`
    Class,
    /// `const`
    Const,
    /// `continue`
    Continue,
    /// `debugger`
    Debugger,
    /// `default`
    Default,
    /// `delete`
    Delete,
    /// `do`
    Do,
    /// `else`
    Else,
    /// `export`
    Export,
    /// `extends`
    Extends,
    /// `finally`
    Finally,
    /// `for`
    For,
    /// `function`
    Function,
    /// `if`
    If,
    /// `import`
    Import,
    /// `in`
    In,
    /// `instanceof`
    Instanceof,
    /// `let`
    Let,
    /// `new`
    New,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `switch`
    Switch,
    /// `this`
    This,
    /// `throw`
    Throw,
    /// `try`
    Try,
    /// `typeof`
    Typeof,
    /// `var`
    Var,
    /// `void`
    Void,
    /// `while`
    While,
    /// `with`
    With,

    // ── Punctuators ────────────────────────────────────────────────────────
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `...`
    DotDotDot,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `=>`
    Arrow,
    /// `` ` ``
    BackQuote,

    // ── Assignment operators ───────────────────────────────────────────────
    /// `=`
    Equal,
    /// `+=`
    PlusEqual,
    /// `-=`
    MinusEqual,
    /// `*=`
    StarEqual,
    /// `/=`
    SlashEqual,
    /// `%=`
    PercentEqual,
    /// `<<=`
    LessLessEqual,
    /// `>>=`
    GreaterGreaterEqual,
    /// `>>>=`
    GreaterGreaterGreaterEqual,
    /// `&=`
    AmpersandEqual,
    /// `|=`
    PipeEqual,
    /// `^=`
    CaretEqual,

    // ── Unary / update operators ───────────────────────────────────────────
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `!`
    Bang,
    /// `~`
    Tilde,

    // ── Binary operators ───────────────────────────────────────────────────
    /// `||`
    PipePipe,
    /// `&&`
    AmpersandAmpersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `&`
    Ampersand,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `===`
    EqualEqualEqual,
    /// `!==`
    BangEqualEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<<`
    LessLess,
    /// `>>`
    GreaterGreater,
    /// `>>>`
    GreaterGreaterGreater,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
}

/// Static classification of a [`TokenKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenInfo {
    /// A reserved word of the language.
    pub is_keyword: bool,
    /// May start a unary expression (`!`, `typeof`, `++`, …).
    pub is_unary: bool,
    /// An assignment operator (`=`, `+=`, …).
    pub is_assignment: bool,
    /// Binary precedence when `in` is allowed; `0` means "not binary".
    pub precedence: u8,
    /// Binary precedence inside a `for (…;` head, where `in` is not an
    /// operator.
    pub precedence_no_in: u8,
    /// The scanner failed on this token.
    pub is_error: bool,
    /// The failure was a literal or comment running off the end.
    pub is_unterminated: bool,
}

const KEYWORD: TokenInfo = TokenInfo {
    is_keyword: true,
    is_unary: false,
    is_assignment: false,
    precedence: 0,
    precedence_no_in: 0,
    is_error: false,
    is_unterminated: false,
};

const UNARY: TokenInfo = TokenInfo {
    is_keyword: false,
    is_unary: true,
    is_assignment: false,
    precedence: 0,
    precedence_no_in: 0,
    is_error: false,
    is_unterminated: false,
};

const ASSIGNMENT: TokenInfo = TokenInfo {
    is_keyword: false,
    is_unary: false,
    is_assignment: true,
    precedence: 0,
    precedence_no_in: 0,
    is_error: false,
    is_unterminated: false,
};

const PLAIN: TokenInfo = TokenInfo {
    is_keyword: false,
    is_unary: false,
    is_assignment: false,
    precedence: 0,
    precedence_no_in: 0,
    is_error: false,
    is_unterminated: false,
};

const fn binary(precedence: u8) -> TokenInfo {
    TokenInfo {
        precedence,
        precedence_no_in: precedence,
        ..PLAIN
    }
}

impl TokenKind {
    /// The classification table.
    pub const fn info(self) -> TokenInfo {
        use TokenKind::*;
        match self {
            Error => TokenInfo {
                is_error: true,
                ..PLAIN
            },
            UnterminatedError => TokenInfo {
                is_error: true,
                is_unterminated: true,
                ..PLAIN
            },

            Null | True | False | Break | Case | Catch | Class | Const | Continue | Debugger
            | Default | Do | Else | Export | Extends | Finally | For | Function | If | Import
            | Let | New | Return | Super | Switch | This | Throw | Try | Var | While | With => {
                KEYWORD
            }
            Typeof | Void | Delete => TokenInfo {
                is_keyword: true,
                ..UNARY
            },
            In => TokenInfo {
                is_keyword: true,
                precedence: 7,
                precedence_no_in: 0,
                ..PLAIN
            },
            Instanceof => TokenInfo {
                is_keyword: true,
                ..binary(7)
            },

            Equal | PlusEqual | MinusEqual | StarEqual | SlashEqual | PercentEqual
            | LessLessEqual | GreaterGreaterEqual | GreaterGreaterGreaterEqual
            | AmpersandEqual | PipeEqual | CaretEqual => ASSIGNMENT,

            PlusPlus | MinusMinus | Bang | Tilde => UNARY,

            PipePipe => binary(1),
            AmpersandAmpersand => binary(2),
            Pipe => binary(3),
            Caret => binary(4),
            Ampersand => binary(5),
            EqualEqual | BangEqual | EqualEqualEqual | BangEqualEqual => binary(6),
            Less | Greater | LessEqual | GreaterEqual => binary(7),
            LessLess | GreaterGreater | GreaterGreaterGreater => binary(8),
            Plus | Minus => TokenInfo {
                is_unary: true,
                ..binary(9)
            },
            Star | Slash | Percent => binary(10),

            Eof | Identifier | Reserved | ReservedStrict | String | Number | RegExp
            | LeftBrace | RightBrace | LeftParen | RightParen | LeftBracket | RightBracket
            | Dot | DotDotDot | Semicolon | Comma | Question | Colon | Arrow | BackQuote => PLAIN,
        }
    }

    /// Binary precedence, selecting the table by whether `in` is currently an
    /// operator.  `0` means the token does not continue a binary expression.
    pub fn precedence(self, allows_in: bool) -> u8 {
        let info = self.info();
        if allows_in {
            info.precedence
        } else {
            info.precedence_no_in
        }
    }

    /// `true` for reserved words.
    pub fn is_keyword(self) -> bool {
        self.info().is_keyword
    }

    /// `true` for tokens that may start a unary expression.
    pub fn is_unary(self) -> bool {
        self.info().is_unary
    }

    /// `true` for assignment operators.
    pub fn is_assignment(self) -> bool {
        self.info().is_assignment
    }

    /// `true` for scanner failures.
    pub fn is_error(self) -> bool {
        self.info().is_error
    }

    /// `true` for tokens usable as a property name after `.` or as an object
    /// literal key: identifiers and every reserved word.
    pub fn is_identifier_name(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::Reserved | TokenKind::ReservedStrict
        ) || self.is_keyword()
    }

    /// Source spelling of fixed tokens, or a description for the rest.
    pub fn text(self) -> &'static str {
        use TokenKind::*;
        match self {
            Eof => "end of script",
            Error | UnterminatedError => "invalid token",
            Identifier => "identifier",
            Reserved | ReservedStrict => "reserved word",
            String => "string literal",
            Number => "number literal",
            RegExp => "regular expression",
            Null => "null",
            True => "true",
            False => "false",
            Break => "break",
            Case => "case",
            Catch => "catch",
            Class => "class",
            Const => "const",
            Continue => "continue",
            Debugger => "debugger",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            Export => "export",
            Extends => "extends",
            Finally => "finally",
            For => "for",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Instanceof => "instanceof",
            Let => "let",
            New => "new",
            Return => "return",
            Super => "super",
            Switch => "switch",
            This => "this",
            Throw => "throw",
            Try => "try",
            Typeof => "typeof",
            Var => "var",
            Void => "void",
            While => "while",
            With => "with",
            LeftBrace => "{",
            RightBrace => "}",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            Dot => ".",
            DotDotDot => "...",
            Semicolon => ";",
            Comma => ",",
            Question => "?",
            Colon => ":",
            Arrow => "=>",
            BackQuote => "`",
            Equal => "=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            LessLessEqual => "<<=",
            GreaterGreaterEqual => ">>=",
            GreaterGreaterGreaterEqual => ">>>=",
            AmpersandEqual => "&=",
            PipeEqual => "|=",
            CaretEqual => "^=",
            PlusPlus => "++",
            MinusMinus => "--",
            Bang => "!",
            Tilde => "~",
            PipePipe => "||",
            AmpersandAmpersand => "&&",
            Pipe => "|",
            Caret => "^",
            Ampersand => "&",
            EqualEqual => "==",
            BangEqual => "!=",
            EqualEqualEqual => "===",
            BangEqualEqual => "!==",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            LessLess => "<<",
            GreaterGreater => ">>",
            GreaterGreaterGreater => ">>>",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
        }
    }
}

/// Map an identifier to its reserved-word [`TokenKind`], or `None` for plain
/// identifiers.
pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match word {
        "null" => Null,
        "true" => True,
        "false" => False,
        "break" => Break,
        "case" => Case,
        "catch" => Catch,
        "class" => Class,
        "const" => Const,
        "continue" => Continue,
        "debugger" => Debugger,
        "default" => Default,
        "delete" => Delete,
        "do" => Do,
        "else" => Else,
        "export" => Export,
        "extends" => Extends,
        "finally" => Finally,
        "for" => For,
        "function" => Function,
        "if" => If,
        "import" => Import,
        "in" => In,
        "instanceof" => Instanceof,
        "let" => Let,
        "new" => New,
        "return" => Return,
        "super" => Super,
        "switch" => Switch,
        "this" => This,
        "throw" => Throw,
        "try" => Try,
        "typeof" => Typeof,
        "var" => Var,
        "void" => Void,
        "while" => While,
        "with" => With,
        "enum" => Reserved,
        "implements" | "interface" | "package" | "private" | "protected" | "public"
        | "static" | "yield" => ReservedStrict,
        _ => return None,
    };
    Some(kind)
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue / Token
// ─────────────────────────────────────────────────────────────────────────────

/// The payload associated with a [`Token`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TokenValue {
    /// No semantic value (punctuators, keywords, EOF, …).
    #[default]
    None,
    /// Identifier name, reserved word, or cooked string literal contents.
    Str(String),
    /// Parsed numeric value.
    Number(f64),
    /// Regular expression source and flags.
    RegExp {
        /// Text between the slashes.
        pattern: String,
        /// Trailing flag letters.
        flags: String,
    },
}

/// A token written by the scanner into the parser's scratch slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// The associated value, if any.
    pub value: TokenValue,
    /// Source location.
    pub location: TokenLocation,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            kind: TokenKind::Eof,
            value: TokenValue::None,
            location: TokenLocation::default(),
        }
    }
}

impl Token {
    /// The identifier, reserved word or string text carried by the token.
    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_has_no_precedence_without_in() {
        assert_eq!(TokenKind::In.precedence(true), 7);
        assert_eq!(TokenKind::In.precedence(false), 0);
        assert_eq!(TokenKind::Instanceof.precedence(false), 7);
    }

    #[test]
    fn test_precedence_ordering() {
        let order = [
            TokenKind::PipePipe,
            TokenKind::AmpersandAmpersand,
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::Ampersand,
            TokenKind::EqualEqualEqual,
            TokenKind::Less,
            TokenKind::LessLess,
            TokenKind::Plus,
            TokenKind::Star,
        ];
        for pair in order.windows(2) {
            assert!(
                pair[0].precedence(true) < pair[1].precedence(true),
                "{:?} should bind looser than {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_unary_flags() {
        for kind in [
            TokenKind::Bang,
            TokenKind::Tilde,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Typeof,
            TokenKind::Void,
            TokenKind::Delete,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
        ] {
            assert!(kind.is_unary(), "{kind:?}");
        }
        assert!(!TokenKind::Star.is_unary());
        assert!(TokenKind::Typeof.is_keyword());
    }

    #[test]
    fn test_error_flags() {
        assert!(TokenKind::Error.is_error());
        assert!(!TokenKind::Error.info().is_unterminated);
        assert!(TokenKind::UnterminatedError.info().is_unterminated);
        assert!(!TokenKind::Identifier.is_error());
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_kind("function"), Some(TokenKind::Function));
        assert_eq!(keyword_kind("enum"), Some(TokenKind::Reserved));
        assert_eq!(keyword_kind("yield"), Some(TokenKind::ReservedStrict));
        assert_eq!(keyword_kind("of"), None);
        assert_eq!(keyword_kind("eval"), None);
    }

    #[test]
    fn test_identifier_names_include_keywords() {
        assert!(TokenKind::Identifier.is_identifier_name());
        assert!(TokenKind::Default.is_identifier_name());
        assert!(TokenKind::ReservedStrict.is_identifier_name());
        assert!(!TokenKind::Plus.is_identifier_name());
    }

    #[test]
    fn test_location_columns() {
        let loc = TokenLocation {
            line: 3,
            line_begin: 10,
            begin: 14,
            end: 17,
        };
        assert_eq!(loc.begin_column(), 4);
        assert_eq!(loc.end_column(), 7);
        assert_eq!(loc.start_position().column, 5);
    }
}
