//! JavaScript parser infrastructure.
//!
//! - [`token`]: token kinds, the classification table and locations.
//! - [`scanner`]: the on-demand lexer.
//! - [`scope`]: scope tracking and closure-capture analysis.
//! - [`options`]: parse modes and options.
//! - [`builder`]: the [`AstBuilder`] contract the parser emits through.
//! - [`ast`]: the owned AST and its [`TreeBuilder`].
//! - [`preparser`]: the validation-only [`SyntaxChecker`](preparser::SyntaxChecker)
//!   and lazy compile data.
//!
//! The [`Parser`] itself is split across `statements`, `expressions`,
//! `functions` and `patterns`.  It pulls one token at a time from the
//! scanner into a single scratch [`Token`]; the scanner always sits right
//! after that token.  Speculation works through [`SavePoint`]s: a copy of
//! the scanner state from just before the current token was lexed, so a
//! restore re-seeks and re-lexes.
//!
//! # Example
//!
//! ```
//! use kestrel_core::parser::parse_program;
//! use kestrel_core::source::SourceText;
//!
//! let program = parse_program(&SourceText::new("var answer = 6 * 7;")).unwrap();
//! assert_eq!(program.body.len(), 1);
//! assert!(program.scope.declared_variables.contains("answer"));
//! ```

/// The owned AST and the tree-building [`AstBuilder`].
pub mod ast;
/// The contract between the parser and node builders.
pub mod builder;
/// Parse modes and options.
pub mod options;
/// Validation-only pre-parsing and lazy compile data.
pub mod preparser;
/// The JavaScript lexer.
pub mod scanner;
/// Scope tracking and closure-capture analysis.
pub mod scope;
/// Token model.
pub mod token;

mod expressions;
mod functions;
mod patterns;
mod statements;

use log::{debug, trace};

use crate::error::{ErrorKind, ParseError, ParseResult};
use crate::source::SourceText;

pub use ast::{Program, TreeBuilder};
pub use builder::AstBuilder;
pub use options::{ConstructorKind, FunctionParseOptions, FunctionParseType, ParseOptions, SourceParseMode};

use functions::FunctionHeader;
use scanner::{Scanner, ScannerState};
use scope::{ParserScope, ScopeStack};
use token::{Position, Span, Token, TokenKind, TokenLocation};

/// Statements and assignment expressions nested deeper than this are
/// rejected instead of exhausting the native stack.
const MAX_NESTING_DEPTH: u32 = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Parser state
// ─────────────────────────────────────────────────────────────────────────────

/// A restore point: everything needed to resume parsing at the start of the
/// token that was current when it was taken.
#[derive(Debug, Clone, Copy)]
pub struct SavePoint {
    scanner: ScannerState,
    last_end: Position,
    depth: u32,
    scope_depth: usize,
    allows_in: bool,
    function: FunctionContext,
    pending_writes: usize,
}

/// Per-function flags that are not part of the scope model.
#[derive(Debug, Clone, Copy, Default)]
struct FunctionContext {
    /// A default, rest or destructured parameter was seen.
    has_non_simple_parameters: bool,
}

#[derive(Debug)]
struct ParserState {
    /// `in` is a binary operator here (cleared in a `for` head).
    allows_in: bool,
    /// Current statement/expression nesting.
    depth: u32,
    /// Names written by a speculative destructuring assignment that has not
    /// been committed yet.
    pending_writes: Vec<(String, TokenLocation)>,
    /// Names bound by the declarator being parsed.
    bound_names: Vec<String>,
    function: FunctionContext,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            allows_in: true,
            depth: 0,
            pending_writes: Vec::new(),
            bound_names: Vec::new(),
            function: FunctionContext::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Recursive-descent JavaScript parser, generic over the node builder.
///
/// # Example
///
/// ```
/// use kestrel_core::parser::{ParseOptions, Parser, TreeBuilder};
/// use kestrel_core::source::SourceText;
///
/// let source = SourceText::new("let [a, b] = pair;");
/// let program = Parser::new(&source, TreeBuilder, ParseOptions::default())
///     .parse()
///     .unwrap();
/// assert!(program.scope.lexical_variables.contains("a"));
/// ```
pub struct Parser<'src, B: AstBuilder> {
    source: &'src SourceText,
    scanner: Scanner<'src>,
    token: Token,
    /// Scanner state from just before `token` was lexed.
    token_start: ScannerState,
    /// End of the last consumed token.
    last_end: Position,
    builder: B,
    scopes: ScopeStack,
    options: ParseOptions,
    state: ParserState,
}

impl<'src, B: AstBuilder> Parser<'src, B> {
    /// Create a parser over `source`.  Nothing is lexed until
    /// [`parse`](Self::parse) runs.
    pub fn new(source: &'src SourceText, builder: B, options: ParseOptions) -> Self {
        let scanner = Scanner::new(source);
        let token_start = scanner.save();
        let last_end = Position {
            offset: source.begin(),
            line: source.start_line(),
            column: 1,
        };
        Self {
            source,
            scanner,
            token: Token::default(),
            token_start,
            last_end,
            builder,
            scopes: ScopeStack::new(),
            options,
            state: ParserState::default(),
        }
    }

    /// Parse the whole source as a script or module.
    pub fn parse(mut self) -> ParseResult<B::Program> {
        debug!(
            "parsing {} ({} units, {:?})",
            self.display_url(),
            self.source.end() - self.source.begin(),
            self.options.mode
        );
        let result = self.parse_program_body();
        match &result {
            Ok(_) => debug!("parsed {}", self.display_url()),
            Err(error) => debug!("parse failed: {error}"),
        }
        result
    }

    /// Parse the source as a single function: `(params) { body }`, or
    /// `params => body` for arrows.
    pub fn parse_function(mut self, options: FunctionParseOptions) -> ParseResult<B::Expression> {
        debug!(
            "re-parsing function {:?} in {} ({:?})",
            options.name,
            self.display_url(),
            options.mode
        );
        let mut program = ParserScope::program(SourceParseMode::Program, options.strict);
        if options.constructor_kind != ConstructorKind::None {
            program = program.with_constructor_kind(options.constructor_kind);
        }
        self.scopes.push_scope(program);
        self.next();
        let start = self.start();
        let header = FunctionHeader {
            binds_own_name: options.mode == SourceParseMode::NormalFunction && options.name.is_some(),
            name: options.name,
            mode: options.mode,
            parse_type: options.parse_type,
            constructor_kind: options.constructor_kind,
        };
        let result = self
            .parse_function_rest(start, header)
            .and_then(|parts| {
                if !self.at(TokenKind::Eof) {
                    return Err(self.unexpected());
                }
                Ok(self.builder.create_function_expression(parts))
            });
        if let Err(error) = &result {
            debug!("parse failed: {error}");
        }
        result
    }

    fn parse_program_body(&mut self) -> ParseResult<B::Program> {
        let mode = self.options.mode;
        let mut program = ParserScope::program(mode, self.options.starts_strict());
        if self.options.constructor_kind != ConstructorKind::None {
            program = program.with_constructor_kind(self.options.constructor_kind);
        }
        self.scopes.push_scope(program);
        self.next();
        let start = self.start();
        let body = self.parse_source_elements(TokenKind::Eof)?;
        let span = self.span_from(start);
        let Some(scope) = self.scopes.current_mut() else {
            return Err(self.error(ErrorKind::Syntax, "Scope stack underflow"));
        };
        let info = scope.function_info();
        self.scopes.pop_scope(true);
        Ok(self.builder.create_program(span, mode, body, info))
    }

    fn display_url(&self) -> &str {
        match self.source.url() {
            "" => "<anonymous>",
            url => url,
        }
    }

    // ── Tokens ──────────────────────────────────────────────────────────────

    /// Consume the current token and lex the next one.
    fn next(&mut self) {
        let end = self.token.location.end;
        self.last_end = Position {
            offset: end,
            line: self.scanner.line(),
            column: end.saturating_sub(self.scanner.line_begin()) as u32 + 1,
        };
        self.lex();
    }

    fn lex(&mut self) {
        self.token_start = self.scanner.save();
        let strict = self.scopes.strict_mode();
        self.scanner.next_token(&mut self.token, strict);
    }

    fn kind(&self) -> TokenKind {
        self.token.kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    /// Consume the current token if it is `kind`.
    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or fail.
    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.consume(kind) {
            return Ok(());
        }
        if self.token.kind.is_error() {
            return Err(self.unexpected());
        }
        Err(self.error(
            ErrorKind::Syntax,
            format!("Expected '{}' but found '{}'", kind.text(), self.describe_token()),
        ))
    }

    /// The identifier or string text of the current token.
    fn token_text(&self) -> String {
        self.token.str_value().unwrap_or_default().to_owned()
    }

    /// Spelling of an identifier-name token, keywords included.
    fn identifier_name(&self) -> String {
        match self.token.str_value() {
            Some(name) => name.to_owned(),
            None => self.kind().text().to_owned(),
        }
    }

    /// An identifier, or `let` in sloppy code.
    fn at_binding_identifier(&self) -> bool {
        self.at(TokenKind::Identifier) || (self.at(TokenKind::Let) && !self.strict())
    }

    /// `of` is a contextual keyword scanned as an identifier.
    fn at_contextual(&self, word: &str) -> bool {
        self.at(TokenKind::Identifier) && self.token.str_value() == Some(word)
    }

    /// Start of the current token.
    fn start(&self) -> Position {
        self.token.location.start_position()
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.last_end)
    }

    fn strict(&self) -> bool {
        self.scopes.strict_mode()
    }

    // ── Automatic semicolon insertion ───────────────────────────────────────

    /// A statement may end here without an explicit `;`.
    fn can_insert_semicolon(&self) -> bool {
        matches!(self.kind(), TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof)
            || self.scanner.has_line_terminator()
    }

    /// Terminate a statement: consume `;`, or accept `}`, end of input or a
    /// preceding line terminator.
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.consume(TokenKind::Semicolon) || self.can_insert_semicolon() {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // ── Restore points ──────────────────────────────────────────────────────

    fn save_point(&self) -> SavePoint {
        SavePoint {
            scanner: self.token_start,
            last_end: self.last_end,
            depth: self.state.depth,
            scope_depth: self.scopes.depth(),
            allows_in: self.state.allows_in,
            function: self.state.function,
            pending_writes: self.state.pending_writes.len(),
        }
    }

    /// Rewind to `point` and re-lex its token.
    fn rewind(&mut self, point: SavePoint) {
        self.scanner.restore(point.scanner);
        self.last_end = point.last_end;
        self.state.depth = point.depth;
        self.scopes.truncate(point.scope_depth);
        self.state.allows_in = point.allows_in;
        self.state.function = point.function;
        self.state.pending_writes.truncate(point.pending_writes);
        self.lex();
    }

    /// [`rewind`](Self::rewind) after a failed speculation.
    fn restore(&mut self, point: SavePoint) {
        trace!(
            "restoring to offset {} from {}",
            point.scanner.position,
            self.token.location.begin
        );
        self.rewind(point);
    }

    /// Kind of the token after the current one.
    fn peek_kind(&mut self) -> TokenKind {
        let point = self.save_point();
        self.next();
        let kind = self.kind();
        self.rewind(point);
        kind
    }

    // ── Nesting ─────────────────────────────────────────────────────────────

    fn enter(&mut self) -> ParseResult<()> {
        self.state.depth += 1;
        if self.state.depth > MAX_NESTING_DEPTH {
            return Err(self.error(ErrorKind::Syntax, "Maximum nesting depth exceeded"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.state.depth = self.state.depth.saturating_sub(1);
    }

    /// Run `parse` with `allows_in` set to `allows_in`, restoring it after.
    fn with_allows_in<T>(
        &mut self,
        allows_in: bool,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.state.allows_in, allows_in);
        let result = parse(self);
        self.state.allows_in = saved;
        result
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    fn error_at(&self, kind: ErrorKind, message: impl Into<String>, location: &TokenLocation) -> ParseError {
        ParseError {
            kind,
            file_name: self.source.url().to_owned(),
            message: message.into(),
            line: location.line,
            column: location.begin_column() as u32 + 1,
        }
    }

    /// An error located at the current token.
    fn error(&self, kind: ErrorKind, message: impl Into<String>) -> ParseError {
        self.error_at(kind, message, &self.token.location)
    }

    fn describe_token(&self) -> String {
        match self.kind() {
            TokenKind::Identifier | TokenKind::Reserved | TokenKind::ReservedStrict => self.token_text(),
            kind => kind.text().to_owned(),
        }
    }

    /// The error for a token no rule accepts here.  Scanner failures are
    /// reported with the scanner's own message.
    fn unexpected(&self) -> ParseError {
        use TokenKind::*;
        let kind = self.kind();
        if kind.is_error() {
            let message = self.scanner.error_message().unwrap_or("Invalid token");
            return self.error(ErrorKind::Lexer, message);
        }
        match kind {
            Eof => self.error(ErrorKind::Syntax, "Unexpected end of script"),
            Identifier => self.error(
                ErrorKind::Syntax,
                format!("Unexpected identifier '{}'", self.token_text()),
            ),
            String => self.error(ErrorKind::Syntax, "Unexpected string literal"),
            Number => self.error(ErrorKind::Syntax, "Unexpected number"),
            ReservedStrict => self.error(
                ErrorKind::StrictMode,
                format!(
                    "Unexpected use of reserved word '{}' in strict mode",
                    self.token_text()
                ),
            ),
            Reserved => self.error(
                ErrorKind::Syntax,
                format!("Unexpected use of reserved word '{}'", self.token_text()),
            ),
            _ => self.error(ErrorKind::Syntax, format!("Unexpected token '{}'", kind.text())),
        }
    }

    /// Constructs that are recognised but not implemented.
    fn unsupported(&self, what: &str) -> ParseError {
        self.error(ErrorKind::Syntax, format!("{what} are not supported"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Parse `source` as a script and hand the outcome to `callback`: exactly one
/// of the two arguments is `Some`.
pub fn parse<F>(source: &SourceText, callback: F)
where
    F: FnOnce(Option<Program>, Option<ParseError>),
{
    match parse_program(source) {
        Ok(program) => callback(Some(program), None),
        Err(error) => callback(None, Some(error)),
    }
}

/// Parse `source` as a sloppy-mode script.
pub fn parse_program(source: &SourceText) -> ParseResult<Program> {
    parse_program_with(source, ParseOptions::default())
}

/// Parse `source` with explicit options.
pub fn parse_program_with(source: &SourceText, options: ParseOptions) -> ParseResult<Program> {
    Parser::new(source, TreeBuilder, options).parse()
}

/// Re-parse a function extracted from a larger source, typically the
/// `(params) { body }` text recorded by the pre-parser.
pub fn parse_function_body(source: &SourceText, options: FunctionParseOptions) -> ParseResult<ast::Function> {
    let parse_options = ParseOptions {
        strict: options.strict,
        ..ParseOptions::default()
    };
    match Parser::new(source, TreeBuilder, parse_options).parse_function(options)? {
        ast::Expr::Function(function) => Ok(*function),
        _ => Err(ParseError {
            kind: ErrorKind::Syntax,
            file_name: source.url().to_owned(),
            message: "Expected a function".to_owned(),
            line: source.start_line(),
            column: 1,
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
