//! Validation-only pre-parsing and lazy compile data.
//!
//! [`SyntaxChecker`] implements [`AstBuilder`] with throw-away node classes:
//! the [`Parser`] runs its full grammar, scope analysis and early-error
//! checks, but nothing beyond a tag per node is allocated.  Every function it
//! sees is recorded as [`LazyCompileData`], enough to re-parse that one
//! function later with [`parse_function_body`](super::parse_function_body).
//!
//! # Workflow
//!
//! 1. Call [`preparse`] to validate a source and obtain a [`PreParseResult`].
//! 2. Keep the [`LazyCompileData`] of each function instead of its AST.
//! 3. When the function is first needed, re-parse just its text:
//!
//! ```
//! use kestrel_core::parser::parse_function_body;
//! use kestrel_core::parser::preparser::preparse;
//! use kestrel_core::source::SourceText;
//!
//! let source = SourceText::new("function add(a, b) { return a + b; }");
//! let result = preparse(&source).unwrap();
//! let add = &result.functions[0];
//! assert_eq!(add.parameters, ["a", "b"]);
//!
//! let function = parse_function_body(&add.source(&source), add.options()).unwrap();
//! assert_eq!(function.params.len(), 2);
//! ```

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::error::ParseResult;
use crate::parser::builder::{
    AssignOp, AstBuilder, BinaryOp, CatchClause, Declarator, ForHead, ForInit, FunctionParts, PatternElement,
    PatternProperty, PropertyKey, PropertyKind, SwitchClause, UnaryOp, UpdateOp, VarKind,
};
use crate::parser::options::{ConstructorKind, FunctionParseOptions, FunctionParseType, ParseOptions, SourceParseMode};
use crate::parser::scope::{FunctionScopeInfo, VariableEnvironment};
use crate::parser::token::Span;
use crate::parser::Parser;
use crate::source::SourceText;

// ─────────────────────────────────────────────────────────────────────────────
// Lazy compile data
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to compile one function without re-parsing the whole
/// source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyCompileData {
    /// Declared or inferred name.
    pub name: Option<String>,
    /// The whole function, from `function` (or the method key, or the arrow's
    /// parameters) to the end of the body.
    pub span: Span,
    /// Offset of the parameter list.
    pub params_begin: usize,
    /// The body, braces included.
    pub body_span: Span,
    /// Line the function starts on.
    pub start_line: u32,
    /// Parameter names in order.
    pub parameters: Vec<String>,
    /// Declared names referenced from nested closures.
    pub captured_variables: Vec<String>,
    /// The body references `eval`.
    pub uses_eval: bool,
    /// The body is strict code.
    pub strict_mode: bool,
    /// Function mode.
    pub mode: SourceParseMode,
    /// Arrow or normal syntax.
    pub parse_type: FunctionParseType,
    /// Constructor flavour.
    pub constructor_kind: ConstructorKind,
}

impl LazyCompileData {
    fn from_parts(parts: FunctionParts<SyntaxChecker>) -> Self {
        let FunctionParts {
            span,
            params_begin,
            body_span,
            name,
            mode,
            parse_type,
            constructor_kind,
            scope,
            ..
        } = parts;
        Self {
            name,
            span,
            params_begin,
            body_span,
            start_line: span.start.line,
            parameters: scope.parameters,
            captured_variables: scope.captured_variables,
            uses_eval: scope.uses_eval,
            strict_mode: scope.strict_mode,
            mode,
            parse_type,
            constructor_kind,
        }
    }

    /// The `(params) { body }` (or `params => body`) text of the function as
    /// a view of `whole`, with line numbers preserved.
    pub fn source(&self, whole: &SourceText) -> SourceText {
        let buffer = whole.buffer();
        let mut line = self.start_line;
        let mut index = self.span.start.offset;
        while index < self.params_begin {
            let code = buffer.char_code(index);
            match code {
                0x0A | 0x2028 | 0x2029 => line += 1,
                0x0D if buffer.char_code(index + 1) != 0x0A => line += 1,
                _ => {}
            }
            index += buffer.char_length(code).max(1);
        }
        whole.sub_source(self.params_begin, self.body_span.end.offset, line)
    }

    /// Options that re-parse [`source`](Self::source) as this function.
    pub fn options(&self) -> FunctionParseOptions {
        FunctionParseOptions {
            mode: self.mode,
            parse_type: self.parse_type,
            constructor_kind: self.constructor_kind,
            strict: self.strict_mode,
            name: self.name.clone(),
        }
    }
}

/// The outcome of [`preparse`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreParseResult {
    /// One entry per function, in source order.
    pub functions: Vec<LazyCompileData>,
    /// Top-level scope information.
    pub scope: FunctionScopeInfo,
    /// The program is strict code.
    pub strict: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// SyntaxChecker
// ─────────────────────────────────────────────────────────────────────────────

/// What the parser may need to know about an expression it has already
/// checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedExpression {
    /// A plain identifier reference.
    Resolve(String),
    /// `a.b` or `a[b]`.
    Member,
    /// A string literal.
    StringLiteral,
    /// Any function form.
    Function,
    /// Anything else.
    Other,
}

/// Statement classes: only directives matter to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckedStatement {
    /// An expression statement made of a single string literal.
    Directive,
    /// Anything else.
    Other,
}

/// Builder that validates without building, recording every function.
#[derive(Debug, Default)]
pub struct SyntaxChecker {
    /// Keyed by start offset; a function revisited after backtracking
    /// replaces its earlier record.
    functions: BTreeMap<usize, LazyCompileData>,
}

impl SyntaxChecker {
    /// A checker with no recorded functions.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, parts: FunctionParts<Self>) {
        let data = LazyCompileData::from_parts(parts);
        trace!(
            "recorded function {:?} at {}..{}",
            data.name, data.span.start.offset, data.span.end.offset
        );
        self.functions.insert(data.span.start.offset, data);
    }
}

impl AstBuilder for SyntaxChecker {
    type Expression = CheckedExpression;
    type Statement = CheckedStatement;
    type Pattern = ();
    type Property = ();
    type Program = PreParseResult;

    fn resolve_name<'e>(&self, expr: &'e CheckedExpression) -> Option<&'e str> {
        match expr {
            CheckedExpression::Resolve(name) => Some(name),
            _ => None,
        }
    }

    fn is_location(&self, expr: &CheckedExpression) -> bool {
        matches!(expr, CheckedExpression::Resolve(_) | CheckedExpression::Member)
    }

    fn is_directive(&self, stmt: &CheckedStatement) -> bool {
        *stmt == CheckedStatement::Directive
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn create_this(&mut self, _: Span) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_resolve(&mut self, _: Span, name: &str) -> CheckedExpression {
        CheckedExpression::Resolve(name.to_owned())
    }

    fn create_null(&mut self, _: Span) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_boolean(&mut self, _: Span, _: bool) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_number(&mut self, _: Span, _: f64) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_string(&mut self, _: Span, _: String) -> CheckedExpression {
        CheckedExpression::StringLiteral
    }

    fn create_regexp(&mut self, _: Span, _: String, _: String) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_array(&mut self, _: Span, _: Vec<Option<CheckedExpression>>) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_object(&mut self, _: Span, _: Vec<()>) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_property(&mut self, _: Span, _: PropertyKey<CheckedExpression>, _: PropertyKind, _: CheckedExpression) {}

    fn create_spread_property(&mut self, _: Span, _: CheckedExpression) {}

    fn create_spread(&mut self, _: Span, _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_function_expression(&mut self, function: FunctionParts<Self>) -> CheckedExpression {
        self.record(function);
        CheckedExpression::Function
    }

    fn create_unary(&mut self, _: Span, _: UnaryOp, _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_update(&mut self, _: Span, _: UpdateOp, _: bool, _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_binary(&mut self, _: Span, _: BinaryOp, _: CheckedExpression, _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_conditional(
        &mut self,
        _: Span,
        _: CheckedExpression,
        _: CheckedExpression,
        _: CheckedExpression,
    ) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_assignment(
        &mut self,
        _: Span,
        _: AssignOp,
        _: CheckedExpression,
        _: CheckedExpression,
    ) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_destructuring_assignment(&mut self, _: Span, _: (), _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_sequence(&mut self, _: Span, _: Vec<CheckedExpression>) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_member(&mut self, _: Span, _: CheckedExpression, _: String) -> CheckedExpression {
        CheckedExpression::Member
    }

    fn create_computed_member(&mut self, _: Span, _: CheckedExpression, _: CheckedExpression) -> CheckedExpression {
        CheckedExpression::Member
    }

    fn create_call(&mut self, _: Span, _: CheckedExpression, _: Vec<CheckedExpression>) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_new(&mut self, _: Span, _: CheckedExpression, _: Option<Vec<CheckedExpression>>) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_super(&mut self, _: Span) -> CheckedExpression {
        CheckedExpression::Other
    }

    fn create_new_target(&mut self, _: Span) -> CheckedExpression {
        CheckedExpression::Other
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn create_binding(&mut self, _: Span, _: &str) {}

    fn create_assignment_target(&mut self, _: Span, _: CheckedExpression) {}

    fn create_array_pattern(&mut self, _: Span, _: Vec<Option<PatternElement<Self>>>, _: Option<()>) {}

    fn create_object_pattern(&mut self, _: Span, _: Vec<PatternProperty<Self>>) {}

    // ── Statements ──────────────────────────────────────────────────────────

    fn create_block(&mut self, _: Span, _: Vec<CheckedStatement>, _: VariableEnvironment) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_var_declaration(&mut self, _: Span, _: VarKind, _: Vec<Declarator<Self>>) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_function_declaration(&mut self, function: FunctionParts<Self>) -> CheckedStatement {
        self.record(function);
        CheckedStatement::Other
    }

    fn create_expression_statement(&mut self, _: Span, expr: CheckedExpression) -> CheckedStatement {
        match expr {
            CheckedExpression::StringLiteral => CheckedStatement::Directive,
            _ => CheckedStatement::Other,
        }
    }

    fn create_if(
        &mut self,
        _: Span,
        _: CheckedExpression,
        _: CheckedStatement,
        _: Option<CheckedStatement>,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_for(
        &mut self,
        _: Span,
        _: Option<ForInit<Self>>,
        _: Option<CheckedExpression>,
        _: Option<CheckedExpression>,
        _: CheckedStatement,
        _: VariableEnvironment,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_for_in(
        &mut self,
        _: Span,
        _: ForHead<Self>,
        _: CheckedExpression,
        _: CheckedStatement,
        _: VariableEnvironment,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_for_of(
        &mut self,
        _: Span,
        _: ForHead<Self>,
        _: CheckedExpression,
        _: CheckedStatement,
        _: VariableEnvironment,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_while(&mut self, _: Span, _: CheckedExpression, _: CheckedStatement) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_do_while(&mut self, _: Span, _: CheckedStatement, _: CheckedExpression) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_switch(
        &mut self,
        _: Span,
        _: CheckedExpression,
        _: Vec<SwitchClause<Self>>,
        _: VariableEnvironment,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_try(
        &mut self,
        _: Span,
        _: CheckedStatement,
        _: Option<CatchClause<Self>>,
        _: Option<CheckedStatement>,
    ) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_return(&mut self, _: Span, _: Option<CheckedExpression>) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_throw(&mut self, _: Span, _: CheckedExpression) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_break(&mut self, _: Span, _: Option<String>) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_continue(&mut self, _: Span, _: Option<String>) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_labeled(&mut self, _: Span, _: String, _: CheckedStatement) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_with(&mut self, _: Span, _: CheckedExpression, _: CheckedStatement) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_debugger(&mut self, _: Span) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_empty(&mut self, _: Span) -> CheckedStatement {
        CheckedStatement::Other
    }

    fn create_program(
        &mut self,
        _: Span,
        _: SourceParseMode,
        _: Vec<CheckedStatement>,
        scope: FunctionScopeInfo,
    ) -> PreParseResult {
        PreParseResult {
            functions: std::mem::take(&mut self.functions).into_values().collect(),
            strict: scope.strict_mode,
            scope,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Validate `source` as a sloppy-mode script and record every function in it.
pub fn preparse(source: &SourceText) -> ParseResult<PreParseResult> {
    preparse_with(source, ParseOptions::default())
}

/// Validate `source` with explicit options.
pub fn preparse_with(source: &SourceText, options: ParseOptions) -> ParseResult<PreParseResult> {
    let result = Parser::new(source, SyntaxChecker::new(), options).parse()?;
    debug!("pre-parsed {} functions", result.functions.len());
    Ok(result)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::ast::FunctionBody;
    use crate::parser::parse_function_body;

    fn preparse_ok(src: &str) -> PreParseResult {
        match preparse(&SourceText::new(src)) {
            Ok(result) => result,
            Err(error) => panic!("{src:?} failed: {error}"),
        }
    }

    #[test]
    fn test_preparse_records_functions_in_source_order() {
        let result = preparse_ok("function a() { function b() {} }\nvar c = function () {};");
        let names: Vec<_> = result.functions.iter().map(|f| f.name.as_deref()).collect();
        assert_eq!(names, [Some("a"), Some("b"), None]);
        assert_eq!(result.functions[2].start_line, 2);
    }

    #[test]
    fn test_preparse_spans() {
        let src = "function add(a, b) { return a + b; }";
        let result = preparse_ok(src);
        let add = &result.functions[0];
        assert_eq!(add.span.start.offset, 0);
        assert_eq!(add.span.end.offset, src.len());
        assert_eq!(add.params_begin, 12);
        assert_eq!(add.body_span.start.offset, 19);
        assert_eq!(add.parameters, ["a", "b"]);
    }

    #[test]
    fn test_preparse_captures_and_eval() {
        let result = preparse_ok("function outer() { var x, y; eval(''); return function () { return x; }; }");
        let outer = &result.functions[0];
        assert_eq!(outer.captured_variables, ["x", "y"]);
        assert!(outer.uses_eval);

        let result = preparse_ok("function outer() { var x, y; return function () { return x; }; }");
        assert_eq!(result.functions[0].captured_variables, ["x"]);
        assert!(!result.functions[0].uses_eval);
    }

    #[test]
    fn test_preparse_strictness() {
        let result = preparse_ok("function f() { 'use strict'; } function g() {}");
        assert!(result.functions[0].strict_mode);
        assert!(!result.functions[1].strict_mode);
        assert!(!result.strict);

        let result = preparse_ok("'use strict'; function f() {}");
        assert!(result.strict);
        assert!(result.functions[0].strict_mode);
    }

    #[test]
    fn test_preparse_reports_errors() {
        let error = preparse(&SourceText::new("function f( { }")).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Syntax);

        let error = preparse(&SourceText::new("'use strict'; function f(a, a) {}")).unwrap_err();
        assert_eq!(error.kind, ErrorKind::StrictMode);
    }

    #[test]
    fn test_backtracked_functions_are_recorded_once() {
        let result = preparse_ok("(function () {}); [a = function () {}] = b; x = (y) => function () {};");
        assert_eq!(result.functions.len(), 4);
    }

    #[test]
    fn test_lazy_reparse_of_declaration() {
        let source = SourceText::new("var k = 1;\nfunction scale(x, y = k) {\n  return x * y;\n}");
        let result = preparse(&source).unwrap();
        let scale = &result.functions[0];

        let text = scale.source(&source);
        assert_eq!(text.text(), "(x, y = k) {\n  return x * y;\n}");
        assert_eq!(text.start_line(), 2);

        let function = parse_function_body(&text, scale.options()).unwrap();
        assert_eq!(function.params.len(), 2);
        assert_eq!(function.scope.parameters, scale.parameters);
        assert_eq!(function.scope.free_variables, ["k"]);
        assert_eq!(function.body_loc.start.line, 2);
    }

    #[test]
    fn test_lazy_reparse_of_arrow_and_method() {
        let source = SourceText::new("var f = x => x * 2, o = { m(a) { return a; } };");
        let result = preparse(&source).unwrap();
        assert_eq!(result.functions.len(), 2);

        let arrow = &result.functions[0];
        assert_eq!(arrow.parse_type, FunctionParseType::Arrow);
        let function = parse_function_body(&arrow.source(&source), arrow.options()).unwrap();
        assert!(matches!(function.body, FunctionBody::Expression(_)));

        let method = &result.functions[1];
        assert_eq!(method.mode, SourceParseMode::Method);
        let function = parse_function_body(&method.source(&source), method.options()).unwrap();
        assert_eq!(function.params.len(), 1);
    }

    #[test]
    fn test_source_line_counts_line_terminators() {
        let source = SourceText::new("x = function\r\n\u{2028}(a) {}");
        let result = preparse(&source).unwrap();
        let text = result.functions[0].source(&source);
        assert_eq!(text.start_line(), 3);
    }

    #[test]
    fn test_checker_classification() {
        let mut checker = SyntaxChecker::new();
        let name = checker.create_resolve(Span::default(), "a");
        assert_eq!(checker.resolve_name(&name), Some("a"));
        let member = checker.create_member(Span::default(), name, "b".to_owned());
        assert!(checker.is_location(&member));
        assert!(!checker.is_resolve(&member));
        let string = checker.create_string(Span::default(), "use strict".to_owned());
        let directive = checker.create_expression_statement(Span::default(), string);
        assert!(checker.is_directive(&directive));
    }
}
