//! Function declarations, expressions, arrows and methods: parameter lists,
//! bodies and the function scope around them.

use crate::error::{ErrorKind, ParseResult};

use super::Parser;
use super::builder::{AstBuilder, FunctionBody, FunctionParts, Parameter};
use super::options::{ConstructorKind, FunctionParseType, SourceParseMode};
use super::patterns::DestructuringKind;
use super::scope::{DeclarationKind, DeclarationResult, FunctionScopeInfo, ParserScope};
use super::token::{Position, TokenKind};

/// What is known about a function before its parameter list.
#[derive(Debug, Clone)]
pub(super) struct FunctionHeader {
    pub name: Option<String>,
    pub mode: SourceParseMode,
    pub parse_type: FunctionParseType,
    pub constructor_kind: ConstructorKind,
    /// A named function expression, whose name is visible inside it.
    pub binds_own_name: bool,
}

impl<'src, B: AstBuilder> Parser<'src, B> {
    /// `function name(params) { body }` in statement position.
    ///
    /// The name is var-scoped, except in strict code inside a block where it
    /// is lexical.
    pub(super) fn parse_function_declaration(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        if !self.at(TokenKind::Identifier) {
            return Err(self.unexpected());
        }
        let name = self.token_text();
        let location = self.token.location;
        let in_block = self.scopes.current().is_some_and(ParserScope::is_lexical_scope);
        let kind = if self.strict() && in_block {
            DeclarationKind::Let
        } else {
            DeclarationKind::Var
        };
        let result = self.scopes.declare_variable(&name, kind);
        if result.contains(DeclarationResult::INVALID_STRICT_MODE) && self.strict() {
            return Err(self.error_at(
                ErrorKind::StrictMode,
                format!("Cannot declare a function named '{name}' in strict mode"),
                &location,
            ));
        }
        if result.contains(DeclarationResult::INVALID_DUPLICATED) {
            return Err(self.error_at(
                ErrorKind::Semantic,
                format!("Identifier '{name}' has already been declared"),
                &location,
            ));
        }
        self.next();
        let header = FunctionHeader {
            name: Some(name),
            mode: SourceParseMode::NormalFunction,
            parse_type: FunctionParseType::Normal,
            constructor_kind: ConstructorKind::None,
            binds_own_name: false,
        };
        let parts = self.parse_function_rest(start, header)?;
        Ok(self.builder.create_function_declaration(parts))
    }

    /// `params => body`, starting at the parameter list.
    pub(super) fn parse_arrow_function(&mut self, start: Position) -> ParseResult<B::Expression> {
        let header = FunctionHeader {
            name: None,
            mode: SourceParseMode::ArrowFunction,
            parse_type: FunctionParseType::Arrow,
            constructor_kind: ConstructorKind::None,
            binds_own_name: false,
        };
        let parts = self.parse_function_rest(start, header)?;
        Ok(self.builder.create_function_expression(parts))
    }

    /// Parameters and body of any function, from the token after its name.
    ///
    /// The function gets its own scope and parse context; the enclosing
    /// ones are back in place when this returns.
    pub(super) fn parse_function_rest(
        &mut self,
        start: Position,
        header: FunctionHeader,
    ) -> ParseResult<FunctionParts<B>> {
        // Method and accessor keys are property names, not bindings.
        let binding_name = header
            .name
            .as_deref()
            .filter(|_| header.mode == SourceParseMode::NormalFunction);
        let mut scope = ParserScope::function(header.mode, header.constructor_kind, binding_name, self.strict());
        if header.binds_own_name {
            scope.set_binds_own_name();
        }
        self.scopes.push_scope(scope);
        let outer_function = std::mem::take(&mut self.state.function);
        let outer_allows_in = std::mem::replace(&mut self.state.allows_in, true);
        let result = self.parse_function_inner(start, header, outer_allows_in);
        self.state.function = outer_function;
        self.state.allows_in = outer_allows_in;
        result
    }

    fn parse_function_inner(
        &mut self,
        start: Position,
        header: FunctionHeader,
        outer_allows_in: bool,
    ) -> ParseResult<FunctionParts<B>> {
        let is_arrow = header.parse_type == FunctionParseType::Arrow;
        let params_begin = self.token.location.begin;
        let params = if is_arrow && self.at_binding_identifier() {
            let param_start = self.start();
            let pattern = self.parse_binding_identifier(DestructuringKind::Parameters)?;
            vec![Parameter {
                span: self.span_from(param_start),
                pattern,
                default: None,
                is_rest: false,
            }]
        } else {
            self.expect(TokenKind::LeftParen)?;
            let params = self.parse_formal_parameters()?;
            self.expect(TokenKind::RightParen)?;
            params
        };
        self.check_parameters(&header, &params)?;

        if is_arrow {
            if !self.at(TokenKind::Arrow) {
                return Err(self.unexpected());
            }
            if self.scanner.has_line_terminator() {
                return Err(self.error(ErrorKind::Syntax, "Line terminator not permitted before arrow"));
            }
            self.next();
        }

        let body_start = self.start();
        let (body, scope) = if self.at(TokenKind::LeftBrace) {
            self.next();
            let statements = self.parse_source_elements(TokenKind::RightBrace)?;
            // Pop before consuming `}` so the following token is lexed with
            // the enclosing strictness.
            let scope = self.finish_function_scope();
            self.next();
            (FunctionBody::Block(statements), scope)
        } else if is_arrow {
            let expr = self.with_allows_in(outer_allows_in, |p| p.parse_assignment_expression())?;
            (FunctionBody::Expression(expr), self.finish_function_scope())
        } else {
            return Err(self.unexpected());
        };

        Ok(FunctionParts {
            span: self.span_from(start),
            params_begin,
            body_span: self.span_from(body_start),
            name: header.name,
            mode: header.mode,
            parse_type: header.parse_type,
            constructor_kind: header.constructor_kind,
            params,
            body,
            scope,
        })
    }

    fn finish_function_scope(&mut self) -> FunctionScopeInfo {
        let info = self
            .scopes
            .current_mut()
            .map(ParserScope::function_info)
            .unwrap_or_default();
        self.scopes.pop_scope(true);
        info
    }

    /// `a, [b, c] = d, ...rest` up to (not including) `)`.
    fn parse_formal_parameters(&mut self) -> ParseResult<Vec<Parameter<B>>> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let param_start = self.start();
            if self.consume(TokenKind::DotDotDot) {
                self.state.function.has_non_simple_parameters = true;
                let pattern = self.parse_parameter_target()?;
                if !self.at(TokenKind::RightParen) {
                    return Err(self.error(ErrorKind::Syntax, "Rest parameter must be last formal parameter"));
                }
                params.push(Parameter {
                    span: self.span_from(param_start),
                    pattern,
                    default: None,
                    is_rest: true,
                });
                break;
            }
            let pattern = self.parse_parameter_target()?;
            let default = if self.consume(TokenKind::Equal) {
                self.state.function.has_non_simple_parameters = true;
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            params.push(Parameter {
                span: self.span_from(param_start),
                pattern,
                default,
                is_rest: false,
            });
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_parameter_target(&mut self) -> ParseResult<B::Pattern> {
        match self.kind() {
            _ if self.at_binding_identifier() => self.parse_binding_identifier(DestructuringKind::Parameters),
            TokenKind::LeftBracket | TokenKind::LeftBrace => {
                self.state.function.has_non_simple_parameters = true;
                self.parse_binding_pattern(DestructuringKind::Parameters)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Accessor arity, and duplicate names where the list does not allow
    /// them even in sloppy code.
    fn check_parameters(&self, header: &FunctionHeader, params: &[Parameter<B>]) -> ParseResult<()> {
        match header.mode {
            SourceParseMode::Getter if !params.is_empty() => {
                return Err(self.error(ErrorKind::Syntax, "Getter must not have any formal parameters."));
            }
            SourceParseMode::Setter if params.len() != 1 || params[0].is_rest => {
                return Err(self.error(ErrorKind::Syntax, "Setter must have exactly one formal parameter."));
            }
            _ => {}
        }
        let has_duplicate = self
            .scopes
            .current()
            .is_some_and(ParserScope::has_duplicate_parameter);
        let strict_list = header.parse_type == FunctionParseType::Arrow
            || header.mode.is_method_like()
            || self.state.function.has_non_simple_parameters;
        if has_duplicate && strict_list {
            return Err(self.error(
                ErrorKind::Syntax,
                "Duplicate parameter name not allowed in this context",
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ParseError};
    use crate::parser::ast::{Expr, Function, FunctionBody, Program, Stmt};
    use crate::parser::parse_program;
    use crate::source::SourceText;

    fn parse_ok(text: &str) -> Program {
        match parse_program(&SourceText::new(text)) {
            Ok(program) => program,
            Err(error) => panic!("{text:?} failed: {error}"),
        }
    }

    fn parse_err(text: &str) -> ParseError {
        match parse_program(&SourceText::new(text)) {
            Ok(_) => panic!("{text:?} should not parse"),
            Err(error) => error,
        }
    }

    fn declaration(program: &Program, index: usize) -> &Function {
        match &program.body[index] {
            Stmt::FunctionDecl(function) => function,
            other => panic!("expected a function declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_closure_captures_outer_variables() {
        let program = parse_ok(
            "function outer(a, b) {\n\
               var c = 1, d = 2;\n\
               { let e = 3; c + e; }\n\
               return function () { return a + c; };\n\
             }",
        );
        let outer = declaration(&program, 0);
        assert!(outer.scope.is_captured("a"));
        assert!(outer.scope.is_captured("c"));
        assert!(!outer.scope.is_captured("b"));
        assert!(!outer.scope.is_captured("d"));
        assert!(!outer.scope.is_captured("e"));
        assert!(program.scope.free_variables.is_empty());
    }

    #[test]
    fn test_free_variables_bubble_out() {
        let program = parse_ok("function f() { return g(h); }");
        assert_eq!(declaration(&program, 0).scope.free_variables, vec!["g", "h"]);
        assert_eq!(program.scope.free_variables, vec!["g", "h"]);
    }

    #[test]
    fn test_named_function_expression_binds_itself() {
        let program = parse_ok("var fact = function fact2(n) { return n ? fact2(n - 1) : 1; };");
        assert!(program.scope.free_variables.is_empty());
    }

    #[test]
    fn test_eval_forces_full_activation() {
        let program = parse_ok("function f(a) { var b; eval('a'); }");
        let function = declaration(&program, 0);
        assert!(function.scope.uses_eval);
        assert!(function.scope.is_captured("a"));
        assert!(function.scope.is_captured("b"));
    }

    #[test]
    fn test_parameter_forms() {
        let program = parse_ok("function f(a, [b, c] = d, {e}, ...f) {}");
        let function = declaration(&program, 0);
        assert_eq!(function.params.len(), 4);
        assert!(function.params[1].default.is_some());
        assert!(function.params[3].is_rest);
        assert_eq!(function.scope.parameters, vec!["a", "b", "c", "e", "f"]);
        assert_eq!(
            parse_err("function f(...a, b) {}").message,
            "Rest parameter must be last formal parameter"
        );
    }

    #[test]
    fn test_duplicate_parameters() {
        parse_ok("function f(a, a) {}");
        for text in [
            "function f(a, a = 1) {}",
            "function f(a, [a]) {}",
            "(a, a) => a;",
            "({ m(a, a) {} });",
        ] {
            assert_eq!(parse_err(text).kind, ErrorKind::Syntax, "{text}");
        }
        let error = parse_err("'use strict'; function f(a, a) {}");
        assert_eq!(error.kind, ErrorKind::StrictMode);
        assert_eq!(error.column, 29);
    }

    #[test]
    fn test_accessor_arity() {
        assert_eq!(
            parse_err("({ get a(x) {} });").message,
            "Getter must not have any formal parameters."
        );
        assert_eq!(
            parse_err("({ set a() {} });").message,
            "Setter must have exactly one formal parameter."
        );
        assert_eq!(
            parse_err("({ set a(...v) {} });").message,
            "Setter must have exactly one formal parameter."
        );
    }

    #[test]
    fn test_strict_function_names() {
        assert_eq!(
            parse_err("'use strict'; function arguments() {}").kind,
            ErrorKind::StrictMode
        );
        parse_ok("function eval() {}");
        assert_eq!(parse_err("let f; function f() {}").kind, ErrorKind::Semantic);
    }

    #[test]
    fn test_strict_mode_is_inherited_but_not_leaked() {
        let program = parse_ok("function f() { 'use strict'; return function g() {}; } var w = 010;");
        let outer = declaration(&program, 0);
        assert!(outer.scope.strict_mode);
        let FunctionBody::Block(body) = &outer.body else {
            panic!("expected a block body");
        };
        let Stmt::Return(ret) = &body[1] else {
            panic!("expected a return statement");
        };
        let Some(Expr::Function(inner)) = ret.argument.as_deref() else {
            panic!("expected a function expression");
        };
        assert!(inner.scope.strict_mode);
        assert!(!program.scope.strict_mode);
    }

    #[test]
    fn test_function_spans() {
        let program = parse_ok("var g = 1;\nfunction add(a, b) { return a + b; }");
        let function = declaration(&program, 1);
        assert_eq!(function.loc.start.line, 2);
        assert_eq!(function.loc.start.column, 1);
        assert_eq!(function.params_begin, 23);
        assert_eq!(function.body_loc.start.offset, 30);
        assert_eq!(function.body_loc.end.offset, 47);
    }

    #[test]
    fn test_arrow_concise_body_keeps_enclosing_in_flag() {
        parse_ok("for (var f = x => x; f; ) {}");
        assert_eq!(parse_err("for (var f = x => x in o; f; ) {}").kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_missing_function_name() {
        assert_eq!(parse_err("function () {}").kind, ErrorKind::Syntax);
    }
}
