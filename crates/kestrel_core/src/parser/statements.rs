//! Statement parsing: source elements and the directive prologue,
//! declarations, control flow and labels.

use log::trace;

use crate::error::{ErrorKind, ParseResult};

use super::Parser;
use super::builder::{AstBuilder, CatchClause, Declarator, ForHead, ForInit, SwitchClause, VarKind};
use super::patterns::DestructuringKind;
use super::scope::{ParserScope, VariableEnvironment};
use super::token::{Position, TokenKind, TokenLocation, keyword_kind};

/// Declarators of one `var`/`let`/`const` list, before it becomes a
/// statement.
struct DeclarationList<B: AstBuilder> {
    declarators: Vec<Declarator<B>>,
    /// First declarator lacking an initializer its kind requires.
    missing_initializer: Option<TokenLocation>,
    has_initializer: bool,
}

/// Words reserved only in strict mode code.
fn is_strict_reserved_word(name: &str) -> bool {
    keyword_kind(name) == Some(TokenKind::ReservedStrict)
}

impl<'src, B: AstBuilder> Parser<'src, B> {
    // ── Source elements ─────────────────────────────────────────────────────

    /// Parse statement list items up to `end` (`}` or end of input).
    ///
    /// Leading string-literal statements form the directive prologue; a
    /// `"use strict"` directive switches the enclosing function to strict
    /// mode and re-parses the list from its start under the new rules.
    pub(super) fn parse_source_elements(&mut self, end: TokenKind) -> ParseResult<Vec<B::Statement>> {
        let list_start = self.save_point();
        let mut body = Vec::new();
        let mut in_prologue = true;
        while !self.at(end) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            if in_prologue && self.at(TokenKind::String) {
                let location = self.token.location;
                let is_use_strict = self.token.str_value() == Some("use strict")
                    && location.end - location.begin == "'use strict'".len();
                let statement = self.parse_statement_list_item()?;
                if !self.builder.is_directive(&statement) {
                    in_prologue = false;
                } else if is_use_strict && !self.strict() {
                    self.enable_strict_mode(&location)?;
                    trace!("\"use strict\" at offset {}, re-parsing the prologue", location.begin);
                    self.restore(list_start);
                    body.clear();
                    continue;
                }
                body.push(statement);
                continue;
            }
            in_prologue = false;
            body.push(self.parse_statement_list_item()?);
        }
        Ok(body)
    }

    /// Switch the innermost function to strict mode and re-check what was
    /// already accepted under sloppy rules: its name and parameters.
    fn enable_strict_mode(&mut self, directive: &TokenLocation) -> ParseResult<()> {
        let non_simple = self.state.function.has_non_simple_parameters;
        let Some(scope) = self.scopes.current_function_mut() else {
            return Ok(());
        };
        if scope.is_function() && non_simple {
            return Err(self.error_at(
                ErrorKind::Syntax,
                "Illegal 'use strict' directive in function with non-simple parameter list",
                directive,
            ));
        }
        scope.set_strict_mode();
        let valid = scope.is_valid_strict_mode()
            && !scope.has_duplicate_parameter()
            && !scope.function_name().is_some_and(is_strict_reserved_word)
            && !scope.declared_parameters().iter().any(|p| is_strict_reserved_word(p));
        if !valid {
            return Err(self.error_at(
                ErrorKind::StrictMode,
                "Invalid parameters or function name in strict mode",
                directive,
            ));
        }
        Ok(())
    }

    // ── Statements ──────────────────────────────────────────────────────────

    /// A statement or a declaration.
    pub(super) fn parse_statement_list_item(&mut self) -> ParseResult<B::Statement> {
        match self.kind() {
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::Const => self.parse_lexical_declaration(VarKind::Const),
            TokenKind::Let if self.is_let_declaration() => self.parse_lexical_declaration(VarKind::Let),
            TokenKind::Class => Err(self.unsupported("Classes")),
            TokenKind::Import | TokenKind::Export => Err(self.unsupported("Modules")),
            _ => self.parse_statement(),
        }
    }

    /// In sloppy code `let` is an identifier unless a binding follows.
    fn is_let_declaration(&mut self) -> bool {
        self.strict()
            || matches!(
                self.peek_kind(),
                TokenKind::Identifier | TokenKind::LeftBracket | TokenKind::LeftBrace
            )
    }

    /// A statement in a single-statement context.
    pub(super) fn parse_statement(&mut self) -> ParseResult<B::Statement> {
        self.enter()?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> ParseResult<B::Statement> {
        use TokenKind::*;
        match self.kind() {
            LeftBrace => self.parse_block_statement(),
            Var => self.parse_var_statement(),
            Semicolon => {
                let start = self.start();
                self.next();
                Ok(self.builder.create_empty(self.span_from(start)))
            }
            If => self.parse_if_statement(),
            For => self.parse_for_statement(),
            While => self.parse_while_statement(),
            Do => self.parse_do_while_statement(),
            Continue => self.parse_continue_statement(),
            Break => self.parse_break_statement(),
            Return => self.parse_return_statement(),
            With => self.parse_with_statement(),
            Switch => self.parse_switch_statement(),
            Throw => self.parse_throw_statement(),
            Try => self.parse_try_statement(),
            Debugger => {
                let start = self.start();
                self.next();
                self.consume_semicolon()?;
                Ok(self.builder.create_debugger(self.span_from(start)))
            }
            Function if self.strict() => Err(self.error(
                ErrorKind::StrictMode,
                "In strict mode code, functions can only be declared at top level or inside a block",
            )),
            Function => self.parse_function_declaration(),
            Const => Err(self.lexical_in_single_statement()),
            Let if self.is_let_declaration() => Err(self.lexical_in_single_statement()),
            Class => Err(self.unsupported("Classes")),
            Import | Export => Err(self.unsupported("Modules")),
            Identifier if self.scanner.is_next_token_colon() => self.parse_labeled_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn lexical_in_single_statement(&self) -> crate::error::ParseError {
        self.error(
            ErrorKind::Syntax,
            "Lexical declaration cannot appear in a single-statement context",
        )
    }

    fn parse_expression_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.builder.create_expression_statement(self.span_from(start), expr))
    }

    /// `{ ... }` with its own lexical scope.
    pub(super) fn parse_block_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.expect(TokenKind::LeftBrace)?;
        self.scopes.push_lexical_scope();
        let body = self.parse_block_body()?;
        self.expect(TokenKind::RightBrace)?;
        let scope = self.finish_block_scope();
        Ok(self.builder.create_block(self.span_from(start), body, scope))
    }

    /// Statement list items up to (not including) `}`.
    fn parse_block_body(&mut self) -> ParseResult<Vec<B::Statement>> {
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item()?);
        }
        Ok(body)
    }

    /// Pop the innermost block-like scope and return its lexical bindings.
    fn finish_block_scope(&mut self) -> VariableEnvironment {
        let scope = self
            .scopes
            .current_mut()
            .map(ParserScope::finish_block)
            .unwrap_or_default();
        self.scopes.pop_scope(true);
        scope
    }

    // ── Declarations ────────────────────────────────────────────────────────

    fn parse_var_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        let list = self.parse_declaration_list(VarKind::Var, false)?;
        self.consume_semicolon()?;
        Ok(self
            .builder
            .create_var_declaration(self.span_from(start), VarKind::Var, list.declarators))
    }

    fn parse_lexical_declaration(&mut self, kind: VarKind) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        let list = self.parse_declaration_list(kind, false)?;
        self.consume_semicolon()?;
        Ok(self
            .builder
            .create_var_declaration(self.span_from(start), kind, list.declarators))
    }

    /// `a = 1, [b, c] = d, ...`
    ///
    /// In a `for` head the initializer requirements of `const` and patterns
    /// are only known once the parser has seen whether `in`/`of` follows, so
    /// they are reported through `missing_initializer` instead.
    fn parse_declaration_list(&mut self, kind: VarKind, in_for_head: bool) -> ParseResult<DeclarationList<B>> {
        let binding_kind = match kind {
            VarKind::Var => DestructuringKind::Variables,
            VarKind::Let => DestructuringKind::Let,
            VarKind::Const => DestructuringKind::Const,
        };
        let mut list = DeclarationList {
            declarators: Vec::new(),
            missing_initializer: None,
            has_initializer: false,
        };
        loop {
            let start = self.start();
            let location = self.token.location;
            let mark = self.state.bound_names.len();
            let is_pattern = matches!(self.kind(), TokenKind::LeftBracket | TokenKind::LeftBrace);
            let target = if is_pattern {
                self.parse_binding_pattern(binding_kind)?
            } else if self.at_binding_identifier() {
                self.parse_binding_identifier(binding_kind)?
            } else {
                return Err(self.unexpected());
            };
            let bound = self.state.bound_names.split_off(mark);

            let init = if self.consume(TokenKind::Equal) {
                list.has_initializer = true;
                for name in &bound {
                    self.scopes.write_variable(name);
                }
                Some(self.parse_assignment_expression()?)
            } else {
                if kind == VarKind::Const || is_pattern {
                    if !in_for_head {
                        let what = if is_pattern { "destructuring" } else { "const" };
                        return Err(self.error(
                            ErrorKind::Syntax,
                            format!("Missing initializer in {what} declaration"),
                        ));
                    }
                    list.missing_initializer.get_or_insert(location);
                }
                None
            };
            list.declarators.push(Declarator {
                span: self.span_from(start),
                target,
                init,
            });
            if !self.consume(TokenKind::Comma) {
                return Ok(list);
            }
        }
    }

    // ── Control flow ────────────────────────────────────────────────────────

    fn parse_if_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let consequent = self.parse_statement()?;
        let alternate = if self.consume(TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self
            .builder
            .create_if(self.span_from(start), test, consequent, alternate))
    }

    /// A loop body: `break`/`continue` become legal inside it.
    fn parse_loop_body(&mut self) -> ParseResult<B::Statement> {
        self.scopes.begin_loop();
        let body = self.parse_statement();
        self.scopes.end_loop();
        body
    }

    fn parse_while_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(self.builder.create_while(self.span_from(start), test, body))
    }

    fn parse_do_while_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        // The `;` after `do-while` may always be omitted.
        self.consume(TokenKind::Semicolon);
        Ok(self.builder.create_do_while(self.span_from(start), body, test))
    }

    fn parse_for_statement(&mut self) -> ParseResult<B::Statement> {
        use TokenKind::*;
        let start = self.start();
        self.next();
        self.expect(LeftParen)?;
        self.scopes.push_lexical_scope();

        let init = if self.at(Semicolon) {
            None
        } else if self.at(Var) || self.at(Const) || (self.at(Let) && self.is_let_declaration()) {
            let kind = match self.kind() {
                Var => VarKind::Var,
                Let => VarKind::Let,
                _ => VarKind::Const,
            };
            let declaration_start = self.start();
            self.next();
            let list = self.with_allows_in(false, |p| p.parse_declaration_list(kind, true))?;
            let is_of = self.at_contextual("of");
            if self.at(In) || is_of {
                let loop_kind = if is_of { "of" } else { "in" };
                if list.declarators.len() != 1 {
                    return Err(self.error(
                        ErrorKind::Syntax,
                        format!("Only a single variable may be declared in a for-{loop_kind} loop"),
                    ));
                }
                if list.has_initializer {
                    return Err(self.error(
                        ErrorKind::Syntax,
                        format!("for-{loop_kind} loop variable declaration may not have an initializer"),
                    ));
                }
                let declaration =
                    self.builder
                        .create_var_declaration(self.span_from(declaration_start), kind, list.declarators);
                return self.parse_for_in_of_rest(start, ForHead::Declaration(declaration), is_of);
            }
            if let Some(location) = list.missing_initializer {
                return Err(self.error_at(
                    ErrorKind::Syntax,
                    "Missing initializer in for loop declaration",
                    &location,
                ));
            }
            let declaration =
                self.builder
                    .create_var_declaration(self.span_from(declaration_start), kind, list.declarators);
            Some(ForInit::Declaration(declaration))
        } else {
            if (self.at(LeftBracket) || self.at(LeftBrace))
                && self.bracketed_is_followed_by(|p| p.at(In) || p.at_contextual("of"))
            {
                let point = self.save_point();
                if let Ok(Some(pattern)) = self.parse_destructuring_pattern(DestructuringKind::Expressions)
                    && (self.at(In) || self.at_contextual("of"))
                {
                    let is_of = self.at_contextual("of");
                    self.commit_pending_writes(point)?;
                    return self.parse_for_in_of_rest(start, ForHead::Pattern(pattern), is_of);
                }
                self.restore(point);
            }
            let location = self.token.location;
            let expr = self.with_allows_in(false, |p| p.parse_expression())?;
            let is_of = self.at_contextual("of");
            if self.at(In) || is_of {
                if !self.builder.is_location(&expr) {
                    return Err(self.error_at(
                        ErrorKind::Syntax,
                        format!("Invalid left-hand side in for-{} loop", if is_of { "of" } else { "in" }),
                        &location,
                    ));
                }
                self.note_assignment(&expr, &location)?;
                return self.parse_for_in_of_rest(start, ForHead::Target(expr), is_of);
            }
            Some(ForInit::Expression(expr))
        };

        self.expect(Semicolon)?;
        let test = if self.at(Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Semicolon)?;
        let update = if self.at(RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(RightParen)?;
        let body = self.parse_loop_body()?;
        let scope = self.finish_block_scope();
        Ok(self
            .builder
            .create_for(self.span_from(start), init, test, update, body, scope))
    }

    /// Everything after the head of a `for-in`/`for-of`, starting at the
    /// `in`/`of` token.
    fn parse_for_in_of_rest(&mut self, start: Position, left: ForHead<B>, is_of: bool) -> ParseResult<B::Statement> {
        self.next();
        let right = if is_of {
            self.parse_assignment_expression()?
        } else {
            self.parse_expression()?
        };
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        let scope = self.finish_block_scope();
        let span = self.span_from(start);
        Ok(if is_of {
            self.builder.create_for_of(span, left, right, body, scope)
        } else {
            self.builder.create_for_in(span, left, right, body, scope)
        })
    }

    fn parse_continue_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        let location = self.token.location;
        self.next();
        let label = if !self.can_insert_semicolon() && self.at(TokenKind::Identifier) {
            let name = self.token_text();
            match self.scopes.find_label(&name) {
                Some(true) => {}
                Some(false) => {
                    return Err(self.error(
                        ErrorKind::Semantic,
                        format!("Cannot continue to the non-loop label '{name}'"),
                    ));
                }
                None => {
                    return Err(self.error(ErrorKind::Semantic, format!("Undefined label '{name}'")));
                }
            }
            self.next();
            Some(name)
        } else {
            if !self.scopes.can_continue() {
                return Err(self.error_at(
                    ErrorKind::Semantic,
                    "'continue' is only valid inside a loop statement",
                    &location,
                ));
            }
            None
        };
        self.consume_semicolon()?;
        Ok(self.builder.create_continue(self.span_from(start), label))
    }

    fn parse_break_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        let location = self.token.location;
        self.next();
        let label = if !self.can_insert_semicolon() && self.at(TokenKind::Identifier) {
            let name = self.token_text();
            if self.scopes.find_label(&name).is_none() {
                return Err(self.error(ErrorKind::Semantic, format!("Undefined label '{name}'")));
            }
            self.next();
            Some(name)
        } else {
            if !self.scopes.can_break() {
                return Err(self.error_at(
                    ErrorKind::Semantic,
                    "'break' is only valid inside a switch or loop statement",
                    &location,
                ));
            }
            None
        };
        self.consume_semicolon()?;
        Ok(self.builder.create_break(self.span_from(start), label))
    }

    fn parse_return_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        if !self.scopes.current_function().is_some_and(ParserScope::is_function) {
            return Err(self.error(
                ErrorKind::Syntax,
                "Return statements are only valid inside functions",
            ));
        }
        self.next();
        let argument = if self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(self.builder.create_return(self.span_from(start), argument))
    }

    fn parse_throw_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        self.next();
        if self.scanner.has_line_terminator() {
            return Err(self.error(ErrorKind::Syntax, "Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.builder.create_throw(self.span_from(start), argument))
    }

    fn parse_with_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        if self.strict() {
            return Err(self.error(
                ErrorKind::StrictMode,
                "'with' statements are not valid in strict mode",
            ));
        }
        self.next();
        self.expect(TokenKind::LeftParen)?;
        let object = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        self.scopes.set_needs_full_activation();
        let body = self.parse_statement()?;
        Ok(self.builder.create_with(self.span_from(start), object, body))
    }

    fn parse_switch_statement(&mut self) -> ParseResult<B::Statement> {
        use TokenKind::*;
        let start = self.start();
        self.next();
        self.expect(LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(RightParen)?;
        self.expect(LeftBrace)?;
        self.scopes.push_lexical_scope();
        self.scopes.begin_switch();

        let mut cases = Vec::new();
        let mut has_default = false;
        while !self.at(RightBrace) {
            let clause_start = self.start();
            let test = match self.kind() {
                Case => {
                    self.next();
                    Some(self.parse_expression()?)
                }
                Default => {
                    if has_default {
                        return Err(self.error(
                            ErrorKind::Syntax,
                            "More than one default clause in switch statement",
                        ));
                    }
                    has_default = true;
                    self.next();
                    None
                }
                _ => return Err(self.unexpected()),
            };
            self.expect(Colon)?;
            let mut body = Vec::new();
            while !matches!(self.kind(), Case | Default | RightBrace) {
                if self.at(Eof) {
                    return Err(self.unexpected());
                }
                body.push(self.parse_statement_list_item()?);
            }
            cases.push(SwitchClause {
                span: self.span_from(clause_start),
                test,
                body,
            });
        }

        self.scopes.end_switch();
        self.expect(RightBrace)?;
        let scope = self.finish_block_scope();
        Ok(self
            .builder
            .create_switch(self.span_from(start), discriminant, cases, scope))
    }

    fn parse_try_statement(&mut self) -> ParseResult<B::Statement> {
        use TokenKind::*;
        let start = self.start();
        self.next();
        let block = self.parse_block_statement()?;

        let handler = if self.at(Catch) {
            let catch_start = self.start();
            self.next();
            self.expect(LeftParen)?;
            self.scopes.push_lexical_scope();
            let param = match self.kind() {
                _ if self.at_binding_identifier() => {
                    self.parse_binding_identifier(DestructuringKind::CatchParameters)?
                }
                LeftBracket | LeftBrace => self.parse_binding_pattern(DestructuringKind::CatchParameters)?,
                _ => return Err(self.unexpected()),
            };
            self.expect(RightParen)?;
            // The handler body shares the catch scope, so `catch (e) { let e }`
            // is a redeclaration.
            let body_start = self.start();
            self.expect(LeftBrace)?;
            let body = self.parse_block_body()?;
            self.expect(RightBrace)?;
            let scope = self.finish_block_scope();
            let body = self.builder.create_block(self.span_from(body_start), body, scope);
            Some(CatchClause {
                span: self.span_from(catch_start),
                param,
                body,
            })
        } else {
            None
        };

        let finalizer = if self.consume(Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error(ErrorKind::Syntax, "Missing catch or finally after try"));
        }
        Ok(self
            .builder
            .create_try(self.span_from(start), block, handler, finalizer))
    }

    fn parse_labeled_statement(&mut self) -> ParseResult<B::Statement> {
        let start = self.start();
        let label = self.token_text();
        if self.scopes.find_label(&label).is_some() {
            return Err(self.error(
                ErrorKind::Semantic,
                format!("Label '{label}' has already been declared"),
            ));
        }
        self.next();
        self.expect(TokenKind::Colon)?;
        let is_loop = self.labels_loop();
        self.scopes.push_label(&label, is_loop);
        let body = self.parse_statement();
        self.scopes.pop_label();
        let body = body?;
        Ok(self.builder.create_labeled(self.span_from(start), label, body))
    }

    /// Whether the statement at the current token, after any further
    /// `label:` prefixes, is a loop.
    fn labels_loop(&mut self) -> bool {
        let point = self.save_point();
        while self.at(TokenKind::Identifier) && self.peek_kind() == TokenKind::Colon {
            self.next();
            self.next();
        }
        let is_loop = matches!(self.kind(), TokenKind::For | TokenKind::While | TokenKind::Do);
        self.rewind(point);
        is_loop
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ParseError};
    use crate::parser::ast::{ForInOfLeft, ForInit, FunctionBody, Pat, Program, Stmt, VarKind};
    use crate::parser::parse_program;
    use crate::source::SourceText;

    fn parse_ok(src: &str) -> Program {
        match parse_program(&SourceText::new(src)) {
            Ok(program) => program,
            Err(error) => panic!("{src:?} failed: {error}"),
        }
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_program(&SourceText::new(src)) {
            Ok(_) => panic!("{src:?} should not parse"),
            Err(error) => error,
        }
    }

    // ── Declarations and scoping ─────────────────────────────────────────────

    #[test]
    fn test_var_hoists_out_of_blocks() {
        let program = parse_ok("{ { var x = 1; } }");
        assert!(program.scope.declared_variables.find("x").unwrap().is_var());
        let Stmt::Block(outer) = &program.body[0] else {
            panic!("expected a block");
        };
        assert!(outer.scope.is_empty());
    }

    #[test]
    fn test_let_is_block_scoped() {
        let program = parse_ok("{ let x = 1; } x;");
        assert!(!program.scope.declared_variables.contains("x"));
        assert!(!program.scope.lexical_variables.contains("x"));
        assert_eq!(program.scope.free_variables, vec!["x".to_string()]);
        let Stmt::Block(block) = &program.body[0] else {
            panic!("expected a block");
        };
        assert!(block.scope.find("x").unwrap().is_let());
    }

    #[test]
    fn test_duplicate_let_is_an_error_but_var_is_not() {
        parse_ok("var a; var a;");
        let error = parse_err("let a; let a;");
        assert_eq!(error.kind, ErrorKind::Semantic);
        assert_eq!(error.column, 12);
        assert_eq!(parse_err("var b; let b;").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("let c; { var c; }").kind, ErrorKind::Semantic);
        parse_ok("let d; { let d; }");
        assert_eq!(parse_err("{ var x; let x; }").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("{ let x; var x; }").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("function f() { { { var y; } let y; } }").kind, ErrorKind::Semantic);
        parse_ok("{ var z; } { let z; }");
        parse_ok("try {} catch (e) { var e; }");
    }

    #[test]
    fn test_const_requires_initializer() {
        let error = parse_err("const c;");
        assert_eq!(error.message, "Missing initializer in const declaration");
        let error = parse_err("var [a];");
        assert_eq!(error.message, "Missing initializer in destructuring declaration");
        let program = parse_ok("const k = 1, j = 2;");
        let Stmt::VarDecl(decl) = &program.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.kind, VarKind::Const);
        assert_eq!(decl.declarations.len(), 2);
        assert!(program.scope.lexical_variables.find("k").unwrap().is_const());
    }

    #[test]
    fn test_sloppy_let_as_identifier() {
        let program = parse_ok("let = 1; let\nfoo;");
        assert!(matches!(&program.body[0], Stmt::Expr(_)));
        assert!(program.scope.lexical_variables.contains("foo"));
        assert_eq!(parse_err("'use strict'; let = 1;").kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_lexical_declaration_in_single_statement_context() {
        let error = parse_err("if (x) const y = 1;");
        assert_eq!(
            error.message,
            "Lexical declaration cannot appear in a single-statement context"
        );
    }

    #[test]
    fn test_function_declarations_hoist_as_var_in_sloppy_blocks() {
        let program = parse_ok("{ function f() {} }");
        assert!(program.scope.declared_variables.contains("f"));

        let program = parse_ok("'use strict'; { function g() {} }");
        assert!(!program.scope.declared_variables.contains("g"));
        let Stmt::Block(block) = &program.body[1] else {
            panic!("expected a block");
        };
        assert!(block.scope.contains("g"));
    }

    // ── Directives ───────────────────────────────────────────────────────────

    #[test]
    fn test_use_strict_directive() {
        let program = parse_ok("'use strict'; var x;");
        assert!(program.strict);
        assert!(program.scope.strict_mode);

        // Escapes or a non-leading position do not count.
        assert!(!parse_ok("'use\\x20strict'; var x;").strict);
        assert!(!parse_ok("var x; 'use strict';").strict);
        assert!(!parse_ok("('use strict');").strict);
        assert!(parse_ok("'a'; \"use strict\";").strict);
    }

    #[test]
    fn test_directive_reparse_applies_strict_lexing() {
        let error = parse_err("'use strict'; var x = 010;");
        assert_eq!(error.kind, ErrorKind::Lexer);
        parse_ok("var x = 010;");
    }

    #[test]
    fn test_earlier_directives_are_relexed_as_strict() {
        let error = parse_err("function f(){ '\\07'; 'use strict'; }");
        assert_eq!(error.kind, ErrorKind::Lexer);
        assert_eq!(parse_err("'\\07'; 'use strict';").kind, ErrorKind::Lexer);
        parse_ok("function f(){ '\\07'; 'no strict'; }");

        let program = parse_ok("'a'; 'use strict'; var x;");
        assert!(program.strict);
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_strict_mode_is_retroactive_for_parameters() {
        let error = parse_err("function f(eval) { 'use strict'; }");
        assert_eq!(error.kind, ErrorKind::StrictMode);
        assert_eq!(error.message, "Invalid parameters or function name in strict mode");
        assert_eq!(error.column, 20);

        assert_eq!(parse_err("function eval() { 'use strict'; }").kind, ErrorKind::StrictMode);
        assert_eq!(parse_err("function f(a, a) { 'use strict'; }").kind, ErrorKind::StrictMode);
        assert_eq!(parse_err("function f(yield) { 'use strict'; }").kind, ErrorKind::StrictMode);
        parse_ok("function f(eval) { }");
        parse_ok("function f(a, a) { }");
    }

    #[test]
    fn test_use_strict_rejected_with_non_simple_parameters() {
        let error = parse_err("function f(a = 1) { 'use strict'; }");
        assert_eq!(error.kind, ErrorKind::Syntax);
        parse_ok("'use strict'; function f(a = 1) { }");
    }

    #[test]
    fn test_strict_function_does_not_leak_strictness() {
        let program = parse_ok("function f() { 'use strict'; } with (o) {} var n = 010;");
        assert!(!program.strict);
        let Stmt::FunctionDecl(function) = &program.body[0] else {
            panic!("expected a function");
        };
        assert!(function.scope.strict_mode);
        let FunctionBody::Block(body) = &function.body else {
            panic!("expected a block body");
        };
        assert_eq!(body.len(), 1);
    }

    // ── Control flow ─────────────────────────────────────────────────────────

    #[test]
    fn test_for_variants() {
        let program = parse_ok(
            "for (var i = 0; i < n; i++) {}\n\
             for (let k in o) {}\n\
             for (const v of list) {}\n\
             for (x.y in o) {}\n\
             for ([a, b] of pairs) {}\n\
             for (;;) break;",
        );
        assert!(matches!(&program.body[0], Stmt::For(f) if matches!(f.init, Some(ForInit::VarDecl(_)))));
        let Stmt::ForIn(for_in) = &program.body[1] else {
            panic!("expected for-in");
        };
        assert!(for_in.scope.find("k").unwrap().is_let());
        assert!(matches!(&program.body[2], Stmt::ForOf(_)));
        assert!(matches!(&program.body[3], Stmt::ForIn(f) if matches!(f.left, ForInOfLeft::Target(_))));
        let Stmt::ForOf(for_of) = &program.body[4] else {
            panic!("expected for-of");
        };
        assert!(matches!(&for_of.left, ForInOfLeft::Pattern(Pat::Array(_))));
        assert_eq!(program.scope.written_variables, vec!["a", "b", "i"]);
    }

    #[test]
    fn test_for_head_errors() {
        assert_eq!(
            parse_err("for (let a, b of c) {}").message,
            "Only a single variable may be declared in a for-of loop"
        );
        assert_eq!(
            parse_err("for (var a = 1 in o) {}").message,
            "for-in loop variable declaration may not have an initializer"
        );
        assert_eq!(parse_err("for (f() in o) {}").message, "Invalid left-hand side in for-in loop");
        assert_eq!(
            parse_err("for (const c; ;) {}").message,
            "Missing initializer in for loop declaration"
        );
    }

    #[test]
    fn test_in_operator_inside_for_init_parentheses() {
        parse_ok("for (var x = ('a' in o); x; ) {}");
        parse_ok("for (var y = [a in o]; y; ) {}");
    }

    #[test]
    fn test_break_and_continue_targets() {
        parse_ok("outer: for (;;) { inner: while (1) { continue outer; } break outer; }");
        parse_ok("switch (x) { case 1: break; default: }");
        parse_ok("block: { break block; }");

        let error = parse_err("break;");
        assert_eq!(error.kind, ErrorKind::Semantic);
        assert_eq!(parse_err("switch (x) { case 1: continue; }").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("a: { continue a; }").message, "Cannot continue to the non-loop label 'a'");
        assert_eq!(parse_err("while (1) break nope;").message, "Undefined label 'nope'");
        assert_eq!(parse_err("l: l: ;").message, "Label 'l' has already been declared");
        parse_ok("a: b: while (1) { continue a; }");
        parse_ok("a: b: c: for (;;) { continue b; }");
        assert_eq!(parse_err("a: b: { continue a; }").message, "Cannot continue to the non-loop label 'a'");
        assert_eq!(parse_err("l: for (;;) { (function () { break l; }); }").kind, ErrorKind::Semantic);
    }

    #[test]
    fn test_break_label_on_next_line_is_not_an_operand() {
        let program = parse_ok("foo: while (1) { break\nfoo; }");
        let Stmt::Labeled(labeled) = &program.body[0] else {
            panic!("expected a labeled statement");
        };
        let Stmt::While(while_stmt) = &*labeled.body else {
            panic!("expected a while loop");
        };
        let Stmt::Block(body) = &*while_stmt.body else {
            panic!("expected a block");
        };
        assert!(matches!(&body.body[0], Stmt::Break(b) if b.label.is_none()));
        assert_eq!(body.body.len(), 2);
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            parse_err("return 1;").message,
            "Return statements are only valid inside functions"
        );
    }

    #[test]
    fn test_throw_requires_operand_on_same_line() {
        parse_ok("function f() { throw new Error('x') }");
        assert_eq!(parse_err("throw\nx;").message, "Illegal newline after throw");
    }

    #[test]
    fn test_switch_cases_and_lexical_scope() {
        let program = parse_ok("switch (x) { case 1: let y = 1; break; default: y; }");
        let Stmt::Switch(switch) = &program.body[0] else {
            panic!("expected a switch");
        };
        assert_eq!(switch.cases.len(), 2);
        assert!(switch.cases[1].test.is_none());
        assert!(switch.scope.contains("y"));
        assert_eq!(
            parse_err("switch (x) { default: default: }").message,
            "More than one default clause in switch statement"
        );
    }

    #[test]
    fn test_try_catch_finally() {
        let program = parse_ok("try { a(); } catch (e) { var e = 2; } finally { b(); }");
        let Stmt::Try(try_stmt) = &program.body[0] else {
            panic!("expected a try statement");
        };
        assert!(try_stmt.handler.is_some());
        assert!(try_stmt.finalizer.is_some());
        assert!(program.scope.declared_variables.contains("e"));

        parse_ok("try {} catch ({message, code}) {}");
        assert_eq!(parse_err("try {} catch (e) { let e; }").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("try {}").message, "Missing catch or finally after try");
        assert_eq!(parse_err("'use strict'; try {} catch (eval) {}").kind, ErrorKind::StrictMode);
    }

    #[test]
    fn test_with_forces_full_activation() {
        let program = parse_ok("function f(o) { var a; with (o) { a; } }");
        let Stmt::FunctionDecl(function) = &program.body[0] else {
            panic!("expected a function");
        };
        assert!(function.scope.needs_full_activation);
        assert!(function.scope.is_captured("a"));
        assert!(!program.scope.needs_full_activation);
    }

    #[test]
    fn test_do_while_semicolon_is_optional() {
        let program = parse_ok("do x++; while (x < 3) y()");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Stmt::DoWhile(_)));
    }

    #[test]
    fn test_misc_statements() {
        let program = parse_ok(";debugger;if (a) b; else c;");
        assert!(matches!(&program.body[0], Stmt::Empty(_)));
        assert!(matches!(&program.body[1], Stmt::Debugger(_)));
        assert!(matches!(&program.body[2], Stmt::If(i) if i.alternate.is_some()));
    }

    #[test]
    fn test_strict_function_in_statement_position() {
        parse_ok("if (a) function f() {}");
        assert_eq!(parse_err("'use strict'; if (a) function f() {}").kind, ErrorKind::StrictMode);
    }

    #[test]
    fn test_unsupported_constructs() {
        assert_eq!(parse_err("class A {}").message, "Classes are not supported");
        assert_eq!(parse_err("export var a;").message, "Modules are not supported");
    }
}
