//! Expression parsing: assignment and arrow detection, precedence climbing
//! for binary operators, unary/postfix operators, member and call chains,
//! and primary expressions including object literals.

use std::collections::HashMap;

use log::trace;
use smallvec::SmallVec;

use crate::error::{ErrorKind, ParseResult};

use super::Parser;
use super::builder::{AssignOp, AstBuilder, BinaryOp, PropertyKey, PropertyKind, UnaryOp, UpdateOp};
use super::functions::FunctionHeader;
use super::options::{ConstructorKind, FunctionParseType, SourceParseMode};
use super::patterns::DestructuringKind;
use super::scope::ParserScope;
use super::token::{Position, Span, TokenKind, TokenLocation, TokenValue};

/// `true` when a `/` after `kind` divides; otherwise it starts a regular
/// expression.
fn ends_operand(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Identifier
            | Reserved
            | ReservedStrict
            | String
            | Number
            | RegExp
            | This
            | Null
            | True
            | False
            | Super
            | RightParen
            | RightBracket
            | RightBrace
    )
}

/// Data and accessor definitions seen for one literal property name.
#[derive(Debug, Clone, Copy, Default)]
struct SeenProperty {
    data: bool,
    getter: bool,
    setter: bool,
}

impl<'src, B: AstBuilder> Parser<'src, B> {
    // ── Comma and assignment ────────────────────────────────────────────────

    /// `Expression`: one or more assignment expressions separated by `,`.
    pub(super) fn parse_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let first = self.parse_assignment_expression()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.consume(TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(self.builder.create_sequence(self.span_from(start), expressions))
    }

    pub(super) fn parse_assignment_expression(&mut self) -> ParseResult<B::Expression> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        if self.is_arrow_function_start() {
            return self.parse_arrow_function(start);
        }
        if matches!(self.kind(), TokenKind::LeftBracket | TokenKind::LeftBrace)
            && self.bracketed_is_followed_by(|p| p.at(TokenKind::Equal))
        {
            let point = self.save_point();
            if let Ok(Some(pattern)) = self.parse_destructuring_pattern(DestructuringKind::Expressions)
                && self.at(TokenKind::Equal)
            {
                self.commit_pending_writes(point)?;
                self.next();
                let value = self.parse_assignment_expression()?;
                return Ok(self
                    .builder
                    .create_destructuring_assignment(self.span_from(start), pattern, value));
            }
            self.restore(point);
        }

        let location = self.token.location;
        let target = self.parse_conditional_expression()?;
        let Some(op) = AssignOp::from_token(self.kind()) else {
            return Ok(target);
        };
        if !self.builder.is_location(&target) {
            return Err(self.error_at(ErrorKind::Syntax, "Invalid left-hand side in assignment", &location));
        }
        self.note_assignment(&target, &location)?;
        self.next();
        let value = self.parse_assignment_expression()?;
        Ok(self.builder.create_assignment(self.span_from(start), op, target, value))
    }

    /// `x =>` or a parenthesized group followed by `=>` on the same line.
    fn is_arrow_function_start(&mut self) -> bool {
        match self.kind() {
            TokenKind::Identifier => {
                let point = self.save_point();
                self.next();
                let is_arrow = self.at(TokenKind::Arrow) && !self.scanner.has_line_terminator();
                self.rewind(point);
                is_arrow
            }
            TokenKind::LeftParen => {
                self.bracketed_is_followed_by(|p| p.at(TokenKind::Arrow) && !p.scanner.has_line_terminator())
            }
            _ => false,
        }
    }

    /// With the current token an opening `(`, `[` or `{`, skip to the
    /// matching closer and test the token after it.  Nothing is parsed or
    /// recorded; the parser is left where it started.
    pub(super) fn bracketed_is_followed_by(&mut self, accept: impl Fn(&Self) -> bool) -> bool {
        use TokenKind::*;
        let point = self.save_point();
        let mut depth = 0usize;
        let mut previous = Eof;
        let result = loop {
            match self.kind() {
                LeftParen | LeftBracket | LeftBrace => depth += 1,
                RightParen | RightBracket | RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next();
                        break accept(self);
                    }
                }
                Slash | SlashEqual if !ends_operand(previous) => {
                    let prefix = if self.at(SlashEqual) { "=" } else { "" };
                    if self.scanner.scan_regex(&mut self.token, prefix).is_error() {
                        break false;
                    }
                }
                Eof | BackQuote => break false,
                kind if kind.is_error() => break false,
                _ => {}
            }
            previous = self.kind();
            self.next();
        };
        self.rewind(point);
        result
    }

    // ── Conditional and binary ──────────────────────────────────────────────

    fn parse_conditional_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let test = self.parse_binary_expression()?;
        if !self.consume(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.with_allows_in(true, |p| p.parse_assignment_expression())?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(self
            .builder
            .create_conditional(self.span_from(start), test, consequent, alternate))
    }

    /// Operator-precedence climbing over explicit operand and operator
    /// stacks.
    fn parse_binary_expression(&mut self) -> ParseResult<B::Expression> {
        let mut operands: SmallVec<[(B::Expression, Span); 8]> = SmallVec::new();
        let mut operators: SmallVec<[(BinaryOp, u8); 8]> = SmallVec::new();

        let start = self.start();
        let first = self.parse_unary_expression()?;
        operands.push((first, self.span_from(start)));
        loop {
            let precedence = self.kind().precedence(self.state.allows_in);
            if precedence == 0 {
                break;
            }
            let Some(op) = BinaryOp::from_token(self.kind()) else {
                break;
            };
            self.next();
            while operators.last().is_some_and(|&(_, top)| top >= precedence) {
                self.reduce_binary(&mut operands, &mut operators);
            }
            operators.push((op, precedence));
            let operand_start = self.start();
            let operand = self.parse_unary_expression()?;
            operands.push((operand, self.span_from(operand_start)));
        }
        while !operators.is_empty() {
            self.reduce_binary(&mut operands, &mut operators);
        }
        match operands.pop() {
            Some((expr, _)) => Ok(expr),
            None => Err(self.unexpected()),
        }
    }

    fn reduce_binary(
        &mut self,
        operands: &mut SmallVec<[(B::Expression, Span); 8]>,
        operators: &mut SmallVec<[(BinaryOp, u8); 8]>,
    ) {
        let (Some((op, _)), Some((right, right_span)), Some((left, left_span))) =
            (operators.pop(), operands.pop(), operands.pop())
        else {
            return;
        };
        let span = Span::new(left_span.start, right_span.end);
        operands.push((self.builder.create_binary(span, op, left, right), span));
    }

    // ── Unary and postfix ───────────────────────────────────────────────────

    fn parse_unary_expression(&mut self) -> ParseResult<B::Expression> {
        let mut prefixes: SmallVec<[(TokenKind, Position, TokenLocation); 4]> = SmallVec::new();
        while self.kind().is_unary() {
            prefixes.push((self.kind(), self.start(), self.token.location));
            self.next();
        }
        let operand_location = self.token.location;
        let mut expr = self.parse_postfix_expression()?;
        while let Some((kind, start, location)) = prefixes.pop() {
            let span = self.span_from(start);
            expr = if let Some(op) = UpdateOp::from_token(kind) {
                if !self.builder.is_location(&expr) {
                    return Err(self.error_at(
                        ErrorKind::Syntax,
                        "Invalid left-hand side expression in prefix operation",
                        &operand_location,
                    ));
                }
                self.note_assignment(&expr, &operand_location)?;
                self.builder.create_update(span, op, true, expr)
            } else {
                let Some(op) = UnaryOp::from_token(kind) else {
                    return Err(self.error_at(ErrorKind::Syntax, "Unexpected token", &location));
                };
                if op == UnaryOp::Delete && self.strict() && self.builder.is_resolve(&expr) {
                    return Err(self.error_at(
                        ErrorKind::StrictMode,
                        "Delete of an unqualified identifier in strict mode",
                        &location,
                    ));
                }
                self.builder.create_unary(span, op, expr)
            };
        }
        Ok(expr)
    }

    fn parse_postfix_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let location = self.token.location;
        let expr = self.parse_lhs_expression()?;
        let Some(op) = UpdateOp::from_token(self.kind()) else {
            return Ok(expr);
        };
        if self.scanner.has_line_terminator() {
            return Ok(expr);
        }
        if !self.builder.is_location(&expr) {
            return Err(self.error_at(
                ErrorKind::Syntax,
                "Invalid left-hand side expression in postfix operation",
                &location,
            ));
        }
        self.note_assignment(&expr, &location)?;
        self.next();
        Ok(self.builder.create_update(self.span_from(start), op, false, expr))
    }

    // ── Member, call and new ────────────────────────────────────────────────

    /// `new`-prefixed member and call chains.  Each `new` takes the first
    /// argument list that follows its callee; unmatched ones get none.
    pub(super) fn parse_lhs_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let mut news: SmallVec<[Position; 4]> = SmallVec::new();
        let mut new_target = None;
        while self.at(TokenKind::New) {
            let new_start = self.start();
            let new_location = self.token.location;
            self.next();
            if self.consume(TokenKind::Dot) {
                if !self.at_contextual("target") {
                    return Err(self.unexpected());
                }
                let allowed = self
                    .scopes
                    .closest_non_arrow_function()
                    .is_some_and(ParserScope::is_function);
                if !allowed {
                    return Err(self.error_at(
                        ErrorKind::Semantic,
                        "new.target expression is not allowed here",
                        &new_location,
                    ));
                }
                self.next();
                new_target = Some(self.builder.create_new_target(self.span_from(new_start)));
                break;
            }
            news.push(new_start);
        }

        let callee_start = self.start();
        let mut expr = match new_target {
            Some(expr) => expr,
            None if self.at(TokenKind::Super) => self.parse_super_expression()?,
            None => self.parse_primary_expression()?,
        };
        loop {
            let expr_start = if news.is_empty() { start } else { callee_start };
            match self.kind() {
                TokenKind::Dot => {
                    self.next();
                    if !self.kind().is_identifier_name() {
                        return Err(self.unexpected());
                    }
                    let name = self.identifier_name();
                    self.next();
                    expr = self.builder.create_member(self.span_from(expr_start), expr, name);
                }
                TokenKind::LeftBracket => {
                    self.next();
                    let index = self.with_allows_in(true, |p| p.parse_expression())?;
                    self.expect(TokenKind::RightBracket)?;
                    expr = self
                        .builder
                        .create_computed_member(self.span_from(expr_start), expr, index);
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = match news.pop() {
                        Some(new_start) => self
                            .builder
                            .create_new(self.span_from(new_start), expr, Some(arguments)),
                        None => self.builder.create_call(self.span_from(start), expr, arguments),
                    };
                }
                TokenKind::BackQuote => return Err(self.unsupported("Template literals")),
                _ => break,
            }
        }
        while let Some(new_start) = news.pop() {
            expr = self.builder.create_new(self.span_from(new_start), expr, None);
        }
        Ok(expr)
    }

    /// `super(...)`, `super.x` or `super[x]`, checked against the nearest
    /// non-arrow function.
    fn parse_super_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let location = self.token.location;
        self.next();
        match self.kind() {
            TokenKind::LeftParen => {
                let allowed = self
                    .scopes
                    .closest_non_arrow_function()
                    .is_some_and(|scope| scope.constructor_kind() == ConstructorKind::Derived);
                if !allowed {
                    return Err(self.error_at(
                        ErrorKind::Semantic,
                        "super() is only valid inside a derived class constructor",
                        &location,
                    ));
                }
                if let Some(scope) = self.scopes.closest_non_arrow_function_mut() {
                    scope.set_has_direct_super();
                }
            }
            TokenKind::Dot | TokenKind::LeftBracket => {
                let allowed = self.scopes.closest_non_arrow_function().is_some_and(|scope| {
                    scope.mode().is_method_like() || scope.constructor_kind() != ConstructorKind::None
                });
                if !allowed {
                    return Err(self.error_at(
                        ErrorKind::Semantic,
                        "'super' property access is only valid inside methods",
                        &location,
                    ));
                }
                if let Some(scope) = self.scopes.closest_non_arrow_function_mut() {
                    scope.set_needs_super_binding();
                }
            }
            _ => {
                return Err(self.error_at(ErrorKind::Syntax, "'super' keyword unexpected here", &location));
            }
        }
        Ok(self.builder.create_super(self.span_from(start)))
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<B::Expression>> {
        self.expect(TokenKind::LeftParen)?;
        let arguments = self.with_allows_in(true, |p| {
            let mut arguments = Vec::new();
            while !p.at(TokenKind::RightParen) {
                arguments.push(p.parse_spread_or_assignment()?);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            Ok(arguments)
        })?;
        self.expect(TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_spread_or_assignment(&mut self) -> ParseResult<B::Expression> {
        if !self.at(TokenKind::DotDotDot) {
            return self.parse_assignment_expression();
        }
        let start = self.start();
        self.next();
        let argument = self.parse_assignment_expression()?;
        Ok(self.builder.create_spread(self.span_from(start), argument))
    }

    // ── Primary expressions ─────────────────────────────────────────────────

    fn parse_primary_expression(&mut self) -> ParseResult<B::Expression> {
        use TokenKind::*;
        let start = self.start();
        match self.kind() {
            Function => self.parse_function_expression(),
            LeftParen => {
                self.next();
                let expr = self.with_allows_in(true, |p| p.parse_expression())?;
                self.expect(RightParen)?;
                Ok(expr)
            }
            LeftBracket => self.parse_array_literal(),
            LeftBrace => self.parse_object_literal(),
            This => {
                self.next();
                Ok(self.builder.create_this(self.span_from(start)))
            }
            Null => {
                self.next();
                Ok(self.builder.create_null(self.span_from(start)))
            }
            True | False => {
                let value = self.at(True);
                self.next();
                Ok(self.builder.create_boolean(self.span_from(start), value))
            }
            Number => {
                let value = match self.token.value {
                    TokenValue::Number(value) => value,
                    _ => 0.0,
                };
                self.next();
                Ok(self.builder.create_number(self.span_from(start), value))
            }
            String => {
                let value = self.token_text();
                self.next();
                Ok(self.builder.create_string(self.span_from(start), value))
            }
            Identifier => {
                let name = self.token_text();
                self.next();
                self.scopes.use_variable(&name);
                Ok(self.builder.create_resolve(self.span_from(start), &name))
            }
            Let if !self.strict() => {
                self.next();
                self.scopes.use_variable("let");
                Ok(self.builder.create_resolve(self.span_from(start), "let"))
            }
            Slash | SlashEqual => self.parse_regexp_literal(),
            Class => Err(self.unsupported("Classes")),
            BackQuote => Err(self.unsupported("Template literals")),
            Import => Err(self.unsupported("Modules")),
            _ => Err(self.unexpected()),
        }
    }

    /// Re-scan the current `/` or `/=` as a regular expression literal.
    fn parse_regexp_literal(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        let prefix = if self.at(TokenKind::SlashEqual) { "=" } else { "" };
        if self.scanner.scan_regex(&mut self.token, prefix).is_error() {
            return Err(self.unexpected());
        }
        let (pattern, flags) = match &self.token.value {
            TokenValue::RegExp { pattern, flags } => (pattern.clone(), flags.clone()),
            _ => Default::default(),
        };
        self.next();
        Ok(self.builder.create_regexp(self.span_from(start), pattern, flags))
    }

    fn parse_array_literal(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        self.next();
        let elements = self.with_allows_in(true, |p| {
            let mut elements = Vec::new();
            loop {
                match p.kind() {
                    TokenKind::RightBracket => break,
                    TokenKind::Comma => {
                        p.next();
                        elements.push(None);
                        continue;
                    }
                    _ => elements.push(Some(p.parse_spread_or_assignment()?)),
                }
                if p.at(TokenKind::RightBracket) {
                    break;
                }
                p.expect(TokenKind::Comma)?;
            }
            Ok(elements)
        })?;
        self.expect(TokenKind::RightBracket)?;
        Ok(self.builder.create_array(self.span_from(start), elements))
    }

    fn parse_function_expression(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        self.next();
        let name = if self.at(TokenKind::Identifier) {
            let name = self.token_text();
            self.next();
            Some(name)
        } else {
            None
        };
        let header = FunctionHeader {
            binds_own_name: name.is_some(),
            name,
            mode: SourceParseMode::NormalFunction,
            parse_type: FunctionParseType::Normal,
            constructor_kind: ConstructorKind::None,
        };
        let parts = self.parse_function_rest(start, header)?;
        Ok(self.builder.create_function_expression(parts))
    }

    // ── Object literals ─────────────────────────────────────────────────────

    fn parse_object_literal(&mut self) -> ParseResult<B::Expression> {
        let start = self.start();
        self.next();
        let properties = self.with_allows_in(true, |p| p.parse_object_properties())?;
        self.expect(TokenKind::RightBrace)?;
        Ok(self.builder.create_object(self.span_from(start), properties))
    }

    /// Properties are parsed in a fast mode that only remembers data names;
    /// the first accessor switches to a checking mode seeded from them.
    fn parse_object_properties(&mut self) -> ParseResult<Vec<B::Property>> {
        let mut properties = Vec::new();
        let mut data_names: Vec<String> = Vec::new();
        let mut seen: Option<HashMap<String, SeenProperty>> = None;
        let mut has_proto = false;
        while !self.at(TokenKind::RightBrace) {
            let property_start = self.start();
            let location = self.token.location;

            if self.consume(TokenKind::DotDotDot) {
                let argument = self.parse_assignment_expression()?;
                properties.push(
                    self.builder
                        .create_spread_property(self.span_from(property_start), argument),
                );
            } else if let Some(is_getter) = self.accessor_prefix() {
                if seen.is_none() {
                    trace!(
                        "object literal accessor at offset {}, checking duplicates",
                        location.begin
                    );
                }
                let seen = seen.get_or_insert_with(|| {
                    data_names
                        .drain(..)
                        .map(|name| (name, SeenProperty { data: true, ..SeenProperty::default() }))
                        .collect()
                });
                self.next();
                let key = self.parse_property_key()?;
                let (mode, kind) = if is_getter {
                    (SourceParseMode::Getter, PropertyKind::Getter)
                } else {
                    (SourceParseMode::Setter, PropertyKind::Setter)
                };
                if let Some(name) = key.literal_name() {
                    let entry = seen.entry(name.clone()).or_default();
                    let clash = if is_getter { entry.getter } else { entry.setter };
                    if entry.data {
                        return Err(self.error_at(
                            ErrorKind::Syntax,
                            format!("Object literal may not have data and accessor property with the same name '{name}'"),
                            &location,
                        ));
                    }
                    if clash {
                        return Err(self.error_at(
                            ErrorKind::Syntax,
                            format!("Object literal may not have multiple get/set accessors with the same name '{name}'"),
                            &location,
                        ));
                    }
                    if is_getter {
                        entry.getter = true;
                    } else {
                        entry.setter = true;
                    }
                }
                let function = self.parse_method(property_start, key.literal_name(), mode)?;
                properties.push(
                    self.builder
                        .create_property(self.span_from(property_start), key, kind, function),
                );
            } else {
                let is_plain_name = self.at(TokenKind::Identifier);
                let key = self.parse_property_key()?;
                let name = key.literal_name();
                let (kind, value) = match self.kind() {
                    TokenKind::Colon => {
                        self.next();
                        let value = self.parse_assignment_expression()?;
                        if matches!(key, PropertyKey::Identifier(_) | PropertyKey::String(_))
                            && name.as_deref() == Some("__proto__")
                        {
                            if has_proto {
                                return Err(self.error_at(
                                    ErrorKind::Syntax,
                                    "Duplicate __proto__ fields are not allowed in object literals",
                                    &location,
                                ));
                            }
                            has_proto = true;
                        }
                        (PropertyKind::Value, value)
                    }
                    TokenKind::LeftParen => {
                        let method = self.parse_method(property_start, name.clone(), SourceParseMode::Method)?;
                        (PropertyKind::Method, method)
                    }
                    TokenKind::Equal if is_plain_name => {
                        return Err(self.error(ErrorKind::Syntax, "Invalid shorthand property initializer"));
                    }
                    TokenKind::Comma | TokenKind::RightBrace if is_plain_name => {
                        let name = name.clone().unwrap_or_default();
                        self.scopes.use_variable(&name);
                        let value = self.builder.create_resolve(self.span_from(property_start), &name);
                        (PropertyKind::Shorthand, value)
                    }
                    _ => return Err(self.unexpected()),
                };
                match (&mut seen, name) {
                    (Some(seen), Some(name)) => {
                        let entry = seen.entry(name.clone()).or_default();
                        if entry.getter || entry.setter {
                            return Err(self.error_at(
                                ErrorKind::Syntax,
                                format!("Object literal may not have data and accessor property with the same name '{name}'"),
                                &location,
                            ));
                        }
                        entry.data = true;
                    }
                    (None, Some(name)) => data_names.push(name),
                    (_, None) => {}
                }
                properties.push(
                    self.builder
                        .create_property(self.span_from(property_start), key, kind, value),
                );
            }
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(properties)
    }

    /// `Some(true)` for `get`, `Some(false)` for `set`, when the word starts
    /// an accessor rather than naming a plain property.
    fn accessor_prefix(&mut self) -> Option<bool> {
        let is_getter = if self.at_contextual("get") {
            true
        } else if self.at_contextual("set") {
            false
        } else {
            return None;
        };
        match self.peek_kind() {
            TokenKind::Colon | TokenKind::LeftParen | TokenKind::Comma | TokenKind::RightBrace | TokenKind::Equal => None,
            _ => Some(is_getter),
        }
    }

    fn parse_property_key(&mut self) -> ParseResult<PropertyKey<B::Expression>> {
        let key = match self.kind() {
            TokenKind::String => PropertyKey::String(self.token_text()),
            TokenKind::Number => PropertyKey::Number(match self.token.value {
                TokenValue::Number(value) => value,
                _ => 0.0,
            }),
            TokenKind::LeftBracket => {
                self.next();
                let key = self.parse_assignment_expression()?;
                self.expect(TokenKind::RightBracket)?;
                return Ok(PropertyKey::Computed(key));
            }
            kind if kind.is_identifier_name() => PropertyKey::Identifier(self.identifier_name()),
            _ => return Err(self.unexpected()),
        };
        self.next();
        Ok(key)
    }

    /// Method, getter or setter body starting at the parameter list.
    fn parse_method(
        &mut self,
        start: Position,
        name: Option<String>,
        mode: SourceParseMode,
    ) -> ParseResult<B::Expression> {
        let header = FunctionHeader {
            name,
            mode,
            parse_type: FunctionParseType::Normal,
            constructor_kind: ConstructorKind::None,
            binds_own_name: false,
        };
        let parts = self.parse_function_rest(start, header)?;
        Ok(self.builder.create_function_expression(parts))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ParseError};
    use crate::parser::ast::{AssignTarget, Expr, FunctionBody, MemberProp, ObjectProp, PropKind, Stmt};
    use crate::parser::builder::{BinaryOp, UnaryOp};
    use crate::parser::{ConstructorKind, ParseOptions, Program, parse_program, parse_program_with};
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

    /// The expression of the first statement.
    fn expr(text: &str) -> Expr {
        match parse_ok(text).body.into_iter().next() {
            Some(Stmt::Expr(stmt)) => *stmt.expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_precedence_and_associativity() {
        let Expr::Binary(sum) = expr("a + b * c - d;") else {
            panic!("expected a binary expression");
        };
        assert_eq!(sum.operator, BinaryOp::Sub);
        let Expr::Binary(left) = &*sum.left else {
            panic!("expected a nested binary expression");
        };
        assert_eq!(left.operator, BinaryOp::Add);
        assert!(matches!(&*left.right, Expr::Binary(m) if m.operator == BinaryOp::Mul));

        let Expr::Binary(or) = expr("a || b && c | d;") else {
            panic!("expected a binary expression");
        };
        assert_eq!(or.operator, BinaryOp::LogicalOr);
        assert!(matches!(&*or.right, Expr::Binary(and) if and.operator == BinaryOp::LogicalAnd));
    }

    #[test]
    fn test_binary_spans_cover_both_operands() {
        let Expr::Binary(binary) = expr("  foo * bar;") else {
            panic!("expected a binary expression");
        };
        assert_eq!(binary.loc.start.column, 3);
        assert_eq!(binary.loc.end.column, 12);
    }

    #[test]
    fn test_conditional_and_assignment_are_right_associative() {
        let Expr::Assign(assign) = expr("a = b = c ? d : e ? f : g;") else {
            panic!("expected an assignment");
        };
        let Expr::Assign(inner) = &*assign.value else {
            panic!("expected a nested assignment");
        };
        let Expr::Conditional(conditional) = &*inner.value else {
            panic!("expected a conditional");
        };
        assert!(matches!(&*conditional.alternate, Expr::Conditional(_)));
        assert!(matches!(&assign.target, AssignTarget::Expr(e) if matches!(**e, Expr::Ident(_))));
    }

    #[test]
    fn test_invalid_assignment_targets() {
        assert_eq!(parse_err("a + b = c;").message, "Invalid left-hand side in assignment");
        assert_eq!(
            parse_err("++f();").message,
            "Invalid left-hand side expression in prefix operation"
        );
        assert_eq!(
            parse_err("1++;").message,
            "Invalid left-hand side expression in postfix operation"
        );
        assert_eq!(parse_err("'use strict'; eval = 1;").kind, ErrorKind::StrictMode);
        assert_eq!(parse_err("'use strict'; arguments++;").kind, ErrorKind::StrictMode);
    }

    #[test]
    fn test_postfix_operator_respects_line_terminator() {
        let program = parse_ok("a\n++b");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[1], Stmt::Expr(s) if matches!(&*s.expr, Expr::Update(u) if u.prefix)));
    }

    #[test]
    fn test_unary_chain() {
        let Expr::Unary(unary) = expr("!typeof -x;") else {
            panic!("expected a unary expression");
        };
        assert_eq!(unary.operator, UnaryOp::Not);
        assert!(matches!(&*unary.argument, Expr::Unary(t) if t.operator == UnaryOp::Typeof));
    }

    #[test]
    fn test_strict_delete_of_identifier() {
        let error = parse_err("'use strict'; delete x;");
        assert_eq!(error.kind, ErrorKind::StrictMode);
        assert_eq!(error.column, 15);
        parse_ok("'use strict'; delete x.y;");
        parse_ok("delete x;");
    }

    #[test]
    fn test_arrow_functions() {
        let Expr::Function(arrow) = expr("(a, b) => a + b;") else {
            panic!("expected an arrow function");
        };
        assert_eq!(arrow.params.len(), 2);
        assert!(matches!(arrow.body, FunctionBody::Expression(_)));

        let Expr::Function(arrow) = expr("x => { return x; };") else {
            panic!("expected an arrow function");
        };
        assert_eq!(arrow.params.len(), 1);

        assert!(matches!(expr("(a, b);"), Expr::Sequence(_)));
        assert!(matches!(expr("(a);"), Expr::Ident(_)));
        assert!(matches!(expr("({a, b}) => a;"), Expr::Function(_)));
        assert!(matches!(expr("(x = /[)]/) => x;"), Expr::Function(_)));
    }

    #[test]
    fn test_arrow_rejects_line_terminator_before_arrow() {
        assert_eq!(parse_err("(a)\n=> a;").kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_member_call_and_new_chains() {
        let Expr::Call(call) = expr("a.b[c](d, ...e);") else {
            panic!("expected a call");
        };
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(call.arguments[1], Expr::Spread(_)));
        let Expr::Member(member) = &*call.callee else {
            panic!("expected a member callee");
        };
        assert!(matches!(member.property, MemberProp::Computed(_)));

        let Expr::New(outer) = expr("new new A()();") else {
            panic!("expected new");
        };
        assert!(outer.arguments.is_some());
        assert!(matches!(&*outer.callee, Expr::New(_)));

        let Expr::Member(member) = expr("new A().b;") else {
            panic!("expected a member expression");
        };
        assert!(matches!(&*member.object, Expr::New(_)));

        let Expr::New(new) = expr("new a.b;") else {
            panic!("expected new");
        };
        assert!(new.arguments.is_none());
        assert!(matches!(&*new.callee, Expr::Member(m) if matches!(&m.property, MemberProp::Ident(id) if id.name == "b")));

        assert!(matches!(expr("a.if.class;"), Expr::Member(_)));
    }

    #[test]
    fn test_new_target() {
        parse_ok("function f() { return new.target; }");
        parse_ok("function f() { return () => new.target; }");
        let error = parse_err("new.target;");
        assert_eq!(error.kind, ErrorKind::Semantic);
        assert_eq!(error.message, "new.target expression is not allowed here");
    }

    #[test]
    fn test_super_rules() {
        assert_eq!(parse_err("super();").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("function f() { super.x; }").kind, ErrorKind::Semantic);
        assert_eq!(parse_err("x = super;").kind, ErrorKind::Syntax);

        let program = parse_ok("({ m() { return () => super.m(); } });");
        let Some(Stmt::Expr(stmt)) = program.body.first() else {
            panic!("expected an expression statement");
        };
        let Expr::Object(object) = &*stmt.expr else {
            panic!("expected an object literal");
        };
        let ObjectProp::Prop(method) = &object.properties[0] else {
            panic!("expected a property");
        };
        assert_eq!(method.kind, PropKind::Method);
        let Expr::Function(function) = &*method.value else {
            panic!("expected a function value");
        };
        assert!(function.scope.needs_super_binding);
    }

    #[test]
    fn test_super_call_in_derived_constructor() {
        let options = ParseOptions {
            constructor_kind: ConstructorKind::Derived,
            ..ParseOptions::default()
        };
        let program = parse_program_with(&SourceText::new("super(1); (() => super())();"), options).unwrap();
        assert!(program.scope.has_direct_super);
    }

    #[test]
    fn test_regexp_literals() {
        let Expr::RegExp(regexp) = expr("/ab+c/gi;") else {
            panic!("expected a regular expression");
        };
        assert_eq!(regexp.pattern, "ab+c");
        assert_eq!(regexp.flags, "gi");

        let Expr::RegExp(regexp) = expr("/=x/;") else {
            panic!("expected a regular expression");
        };
        assert_eq!(regexp.pattern, "=x");

        assert!(matches!(expr("a / b / c;"), Expr::Binary(_)));
        assert_eq!(parse_err("/abc").kind, ErrorKind::Lexer);
    }

    #[test]
    fn test_object_literal_forms() {
        let Expr::Object(object) = expr("({a: 1, b, 'c': 2, 3: 4, [k]: 5, m() {}, get g() {}, set g(v) {}, ...r});")
        else {
            panic!("expected an object literal");
        };
        assert_eq!(object.properties.len(), 9);
        let kinds: Vec<PropKind> = object
            .properties
            .iter()
            .filter_map(|p| match p {
                ObjectProp::Prop(prop) => Some(prop.kind),
                ObjectProp::Spread(_) => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                PropKind::Value,
                PropKind::Shorthand,
                PropKind::Value,
                PropKind::Value,
                PropKind::Value,
                PropKind::Method,
                PropKind::Getter,
                PropKind::Setter,
            ]
        );
        assert!(matches!(object.properties[8], ObjectProp::Spread(_)));
    }

    #[test]
    fn test_get_and_set_as_plain_names() {
        let Expr::Object(object) = expr("({get: 1, set, get() {}});") else {
            panic!("expected an object literal");
        };
        assert_eq!(object.properties.len(), 3);
    }

    #[test]
    fn test_object_literal_accessor_clashes() {
        let error = parse_err("({a: 1, get a() {}});");
        assert_eq!(error.kind, ErrorKind::Syntax);
        assert_eq!(
            error.message,
            "Object literal may not have data and accessor property with the same name 'a'"
        );
        assert_eq!(parse_err("({get a() {}, get a() {}});").kind, ErrorKind::Syntax);
        assert_eq!(parse_err("({set 1(v) {}, '1': 2});").kind, ErrorKind::Syntax);
        parse_ok("({get a() {}, set a(v) {}});");
        parse_ok("({a: 1, a: 2});");
    }

    #[test]
    fn test_nested_literals_with_accessors_parse_in_one_pass() {
        let depth = 40;
        let mut text = String::from("(");
        for _ in 0..depth {
            text.push_str("{a: ");
        }
        text.push('1');
        for _ in 0..depth {
            text.push_str(", get x() {}}");
        }
        text.push_str(");");
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || {
                let started = std::time::Instant::now();
                let parsed = parse_program(&SourceText::new(&text)).is_ok();
                (parsed, started.elapsed())
            })
            .unwrap();
        let (parsed, elapsed) = handle.join().unwrap();
        assert!(parsed);
        assert!(elapsed < std::time::Duration::from_secs(5));

        parse_ok("({a: 1, b: {get a() {}}, get c() {}});");
        assert_eq!(
            parse_err("({a: 1, b: {get a() {}}, get a() {}});").message,
            "Object literal may not have data and accessor property with the same name 'a'"
        );
    }

    #[test]
    fn test_duplicate_proto() {
        assert_eq!(
            parse_err("({__proto__: a, '__proto__': b});").message,
            "Duplicate __proto__ fields are not allowed in object literals"
        );
        parse_ok("({__proto__: a, ['__proto__']: b, __proto__() {}});");
    }

    #[test]
    fn test_shorthand_initializer_outside_pattern() {
        assert_eq!(
            parse_err("({a = 1});").message,
            "Invalid shorthand property initializer"
        );
        parse_ok("({a = 1} = o);");
    }

    #[test]
    fn test_in_operator_inside_for_head_groups() {
        parse_ok("for (var x = ('a' in o); x; ) {}");
        parse_ok("for (var x = [a in o]; x; ) {}");
        parse_ok("for (var x = a ? b in c : d; x; ) {}");
    }

    #[test]
    fn test_method_keys_are_not_bindings() {
        parse_ok("({ eval() { 'use strict'; }, get arguments() { 'use strict'; return 1; } });");
        parse_ok("({ f() { return f; } });");
        assert_eq!(
            parse_err("(function eval() { 'use strict'; });").kind,
            ErrorKind::StrictMode
        );
    }

    #[test]
    fn test_sloppy_let_is_an_identifier() {
        assert!(matches!(expr("let + 1;"), Expr::Binary(_)));
    }

    #[test]
    fn test_unsupported_constructs() {
        assert_eq!(parse_err("x = class {};").message, "Classes are not supported");
        assert_eq!(parse_err("x = `t`;").message, "Template literals are not supported");
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let text = format!("{}x{}", "(".repeat(300), ")".repeat(300));
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || parse_program(&SourceText::new(&text)).map(|_| ()))
            .unwrap();
        let error = handle.join().unwrap().unwrap_err();
        assert_eq!(error.message, "Maximum nesting depth exceeded");
    }
}
