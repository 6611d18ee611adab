//! Binding and assignment patterns.
//!
//! One routine parses every destructuring form; [`DestructuringKind`]
//! decides whether a leaf name declares a binding (and in which way) or, for
//! assignment patterns, names an existing location.  Assignment patterns are
//! parsed speculatively: `Ok(None)` means "not a pattern", and the writes
//! they would perform wait in `pending_writes` until the caller commits.

use crate::error::{ErrorKind, ParseResult};

use super::builder::{AstBuilder, PatternElement, PatternProperty, PropertyKey};
use super::scope::{DeclarationKind, DeclarationResult, is_eval_or_arguments};
use super::token::{Position, TokenKind, TokenLocation, TokenValue};
use super::{Parser, SavePoint};

/// What the leaves of a pattern bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DestructuringKind {
    /// `var` declarators.
    Variables,
    /// `let` declarators.
    Let,
    /// `const` declarators.
    Const,
    /// Formal parameters.
    Parameters,
    /// The parameter of a `catch` clause.
    CatchParameters,
    /// Assignment targets: nothing is declared.
    Expressions,
}

impl<'src, B: AstBuilder> Parser<'src, B> {
    /// A pattern that must be well formed.
    pub(super) fn parse_binding_pattern(&mut self, kind: DestructuringKind) -> ParseResult<B::Pattern> {
        match self.parse_destructuring_pattern(kind)? {
            Some(pattern) => Ok(pattern),
            None => Err(self.unexpected()),
        }
    }

    /// A single bound name.
    pub(super) fn parse_binding_identifier(&mut self, kind: DestructuringKind) -> ParseResult<B::Pattern> {
        if !self.at_binding_identifier() {
            return Err(self.unexpected());
        }
        let start = self.start();
        let location = self.token.location;
        let name = self.identifier_name();
        self.next();
        self.bind_name(kind, &name, start, &location)
    }

    /// `[...]`, `{...}` or a leaf target.
    pub(super) fn parse_destructuring_pattern(&mut self, kind: DestructuringKind) -> ParseResult<Option<B::Pattern>> {
        self.enter()?;
        let result = match self.kind() {
            TokenKind::LeftBracket => self.parse_array_pattern(kind),
            TokenKind::LeftBrace => self.parse_object_pattern(kind),
            _ => self.parse_pattern_target(kind),
        };
        self.leave();
        result
    }

    fn parse_pattern_target(&mut self, kind: DestructuringKind) -> ParseResult<Option<B::Pattern>> {
        if kind != DestructuringKind::Expressions {
            return self.parse_binding_identifier(kind).map(Some);
        }
        let start = self.start();
        let location = self.token.location;
        let target = self.parse_lhs_expression()?;
        if !self.builder.is_location(&target) {
            return Ok(None);
        }
        if let Some(name) = self.builder.resolve_name(&target) {
            self.state.pending_writes.push((name.to_owned(), location));
        }
        Ok(Some(self.builder.create_assignment_target(self.span_from(start), target)))
    }

    fn parse_array_pattern(&mut self, kind: DestructuringKind) -> ParseResult<Option<B::Pattern>> {
        let start = self.start();
        self.next();
        let mut elements = Vec::new();
        let mut rest = None;
        loop {
            match self.kind() {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    self.next();
                    elements.push(None);
                    continue;
                }
                TokenKind::DotDotDot => {
                    self.next();
                    let Some(target) = self.parse_destructuring_pattern(kind)? else {
                        return Ok(None);
                    };
                    if !self.at(TokenKind::RightBracket) {
                        if kind == DestructuringKind::Expressions {
                            return Ok(None);
                        }
                        return Err(self.error(ErrorKind::Syntax, "Rest element must be last element"));
                    }
                    rest = Some(target);
                    break;
                }
                _ => {}
            }
            let element_start = self.start();
            let Some(target) = self.parse_destructuring_pattern(kind)? else {
                return Ok(None);
            };
            let default = self.parse_pattern_default()?;
            elements.push(Some(PatternElement {
                span: self.span_from(element_start),
                target,
                default,
            }));
            if self.at(TokenKind::RightBracket) {
                break;
            }
            if !self.consume(TokenKind::Comma) {
                return self.pattern_mismatch(kind);
            }
        }
        self.next();
        Ok(Some(self.builder.create_array_pattern(self.span_from(start), elements, rest)))
    }

    fn parse_object_pattern(&mut self, kind: DestructuringKind) -> ParseResult<Option<B::Pattern>> {
        let start = self.start();
        self.next();
        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            let property_start = self.start();
            let location = self.token.location;
            let (key, shorthand_name) = match self.kind() {
                TokenKind::String => {
                    let value = self.token_text();
                    self.next();
                    (PropertyKey::String(value), None)
                }
                TokenKind::Number => {
                    let value = match self.token.value {
                        TokenValue::Number(value) => value,
                        _ => 0.0,
                    };
                    self.next();
                    (PropertyKey::Number(value), None)
                }
                TokenKind::LeftBracket => {
                    self.next();
                    let key = self.with_allows_in(true, |p| p.parse_assignment_expression())?;
                    self.expect(TokenKind::RightBracket)?;
                    (PropertyKey::Computed(key), None)
                }
                token if token.is_identifier_name() => {
                    let name = self.identifier_name();
                    let is_plain = self.at_binding_identifier();
                    self.next();
                    let shorthand = is_plain.then(|| name.clone());
                    (PropertyKey::Identifier(name), shorthand)
                }
                _ => return self.pattern_mismatch(kind),
            };
            let (target, shorthand) = if self.consume(TokenKind::Colon) {
                let Some(target) = self.parse_destructuring_pattern(kind)? else {
                    return Ok(None);
                };
                (target, false)
            } else if let Some(name) = shorthand_name {
                (self.bind_name(kind, &name, property_start, &location)?, true)
            } else {
                return self.pattern_mismatch(kind);
            };
            let default = self.parse_pattern_default()?;
            properties.push(PatternProperty {
                span: self.span_from(property_start),
                key,
                target,
                default,
                shorthand,
            });
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        if !self.at(TokenKind::RightBrace) {
            return self.pattern_mismatch(kind);
        }
        self.next();
        Ok(Some(self.builder.create_object_pattern(self.span_from(start), properties)))
    }

    fn parse_pattern_default(&mut self) -> ParseResult<Option<B::Expression>> {
        if !self.consume(TokenKind::Equal) {
            return Ok(None);
        }
        self.with_allows_in(true, |p| p.parse_assignment_expression()).map(Some)
    }

    /// A malformed pattern: fatal for declarations, "not a pattern" for
    /// assignment targets.
    fn pattern_mismatch(&self, kind: DestructuringKind) -> ParseResult<Option<B::Pattern>> {
        if kind == DestructuringKind::Expressions {
            Ok(None)
        } else {
            Err(self.unexpected())
        }
    }

    /// The pattern leaf for an already consumed `name`.
    fn bind_name(
        &mut self,
        kind: DestructuringKind,
        name: &str,
        start: Position,
        location: &TokenLocation,
    ) -> ParseResult<B::Pattern> {
        let span = self.span_from(start);
        if kind == DestructuringKind::Expressions {
            self.scopes.use_variable(name);
            self.state.pending_writes.push((name.to_owned(), *location));
            let target = self.builder.create_resolve(span, name);
            return Ok(self.builder.create_assignment_target(span, target));
        }
        self.declare_binding(name, kind, location)?;
        Ok(self.builder.create_binding(span, name))
    }

    // ── Declaration checks ──────────────────────────────────────────────────

    /// Declare `name` in the scope `kind` selects and report what the
    /// declaration makes illegal.
    pub(super) fn declare_binding(
        &mut self,
        name: &str,
        kind: DestructuringKind,
        location: &TokenLocation,
    ) -> ParseResult<()> {
        let result = match kind {
            DestructuringKind::Variables => self.scopes.declare_variable(name, DeclarationKind::Var),
            DestructuringKind::Let => self.scopes.declare_variable(name, DeclarationKind::Let),
            DestructuringKind::Const => self.scopes.declare_variable(name, DeclarationKind::Const),
            DestructuringKind::Parameters => self.scopes.declare_parameter(name),
            DestructuringKind::CatchParameters => self.scopes.declare_catch_parameter(name),
            DestructuringKind::Expressions => DeclarationResult::VALID,
        };
        if matches!(kind, DestructuringKind::Let | DestructuringKind::Const) && name == "let" {
            return Err(self.error_at(
                ErrorKind::Syntax,
                "let is disallowed as a lexically bound name",
                location,
            ));
        }
        if result.contains(DeclarationResult::INVALID_STRICT_MODE) && self.strict() {
            return Err(self.error_at(
                ErrorKind::StrictMode,
                format!("Cannot declare a variable named '{name}' in strict mode"),
                location,
            ));
        }
        if result.contains(DeclarationResult::INVALID_DUPLICATED) {
            // Sloppy simple parameter lists may repeat a name; the function
            // rejects the duplicate once it knows the list is not simple.
            if kind == DestructuringKind::Parameters {
                if self.strict() {
                    return Err(self.error_at(
                        ErrorKind::StrictMode,
                        "Duplicate parameter name not allowed in this context",
                        location,
                    ));
                }
            } else {
                return Err(self.error_at(
                    ErrorKind::Semantic,
                    format!("Identifier '{name}' has already been declared"),
                    location,
                ));
            }
        }
        if matches!(
            kind,
            DestructuringKind::Variables | DestructuringKind::Let | DestructuringKind::Const
        ) {
            self.state.bound_names.push(name.to_owned());
        }
        Ok(())
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Record an assignment to `target` if it names a variable.
    pub(super) fn note_assignment(&mut self, target: &B::Expression, location: &TokenLocation) -> ParseResult<()> {
        let Some(name) = self.builder.resolve_name(target) else {
            return Ok(());
        };
        self.write_checked(name, location)
    }

    /// Apply the writes of an assignment pattern parsed since `point`.
    pub(super) fn commit_pending_writes(&mut self, point: SavePoint) -> ParseResult<()> {
        let pending = self.state.pending_writes.split_off(point.pending_writes);
        for (name, location) in &pending {
            self.write_checked(name, location)?;
        }
        Ok(())
    }

    fn write_checked(&mut self, name: &str, location: &TokenLocation) -> ParseResult<()> {
        if self.strict() && is_eval_or_arguments(name) {
            return Err(self.error_at(
                ErrorKind::StrictMode,
                format!("Cannot assign to '{name}' in strict mode"),
                location,
            ));
        }
        self.scopes.write_variable(name);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
