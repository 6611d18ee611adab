//! The contract between the parser and whatever it builds.
//!
//! The parser never constructs nodes itself: it calls the `create_*` factory
//! operations of an [`AstBuilder`] and only reads back the few facts it needs
//! for validation ([`AstBuilder::resolve_name`], [`AstBuilder::is_location`],
//! [`AstBuilder::is_directive`]).  Two builders ship with the crate:
//! [`TreeBuilder`](super::ast::TreeBuilder) produces an owned AST and
//! [`SyntaxChecker`](super::preparser::SyntaxChecker) produces cheap
//! classifications for validation-only pre-parsing.
//!
//! The carrier structs below are generic over the builder so that one parse
//! routine can hand a builder its own node types.

use super::options::{ConstructorKind, FunctionParseType, SourceParseMode};
use super::scope::{FunctionScopeInfo, VariableEnvironment};
use super::token::{Span, TokenKind};

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

/// A binary infix operator, including the short-circuit `&&` and `||`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `in`
    In,
    /// `instanceof`
    Instanceof,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// The operator spelled by `kind`.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::PipePipe => Self::LogicalOr,
            TokenKind::AmpersandAmpersand => Self::LogicalAnd,
            TokenKind::Pipe => Self::BitOr,
            TokenKind::Caret => Self::BitXor,
            TokenKind::Ampersand => Self::BitAnd,
            TokenKind::EqualEqual => Self::Eq,
            TokenKind::BangEqual => Self::NotEq,
            TokenKind::EqualEqualEqual => Self::StrictEq,
            TokenKind::BangEqualEqual => Self::StrictNotEq,
            TokenKind::Less => Self::Lt,
            TokenKind::Greater => Self::Gt,
            TokenKind::LessEqual => Self::LtEq,
            TokenKind::GreaterEqual => Self::GtEq,
            TokenKind::In => Self::In,
            TokenKind::Instanceof => Self::Instanceof,
            TokenKind::LessLess => Self::Shl,
            TokenKind::GreaterGreater => Self::Shr,
            TokenKind::GreaterGreaterGreater => Self::UShr,
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::Percent => Self::Rem,
            _ => return None,
        };
        Some(op)
    }

    /// `&&` or `||`.
    pub fn is_logical(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }
}

/// A prefix unary operator other than `++`/`--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

impl UnaryOp {
    /// The operator spelled by `kind`.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Minus => Self::Minus,
            TokenKind::Plus => Self::Plus,
            TokenKind::Bang => Self::Not,
            TokenKind::Tilde => Self::BitNot,
            TokenKind::Typeof => Self::Typeof,
            TokenKind::Void => Self::Void,
            TokenKind::Delete => Self::Delete,
            _ => return None,
        };
        Some(op)
    }
}

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    /// The operator spelled by `kind`.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::PlusPlus => Some(Self::Increment),
            TokenKind::MinusMinus => Some(Self::Decrement),
            _ => None,
        }
    }
}

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    UShrAssign,
    /// `&=`
    BitAndAssign,
    /// `|=`
    BitOrAssign,
    /// `^=`
    BitXorAssign,
}

impl AssignOp {
    /// The operator spelled by `kind`.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Equal => Self::Assign,
            TokenKind::PlusEqual => Self::AddAssign,
            TokenKind::MinusEqual => Self::SubAssign,
            TokenKind::StarEqual => Self::MulAssign,
            TokenKind::SlashEqual => Self::DivAssign,
            TokenKind::PercentEqual => Self::RemAssign,
            TokenKind::LessLessEqual => Self::ShlAssign,
            TokenKind::GreaterGreaterEqual => Self::ShrAssign,
            TokenKind::GreaterGreaterGreaterEqual => Self::UShrAssign,
            TokenKind::AmpersandEqual => Self::BitAndAssign,
            TokenKind::PipeEqual => Self::BitOrAssign,
            TokenKind::CaretEqual => Self::BitXorAssign,
            _ => return None,
        };
        Some(op)
    }
}

/// The declaring keyword of a variable statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

/// The key of an object literal property or object pattern property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey<E> {
    /// An identifier name (reserved words included).
    Identifier(String),
    /// A string literal key.
    String(String),
    /// A numeric literal key.
    Number(f64),
    /// `[expr]`
    Computed(E),
}

impl<E> PropertyKey<E> {
    /// The property name a literal key denotes; `None` for computed keys.
    pub fn literal_name(&self) -> Option<String> {
        match self {
            Self::Identifier(name) | Self::String(name) => Some(name.clone()),
            Self::Number(value) => Some(value.to_string()),
            Self::Computed(_) => None,
        }
    }
}

/// What an object literal property defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `key: value`
    Value,
    /// `{ key }`
    Shorthand,
    /// `get key() {}`
    Getter,
    /// `set key(v) {}`
    Setter,
    /// `key() {}`
    Method,
}

// ─────────────────────────────────────────────────────────────────────────────
// Carriers
// ─────────────────────────────────────────────────────────────────────────────

/// One formal parameter.
pub struct Parameter<B: AstBuilder> {
    /// Source span of the parameter.
    pub span: Span,
    /// The bound name or destructuring pattern.
    pub pattern: B::Pattern,
    /// Default value.
    pub default: Option<B::Expression>,
    /// `...rest`
    pub is_rest: bool,
}

/// The body of a function.
pub enum FunctionBody<B: AstBuilder> {
    /// `{ statements }`
    Block(Vec<B::Statement>),
    /// The expression body of an arrow function.
    Expression(B::Expression),
}

/// Everything the parser knows about a function once it has been parsed.
pub struct FunctionParts<B: AstBuilder> {
    /// The whole function, from `function`/the first parameter/the key.
    pub span: Span,
    /// First unit of the parameter list (the `(` or the single arrow
    /// parameter).
    pub params_begin: usize,
    /// The body, braces included.
    pub body_span: Span,
    /// Declared or inferred name.
    pub name: Option<String>,
    /// Function mode.
    pub mode: SourceParseMode,
    /// Arrow or normal syntax.
    pub parse_type: FunctionParseType,
    /// Constructor flavour.
    pub constructor_kind: ConstructorKind,
    /// Formal parameters.
    pub params: Vec<Parameter<B>>,
    /// Body.
    pub body: FunctionBody<B>,
    /// Scope metadata of the function.
    pub scope: FunctionScopeInfo,
}

/// One `name = init` of a variable statement.
pub struct Declarator<B: AstBuilder> {
    /// Source span.
    pub span: Span,
    /// The bound name or pattern.
    pub target: B::Pattern,
    /// Initializer.
    pub init: Option<B::Expression>,
}

/// The first clause of a C-style `for`.
pub enum ForInit<B: AstBuilder> {
    /// `var`/`let`/`const` declaration.
    Declaration(B::Statement),
    /// A plain expression.
    Expression(B::Expression),
}

/// The left-hand side of `for-in`/`for-of`.
pub enum ForHead<B: AstBuilder> {
    /// `var`/`let`/`const` declaration with a single declarator.
    Declaration(B::Statement),
    /// An assignable expression.
    Target(B::Expression),
    /// A destructuring assignment pattern.
    Pattern(B::Pattern),
}

/// A `case`/`default` clause.
pub struct SwitchClause<B: AstBuilder> {
    /// Source span.
    pub span: Span,
    /// `None` for `default`.
    pub test: Option<B::Expression>,
    /// Statements of the clause.
    pub body: Vec<B::Statement>,
}

/// `catch (param) { body }`
pub struct CatchClause<B: AstBuilder> {
    /// Source span.
    pub span: Span,
    /// The catch binding.
    pub param: B::Pattern,
    /// The handler block.
    pub body: B::Statement,
}

/// An element of an array pattern.
pub struct PatternElement<B: AstBuilder> {
    /// Source span.
    pub span: Span,
    /// Nested target.
    pub target: B::Pattern,
    /// Default value.
    pub default: Option<B::Expression>,
}

/// A property of an object pattern.
pub struct PatternProperty<B: AstBuilder> {
    /// Source span.
    pub span: Span,
    /// The matched key.
    pub key: PropertyKey<B::Expression>,
    /// Nested target.
    pub target: B::Pattern,
    /// Default value.
    pub default: Option<B::Expression>,
    /// `{ a }` rather than `{ a: a }`.
    pub shorthand: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// AstBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Node factory used by the [`Parser`](super::Parser).
pub trait AstBuilder {
    /// Expression nodes.
    type Expression;
    /// Statement nodes.
    type Statement;
    /// Binding and assignment patterns.
    type Pattern;
    /// Object literal properties.
    type Property;
    /// The result of a whole parse.
    type Program;

    // ── Read-back ───────────────────────────────────────────────────────────

    /// The identifier an expression refers to, if it is a plain reference.
    fn resolve_name<'e>(&self, expr: &'e Self::Expression) -> Option<&'e str>;

    /// `expr` is a plain identifier reference.
    fn is_resolve(&self, expr: &Self::Expression) -> bool {
        self.resolve_name(expr).is_some()
    }

    /// `expr` may be assigned to (identifier or member access).
    fn is_location(&self, expr: &Self::Expression) -> bool;

    /// `stmt` is an expression statement made of a single string literal.
    fn is_directive(&self, stmt: &Self::Statement) -> bool;

    // ── Primary expressions ─────────────────────────────────────────────────

    /// `this`
    fn create_this(&mut self, span: Span) -> Self::Expression;
    /// An identifier reference.
    fn create_resolve(&mut self, span: Span, name: &str) -> Self::Expression;
    /// `null`
    fn create_null(&mut self, span: Span) -> Self::Expression;
    /// `true` / `false`
    fn create_boolean(&mut self, span: Span, value: bool) -> Self::Expression;
    /// Numeric literal.
    fn create_number(&mut self, span: Span, value: f64) -> Self::Expression;
    /// String literal (cooked).
    fn create_string(&mut self, span: Span, value: String) -> Self::Expression;
    /// Regular expression literal.
    fn create_regexp(&mut self, span: Span, pattern: String, flags: String) -> Self::Expression;
    /// Array literal; `None` elements are holes.
    fn create_array(&mut self, span: Span, elements: Vec<Option<Self::Expression>>) -> Self::Expression;
    /// Object literal.
    fn create_object(&mut self, span: Span, properties: Vec<Self::Property>) -> Self::Expression;
    /// A property of an object literal.
    fn create_property(
        &mut self,
        span: Span,
        key: PropertyKey<Self::Expression>,
        kind: PropertyKind,
        value: Self::Expression,
    ) -> Self::Property;
    /// `...expr` inside an object literal.
    fn create_spread_property(&mut self, span: Span, argument: Self::Expression) -> Self::Property;
    /// `...expr` inside an array literal or argument list.
    fn create_spread(&mut self, span: Span, argument: Self::Expression) -> Self::Expression;
    /// Function expression, arrow function, method or accessor.
    fn create_function_expression(&mut self, function: FunctionParts<Self>) -> Self::Expression
    where
        Self: Sized;

    // ── Operators ───────────────────────────────────────────────────────────

    /// Prefix unary operator.
    fn create_unary(&mut self, span: Span, op: UnaryOp, argument: Self::Expression) -> Self::Expression;
    /// `++`/`--`, prefix or postfix.
    fn create_update(
        &mut self,
        span: Span,
        op: UpdateOp,
        prefix: bool,
        argument: Self::Expression,
    ) -> Self::Expression;
    /// Binary operator, including `&&`/`||`.
    fn create_binary(
        &mut self,
        span: Span,
        op: BinaryOp,
        left: Self::Expression,
        right: Self::Expression,
    ) -> Self::Expression;
    /// `test ? consequent : alternate`
    fn create_conditional(
        &mut self,
        span: Span,
        test: Self::Expression,
        consequent: Self::Expression,
        alternate: Self::Expression,
    ) -> Self::Expression;
    /// Assignment to an identifier or member expression.
    fn create_assignment(
        &mut self,
        span: Span,
        op: AssignOp,
        target: Self::Expression,
        value: Self::Expression,
    ) -> Self::Expression;
    /// `pattern = value`
    fn create_destructuring_assignment(
        &mut self,
        span: Span,
        target: Self::Pattern,
        value: Self::Expression,
    ) -> Self::Expression;
    /// Comma expression.
    fn create_sequence(&mut self, span: Span, expressions: Vec<Self::Expression>) -> Self::Expression;

    // ── Member access and calls ─────────────────────────────────────────────

    /// `object.name`
    fn create_member(&mut self, span: Span, object: Self::Expression, name: String) -> Self::Expression;
    /// `object[index]`
    fn create_computed_member(
        &mut self,
        span: Span,
        object: Self::Expression,
        index: Self::Expression,
    ) -> Self::Expression;
    /// `callee(arguments)`
    fn create_call(
        &mut self,
        span: Span,
        callee: Self::Expression,
        arguments: Vec<Self::Expression>,
    ) -> Self::Expression;
    /// `new callee(arguments)`; `None` when the parentheses are omitted.
    fn create_new(
        &mut self,
        span: Span,
        callee: Self::Expression,
        arguments: Option<Vec<Self::Expression>>,
    ) -> Self::Expression;
    /// `super` as callee or member base.
    fn create_super(&mut self, span: Span) -> Self::Expression;
    /// `new.target`
    fn create_new_target(&mut self, span: Span) -> Self::Expression;

    // ── Patterns ────────────────────────────────────────────────────────────

    /// A bound name.
    fn create_binding(&mut self, span: Span, name: &str) -> Self::Pattern;
    /// An assignable expression used as a destructuring target.
    fn create_assignment_target(&mut self, span: Span, target: Self::Expression) -> Self::Pattern;
    /// `[a, , b = 1, ...rest]`
    fn create_array_pattern(
        &mut self,
        span: Span,
        elements: Vec<Option<PatternElement<Self>>>,
        rest: Option<Self::Pattern>,
    ) -> Self::Pattern
    where
        Self: Sized;
    /// `{a, b: c = 1}`
    fn create_object_pattern(&mut self, span: Span, properties: Vec<PatternProperty<Self>>) -> Self::Pattern
    where
        Self: Sized;

    // ── Statements ──────────────────────────────────────────────────────────

    /// `{ statements }`
    fn create_block(
        &mut self,
        span: Span,
        body: Vec<Self::Statement>,
        scope: VariableEnvironment,
    ) -> Self::Statement;
    /// `var`/`let`/`const` statement.
    fn create_var_declaration(
        &mut self,
        span: Span,
        kind: VarKind,
        declarators: Vec<Declarator<Self>>,
    ) -> Self::Statement
    where
        Self: Sized;
    /// Function declaration.
    fn create_function_declaration(&mut self, function: FunctionParts<Self>) -> Self::Statement
    where
        Self: Sized;
    /// `expr;`
    fn create_expression_statement(&mut self, span: Span, expr: Self::Expression) -> Self::Statement;
    /// `if (test) consequent else alternate`
    fn create_if(
        &mut self,
        span: Span,
        test: Self::Expression,
        consequent: Self::Statement,
        alternate: Option<Self::Statement>,
    ) -> Self::Statement;
    /// `for (init; test; update) body`
    fn create_for(
        &mut self,
        span: Span,
        init: Option<ForInit<Self>>,
        test: Option<Self::Expression>,
        update: Option<Self::Expression>,
        body: Self::Statement,
        scope: VariableEnvironment,
    ) -> Self::Statement
    where
        Self: Sized;
    /// `for (left in right) body`
    fn create_for_in(
        &mut self,
        span: Span,
        left: ForHead<Self>,
        right: Self::Expression,
        body: Self::Statement,
        scope: VariableEnvironment,
    ) -> Self::Statement
    where
        Self: Sized;
    /// `for (left of right) body`
    fn create_for_of(
        &mut self,
        span: Span,
        left: ForHead<Self>,
        right: Self::Expression,
        body: Self::Statement,
        scope: VariableEnvironment,
    ) -> Self::Statement
    where
        Self: Sized;
    /// `while (test) body`
    fn create_while(&mut self, span: Span, test: Self::Expression, body: Self::Statement) -> Self::Statement;
    /// `do body while (test)`
    fn create_do_while(&mut self, span: Span, body: Self::Statement, test: Self::Expression) -> Self::Statement;
    /// `switch (discriminant) { cases }`
    fn create_switch(
        &mut self,
        span: Span,
        discriminant: Self::Expression,
        cases: Vec<SwitchClause<Self>>,
        scope: VariableEnvironment,
    ) -> Self::Statement
    where
        Self: Sized;
    /// `try block catch finally`
    fn create_try(
        &mut self,
        span: Span,
        block: Self::Statement,
        handler: Option<CatchClause<Self>>,
        finalizer: Option<Self::Statement>,
    ) -> Self::Statement
    where
        Self: Sized;
    /// `return argument;`
    fn create_return(&mut self, span: Span, argument: Option<Self::Expression>) -> Self::Statement;
    /// `throw argument;`
    fn create_throw(&mut self, span: Span, argument: Self::Expression) -> Self::Statement;
    /// `break label;`
    fn create_break(&mut self, span: Span, label: Option<String>) -> Self::Statement;
    /// `continue label;`
    fn create_continue(&mut self, span: Span, label: Option<String>) -> Self::Statement;
    /// `label: body`
    fn create_labeled(&mut self, span: Span, label: String, body: Self::Statement) -> Self::Statement;
    /// `with (object) body`
    fn create_with(&mut self, span: Span, object: Self::Expression, body: Self::Statement) -> Self::Statement;
    /// `debugger;`
    fn create_debugger(&mut self, span: Span) -> Self::Statement;
    /// `;`
    fn create_empty(&mut self, span: Span) -> Self::Statement;

    // ── Program ─────────────────────────────────────────────────────────────

    /// The root of a parse.
    fn create_program(
        &mut self,
        span: Span,
        mode: SourceParseMode,
        body: Vec<Self::Statement>,
        scope: FunctionScopeInfo,
    ) -> Self::Program;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_covers_every_binary_token() {
        use TokenKind::*;
        for kind in [
            PipePipe, AmpersandAmpersand, Pipe, Caret, Ampersand, EqualEqual, BangEqual,
            EqualEqualEqual, BangEqualEqual, Less, Greater, LessEqual, GreaterEqual, In,
            Instanceof, LessLess, GreaterGreater, GreaterGreaterGreater, Plus, Minus, Star, Slash,
            Percent,
        ] {
            assert!(kind.precedence(true) > 0, "{kind:?}");
            assert!(BinaryOp::from_token(kind).is_some(), "{kind:?}");
        }
        assert!(BinaryOp::from_token(Equal).is_none());
        assert!(BinaryOp::LogicalOr.is_logical());
        assert!(!BinaryOp::BitOr.is_logical());
    }

    #[test]
    fn test_assignment_tokens_map_to_ops() {
        use TokenKind::*;
        for kind in [
            Equal, PlusEqual, MinusEqual, StarEqual, SlashEqual, PercentEqual, LessLessEqual,
            GreaterGreaterEqual, GreaterGreaterGreaterEqual, AmpersandEqual, PipeEqual, CaretEqual,
        ] {
            assert!(kind.is_assignment());
            assert!(AssignOp::from_token(kind).is_some(), "{kind:?}");
        }
    }

    #[test]
    fn test_unary_and_update_ops() {
        assert_eq!(UnaryOp::from_token(TokenKind::Typeof), Some(UnaryOp::Typeof));
        assert_eq!(UnaryOp::from_token(TokenKind::PlusPlus), None);
        assert_eq!(UpdateOp::from_token(TokenKind::MinusMinus), Some(UpdateOp::Decrement));
    }

    #[test]
    fn test_property_key_literal_name() {
        assert_eq!(PropertyKey::<()>::Identifier("a".into()).literal_name().as_deref(), Some("a"));
        assert_eq!(PropertyKey::<()>::Number(1.0).literal_name().as_deref(), Some("1"));
        assert_eq!(PropertyKey::<()>::Number(1.5).literal_name().as_deref(), Some("1.5"));
        assert_eq!(PropertyKey::Computed(()).literal_name(), None);
    }
}
