//! Abstract syntax tree and the [`TreeBuilder`] that produces it.
//!
//! Every node carries a [`SourceLocation`] (`loc`).  Function and program
//! nodes also carry the [`FunctionScopeInfo`] computed while parsing them,
//! and block-like statements carry their lexical [`VariableEnvironment`].
//!
//! # Structure
//!
//! - [`Program`]: root node.
//! - [`Stmt`]: statement nodes.
//! - [`Expr`]: expression nodes.
//! - [`Pat`]: binding and assignment patterns.
//! - [`Function`]: every function form (declaration, expression, arrow,
//!   method, accessor).

use crate::parser::builder::{
    self, AstBuilder, CatchClause as CatchParts, Declarator, ForHead, FunctionParts, PatternElement,
    PatternProperty, PropertyKey, SwitchClause,
};
use crate::parser::options::{ConstructorKind, FunctionParseType, SourceParseMode};
use crate::parser::scope::{FunctionScopeInfo, VariableEnvironment};
use crate::parser::token::Span;

pub use crate::parser::builder::{AssignOp, BinaryOp, PropertyKind as PropKind, UnaryOp, UpdateOp, VarKind};

// ─────────────────────────────────────────────────────────────────────────────
// Source location
// ─────────────────────────────────────────────────────────────────────────────

/// Source location attached to every AST node: a half-open `[start, end)`
/// span with line and column information.
pub type SourceLocation = Span;

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the source was parsed as a classic script or an ES module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// A classic script.
    Script,
    /// An ES module (always strict).
    Module,
}

/// The root node of a parsed source.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Source location of the whole program.
    pub loc: SourceLocation,
    /// Script or module.
    pub source_type: SourceType,
    /// Top-level statements.
    pub body: Vec<Stmt>,
    /// The program is strict code.
    pub strict: bool,
    /// Top-level declarations, captures and free variables.
    pub scope: FunctionScopeInfo,
}

// ─────────────────────────────────────────────────────────────────────────────
// Common helpers
// ─────────────────────────────────────────────────────────────────────────────

/// An identifier (reference, binding or label).
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// Source location.
    pub loc: SourceLocation,
    /// The identifier text.
    pub name: String,
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Source location.
    pub loc: SourceLocation,
    /// The binding pattern.
    pub pat: Pat,
    /// Default value (`= expr`), if present.
    pub default: Option<Expr>,
    /// `...pat`
    pub is_rest: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function body: statements in braces, or an arrow's expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `{ statements }`
    Block(Vec<Stmt>),
    /// `=> expr`
    Expression(Box<Expr>),
}

/// Any function form.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// From `function` (or the method key, or the arrow's parameters) to the
    /// end of the body.
    pub loc: SourceLocation,
    /// The declared name; its location is that of the whole function.
    pub id: Option<Ident>,
    /// Formal parameters.
    pub params: Vec<Param>,
    /// The body.
    pub body: FunctionBody,
    /// Plain function, method, accessor or arrow.
    pub mode: SourceParseMode,
    /// Arrow or normal syntax.
    pub parse_type: FunctionParseType,
    /// Constructor flavour.
    pub constructor_kind: ConstructorKind,
    /// Offset of the parameter list (the `(`, or an arrow's lone parameter).
    pub params_begin: usize,
    /// Location of the body.
    pub body_loc: SourceLocation,
    /// Declarations, captures and free variables of the function.
    pub scope: FunctionScopeInfo,
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `{ … }`
    Block(BlockStmt),
    /// `var / let / const` declaration.
    VarDecl(VarDecl),
    /// `function` declaration.
    FunctionDecl(Box<Function>),
    /// `expr ;`
    Expr(ExprStmt),
    /// `if (test) consequent else alternate`
    If(IfStmt),
    /// `for (init; test; update) body`
    For(ForStmt),
    /// `for (left in right) body`
    ForIn(ForInStmt),
    /// `for (left of right) body`
    ForOf(ForOfStmt),
    /// `while (test) body`
    While(WhileStmt),
    /// `do body while (test);`
    DoWhile(DoWhileStmt),
    /// `switch (discriminant) { cases }`
    Switch(SwitchStmt),
    /// `try { … } catch (…) { … } finally { … }`
    Try(TryStmt),
    /// `return argument?;`
    Return(ReturnStmt),
    /// `throw argument;`
    Throw(ThrowStmt),
    /// `break label?;`
    Break(BreakStmt),
    /// `continue label?;`
    Continue(ContinueStmt),
    /// `label: body`
    Labeled(LabeledStmt),
    /// `debugger;`
    Debugger(DebuggerStmt),
    /// `with (object) body`
    With(WithStmt),
    /// `;`
    Empty(EmptyStmt),
}

impl Stmt {
    /// Returns the source location of this statement.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Block(s) => s.loc,
            Stmt::VarDecl(s) => s.loc,
            Stmt::FunctionDecl(s) => s.loc,
            Stmt::Expr(s) => s.loc,
            Stmt::If(s) => s.loc,
            Stmt::For(s) => s.loc,
            Stmt::ForIn(s) => s.loc,
            Stmt::ForOf(s) => s.loc,
            Stmt::While(s) => s.loc,
            Stmt::DoWhile(s) => s.loc,
            Stmt::Switch(s) => s.loc,
            Stmt::Try(s) => s.loc,
            Stmt::Return(s) => s.loc,
            Stmt::Throw(s) => s.loc,
            Stmt::Break(s) => s.loc,
            Stmt::Continue(s) => s.loc,
            Stmt::Labeled(s) => s.loc,
            Stmt::Debugger(s) => s.loc,
            Stmt::With(s) => s.loc,
            Stmt::Empty(s) => s.loc,
        }
    }
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Statements in the block.
    pub body: Vec<Stmt>,
    /// `let`/`const` (and strict-mode function) bindings of the block.
    pub scope: VariableEnvironment,
}

/// `expr ;`
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The expression.
    pub expr: Box<Expr>,
}

/// `if (test) consequent else alternate`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Taken branch.
    pub consequent: Box<Stmt>,
    /// Not-taken branch, if present.
    pub alternate: Option<Box<Stmt>>,
}

/// `for (init; test; update) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional initializer.
    pub init: Option<ForInit>,
    /// Optional loop condition.
    pub test: Option<Box<Expr>>,
    /// Optional update expression.
    pub update: Option<Box<Expr>>,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Bindings of a `let`/`const` head.
    pub scope: VariableEnvironment,
}

/// The initializer slot of a C-style `for`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// `var / let / const` declaration.
    VarDecl(VarDecl),
    /// Plain expression.
    Expr(Box<Expr>),
}

/// `for (left in right) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// What each key is assigned to.
    pub left: ForInOfLeft,
    /// The object whose keys are enumerated.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Bindings of a `let`/`const` head.
    pub scope: VariableEnvironment,
}

/// `for (left of right) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// What each value is assigned to.
    pub left: ForInOfLeft,
    /// The iterable.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Bindings of a `let`/`const` head.
    pub scope: VariableEnvironment,
}

/// The left-hand side of `for-in` / `for-of`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInOfLeft {
    /// A single-declarator declaration.
    VarDecl(VarDecl),
    /// An assignable expression.
    Target(Box<Expr>),
    /// An assignment pattern.
    Pattern(Pat),
}

/// `while (test) body`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop condition.
    pub test: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `do body while (test);`
#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Loop condition.
    pub test: Box<Expr>,
}

/// `switch (discriminant) { cases }`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The value being switched on.
    pub discriminant: Box<Expr>,
    /// The `case` / `default` clauses.
    pub cases: Vec<SwitchCase>,
    /// Lexical bindings shared by all clauses.
    pub scope: VariableEnvironment,
}

/// `case test: consequent` or `default: consequent`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Source location.
    pub loc: SourceLocation,
    /// `None` for `default`.
    pub test: Option<Box<Expr>>,
    /// Statements of the clause.
    pub consequent: Vec<Stmt>,
}

/// `try { block } catch (param) { handler } finally { finalizer }`
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The protected block.
    pub block: BlockStmt,
    /// The `catch` clause, if present.
    pub handler: Option<CatchClause>,
    /// The `finally` block, if present.
    pub finalizer: Option<BlockStmt>,
}

/// `catch (param) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Source location.
    pub loc: SourceLocation,
    /// The caught-value binding.
    pub param: Pat,
    /// The handler; its scope also holds the parameter's lexical bindings.
    pub body: BlockStmt,
}

/// `return argument?;`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Returned value.
    pub argument: Option<Box<Expr>>,
}

/// `throw argument;`
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Thrown value.
    pub argument: Box<Expr>,
}

/// `break label?;`
#[derive(Debug, Clone, PartialEq)]
pub struct BreakStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Target label.
    pub label: Option<Ident>,
}

/// `continue label?;`
#[derive(Debug, Clone, PartialEq)]
pub struct ContinueStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Target label.
    pub label: Option<Ident>,
}

/// `label: body`
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The label.
    pub label: Ident,
    /// The labeled statement.
    pub body: Box<Stmt>,
}

/// `debugger;`
#[derive(Debug, Clone, PartialEq)]
pub struct DebuggerStmt {
    /// Source location.
    pub loc: SourceLocation,
}

/// `with (object) body`
#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The scope object.
    pub object: Box<Expr>,
    /// The body.
    pub body: Box<Stmt>,
}

/// `;`
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyStmt {
    /// Source location.
    pub loc: SourceLocation,
}

/// `var / let / const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// The declaring keyword.
    pub kind: VarKind,
    /// One or more declarators.
    pub declarations: Vec<VarDeclarator>,
}

/// `id = init` inside a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    /// Source location.
    pub loc: SourceLocation,
    /// The bound pattern.
    pub id: Pat,
    /// Initializer, if present.
    pub init: Option<Box<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // ── Literals ──────────────────────────────────────────────────────────
    /// `null`
    Null(NullLit),
    /// `true` / `false`
    Bool(BoolLit),
    /// Numeric literal.
    Num(NumLit),
    /// String literal.
    Str(StringLit),
    /// Regular expression literal.
    RegExp(RegExpLit),

    // ── Primary ───────────────────────────────────────────────────────────
    /// Identifier reference.
    Ident(Ident),
    /// `this`
    This(ThisExpr),
    /// `[elements]`
    Array(Box<ArrayExpr>),
    /// `{ properties }`
    Object(Box<ObjectExpr>),
    /// Function expression, arrow, method or accessor.
    Function(Box<Function>),

    // ── Operators ─────────────────────────────────────────────────────────
    /// Prefix unary operator.
    Unary(Box<UnaryExpr>),
    /// `++` / `--`
    Update(Box<UpdateExpr>),
    /// Binary operator, `&&` and `||` included.
    Binary(Box<BinaryExpr>),
    /// `test ? consequent : alternate`
    Conditional(Box<ConditionalExpr>),
    /// Assignment, simple, compound or destructuring.
    Assign(Box<AssignExpr>),
    /// `a, b, c`
    Sequence(Box<SequenceExpr>),

    // ── Member / call ─────────────────────────────────────────────────────
    /// `object.name` / `object[expr]`
    Member(Box<MemberExpr>),
    /// `callee(args)`
    Call(Box<CallExpr>),
    /// `new callee(args)`
    New(Box<NewExpr>),
    /// `...argument`
    Spread(Box<SpreadElement>),
    /// `super`, as a callee or member base.
    Super(SuperExpr),
    /// `new.target`
    NewTarget(NewTargetExpr),
}

impl Expr {
    /// Returns the source location of this expression.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Null(e) => e.loc,
            Expr::Bool(e) => e.loc,
            Expr::Num(e) => e.loc,
            Expr::Str(e) => e.loc,
            Expr::RegExp(e) => e.loc,
            Expr::Ident(e) => e.loc,
            Expr::This(e) => e.loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Function(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Update(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Conditional(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Sequence(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::New(e) => e.loc,
            Expr::Spread(e) => e.loc,
            Expr::Super(e) => e.loc,
            Expr::NewTarget(e) => e.loc,
        }
    }
}

/// `null`
#[derive(Debug, Clone, PartialEq)]
pub struct NullLit {
    /// Source location.
    pub loc: SourceLocation,
}

/// `true` / `false`
#[derive(Debug, Clone, PartialEq)]
pub struct BoolLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The value.
    pub value: bool,
}

/// Numeric literal.
#[derive(Debug, Clone, PartialEq)]
pub struct NumLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The value.
    pub value: f64,
}

/// String literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLit {
    /// Source location.
    pub loc: SourceLocation,
    /// Cooked contents (escapes resolved).
    pub value: String,
}

/// `/pattern/flags`
#[derive(Debug, Clone, PartialEq)]
pub struct RegExpLit {
    /// Source location.
    pub loc: SourceLocation,
    /// Text between the slashes.
    pub pattern: String,
    /// Flag letters.
    pub flags: String,
}

/// `this`
#[derive(Debug, Clone, PartialEq)]
pub struct ThisExpr {
    /// Source location.
    pub loc: SourceLocation,
}

/// `super`
#[derive(Debug, Clone, PartialEq)]
pub struct SuperExpr {
    /// Source location.
    pub loc: SourceLocation,
}

/// `new.target`
#[derive(Debug, Clone, PartialEq)]
pub struct NewTargetExpr {
    /// Source location.
    pub loc: SourceLocation,
}

/// `[elements]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements; `None` is a hole.
    pub elements: Vec<Option<Expr>>,
}

/// `{ properties }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Property list.
    pub properties: Vec<ObjectProp>,
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    /// Value, shorthand, method or accessor.
    Prop(Box<Prop>),
    /// `...expr`
    Spread(SpreadElement),
}

/// A property definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// Source location.
    pub loc: SourceLocation,
    /// The key.
    pub key: PropKey,
    /// What the property defines.
    pub kind: PropKind,
    /// The value; a [`Function`] for methods and accessors, an identifier
    /// reference for shorthands.
    pub value: Box<Expr>,
}

/// Object literal or object pattern key.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    /// Identifier name (reserved words included).
    Ident(String),
    /// String literal key.
    Str(String),
    /// Numeric literal key.
    Num(f64),
    /// `[expr]`
    Computed(Box<Expr>),
}

impl From<PropertyKey<Expr>> for PropKey {
    fn from(key: PropertyKey<Expr>) -> Self {
        match key {
            PropertyKey::Identifier(name) => PropKey::Ident(name),
            PropertyKey::String(value) => PropKey::Str(value),
            PropertyKey::Number(value) => PropKey::Num(value),
            PropertyKey::Computed(expr) => PropKey::Computed(Box::new(expr)),
        }
    }
}

/// `...argument`
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadElement {
    /// Source location.
    pub loc: SourceLocation,
    /// The spread operand.
    pub argument: Box<Expr>,
}

/// `op argument`
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The operator.
    pub operator: UnaryOp,
    /// The operand.
    pub argument: Box<Expr>,
}

/// `++x`, `x--`, …
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Increment or decrement.
    pub operator: UpdateOp,
    /// `true` for the prefix form.
    pub prefix: bool,
    /// The updated location.
    pub argument: Box<Expr>,
}

/// `left op right`
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The operator.
    pub operator: BinaryOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// `test ? consequent : alternate`
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Value when true.
    pub consequent: Box<Expr>,
    /// Value when false.
    pub alternate: Box<Expr>,
}

/// `target op value`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The operator; always [`AssignOp::Assign`] for patterns.
    pub operator: AssignOp,
    /// What is assigned to.
    pub target: AssignTarget,
    /// The assigned value.
    pub value: Box<Expr>,
}

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// Identifier or member expression.
    Expr(Box<Expr>),
    /// Destructuring pattern.
    Pat(Box<Pat>),
}

/// `a, b, c`
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The expressions, in order.
    pub expressions: Vec<Expr>,
}

/// `object.property` / `object[expr]`
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The object.
    pub object: Box<Expr>,
    /// The property.
    pub property: MemberProp,
}

/// The property part of a [`MemberExpr`].
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `.name`
    Ident(Ident),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// `callee(arguments)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The callee.
    pub callee: Box<Expr>,
    /// Arguments; spreads are [`Expr::Spread`].
    pub arguments: Vec<Expr>,
}

/// `new callee(arguments)`
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The constructor.
    pub callee: Box<Expr>,
    /// `None` when the parentheses were omitted.
    pub arguments: Option<Vec<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// A binding or assignment pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    /// A bound name.
    Ident(Ident),
    /// `[a, , b = 1, ...rest]`
    Array(Box<ArrayPat>),
    /// `{a, b: c = 1}`
    Object(Box<ObjectPat>),
    /// An assignable expression inside an assignment pattern.
    Expr(Box<Expr>),
}

impl Pat {
    /// Returns the source location of this pattern.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pat::Ident(p) => p.loc,
            Pat::Array(p) => p.loc,
            Pat::Object(p) => p.loc,
            Pat::Expr(e) => e.loc(),
        }
    }
}

/// `[elements, ...rest]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements; `None` is a hole.
    pub elements: Vec<Option<PatElement>>,
    /// The rest element.
    pub rest: Option<Box<Pat>>,
}

/// `target = default` inside an array pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatElement {
    /// Source location.
    pub loc: SourceLocation,
    /// The nested target.
    pub target: Pat,
    /// Default value.
    pub default: Option<Expr>,
}

/// `{ properties }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Property entries.
    pub properties: Vec<PatProp>,
}

/// `key: target = default`, or a shorthand `name = default`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatProp {
    /// Source location.
    pub loc: SourceLocation,
    /// The property key.
    pub key: PropKey,
    /// The nested target.
    pub target: Pat,
    /// Default value.
    pub default: Option<Expr>,
    /// `{ name }` form.
    pub shorthand: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// TreeBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the owned tree defined in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    fn function(parts: FunctionParts<Self>) -> Function {
        let id = parts.name.map(|name| Ident { loc: parts.span, name });
        let params = parts
            .params
            .into_iter()
            .map(|param| Param {
                loc: param.span,
                pat: param.pattern,
                default: param.default,
                is_rest: param.is_rest,
            })
            .collect();
        let body = match parts.body {
            builder::FunctionBody::Block(statements) => FunctionBody::Block(statements),
            builder::FunctionBody::Expression(expr) => FunctionBody::Expression(Box::new(expr)),
        };
        Function {
            loc: parts.span,
            id,
            params,
            body,
            mode: parts.mode,
            parse_type: parts.parse_type,
            constructor_kind: parts.constructor_kind,
            params_begin: parts.params_begin,
            body_loc: parts.body_span,
            scope: parts.scope,
        }
    }

    /// The parser only hands declaration statements to the `for` factories.
    fn var_decl(stmt: Stmt) -> VarDecl {
        match stmt {
            Stmt::VarDecl(decl) => decl,
            other => VarDecl {
                loc: other.loc(),
                kind: VarKind::Var,
                declarations: Vec::new(),
            },
        }
    }

    fn block(stmt: Stmt) -> BlockStmt {
        match stmt {
            Stmt::Block(block) => block,
            other => BlockStmt {
                loc: other.loc(),
                body: vec![other],
                scope: VariableEnvironment::default(),
            },
        }
    }

    fn for_in_of_left(head: ForHead<Self>) -> ForInOfLeft {
        match head {
            ForHead::Declaration(stmt) => ForInOfLeft::VarDecl(Self::var_decl(stmt)),
            ForHead::Target(expr) => ForInOfLeft::Target(Box::new(expr)),
            ForHead::Pattern(pattern) => ForInOfLeft::Pattern(pattern),
        }
    }
}

impl AstBuilder for TreeBuilder {
    type Expression = Expr;
    type Statement = Stmt;
    type Pattern = Pat;
    type Property = ObjectProp;
    type Program = Program;

    // ── Read-back ───────────────────────────────────────────────────────────

    fn resolve_name<'e>(&self, expr: &'e Expr) -> Option<&'e str> {
        match expr {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }

    fn is_location(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Ident(_) | Expr::Member(_))
    }

    fn is_directive(&self, stmt: &Stmt) -> bool {
        matches!(stmt, Stmt::Expr(s) if matches!(*s.expr, Expr::Str(_)))
    }

    // ── Primary expressions ─────────────────────────────────────────────────

    fn create_this(&mut self, loc: Span) -> Expr {
        Expr::This(ThisExpr { loc })
    }

    fn create_resolve(&mut self, loc: Span, name: &str) -> Expr {
        Expr::Ident(Ident {
            loc,
            name: name.to_owned(),
        })
    }

    fn create_null(&mut self, loc: Span) -> Expr {
        Expr::Null(NullLit { loc })
    }

    fn create_boolean(&mut self, loc: Span, value: bool) -> Expr {
        Expr::Bool(BoolLit { loc, value })
    }

    fn create_number(&mut self, loc: Span, value: f64) -> Expr {
        Expr::Num(NumLit { loc, value })
    }

    fn create_string(&mut self, loc: Span, value: String) -> Expr {
        Expr::Str(StringLit { loc, value })
    }

    fn create_regexp(&mut self, loc: Span, pattern: String, flags: String) -> Expr {
        Expr::RegExp(RegExpLit { loc, pattern, flags })
    }

    fn create_array(&mut self, loc: Span, elements: Vec<Option<Expr>>) -> Expr {
        Expr::Array(Box::new(ArrayExpr { loc, elements }))
    }

    fn create_object(&mut self, loc: Span, properties: Vec<ObjectProp>) -> Expr {
        Expr::Object(Box::new(ObjectExpr { loc, properties }))
    }

    fn create_property(&mut self, loc: Span, key: PropertyKey<Expr>, kind: PropKind, value: Expr) -> ObjectProp {
        ObjectProp::Prop(Box::new(Prop {
            loc,
            key: key.into(),
            kind,
            value: Box::new(value),
        }))
    }

    fn create_spread_property(&mut self, loc: Span, argument: Expr) -> ObjectProp {
        ObjectProp::Spread(SpreadElement {
            loc,
            argument: Box::new(argument),
        })
    }

    fn create_spread(&mut self, loc: Span, argument: Expr) -> Expr {
        Expr::Spread(Box::new(SpreadElement {
            loc,
            argument: Box::new(argument),
        }))
    }

    fn create_function_expression(&mut self, function: FunctionParts<Self>) -> Expr {
        Expr::Function(Box::new(Self::function(function)))
    }

    // ── Operators ───────────────────────────────────────────────────────────

    fn create_unary(&mut self, loc: Span, operator: UnaryOp, argument: Expr) -> Expr {
        Expr::Unary(Box::new(UnaryExpr {
            loc,
            operator,
            argument: Box::new(argument),
        }))
    }

    fn create_update(&mut self, loc: Span, operator: UpdateOp, prefix: bool, argument: Expr) -> Expr {
        Expr::Update(Box::new(UpdateExpr {
            loc,
            operator,
            prefix,
            argument: Box::new(argument),
        }))
    }

    fn create_binary(&mut self, loc: Span, operator: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(Box::new(BinaryExpr {
            loc,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    fn create_conditional(&mut self, loc: Span, test: Expr, consequent: Expr, alternate: Expr) -> Expr {
        Expr::Conditional(Box::new(ConditionalExpr {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn create_assignment(&mut self, loc: Span, operator: AssignOp, target: Expr, value: Expr) -> Expr {
        Expr::Assign(Box::new(AssignExpr {
            loc,
            operator,
            target: AssignTarget::Expr(Box::new(target)),
            value: Box::new(value),
        }))
    }

    fn create_destructuring_assignment(&mut self, loc: Span, target: Pat, value: Expr) -> Expr {
        Expr::Assign(Box::new(AssignExpr {
            loc,
            operator: AssignOp::Assign,
            target: AssignTarget::Pat(Box::new(target)),
            value: Box::new(value),
        }))
    }

    fn create_sequence(&mut self, loc: Span, expressions: Vec<Expr>) -> Expr {
        Expr::Sequence(Box::new(SequenceExpr { loc, expressions }))
    }

    // ── Member access and calls ─────────────────────────────────────────────

    fn create_member(&mut self, loc: Span, object: Expr, name: String) -> Expr {
        // The name's own location is not tracked separately.
        Expr::Member(Box::new(MemberExpr {
            loc,
            object: Box::new(object),
            property: MemberProp::Ident(Ident { loc, name }),
        }))
    }

    fn create_computed_member(&mut self, loc: Span, object: Expr, index: Expr) -> Expr {
        Expr::Member(Box::new(MemberExpr {
            loc,
            object: Box::new(object),
            property: MemberProp::Computed(Box::new(index)),
        }))
    }

    fn create_call(&mut self, loc: Span, callee: Expr, arguments: Vec<Expr>) -> Expr {
        Expr::Call(Box::new(CallExpr {
            loc,
            callee: Box::new(callee),
            arguments,
        }))
    }

    fn create_new(&mut self, loc: Span, callee: Expr, arguments: Option<Vec<Expr>>) -> Expr {
        Expr::New(Box::new(NewExpr {
            loc,
            callee: Box::new(callee),
            arguments,
        }))
    }

    fn create_super(&mut self, loc: Span) -> Expr {
        Expr::Super(SuperExpr { loc })
    }

    fn create_new_target(&mut self, loc: Span) -> Expr {
        Expr::NewTarget(NewTargetExpr { loc })
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn create_binding(&mut self, loc: Span, name: &str) -> Pat {
        Pat::Ident(Ident {
            loc,
            name: name.to_owned(),
        })
    }

    fn create_assignment_target(&mut self, _loc: Span, target: Expr) -> Pat {
        Pat::Expr(Box::new(target))
    }

    fn create_array_pattern(
        &mut self,
        loc: Span,
        elements: Vec<Option<PatternElement<Self>>>,
        rest: Option<Pat>,
    ) -> Pat {
        let elements = elements
            .into_iter()
            .map(|element| {
                element.map(|element| PatElement {
                    loc: element.span,
                    target: element.target,
                    default: element.default,
                })
            })
            .collect();
        Pat::Array(Box::new(ArrayPat {
            loc,
            elements,
            rest: rest.map(Box::new),
        }))
    }

    fn create_object_pattern(&mut self, loc: Span, properties: Vec<PatternProperty<Self>>) -> Pat {
        let properties = properties
            .into_iter()
            .map(|property| PatProp {
                loc: property.span,
                key: property.key.into(),
                target: property.target,
                default: property.default,
                shorthand: property.shorthand,
            })
            .collect();
        Pat::Object(Box::new(ObjectPat { loc, properties }))
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn create_block(&mut self, loc: Span, body: Vec<Stmt>, scope: VariableEnvironment) -> Stmt {
        Stmt::Block(BlockStmt { loc, body, scope })
    }

    fn create_var_declaration(&mut self, loc: Span, kind: VarKind, declarators: Vec<Declarator<Self>>) -> Stmt {
        let declarations = declarators
            .into_iter()
            .map(|declarator| VarDeclarator {
                loc: declarator.span,
                id: declarator.target,
                init: declarator.init.map(Box::new),
            })
            .collect();
        Stmt::VarDecl(VarDecl {
            loc,
            kind,
            declarations,
        })
    }

    fn create_function_declaration(&mut self, function: FunctionParts<Self>) -> Stmt {
        Stmt::FunctionDecl(Box::new(Self::function(function)))
    }

    fn create_expression_statement(&mut self, loc: Span, expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt {
            loc,
            expr: Box::new(expr),
        })
    }

    fn create_if(&mut self, loc: Span, test: Expr, consequent: Stmt, alternate: Option<Stmt>) -> Stmt {
        Stmt::If(IfStmt {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
        })
    }

    fn create_for(
        &mut self,
        loc: Span,
        init: Option<builder::ForInit<Self>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Stmt,
        scope: VariableEnvironment,
    ) -> Stmt {
        let init = init.map(|init| match init {
            builder::ForInit::Declaration(stmt) => ForInit::VarDecl(Self::var_decl(stmt)),
            builder::ForInit::Expression(expr) => ForInit::Expr(Box::new(expr)),
        });
        Stmt::For(ForStmt {
            loc,
            init,
            test: test.map(Box::new),
            update: update.map(Box::new),
            body: Box::new(body),
            scope,
        })
    }

    fn create_for_in(
        &mut self,
        loc: Span,
        left: ForHead<Self>,
        right: Expr,
        body: Stmt,
        scope: VariableEnvironment,
    ) -> Stmt {
        Stmt::ForIn(ForInStmt {
            loc,
            left: Self::for_in_of_left(left),
            right: Box::new(right),
            body: Box::new(body),
            scope,
        })
    }

    fn create_for_of(
        &mut self,
        loc: Span,
        left: ForHead<Self>,
        right: Expr,
        body: Stmt,
        scope: VariableEnvironment,
    ) -> Stmt {
        Stmt::ForOf(ForOfStmt {
            loc,
            left: Self::for_in_of_left(left),
            right: Box::new(right),
            body: Box::new(body),
            scope,
        })
    }

    fn create_while(&mut self, loc: Span, test: Expr, body: Stmt) -> Stmt {
        Stmt::While(WhileStmt {
            loc,
            test: Box::new(test),
            body: Box::new(body),
        })
    }

    fn create_do_while(&mut self, loc: Span, body: Stmt, test: Expr) -> Stmt {
        Stmt::DoWhile(DoWhileStmt {
            loc,
            body: Box::new(body),
            test: Box::new(test),
        })
    }

    fn create_switch(
        &mut self,
        loc: Span,
        discriminant: Expr,
        cases: Vec<SwitchClause<Self>>,
        scope: VariableEnvironment,
    ) -> Stmt {
        let cases = cases
            .into_iter()
            .map(|clause| SwitchCase {
                loc: clause.span,
                test: clause.test.map(Box::new),
                consequent: clause.body,
            })
            .collect();
        Stmt::Switch(SwitchStmt {
            loc,
            discriminant: Box::new(discriminant),
            cases,
            scope,
        })
    }

    fn create_try(
        &mut self,
        loc: Span,
        block: Stmt,
        handler: Option<CatchParts<Self>>,
        finalizer: Option<Stmt>,
    ) -> Stmt {
        let handler = handler.map(|clause| CatchClause {
            loc: clause.span,
            param: clause.param,
            body: Self::block(clause.body),
        });
        Stmt::Try(TryStmt {
            loc,
            block: Self::block(block),
            handler,
            finalizer: finalizer.map(Self::block),
        })
    }

    fn create_return(&mut self, loc: Span, argument: Option<Expr>) -> Stmt {
        Stmt::Return(ReturnStmt {
            loc,
            argument: argument.map(Box::new),
        })
    }

    fn create_throw(&mut self, loc: Span, argument: Expr) -> Stmt {
        Stmt::Throw(ThrowStmt {
            loc,
            argument: Box::new(argument),
        })
    }

    fn create_break(&mut self, loc: Span, label: Option<String>) -> Stmt {
        Stmt::Break(BreakStmt {
            loc,
            label: label.map(|name| Ident { loc, name }),
        })
    }

    fn create_continue(&mut self, loc: Span, label: Option<String>) -> Stmt {
        Stmt::Continue(ContinueStmt {
            loc,
            label: label.map(|name| Ident { loc, name }),
        })
    }

    fn create_labeled(&mut self, loc: Span, label: String, body: Stmt) -> Stmt {
        Stmt::Labeled(LabeledStmt {
            loc,
            label: Ident { loc, name: label },
            body: Box::new(body),
        })
    }

    fn create_with(&mut self, loc: Span, object: Expr, body: Stmt) -> Stmt {
        Stmt::With(WithStmt {
            loc,
            object: Box::new(object),
            body: Box::new(body),
        })
    }

    fn create_debugger(&mut self, loc: Span) -> Stmt {
        Stmt::Debugger(DebuggerStmt { loc })
    }

    fn create_empty(&mut self, loc: Span) -> Stmt {
        Stmt::Empty(EmptyStmt { loc })
    }

    // ── Program ─────────────────────────────────────────────────────────────

    fn create_program(&mut self, loc: Span, mode: SourceParseMode, body: Vec<Stmt>, scope: FunctionScopeInfo) -> Program {
        let source_type = if mode == SourceParseMode::Module {
            SourceType::Module
        } else {
            SourceType::Script
        };
        Program {
            loc,
            source_type,
            body,
            strict: scope.strict_mode,
            scope,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::Position;

    fn loc(start: usize, end: usize) -> SourceLocation {
        Span::new(
            Position {
                offset: start,
                line: 1,
                column: start as u32 + 1,
            },
            Position {
                offset: end,
                line: 1,
                column: end as u32 + 1,
            },
        )
    }

    #[test]
    fn test_locations_and_classification() {
        let mut builder = TreeBuilder;
        let object = builder.create_resolve(loc(0, 1), "o");
        let member = builder.create_member(loc(0, 3), object, "p".to_owned());
        assert_eq!(member.loc(), loc(0, 3));
        assert!(builder.is_location(&member));
        assert!(!builder.is_resolve(&member));

        let call = builder.create_call(loc(0, 5), member, Vec::new());
        assert!(!builder.is_location(&call));

        let name = builder.create_resolve(loc(6, 7), "x");
        assert_eq!(builder.resolve_name(&name), Some("x"));
    }

    #[test]
    fn test_directive_shape() {
        let mut builder = TreeBuilder;
        let string = builder.create_string(loc(0, 12), "use strict".to_owned());
        let directive = builder.create_expression_statement(loc(0, 13), string);
        assert!(builder.is_directive(&directive));

        let number = builder.create_number(loc(0, 1), 1.0);
        let other = builder.create_expression_statement(loc(0, 2), number);
        assert!(!builder.is_directive(&other));
    }

    #[test]
    fn test_non_block_statements_are_wrapped() {
        let mut builder = TreeBuilder;
        let empty = builder.create_empty(loc(4, 5));
        let block = TreeBuilder::block(empty.clone());
        assert_eq!(block.body, vec![empty]);
        assert_eq!(block.loc, loc(4, 5));
    }

    #[test]
    fn test_property_keys_convert() {
        assert_eq!(PropKey::from(PropertyKey::<Expr>::Identifier("a".to_owned())), PropKey::Ident("a".to_owned()));
        assert_eq!(PropKey::from(PropertyKey::<Expr>::Number(2.0)), PropKey::Num(2.0));
    }

    #[test]
    fn test_program_source_type() {
        let mut builder = TreeBuilder;
        let program = builder.create_program(loc(0, 0), SourceParseMode::Module, Vec::new(), FunctionScopeInfo::default());
        assert_eq!(program.source_type, SourceType::Module);
        assert!(program.body.is_empty());
    }
}
