//! Parse configuration.

/// What kind of code a function-like body is being parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceParseMode {
    /// A classic script.
    #[default]
    Program,
    /// An ES module: always strict.
    Module,
    /// A plain `function` declaration or expression.
    NormalFunction,
    /// A `get name() {}` accessor.
    Getter,
    /// A `set name(v) {}` accessor.
    Setter,
    /// A concise object-literal method `name() {}`.
    Method,
    /// An arrow function.
    ArrowFunction,
}

impl SourceParseMode {
    /// Modes whose body may reference `super.x`.
    pub fn is_method_like(self) -> bool {
        matches!(self, Self::Getter | Self::Setter | Self::Method)
    }
}

/// Whether a function is written with `function`/method syntax or as an
/// arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionParseType {
    /// Ordinary function or method body in braces.
    #[default]
    Normal,
    /// Arrow function; the body may be a single expression.
    Arrow,
}

/// Constructor flavour of the function being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorKind {
    /// Not a class constructor.
    #[default]
    None,
    /// Constructor of a class without `extends`.
    Base,
    /// Constructor of a class with `extends`; may call `super(...)`.
    Derived,
}

/// Options for parsing a whole [`SourceText`](crate::source::SourceText).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// [`SourceParseMode::Program`] or [`SourceParseMode::Module`].
    pub mode: SourceParseMode,
    /// Start in strict mode even without a `"use strict"` directive.
    pub strict: bool,
    /// Constructor kind of the top-level code; only meaningful when the
    /// source is re-parsed as part of a class body.
    pub constructor_kind: ConstructorKind,
}

impl ParseOptions {
    /// Options for a module: module code is always strict.
    pub fn module() -> Self {
        Self {
            mode: SourceParseMode::Module,
            strict: true,
            constructor_kind: ConstructorKind::None,
        }
    }

    /// Whether parsing starts in strict mode.
    pub fn starts_strict(&self) -> bool {
        self.strict || self.mode == SourceParseMode::Module
    }
}

/// Options for re-parsing a single function from its `(params) { body }`
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParseOptions {
    /// Function mode; must not be `Program` or `Module`.
    pub mode: SourceParseMode,
    /// Arrow or normal syntax.
    pub parse_type: FunctionParseType,
    /// Constructor flavour.
    pub constructor_kind: ConstructorKind,
    /// Whether the enclosing code was strict.
    pub strict: bool,
    /// Name the function was declared with, if any.
    pub name: Option<String>,
}

impl Default for FunctionParseOptions {
    fn default() -> Self {
        Self {
            mode: SourceParseMode::NormalFunction,
            parse_type: FunctionParseType::Normal,
            constructor_kind: ConstructorKind::None,
            strict: false,
            name: None,
        }
    }
}
