//! Scope tracking and closure-capture analysis, performed inline while
//! parsing.
//!
//! # Overview
//!
//! The parser keeps a [`ScopeStack`] of [`ParserScope`] frames: one for the
//! program, one per function, and one per block, loop head, `switch` and
//! `catch` clause.  Each frame records
//!
//! - the names it **declares** (`var`/parameter/catch bindings in
//!   `declared_variables`, `let`/`const` in `lexical_variables`),
//! - the names it **uses** and **writes**, and
//! - the names referenced from a nested function that are not declared
//!   locally (`closed_variables`).
//!
//! When a frame is popped, every used name it does not declare escapes into
//! its parent; if the frame was a function the name is also recorded as
//! *closed* in the parent.  A closed name that reaches the frame declaring it
//! marks that binding captured.
//!
//! # Hoisting
//!
//! `var` declarations walk up the stack to the nearest frame that allows
//! them (a function or the program); `let`/`const` land in the nearest frame
//! that allows lexical declarations.  Clashes between the two within one
//! environment are reported as [`DeclarationResult::INVALID_DUPLICATED`].

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use super::options::{ConstructorKind, SourceParseMode};

// ─────────────────────────────────────────────────────────────────────────────
// VariableEntry
// ─────────────────────────────────────────────────────────────────────────────

/// Per-identifier trait bits of a [`VariableEnvironment`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariableEntry {
    bits: u8,
}

impl VariableEntry {
    const IS_VAR: u8 = 1 << 0;
    const IS_LET: u8 = 1 << 1;
    const IS_CONST: u8 = 1 << 2;
    const IS_CAPTURED: u8 = 1 << 3;
    const IS_EXPORTED: u8 = 1 << 4;
    const IS_IMPORTED: u8 = 1 << 5;
    const IS_IMPORTED_NAMESPACE: u8 = 1 << 6;

    fn has(self, bit: u8) -> bool {
        self.bits & bit != 0
    }

    /// `var`, parameter or catch binding.
    pub fn is_var(self) -> bool {
        self.has(Self::IS_VAR)
    }

    /// `let` binding.
    pub fn is_let(self) -> bool {
        self.has(Self::IS_LET)
    }

    /// `const` binding.
    pub fn is_const(self) -> bool {
        self.has(Self::IS_CONST)
    }

    /// Referenced from a nested function.
    pub fn is_captured(self) -> bool {
        self.has(Self::IS_CAPTURED)
    }

    /// Exported from a module.
    pub fn is_exported(self) -> bool {
        self.has(Self::IS_EXPORTED)
    }

    /// Bound by an import declaration.
    pub fn is_imported(self) -> bool {
        self.has(Self::IS_IMPORTED)
    }

    /// Bound by `import * as name`.
    pub fn is_imported_namespace(self) -> bool {
        self.has(Self::IS_IMPORTED_NAMESPACE)
    }

    /// Mark as a `var` binding.
    pub fn set_is_var(&mut self) {
        self.bits |= Self::IS_VAR;
    }

    /// Mark as a `let` binding.
    pub fn set_is_let(&mut self) {
        self.bits |= Self::IS_LET;
    }

    /// Mark as a `const` binding.
    pub fn set_is_const(&mut self) {
        self.bits |= Self::IS_CONST;
    }

    /// Mark as captured by a closure.
    pub fn set_is_captured(&mut self) {
        self.bits |= Self::IS_CAPTURED;
    }

    /// Mark as exported.
    pub fn set_is_exported(&mut self) {
        self.bits |= Self::IS_EXPORTED;
    }

    /// Mark as imported.
    pub fn set_is_imported(&mut self) {
        self.bits |= Self::IS_IMPORTED;
    }

    /// Mark as an imported namespace object.
    pub fn set_is_imported_namespace(&mut self) {
        self.bits |= Self::IS_IMPORTED_NAMESPACE;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// VariableEnvironment
// ─────────────────────────────────────────────────────────────────────────────

/// An insertion-ordered map from names to [`VariableEntry`] traits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableEnvironment {
    entries: Vec<(String, VariableEntry)>,
    index: HashMap<String, usize>,
    is_everything_captured: bool,
}

impl VariableEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` (if absent) and return its entry and whether it was new.
    pub fn add(&mut self, name: &str) -> (&mut VariableEntry, bool) {
        let (slot, is_new) = match self.index.get(name) {
            Some(&slot) => (slot, false),
            None => {
                let slot = self.entries.len();
                let mut entry = VariableEntry::default();
                if self.is_everything_captured {
                    entry.set_is_captured();
                }
                self.entries.push((name.to_owned(), entry));
                self.index.insert(name.to_owned(), slot);
                (slot, true)
            }
        };
        (&mut self.entries[slot].1, is_new)
    }

    /// Look up `name`.
    pub fn find(&self, name: &str) -> Option<VariableEntry> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    /// Mutable lookup of `name`.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut VariableEntry> {
        let slot = *self.index.get(name)?;
        Some(&mut self.entries[slot].1)
    }

    /// Returns `true` if `name` is bound here.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), *entry))
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Mark `name` captured if it is bound here.
    pub fn mark_variable_as_captured(&mut self, name: &str) {
        if let Some(entry) = self.find_mut(name) {
            entry.set_is_captured();
        }
    }

    /// Conservatively capture every current and future binding.
    pub fn mark_all_variables_as_captured(&mut self) {
        self.is_everything_captured = true;
        for (_, entry) in &mut self.entries {
            entry.set_is_captured();
        }
    }

    /// Set when the owning scope uses `eval`, `with` or needs a full
    /// activation.
    pub fn is_everything_captured(&self) -> bool {
        self.is_everything_captured
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DeclarationResult
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome flags of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclarationResult(u8);

impl DeclarationResult {
    /// The declaration is legal.
    pub const VALID: Self = Self(0);
    /// The name may not be bound in strict mode code.
    pub const INVALID_STRICT_MODE: Self = Self(1);
    /// The name is already bound in a conflicting way.
    pub const INVALID_DUPLICATED: Self = Self(2);

    /// No flag is set.
    pub fn is_valid(self) -> bool {
        self.0 == 0
    }

    /// All flags of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DeclarationResult {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DeclarationResult {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The declaring keyword of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `var` (and sloppy-mode function declarations).
    Var,
    /// `let` (and strict-mode block-level function declarations).
    Let,
    /// `const`.
    Const,
}

/// Names that may not be bound in strict mode code.
pub fn is_eval_or_arguments(name: &str) -> bool {
    name == "eval" || name == "arguments"
}

// ─────────────────────────────────────────────────────────────────────────────
// ParserScope
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    name: String,
    is_loop: bool,
}

/// Variables a function's closures capture, and whether parameters or
/// `arguments` may be observably modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedVariables {
    /// Captured names, in declaration order.
    pub names: Vec<String>,
    /// A parameter is written somewhere (or may be, through `eval`).
    pub modified_parameter: bool,
    /// `arguments` is shadowed or written.
    pub modified_arguments: bool,
}

/// One frame of the scope stack.
#[derive(Debug, Clone)]
pub struct ParserScope {
    declared_variables: VariableEnvironment,
    lexical_variables: VariableEnvironment,
    declared_parameters: Vec<String>,
    /// `var` names hoisted through this scope to an outer function scope.
    hoisted_var_names: HashSet<String>,
    used_variables: HashSet<String>,
    written_variables: HashSet<String>,
    closed_variables: HashSet<String>,
    labels: SmallVec<[Label; 2]>,
    loop_depth: u32,
    switch_depth: u32,
    is_function: bool,
    is_function_boundary: bool,
    is_lexical_scope: bool,
    is_arrow_function: bool,
    strict_mode: bool,
    is_valid_strict_mode: bool,
    needs_full_activation: bool,
    uses_eval: bool,
    shadows_arguments: bool,
    has_direct_super: bool,
    needs_super_binding: bool,
    has_duplicate_parameter: bool,
    binds_own_name: bool,
    allows_var_declarations: bool,
    allows_lexical_declarations: bool,
    mode: SourceParseMode,
    constructor_kind: ConstructorKind,
    function_name: Option<String>,
}

impl ParserScope {
    fn base(strict_mode: bool) -> Self {
        Self {
            declared_variables: VariableEnvironment::new(),
            lexical_variables: VariableEnvironment::new(),
            declared_parameters: Vec::new(),
            hoisted_var_names: HashSet::new(),
            used_variables: HashSet::new(),
            written_variables: HashSet::new(),
            closed_variables: HashSet::new(),
            labels: SmallVec::new(),
            loop_depth: 0,
            switch_depth: 0,
            is_function: false,
            is_function_boundary: false,
            is_lexical_scope: false,
            is_arrow_function: false,
            strict_mode,
            is_valid_strict_mode: true,
            needs_full_activation: false,
            uses_eval: false,
            shadows_arguments: false,
            has_direct_super: false,
            needs_super_binding: false,
            has_duplicate_parameter: false,
            binds_own_name: false,
            allows_var_declarations: false,
            allows_lexical_declarations: false,
            mode: SourceParseMode::Program,
            constructor_kind: ConstructorKind::None,
            function_name: None,
        }
    }

    /// The top-level scope of a script or module.
    pub fn program(mode: SourceParseMode, strict_mode: bool) -> Self {
        Self {
            is_function_boundary: true,
            allows_var_declarations: true,
            allows_lexical_declarations: true,
            mode,
            ..Self::base(strict_mode)
        }
    }

    /// The scope of a function body and its parameters.
    pub fn function(
        mode: SourceParseMode,
        constructor_kind: ConstructorKind,
        name: Option<&str>,
        strict_mode: bool,
    ) -> Self {
        let mut scope = Self {
            is_function: true,
            is_function_boundary: true,
            is_arrow_function: mode == SourceParseMode::ArrowFunction,
            allows_var_declarations: true,
            allows_lexical_declarations: true,
            mode,
            constructor_kind,
            function_name: name.map(str::to_owned),
            ..Self::base(strict_mode)
        };
        if name.is_some_and(is_eval_or_arguments) {
            scope.is_valid_strict_mode = false;
        }
        scope
    }

    /// Override the constructor kind, for top-level code re-parsed as part
    /// of a class constructor.
    pub fn with_constructor_kind(mut self, constructor_kind: ConstructorKind) -> Self {
        self.constructor_kind = constructor_kind;
        self
    }

    /// A block, loop head, `switch` or `catch` scope.
    pub fn lexical(strict_mode: bool) -> Self {
        Self {
            is_lexical_scope: true,
            allows_lexical_declarations: true,
            ..Self::base(strict_mode)
        }
    }

    // ── Traits ──────────────────────────────────────────────────────────────

    /// A function scope (not the program).
    pub fn is_function(&self) -> bool {
        self.is_function
    }

    /// A function or program scope: labels and `var` stop here.
    pub fn is_function_boundary(&self) -> bool {
        self.is_function_boundary
    }

    /// A block-like scope.
    pub fn is_lexical_scope(&self) -> bool {
        self.is_lexical_scope
    }

    /// An arrow function scope.
    pub fn is_arrow_function(&self) -> bool {
        self.is_arrow_function
    }

    /// Code in this scope is strict.
    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Switch this scope to strict mode.
    pub fn set_strict_mode(&mut self) {
        self.strict_mode = true;
    }

    /// No binding seen so far is illegal under strict mode.
    pub fn is_valid_strict_mode(&self) -> bool {
        self.is_valid_strict_mode
    }

    /// `with` or similar forces every binding into the heap.
    pub fn needs_full_activation(&self) -> bool {
        self.needs_full_activation
    }

    /// Force a full activation.
    pub fn set_needs_full_activation(&mut self) {
        self.needs_full_activation = true;
    }

    /// `eval` is referenced in this scope or a nested one.
    pub fn uses_eval(&self) -> bool {
        self.uses_eval
    }

    /// A parameter or variable named `arguments` is declared.
    pub fn shadows_arguments(&self) -> bool {
        self.shadows_arguments
    }

    /// `super(...)` is called directly in this function.
    pub fn has_direct_super(&self) -> bool {
        self.has_direct_super
    }

    /// Record a direct `super(...)` call.
    pub fn set_has_direct_super(&mut self) {
        self.has_direct_super = true;
    }

    /// `super.x` or `super[x]` is used in this function.
    pub fn needs_super_binding(&self) -> bool {
        self.needs_super_binding
    }

    /// Record a `super` property access.
    pub fn set_needs_super_binding(&mut self) {
        self.needs_super_binding = true;
    }

    /// Two parameters share a name.
    pub fn has_duplicate_parameter(&self) -> bool {
        self.has_duplicate_parameter
    }

    /// A named function expression: its name is bound inside its own scope.
    pub fn set_binds_own_name(&mut self) {
        self.binds_own_name = true;
    }

    /// `var` declarations may land here.
    pub fn allows_var_declarations(&self) -> bool {
        self.allows_var_declarations
    }

    /// `let`/`const` declarations may land here.
    pub fn allows_lexical_declarations(&self) -> bool {
        self.allows_lexical_declarations
    }

    /// Function mode this scope was opened with.
    pub fn mode(&self) -> SourceParseMode {
        self.mode
    }

    /// Constructor flavour of this function.
    pub fn constructor_kind(&self) -> ConstructorKind {
        self.constructor_kind
    }

    /// Name the function was declared with.
    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    /// `var`/parameter/catch bindings.
    pub fn declared_variables(&self) -> &VariableEnvironment {
        &self.declared_variables
    }

    /// `let`/`const` bindings.
    pub fn lexical_variables(&self) -> &VariableEnvironment {
        &self.lexical_variables
    }

    /// Parameter names in order.
    pub fn declared_parameters(&self) -> &[String] {
        &self.declared_parameters
    }

    /// Names read in this scope or escaped from nested scopes.
    pub fn used_variables(&self) -> &HashSet<String> {
        &self.used_variables
    }

    /// Names written in this scope or escaped from nested scopes.
    pub fn written_variables(&self) -> &HashSet<String> {
        &self.written_variables
    }

    /// Names referenced from nested functions and not yet claimed.
    pub fn closed_variables(&self) -> &HashSet<String> {
        &self.closed_variables
    }

    /// Bound here, lexically or otherwise.
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared_variables.contains(name)
            || self.lexical_variables.contains(name)
            || (self.binds_own_name && self.function_name.as_deref() == Some(name))
    }

    // ── Declarations and references ─────────────────────────────────────────

    fn declare_parameter(&mut self, name: &str) -> DeclarationResult {
        let mut result = DeclarationResult::VALID;
        if is_eval_or_arguments(name) {
            self.is_valid_strict_mode = false;
            result |= DeclarationResult::INVALID_STRICT_MODE;
        }
        if name == "arguments" {
            self.shadows_arguments = true;
        }
        if self.declared_parameters.iter().any(|p| p == name) {
            self.has_duplicate_parameter = true;
            result |= DeclarationResult::INVALID_DUPLICATED;
        } else {
            self.declared_parameters.push(name.to_owned());
        }
        self.declared_variables.add(name).0.set_is_var();
        result
    }

    /// Record a read of `name`.
    pub fn use_variable(&mut self, name: &str) {
        if name == "eval" {
            self.uses_eval = true;
        }
        self.used_variables.insert(name.to_owned());
    }

    /// Record a write to `name`.
    pub fn write_variable(&mut self, name: &str) {
        self.written_variables.insert(name.to_owned());
    }

    /// Fold a popped child scope into this one.
    fn collect_free_variables(&mut self, nested: &ParserScope, track_closed: bool) {
        if nested.uses_eval {
            self.uses_eval = true;
        }
        let crosses_closure = nested.is_function_boundary || !nested.is_lexical_scope;
        for name in &nested.used_variables {
            if nested.is_declared(name) {
                continue;
            }
            self.used_variables.insert(name.clone());
            if track_closed && crosses_closure {
                self.closed_variables.insert(name.clone());
            }
        }
        for name in &nested.closed_variables {
            if nested.is_declared(name) {
                continue;
            }
            self.closed_variables.insert(name.clone());
        }
        for name in &nested.written_variables {
            if nested.is_declared(name) {
                continue;
            }
            self.written_variables.insert(name.clone());
        }
    }

    /// Resolve capture status of the bindings owned by this scope.
    ///
    /// Closed names bound here are claimed: their entries are marked captured
    /// and they stop propagating outward.
    pub fn finish_lexical_environment(&mut self) {
        if self.uses_eval || self.needs_full_activation {
            self.lexical_variables.mark_all_variables_as_captured();
            if self.is_lexical_scope {
                self.declared_variables.mark_all_variables_as_captured();
            }
            return;
        }
        let claimed: Vec<String> = self
            .closed_variables
            .iter()
            .filter(|name| {
                self.lexical_variables.contains(name)
                    || (self.is_lexical_scope && self.declared_variables.contains(name))
            })
            .cloned()
            .collect();
        for name in claimed {
            self.lexical_variables.mark_variable_as_captured(&name);
            if self.is_lexical_scope {
                self.declared_variables.mark_variable_as_captured(&name);
            }
            self.closed_variables.remove(&name);
        }
    }

    /// Compute the captured variables of a function or program scope and
    /// flag them in `declared_variables`.
    pub fn captured_variables(&mut self) -> CapturedVariables {
        if self.needs_full_activation || self.uses_eval {
            self.declared_variables.mark_all_variables_as_captured();
            return CapturedVariables {
                names: self.declared_variables.names().map(str::to_owned).collect(),
                modified_parameter: true,
                modified_arguments: false,
            };
        }

        let names: Vec<String> = self
            .declared_variables
            .names()
            .filter(|name| self.closed_variables.contains(*name))
            .map(str::to_owned)
            .collect();
        for name in &names {
            self.declared_variables.mark_variable_as_captured(name);
        }

        let mut modified_arguments = self.shadows_arguments;
        let mut modified_parameter = false;
        if !self.declared_parameters.is_empty() {
            for name in &self.written_variables {
                if name == "arguments" {
                    modified_arguments = true;
                }
                if self.declared_parameters.iter().any(|p| p == name) {
                    modified_parameter = true;
                }
            }
        }
        CapturedVariables {
            names,
            modified_parameter,
            modified_arguments,
        }
    }

    /// Finish a function or program scope and export its metadata.
    pub fn function_info(&mut self) -> FunctionScopeInfo {
        self.finish_lexical_environment();
        let captured = self.captured_variables();
        let mut written_variables: Vec<String> = self.written_variables.iter().cloned().collect();
        written_variables.sort();
        let mut free_variables: Vec<String> = self
            .used_variables
            .iter()
            .filter(|name| !self.is_declared(name))
            .cloned()
            .collect();
        free_variables.sort();
        FunctionScopeInfo {
            declared_variables: self.declared_variables.clone(),
            lexical_variables: self.lexical_variables.clone(),
            parameters: self.declared_parameters.clone(),
            captured_variables: captured.names,
            written_variables,
            free_variables,
            modified_parameter: captured.modified_parameter,
            modified_arguments: captured.modified_arguments,
            uses_eval: self.uses_eval,
            needs_full_activation: self.needs_full_activation,
            strict_mode: self.strict_mode,
            has_direct_super: self.has_direct_super,
            needs_super_binding: self.needs_super_binding,
        }
    }

    /// Finish a block-like scope and export its lexical environment.
    pub fn finish_block(&mut self) -> VariableEnvironment {
        self.finish_lexical_environment();
        self.lexical_variables.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FunctionScopeInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Scope metadata attached to every function and program node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionScopeInfo {
    /// `var`, parameter and function-declaration bindings.
    pub declared_variables: VariableEnvironment,
    /// Top-level `let`/`const` bindings of the body.
    pub lexical_variables: VariableEnvironment,
    /// Parameter names in order.
    pub parameters: Vec<String>,
    /// Declared names referenced from nested closures.
    pub captured_variables: Vec<String>,
    /// Names assigned anywhere in the function, sorted.
    pub written_variables: Vec<String>,
    /// Names referenced but not bound by this function, sorted.
    pub free_variables: Vec<String>,
    /// A parameter may be modified.
    pub modified_parameter: bool,
    /// `arguments` is shadowed or written.
    pub modified_arguments: bool,
    /// `eval` is referenced.
    pub uses_eval: bool,
    /// A `with` statement forces a full activation.
    pub needs_full_activation: bool,
    /// The function body is strict.
    pub strict_mode: bool,
    /// `super(...)` is called directly.
    pub has_direct_super: bool,
    /// `super.x` is used.
    pub needs_super_binding: bool,
}

impl FunctionScopeInfo {
    /// Returns `true` if `name` is declared (not lexically) and captured.
    pub fn is_captured(&self, name: &str) -> bool {
        self.declared_variables
            .find(name)
            .or_else(|| self.lexical_variables.find(name))
            .is_some_and(VariableEntry::is_captured)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopeStack
// ─────────────────────────────────────────────────────────────────────────────

/// The stack of scopes active at the current parse position.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ParserScope>,
}

impl ScopeStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push `scope` as the innermost scope.
    pub fn push_scope(&mut self, scope: ParserScope) {
        self.scopes.push(scope);
    }

    /// Push a block-like scope inheriting the current strictness.
    pub fn push_lexical_scope(&mut self) {
        let strict = self.strict_mode();
        self.scopes.push(ParserScope::lexical(strict));
    }

    /// Pop the innermost scope, folding its free variables into the parent.
    ///
    /// With `track_closed`, names escaping a function scope are also recorded
    /// as closed in the parent.
    pub fn pop_scope(&mut self, track_closed: bool) -> Option<ParserScope> {
        let popped = self.scopes.pop()?;
        if let Some(parent) = self.scopes.last_mut() {
            parent.collect_free_variables(&popped, track_closed);
        }
        Some(popped)
    }

    /// Drop scopes pushed after the stack had `depth` entries, without
    /// folding them into their parents.
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth);
    }

    /// The innermost scope.
    pub fn current(&self) -> Option<&ParserScope> {
        self.scopes.last()
    }

    /// The innermost scope, mutably.
    pub fn current_mut(&mut self) -> Option<&mut ParserScope> {
        self.scopes.last_mut()
    }

    /// The nearest function or program scope.
    pub fn current_function(&self) -> Option<&ParserScope> {
        self.scopes.iter().rev().find(|s| s.is_function_boundary)
    }

    /// The nearest function or program scope, mutably.
    pub fn current_function_mut(&mut self) -> Option<&mut ParserScope> {
        self.scopes.iter_mut().rev().find(|s| s.is_function_boundary)
    }

    /// The nearest non-arrow function scope; arrows inherit `super` and
    /// `new.target` from it.
    pub fn closest_non_arrow_function(&self) -> Option<&ParserScope> {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.is_function_boundary && !s.is_arrow_function)
    }

    /// Mutable form of [`closest_non_arrow_function`](Self::closest_non_arrow_function).
    pub fn closest_non_arrow_function_mut(&mut self) -> Option<&mut ParserScope> {
        self.scopes
            .iter_mut()
            .rev()
            .find(|s| s.is_function_boundary && !s.is_arrow_function)
    }

    /// Strictness of the innermost scope.
    pub fn strict_mode(&self) -> bool {
        self.current().is_some_and(ParserScope::strict_mode)
    }

    // ── Declarations ────────────────────────────────────────────────────────

    /// Declare `name` with `kind`, hoisting `var` to the nearest function or
    /// program scope.
    pub fn declare_variable(&mut self, name: &str, kind: DeclarationKind) -> DeclarationResult {
        let mut result = DeclarationResult::VALID;
        if is_eval_or_arguments(name) {
            result |= DeclarationResult::INVALID_STRICT_MODE;
        }
        match kind {
            DeclarationKind::Var => {
                let Some(target) = self.scopes.iter().rposition(|s| s.allows_var_declarations) else {
                    return result;
                };
                if self.scopes[target..]
                    .iter()
                    .any(|s| s.lexical_variables.contains(name))
                {
                    result |= DeclarationResult::INVALID_DUPLICATED;
                }
                for scope in &mut self.scopes[target + 1..] {
                    scope.hoisted_var_names.insert(name.to_owned());
                }
                let scope = &mut self.scopes[target];
                if name == "arguments" {
                    scope.shadows_arguments = true;
                }
                if is_eval_or_arguments(name) {
                    scope.is_valid_strict_mode = false;
                }
                scope.declared_variables.add(name).0.set_is_var();
            }
            DeclarationKind::Let | DeclarationKind::Const => {
                if name == "let" {
                    result |= DeclarationResult::INVALID_STRICT_MODE;
                }
                let Some(scope) = self
                    .scopes
                    .iter_mut()
                    .rev()
                    .find(|s| s.allows_lexical_declarations)
                else {
                    return result;
                };
                if scope.declared_variables.contains(name) || scope.hoisted_var_names.contains(name) {
                    result |= DeclarationResult::INVALID_DUPLICATED;
                }
                let (entry, is_new) = scope.lexical_variables.add(name);
                if !is_new {
                    result |= DeclarationResult::INVALID_DUPLICATED;
                }
                if kind == DeclarationKind::Const {
                    entry.set_is_const();
                } else {
                    entry.set_is_let();
                }
                if is_eval_or_arguments(name) {
                    scope.is_valid_strict_mode = false;
                }
            }
        }
        result
    }

    /// Declare a formal parameter of the innermost function.
    pub fn declare_parameter(&mut self, name: &str) -> DeclarationResult {
        match self.current_function_mut() {
            Some(scope) => scope.declare_parameter(name),
            None => DeclarationResult::VALID,
        }
    }

    /// Declare a `catch` parameter in the innermost (catch) scope.
    pub fn declare_catch_parameter(&mut self, name: &str) -> DeclarationResult {
        let Some(scope) = self.current_mut() else {
            return DeclarationResult::VALID;
        };
        let mut result = DeclarationResult::VALID;
        if is_eval_or_arguments(name) {
            result |= DeclarationResult::INVALID_STRICT_MODE;
        }
        let (entry, is_new) = scope.declared_variables.add(name);
        entry.set_is_var();
        if !is_new {
            result |= DeclarationResult::INVALID_DUPLICATED;
        }
        result
    }

    /// Record a read of `name` in the innermost scope.
    pub fn use_variable(&mut self, name: &str) {
        if let Some(scope) = self.current_mut() {
            scope.use_variable(name);
        }
    }

    /// Record a write to `name` in the innermost scope.
    pub fn write_variable(&mut self, name: &str) {
        if let Some(scope) = self.current_mut() {
            scope.write_variable(name);
        }
    }

    /// Force a full activation on every scope up to the nearest function.
    pub fn set_needs_full_activation(&mut self) {
        for scope in self.scopes.iter_mut().rev() {
            scope.set_needs_full_activation();
            if scope.is_function_boundary {
                break;
            }
        }
    }

    // ── Labels, loops and switches ──────────────────────────────────────────

    /// Push `name` on the innermost scope's label stack.
    pub fn push_label(&mut self, name: &str, is_loop: bool) {
        if let Some(scope) = self.current_mut() {
            scope.labels.push(Label {
                name: name.to_owned(),
                is_loop,
            });
        }
    }

    /// Pop the innermost label.
    pub fn pop_label(&mut self) {
        if let Some(scope) = self.current_mut() {
            scope.labels.pop();
        }
    }

    /// Scopes visible to `break`/`continue`/labels: innermost first, up to
    /// and including the nearest function boundary.
    fn statement_scopes(&self) -> impl Iterator<Item = &ParserScope> {
        let mut done = false;
        self.scopes.iter().rev().take_while(move |s| {
            if done {
                return false;
            }
            done = s.is_function_boundary;
            true
        })
    }

    /// Find an enclosing label; returns whether it labels a loop.
    pub fn find_label(&self, name: &str) -> Option<bool> {
        self.statement_scopes()
            .flat_map(|s| s.labels.iter().rev())
            .find(|label| label.name == name)
            .map(|label| label.is_loop)
    }

    /// An unlabelled `break` is legal here.
    pub fn can_break(&self) -> bool {
        self.statement_scopes()
            .any(|s| s.loop_depth > 0 || s.switch_depth > 0)
    }

    /// An unlabelled `continue` is legal here.
    pub fn can_continue(&self) -> bool {
        self.statement_scopes().any(|s| s.loop_depth > 0)
    }

    /// Enter a loop body.
    pub fn begin_loop(&mut self) {
        if let Some(scope) = self.current_mut() {
            scope.loop_depth += 1;
        }
    }

    /// Leave a loop body.
    pub fn end_loop(&mut self) {
        if let Some(scope) = self.current_mut() {
            scope.loop_depth = scope.loop_depth.saturating_sub(1);
        }
    }

    /// Enter a `switch` body.
    pub fn begin_switch(&mut self) {
        if let Some(scope) = self.current_mut() {
            scope.switch_depth += 1;
        }
    }

    /// Leave a `switch` body.
    pub fn end_switch(&mut self) {
        if let Some(scope) = self.current_mut() {
            scope.switch_depth = scope.switch_depth.saturating_sub(1);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
