//! `kestrel_core`: the JavaScript front-end of the Kestrel engine.
//!
//! # Crate layout
//!
//! - [`source`]: Encoding-aware text buffers and source views.
//! - [`parser`]: Scanner, recursive-descent parser, scope analysis, the
//!   owned AST and the validation-only pre-parser.
//! - [`error`]: The [`ParseError`](error::ParseError) every stage reports.
//!
//! # Example
//!
//! ```
//! use kestrel_core::parser::parse_program;
//! use kestrel_core::source::SourceText;
//!
//! let program = parse_program(&SourceText::new("let f = x => x + y;")).unwrap();
//! assert_eq!(program.scope.free_variables, ["y"]);
//! ```

/// Front-end error types.
pub mod error;
/// Scanner, parser, scope analysis and AST.
pub mod parser;
/// Text buffers and source views.
pub mod source;
