//! Shared syntax frontend for the tern language: source buffers, diagnostics, lexer, AST and the
//! resumable parser driver.
//!
//! ## Notes
//! - This crate is "syntax-only": it does not resolve names, load modules or type-check.
//! - The parser is driven one buffer at a time against a [`parser::PersistentParserState`], so a
//!   caller can interleave parsing with semantic analysis (see `tern::frontend::instance`).
//!
//! ## Examples
//! ```rust
//! use tern_syntax::ast::{SourceFile, SourceKind};
//! use tern_syntax::diagnostics::DiagnosticEngine;
//! use tern_syntax::parser::{self, PersistentParserState};
//! use tern_syntax::source::SourceManager;
//!
//! let mut sm = SourceManager::new();
//! let mut diags = DiagnosticEngine::new();
//! let buffer = sm.add_buffer("import Tern\nlet x = 1\n".to_string(), "lib.tern");
//! let mut sf = SourceFile::new(SourceKind::Library, false);
//! let mut state = PersistentParserState::new();
//!
//! let done = parser::parse_into_source_file(&mut sf, buffer, &sm, &mut diags, None, &mut state, None);
//! assert!(done);
//! assert_eq!(sf.decls.len(), 2);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod source;
