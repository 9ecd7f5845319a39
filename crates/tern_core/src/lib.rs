//! Shared language vocabulary for the tern compiler frontend.
//!
//! This crate is dependency-free and holds the registries that both the syntax crate and the
//! driver consult, so spellings never drift between the lexer, the parser and diagnostics.
//!
//! ## Examples
//! ```rust
//! use tern_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("sil"), Some(KeywordId::Sil));
//! ```

pub mod lang;
