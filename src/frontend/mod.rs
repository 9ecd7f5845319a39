//! tern compiler frontend
//!
//! - `lexer`, `parser`, `ast`, `source`, `diagnostics`: provided by the `tern_syntax` crate
//! - `invocation`: session configuration
//! - `instance`: the compilation session (setup, then parse/type-check run)
//! - `context`: per-session type context and module cache
//! - `loaders`: source, serialized and native-interop module loaders
//! - `module`: the session's translation unit
//! - `symbols`, `typechecker`: incremental name resolution and checking

// Syntax components are provided by the shared tern_syntax crate.
pub use tern_syntax::{ast, diagnostics, lexer, parser, source};

pub mod context;
pub mod instance;
pub mod invocation;
pub mod loaders;
pub mod module;
pub mod symbols;
pub mod typechecker;
