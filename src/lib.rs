#![forbid(unsafe_code)]
//! tern compilation-session driver
//!
//! This crate turns a set of inputs (files, in-memory buffers, an optional code-completion cursor)
//! into a parsed and type-checked module. It coordinates module loading, incremental parsing and
//! incremental type checking; see [`CompilerInstance`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **Contract violations**: Misuse by the caller (an invalid module name, a main session with several buffers)
//!   panics with an `INVARIANT:` message.

pub mod cli;
pub mod frontend;
pub mod sil;

#[cfg(test)]
pub(crate) mod test_support;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::instance::{CompilerInstance, SetupError};
pub use frontend::invocation::{InputBuffer, Invocation};
pub use frontend::parser;
pub use frontend::typechecker;
