//! Incremental type checker for tern source files.
//!
//! The session calls [`TypeCheckDriver::check`] with the index of the first declaration that has
//! not been checked yet. In a library that is `0`, once; in a main or low-level IR file it is
//! called after every parser chunk, so each call sees exactly the newly appended declarations.
//!
//! ## Notes
//!
//! - **Two passes per slice**: imports, functions and types in the slice are declared first, so
//!   they may be used before their declaration within the same slice. Globals introduced by
//!   `let`/`var` become visible only after their initializer has been checked.
//! - **Delayed bodies** are skipped; they are parsed after checking, for code completion.
//! - **Implicit stdlib**: unless the file is the standard library itself, the `Tern` module is
//!   imported the first time the checker runs. A missing standard library is not an error.
//! - Everything is reported through the diagnostics sink; checking never stops early.
//!
//! ## What is validated
//!
//! - Imported modules resolve through the loader chain
//! - Globals are not redeclared
//! - Every referenced name resolves
//! - Members of imported modules exist (native modules are opaque and accept any member)
//! - Calls to functions, types and builtins with a known arity pass that many arguments

mod check_expr;
mod collect;

#[cfg(test)]
mod tests;

use crate::frontend::ast::{DeclKind, SourceFile};
use crate::frontend::context::AstContext;
use crate::frontend::diagnostics::DiagnosticEngine;
use crate::frontend::source::SourceManager;
use crate::frontend::symbols::SymbolTable;
use tern_core::lang::stdlib;

/// Checks slices of a growing declaration list.
pub trait TypeCheckDriver {
    /// Check `sf.decls[start..]`. Declarations before `start` were handed to an earlier call.
    fn check(
        &mut self,
        ctx: &mut AstContext,
        sf: &SourceFile,
        start: usize,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    );
}

/// The default checker. Its symbol table persists across calls so later chunks see earlier ones.
#[derive(Debug, Default)]
pub struct TypeChecker {
    symbols: SymbolTable,
    stdlib_attempted: bool,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn import_stdlib(&mut self, ctx: &mut AstContext, sm: &mut SourceManager, diags: &mut DiagnosticEngine) {
        self.stdlib_attempted = true;
        match ctx.load_module(stdlib::STDLIB_MODULE, sm, diags) {
            Ok(module) => self.symbols.add_stdlib(module),
            Err(err) => tracing::debug!(error = %err, "standard library not available"),
        }
    }
}

impl TypeCheckDriver for TypeChecker {
    #[tracing::instrument(skip_all, fields(start = start, end = sf.decls.len(), kind = %sf.kind))]
    fn check(
        &mut self,
        ctx: &mut AstContext,
        sf: &SourceFile,
        start: usize,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) {
        if !sf.parse_stdlib && !self.stdlib_attempted {
            self.import_stdlib(ctx, sm, diags);
        }

        let slice = &sf.decls[start.min(sf.decls.len())..];
        for decl in slice {
            self.collect_decl(decl, ctx, sm, diags);
        }
        for decl in slice {
            match &decl.kind {
                DeclKind::Var(var) => {
                    self.check_expr(&var.init, decl.buffer, diags);
                    self.declare_var(var, decl.buffer, diags);
                }
                DeclKind::Func(func) => self.check_func(func, decl.buffer, diags),
                DeclKind::TopLevelCode(stmt) => self.check_stmt(stmt, decl.buffer, diags),
                DeclKind::Import(_) | DeclKind::Type(_) => {}
            }
        }
        tracing::debug!(checked = slice.len(), errors = diags.error_count(), "checked declarations");
    }
}
