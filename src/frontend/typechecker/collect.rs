//! First pass: declare imports, functions and types of a slice.

use crate::frontend::ast::{Decl, DeclKind, Ident, Spanned, VarDecl};
use crate::frontend::context::AstContext;
use crate::frontend::diagnostics::{DiagId, DiagnosticEngine};
use crate::frontend::loaders::{LoadError, SymbolKind};
use crate::frontend::source::{BufferId, SourceManager, SourceRange};
use crate::frontend::symbols::{ModuleScope, Symbol, SymbolOrigin};

use super::TypeChecker;

impl TypeChecker {
    pub(super) fn collect_decl(
        &mut self,
        decl: &Decl,
        ctx: &mut AstContext,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) {
        match &decl.kind {
            DeclKind::Import(import) => self.collect_import(&import.module, decl.buffer, ctx, sm, diags),
            DeclKind::Func(func) => {
                self.declare(&func.name, decl.buffer, SymbolKind::Function, Some(func.params.len()), diags)
            }
            DeclKind::Type(ty) => self.declare(&ty.name, decl.buffer, SymbolKind::Type, Some(ty.fields.len()), diags),
            DeclKind::Var(_) | DeclKind::TopLevelCode(_) => {}
        }
    }

    fn collect_import(
        &mut self,
        module: &Spanned<Ident>,
        buffer: BufferId,
        ctx: &mut AstContext,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) {
        let name = &module.node;
        let site = SourceRange::new(buffer, module.span);
        if let Some(previous) = self.symbols.module(name) {
            let previous = previous.import_site;
            diags.diagnose(Some(site), DiagId::WarningDuplicateImport, &[name]);
            diags.diagnose(Some(previous), DiagId::NotePreviousDeclaration, &[name]);
            return;
        }

        match ctx.load_module(name, sm, diags) {
            Ok(loaded) => {
                let scope = ModuleScope::from_module(loaded, site);
                // Duplicates returned early above.
                let _ = self.symbols.import_module(name, scope);
            }
            Err(LoadError::NotFound { .. }) => diags.diagnose(Some(site), DiagId::ErrorNoSuchModule, &[name]),
            Err(LoadError::Io { path, source }) => {
                diags.diagnose(Some(site), DiagId::ErrorMalformedModuleFile, &[&path.display(), &source])
            }
            Err(LoadError::Malformed { path, reason }) => {
                diags.diagnose(Some(site), DiagId::ErrorMalformedModuleFile, &[&path.display(), &reason])
            }
        }
    }

    pub(super) fn declare_var(&mut self, var: &VarDecl, buffer: BufferId, diags: &mut DiagnosticEngine) {
        self.declare(&var.name, buffer, SymbolKind::Variable, None, diags);
    }

    fn declare(
        &mut self,
        name: &Spanned<Ident>,
        buffer: BufferId,
        kind: SymbolKind,
        arity: Option<usize>,
        diags: &mut DiagnosticEngine,
    ) {
        let site = SourceRange::new(buffer, name.span);
        let symbol = Symbol {
            kind,
            arity,
            origin: SymbolOrigin::Declared(site),
        };
        if let Err(previous) = self.symbols.declare_global(&name.node, symbol) {
            diags.diagnose(Some(site), DiagId::ErrorInvalidRedeclaration, &[&name.node]);
            if let Some(previous) = previous {
                diags.diagnose(Some(previous), DiagId::NotePreviousDeclaration, &[&name.node]);
            }
        }
    }
}
