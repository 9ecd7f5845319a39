//! Name tables for the type checker.
//!
//! Lookup order is: function locals (innermost first), file globals, imported-module names,
//! implicitly imported standard-library names, builtins.

use std::collections::HashMap;

use crate::frontend::loaders::{ExportedSymbol, Module, SymbolKind};
use crate::frontend::source::SourceRange;
use tern_core::lang::builtins::{self, BuiltinFnInfo};

/// Where a global name was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOrigin {
    Declared(SourceRange),
    Stdlib,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub arity: Option<usize>,
    pub origin: SymbolOrigin,
}

/// An imported module as seen from the importing file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleScope {
    /// Members are opaque; any member name is accepted.
    pub native: bool,
    pub members: HashMap<String, ExportedSymbol>,
    pub import_site: SourceRange,
}

impl ModuleScope {
    pub fn from_module(module: &Module, import_site: SourceRange) -> Self {
        Self {
            native: module.origin.is_native(),
            members: module.symbols.iter().map(|s| (s.name.clone(), s.clone())).collect(),
            import_site,
        }
    }
}

/// Result of resolving a bare name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Local,
    Global(&'a Symbol),
    Module(&'a ModuleScope),
    Builtin(&'static BuiltinFnInfo),
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    globals: HashMap<String, Symbol>,
    modules: HashMap<String, ModuleScope>,
    stdlib: HashMap<String, Symbol>,
    /// Names bound in the function body being checked.
    locals: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a global; on conflict returns the previous declaration's site.
    pub fn declare_global(&mut self, name: &str, symbol: Symbol) -> Result<(), Option<SourceRange>> {
        if let Some(previous) = self.globals.get(name) {
            return Err(match previous.origin {
                SymbolOrigin::Declared(range) => Some(range),
                SymbolOrigin::Stdlib => None,
            });
        }
        self.globals.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn global(&self, name: &str) -> Option<&Symbol> {
        self.globals.get(name)
    }

    /// Record an import; returns the earlier import site when the module was already imported.
    pub fn import_module(&mut self, name: &str, scope: ModuleScope) -> Result<(), SourceRange> {
        if let Some(existing) = self.modules.get(name) {
            return Err(existing.import_site);
        }
        self.modules.insert(name.to_string(), scope);
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleScope> {
        self.modules.get(name)
    }

    pub fn add_stdlib(&mut self, module: &Module) {
        for symbol in &module.symbols {
            self.stdlib.insert(
                symbol.name.clone(),
                Symbol {
                    kind: symbol.kind,
                    arity: symbol.arity,
                    origin: SymbolOrigin::Stdlib,
                },
            );
        }
    }

    pub fn enter_function(&mut self, params: impl IntoIterator<Item = String>) {
        self.locals.clear();
        self.locals.extend(params);
    }

    pub fn exit_function(&mut self) {
        self.locals.clear();
    }

    pub fn bind_local(&mut self, name: &str) {
        self.locals.push(name.to_string());
    }

    pub fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        if self.locals.iter().any(|l| l == name) {
            return Some(Resolved::Local);
        }
        if let Some(symbol) = self.globals.get(name) {
            return Some(Resolved::Global(symbol));
        }
        if let Some(scope) = self.modules.get(name) {
            return Some(Resolved::Module(scope));
        }
        if let Some(symbol) = self.stdlib.get(name) {
            return Some(Resolved::Global(symbol));
        }
        builtins::from_str(name).map(|id| Resolved::Builtin(builtins::info_for(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::Span;
    use crate::frontend::source::BufferId;
    use crate::frontend::source::SourceManager;

    fn site(sm: &mut SourceManager) -> SourceRange {
        let buffer: BufferId = sm.add_buffer("x".into(), "t.tern");
        SourceRange::new(buffer, Span::new(0, 1))
    }

    #[test]
    fn locals_shadow_globals_and_clear_on_exit() {
        let mut sm = SourceManager::new();
        let mut table = SymbolTable::new();
        let range = site(&mut sm);
        table
            .declare_global(
                "x",
                Symbol {
                    kind: SymbolKind::Variable,
                    arity: None,
                    origin: SymbolOrigin::Declared(range),
                },
            )
            .unwrap();

        table.enter_function(["x".to_string()]);
        assert_eq!(table.resolve("x"), Some(Resolved::Local));
        table.exit_function();
        assert!(matches!(table.resolve("x"), Some(Resolved::Global(_))));
        assert!(matches!(table.resolve("print"), Some(Resolved::Builtin(_))));
        assert_eq!(table.resolve("y"), None);
    }

    #[test]
    fn redeclaration_reports_the_previous_site() {
        let mut sm = SourceManager::new();
        let mut table = SymbolTable::new();
        let first = site(&mut sm);
        let symbol = Symbol {
            kind: SymbolKind::Function,
            arity: Some(0),
            origin: SymbolOrigin::Declared(first),
        };
        table.declare_global("f", symbol.clone()).unwrap();
        assert_eq!(table.declare_global("f", symbol), Err(Some(first)));
    }
}
