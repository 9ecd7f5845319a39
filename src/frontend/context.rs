//! Per-session type context: identifier interner, import search paths, loader chain and the
//! cache of loaded modules.
//!
//! One [`AstContext`] is created by session setup and owned by the session. Nothing in it is
//! shared between sessions.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::frontend::diagnostics::DiagnosticEngine;
use crate::frontend::loaders::{LoadEnv, LoadError, LoaderKind, Module, ModuleLoader, ModuleOrigin};
use crate::frontend::source::SourceManager;

/// Interned identifier; only meaningful with the context that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(u32);

#[derive(Debug, Default)]
struct Interner {
    ids: HashMap<String, Identifier>,
    names: Vec<String>,
}

impl Interner {
    fn intern(&mut self, name: &str) -> Identifier {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = Identifier(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    fn lookup(&self, name: &str) -> Option<Identifier> {
        self.ids.get(name).copied()
    }

    fn resolve(&self, id: Identifier) -> &str {
        &self.names[id.0 as usize]
    }
}

#[derive(Debug)]
pub struct AstContext {
    interner: Interner,
    import_search_paths: Vec<PathBuf>,
    loaders: Vec<ModuleLoader>,
    /// Index of the native-interop loader in `loaders`.
    native_loader: Option<usize>,
    loaded_modules: HashMap<Identifier, Module>,
}

impl AstContext {
    pub fn new(import_search_paths: Vec<PathBuf>) -> Self {
        Self {
            interner: Interner::default(),
            import_search_paths,
            loaders: Vec::new(),
            native_loader: None,
            loaded_modules: HashMap::new(),
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    pub fn get_identifier(&mut self, name: &str) -> Identifier {
        self.interner.intern(name)
    }

    pub fn identifier_str(&self, id: Identifier) -> &str {
        self.interner.resolve(id)
    }

    // ========================================================================
    // Search paths and loaders
    // ========================================================================

    pub fn import_search_paths(&self) -> &[PathBuf] {
        &self.import_search_paths
    }

    pub fn push_import_search_path(&mut self, path: PathBuf) {
        self.import_search_paths.push(path);
    }

    /// Append a loader to the chain. The native-interop loader is flagged so that modules it
    /// produces can be recognized during resolution.
    pub fn add_module_loader(&mut self, loader: ModuleLoader, is_native: bool) {
        if is_native {
            self.native_loader = Some(self.loaders.len());
        }
        tracing::debug!(kind = %loader.kind(), position = self.loaders.len(), "registered module loader");
        self.loaders.push(loader);
    }

    pub fn loaders(&self) -> &[ModuleLoader] {
        &self.loaders
    }

    pub fn native_loader(&self) -> Option<&ModuleLoader> {
        self.native_loader.and_then(|i| self.loaders.get(i))
    }

    pub fn has_native_loader(&self) -> bool {
        self.native_loader.is_some()
    }

    // ========================================================================
    // Loaded modules
    // ========================================================================

    /// Register an already-built module, replacing any module of the same name.
    pub fn register_module(&mut self, module: Module) -> Identifier {
        let id = self.interner.intern(&module.name);
        self.loaded_modules.insert(id, module);
        id
    }

    pub fn loaded_module(&self, name: &str) -> Option<&Module> {
        self.interner.lookup(name).and_then(|id| self.loaded_modules.get(&id))
    }

    pub fn loaded_module_count(&self) -> usize {
        self.loaded_modules.len()
    }

    /// Resolve `name` through the loader chain, consulting the cache first.
    pub fn load_module(
        &mut self,
        name: &str,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) -> Result<&Module, LoadError> {
        self.load_with(name, None, sm, diags)
    }

    /// Resolve `name` using only loaders of `kind`, e.g. to require the binary form of a module.
    pub fn load_module_from(
        &mut self,
        name: &str,
        kind: LoaderKind,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) -> Result<&Module, LoadError> {
        self.load_with(name, Some(kind), sm, diags)
    }

    fn load_with(
        &mut self,
        name: &str,
        only: Option<LoaderKind>,
        sm: &mut SourceManager,
        diags: &mut DiagnosticEngine,
    ) -> Result<&Module, LoadError> {
        let id = self.interner.intern(name);
        let cached = self
            .loaded_modules
            .get(&id)
            .is_some_and(|m| only.is_none() || m.origin.loader_kind() == only);
        if cached {
            return Ok(&self.loaded_modules[&id]);
        }

        let mut env = LoadEnv {
            search_paths: &self.import_search_paths,
            sm,
            diags,
        };
        let mut found = None;
        for loader in self.loaders.iter().filter(|l| only.is_none_or(|k| l.kind() == k)) {
            if let Some(module) = loader.try_load(name, &mut env)? {
                found = Some(module);
                break;
            }
            tracing::trace!(module = name, loader = %loader.kind(), "loader miss");
        }

        let Some(module) = found else {
            tracing::debug!(module = name, "module not found");
            return Err(LoadError::NotFound { name: name.to_string() });
        };
        debug_assert!(
            !module.origin.is_native() || self.has_native_loader(),
            "INVARIANT: native module produced without a native loader"
        );
        tracing::debug!(module = name, origin = ?module.origin, "module loaded");
        self.loaded_modules.insert(id, module);
        Ok(&self.loaded_modules[&id])
    }

    /// Whether `name` is a loaded module whose members are opaque (native-interop origin).
    pub fn is_native_module(&self, name: &str) -> bool {
        self.loaded_module(name)
            .is_some_and(|m| matches!(m.origin, ModuleOrigin::Native(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::loaders::{SerializedModuleLoader, SourceLoader, SymbolKind};
    use crate::test_support::unique_temp_dir;
    use std::fs;

    fn chain(search: Vec<PathBuf>) -> AstContext {
        let mut ctx = AstContext::new(search);
        ctx.add_module_loader(ModuleLoader::Source(SourceLoader::new(true)), false);
        ctx.add_module_loader(ModuleLoader::Serialized(SerializedModuleLoader), false);
        ctx
    }

    #[test]
    fn interner_returns_stable_ids() {
        let mut ctx = AstContext::new(Vec::new());
        let a = ctx.get_identifier("alpha");
        let b = ctx.get_identifier("beta");
        assert_ne!(a, b);
        assert_eq!(ctx.get_identifier("alpha"), a);
        assert_eq!(ctx.identifier_str(b), "beta");
    }

    #[test]
    fn loaders_are_tried_in_order_and_results_cached() {
        let dir = unique_temp_dir("context_order");
        fs::write(dir.join("Both.tern"), "func from_source() { }\n").unwrap();
        fs::write(
            dir.join("Both.ternmodule"),
            r#"{"name":"Both","symbols":[{"name":"from_binary","kind":"function","arity":0}]}"#,
        )
        .unwrap();
        let mut ctx = chain(vec![dir]);
        let mut sm = SourceManager::new();
        let mut diags = DiagnosticEngine::new();

        let module = ctx.load_module("Both", &mut sm, &mut diags).unwrap();
        assert!(module.symbol("from_source").is_some());
        assert_eq!(sm.buffer_count(), 1);

        ctx.load_module("Both", &mut sm, &mut diags).unwrap();
        assert_eq!(sm.buffer_count(), 1, "second lookup is served from the cache");

        let binary = ctx.load_module_from("Both", LoaderKind::Serialized, &mut sm, &mut diags).unwrap();
        assert_eq!(binary.symbol("from_binary").map(|s| s.kind), Some(SymbolKind::Function));
    }

    #[test]
    fn unknown_module_is_not_found() {
        let mut ctx = chain(vec![unique_temp_dir("context_empty")]);
        let mut sm = SourceManager::new();
        let mut diags = DiagnosticEngine::new();
        let err = ctx.load_module("Ghost", &mut sm, &mut diags).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(ctx.loaded_module_count(), 0);
    }
}
