//! Loads imported modules from `.tern` source files.

use std::fs;

use tern_core::lang::stdlib;

use super::{ExportedSymbol, LoadEnv, LoadError, Module, ModuleOrigin, SymbolKind, find_in_dirs};
use crate::frontend::ast::{DeclKind, SourceFile, SourceKind};
use crate::frontend::parser::{self, DelayedParsingPolicy, PersistentParserState};

/// Parses `<name>.tern` from the import search paths as a library and exports its top-level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoader {
    /// Skip function bodies; only signatures matter to importers.
    skip_bodies: bool,
}

impl SourceLoader {
    pub fn new(skip_bodies: bool) -> Self {
        Self { skip_bodies }
    }

    pub fn skips_bodies(&self) -> bool {
        self.skip_bodies
    }

    pub fn try_load(&self, name: &str, env: &mut LoadEnv<'_>) -> Result<Option<Module>, LoadError> {
        let Some(path) = find_in_dirs(env.search_paths, name, stdlib::SOURCE_EXTENSION) else {
            return Ok(None);
        };
        let text = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
        tracing::debug!(module = name, path = %path.display(), "loading source module");

        let buffer = env.sm.add_buffer(text, path.display().to_string());
        let mut sf = SourceFile::new(SourceKind::Library, name == stdlib::STDLIB_MODULE);
        let mut state = PersistentParserState::new();
        let policy = self.skip_bodies.then_some(DelayedParsingPolicy::AlwaysDelay);
        while !parser::parse_into_source_file(&mut sf, buffer, env.sm, env.diags, None, &mut state, policy.as_ref()) {}

        Ok(Some(Module {
            name: name.to_string(),
            origin: ModuleOrigin::Source(path),
            symbols: exported_symbols(&sf),
        }))
    }
}

fn exported_symbols(sf: &SourceFile) -> Vec<ExportedSymbol> {
    sf.decls
        .iter()
        .filter_map(|decl| match &decl.kind {
            DeclKind::Func(f) => Some(ExportedSymbol::new(&f.name.node, SymbolKind::Function, Some(f.params.len()))),
            DeclKind::Type(t) => Some(ExportedSymbol::new(&t.name.node, SymbolKind::Type, Some(t.fields.len()))),
            DeclKind::Var(v) => Some(ExportedSymbol::new(&v.name.node, SymbolKind::Variable, None)),
            DeclKind::Import(_) | DeclKind::TopLevelCode(_) => None,
        })
        .collect()
}
