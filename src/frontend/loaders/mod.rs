//! Module loaders consulted, in registration order, when an `import` is resolved.
//!
//! A session registers up to three loaders:
//!
//! - [`SourceLoader`]: `<name>.tern` source files, parsed as libraries.
//! - [`SerializedModuleLoader`]: `<name>.ternmodule` interface files (JSON).
//! - [`NativeImporter`]: C headers under an SDK (only when an SDK path is configured).
//!
//! Each loader answers `Ok(None)` when it has nothing for the name, so the next loader gets a turn.
//! An `Err` means the loader found a candidate but could not use it; resolution stops there.

pub mod native;
pub mod serialized;
pub mod source;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frontend::diagnostics::DiagnosticEngine;
use crate::frontend::source::SourceManager;

pub use native::{NativeImporter, NativeImporterCtor, NativeImporterError, NativeImporterOptions, native_importer_ctor};
pub use serialized::{ModuleInterface, SerializedModuleLoader};
pub use source::SourceLoader;

/// What a module exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Variable,
    Type,
}

/// One exported name. Functions and types carry their argument count when it is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
}

impl ExportedSymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, arity: Option<usize>) -> Self {
        Self {
            name: name.into(),
            kind,
            arity,
        }
    }
}

/// Where a loaded module came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// The session's own translation unit.
    TranslationUnit,
    Source(PathBuf),
    Serialized(PathBuf),
    Native(PathBuf),
}

impl ModuleOrigin {
    /// The loader kind that produced this module, if a loader did.
    pub fn loader_kind(&self) -> Option<LoaderKind> {
        match self {
            ModuleOrigin::TranslationUnit => None,
            ModuleOrigin::Source(_) => Some(LoaderKind::Source),
            ModuleOrigin::Serialized(_) => Some(LoaderKind::Serialized),
            ModuleOrigin::Native(_) => Some(LoaderKind::Native),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, ModuleOrigin::Native(_))
    }
}

/// A module known to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub origin: ModuleOrigin,
    pub symbols: Vec<ExportedSymbol>,
}

impl Module {
    pub fn symbol(&self, name: &str) -> Option<&ExportedSymbol> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    Source,
    Serialized,
    Native,
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Source => write!(f, "source"),
            LoaderKind::Serialized => write!(f, "serialized"),
            LoaderKind::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no such module '{name}'")]
    NotFound { name: String },
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed module file '{}': {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Session services a loader may use while loading.
///
/// Source modules are registered as buffers of the session's source manager, so diagnostics
/// inside them render like any other input.
pub struct LoadEnv<'a> {
    pub search_paths: &'a [PathBuf],
    pub sm: &'a mut SourceManager,
    pub diags: &'a mut DiagnosticEngine,
}

/// The closed set of module loaders.
#[derive(Debug)]
pub enum ModuleLoader {
    Source(SourceLoader),
    Serialized(SerializedModuleLoader),
    Native(NativeImporter),
}

impl ModuleLoader {
    pub fn kind(&self) -> LoaderKind {
        match self {
            ModuleLoader::Source(_) => LoaderKind::Source,
            ModuleLoader::Serialized(_) => LoaderKind::Serialized,
            ModuleLoader::Native(_) => LoaderKind::Native,
        }
    }

    /// Try to load `name`. `Ok(None)` lets the next loader in the chain try.
    pub fn try_load(&self, name: &str, env: &mut LoadEnv<'_>) -> Result<Option<Module>, LoadError> {
        match self {
            ModuleLoader::Source(loader) => loader.try_load(name, env),
            ModuleLoader::Serialized(loader) => loader.try_load(name, env.search_paths),
            ModuleLoader::Native(importer) => importer.try_load(name, env.search_paths),
        }
    }
}

/// First `<dir>/<name>.<extension>` that exists, in directory order.
pub(crate) fn find_in_dirs<'a>(
    dirs: impl IntoIterator<Item = &'a PathBuf>,
    name: &str,
    extension: &str,
) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(format!("{name}.{extension}")))
        .find(|candidate| candidate.is_file())
}
