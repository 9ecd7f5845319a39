//! Loads precompiled module interfaces (`<name>.ternmodule`).
//!
//! The format is JSON:
//!
//! ```json
//! { "name": "Math", "symbols": [ { "name": "sqrt", "kind": "function", "arity": 1 } ] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tern_core::lang::stdlib;

use super::{ExportedSymbol, LoadError, Module, ModuleOrigin, find_in_dirs};

/// On-disk form of a serialized module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInterface {
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<ExportedSymbol>,
}

impl ModuleInterface {
    /// Parse an interface file's contents; `path` is only used for error reporting.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, LoadError> {
        serde_json::from_str(text).map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializedModuleLoader;

impl SerializedModuleLoader {
    pub fn try_load(&self, name: &str, search_paths: &[PathBuf]) -> Result<Option<Module>, LoadError> {
        let Some(path) = find_in_dirs(search_paths, name, stdlib::SERIALIZED_EXTENSION) else {
            return Ok(None);
        };
        let text = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
        let interface = ModuleInterface::from_json(&text, &path)?;
        if interface.name != name {
            return Err(LoadError::Malformed {
                reason: format!("file declares module '{}'", interface.name),
                path,
            });
        }
        tracing::debug!(module = name, path = %path.display(), symbols = interface.symbols.len(), "loaded serialized module");
        Ok(Some(Module {
            name: interface.name,
            origin: ModuleOrigin::Serialized(path),
            symbols: interface.symbols,
        }))
    }
}
