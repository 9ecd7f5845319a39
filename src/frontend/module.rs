//! The session's own module.

use crate::frontend::ast::{SourceFile, SourceKind};
use crate::frontend::loaders::{Module, ModuleOrigin};

/// The module being compiled, with its single source file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub name: String,
    pub file: SourceFile,
}

impl TranslationUnit {
    pub fn new(name: impl Into<String>, kind: SourceKind, parse_stdlib: bool) -> Self {
        Self {
            name: name.into(),
            file: SourceFile::new(kind, parse_stdlib),
        }
    }

    /// The entry registered with the type context so imports of this name resolve to it.
    pub fn as_module(&self) -> Module {
        Module {
            name: self.name.clone(),
            origin: ModuleOrigin::TranslationUnit,
            symbols: Vec::new(),
        }
    }
}
