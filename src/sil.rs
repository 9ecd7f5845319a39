//! In-memory low-level IR module.
//!
//! A session compiling low-level IR input owns one [`SilModule`]. The parser hands it every
//! `sil @name : <signature> { <body> }` definition through the [`SilSink`] interface, interleaved
//! with ordinary declarations. Signatures and bodies are kept as text.

use std::collections::HashMap;
use std::fmt;

use crate::frontend::parser::{SilDefineError, SilFunctionDef, SilSink};
use crate::frontend::source::SourceRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilFunction {
    pub name: String,
    pub signature: String,
    pub body: String,
    pub range: SourceRange,
}

#[derive(Debug, Default)]
pub struct SilModule {
    functions: Vec<SilFunction>,
    by_name: HashMap<String, usize>,
}

impl SilModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&SilFunction> {
        self.by_name.get(name).map(|&i| &self.functions[i])
    }

    /// Functions in definition order.
    pub fn functions(&self) -> &[SilFunction] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl SilSink for SilModule {
    fn define_function(&mut self, def: SilFunctionDef<'_>) -> Result<(), SilDefineError> {
        if self.by_name.contains_key(def.name) {
            return Err(SilDefineError::Redefinition(def.name.to_string()));
        }
        self.by_name.insert(def.name.to_string(), self.functions.len());
        self.functions.push(SilFunction {
            name: def.name.to_string(),
            signature: def.signature.to_string(),
            body: def.body.to_string(),
            range: def.range,
        });
        Ok(())
    }
}

impl fmt::Display for SilModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            if func.body.is_empty() {
                writeln!(f, "sil @{} : {} {{}}", func.name, func.signature)?;
            } else {
                writeln!(f, "sil @{} : {} {{ {} }}", func.name, func.signature, func.body)?;
            }
        }
        Ok(())
    }
}
