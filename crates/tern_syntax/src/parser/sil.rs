//! Boundary between the parser and the low-level IR module.
//!
//! The parser only recognises the outer shape of a `sil` definition
//! (`sil @name : <signature> { <body> }`); signature and body are handed over as raw text.

use thiserror::Error;

use crate::source::SourceRange;

/// One `sil` definition as seen by the parser.
#[derive(Debug, Clone, Copy)]
pub struct SilFunctionDef<'a> {
    pub name: &'a str,
    pub signature: &'a str,
    pub body: &'a str,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SilDefineError {
    #[error("redefinition of low-level function '@{0}'")]
    Redefinition(String),
}

/// Receives low-level IR definitions interleaved with ordinary declarations.
pub trait SilSink {
    fn define_function(&mut self, def: SilFunctionDef<'_>) -> Result<(), SilDefineError>;
}
