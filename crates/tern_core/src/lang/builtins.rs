//! Builtin function vocabulary.
//!
//! Builtins are visible in every file without an import. Callers use [`BuiltinFnId`] for identity
//! and read spellings and arities through [`BUILTIN_FUNCTIONS`].
//!
//! ## Examples
//! ```rust
//! use tern_core::lang::builtins::{self, BuiltinFnId};
//!
//! assert_eq!(builtins::from_str("print"), Some(BuiltinFnId::Print));
//! assert_eq!(builtins::info_for(BuiltinFnId::Assert).arity, Some(1));
//! ```

/// Stable identifier for a builtin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFnId {
    Print,
    Assert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFnInfo {
    pub id: BuiltinFnId,
    pub canonical: &'static str,
    /// Fixed argument count; `None` accepts any number.
    pub arity: Option<usize>,
    pub description: &'static str,
}

pub const BUILTIN_FUNCTIONS: &[BuiltinFnInfo] = &[
    BuiltinFnInfo {
        id: BuiltinFnId::Print,
        canonical: "print",
        arity: None,
        description: "Print values to stdout.",
    },
    BuiltinFnInfo {
        id: BuiltinFnId::Assert,
        canonical: "assert",
        arity: Some(1),
        description: "Abort when the condition is false.",
    },
];

pub fn from_str(name: &str) -> Option<BuiltinFnId> {
    BUILTIN_FUNCTIONS.iter().find(|b| b.canonical == name).map(|b| b.id)
}

pub fn info_for(id: BuiltinFnId) -> &'static BuiltinFnInfo {
    // One row per variant (checked by `every_builtin_has_one_row`).
    BUILTIN_FUNCTIONS.iter().find(|b| b.id == id).unwrap_or(&BUILTIN_FUNCTIONS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_has_one_row() {
        for id in [BuiltinFnId::Print, BuiltinFnId::Assert] {
            assert_eq!(BUILTIN_FUNCTIONS.iter().filter(|b| b.id == id).count(), 1);
            assert_eq!(info_for(id).id, id);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(from_str("assert"), Some(BuiltinFnId::Assert));
        assert_eq!(from_str("Print"), None);
    }
}
