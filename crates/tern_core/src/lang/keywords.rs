//! Define the reserved keyword vocabulary for the tern language.
//!
//! A stable identifier ([`KeywordId`]) plus a const metadata table ([`KEYWORDS`]) recording the
//! canonical spelling and category of every reserved word.
//!
//! ## Notes
//! - Lookup via [`from_str`] is case-sensitive.
//! - `sil` is reserved in every source kind; whether a `sil` definition is legal is decided by the
//!   parser, not here.
//!
//! ## Examples
//! ```rust
//! use tern_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("func"), Some(KeywordId::Func));
//! assert_eq!(keywords::as_str(KeywordId::Func), "func");
//! assert_eq!(keywords::from_str("Func"), None);
//! ```

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Declarations
    Import,
    Let,
    Var,
    Func,
    Type,
    Sil,

    // Statements
    Return,

    // Literals
    True,
    False,
}

/// High-level grouping for documentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Declaration,
    Statement,
    Literal,
}

/// Metadata for one keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    /// Whether the keyword can begin a top-level declaration (used for parser recovery).
    pub starts_decl: bool,
}

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory, starts_decl: bool) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        starts_decl,
    }
}

/// Registry of all reserved keywords.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::Import, "import", KeywordCategory::Declaration, true),
    info(KeywordId::Let, "let", KeywordCategory::Declaration, true),
    info(KeywordId::Var, "var", KeywordCategory::Declaration, true),
    info(KeywordId::Func, "func", KeywordCategory::Declaration, true),
    info(KeywordId::Type, "type", KeywordCategory::Declaration, true),
    info(KeywordId::Sil, "sil", KeywordCategory::Declaration, true),
    info(KeywordId::Return, "return", KeywordCategory::Statement, false),
    info(KeywordId::True, "true", KeywordCategory::Literal, false),
    info(KeywordId::False, "false", KeywordCategory::Literal, false),
];

/// Resolve a spelling to its keyword id.
pub fn from_str(name: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == name).map(|k| k.id)
}

/// Canonical spelling of a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Full metadata for a keyword.
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    // KEYWORDS has exactly one entry per variant (checked by `registry_covers_every_id`).
    KEYWORDS.iter().find(|k| k.id == id).unwrap_or(&KEYWORDS[0])
}

/// Whether `id` may begin a top-level declaration.
pub fn starts_decl(id: KeywordId) -> bool {
    info_for(id).starts_decl
}
