//! Resumable parser driver for tern source buffers.
//!
//! [`parse_into_source_file`] appends declarations from one buffer to a [`SourceFile`]. It may
//! return before the buffer is exhausted; calling it again with the same
//! [`PersistentParserState`] continues where the previous call stopped. The returned flag says
//! whether the buffer is done.
//!
//! When a call returns early depends on the file's [`SourceKind`]:
//! - `Library`: never. The whole buffer is parsed in one call.
//! - `Main`: after each declaration that is top-level code (a global `let`/`var` or a bare
//!   expression), so it can be checked before the code after it is parsed.
//! - `Sil`: at every `sil` definition boundary. Ordinary declarations before a `sil` keyword are
//!   returned as one chunk; the `sil` definition itself is parsed into the sink by the next call.
//!
//! ## Examples
//! ```rust
//! use tern_syntax::ast::{SourceFile, SourceKind};
//! use tern_syntax::diagnostics::DiagnosticEngine;
//! use tern_syntax::parser::{self, PersistentParserState};
//! use tern_syntax::source::SourceManager;
//!
//! let mut sm = SourceManager::new();
//! let mut diags = DiagnosticEngine::new();
//! let buffer = sm.add_buffer("let a = 1\nlet b = a\n".to_string(), "main.tern");
//! let mut sf = SourceFile::new(SourceKind::Main, false);
//! let mut state = PersistentParserState::new();
//!
//! let done = parser::parse_into_source_file(&mut sf, buffer, &sm, &mut diags, None, &mut state, None);
//! assert!(!done);
//! assert_eq!(sf.decls.len(), 1);
//! ```

mod decl;
mod delayed;
mod expr;
mod sil;
mod state;

#[cfg(test)]
mod tests;

pub use delayed::{
    CodeCompletionFactory, CompletionCollector, CompletionContext, CompletionItem, CompletionKind, CompletionResults,
    DelayedParsingPolicy, perform_delayed_parsing,
};
pub use sil::{SilDefineError, SilFunctionDef, SilSink};
pub use state::{DelayedBody, PersistentParserState};

use crate::ast::{Body, DeclKind, FuncDecl, SourceFile, SourceKind};
use crate::diagnostics::DiagnosticEngine;
use crate::source::{BufferId, SourceManager};
use tern_core::lang::keywords::KeywordId;

use self::decl::Parser;
use self::state::BufferCursor;

/// Parse the next chunk of `buffer` into `sf`.
///
/// ## Parameters
/// - `sil`: receives `sil` definitions. Without a sink they are diagnosed and skipped.
/// - `state`: resume position and delayed-body records; must be the same instance across calls.
/// - `policy`: which function bodies to skip for later delayed parsing.
///
/// ## Returns
/// `true` once the buffer has been fully consumed.
#[tracing::instrument(skip_all, fields(buffer = %buffer, kind = %sf.kind, decls_before = sf.decls.len()))]
pub fn parse_into_source_file(
    sf: &mut SourceFile,
    buffer: BufferId,
    sm: &SourceManager,
    diags: &mut DiagnosticEngine,
    mut sil: Option<&mut dyn SilSink>,
    state: &mut PersistentParserState,
    policy: Option<&DelayedParsingPolicy>,
) -> bool {
    let kind = sf.kind;
    let PersistentParserState { cursors, delayed } = state;
    let cursor = cursors
        .entry(buffer)
        .or_insert_with(|| BufferCursor::lex(buffer, sm, diags));
    let mut parser = Parser::new(&cursor.tokens, cursor.pos, buffer, sm.text(buffer), diags, policy);

    let mut parsed_any = false;
    loop {
        parser.skip_semicolons();
        if parser.at_eof() {
            break;
        }

        if parser.at_keyword(KeywordId::Sil) {
            if kind == SourceKind::Library {
                parser.skip_sil_definition();
                continue;
            }
            // Hand the declarations before the boundary back first.
            if parsed_any {
                break;
            }
            match sil.as_deref_mut() {
                Some(sink) => parser.parse_sil_definition(sink),
                None => parser.skip_sil_definition(),
            }
            break;
        }

        let index = sf.decls.len();
        let Some(decl) = parser.parse_decl(kind) else {
            continue;
        };
        if let DeclKind::Func(FuncDecl {
            body: Body::Delayed { braces },
            ..
        }) = &decl.kind
        {
            delayed.push(DelayedBody {
                decl_index: index,
                buffer,
                braces: *braces,
            });
        }
        let top_level_code = decl.is_top_level_code();
        sf.decls.push(decl);
        parsed_any = true;

        if kind == SourceKind::Main && top_level_code {
            break;
        }
    }

    parser.skip_semicolons();
    let done = parser.at_eof();
    let pos = parser.pos();
    cursor.pos = pos;
    tracing::trace!(done, decls_after = sf.decls.len(), "parser returned");
    done
}
