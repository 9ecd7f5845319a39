//! Parser state that survives across repeated driver calls.

use std::collections::HashMap;

use crate::ast::Span;
use crate::diagnostics::DiagnosticEngine;
use crate::lexer::{Lexer, Token};
use crate::source::{BufferId, SourceManager, SourceRange};

/// Lexed tokens of one buffer and the index of the next unparsed token.
#[derive(Debug)]
pub(crate) struct BufferCursor {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
}

impl BufferCursor {
    /// Lex a buffer once, reporting lexical errors a single time.
    pub(crate) fn lex(buffer: BufferId, sm: &SourceManager, diags: &mut DiagnosticEngine) -> Self {
        let allow_hashbang = sm.hashbang_buffer() == Some(buffer);
        let (tokens, errors) = Lexer::new(sm.text(buffer))
            .allow_hashbang(allow_hashbang)
            .tokenize_recovering();
        for err in errors {
            let args: Vec<&dyn std::fmt::Display> = err.args.iter().map(|a| a as &dyn std::fmt::Display).collect();
            diags.diagnose(Some(SourceRange::new(buffer, err.span)), err.id, &args);
        }
        Self { tokens, pos: 0 }
    }

    /// Index of the first token starting at or after `offset`.
    pub(crate) fn token_index_at(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.span.start < offset)
    }
}

/// A function body skipped by the main pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedBody {
    /// Index of the owning declaration in the source file.
    pub decl_index: usize,
    pub buffer: BufferId,
    /// `{ ... }`, braces included.
    pub braces: Span,
}

/// Cross-call parser state.
///
/// ## Notes
/// - One instance lives for the duration of a session's run and is shared by every driver call
///   and by delayed parsing afterwards.
/// - Each buffer is lexed on first use; later calls resume at the saved token index.
#[derive(Debug, Default)]
pub struct PersistentParserState {
    pub(crate) cursors: HashMap<BufferId, BufferCursor>,
    pub(crate) delayed: Vec<DelayedBody>,
}

impl PersistentParserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies recorded for delayed parsing, in the order they were skipped.
    pub fn delayed_bodies(&self) -> &[DelayedBody] {
        &self.delayed
    }

    pub fn has_delayed_bodies(&self) -> bool {
        !self.delayed.is_empty()
    }

    /// Byte offset where the next driver call on `buffer` resumes, if the buffer was seen.
    pub fn resume_offset(&self, buffer: BufferId) -> Option<usize> {
        let cursor = self.cursors.get(&buffer)?;
        cursor.tokens.get(cursor.pos).map(|t| t.span.start)
    }
}
