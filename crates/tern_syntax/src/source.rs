//! Source buffer registry.
//!
//! Every input a session sees (files, preloaded in-memory buffers, the code-completion copy and
//! any module pulled in by a loader) is owned here and addressed by a [`BufferId`].
//!
//! ## Notes
//! - Ids are handed out in registration order and never reused. Source-location disambiguation
//!   and diagnostic ordering depend on that order.
//! - At most one buffer is the *hashbang buffer* (the main file, whose first line may be `#!...`).
//! - At most one `(buffer, offset)` pair is the code-completion point.

use std::fmt;

use crate::ast::Span;

/// Opaque identifier of a registered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u32);

impl BufferId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in a specific buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub buffer: BufferId,
    pub offset: usize,
}

/// A byte range in a specific buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub buffer: BufferId,
    pub span: Span,
}

impl SourceRange {
    pub fn new(buffer: BufferId, span: Span) -> Self {
        Self { buffer, span }
    }

    pub fn start(&self) -> SourceLoc {
        SourceLoc {
            buffer: self.buffer,
            offset: self.span.start,
        }
    }
}

/// A registered buffer: its name (usually a path) and its text.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    pub identifier: String,
    pub text: String,
}

/// Owns every buffer of a session.
#[derive(Debug, Default)]
pub struct SourceManager {
    buffers: Vec<SourceBuffer>,
    code_completion: Option<SourceLoc>,
    hashbang_buffer: Option<BufferId>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `text` and return the new buffer's id.
    pub fn add_buffer(&mut self, text: String, identifier: impl Into<String>) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        let identifier = identifier.into();
        tracing::trace!(buffer = %id, identifier = %identifier, len = text.len(), "registered buffer");
        self.buffers.push(SourceBuffer { identifier, text });
        id
    }

    pub fn buffer(&self, id: BufferId) -> Option<&SourceBuffer> {
        self.buffers.get(id.index())
    }

    /// Text of a buffer; empty for an unknown id.
    pub fn text(&self, id: BufferId) -> &str {
        self.buffer(id).map(|b| b.text.as_str()).unwrap_or("")
    }

    /// Identifier (path or name) of a buffer; empty for an unknown id.
    pub fn identifier(&self, id: BufferId) -> &str {
        self.buffer(id).map(|b| b.identifier.as_str()).unwrap_or("")
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        (0..self.buffers.len()).map(|i| BufferId(i as u32))
    }

    /// Record the completion cursor. The offset is clamped to the buffer and moved back to the
    /// start of the character it points into.
    pub fn set_code_completion_point(&mut self, buffer: BufferId, offset: usize) {
        let offset = floor_char_boundary(self.text(buffer), offset);
        self.code_completion = Some(SourceLoc { buffer, offset });
    }

    pub fn code_completion_loc(&self) -> Option<SourceLoc> {
        self.code_completion
    }

    pub fn set_hashbang_buffer(&mut self, buffer: BufferId) {
        self.hashbang_buffer = Some(buffer);
    }

    pub fn hashbang_buffer(&self) -> Option<BufferId> {
        self.hashbang_buffer
    }

    /// 1-based line and column of a location.
    pub fn line_and_column(&self, loc: SourceLoc) -> (usize, usize) {
        let text = self.text(loc.buffer);
        let offset = floor_char_boundary(text, loc.offset);
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, offset - line_start + 1)
    }
}

/// Largest char boundary of `text` at or below `offset`.
pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
