//! Delayed body parsing and code completion.
//!
//! During the main pass the parser may skip function bodies (see [`DelayedParsingPolicy`]). They
//! are recorded in the [`PersistentParserState`] and parsed afterwards by
//! [`perform_delayed_parsing`]. For code completion this keeps the main pass cheap: the body that
//! holds the cursor is only looked at once the rest of the file is known.

use crate::ast::*;
use crate::diagnostics::DiagnosticEngine;
use crate::source::{BufferId, SourceLoc, SourceManager, floor_char_boundary};
use tern_core::lang::keywords::{self, KeywordCategory};

use super::decl::Parser;
use super::state::PersistentParserState;

/// Which function bodies the main pass skips.
///
/// The absence of a policy (`Option::None` at the call sites) means every body is parsed eagerly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayedParsingPolicy {
    /// Skip every body.
    AlwaysDelay,
    /// Skip only the body containing the code-completion location.
    DelayUntilCompletionPoint(SourceLoc),
}

impl DelayedParsingPolicy {
    pub fn should_delay_body(&self, buffer: BufferId, braces: Span) -> bool {
        match self {
            DelayedParsingPolicy::AlwaysDelay => true,
            DelayedParsingPolicy::DelayUntilCompletionPoint(loc) => {
                loc.buffer == buffer && braces.contains_cursor(loc.offset)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Local,
    Parameter,
    Function,
    Variable,
    Type,
    Module,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub name: String,
    pub kind: CompletionKind,
}

impl CompletionItem {
    fn new(name: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Everything visible at the completion location.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionContext {
    pub loc: SourceLoc,
    /// Identifier characters typed immediately before the cursor.
    pub prefix: String,
    pub enclosing_function: Option<String>,
    /// Parameters and locals declared before the cursor, innermost last.
    pub locals: Vec<CompletionItem>,
    pub globals: Vec<CompletionItem>,
}

/// Produces completion results for a [`CompletionContext`].
pub trait CodeCompletionFactory {
    fn produce_results(&mut self, ctx: &CompletionContext);
}

/// Results produced at one completion location.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResults {
    pub loc: SourceLoc,
    pub items: Vec<CompletionItem>,
}

impl CompletionResults {
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name.as_str()).collect()
    }
}

/// Default factory: collects prefix-matching names, locals first, then globals, then keywords.
///
/// A name already offered by an inner scope is not repeated.
#[derive(Debug, Default)]
pub struct CompletionCollector {
    results: Vec<CompletionResults>,
}

impl CompletionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[CompletionResults] {
        &self.results
    }

    pub fn into_results(self) -> Vec<CompletionResults> {
        self.results
    }
}

impl CodeCompletionFactory for CompletionCollector {
    fn produce_results(&mut self, ctx: &CompletionContext) {
        let keyword_items = keywords::KEYWORDS
            .iter()
            .filter(|k| k.category != KeywordCategory::Literal)
            .map(|k| CompletionItem::new(k.canonical, CompletionKind::Keyword));

        let mut items: Vec<CompletionItem> = Vec::new();
        let candidates = ctx
            .locals
            .iter()
            .rev()
            .cloned()
            .chain(ctx.globals.iter().cloned())
            .chain(keyword_items);
        for item in candidates {
            if item.name.starts_with(&ctx.prefix) && !items.iter().any(|i| i.name == item.name) {
                items.push(item);
            }
        }
        tracing::debug!(prefix = %ctx.prefix, count = items.len(), "produced completion results");
        self.results.push(CompletionResults { loc: ctx.loc, items });
    }
}

/// Parse every body skipped by the main pass.
///
/// ## Parameters
/// - `sf`: the source file whose declarations own the delayed bodies.
/// - `state`: the same state the main pass used; it holds the lexed tokens and the records.
/// - `factory`: consulted when the source manager has a code-completion point. The body containing
///   the point (or, when no body contains it, the top level) is handed to the factory.
///
/// ## Notes
/// - Records are consumed; calling this twice parses nothing the second time.
/// - Diagnostics from the body holding the completion point are dropped: that body is, by nature,
///   being edited.
#[tracing::instrument(skip_all, fields(delayed = state.delayed.len()))]
pub fn perform_delayed_parsing(
    sf: &mut SourceFile,
    state: &mut PersistentParserState,
    sm: &SourceManager,
    diags: &mut DiagnosticEngine,
    mut factory: Option<&mut dyn CodeCompletionFactory>,
) {
    let completion = sm.code_completion_loc();
    let mut completed = false;
    let delayed = std::mem::take(&mut state.delayed);

    for record in delayed {
        let Some(cursor) = state.cursors.get(&record.buffer) else {
            continue;
        };
        let holds_cursor = completion.is_some_and(|loc| {
            loc.buffer == record.buffer && record.braces.contains_cursor(loc.offset)
        });

        let start = cursor.token_index_at(record.braces.start);
        let mut scratch = DiagnosticEngine::new();
        let sink = if holds_cursor { &mut scratch } else { &mut *diags };
        let mut parser = Parser::new(&cursor.tokens, start, record.buffer, sm.text(record.buffer), sink, None);
        let body = match parser.parse_body() {
            Ok(body) => body,
            Err(e) => {
                parser.report(e);
                Body::Parsed(Vec::new())
            }
        };

        let Some(Decl {
            kind: DeclKind::Func(func),
            ..
        }) = sf.decls.get_mut(record.decl_index)
        else {
            continue;
        };
        func.body = body;

        if holds_cursor {
            if let (Some(loc), Some(factory)) = (completion, factory.as_deref_mut()) {
                let ctx = function_context(sf, record.decl_index, loc, sm);
                factory.produce_results(&ctx);
                completed = true;
            }
        }
    }

    if completed {
        return;
    }
    if let (Some(loc), Some(factory)) = (completion, factory) {
        let ctx = CompletionContext {
            loc,
            prefix: prefix_before(sm.text(loc.buffer), loc.offset),
            enclosing_function: None,
            locals: Vec::new(),
            globals: global_items(sf),
        };
        factory.produce_results(&ctx);
    }
}

fn function_context(sf: &SourceFile, decl_index: usize, loc: SourceLoc, sm: &SourceManager) -> CompletionContext {
    let mut locals = Vec::new();
    let mut enclosing_function = None;
    if let Some(Decl {
        kind: DeclKind::Func(func),
        ..
    }) = sf.decls.get(decl_index)
    {
        enclosing_function = Some(func.name.node.clone());
        locals.extend(
            func.params
                .iter()
                .map(|p| CompletionItem::new(p.node.clone(), CompletionKind::Parameter)),
        );
        if let Body::Parsed(stmts) = &func.body {
            for stmt in stmts {
                if let Stmt::Let { name, .. } = &stmt.node {
                    if stmt.span.end <= loc.offset {
                        locals.push(CompletionItem::new(name.node.clone(), CompletionKind::Local));
                    }
                }
            }
        }
    }
    CompletionContext {
        loc,
        prefix: prefix_before(sm.text(loc.buffer), loc.offset),
        enclosing_function,
        locals,
        globals: global_items(sf),
    }
}

fn global_items(sf: &SourceFile) -> Vec<CompletionItem> {
    sf.decls
        .iter()
        .filter_map(|decl| match &decl.kind {
            DeclKind::Import(i) => Some(CompletionItem::new(i.module.node.clone(), CompletionKind::Module)),
            DeclKind::Var(v) => Some(CompletionItem::new(v.name.node.clone(), CompletionKind::Variable)),
            DeclKind::Func(f) => Some(CompletionItem::new(f.name.node.clone(), CompletionKind::Function)),
            DeclKind::Type(t) => Some(CompletionItem::new(t.name.node.clone(), CompletionKind::Type)),
            DeclKind::TopLevelCode(_) => None,
        })
        .collect()
}

/// Identifier characters immediately before `offset`.
///
/// An offset inside a multi-byte character is moved back to the start of that character.
fn prefix_before(text: &str, offset: usize) -> String {
    let offset = floor_char_boundary(text, offset);
    let head = &text[..offset];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset);
    head[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_stops_at_non_identifier_characters() {
        assert_eq!(prefix_before("let x = fo", 10), "fo");
        assert_eq!(prefix_before("f(a, ", 5), "");
        assert_eq!(prefix_before("abc", 99), "abc");
    }

    #[test]
    fn prefix_offset_inside_a_multibyte_character_is_floored() {
        let text = "let a = \"é\"\n";
        assert!(!text.is_char_boundary(10));
        assert_eq!(prefix_before(text, 10), "");
        assert_eq!(prefix_before("naïve", 3), "na");
    }

    #[test]
    fn completion_policy_delays_only_the_body_holding_the_cursor() {
        let mut sm = SourceManager::new();
        let buffer = sm.add_buffer("func f() { } func g() { }".into(), "m.tern");
        let policy = DelayedParsingPolicy::DelayUntilCompletionPoint(SourceLoc { buffer, offset: 10 });
        assert!(policy.should_delay_body(buffer, Span::new(9, 12)));
        assert!(!policy.should_delay_body(buffer, Span::new(22, 25)));
        assert!(DelayedParsingPolicy::AlwaysDelay.should_delay_body(buffer, Span::new(22, 25)));
    }

    #[test]
    fn collector_prefers_inner_scopes_and_filters_by_prefix() {
        let mut sm = SourceManager::new();
        let buffer = sm.add_buffer(String::new(), "m.tern");
        let ctx = CompletionContext {
            loc: SourceLoc { buffer, offset: 0 },
            prefix: "co".into(),
            enclosing_function: Some("f".into()),
            locals: vec![
                CompletionItem::new("count", CompletionKind::Parameter),
                CompletionItem::new("other", CompletionKind::Local),
            ],
            globals: vec![
                CompletionItem::new("count", CompletionKind::Variable),
                CompletionItem::new("compute", CompletionKind::Function),
            ],
        };
        let mut collector = CompletionCollector::new();
        collector.produce_results(&ctx);
        let results = &collector.results()[0];
        assert_eq!(results.names(), vec!["count", "compute"]);
        assert_eq!(results.items[0].kind, CompletionKind::Parameter);
    }
}
