//! Parser driver unit tests.
//!
//! These focus on the chunking contract (where the driver returns early), `sil` handling, error
//! recovery, and delayed parsing.

use super::*;
use crate::ast::{Decl, SourceKind, Stmt};
use crate::diagnostics::DiagId;
use crate::source::SourceLoc;

#[derive(Default)]
struct RecordingSink {
    defs: Vec<(String, String, String)>,
}

impl SilSink for RecordingSink {
    fn define_function(&mut self, def: SilFunctionDef<'_>) -> Result<(), SilDefineError> {
        if self.defs.iter().any(|(n, _, _)| n == def.name) {
            return Err(SilDefineError::Redefinition(def.name.to_string()));
        }
        self.defs
            .push((def.name.to_string(), def.signature.to_string(), def.body.to_string()));
        Ok(())
    }
}

struct Fixture {
    sm: SourceManager,
    diags: DiagnosticEngine,
    sf: SourceFile,
    state: PersistentParserState,
    buffer: BufferId,
}

impl Fixture {
    fn new(kind: SourceKind, source: &str) -> Self {
        let mut sm = SourceManager::new();
        let buffer = sm.add_buffer(source.to_string(), "test.tern");
        Self {
            sm,
            diags: DiagnosticEngine::new(),
            sf: SourceFile::new(kind, false),
            state: PersistentParserState::new(),
            buffer,
        }
    }

    fn parse_once(&mut self, sil: Option<&mut dyn SilSink>, policy: Option<&DelayedParsingPolicy>) -> bool {
        parse_into_source_file(
            &mut self.sf,
            self.buffer,
            &self.sm,
            &mut self.diags,
            sil,
            &mut self.state,
            policy,
        )
    }

    /// Pump the driver to completion, returning the declaration count after each call.
    fn pump(&mut self, mut sink: Option<&mut RecordingSink>) -> Vec<usize> {
        let mut counts = Vec::new();
        loop {
            let done = self.parse_once(sink.as_deref_mut().map(|s| s as &mut dyn SilSink), None);
            counts.push(self.sf.decls.len());
            if done {
                return counts;
            }
        }
    }
}

fn summary(decls: &[Decl]) -> String {
    decls
        .iter()
        .map(|d| match &d.kind {
            DeclKind::Import(i) => format!("import {}", i.module.node),
            DeclKind::Var(v) => format!("{} {}", if v.mutable { "var" } else { "let" }, v.name.node),
            DeclKind::Func(f) => {
                let params: Vec<&str> = f.params.iter().map(|p| p.node.as_str()).collect();
                let body = if f.body.is_delayed() { " [delayed]" } else { "" };
                format!("func {}({}){}", f.name.node, params.join(", "), body)
            }
            DeclKind::Type(t) => format!("type {} ({} fields)", t.name.node, t.fields.len()),
            DeclKind::TopLevelCode(_) => "<top-level code>".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn library_buffer_is_consumed_in_one_call() {
    let mut fx = Fixture::new(
        SourceKind::Library,
        "import Tern\nfunc add(a, b) { return a + b }\nlet x = add(1, 2)\ntype Point { x, y }\n",
    );
    assert!(fx.parse_once(None, None));
    assert!(!fx.diags.had_error(), "{:?}", fx.diags.diagnostics());
    insta::assert_snapshot!(summary(&fx.sf.decls), @r"
    import Tern
    func add(a, b)
    let x
    type Point (2 fields)
    ");
}

#[test]
fn main_returns_after_each_top_level_code_chunk() {
    let mut fx = Fixture::new(SourceKind::Main, "func f() { }\nlet a = 1\nf()\nvar b = 2\n");
    assert_eq!(fx.pump(None), vec![2, 3, 4]);
    assert!(matches!(fx.sf.decls[2].kind, DeclKind::TopLevelCode(_)));
    assert!(!fx.diags.had_error());
}

#[test]
fn sil_definitions_split_the_buffer_into_chunks() {
    let mut fx = Fixture::new(SourceKind::Sil, "import X\nsil @f : () -> () { %0 = tuple () }\nlet y = 1\n");
    let mut sink = RecordingSink::default();
    let counts = fx.pump(Some(&mut sink));

    assert_eq!(counts, vec![1, 1, 2]);
    assert_eq!(
        sink.defs,
        vec![("f".to_string(), "() -> ()".to_string(), "%0 = tuple ()".to_string())]
    );
    assert!(!fx.diags.had_error(), "{:?}", fx.diags.diagnostics());
}

#[test]
fn leading_sil_definition_is_parsed_alone() {
    let mut fx = Fixture::new(SourceKind::Sil, "sil @a : () { }\nsil @b : () { }\n");
    let mut sink = RecordingSink::default();
    assert!(!fx.parse_once(Some(&mut sink), None));
    assert_eq!(sink.defs.len(), 1);
    assert!(fx.parse_once(Some(&mut sink), None));
    assert_eq!(sink.defs.len(), 2);
    assert!(fx.sf.decls.is_empty());
}

#[test]
fn sil_redefinition_is_diagnosed() {
    let mut fx = Fixture::new(SourceKind::Sil, "sil @a : () { }\nsil @a : () { }\n");
    let mut sink = RecordingSink::default();
    fx.pump(Some(&mut sink));
    assert_eq!(fx.diags.count(DiagId::ErrorSilRedefinition), 1);
}

#[test]
fn sil_in_a_library_is_diagnosed_without_ending_the_call() {
    let mut fx = Fixture::new(SourceKind::Library, "let a = 1\nsil @f : () { }\nlet b = 2\n");
    assert!(fx.parse_once(None, None));
    assert_eq!(fx.sf.decls.len(), 2);
    assert_eq!(fx.diags.count(DiagId::ErrorSilOutsideSilMode), 1);
}

#[test]
fn sil_in_main_without_a_sink_is_a_chunk_boundary() {
    let mut fx = Fixture::new(SourceKind::Main, "import X\nsil @f : () { }\nlet y = 1");
    assert_eq!(fx.pump(None), vec![1, 1, 2]);
    assert_eq!(fx.diags.count(DiagId::ErrorSilOutsideSilMode), 1);
}

#[test]
fn expressions_are_rejected_at_library_top_level() {
    let mut fx = Fixture::new(SourceKind::Library, "print(1)\nlet a = 1\n");
    assert!(fx.parse_once(None, None));
    assert_eq!(fx.sf.decls.len(), 1);
    assert_eq!(fx.diags.count(DiagId::ErrorExprAtTopLevel), 1);
}

#[test]
fn recovery_resumes_at_the_next_declaration() {
    let mut fx = Fixture::new(SourceKind::Library, "let = 1\nlet ok = 2\n");
    assert!(fx.parse_once(None, None));
    assert_eq!(fx.diags.error_count(), 1);
    assert_eq!(fx.diags.diagnostics()[0].message(), "expected variable name, found '='");
    assert_eq!(summary(&fx.sf.decls), "let ok");
}

#[test]
fn bad_statements_inside_a_body_are_all_reported() {
    let mut fx = Fixture::new(SourceKind::Library, "func f() { let = 1; return ) ; let z = 3 }\n");
    assert!(fx.parse_once(None, None));
    assert_eq!(fx.diags.error_count(), 2);
    let DeclKind::Func(f) = &fx.sf.decls[0].kind else {
        panic!("expected a function");
    };
    let Body::Parsed(stmts) = &f.body else {
        panic!("expected a parsed body");
    };
    assert!(matches!(stmts.last().map(|s| &s.node), Some(Stmt::Let { .. })));
}

#[test]
fn unterminated_body_is_diagnosed() {
    let mut fx = Fixture::new(SourceKind::Library, "func f() { return 1\n");
    assert!(fx.parse_once(None, None));
    assert_eq!(fx.diags.count(DiagId::ErrorExpected), 1);
    assert!(fx.sf.decls.is_empty());
}

#[test]
fn hashbang_is_only_accepted_in_the_hashbang_buffer() {
    let source = "#!/usr/bin/env tern\nlet a = 1\n";
    let mut fx = Fixture::new(SourceKind::Main, source);
    fx.sm.set_hashbang_buffer(fx.buffer);
    fx.pump(None);
    assert!(!fx.diags.had_error());

    let mut fx = Fixture::new(SourceKind::Library, source);
    fx.parse_once(None, None);
    assert_eq!(fx.diags.count(DiagId::ErrorHashbangNotAllowed), 1);
    assert_eq!(fx.sf.decls.len(), 1);
}

#[test]
fn always_delay_records_every_body_and_replay_parses_them() {
    let mut fx = Fixture::new(SourceKind::Library, "func f(a) { return a }\nfunc g() { f(1) }\n");
    assert!(fx.parse_once(None, Some(&DelayedParsingPolicy::AlwaysDelay)));
    assert_eq!(fx.state.delayed_bodies().len(), 2);
    assert_eq!(summary(&fx.sf.decls), "func f(a) [delayed]\nfunc g() [delayed]");

    perform_delayed_parsing(&mut fx.sf, &mut fx.state, &fx.sm, &mut fx.diags, None);
    assert!(!fx.state.has_delayed_bodies());
    assert_eq!(summary(&fx.sf.decls), "func f(a)\nfunc g()");
}

#[test]
fn replay_reports_errors_in_delayed_bodies() {
    let mut fx = Fixture::new(SourceKind::Library, "func f() { let = 2 }\n");
    fx.parse_once(None, Some(&DelayedParsingPolicy::AlwaysDelay));
    assert!(!fx.diags.had_error());
    perform_delayed_parsing(&mut fx.sf, &mut fx.state, &fx.sm, &mut fx.diags, None);
    assert_eq!(fx.diags.error_count(), 1);
}

#[test]
fn completion_inside_a_body_sees_params_and_earlier_locals() {
    let source = "func greet(name) {\n  let nickname = name\n  n\n}\nfunc other() { }\n";
    let offset = source.find("  n\n").map(|i| i + 3).unwrap();
    let mut fx = Fixture::new(SourceKind::Library, source);
    fx.sm.set_code_completion_point(fx.buffer, offset);
    let policy = DelayedParsingPolicy::DelayUntilCompletionPoint(SourceLoc {
        buffer: fx.buffer,
        offset,
    });

    fx.parse_once(None, Some(&policy));
    assert_eq!(summary(&fx.sf.decls), "func greet(name) [delayed]\nfunc other()");

    let mut collector = CompletionCollector::new();
    perform_delayed_parsing(&mut fx.sf, &mut fx.state, &fx.sm, &mut fx.diags, Some(&mut collector));
    let results = collector.into_results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].names(), vec!["nickname", "name"]);
}

#[test]
fn completion_outside_any_body_uses_top_level_names() {
    let source = "func alpha() { }\nfunc beta() { }\n";
    let mut fx = Fixture::new(SourceKind::Library, source);
    fx.sm.set_code_completion_point(fx.buffer, source.len());
    let policy = DelayedParsingPolicy::DelayUntilCompletionPoint(SourceLoc {
        buffer: fx.buffer,
        offset: source.len(),
    });
    fx.parse_once(None, Some(&policy));
    assert!(!fx.state.has_delayed_bodies());

    let mut collector = CompletionCollector::new();
    perform_delayed_parsing(&mut fx.sf, &mut fx.state, &fx.sm, &mut fx.diags, Some(&mut collector));
    let names = collector.results()[0].names();
    assert!(names.contains(&"alpha") && names.contains(&"beta"), "{names:?}");
    assert!(names.contains(&"func"), "keywords are offered at the top level: {names:?}");
}

#[test]
fn resume_offset_tracks_the_next_chunk() {
    let mut fx = Fixture::new(SourceKind::Main, "let a = 1\nlet b = 2\n");
    fx.parse_once(None, None);
    assert_eq!(fx.state.resume_offset(fx.buffer), Some(10));
}
