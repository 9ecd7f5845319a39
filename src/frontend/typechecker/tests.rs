use std::fs;
use std::path::PathBuf;

use super::*;
use crate::frontend::ast::SourceKind;
use crate::frontend::diagnostics::DiagId;
use crate::frontend::loaders::{
    ModuleLoader, NativeImporter, NativeImporterOptions, SerializedModuleLoader, SourceLoader,
};
use crate::frontend::parser::{self, DelayedParsingPolicy, PersistentParserState};
use crate::test_support::unique_temp_dir;

struct Session {
    ctx: AstContext,
    sm: SourceManager,
    diags: DiagnosticEngine,
}

impl Session {
    fn new(search: Vec<PathBuf>) -> Self {
        let mut ctx = AstContext::new(search);
        ctx.add_module_loader(ModuleLoader::Source(SourceLoader::new(true)), false);
        ctx.add_module_loader(ModuleLoader::Serialized(SerializedModuleLoader), false);
        Self {
            ctx,
            sm: SourceManager::new(),
            diags: DiagnosticEngine::new(),
        }
    }

    fn parse(&mut self, kind: SourceKind, source: &str, policy: Option<DelayedParsingPolicy>) -> SourceFile {
        let buffer = self.sm.add_buffer(source.to_string(), "test.tern");
        let mut sf = SourceFile::new(kind, false);
        let mut state = PersistentParserState::new();
        while !parser::parse_into_source_file(
            &mut sf,
            buffer,
            &self.sm,
            &mut self.diags,
            None,
            &mut state,
            policy.as_ref(),
        ) {}
        assert!(!self.diags.had_error(), "{:?}", self.diags.diagnostics());
        sf
    }

    fn check_library(&mut self, source: &str) -> Vec<String> {
        let sf = self.parse(SourceKind::Library, source, None);
        TypeChecker::new().check(&mut self.ctx, &sf, 0, &mut self.sm, &mut self.diags);
        self.messages()
    }

    fn messages(&self) -> Vec<String> {
        self.diags.diagnostics().iter().map(|d| d.message()).collect()
    }
}

fn check(source: &str) -> Vec<String> {
    Session::new(Vec::new()).check_library(source)
}

#[test]
fn functions_may_be_used_before_their_declaration() {
    let messages = check("func a() { return b(1) }\nfunc b(x) { let y = x\n return y }\n");
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn unresolved_names_are_reported() {
    assert_eq!(
        check("func f(a) { return a + b }\nlet x = y\n"),
        vec!["use of unresolved identifier 'b'", "use of unresolved identifier 'y'"]
    );
}

#[test]
fn globals_from_let_are_visible_only_after_their_initializer() {
    assert_eq!(check("let x = x\n"), vec!["use of unresolved identifier 'x'"]);
}

#[test]
fn redeclaration_points_at_the_previous_declaration() {
    let mut session = Session::new(Vec::new());
    let messages = session.check_library("func f() { }\nlet f = 1\n");
    assert_eq!(messages, vec!["invalid redeclaration of 'f'", "'f' previously declared here"]);
    assert_eq!(session.diags.count(DiagId::ErrorInvalidRedeclaration), 1);
}

#[test]
fn call_arity_is_checked_for_functions_types_and_builtins() {
    assert_eq!(
        check("func add(a, b) { return a + b }\ntype Pair { l, r }\nlet r = add(1)\nlet p = Pair(1, 2, 3)\nlet q = assert(1, 2)\nlet s = print(1, 2, 3)\n"),
        vec![
            "'add' takes 2 argument(s) but 1 were given",
            "'Pair' takes 2 argument(s) but 3 were given",
            "'assert' takes 1 argument(s) but 2 were given",
        ]
    );
}

#[test]
fn literals_are_not_callable() {
    assert_eq!(check("let x = 1(2)\n"), vec!["cannot call '1': it is not a function"]);
}

#[test]
fn unknown_import_is_diagnosed() {
    assert_eq!(check("import Nope\n"), vec!["no such module 'Nope'"]);
}

#[test]
fn duplicate_import_is_a_warning() {
    let dir = unique_temp_dir("checker_dup_import");
    fs::write(dir.join("Util.tern"), "func id(x) { return x }\n").unwrap();
    let mut session = Session::new(vec![dir]);
    session.check_library("import Util\nimport Util\n");
    assert_eq!(session.diags.count(DiagId::WarningDuplicateImport), 1);
    assert!(!session.diags.had_error());
}

#[test]
fn module_members_and_arities_come_from_the_interface() {
    let dir = unique_temp_dir("checker_members");
    fs::write(
        dir.join("Math.ternmodule"),
        r#"{"name":"Math","symbols":[{"name":"sqrt","kind":"function","arity":1},{"name":"pi","kind":"variable"}]}"#,
    )
    .unwrap();
    let mut session = Session::new(vec![dir]);
    let messages = session.check_library(
        "import Math\nlet a = Math.sqrt(Math.pi)\nlet b = Math.cbrt(1)\nlet c = Math.sqrt(1, 2)\n",
    );
    assert_eq!(
        messages,
        vec![
            "module 'Math' has no member named 'cbrt'",
            "'Math.sqrt' takes 1 argument(s) but 2 were given",
        ]
    );
}

#[test]
fn native_modules_accept_any_member() {
    let sdk = unique_temp_dir("checker_native_sdk");
    fs::create_dir_all(sdk.join("usr/include")).unwrap();
    fs::write(sdk.join("usr/include/Sys.h"), "int sys_call(int a);\n").unwrap();
    let importer = NativeImporter::new(&NativeImporterOptions {
        sdk_path: sdk,
        ..Default::default()
    })
    .unwrap();

    let mut session = Session::new(Vec::new());
    session.ctx.add_module_loader(ModuleLoader::Native(importer), true);
    let messages = session.check_library("import Sys\nlet a = Sys.sys_call(1, 2)\nlet b = Sys.anything\n");
    assert!(messages.is_empty(), "{messages:?}");
    assert!(session.ctx.is_native_module("Sys"));
}

#[test]
fn later_slices_see_earlier_ones() {
    let mut session = Session::new(Vec::new());
    let sf = session.parse(SourceKind::Main, "let a = 1\nlet b = a\n", None);

    let mut first_chunk = SourceFile::new(SourceKind::Main, false);
    first_chunk.decls = sf.decls[..1].to_vec();
    let mut checker = TypeChecker::new();
    checker.check(&mut session.ctx, &first_chunk, 0, &mut session.sm, &mut session.diags);
    checker.check(&mut session.ctx, &sf, 1, &mut session.sm, &mut session.diags);
    assert!(!session.diags.had_error());

    TypeChecker::new().check(&mut session.ctx, &sf, 1, &mut session.sm, &mut session.diags);
    assert_eq!(session.messages(), vec!["use of unresolved identifier 'a'"]);
}

#[test]
fn stdlib_is_imported_implicitly_unless_parsing_it() {
    let dir = unique_temp_dir("checker_stdlib");
    fs::write(dir.join("Tern.tern"), "func greet(name) { }\n").unwrap();

    let mut session = Session::new(vec![dir.clone()]);
    assert!(session.check_library("func main() { greet(\"hi\") }\n").is_empty());

    let mut session = Session::new(vec![dir]);
    let mut sf = session.parse(SourceKind::Library, "func main() { greet(\"hi\") }\n", None);
    sf.parse_stdlib = true;
    TypeChecker::new().check(&mut session.ctx, &sf, 0, &mut session.sm, &mut session.diags);
    assert_eq!(session.messages(), vec!["use of unresolved identifier 'greet'"]);
}

#[test]
fn missing_stdlib_is_not_an_error() {
    assert!(check("let x = 1\n").is_empty());
}

#[test]
fn delayed_bodies_are_not_checked() {
    let mut session = Session::new(Vec::new());
    let sf = session.parse(
        SourceKind::Library,
        "func f() { return missing }\n",
        Some(DelayedParsingPolicy::AlwaysDelay),
    );
    TypeChecker::new().check(&mut session.ctx, &sf, 0, &mut session.sm, &mut session.diags);
    assert!(!session.diags.had_error());
}
