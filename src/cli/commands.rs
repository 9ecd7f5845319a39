//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::frontend::ast::{Body, DeclKind, SourceFile, SourceKind};
use crate::frontend::invocation::{self, DEFAULT_MODULE_NAME, InputBuffer, Invocation};
use crate::frontend::lexer;
use crate::frontend::parser::{CompletionKind, CompletionResults};
use crate::frontend::source::SourceManager;
use crate::CompilerInstance;

use super::{Cli, CliError, CliResult, ExitCode};

// ============================================================================
// Session
// ============================================================================

/// Run one compilation session and report its diagnostics.
pub fn compile(cli: &Cli) -> CliResult<ExitCode> {
    let invocation = build_invocation(cli)?;
    tracing::debug!(
        kind = %invocation.kind,
        module = %invocation.module_name,
        files = invocation.input_files.len(),
        "starting session"
    );

    let mut instance = CompilerInstance::new();
    if let Err(err) = instance.setup(invocation) {
        let rendered = instance.diags().render_all(instance.source_manager());
        let message = if rendered.is_empty() { format!("error: {err}") } else { rendered };
        return Err(CliError::failure(message.trim_end()));
    }

    instance.perform();

    let diags = instance.diags();
    if !diags.diagnostics().is_empty() {
        eprintln!("{}", diags.render_all(instance.source_manager()));
    }

    if cli.dump_decls {
        if let Some(unit) = instance.translation_unit() {
            print!("{}", dump_decls(&unit.file));
        }
        if let Some(sil) = instance.sil_module() {
            print!("{sil}");
        }
    }

    for results in instance.completion_results() {
        print!("{}", format_completions(results, instance.source_manager()));
    }

    if diags.had_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Translate flags into an [`Invocation`].
pub fn build_invocation(cli: &Cli) -> CliResult<Invocation> {
    let kind = SourceKind::from(cli.kind);
    let mut invocation = Invocation::new(kind)
        .with_parse_only(cli.parse_only)
        .with_parse_stdlib(cli.parse_stdlib)
        .with_immediate(cli.immediate)
        .with_delayed_function_bodies(cli.delay_bodies);

    let mut completion_path = None;
    if let Some(arg) = &cli.code_complete {
        let (path, offset) = parse_completion_arg(arg)?;
        let text = fs::read_to_string(&path)
            .map_err(|e| CliError::failure(format!("error: cannot read '{}': {e}", path.display())))?;
        if offset > text.len() {
            return Err(CliError::failure(format!(
                "error: completion offset {offset} is past the end of '{}' ({} bytes)",
                path.display(),
                text.len()
            )));
        }
        invocation = invocation.with_code_completion(InputBuffer::new(path.display().to_string(), text), offset);
        completion_path = Some(path);
    }

    invocation.input_files = cli
        .files
        .iter()
        .filter(|file| completion_path.as_ref() != Some(*file))
        .cloned()
        .collect();

    if matches!(kind, SourceKind::Main | SourceKind::Sil) {
        let inputs = invocation.input_files.len() + usize::from(completion_path.is_some());
        if inputs != 1 {
            return Err(CliError::failure(format!(
                "error: a {kind} session takes exactly one input file, got {inputs}"
            )));
        }
    }

    invocation.module_name = match &cli.module_name {
        Some(name) if lexer::is_identifier(name) => name.clone(),
        Some(name) => return Err(CliError::failure(format!("error: '{name}' is not a valid module name"))),
        None => derive_module_name(completion_path.iter().chain(&invocation.input_files)),
    };

    invocation.import_search_paths = cli.import_paths.clone();
    invocation.sdk_path = cli.sdk.clone();
    if let Some(target) = &cli.target {
        invocation.target_triple = target.clone();
    }
    invocation.runtime_include_path = cli
        .runtime_include
        .clone()
        .or_else(invocation::find_runtime_include_dir);
    invocation.module_cache_path = cli.module_cache.clone();
    invocation.native_args = cli.native_args.clone();

    Ok(invocation)
}

/// Split `FILE:OFFSET`. The last colon separates, so paths may contain colons.
pub fn parse_completion_arg(arg: &str) -> CliResult<(PathBuf, usize)> {
    let Some((path, offset)) = arg.rsplit_once(':') else {
        return Err(CliError::failure(format!(
            "error: expected FILE:OFFSET for --code-complete, got '{arg}'"
        )));
    };
    if path.is_empty() {
        return Err(CliError::failure("error: --code-complete needs a file name"));
    }
    let offset = offset
        .parse::<usize>()
        .map_err(|_| CliError::failure(format!("error: invalid completion offset '{offset}'")))?;
    Ok((PathBuf::from(path), offset))
}

/// The first input's file stem when it is a usable identifier, otherwise `main`.
fn derive_module_name<'a>(mut inputs: impl Iterator<Item = &'a PathBuf>) -> String {
    inputs
        .next()
        .and_then(|path| Path::new(path).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| lexer::is_identifier(stem))
        .map_or_else(|| DEFAULT_MODULE_NAME.to_string(), str::to_string)
}

// ============================================================================
// Output
// ============================================================================

/// One line per declaration, in source order.
pub fn dump_decls(sf: &SourceFile) -> String {
    let mut out = String::new();
    for decl in &sf.decls {
        // Writing to a String cannot fail.
        let _ = match &decl.kind {
            DeclKind::Import(import) => writeln!(out, "import {}", import.module.node),
            DeclKind::Var(var) => {
                let keyword = if var.mutable { "var" } else { "let" };
                writeln!(out, "{keyword} {}", var.name.node)
            }
            DeclKind::Func(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.node.as_str()).collect();
                let body = match &func.body {
                    Body::Parsed(stmts) => format!("{} stmt(s)", stmts.len()),
                    Body::Delayed { .. } => "delayed".to_string(),
                };
                writeln!(out, "func {}({}) {{ {body} }}", func.name.node, params.join(", "))
            }
            DeclKind::Type(ty) => {
                let fields: Vec<&str> = ty.fields.iter().map(|f| f.node.as_str()).collect();
                writeln!(out, "type {} {{ {} }}", ty.name.node, fields.join(", "))
            }
            DeclKind::TopLevelCode(_) => writeln!(out, "<top-level code>"),
        };
    }
    out
}

fn kind_label(kind: CompletionKind) -> &'static str {
    match kind {
        CompletionKind::Local => "local",
        CompletionKind::Parameter => "parameter",
        CompletionKind::Function => "function",
        CompletionKind::Variable => "variable",
        CompletionKind::Type => "type",
        CompletionKind::Module => "module",
        CompletionKind::Keyword => "keyword",
    }
}

pub fn format_completions(results: &CompletionResults, sm: &SourceManager) -> String {
    let (line, column) = sm.line_and_column(results.loc);
    let mut out = format!("completions at {}:{line}:{column}\n", sm.identifier(results.loc.buffer));
    for item in &results.items {
        let _ = writeln!(out, "  {} ({})", item.name, kind_label(item.kind));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::Parser;

    use super::*;
    use crate::frontend::diagnostics::DiagnosticEngine;
    use crate::frontend::parser::{self, PersistentParserState};

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ternc"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn completion_argument_splits_on_the_last_colon() {
        assert_eq!(
            parse_completion_arg("dir:with:colons/main.tern:42").unwrap(),
            (PathBuf::from("dir:with:colons/main.tern"), 42)
        );
        assert!(parse_completion_arg("main.tern").is_err());
        assert!(parse_completion_arg("main.tern:x").is_err());
        assert!(parse_completion_arg(":3").is_err());
    }

    #[test]
    fn module_name_comes_from_the_first_file_stem() {
        let invocation = build_invocation(&cli(&["--kind", "library", "geometry.tern", "more.tern"])).unwrap();
        assert_eq!(invocation.module_name, "geometry");
        assert_eq!(invocation.kind, SourceKind::Library);

        let invocation = build_invocation(&cli(&["my-script.tern"])).unwrap();
        assert_eq!(invocation.module_name, DEFAULT_MODULE_NAME);

        let invocation = build_invocation(&cli(&["--module-name", "App", "x.tern"])).unwrap();
        assert_eq!(invocation.module_name, "App");

        assert!(build_invocation(&cli(&["--module-name", "1bad", "x.tern"])).is_err());
    }

    #[test]
    fn main_sessions_need_exactly_one_input() {
        let err = build_invocation(&cli(&["a.tern", "b.tern"])).unwrap_err();
        assert!(err.message.contains("exactly one input file, got 2"), "{}", err.message);
        assert!(build_invocation(&cli(&["--kind", "library", "a.tern", "b.tern"])).is_ok());
    }

    #[test]
    fn flags_flow_into_the_invocation() {
        let invocation = build_invocation(&cli(&[
            "--parse-only",
            "--delay-bodies",
            "--target",
            "wasm32-unknown-none",
            "--sdk",
            "/sdk",
            "--Xnative",
            "-DX",
            "-I",
            "lib",
            "main.tern",
        ]))
        .unwrap();
        assert!(invocation.parse_only);
        assert!(invocation.delay_function_bodies);
        assert_eq!(invocation.target_triple, "wasm32-unknown-none");
        assert_eq!(invocation.sdk_path, Some(PathBuf::from("/sdk")));
        assert_eq!(invocation.native_args, vec!["-DX".to_string()]);
        assert_eq!(invocation.import_search_paths, vec![PathBuf::from("lib")]);
        assert_eq!(invocation.input_files, vec![PathBuf::from("main.tern")]);
    }

    #[test]
    fn dump_lists_declarations_in_source_order() {
        let mut sm = SourceManager::new();
        let mut diags = DiagnosticEngine::new();
        let source = "import Util\nlet a = 1\nvar b = a\nfunc add(x, y) { return x + y }\ntype Point { x, y }\nprint(a)\n";
        let buffer = sm.add_buffer(source.to_string(), "main.tern");
        let mut sf = SourceFile::new(SourceKind::Main, false);
        let mut state = PersistentParserState::new();
        while !parser::parse_into_source_file(&mut sf, buffer, &sm, &mut diags, None, &mut state, None) {}
        assert!(!diags.had_error());

        insta::assert_snapshot!(dump_decls(&sf).trim_end(), @r"
        import Util
        let a
        var b
        func add(x, y) { 1 stmt(s) }
        type Point { x, y }
        <top-level code>
        ");
    }
}
