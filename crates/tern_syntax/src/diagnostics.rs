//! Diagnostics sink and rendering.
//!
//! Every stage reports problems through [`DiagnosticEngine::diagnose`] as a `(location, id,
//! arguments)` triple. The engine only records; it never fails and never aborts the caller, so a
//! session keeps going and surfaces as many diagnostics as it can per invocation.
//!
//! Rendering to text goes through `miette`'s graphical report handler, with the buffer text from
//! the [`SourceManager`] attached as source code.
//!
//! ## Examples
//! ```rust
//! use tern_syntax::diagnostics::{DiagId, DiagnosticEngine};
//!
//! let mut diags = DiagnosticEngine::new();
//! diags.diagnose(None, DiagId::ErrorNoSuchModule, &[&"Foundation"]);
//! assert!(diags.had_error());
//! assert_eq!(diags.diagnostics()[0].message(), "no such module 'Foundation'");
//! ```

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, MietteDiagnostic, NamedSource, Report};

use crate::source::{SourceManager, SourceRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Catalog of every diagnostic the frontend can emit.
///
/// Messages are templates; `{0}`, `{1}`, ... are replaced by the arguments passed to
/// [`DiagnosticEngine::diagnose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagId {
    // Session setup
    ErrorOpenInputFile,
    ErrorNativeImporterNotLinkedIn,
    ErrorNativeImporterCreateFail,

    // Lexing
    ErrorLexUnexpectedChar,
    ErrorLexUnterminatedString,
    ErrorLexInvalidInteger,
    ErrorHashbangNotAllowed,

    // Parsing
    ErrorExpected,
    ErrorExpectedDecl,
    ErrorExprAtTopLevel,
    ErrorSilOutsideSilMode,
    ErrorSilRedefinition,

    // Module loading
    ErrorNoSuchModule,
    ErrorMalformedModuleFile,

    // Type checking
    ErrorInvalidRedeclaration,
    ErrorUnresolvedIdentifier,
    ErrorNoMemberInModule,
    ErrorCallArity,
    ErrorNotCallable,
    NotePreviousDeclaration,
    WarningDuplicateImport,
}

impl DiagId {
    /// Stable snake-case name, used as the diagnostic code.
    pub fn name(self) -> &'static str {
        match self {
            DiagId::ErrorOpenInputFile => "error_open_input_file",
            DiagId::ErrorNativeImporterNotLinkedIn => "error_native_importer_not_linked_in",
            DiagId::ErrorNativeImporterCreateFail => "error_native_importer_create_fail",
            DiagId::ErrorLexUnexpectedChar => "error_lex_unexpected_char",
            DiagId::ErrorLexUnterminatedString => "error_lex_unterminated_string",
            DiagId::ErrorLexInvalidInteger => "error_lex_invalid_integer",
            DiagId::ErrorHashbangNotAllowed => "error_hashbang_not_allowed",
            DiagId::ErrorExpected => "error_expected",
            DiagId::ErrorExpectedDecl => "error_expected_decl",
            DiagId::ErrorExprAtTopLevel => "error_expr_at_top_level",
            DiagId::ErrorSilOutsideSilMode => "error_sil_outside_sil_mode",
            DiagId::ErrorSilRedefinition => "error_sil_redefinition",
            DiagId::ErrorNoSuchModule => "error_no_such_module",
            DiagId::ErrorMalformedModuleFile => "error_malformed_module_file",
            DiagId::ErrorInvalidRedeclaration => "error_invalid_redeclaration",
            DiagId::ErrorUnresolvedIdentifier => "error_use_of_unresolved_identifier",
            DiagId::ErrorNoMemberInModule => "error_no_member_in_module",
            DiagId::ErrorCallArity => "error_call_arity",
            DiagId::ErrorNotCallable => "error_not_callable",
            DiagId::NotePreviousDeclaration => "note_previous_declaration",
            DiagId::WarningDuplicateImport => "warning_duplicate_import",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagId::NotePreviousDeclaration => Severity::Note,
            DiagId::WarningDuplicateImport => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn template(self) -> &'static str {
        match self {
            DiagId::ErrorOpenInputFile => "error opening input file '{0}' ({1})",
            DiagId::ErrorNativeImporterNotLinkedIn => {
                "an SDK was specified, but native-interop support is not available in this build"
            }
            DiagId::ErrorNativeImporterCreateFail => "could not initialize the native-interop importer for SDK '{0}'",
            DiagId::ErrorLexUnexpectedChar => "unexpected character '{0}'",
            DiagId::ErrorLexUnterminatedString => "unterminated string literal",
            DiagId::ErrorLexInvalidInteger => "integer literal '{0}' is out of range",
            DiagId::ErrorHashbangNotAllowed => "a '#!' line is only allowed at the start of the main file",
            DiagId::ErrorExpected => "expected {0}, found {1}",
            DiagId::ErrorExpectedDecl => "expected declaration, found {0}",
            DiagId::ErrorExprAtTopLevel => "expressions are not allowed at the top level of a library",
            DiagId::ErrorSilOutsideSilMode => "'sil' definitions are only allowed in low-level IR input",
            DiagId::ErrorSilRedefinition => "redefinition of low-level function '@{0}'",
            DiagId::ErrorNoSuchModule => "no such module '{0}'",
            DiagId::ErrorMalformedModuleFile => "malformed module file '{0}': {1}",
            DiagId::ErrorInvalidRedeclaration => "invalid redeclaration of '{0}'",
            DiagId::ErrorUnresolvedIdentifier => "use of unresolved identifier '{0}'",
            DiagId::ErrorNoMemberInModule => "module '{0}' has no member named '{1}'",
            DiagId::ErrorCallArity => "'{0}' takes {1} argument(s) but {2} were given",
            DiagId::ErrorNotCallable => "cannot call '{0}': it is not a function",
            DiagId::NotePreviousDeclaration => "'{0}' previously declared here",
            DiagId::WarningDuplicateImport => "module '{0}' is already imported",
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub loc: Option<SourceRange>,
    pub id: DiagId,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.id.severity()
    }

    /// The message with arguments substituted.
    ///
    /// Placeholders are expanded in one pass over the template, so argument text is never
    /// rescanned. A placeholder without a matching argument is kept as written.
    pub fn message(&self) -> String {
        let template = self.id.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let arg = after.find('}').and_then(|close| {
                let index = after[..close].parse::<usize>().ok()?;
                Some((self.args.get(index)?, close))
            });
            match arg {
                Some((arg, close)) => {
                    message.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = after;
                }
            }
        }
        message.push_str(rest);
        message
    }

    /// Render with source context.
    ///
    /// Falls back to a single `severity: message` line when the location is unknown or the report
    /// handler fails.
    pub fn render(&self, sm: &SourceManager) -> String {
        let plain = format!("{}: {}", self.severity(), self.message());
        let Some(loc) = self.loc else {
            return plain;
        };
        let Some(buffer) = sm.buffer(loc.buffer) else {
            return plain;
        };

        let severity = match self.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Note => miette::Severity::Advice,
        };
        let end = loc.span.end.max(loc.span.start).min(buffer.text.len());
        let start = loc.span.start.min(end);
        let diag = MietteDiagnostic::new(self.message())
            .with_code(self.id.name())
            .with_severity(severity)
            .with_label(LabeledSpan::at(start..end, "here"));
        let report =
            Report::new(diag).with_source_code(NamedSource::new(buffer.identifier.clone(), buffer.text.clone()));

        let mut out = String::new();
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        match handler.render_report(&mut out, &*report) {
            Ok(()) => out,
            Err(_) => plain,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.message())
    }
}

/// The session's diagnostics sink.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Never fails.
    pub fn diagnose(&mut self, loc: Option<SourceRange>, id: DiagId, args: &[&dyn fmt::Display]) {
        let diag = Diagnostic {
            loc,
            id,
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        match diag.severity() {
            Severity::Error => tracing::debug!(code = id.name(), message = %diag.message(), "diagnosed error"),
            _ => tracing::trace!(code = id.name(), message = %diag.message(), "diagnosed"),
        }
        self.diagnostics.push(diag);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn had_error(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    /// Number of diagnostics with the given id.
    pub fn count(&self, id: DiagId) -> usize {
        self.diagnostics.iter().filter(|d| d.id == id).count()
    }

    pub fn render_all(&self, sm: &SourceManager) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(sm))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    #[test]
    fn message_substitutes_arguments_in_order() {
        let mut diags = DiagnosticEngine::new();
        diags.diagnose(None, DiagId::ErrorCallArity, &[&"f", &2, &3]);
        assert_eq!(diags.diagnostics()[0].message(), "'f' takes 2 argument(s) but 3 were given");
    }

    #[test]
    fn argument_text_is_not_substituted_again() {
        let mut diags = DiagnosticEngine::new();
        diags.diagnose(None, DiagId::ErrorOpenInputFile, &[&"dir/{1}.tern", &"not found"]);
        assert_eq!(diags.diagnostics()[0].message(), "error opening input file 'dir/{1}.tern' (not found)");

        let missing = Diagnostic {
            loc: None,
            id: DiagId::ErrorCallArity,
            args: vec!["f".into()],
        };
        assert_eq!(missing.message(), "'f' takes {1} argument(s) but {2} were given");
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = DiagnosticEngine::new();
        diags.diagnose(None, DiagId::WarningDuplicateImport, &[&"M"]);
        diags.diagnose(None, DiagId::NotePreviousDeclaration, &[&"x"]);
        assert!(!diags.had_error());
        assert_eq!(diags.count(DiagId::WarningDuplicateImport), 1);
    }

    #[test]
    fn render_without_location_is_a_single_line() {
        let sm = SourceManager::new();
        let mut diags = DiagnosticEngine::new();
        diags.diagnose(None, DiagId::ErrorNativeImporterNotLinkedIn, &[]);
        insta::assert_snapshot!(
            diags.render_all(&sm),
            @"error: an SDK was specified, but native-interop support is not available in this build"
        );
    }

    #[test]
    fn render_with_location_names_the_buffer() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("let x = y\n".into(), "main.tern");
        let mut diags = DiagnosticEngine::new();
        diags.diagnose(
            Some(SourceRange::new(id, Span::new(8, 9))),
            DiagId::ErrorUnresolvedIdentifier,
            &[&"y"],
        );
        let rendered = diags.render_all(&sm);
        assert!(rendered.contains("use of unresolved identifier 'y'"), "{rendered}");
        assert!(rendered.contains("main.tern"), "{rendered}");
    }
}
