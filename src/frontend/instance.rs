//! The compilation session.
//!
//! A [`CompilerInstance`] turns an [`Invocation`] into a parsed and type-checked
//! [`TranslationUnit`] in two steps:
//!
//! 1. [`CompilerInstance::setup`] builds the type context and its loader chain and registers every
//!    input buffer with the source manager.
//! 2. [`CompilerInstance::perform`] parses and checks the buffers. A library is parsed in one go
//!    and checked once. A main or low-level IR file is pumped: each parser call appends a chunk
//!    of declarations, which is checked before the next chunk is parsed.
//!
//! ## Notes
//! - One instance is one disposable unit of work. Nothing is shared between instances.
//! - Setup failures are reported as diagnostics first; [`SetupError`] only says which step failed.
//! - Buffer ids are assigned in a fixed order: the code-completion buffer, the input files, then
//!   the preloaded buffers.
//!
//! ## Examples
//! ```rust
//! use tern::frontend::ast::SourceKind;
//! use tern::frontend::invocation::Invocation;
//! use tern::CompilerInstance;
//!
//! let mut instance = CompilerInstance::new();
//! let invocation = Invocation::new(SourceKind::Main).with_input_buffer("main.tern", "let a = 1\nprint(a)\n");
//! instance.setup(invocation).expect("setup");
//! instance.perform();
//! assert!(!instance.diags().had_error());
//! assert_eq!(instance.translation_unit().map(|tu| tu.file.decls.len()), Some(2));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::frontend::ast::SourceKind;
use crate::frontend::context::AstContext;
use crate::frontend::diagnostics::{DiagId, DiagnosticEngine};
use crate::frontend::invocation::Invocation;
use crate::frontend::lexer;
use crate::frontend::loaders::{
    ModuleLoader, NativeImporter, NativeImporterCtor, NativeImporterOptions, SerializedModuleLoader, SourceLoader,
    native_importer_ctor,
};
use crate::frontend::module::TranslationUnit;
use crate::frontend::parser::{
    self, CodeCompletionFactory, CompletionCollector, CompletionResults, DelayedParsingPolicy, PersistentParserState,
    SilSink,
};
use crate::frontend::source::{BufferId, SourceManager};
use crate::frontend::typechecker::{TypeCheckDriver, TypeChecker};
use crate::sil::SilModule;

/// Why setup stopped. The matching diagnostic has already been emitted.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("an SDK was specified, but native-interop support is not available in this build")]
    MissingNativeInteropSupport,
    #[error("could not initialize the native-interop importer for SDK '{}'", sdk.display())]
    NativeInteropInitFailed { sdk: PathBuf },
    #[error("error opening input file '{}'", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct CompilerInstance {
    invocation: Invocation,
    diags: DiagnosticEngine,
    sm: SourceManager,
    /// Kept after a failed setup so the partial loader chain can be inspected.
    context: Option<AstContext>,
    setup_succeeded: bool,
    buffers: Vec<BufferId>,
    sil_module: Option<SilModule>,
    unit: Option<TranslationUnit>,
    native_ctor: Option<NativeImporterCtor>,
    completion_results: Vec<CompletionResults>,
}

impl Default for CompilerInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerInstance {
    pub fn new() -> Self {
        Self {
            invocation: Invocation::default(),
            diags: DiagnosticEngine::new(),
            sm: SourceManager::new(),
            context: None,
            setup_succeeded: false,
            buffers: Vec::new(),
            sil_module: None,
            unit: None,
            native_ctor: native_importer_ctor(),
            completion_results: Vec::new(),
        }
    }

    /// Replace the native-interop importer constructor. `None` behaves like a build without
    /// native-interop support. Takes effect at the next [`setup`](Self::setup).
    pub fn set_native_importer_ctor(&mut self, ctor: Option<NativeImporterCtor>) {
        self.native_ctor = ctor;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn diags(&self) -> &DiagnosticEngine {
        &self.diags
    }

    pub fn source_manager(&self) -> &SourceManager {
        &self.sm
    }

    pub fn context(&self) -> Option<&AstContext> {
        self.context.as_ref()
    }

    /// Input buffers in registration order.
    pub fn input_buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    pub fn sil_module(&self) -> Option<&SilModule> {
        self.sil_module.as_ref()
    }

    pub fn translation_unit(&self) -> Option<&TranslationUnit> {
        self.unit.as_ref()
    }

    /// Completion results produced by [`perform`](Self::perform).
    pub fn completion_results(&self) -> &[CompletionResults] {
        &self.completion_results
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Prepare the session: type context, loader chain and input buffers.
    ///
    /// ## Panics
    /// When the configured module name is not a valid identifier.
    #[tracing::instrument(skip_all, fields(kind = %invocation.kind, module = %invocation.module_name))]
    pub fn setup(&mut self, invocation: Invocation) -> Result<(), SetupError> {
        self.setup_succeeded = false;
        let result = self.setup_impl(&invocation);
        self.setup_succeeded = result.is_ok();
        self.invocation = invocation;
        if let Err(err) = &result {
            tracing::debug!(error = %err, "setup failed");
        }
        result
    }

    fn setup_impl(&mut self, invocation: &Invocation) -> Result<(), SetupError> {
        let mut ctx = AstContext::new(invocation.import_search_paths.clone());
        ctx.add_module_loader(ModuleLoader::Source(SourceLoader::new(!invocation.immediate)), false);
        ctx.add_module_loader(ModuleLoader::Serialized(SerializedModuleLoader), false);

        if let Some(sdk) = &invocation.sdk_path {
            match self.create_native_importer(sdk, invocation) {
                Ok(importer) => ctx.add_module_loader(ModuleLoader::Native(importer), true),
                Err(err) => {
                    self.context = Some(ctx);
                    return Err(err);
                }
            }
        }

        if let Some(runtime) = &invocation.runtime_include_path {
            ctx.push_import_search_path(runtime.clone());
        }
        self.context = Some(ctx);

        assert!(
            lexer::is_identifier(&invocation.module_name),
            "INVARIANT: module name '{}' is not a valid identifier",
            invocation.module_name
        );

        if invocation.kind == SourceKind::Sil {
            self.sil_module = Some(SilModule::new());
        }

        if let Some(point) = &invocation.code_completion {
            let id = self.sm.add_buffer(point.buffer.text.clone(), point.buffer.name.clone());
            self.sm.set_code_completion_point(id, point.offset);
            self.buffers.push(id);
        }

        for path in &invocation.input_files {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(source) => {
                    self.diags
                        .diagnose(None, DiagId::ErrorOpenInputFile, &[&path.display(), &source]);
                    return Err(SetupError::FileOpen {
                        path: path.clone(),
                        source,
                    });
                }
            };
            let id = self.sm.add_buffer(text, path.display().to_string());
            self.buffers.push(id);
        }

        for buffer in &invocation.input_buffers {
            let id = self.sm.add_buffer(buffer.text.clone(), buffer.name.clone());
            self.buffers.push(id);
        }

        tracing::debug!(buffers = self.buffers.len(), "session set up");
        Ok(())
    }

    fn create_native_importer(&mut self, sdk: &Path, invocation: &Invocation) -> Result<NativeImporter, SetupError> {
        let Some(ctor) = self.native_ctor else {
            self.diags.diagnose(None, DiagId::ErrorNativeImporterNotLinkedIn, &[]);
            return Err(SetupError::MissingNativeInteropSupport);
        };
        let options = NativeImporterOptions {
            sdk_path: sdk.to_path_buf(),
            target_triple: invocation.target_triple.clone(),
            runtime_include_path: invocation.runtime_include_path.clone(),
            module_cache_path: invocation.module_cache_path.clone(),
            search_paths: invocation.import_search_paths.clone(),
            extra_args: invocation.native_args.clone(),
        };
        ctor(&options).ok_or_else(|| {
            self.diags
                .diagnose(None, DiagId::ErrorNativeImporterCreateFail, &[&sdk.display()]);
            SetupError::NativeInteropInitFailed { sdk: sdk.to_path_buf() }
        })
    }

    // ========================================================================
    // Parse / type-check run
    // ========================================================================

    /// Parse and type-check every input with the default checker. When a code-completion point
    /// was configured, results are available from [`completion_results`](Self::completion_results).
    pub fn perform(&mut self) {
        let mut checker = TypeChecker::new();
        let mut collector = CompletionCollector::new();
        self.perform_with(&mut checker, Some(&mut collector));
        self.completion_results = collector.into_results();
    }

    /// [`perform`](Self::perform) with a caller-supplied checker and completion factory.
    ///
    /// ## Panics
    /// - When called before a successful [`setup`](Self::setup).
    /// - When a main or low-level IR session does not have exactly one input buffer.
    #[tracing::instrument(skip_all, fields(kind = %self.invocation.kind, buffers = self.buffers.len()))]
    pub fn perform_with(
        &mut self,
        checker: &mut dyn TypeCheckDriver,
        completion: Option<&mut dyn CodeCompletionFactory>,
    ) {
        assert!(
            self.setup_succeeded,
            "INVARIANT: perform called without a successful setup"
        );
        let kind = self.invocation.kind;
        let Self {
            invocation,
            diags,
            sm,
            context,
            buffers,
            sil_module,
            unit,
            ..
        } = self;
        let ctx = context
            .as_mut()
            .expect("INVARIANT: perform called without a successful setup");

        let new_unit = TranslationUnit::new(invocation.module_name.clone(), kind, invocation.parse_stdlib);
        ctx.register_module(new_unit.as_module());
        let unit = unit.insert(new_unit);

        if kind == SourceKind::Repl {
            tracing::debug!("repl session: input is driven externally");
            return;
        }

        let policy = match sm.code_completion_loc() {
            Some(loc) => Some(DelayedParsingPolicy::DelayUntilCompletionPoint(loc)),
            None if invocation.delay_function_bodies => Some(DelayedParsingPolicy::AlwaysDelay),
            None => None,
        };
        let mut state = PersistentParserState::new();
        let sf = &mut unit.file;

        if kind == SourceKind::Library {
            for &buffer in buffers.iter() {
                let done = parser::parse_into_source_file(sf, buffer, sm, diags, None, &mut state, policy.as_ref());
                assert!(done, "INVARIANT: library buffer {buffer} was not parsed to completion");
            }
            if !invocation.parse_only {
                checker.check(ctx, sf, 0, sm, diags);
            }
        } else {
            assert!(
                buffers.len() == 1,
                "INVARIANT: a {kind} session needs exactly one input buffer, found {}",
                buffers.len()
            );
            let buffer = buffers[0];
            if kind == SourceKind::Main {
                sm.set_hashbang_buffer(buffer);
            }

            let mut processed = 0;
            let mut iterations = 0usize;
            loop {
                let sink = sil_module.as_mut().map(|m| m as &mut dyn SilSink);
                let done = parser::parse_into_source_file(sf, buffer, sm, diags, sink, &mut state, policy.as_ref());
                iterations += 1;
                tracing::debug!(iteration = iterations, from = processed, to = sf.decls.len(), done, "pumped chunk");
                if !invocation.parse_only {
                    checker.check(ctx, sf, processed, sm, diags);
                }
                processed = sf.decls.len();
                if done {
                    break;
                }
            }
        }

        if policy.is_some() {
            parser::perform_delayed_parsing(sf, &mut state, sm, diags, completion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::invocation::InputBuffer;

    #[test]
    fn sil_module_exists_only_for_low_level_ir_sessions() {
        let mut main = CompilerInstance::new();
        main.setup(Invocation::new(SourceKind::Main)).unwrap();
        assert!(main.sil_module().is_none());

        let mut sil = CompilerInstance::new();
        sil.setup(Invocation::new(SourceKind::Sil)).unwrap();
        assert!(sil.sil_module().is_some_and(SilModule::is_empty));
    }

    #[test]
    fn runtime_include_path_is_searched_last() {
        let mut instance = CompilerInstance::new();
        let invocation = Invocation::new(SourceKind::Library)
            .with_import_search_path("a")
            .with_import_search_path("b")
            .with_runtime_include_path("rt");
        instance.setup(invocation).unwrap();
        let paths = instance.context().unwrap().import_search_paths();
        assert_eq!(paths, &[PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("rt")]);
    }

    #[test]
    fn completion_buffer_is_registered_first() {
        let mut instance = CompilerInstance::new();
        let invocation = Invocation::new(SourceKind::Library)
            .with_input_buffer("other.tern", "let a = 1")
            .with_code_completion(InputBuffer::new("edit.tern", "let b = a"), 8);
        instance.setup(invocation).unwrap();

        let first = instance.input_buffers()[0];
        assert_eq!(instance.source_manager().identifier(first), "edit.tern");
        let loc = instance.source_manager().code_completion_loc().unwrap();
        assert_eq!((loc.buffer, loc.offset), (first, 8));
    }

    #[test]
    #[should_panic(expected = "INVARIANT: module name")]
    fn invalid_module_name_is_a_contract_violation() {
        let mut instance = CompilerInstance::new();
        let _ = instance.setup(Invocation::new(SourceKind::Library).with_module_name("not a name"));
    }

    #[test]
    #[should_panic(expected = "INVARIANT: perform called without a successful setup")]
    fn perform_after_failed_setup_is_a_contract_violation() {
        let mut instance = CompilerInstance::new();
        instance.set_native_importer_ctor(None);
        let result = instance.setup(Invocation::new(SourceKind::Library).with_sdk_path("/sdk"));
        assert!(result.is_err());
        assert!(instance.context().is_some());
        instance.perform();
    }

    #[test]
    #[should_panic(expected = "INVARIANT: perform called without a successful setup")]
    fn perform_before_setup_is_a_contract_violation() {
        CompilerInstance::new().perform();
    }

    #[test]
    #[should_panic(expected = "exactly one input buffer")]
    fn main_session_requires_one_buffer() {
        let mut instance = CompilerInstance::new();
        let invocation = Invocation::new(SourceKind::Main)
            .with_input_buffer("a.tern", "let a = 1")
            .with_input_buffer("b.tern", "let b = 2");
        instance.setup(invocation).unwrap();
        instance.perform();
    }
}
