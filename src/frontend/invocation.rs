//! Session configuration.
//!
//! An [`Invocation`] is everything a [`CompilerInstance`](crate::CompilerInstance) needs to know
//! before setup: what kind of input it compiles, where the inputs come from and how imports are
//! resolved. It is plain data; the CLI fills it from flags and tests build it directly.
//!
//! ## Examples
//! ```rust
//! use tern::frontend::ast::SourceKind;
//! use tern::frontend::invocation::Invocation;
//!
//! let invocation = Invocation::new(SourceKind::Library)
//!     .with_module_name("Geometry")
//!     .with_input_buffer("shapes.tern", "type Point { x, y }\n")
//!     .with_import_search_path("lib");
//! assert_eq!(invocation.input_buffers.len(), 1);
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::frontend::ast::SourceKind;

/// Module name used when none is configured.
pub const DEFAULT_MODULE_NAME: &str = "main";

/// Environment variable naming the runtime include directory.
pub const RUNTIME_INCLUDE_ENV: &str = "TERN_RUNTIME_INCLUDE";

/// An in-memory input. Its text is copied into the session on setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    pub name: String,
    pub text: String,
}

impl InputBuffer {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// The buffer being edited and the byte offset of the cursor in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCompletionPoint {
    pub buffer: InputBuffer,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kind: SourceKind,
    pub module_name: String,
    pub input_files: Vec<PathBuf>,
    pub input_buffers: Vec<InputBuffer>,
    pub import_search_paths: Vec<PathBuf>,
    /// Enables the native-interop importer.
    pub sdk_path: Option<PathBuf>,
    pub target_triple: String,
    pub runtime_include_path: Option<PathBuf>,
    pub module_cache_path: Option<PathBuf>,
    /// Passed through to the native-interop importer.
    pub native_args: Vec<String>,
    /// Parse without type checking.
    pub parse_only: bool,
    /// The input is the standard library itself.
    pub parse_stdlib: bool,
    /// Imported source modules are parsed with their bodies (for immediate execution).
    pub immediate: bool,
    pub delay_function_bodies: bool,
    pub code_completion: Option<CodeCompletionPoint>,
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new(SourceKind::Main)
    }
}

impl Invocation {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            input_files: Vec::new(),
            input_buffers: Vec::new(),
            import_search_paths: Vec::new(),
            sdk_path: None,
            target_triple: host_triple(),
            runtime_include_path: None,
            module_cache_path: None,
            native_args: Vec::new(),
            parse_only: false,
            parse_stdlib: false,
            immediate: false,
            delay_function_bodies: false,
            code_completion: None,
        }
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_files.push(path.into());
        self
    }

    pub fn with_input_buffer(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.input_buffers.push(InputBuffer::new(name, text));
        self
    }

    pub fn with_import_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_search_paths.push(path.into());
        self
    }

    pub fn with_sdk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sdk_path = Some(path.into());
        self
    }

    pub fn with_target_triple(mut self, triple: impl Into<String>) -> Self {
        self.target_triple = triple.into();
        self
    }

    pub fn with_runtime_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.runtime_include_path = Some(path.into());
        self
    }

    pub fn with_module_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_cache_path = Some(path.into());
        self
    }

    pub fn with_native_arg(mut self, arg: impl Into<String>) -> Self {
        self.native_args.push(arg.into());
        self
    }

    pub fn with_parse_only(mut self, parse_only: bool) -> Self {
        self.parse_only = parse_only;
        self
    }

    pub fn with_parse_stdlib(mut self, parse_stdlib: bool) -> Self {
        self.parse_stdlib = parse_stdlib;
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_delayed_function_bodies(mut self, delay: bool) -> Self {
        self.delay_function_bodies = delay;
        self
    }

    pub fn with_code_completion(mut self, buffer: InputBuffer, offset: usize) -> Self {
        self.code_completion = Some(CodeCompletionPoint { buffer, offset });
        self
    }
}

/// `<arch>-unknown-<os>` for the machine running the compiler.
pub fn host_triple() -> String {
    format!("{}-unknown-{}", env::consts::ARCH, env::consts::OS)
}

/// Locate the runtime include directory when none was configured.
///
/// Tries, in order: the `TERN_RUNTIME_INCLUDE` environment variable, `./runtime`, then `runtime`
/// next to the executable and up to two levels above it (for `target/debug` layouts).
pub fn find_runtime_include_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(RUNTIME_INCLUDE_ENV) {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    let local = Path::new("runtime");
    if local.is_dir() {
        return Some(local.to_path_buf());
    }

    let exe = env::current_exe().ok()?;
    exe.ancestors()
        .skip(1)
        .take(3)
        .map(|dir| dir.join("runtime"))
        .find(|candidate| candidate.is_dir())
}
