//! Native-interop importer: exposes C headers as importable modules.
//!
//! `import Foo` resolves to `Foo.h`, searched under `<sdk>/usr/include`, then any `-I` directories
//! from the extra arguments, then the runtime include path and the import search paths. Function
//! prototypes and object-like `#define`s become exported symbols. Member signatures are opaque to
//! the type checker, so only names are recorded reliably.
//!
//! ## Notes
//! - The importer is optional. Builds without the `native-interop` feature have no constructor and
//!   sessions that name an SDK fail setup.
//! - Construction validates its configuration; see [`NativeImporterError`].

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tern_core::lang::stdlib;

use super::{ExportedSymbol, LoadError, Module, ModuleOrigin, SymbolKind, find_in_dirs};

/// Everything the importer is configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeImporterOptions {
    pub sdk_path: PathBuf,
    pub target_triple: String,
    pub runtime_include_path: Option<PathBuf>,
    pub module_cache_path: Option<PathBuf>,
    pub search_paths: Vec<PathBuf>,
    /// Raw importer arguments, e.g. `-I/opt/include` or `-DDEBUG=1`.
    pub extra_args: Vec<String>,
}

/// Constructs an importer, or returns `None` when it cannot be initialized.
pub type NativeImporterCtor = fn(&NativeImporterOptions) -> Option<NativeImporter>;

/// The constructor linked into this build, if any.
pub fn native_importer_ctor() -> Option<NativeImporterCtor> {
    #[cfg(feature = "native-interop")]
    {
        Some(NativeImporter::create as NativeImporterCtor)
    }
    #[cfg(not(feature = "native-interop"))]
    {
        None
    }
}

#[derive(Debug, Error)]
pub enum NativeImporterError {
    #[error("SDK directory '{}' does not exist", .0.display())]
    SdkNotFound(PathBuf),
    #[error("unsupported native-interop argument '{0}'")]
    UnsupportedArgument(String),
    #[error("cannot create module cache '{}': {source}", path.display())]
    ModuleCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeImporter {
    target_triple: String,
    /// Header directories in lookup order, before the import search paths.
    header_dirs: Vec<PathBuf>,
    defines: Vec<String>,
    module_cache_path: Option<PathBuf>,
}

impl NativeImporter {
    pub fn new(options: &NativeImporterOptions) -> Result<Self, NativeImporterError> {
        if !options.sdk_path.is_dir() {
            return Err(NativeImporterError::SdkNotFound(options.sdk_path.clone()));
        }

        let mut header_dirs = vec![options.sdk_path.join("usr").join("include")];
        let mut defines = Vec::new();
        for arg in &options.extra_args {
            if let Some(dir) = arg.strip_prefix("-I") {
                header_dirs.push(PathBuf::from(dir));
            } else if let Some(define) = arg.strip_prefix("-D") {
                defines.push(define.to_string());
            } else {
                return Err(NativeImporterError::UnsupportedArgument(arg.clone()));
            }
        }
        header_dirs.extend(options.runtime_include_path.iter().cloned());
        header_dirs.extend(options.search_paths.iter().cloned());

        if let Some(cache) = &options.module_cache_path {
            fs::create_dir_all(cache).map_err(|source| NativeImporterError::ModuleCache {
                path: cache.clone(),
                source,
            })?;
        }

        Ok(Self {
            target_triple: options.target_triple.clone(),
            header_dirs,
            defines,
            module_cache_path: options.module_cache_path.clone(),
        })
    }

    /// [`NativeImporterCtor`] entry point; the reason for a failure is logged.
    pub fn create(options: &NativeImporterOptions) -> Option<Self> {
        match Self::new(options) {
            Ok(importer) => Some(importer),
            Err(err) => {
                tracing::warn!(error = %err, sdk = %options.sdk_path.display(), "native-interop importer unavailable");
                None
            }
        }
    }

    pub fn target_triple(&self) -> &str {
        &self.target_triple
    }

    pub fn header_dirs(&self) -> &[PathBuf] {
        &self.header_dirs
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    pub fn module_cache_path(&self) -> Option<&Path> {
        self.module_cache_path.as_deref()
    }

    pub fn try_load(&self, name: &str, search_paths: &[PathBuf]) -> Result<Option<Module>, LoadError> {
        let dirs = self.header_dirs.iter().chain(search_paths);
        let Some(path) = find_in_dirs(dirs, name, stdlib::NATIVE_HEADER_EXTENSION) else {
            return Ok(None);
        };
        let text = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
        let symbols = scan_header(&text);
        tracing::debug!(module = name, path = %path.display(), symbols = symbols.len(), "imported native header");
        Ok(Some(Module {
            name: name.to_string(),
            origin: ModuleOrigin::Native(path),
            symbols,
        }))
    }
}

/// Collect prototypes (`int f(int a, char *b);`) and object-like macros from a header.
fn scan_header(text: &str) -> Vec<ExportedSymbol> {
    let mut symbols = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("#define") {
            let name: String = rest
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            let function_like = rest.trim_start()[name.len()..].starts_with('(');
            if !name.is_empty() && !function_like {
                symbols.push(ExportedSymbol::new(name, SymbolKind::Variable, None));
            }
            continue;
        }
        if line.starts_with('#') || line.starts_with("//") || line.starts_with("typedef") || !line.ends_with(");") {
            continue;
        }
        let Some(open) = line.find('(') else {
            continue;
        };
        let name: String = line[..open]
            .trim_end()
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if name.is_empty() || name.len() == line[..open].trim_end().len() {
            // No return type in front of the name: not a prototype.
            continue;
        }
        let params = line[open + 1..line.len() - 2].trim();
        let arity = match params {
            "" | "void" => 0,
            _ if params.contains("...") => {
                symbols.push(ExportedSymbol::new(name, SymbolKind::Function, None));
                continue;
            }
            _ => params.split(',').count(),
        };
        symbols.push(ExportedSymbol::new(name, SymbolKind::Function, Some(arity)));
    }
    symbols
}
