//! Canonical standard-library and file naming.

/// Module imported implicitly by every file that is not itself the standard library.
pub const STDLIB_MODULE: &str = "Tern";

/// Extension of tern source files.
pub const SOURCE_EXTENSION: &str = "tern";

/// Extension of serialized module interfaces.
pub const SERIALIZED_EXTENSION: &str = "ternmodule";

/// Extension of native-interop headers.
pub const NATIVE_HEADER_EXTENSION: &str = "h";
