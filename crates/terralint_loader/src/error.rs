//! Loader error types.

use thiserror::Error;

use crate::source::SourceRange;

/// Errors that can occur while loading a configuration tree.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HCL syntax error.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// A module call chain loops back onto an already-loaded directory.
    #[error("Module call cycle detected: {chain}")]
    ModuleCycle { chain: String },

    /// A local module source does not exist on disk.
    #[error("Module directory {source_addr:?} not found ({range})")]
    ModuleNotFound {
        source_addr: String,
        range: SourceRange,
    },

    /// A file-scoped suppression annotation placed anywhere but the very
    /// first line and column of a file.
    #[error("terralint-ignore-file annotation must be written at the top of file, found at {range}")]
    MisplacedFileAnnotation { range: SourceRange },
}
