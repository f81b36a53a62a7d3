use std::io;
use std::path::PathBuf;

/// Errors raised while populating or loading component-file checksums.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading a component file failed. Per spec.md §4.1 "Failure
    /// semantics", an I/O error on a component file during scanning or
    /// re-reading is fatal for template creation.
    #[error("failed to read component file {path:?}: {source}")]
    Io {
        /// Path of the file that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The sum cache file on disk could not be parsed.
    #[error("failed to parse sum cache {path:?}: {source}")]
    CacheCorrupt {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the sum cache file back to disk failed.
    #[error("failed to write sum cache {path:?}: {source}")]
    CacheWrite {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
