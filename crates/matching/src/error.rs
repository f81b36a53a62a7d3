use std::io;

/// Errors raised while scanning an image for component-file matches.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Reading the image stream failed.
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),

    /// A partial match needed to re-read bytes from its candidate file and
    /// that read failed. Per spec.md §4.1 "Failure semantics", this is
    /// fatal for template creation.
    #[error("failed to re-read component file during verification: {0}")]
    ReRead(io::Error),

    /// The progress reporter requested cancellation.
    #[error(transparent)]
    Cancelled(#[from] progress::Cancelled),
}
