use std::io;

/// Errors raised while decoding a template or reconstructing an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Reading or writing the template/image stream failed.
    #[error("image I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template stream itself was malformed.
    #[error("malformed template: {0}")]
    Template(#[from] template::TemplateError),

    /// A component file's bytes, once hashed, didn't match its descriptor's
    /// recorded MD5 (spec.md §4.3 "Verification").
    #[error("component file for {leaf} failed MD5 verification")]
    ComponentMismatch {
        /// The file's label-qualified leaf name, for diagnostics.
        leaf: String,
    },

    /// The fully reconstructed image's MD5 did not match
    /// `ImageInfo.md5` (spec.md §4.3 "Image-level checksum").
    #[error("reconstructed image MD5 does not match ImageInfo.md5")]
    ImageMismatch,

    /// A component file required to complete the image was not supplied
    /// (spec.md §4.3 "fail if any file missing", SINGLE_PASS mode).
    #[error("missing component file with MD5 {md5}")]
    MissingComponent {
        /// Base64 (modified-alphabet) rendering of the missing file's MD5,
        /// for diagnostics.
        md5: String,
    },

    /// A prior temporary file's trailing descriptor table didn't match the
    /// current template (spec.md §4.3 "Reading a temporary file").
    #[error("temporary file descriptor table does not match template: {0}")]
    TempMismatch(String),

    /// The progress reporter requested cancellation.
    #[error(transparent)]
    Cancelled(#[from] progress::Cancelled),
}
