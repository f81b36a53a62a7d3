use std::io;

/// Errors surfaced by the top-level [`crate::create_template`] and
/// [`crate::reconstruct_image`] entry points, converging the five
/// lower-level crates' error types into one.
#[derive(Debug, thiserror::Error)]
pub enum JigdoError {
    /// An I/O error not otherwise attributable to one of the lower-level
    /// crates (e.g. opening the image or template file).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Scanning the image for component-file matches failed.
    #[error(transparent)]
    Match(#[from] matching::MatchError),

    /// Populating or loading component-file checksums failed.
    #[error(transparent)]
    Cache(#[from] cache::CacheError),

    /// Reading or writing a template stream failed.
    #[error(transparent)]
    Template(#[from] template::TemplateError),

    /// Reconstructing an image from a template failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Parsing or building a `.jigdo` text index failed.
    #[error(transparent)]
    Text(#[from] jigdo_text::TextError),
}
