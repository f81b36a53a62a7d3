/// Errors raised while parsing or building the `.jigdo` text model.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// A `[Servers]` entry prepends a label to itself, directly or
    /// transitively, which would make URL enumeration recurse forever.
    #[error("recursive label definition for {label:?}")]
    RecursiveLabel {
        /// The label whose definition closes the cycle.
        label: String,
    },

    /// A `Version=` entry could not be parsed as `major.minor`.
    #[error("invalid version string {0:?}")]
    InvalidVersion(String),

    /// The file's declared format major version is newer than this
    /// implementation understands (spec.md §4.6 "Version gating").
    #[error("unsupported format version {found:?}, understand up to major version {supported}")]
    UnsupportedVersion {
        /// Version string found in the file.
        found: String,
        /// Highest major version this implementation understands.
        supported: u32,
    },

    /// A `[Parts]` or `[Servers]` entry had no URL value at all.
    #[error("empty value for label {label:?}")]
    EmptyValue {
        /// The label (or md5sum, formatted as hex) whose value was empty.
        label: String,
    },

    /// A `[Parts]` entry's label did not decode to a 16-byte MD5 sum.
    #[error("label {label:?} is not a valid base64-encoded md5sum")]
    InvalidMd5Label {
        /// The raw label text that failed to decode.
        label: String,
    },
}
