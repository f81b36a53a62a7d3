use std::io;

/// Errors raised while encoding or decoding a template stream.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The stream ended before a length-prefixed field could be read in
    /// full, or a write failed.
    #[error("template I/O error: {0}")]
    Io(#[from] io::Error),

    /// A 4-byte part tag was neither `DATA` nor `DESC`.
    #[error("unrecognised template part tag {tag:?}")]
    UnknownPartTag {
        /// The four raw bytes read from the stream.
        tag: [u8; 4],
    },

    /// A descriptor record's 1-byte type tag was not one of the known
    /// modern or legacy values (spec.md §3 "Descriptor record on wire").
    #[error("unrecognised descriptor tag {0}")]
    UnknownDescriptorTag(u8),

    /// The `DESC` section's leading and trailing 6-byte length fields
    /// disagreed, or a field value fell outside the documented range.
    #[error("malformed DESC section: {0}")]
    MalformedDesc(String),

    /// The compressor or decompressor backend reported a failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// The progress reporter requested cancellation.
    #[error(transparent)]
    Cancelled(#[from] progress::Cancelled),
}
