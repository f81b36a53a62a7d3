#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Binary codec for the jigdo template stream (spec.md §3 "Template
//! stream" / §4.2): header lines, `DATA` parts holding compressed glue
//! bytes, and a trailing `DESC` section of fixed-size descriptor records
//! locatable by seeking to `EOF-6`.
//!
//! # Design
//!
//! - [`descriptor::Descriptor`] collapses the original sources' `FileDesc`
//!   class hierarchy into one tagged enum, reading both modern (5/2/6/7)
//!   and legacy (1/3/4) wire tags.
//! - [`parts`] frames `DATA`/`DESC` parts; [`wire`] provides the 6-byte
//!   little-endian integers the format uses throughout.
//! - [`compression`] wraps `flate2` (raw deflate) and `bzip2` behind a
//!   small [`compression::Compressor`]/[`compression::decompress`] pair,
//!   grounded on the teacher's `compress::zlib::CountingZlibEncoder`
//!   counting-encoder shape.
//! - [`encoder::TemplateEncoder`] drives a [`matching::MatchEvent`] stream
//!   into a complete template, chunking compressed output at a
//!   configurable `zipped_buf_sz` and computing the whole-stream MD5 used
//!   as `Template-MD5Sum` in the jigdo text file.
//!
//! The companion decoder (`TemplateReader`, `ImageReconstructor`) lives in
//! the `image` crate, which reuses [`descriptor`] and [`parts`] directly.
//!
//! # Invariants
//!
//! - A `DESC` section's leading and trailing 6-byte lengths always agree
//!   (spec.md §6 "seek 6 bytes before EOF").
//! - `ImageInfo` is always the last descriptor written.
//!
//! # Errors
//!
//! [`TemplateError`] covers I/O failure, malformed framing, unknown tags
//! and cooperative cancellation.
//!
//! # Examples
//!
//! ```
//! use matching::MatchEvent;
//! use progress::NullReporter;
//! use template::{Codec, EncoderConfig, TemplateEncoder};
//!
//! let config = EncoderConfig {
//!     codec: Codec::Deflate,
//!     zipped_buf_sz: 1 << 16,
//!     block_len: 1024,
//!     comment: "example".into(),
//! };
//! let mut out = Vec::new();
//! let mut encoder = TemplateEncoder::new(&mut out, config).unwrap();
//! let glue = vec![0u8; 512];
//! encoder
//!     .push_event(&MatchEvent::Unmatched { len: 512 }, &glue, &NullReporter)
//!     .unwrap();
//! let template_md5 = encoder.finish().unwrap();
//! assert_eq!(template_md5.len(), 16);
//! ```
//!
//! # See also
//!
//! - The `image` crate, which decodes what this crate encodes.
//! - The `jigdo-text` crate, which records `Template-MD5Sum`.

mod compression;
mod descriptor;
mod encoder;
mod error;
pub mod parts;
pub mod wire;

pub use compression::{decompress, Codec, Compressor};
pub use descriptor::Descriptor;
pub use encoder::{EncoderConfig, TemplateEncoder, HEADER_LINE};
pub use error::TemplateError;
pub use parts::{read_part_body, read_tag, write_data_part, write_desc_part, DataPart, PartBody};
