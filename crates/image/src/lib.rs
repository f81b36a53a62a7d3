#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Decodes a template stream written by the `template` crate's encoder and
//! drives it through to a reconstructed image, in any of three modes: a
//! single complete pass, a best-effort pass that zero-pads what's missing
//! and records what it couldn't write, or a resumption of that best-effort
//! pass once more component files have become available.
//!
//! # Design
//!
//! - [`TemplateHeader::parse`] locates the header lines and the trailing
//!   `DESC` section of a full template by seeking to `EOF-6`.
//! - [`read_trailing_descriptors`] does the same for a bare temporary
//!   file, which has no header lines of its own — just raw image bytes
//!   followed directly by an appended `DESC` section.
//! - [`GlueReader`] hides `DATA`-part boundaries from callers that just
//!   want the next `N` decompressed glue bytes.
//! - [`ImageReconstructor`] drives the descriptor table: `single_pass`
//!   fails outright on a missing component, `create_tmp` zero-pads and
//!   appends its own descriptor table, `merge_tmp` resumes a `create_tmp`
//!   output by validating and filling in what it can.
//! - [`ComponentProvider`] is the seam a caller plugs a `cache::ComponentPool`
//!   (or any other MD5-keyed lookup) into.
//!
//! # Invariants
//!
//! - A `DESC` section's `ImageInfo` record is always the final entry.
//! - `ImageReconstructor::merge_tmp` never trusts a prior temp file's
//!   descriptor table until every non-status field (size, rolling sum,
//!   MD5) has been checked against the current template.
//!
//! # Errors
//!
//! [`ImageError`] covers malformed template/temp-file framing, a missing
//! or checksum-mismatched component file, a whole-image checksum mismatch,
//! and cooperative cancellation.
//!
//! # Examples
//!
//! ```
//! use checksums::strong::Md5;
//! use matching::MatchEvent;
//! use progress::NullReporter;
//! use template::{Codec, EncoderConfig, TemplateEncoder};
//!
//! let config = EncoderConfig {
//!     codec: Codec::Deflate,
//!     zipped_buf_sz: 1 << 16,
//!     block_len: 512,
//!     comment: "example".into(),
//! };
//! let glue = vec![0u8; 256];
//! let mut template_bytes = Vec::new();
//! let mut encoder = TemplateEncoder::new(&mut template_bytes, config).unwrap();
//! encoder
//!     .push_event(&MatchEvent::Unmatched { len: 256 }, &glue, &NullReporter)
//!     .unwrap();
//! encoder.finish().unwrap();
//!
//! struct NoFiles;
//! impl image::ComponentProvider for NoFiles {
//!     fn locate(&self, _md5: &[u8; 16]) -> Option<&std::path::Path> {
//!         None
//!     }
//! }
//!
//! let mut reconstructed = Vec::new();
//! image::ImageReconstructor::single_pass(
//!     std::io::Cursor::new(&template_bytes),
//!     &mut reconstructed,
//!     Codec::Deflate,
//!     &NoFiles,
//!     &NullReporter,
//! )
//! .unwrap();
//! assert_eq!(reconstructed, glue);
//! let _ = Md5::digest(&reconstructed);
//! ```
//!
//! # See also
//!
//! - The `template` crate, which writes what this crate decodes.
//! - The `cache` crate's `ComponentPool`, the usual [`ComponentProvider`].

mod error;
mod reader;
mod reconstructor;

pub use error::ImageError;
pub use reader::{read_trailing_descriptors, GlueReader, TemplateHeader};
pub use reconstructor::{ComponentProvider, ImageReconstructor, ReconstructMode};
