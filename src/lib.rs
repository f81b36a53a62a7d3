#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `jigdo` is a pure-Rust reimplementation of the Jigsaw Download template
//! and index format: a scheme for distributing a large image (a CD/DVD ISO,
//! typically) as a small binary *template* plus a set of ordinary files the
//! recipient is expected to already have or fetch separately, so only the
//! bytes unique to the image need to travel over the wire (spec.md §1/§2).
//!
//! This crate is a thin facade over six independently usable crates:
//!
//! - [`checksums`] — rolling and strong (MD5) checksums, modified Base64.
//! - [`progress`] — the cooperative [`progress::Reporter`] trait shared by
//!   every long-running operation below.
//! - [`cache`] — per-component-file checksum bookkeeping and its on-disk
//!   cache.
//! - [`matching`] — scans an image against a set of candidate files and
//!   produces a stream of matched/unmatched runs.
//! - [`template`] — the binary template stream codec: header, `DATA`
//!   parts, and the trailing `DESC` descriptor table.
//! - [`image`] — reconstructs an image from a template plus located
//!   component files, in any of the three modes spec.md §4.3 describes.
//! - [`jigdo_text`] — the `.jigdo` text index format and its URL
//!   substitution graph.
//!
//! # Design
//!
//! [`create_template`] and [`reconstruct_image`] wire those crates
//! together for the two directions of spec.md §2 "Data flow": scanning an
//! image against known component files to produce a template
//! (create_template), and driving a template's descriptors back into a
//! full image given a way to locate each component file
//! (reconstruct_image). Nothing here prevents a caller from using the six
//! crates directly and skipping these entry points; they exist purely for
//! the common case.
//!
//! # Invariants
//!
//! - [`create_template`] only ever matches component files whose checksums
//!   were computed with the same `block_len`/`md5_block_len` as the scan
//!   (enforced by [`cache::ComponentFile::ensure_sums`]).
//! - [`reconstruct_image`]'s three [`image::ReconstructMode`] variants
//!   have the fatality behavior spec.md §4.3 describes: `SinglePass` fails
//!   on the first missing component, `CreateTmp` never fails on a missing
//!   component (it zero-pads instead), `MergeTmp` fails if the temp file's
//!   descriptor table disagrees with the current template.
//!
//! # Errors
//!
//! [`JigdoError`] converges every lower-level crate's error type via
//! `#[from]`, so callers that only use the facade entry points need a
//! single error type.
//!
//! # Examples
//!
//! ```
//! use cache::ComponentPool;
//! use jigdo::create_template;
//! use matching::MatchParams;
//! use progress::NullReporter;
//! use template::{Codec, EncoderConfig};
//!
//! let image = b"hello, world! this is image content.".to_vec();
//! let mut pool = ComponentPool::new();
//!
//! let config = EncoderConfig {
//!     codec: Codec::Deflate,
//!     zipped_buf_sz: 1 << 20,
//!     block_len: 4,
//!     comment: "demo".to_string(),
//! };
//! let params = MatchParams {
//!     block_len: 4,
//!     md5_block_len: 4,
//!     read_amount: 8192,
//! };
//!
//! let mut template_bytes = Vec::new();
//! let image_md5 = create_template(
//!     &image,
//!     &mut pool,
//!     params,
//!     config,
//!     &mut template_bytes,
//!     &NullReporter,
//! )
//! .unwrap();
//! assert_eq!(image_md5.len(), 16);
//! assert!(!template_bytes.is_empty());
//! ```
//!
//! # See also
//!
//! - spec.md for the full format description this workspace implements.
//! - Each member crate's own crate-level doc comment for the details this
//!   overview elides.

mod error;

use std::io::{Read, Seek, Write};

use cache::ComponentPool;
use matching::scan;
use progress::Reporter;
use template::TemplateEncoder;

pub use error::JigdoError;

// Re-export each member crate's public surface so a caller depending only
// on `jigdo` has everything spec.md names available at the crate root.
pub use cache::{CacheError, ComponentFile, FileSums};
pub use checksums::base64;
pub use checksums::strong::Md5;
pub use checksums::{RollingChecksum, RollingChecksum64};
pub use image::{ComponentProvider, ImageError, ImageReconstructor, ReconstructMode};
pub use jigdo_text::{
    build_graph, decode_md5_label, file_version, quote, split_words, JigdoFile, NodeId,
    SectionCursor, TextError, UrlEnumerator, UrlGraph, Version, RANDOM_INIT_RANGE, SUPPORTED_MAJOR,
};
pub use matching::{FileCandidate, MatchAction, MatchContext, MatchError, MatchEvent, MatchParams};
pub use progress::{Cancelled, Flow, NullReporter, Reporter};
#[cfg(feature = "tracing")]
pub use progress::TracingReporter;
pub use template::{
    read_part_body, read_tag, Codec, Descriptor, EncoderConfig, TemplateError, HEADER_LINE,
};

/// Scans `image` against the not-yet-ignored, large-enough-to-match files
/// in `pool` (computing their checksums first if `block_len`/
/// `md5_block_len` haven't already been cached for them) and writes a
/// complete template stream to `writer` (spec.md §2 "Data flow", encoder
/// direction).
///
/// Returns the whole image's MD5, the same value recorded in the
/// template's trailing `ImageInfo` descriptor.
///
/// # Errors
///
/// Returns [`JigdoError::Cache`] if a component file can't be read while
/// its checksums are being computed, [`JigdoError::Match`] if scanning is
/// cancelled by `reporter`, or [`JigdoError::Template`] on an I/O failure
/// writing the template.
pub fn create_template(
    image: &[u8],
    pool: &mut ComponentPool,
    params: MatchParams,
    config: EncoderConfig,
    writer: impl Write,
    reporter: &dyn Reporter,
) -> Result<[u8; 16], JigdoError> {
    for file in pool.files_mut() {
        file.ensure_sums(params.block_len, params.md5_block_len, reporter)?;
    }

    let candidates: Vec<FileCandidate> = pool
        .files()
        .iter()
        .enumerate()
        .filter_map(|(index, file)| FileCandidate::from_component(index, file))
        .collect();

    let events = scan(image, &candidates, params, None, reporter)?;

    let mut encoder = TemplateEncoder::new(writer, config)?;
    let mut pos = 0u64;
    for event in &events {
        let size = match event {
            MatchEvent::Unmatched { len } => *len,
            MatchEvent::Matched { size, .. } => *size,
        };
        let bytes = &image[pos as usize..(pos + size) as usize];
        encoder.push_event(event, bytes, reporter)?;
        pos += size;
    }

    Ok(encoder.finish()?)
}

/// Reconstructs an image from `template` plus a way to locate each
/// component file by its whole-file MD5 (spec.md §2 "Data flow", decoder
/// direction). Dispatches to the [`image::ReconstructMode`] variant that
/// matches `mode`; see [`image::ImageReconstructor`] for the exact
/// contract of each.
///
/// `tmp` is only read when `mode` is [`ReconstructMode::MergeTmp`]; pass
/// [`None`] for [`ReconstructMode::SinglePass`] and
/// [`ReconstructMode::CreateTmp`].
///
/// Returns `true` once the image is complete and verified; for
/// `SinglePass` this is always `true` on success (it returns an error
/// instead of ever reporting an incomplete image).
///
/// # Errors
///
/// See [`image::ImageReconstructor`]'s type-level docs.
///
/// # Panics
///
/// Panics if `mode` is [`ReconstructMode::MergeTmp`] and `tmp` is `None`.
pub fn reconstruct_image<R, W, P>(
    template: R,
    out: W,
    codec: Codec,
    mode: ReconstructMode,
    provider: &P,
    tmp: Option<&mut std::fs::File>,
    reporter: &dyn Reporter,
) -> Result<bool, JigdoError>
where
    R: Read + Seek,
    W: Write,
    P: ComponentProvider,
{
    match mode {
        ReconstructMode::SinglePass => {
            ImageReconstructor::single_pass(template, out, codec, provider, reporter)?;
            Ok(true)
        }
        ReconstructMode::CreateTmp => {
            Ok(ImageReconstructor::create_tmp(template, out, codec, provider, reporter)?)
        }
        ReconstructMode::MergeTmp => {
            let tmp = tmp.expect("merge_tmp requires an open temp file");
            Ok(ImageReconstructor::merge_tmp(template, tmp, codec, provider, reporter)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn create_template_round_trips_through_reconstruct() {
        let image = b"the quick brown fox jumps over the lazy dog, again and again.".to_vec();
        let mut pool = ComponentPool::new();

        let params = MatchParams {
            block_len: 8,
            md5_block_len: 8,
            read_amount: 8192,
        };
        let config = EncoderConfig {
            codec: Codec::Deflate,
            zipped_buf_sz: 1 << 20,
            block_len: 8,
            comment: "test".to_string(),
        };

        let mut template_bytes = Vec::new();
        let image_md5 = create_template(
            &image,
            &mut pool,
            params,
            config,
            &mut template_bytes,
            &NullReporter,
        )
        .unwrap();
        assert_eq!(image_md5, Md5::digest(&image));

        let mut out = Vec::new();
        let ok = reconstruct_image(
            Cursor::new(&template_bytes),
            &mut out,
            Codec::Deflate,
            ReconstructMode::SinglePass,
            &pool,
            None,
            &NullReporter,
        )
        .unwrap();
        assert!(ok);
        assert_eq!(out, image);
    }
}
