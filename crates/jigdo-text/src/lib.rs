#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `jigdo-text` parses and serializes the `.jigdo` text index format: the
//! ini-like file that maps each component md5sum named in a `.template`
//! file to a set of candidate download URLs, optionally indirected through
//! `[Servers]` labels (spec.md §4.6 "`.jigdo` text format").
//!
//! # Design
//!
//! - [`line`]/[`file`] model the file as an ordered sequence of
//!   [`line::Line`]s, preserving exact source text (including line
//!   endings) so an unmodified file serializes back byte-for-byte.
//! - [`cursor::SectionCursor`] walks `[Section]` headers in file order,
//!   matching the original reader's single forward pass; callers build a
//!   [`graph::UrlGraph`] by feeding each `[Servers]`/`[Parts]` entry to
//!   [`graph::UrlGraph::add_server`]/[`graph::UrlGraph::add_part`] as they
//!   are found.
//! - [`graph::UrlGraph`] is the directed acyclic graph of label
//!   substitutions: each node holds a URL fragment, an optional `prepend`
//!   pointer to the label it references, and a `next` pointer chaining
//!   alternative mappings for the same label or md5sum.
//!   [`graph::UrlEnumerator`] performs the depth-first, weighted
//!   best-path search the original job/url-mapping.cc uses to return
//!   URLs in descending preference order without repeats.
//! - [`split`] implements the shell-style word splitting and quoting
//!   `[Parts]`/`[Servers]` entry values use to separate a URL from
//!   trailing `--try-first`/`--try-last` options.
//! - [`version`] gates on the `[Jigdo] Version=` entry so a future
//!   incompatible major version is rejected instead of misread.
//!
//! # Invariants
//!
//! - [`file::JigdoFile::serialize`] applied to an unmodified
//!   [`file::JigdoFile::parse`] result reproduces the input exactly.
//! - [`graph::UrlGraph::add_server`] rejects a label definition that
//!   would make a node transitively prepend itself
//!   ([`error::TextError::RecursiveLabel`]), so
//!   [`graph::UrlEnumerator::next`] always terminates.
//! - [`graph::UrlEnumerator::next`] never returns the same URL twice for
//!   a given enumerator instance.
//!
//! # Errors
//!
//! [`error::TextError`] covers recursive label definitions, unsupported
//! format versions, and malformed version/md5 values.
//!
//! # Examples
//!
//! ```
//! use jigdo_text::{split_words, UrlGraph};
//!
//! let mut graph = UrlGraph::new();
//! graph
//!     .add_server("", "Debian", &split_words("http://ftp.debian.org/"))
//!     .unwrap();
//! let md5 = [0u8; 16];
//! graph
//!     .add_part("", md5, &split_words("Debian:pool/main/a.deb"))
//!     .unwrap();
//!
//! let mut urls = graph.enumerate(&md5).unwrap();
//! assert_eq!(
//!     urls.next(&graph).as_deref(),
//!     Some("http://ftp.debian.org/pool/main/a.deb")
//! );
//! ```
//!
//! # See also
//!
//! - The `checksums` crate, which renders MD5 sums through the same
//!   modified Base64 alphabet `[Parts]` labels use.
//! - The root `jigdo` facade crate, which ties image reconstruction to
//!   URLs resolved here.

mod cursor;
mod error;
mod file;
mod graph;
mod line;
mod split;
mod version;

pub use cursor::SectionCursor;
pub use error::TextError;
pub use file::JigdoFile;
pub use graph::{NodeId, UrlEnumerator, UrlGraph, RANDOM_INIT_RANGE};
pub use line::{label_offsets, Line, LineEnding};
pub use split::{quote, split_words};
pub use version::{Version, SUPPORTED_MAJOR};

/// Decode a `[Parts]` section label (the component's md5sum, modified
/// Base64 encoded) to its raw 16 bytes.
///
/// # Errors
///
/// Returns [`TextError::InvalidMd5Label`] if the decoded value is not
/// exactly 16 bytes long.
pub fn decode_md5_label(label: &str) -> Result<[u8; 16], TextError> {
    let bytes = checksums::base64::decode(label);
    bytes.try_into().map_err(|_| TextError::InvalidMd5Label {
        label: label.to_string(),
    })
}

/// Build a [`UrlGraph`] from a parsed `.jigdo` file's `[Servers]` and
/// `[Parts]` sections, resolving relative URLs against `base_url`.
/// Sections are processed in file order, so later entries for the same
/// label or md5sum become additional alternatives rather than replacing
/// earlier ones, matching a single forward pass over the file.
///
/// # Errors
///
/// Returns [`TextError::RecursiveLabel`] if a `[Servers]` entry closes a
/// label substitution cycle, or [`TextError::InvalidMd5Label`] if a
/// `[Parts]` label does not decode to a 16-byte md5sum.
pub fn build_graph(file: &JigdoFile, base_url: &str) -> Result<UrlGraph, TextError> {
    let mut graph = UrlGraph::new();
    let mut cursor = SectionCursor::new(file);

    while let Some(section) = cursor.next_section() {
        let Some(name) = file.line_at(section).and_then(Line::section_name) else {
            continue;
        };
        match name {
            "Servers" => {
                for (label, value) in file.entries_in_section(section) {
                    let words = split_words(value);
                    graph.add_server(base_url, label, &words)?;
                }
            }
            "Parts" => {
                for (label, value) in file.entries_in_section(section) {
                    let md5 = decode_md5_label(label)?;
                    let words = split_words(value);
                    graph.add_part(base_url, md5, &words)?;
                }
            }
            _ => {}
        }
    }
    Ok(graph)
}

/// Read the `[Jigdo] Version=` entry, if present.
///
/// # Errors
///
/// Returns [`TextError::InvalidVersion`] if the entry's value does not
/// parse as `major.minor`.
pub fn file_version(file: &JigdoFile) -> Result<Option<Version>, TextError> {
    let mut cursor = SectionCursor::new(file);
    let Some(section) = cursor.next_section_named("Jigdo") else {
        return Ok(None);
    };
    match file.find_entry(section, "Version") {
        Some(value) => Version::parse(value).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_graph_from_full_file() {
        let data = b"[Jigdo]\n\
Version=1.0\n\
\n\
[Servers]\n\
Debian=http://ftp.debian.org/debian/\n\
\n\
[Parts]\n";
        let mut text = data.to_vec();
        let md5 = checksums::strong::Md5::digest(b"hello");
        let label = checksums::base64::encode(&md5);
        text.extend_from_slice(format!("{label}=Debian:pool/main/a.deb\n").as_bytes());

        let file = JigdoFile::parse(&text);
        assert_eq!(
            file_version(&file).unwrap(),
            Some(Version { major: 1, minor: 0 })
        );

        let graph = build_graph(&file, "").unwrap();
        let mut urls = graph.enumerate(&md5).unwrap();
        assert_eq!(
            urls.next(&graph).as_deref(),
            Some("http://ftp.debian.org/debian/pool/main/a.deb")
        );
    }

    #[test]
    fn rejects_malformed_md5_label() {
        let data = b"[Parts]\nnot-a-valid-md5=http://h/x\n";
        let file = JigdoFile::parse(data);
        let err = build_graph(&file, "").unwrap_err();
        assert!(matches!(err, TextError::InvalidMd5Label { .. }));
    }
}
