#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Locates component files inside an image by rolling a checksum window
//! across every byte offset, narrowing candidates with a hash table keyed
//! on the first block's checksum, and confirming candidates block-by-block
//! with MD5 (spec.md §4.1 "Matching algorithm").
//!
//! # Design
//!
//! The scan keeps a bounded [`partial::PartialMatchQueue`] of in-flight
//! candidates rather than verifying every hash-table hit eagerly, mirroring
//! `MkTemplate::scan`'s main loop: a [`hash_table::HashTable`] narrows
//! candidates by rolling sum, the queue tracks which of those candidates
//! have had some prefix of their MD5 blocks confirmed, and a match is
//! emitted only once a candidate's last block verifies.
//!
//! # Invariants
//!
//! - `0 < block_len < md5_block_len` (spec.md §4.1 contract); callers
//!   supply files already filtered by [`cache::ComponentPool::eligible`].
//! - [`scanner::MatchEvent`]s are emitted in strictly increasing image
//!   offset order and partition the image exactly (every byte is covered
//!   by exactly one event).
//!
//! # Errors
//!
//! [`error::MatchError`] covers I/O failure and cooperative cancellation
//! via [`progress::Reporter`].
//!
//! # Examples
//!
//! ```
//! use matching::{scan, FileCandidate, MatchParams};
//! use progress::NullReporter;
//!
//! let file = vec![b'A'; 64];
//! let mut rolling = checksums::RollingChecksum64::new();
//! rolling.update(&file[..16]);
//! let candidate = FileCandidate {
//!     index: 0,
//!     size: file.len() as u64,
//!     first_block_rolling: rolling,
//!     md5_blocks: vec![checksums::strong::Md5::digest(&file)],
//!     whole_file_md5: checksums::strong::Md5::digest(&file),
//!     label: "dirA".into(),
//!     path: "a.bin".into(),
//! };
//! let events = scan(
//!     &file,
//!     &[candidate],
//!     MatchParams { block_len: 16, md5_block_len: 64, read_amount: 4096 },
//!     None,
//!     &NullReporter,
//! )
//! .unwrap();
//! assert_eq!(events.len(), 1);
//! ```
//!
//! # See also
//!
//! - The `template` crate, which turns [`scanner::MatchEvent`]s into
//!   descriptor records.
//! - The `cache` crate, which supplies already-hashed
//!   [`cache::ComponentFile`] entries.

mod error;
mod hash_table;
mod partial;
mod scanner;

pub use error::MatchError;
pub use partial::{PartialMatch, PartialMatchQueue};
pub use scanner::{scan, FileCandidate, MatchAction, MatchContext, MatchEvent, MatchParams};
