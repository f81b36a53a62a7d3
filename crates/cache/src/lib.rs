#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! This crate owns the per-file state the scanner needs: a
//! [`ComponentFile`] entry per component (path, size, mtime, label, lazily
//! computed checksums) collected into a [`ComponentPool`], and a
//! [`SumCache`] that persists those checksums across runs so an unchanged
//! file is never re-hashed (spec.md §3 "File entry", §4.6 "Cache of
//! per-file sums").
//!
//! # Design
//!
//! - [`ComponentFile::ensure_sums`] computes the rolling sum of the first
//!   `block_len` bytes, the MD5 of each `md5_block_len` chunk, and the
//!   whole-file MD5 in a single streaming pass.
//! - [`ComponentPool`] owns many entries and assigns auto-generated labels
//!   (`dirA`, `dirB`, ...) to files whose caller didn't supply one.
//! - [`SumCache`] is a `serde_json`-backed sidecar keyed by leafname,
//!   invalidated whenever `size`/`mtime`/`block_len`/`md5_block_len`
//!   disagree with the live file (spec.md §4.6, §8 property 10 "cache
//!   soundness"). Dirty entries flush to disk on drop as well as on an
//!   explicit [`SumCache::flush`] call, and [`SumCache::purge_expired`]
//!   evicts entries older than a caller-supplied expiry.
//!
//! # Invariants
//!
//! - [`ComponentFile::ignored`] files are never matched and their size is
//!   reported as zero (spec.md §3).
//! - A [`SumCache`] hit is only ever returned when every one of
//!   size/mtime/block_len/md5_block_len agrees with the caller's current
//!   parameters; any disagreement is treated as a miss, never a partial
//!   reuse.
//!
//! # Errors
//!
//! [`CacheError`] covers I/O failure while reading a component file and
//! corruption/write failure of the on-disk sum cache.
//!
//! # Examples
//!
//! ```
//! use cache::ComponentPool;
//!
//! let mut pool = ComponentPool::new();
//! assert_eq!(pool.next_auto_label(), "dirA");
//! assert_eq!(pool.next_auto_label(), "dirB");
//! ```
//!
//! # See also
//!
//! - The `matching` crate, which reads [`ComponentFile::sums`] while
//!   building its hash table of candidate files.
//! - The `image` crate's decoder, which calls
//!   [`ComponentPool::find_by_md5`] to resolve a descriptor's MD5 to a file
//!   on disk.

mod error;
mod file;
mod sumcache;

pub use error::CacheError;
pub use file::{ComponentFile, ComponentPool, FileSums};
pub use sumcache::SumCache;
