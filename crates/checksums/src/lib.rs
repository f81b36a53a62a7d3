#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the three checksum primitives the jigdo template
//! format is built on: the rolling sums used to find candidate block matches
//! while scanning an image, MD5 as the strong digest that confirms a match
//! and verifies reconstructed output, and the modified Base64 codec used to
//! render an MD5 sum as ASCII inside `.jigdo` files and template headers.
//!
//! # Design
//!
//! - [`rolling`] implements [`RollingChecksum`] (32-bit) and
//!   [`RollingChecksum64`] (64-bit), both updatable in O(1) time per
//!   one-byte shift of the window.
//! - [`strong`] exposes [`strong::Md5`], a streaming MD5 hasher with a
//!   `finish_for_reuse` that keeps internal padding state so a subsequent
//!   `reset` is cheap, and `update_from_reader` for hashing a file through a
//!   caller-supplied buffer size with incremental progress callbacks.
//! - [`base64`] encodes/decodes the modified alphabet (`A-Za-z0-9-_`, no
//!   padding) used for every MD5 sum that appears in jigdo text.
//!
//! Every primitive here takes its configuration (window length, buffer size,
//! alphabet) as an explicit parameter rather than process-global state, so
//! the crate has no global mutable state to reason about.
//!
//! # Invariants
//!
//! - `RollingChecksum`/`RollingChecksum64` truncate their internal state to
//!   16+16 and 32+32 bits respectively after every update; `roll` on an empty
//!   window returns [`RollingError::EmptyWindow`] instead of panicking.
//! - [`strong::Md5`] never panics; incremental `update` accepts any byte
//!   slice and `finalize` always returns a 16-byte digest.
//! - [`base64::decode`] never panics on malformed input: unrecognised bytes
//!   are silently skipped rather than rejected.
//!
//! # Errors
//!
//! [`RollingError`] is the only fallible primitive in this crate and
//! implements [`std::error::Error`].
//!
//! # Examples
//!
//! ```
//! use checksums::RollingChecksum64;
//!
//! let mut rolling = RollingChecksum64::new();
//! rolling.update(b"abcdefgh");
//! rolling.roll(b'a', b'i').unwrap();
//!
//! let mut fresh = RollingChecksum64::new();
//! fresh.update(b"bcdefghi");
//! assert_eq!((rolling.lo(), rolling.hi()), (fresh.lo(), fresh.hi()));
//! ```
//!
//! ```
//! use checksums::strong::Md5;
//! use checksums::base64;
//!
//! let digest = Md5::digest(b"hello");
//! let text = base64::encode(&digest);
//! assert_eq!(base64::decode(&text), digest);
//! ```
//!
//! # See also
//!
//! - The `matching` crate, which buckets component files by the upper bits
//!   of their [`RollingChecksum64`] and confirms hits with [`strong::Md5`].
//! - The `template` crate, which writes MD5 sums into descriptor records and
//!   the `jigdo-text` crate, which renders them through [`base64`].

pub mod base64;
mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, RollingChecksum64, RollingDigest, RollingError};
