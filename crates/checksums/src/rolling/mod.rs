//! Rolling checksums used to find candidate block matches while scanning an
//! image against a pool of component files.
//!
//! # Algorithm
//!
//! Both checksums split their state into two halves (16+16 bits for
//! [`RollingChecksum`], 32+32 bits for [`RollingChecksum64`]) so that a byte
//! can be appended to the back of the window, or removed from the front, in
//! O(1) time - no rescan of the window contents is needed. [`RollingChecksum64`]
//! additionally runs each byte through a fixed 256-entry lookup table rather
//! than the raw `byte + CHAR_OFFSET` term the 32-bit variant uses, since
//! simply widening the same arithmetic would barely improve collision
//! resistance.
//!
//! `CHAR_OFFSET` (and the table, for the 64-bit variant) exist purely to
//! avoid degenerate checksums for runs of identical bytes; neither has any
//! cryptographic significance.

mod checksum;
mod checksum64;
mod error;
mod digest;

pub use checksum::RollingChecksum;
pub use checksum64::RollingChecksum64;
pub use digest::RollingDigest;
pub use error::RollingError;
