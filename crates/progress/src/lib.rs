#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Every long-running operation in jigdo — scanning an image, re-reading a
//! component file, reconstructing an image, writing a template — reports
//! progress and accepts cancellation through a single [`Reporter`] trait
//! object passed in by the caller (spec.md §6 "`ProgressReporter`", §9
//! "pass an explicit `Reporter` handle into each top-level operation").
//! There is no global logger singleton here.
//!
//! # Design
//!
//! [`Reporter`] mirrors the callback surface of `MkTemplate::ProgressReporter`,
//! `JigdoCache::ProgressReporter` and `JigdoDesc::ProgressReporter` in the
//! original sources: `error`, `info`, `scanning_file`, `scanning_image`,
//! `reading_md5`, `writing_image`, `match_found`, `finished`. Every method
//! has a no-op default so a caller only overrides what it cares about, and
//! implementing [`Reporter`] costs nothing unless a method is overridden.
//!
//! [`NullReporter`] is the default no-op implementation. [`TracingReporter`]
//! (behind the `tracing` feature, gated exactly as the rest of the workspace
//! gates `tracing`) forwards every callback to a `tracing` event instead.
//!
//! # Invariants
//!
//! - Reporter methods are synchronous and single-threaded (spec.md §5
//!   "Cooperative progress callbacks"); callers never invoke them from more
//!   than one thread concurrently.
//! - A method returning [`Flow::Cancel`] must cause the driving operation to
//!   stop at the next safe point and surface a cancellation, not silently
//!   continue.
//!
//! # Errors
//!
//! This crate defines no error type of its own; [`Flow`] is a cooperative
//! cancellation signal, not an error. Callers that want a cancellation to
//! become an error convert `Flow::Cancel` into their own error type at the
//! call site (spec.md §9 "allow it to return a cancellation signal rather
//! than requiring it to throw").
//!
//! # Examples
//!
//! ```
//! use progress::{Flow, NullReporter, Reporter};
//!
//! let reporter = NullReporter;
//! assert_eq!(reporter.scanning_image(0, 100), Flow::Continue);
//! ```
//!
//! # See also
//!
//! - The `matching` crate's scanner, which calls `scanning_image` roughly
//!   every 256 kB (spec.md §5 "Suspension points").
//! - The `image` crate's reconstructor, which calls `writing_image`.

use std::fmt;

/// Cooperative cancellation signal returned by every [`Reporter`] callback.
///
/// A reporter that wants to abort the operation in progress returns
/// [`Flow::Cancel`]; the driving code checks this after every callback and
/// converts it into its own error type (spec.md §5 "Cancellation").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Flow {
    /// Keep going.
    Continue,
    /// Stop at the next safe point.
    Cancel,
}

impl Flow {
    /// Returns `true` if this is [`Flow::Cancel`].
    #[must_use]
    pub const fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancel)
    }
}

/// Marker error produced when a [`Reporter`] requests cancellation.
///
/// Implements [`std::error::Error`] so it composes with the `thiserror`
/// `#[from]` conversions used throughout the other crates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation cancelled by progress reporter")
    }
}

impl std::error::Error for Cancelled {}

impl Flow {
    /// Converts [`Flow::Cancel`] into `Err(Cancelled)`, leaving
    /// [`Flow::Continue`] as `Ok(())`. Convenience for call sites that want
    /// to propagate cancellation with `?`.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `self` is [`Flow::Cancel`].
    pub const fn into_result(self) -> Result<(), Cancelled> {
        match self {
            Self::Continue => Ok(()),
            Self::Cancel => Err(Cancelled),
        }
    }
}

/// Callback surface consumed by image scanning, template writing and image
/// reconstruction (spec.md §6 "Consumed collaborator interfaces" —
/// `ProgressReporter`).
///
/// Every method defaults to a no-op returning [`Flow::Continue`]; a caller
/// implements only the callbacks it cares about.
pub trait Reporter {
    /// A non-fatal but user-visible error occurred (e.g. an excluded file).
    fn error(&self, message: &str) -> Flow {
        let _ = message;
        Flow::Continue
    }

    /// Informational message, no severity implied.
    fn info(&self, message: &str) -> Flow {
        let _ = message;
        Flow::Continue
    }

    /// Progress while computing a component file's own checksums.
    fn scanning_file(&self, leafname: &str, offset: u64) -> Flow {
        let _ = (leafname, offset);
        Flow::Continue
    }

    /// Progress while scanning the image for matches.
    fn scanning_image(&self, offset: u64, total: u64) -> Flow {
        let _ = (offset, total);
        Flow::Continue
    }

    /// Progress while hashing an MD5 block for partial-match verification.
    fn reading_md5(&self, offset: u64, size: u64) -> Flow {
        let _ = (offset, size);
        Flow::Continue
    }

    /// Progress while writing the reconstructed image.
    fn writing_image(&self, written: u64, total: u64, image_offset: u64, image_size: u64) -> Flow {
        let _ = (written, total, image_offset, image_size);
        Flow::Continue
    }

    /// A component file match was confirmed at `image_offset`.
    fn match_found(&self, leafname: &str, image_offset: u64) -> Flow {
        let _ = (leafname, image_offset);
        Flow::Continue
    }

    /// The operation completed; `image_size` is the final image size.
    fn finished(&self, image_size: u64) -> Flow {
        let _ = image_size;
        Flow::Continue
    }
}

/// [`Reporter`] that discards every callback. The default choice for
/// callers that don't want progress output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// [`Reporter`] that forwards every callback to a `tracing` event, gated
/// behind the `tracing` feature exactly as the rest of the workspace gates
/// instrumentation.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

#[cfg(feature = "tracing")]
impl Reporter for TracingReporter {
    fn error(&self, message: &str) -> Flow {
        tracing::error!(message, "jigdo error");
        Flow::Continue
    }

    fn info(&self, message: &str) -> Flow {
        tracing::info!(message, "jigdo info");
        Flow::Continue
    }

    fn scanning_file(&self, leafname: &str, offset: u64) -> Flow {
        tracing::debug!(leafname, offset, "scanning component file");
        Flow::Continue
    }

    fn scanning_image(&self, offset: u64, total: u64) -> Flow {
        tracing::debug!(offset, total, "scanning image");
        Flow::Continue
    }

    fn reading_md5(&self, offset: u64, size: u64) -> Flow {
        tracing::trace!(offset, size, "reading md5 block");
        Flow::Continue
    }

    fn writing_image(&self, written: u64, total: u64, image_offset: u64, image_size: u64) -> Flow {
        tracing::debug!(written, total, image_offset, image_size, "writing image");
        Flow::Continue
    }

    fn match_found(&self, leafname: &str, image_offset: u64) -> Flow {
        tracing::info!(leafname, image_offset, "match found");
        Flow::Continue
    }

    fn finished(&self, image_size: u64) -> Flow {
        tracing::info!(image_size, "operation finished");
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reporter_always_continues() {
        let reporter = NullReporter;
        assert_eq!(reporter.error("x"), Flow::Continue);
        assert_eq!(reporter.scanning_image(1, 2), Flow::Continue);
        assert_eq!(reporter.finished(100), Flow::Continue);
    }

    #[test]
    fn flow_into_result() {
        assert!(Flow::Continue.into_result().is_ok());
        assert!(Flow::Cancel.into_result().is_err());
    }

    struct CancelAfterFirst {
        calls: std::cell::Cell<u32>,
    }

    impl Reporter for CancelAfterFirst {
        fn scanning_image(&self, _offset: u64, _total: u64) -> Flow {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n == 0 {
                Flow::Continue
            } else {
                Flow::Cancel
            }
        }
    }

    #[test]
    fn custom_reporter_can_cancel() {
        let reporter = CancelAfterFirst {
            calls: std::cell::Cell::new(0),
        };
        assert_eq!(reporter.scanning_image(0, 10), Flow::Continue);
        assert_eq!(reporter.scanning_image(1, 10), Flow::Cancel);
    }
}
