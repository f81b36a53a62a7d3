//! Compressor/decompressor pair for the two codecs the template format
//! specifies (spec.md §3 "deflate or bzip2"), grounded on
//! `compress::zlib::CountingZlibEncoder`'s shape: never buffer the whole
//! output, expose a running byte counter instead.

use std::io::{self, Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression as BzCompression;
use flate2::write::DeflateEncoder;
use flate2::Compression as DeflateCompression;

/// Which codec a `DataPart` was compressed with. Stored in the encoder's
/// configuration, not on the wire: the template format has no per-part
/// codec tag, so a decoder must be told which codec the whole template
/// uses (the jigdo text file's `[Image]` section does not record this
/// either; in practice jigdo templates are always deflate, with bzip2 a
/// historical `--bzip2` option).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Codec {
    /// Raw deflate (RFC 1951), the default.
    Deflate,
    /// bzip2, selectable via the historical `--bzip2` flag.
    Bzip2,
}

/// Incremental compressor that accumulates compressed bytes into an
/// in-memory buffer and reports how many bytes it has produced, so a
/// caller can flush a `DATA` part once a size threshold is crossed.
pub struct Compressor {
    codec: Codec,
    inner: CompressorInner,
}

enum CompressorInner {
    Deflate(DeflateEncoder<Vec<u8>>),
    Bzip2(BzEncoder<Vec<u8>>),
}

impl Compressor {
    /// Creates a new compressor for `codec`.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        let inner = match codec {
            Codec::Deflate => {
                CompressorInner::Deflate(DeflateEncoder::new(Vec::new(), DeflateCompression::default()))
            }
            Codec::Bzip2 => CompressorInner::Bzip2(BzEncoder::new(Vec::new(), BzCompression::default())),
        };
        Self { codec, inner }
    }

    /// The codec this compressor was created for.
    #[must_use]
    pub const fn codec(&self) -> Codec {
        self.codec
    }

    /// Feeds `data` into the compression stream.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying compressor.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        match &mut self.inner {
            CompressorInner::Deflate(enc) => enc.write_all(data),
            CompressorInner::Bzip2(enc) => enc.write_all(data),
        }
    }

    /// Number of compressed bytes produced so far without finishing the
    /// stream.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        match &self.inner {
            CompressorInner::Deflate(enc) => enc.get_ref().len() as u64,
            CompressorInner::Bzip2(enc) => enc.get_ref().len() as u64,
        }
    }

    /// Finalises the stream and returns every compressed byte produced,
    /// leaving the compressor ready to start a fresh stream via
    /// [`Compressor::new`] for the next `DATA` part.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying compressor.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        match self.inner {
            CompressorInner::Deflate(enc) => enc.finish(),
            CompressorInner::Bzip2(enc) => enc.finish(),
        }
    }
}

/// Decompresses a single `DATA` part's payload in one call. The template
/// format's chunking means each part is independently decompressible, so
/// no streaming state needs to survive across parts.
///
/// # Errors
///
/// Returns [`io::Error`] if the compressed bytes are malformed or
/// `expected_len` isn't reached.
pub fn decompress(codec: Codec, compressed: &[u8], expected_len: u64) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len as usize);
    match codec {
        Codec::Deflate => {
            let mut decoder = flate2::read::DeflateDecoder::new(compressed);
            decoder.read_to_end(&mut out)?;
        }
        Codec::Bzip2 => {
            let mut decoder = BzDecoder::new(compressed);
            decoder.read_to_end(&mut out)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_round_trips() {
        let mut compressor = Compressor::new(Codec::Deflate);
        compressor.write(b"hello template world").unwrap();
        let compressed = compressor.finish().unwrap();
        let decompressed = decompress(Codec::Deflate, &compressed, 21).unwrap();
        assert_eq!(decompressed, b"hello template world");
    }

    #[test]
    fn bzip2_round_trips() {
        let mut compressor = Compressor::new(Codec::Bzip2);
        compressor.write(b"hello template world, bzip2 edition").unwrap();
        let compressed = compressor.finish().unwrap();
        let decompressed =
            decompress(Codec::Bzip2, &compressed, "hello template world, bzip2 edition".len() as u64)
                .unwrap();
        assert_eq!(decompressed, b"hello template world, bzip2 edition");
    }

    #[test]
    fn bytes_written_tracks_progress() {
        let mut compressor = Compressor::new(Codec::Deflate);
        assert_eq!(compressor.bytes_written(), 0);
        compressor.write(&vec![b'A'; 4096]).unwrap();
        assert!(compressor.bytes_written() > 0);
    }
}
