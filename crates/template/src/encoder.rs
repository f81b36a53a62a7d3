use std::io::Write;

use checksums::strong::Md5;
use matching::MatchEvent;
use progress::Reporter;

use crate::compression::{Codec, Compressor};
use crate::descriptor::Descriptor;
use crate::error::TemplateError;
use crate::parts::{write_data_part, write_desc_part};

/// Header line written at the start of every template (spec.md §3
/// "Template stream"), matching the original sources' fixed banner.
pub const HEADER_LINE: &str = "JigsawDownload template 1.0";

/// Configuration for a [`TemplateEncoder`].
#[derive(Clone, Copy, Debug)]
pub struct EncoderConfig {
    /// Codec used to compress glue bytes.
    pub codec: Codec,
    /// Compressed-byte threshold at which a `DATA` part is flushed
    /// (spec.md §4.2 "`zippedBufSz`"). A fresh compression stream starts
    /// for the next part.
    pub zipped_buf_sz: u64,
    /// Rolling-sum window length recorded into the final `ImageInfo`
    /// record.
    pub block_len: u32,
    /// Free-text comment line written after the header (spec.md §3
    /// "comment line").
    pub comment: String,
}

/// Writes the binary template stream described by spec.md §3/§4.2: header
/// lines, interleaved `DATA` parts holding compressed glue, and a
/// trailing `DESC` section with `ImageInfo` last.
///
/// Consumes a [`MatchEvent`] stream from the `matching` crate's scanner
/// plus the actual image bytes (needed to compress `Unmatched` runs),
/// driving them through a [`Compressor`] that is flushed into a new
/// `DATA` part whenever [`EncoderConfig::zipped_buf_sz`] compressed bytes
/// have accumulated.
pub struct TemplateEncoder<W: Write> {
    writer: W,
    config: EncoderConfig,
    compressor: Compressor,
    descriptors: Vec<Descriptor>,
    whole_stream_md5: Md5,
    image_size: u64,
    image_md5: Md5,
    pending_uncompressed_len: u64,
}

impl<W: Write> TemplateEncoder<W> {
    /// Creates an encoder and writes the header lines immediately.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error writing the header.
    pub fn new(mut writer: W, config: EncoderConfig) -> Result<Self, TemplateError> {
        let mut whole_stream_md5 = Md5::new();
        write_tracked(&mut writer, &mut whole_stream_md5, HEADER_LINE.as_bytes())?;
        write_tracked(&mut writer, &mut whole_stream_md5, b"\r\n")?;
        write_tracked(&mut writer, &mut whole_stream_md5, config.comment.as_bytes())?;
        write_tracked(&mut writer, &mut whole_stream_md5, b"\r\n\r\n")?;

        let compressor = Compressor::new(config.codec);
        Ok(Self {
            writer,
            config,
            compressor,
            descriptors: Vec::new(),
            whole_stream_md5,
            image_size: 0,
            image_md5: Md5::new(),
            pending_uncompressed_len: 0,
        })
    }

    /// Feeds one [`MatchEvent`] and its corresponding image bytes into the
    /// encoder. `bytes` must be exactly `event.len()` (for `Unmatched`) or
    /// `event.size()` bytes long (for `Matched`), taken from the image at
    /// the event's position.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer/compressor, or a
    /// cancellation from `reporter`.
    pub fn push_event(
        &mut self,
        event: &MatchEvent,
        bytes: &[u8],
        reporter: &dyn Reporter,
    ) -> Result<(), TemplateError> {
        self.image_md5.update(bytes);
        self.image_size += bytes.len() as u64;

        match event {
            MatchEvent::Unmatched { len } => {
                debug_assert_eq!(*len, bytes.len() as u64);
                self.compressor.write(bytes)?;
                self.pending_uncompressed_len += bytes.len() as u64;
                self.descriptors.push(Descriptor::UnmatchedData { size: *len });
                self.maybe_flush()?;
            }
            MatchEvent::Matched { size, rsum, md5, file_index } => {
                debug_assert_eq!(*size, bytes.len() as u64);
                self.descriptors.push(Descriptor::MatchedFile {
                    size: *size,
                    rsum: *rsum,
                    md5: *md5,
                });
                let leafname = format!("file#{file_index}");
                reporter
                    .match_found(&leafname, self.image_size - size)
                    .into_result()
                    .map_err(TemplateError::Cancelled)?;
            }
        }
        Ok(())
    }

    fn maybe_flush(&mut self) -> Result<(), TemplateError> {
        if self.compressor.bytes_written() >= self.config.zipped_buf_sz {
            self.flush_data_part()?;
        }
        Ok(())
    }

    fn flush_data_part(&mut self) -> Result<(), TemplateError> {
        let codec = self.compressor.codec();
        let finished = std::mem::replace(&mut self.compressor, Compressor::new(codec));
        let compressed = finished.finish()?;
        let uncompressed_len = std::mem::take(&mut self.pending_uncompressed_len);
        if compressed.is_empty() {
            return Ok(());
        }
        write_data_part_tracked(&mut self.writer, &mut self.whole_stream_md5, uncompressed_len, &compressed)
    }

    /// Finalises the stream: flushes any pending compressed data, writes
    /// the `ImageInfo` record last, then the `DESC` trailer. Returns the
    /// MD5 of every byte written to the template stream (spec.md §4.2
    /// "Checksum of the template").
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying writer.
    pub fn finish(mut self) -> Result<[u8; 16], TemplateError> {
        self.flush_data_part()?;
        self.descriptors.push(Descriptor::ImageInfo {
            size: self.image_size,
            md5: self.image_md5.finalize(),
            block_len: self.config.block_len,
        });
        write_desc_part_tracked(&mut self.writer, &mut self.whole_stream_md5, &self.descriptors)?;
        Ok(self.whole_stream_md5.finalize())
    }
}

fn write_tracked<W: Write>(w: &mut W, md5: &mut Md5, bytes: &[u8]) -> Result<(), TemplateError> {
    w.write_all(bytes)?;
    md5.update(bytes);
    Ok(())
}

fn write_data_part_tracked<W: Write>(
    w: &mut W,
    md5: &mut Md5,
    uncompressed_len: u64,
    compressed: &[u8],
) -> Result<(), TemplateError> {
    let mut buf = Vec::new();
    write_data_part(&mut buf, uncompressed_len, compressed)?;
    write_tracked(w, md5, &buf)
}

fn write_desc_part_tracked<W: Write>(
    w: &mut W,
    md5: &mut Md5,
    descriptors: &[Descriptor],
) -> Result<(), TemplateError> {
    let mut buf = Vec::new();
    write_desc_part(&mut buf, descriptors)?;
    write_tracked(w, md5, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress::NullReporter;

    #[test]
    fn encodes_a_single_unmatched_run_then_finishes() {
        let config = EncoderConfig {
            codec: Codec::Deflate,
            zipped_buf_sz: 1 << 20,
            block_len: 1024,
            comment: "generated for a test".into(),
        };
        let mut out = Vec::new();
        let mut encoder = TemplateEncoder::new(&mut out, config).unwrap();
        let data = vec![b'Q'; 2048];
        encoder
            .push_event(&MatchEvent::Unmatched { len: 2048 }, &data, &NullReporter)
            .unwrap();
        let template_md5 = encoder.finish().unwrap();
        assert_eq!(template_md5, Md5::digest(&out));
        assert!(out.starts_with(HEADER_LINE.as_bytes()));
    }

    #[test]
    fn flushes_a_data_part_when_threshold_crossed() {
        let config = EncoderConfig {
            codec: Codec::Deflate,
            zipped_buf_sz: 16,
            block_len: 1024,
            comment: String::new(),
        };
        let mut out = Vec::new();
        let mut encoder = TemplateEncoder::new(&mut out, config).unwrap();
        // Incompressible data so the compressor crosses the threshold.
        let data: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
        encoder
            .push_event(&MatchEvent::Unmatched { len: data.len() as u64 }, &data, &NullReporter)
            .unwrap();
        encoder.finish().unwrap();
        // A DATA tag should appear somewhere before the trailing DESC tag.
        assert!(out.windows(4).any(|w| w == b"DATA"));
        assert!(out.windows(4).any(|w| w == b"DESC"));
    }
}
