use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use template::{read_part_body, read_tag, Codec, DataPart, Descriptor, PartBody};

use crate::error::ImageError;

/// A parsed template: its header lines and the decoded descriptor table
/// (spec.md §4.3 "`TemplateReader`").
///
/// Locates the trailing `DESC` section by seeking to `EOF-6` and reading
/// the repeated length backwards (spec.md §6), rather than scanning the
/// whole stream forward.
#[derive(Clone, Debug)]
pub struct TemplateHeader {
    /// The banner line (first line of the template).
    pub banner: String,
    /// The free-text comment line.
    pub comment: String,
    /// Byte offset immediately after the header, where the first `DATA`
    /// part (if any) begins.
    pub body_start: u64,
    /// Byte offset the `DESC` section's `DATA` tag begins at.
    pub desc_start: u64,
    /// Every descriptor, in wire order (`ImageInfo` last).
    pub descriptors: Vec<Descriptor>,
}

impl TemplateHeader {
    /// Parses the header lines and the trailing descriptor table from
    /// `reader`, leaving the stream positioned wherever it likes (callers
    /// should re-seek before reading glue bytes via [`crate::GlueReader`]).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Template`] if the header or `DESC` framing is
    /// malformed, or [`ImageError::Io`] on a read/seek failure.
    pub fn parse<R: Read + Seek>(mut reader: R) -> Result<Self, ImageError> {
        let mut header_buf = BufReader::new(&mut reader);
        let mut banner = String::new();
        header_buf.read_line(&mut banner)?;
        let mut comment = String::new();
        header_buf.read_line(&mut comment)?;
        let mut blank = String::new();
        header_buf.read_line(&mut blank)?;
        let consumed = banner.len() + comment.len() + blank.len();
        let body_start = consumed as u64;

        let (desc_start, descriptors) = locate_trailing_desc_section(&mut reader)?;

        Ok(Self {
            banner: trim_crlf(banner),
            comment: trim_crlf(comment),
            body_start,
            desc_start,
            descriptors,
        })
    }

    /// The final `ImageInfo` descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Template`] if the last descriptor isn't
    /// `ImageInfo` (spec.md §3 "always last").
    pub fn image_info(&self) -> Result<(u64, [u8; 16], u32), ImageError> {
        match self.descriptors.last() {
            Some(Descriptor::ImageInfo { size, md5, block_len }) => Ok((*size, *md5, *block_len)),
            _ => Err(
                template::TemplateError::MalformedDesc("DESC section missing trailing ImageInfo".into())
                    .into(),
            ),
        }
    }
}

fn trim_crlf(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Locates and decodes the trailing `DESC` section of any stream that ends
/// with one, by seeking to `EOF-6` and reading the repeated length
/// backwards (spec.md §6). Shared by [`TemplateHeader::parse`], which has
/// header lines before the body, and [`read_trailing_descriptors`], which
/// reads a bare temporary file's own appended descriptor table (spec.md
/// §4.3 "Reading a temporary file") with no header at all.
///
/// Returns the stream offset the `DESC` part's tag begins at, and the
/// decoded descriptors in wire order.
fn locate_trailing_desc_section<R: Read + Seek>(
    mut reader: R,
) -> Result<(u64, Vec<Descriptor>), ImageError> {
    let total_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::End(-6))?;
    let trailer_len = template::wire::read_u48_le(&mut reader)?;
    // DESC section on wire: tag(4) + len(6) + body(trailer_len) + trailer(6).
    let desc_start = total_len.checked_sub(4 + 6 + trailer_len + 6).ok_or_else(|| {
        template::TemplateError::MalformedDesc("DESC trailer length exceeds file size".into())
    })?;

    reader.seek(SeekFrom::Start(desc_start))?;
    let tag = read_tag(&mut reader)?
        .ok_or_else(|| template::TemplateError::MalformedDesc("truncated DESC tag".into()))?;
    let descriptors = match read_part_body(&mut reader, tag)? {
        PartBody::Desc(descriptors) => descriptors,
        PartBody::Data(_) => {
            return Err(template::TemplateError::MalformedDesc(
                "expected DESC section at computed offset".into(),
            )
            .into())
        }
    };

    Ok((desc_start, descriptors))
}

/// Reads a bare temporary file's own trailing descriptor table: plain
/// image bytes followed directly by an appended `DESC` section, with none
/// of a real template's header lines (spec.md §4.3 "Reading a temporary
/// file"). Used by `ImageReconstructor`'s `CREATE_TMP`/`MERGE_TMP` modes
/// to recover what was already written to a previous pass's temp file.
///
/// Returns the offset the appended `DESC` section begins at (i.e. the
/// length of the image bytes that precede it), and the decoded
/// descriptors in wire order.
///
/// # Errors
///
/// Returns [`ImageError::Template`] if the trailing framing is malformed,
/// or [`ImageError::Io`] on a read/seek failure.
pub fn read_trailing_descriptors<R: Read + Seek>(
    reader: R,
) -> Result<(u64, Vec<Descriptor>), ImageError> {
    locate_trailing_desc_section(reader)
}

/// Pull-based reader over the decompressed glue bytes spanning every
/// `DATA` part between a template's header and its `DESC` section.
///
/// A single [`Descriptor::UnmatchedData`] run may span more than one
/// `DATA` part (or a part may hold more than one run); this reader hides
/// that boundary, buffering one decompressed part at a time.
pub struct GlueReader<R> {
    reader: R,
    codec: Codec,
    desc_start: u64,
    pending: Vec<u8>,
    pending_offset: usize,
}

impl<R: Read + Seek> GlueReader<R> {
    /// Creates a reader positioned at `body_start`, stopping once it
    /// would read past `desc_start`.
    pub fn new(mut reader: R, codec: Codec, body_start: u64, desc_start: u64) -> std::io::Result<Self> {
        reader.seek(SeekFrom::Start(body_start))?;
        Ok(Self {
            reader,
            codec,
            desc_start,
            pending: Vec::new(),
            pending_offset: 0,
        })
    }

    fn refill(&mut self) -> Result<bool, ImageError> {
        if self.reader.stream_position()? >= self.desc_start {
            return Ok(false);
        }
        let tag = read_tag(&mut self.reader)?
            .ok_or_else(|| template::TemplateError::MalformedDesc("truncated DATA tag".into()))?;
        let part: DataPart = match read_part_body(&mut self.reader, tag)? {
            PartBody::Data(part) => part,
            PartBody::Desc(_) => {
                return Err(
                    template::TemplateError::MalformedDesc("unexpected DESC part among DATA parts".into())
                        .into(),
                )
            }
        };
        let decompressed = template::decompress(self.codec, &part.compressed, part.uncompressed_len)?;
        self.pending = decompressed;
        self.pending_offset = 0;
        Ok(true)
    }

    /// Reads exactly `len` glue bytes, pulling and decompressing further
    /// `DATA` parts as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Template`] if the stream runs out of `DATA`
    /// parts before `len` bytes have been produced.
    pub fn read_exact(&mut self, len: u64) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::with_capacity(len as usize);
        let mut remaining = len;
        while remaining > 0 {
            if self.pending_offset >= self.pending.len() && !self.refill()? {
                return Err(template::TemplateError::MalformedDesc(
                    "ran out of glue data before descriptor table was satisfied".into(),
                )
                .into());
            }
            let available = self.pending.len() - self.pending_offset;
            let take = available.min(remaining as usize);
            out.extend_from_slice(&self.pending[self.pending_offset..self.pending_offset + take]);
            self.pending_offset += take;
            remaining -= take as u64;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::strong::Md5;
    use matching::MatchEvent;
    use progress::NullReporter;
    use std::io::Cursor;
    use template::{EncoderConfig, TemplateEncoder};

    fn build_template(glue: &[u8]) -> Vec<u8> {
        let config = EncoderConfig {
            codec: Codec::Deflate,
            zipped_buf_sz: 1 << 20,
            block_len: 512,
            comment: "test template".into(),
        };
        let mut out = Vec::new();
        {
            let mut encoder = TemplateEncoder::new(&mut out, config).unwrap();
            encoder
                .push_event(&MatchEvent::Unmatched { len: glue.len() as u64 }, glue, &NullReporter)
                .unwrap();
            encoder.finish().unwrap();
        }
        out
    }

    #[test]
    fn parses_header_and_trailing_descriptors() {
        let glue = vec![b'Z'; 4096];
        let bytes = build_template(&glue);
        let header = TemplateHeader::parse(Cursor::new(&bytes)).unwrap();
        assert_eq!(header.banner, template::HEADER_LINE);
        let (size, md5, _block_len) = header.image_info().unwrap();
        assert_eq!(size, glue.len() as u64);
        assert_eq!(md5, Md5::digest(&glue));
    }

    #[test]
    fn glue_reader_reassembles_bytes_across_parts() {
        let glue: Vec<u8> = (0..20_000u32).map(|i| (i % 255) as u8).collect();
        let bytes = build_template(&glue);
        let header = TemplateHeader::parse(Cursor::new(&bytes)).unwrap();
        let mut glue_reader =
            GlueReader::new(Cursor::new(&bytes), Codec::Deflate, header.body_start, header.desc_start)
                .unwrap();
        let got = glue_reader.read_exact(glue.len() as u64).unwrap();
        assert_eq!(got, glue);
    }
}
