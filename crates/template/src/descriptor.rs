use std::io::{self, Read, Write};

use checksums::RollingChecksum64;

use crate::error::TemplateError;
use crate::wire::{read_md5, read_u48_le, write_md5, write_u48_le};

const TAG_LEGACY_IMAGE_INFO: u8 = 1;
const TAG_UNMATCHED_DATA: u8 = 2;
const TAG_LEGACY_MATCHED_FILE: u8 = 3;
const TAG_LEGACY_WRITTEN_FILE: u8 = 4;
const TAG_IMAGE_INFO: u8 = 5;
const TAG_MATCHED_FILE: u8 = 6;
const TAG_WRITTEN_FILE: u8 = 7;

/// One record in a template's `DESC` section (spec.md §3 "Template
/// descriptor").
///
/// Collapses the original sources' `FileDesc` class hierarchy
/// (`FiledescImage`/`FiledescUnmatched`/`FiledescMatched`/`FiledescWritten`,
/// dispatched through virtual `put`/`get`) into one tagged enum, per the
/// "collapse virtual dispatch to a tagged-variant type" redesign.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Descriptor {
    /// Always the last record in a `DESC` section.
    ImageInfo {
        /// Total image size in bytes.
        size: u64,
        /// MD5 of the whole image.
        md5: [u8; 16],
        /// Rolling-sum window length used while scanning. Zero for
        /// records decoded from a legacy (tag 1) record, which didn't
        /// carry this field.
        block_len: u32,
    },
    /// A run of glue bytes with no matching component file.
    UnmatchedData {
        /// Number of unmatched bytes this record covers.
        size: u64,
    },
    /// A confirmed component-file match.
    MatchedFile {
        /// File size in bytes.
        size: u64,
        /// Rolling sum of the file's first block. Zeroed (with a zero
        /// window length) for records decoded from a legacy (tag 3)
        /// record, which didn't carry this field.
        rsum: RollingChecksum64,
        /// Whole-file MD5.
        md5: [u8; 16],
    },
    /// Same payload as [`Descriptor::MatchedFile`], but for a file that
    /// has actually been written to a temporary reconstruction output
    /// (spec.md §4.3 "Reading a temporary file").
    WrittenFile {
        /// File size in bytes.
        size: u64,
        /// Rolling sum of the file's first block. See
        /// [`Descriptor::MatchedFile::rsum`].
        rsum: RollingChecksum64,
        /// Whole-file MD5.
        md5: [u8; 16],
    },
}

impl Descriptor {
    /// The number of image bytes this descriptor covers. `ImageInfo`
    /// contributes its own `size`, which is the total image size rather
    /// than a span within it — callers summing per-byte coverage should
    /// exclude it (spec.md §8 property 3, "size consistency").
    #[must_use]
    pub const fn size(&self) -> u64 {
        match self {
            Self::ImageInfo { size, .. }
            | Self::UnmatchedData { size }
            | Self::MatchedFile { size, .. }
            | Self::WrittenFile { size, .. } => *size,
        }
    }

    /// Writes this descriptor's wire representation (1-byte tag plus
    /// payload) using the modern (non-legacy) tags.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from `w`.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::ImageInfo { size, md5, block_len } => {
                w.write_all(&[TAG_IMAGE_INFO])?;
                write_u48_le(w, *size)?;
                write_md5(w, md5)?;
                w.write_all(&block_len.to_le_bytes())
            }
            Self::UnmatchedData { size } => {
                w.write_all(&[TAG_UNMATCHED_DATA])?;
                write_u48_le(w, *size)
            }
            Self::MatchedFile { size, rsum, md5 } => {
                w.write_all(&[TAG_MATCHED_FILE])?;
                write_u48_le(w, *size)?;
                w.write_all(&rsum.to_le_bytes())?;
                write_md5(w, md5)
            }
            Self::WrittenFile { size, rsum, md5 } => {
                w.write_all(&[TAG_WRITTEN_FILE])?;
                write_u48_le(w, *size)?;
                w.write_all(&rsum.to_le_bytes())?;
                write_md5(w, md5)
            }
        }
    }

    /// The number of bytes [`Descriptor::write`] would produce for this
    /// descriptor.
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        match self {
            Self::ImageInfo { .. } => 1 + 6 + 16 + 4,
            Self::UnmatchedData { .. } => 1 + 6,
            Self::MatchedFile { .. } | Self::WrittenFile { .. } => 1 + 6 + 8 + 16,
        }
    }

    /// Reads one descriptor record, accepting both modern and legacy
    /// tags (spec.md §3 "Legacy tags 1/3/4 exist and must be parsed").
    ///
    /// Legacy records lack the rolling sum / block length fields the
    /// modern format carries; those fields are filled with zero.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownDescriptorTag`] for an
    /// unrecognised tag, or [`TemplateError::Io`] on a read failure.
    pub fn read<R: Read>(r: &mut R) -> Result<Self, TemplateError> {
        let mut tag_buf = [0u8; 1];
        r.read_exact(&mut tag_buf)?;
        let tag = tag_buf[0];

        Ok(match tag {
            TAG_LEGACY_IMAGE_INFO => {
                let size = read_u48_le(r)?;
                let md5 = read_md5(r)?;
                Self::ImageInfo { size, md5, block_len: 0 }
            }
            TAG_IMAGE_INFO => {
                let size = read_u48_le(r)?;
                let md5 = read_md5(r)?;
                let mut len_buf = [0u8; 4];
                r.read_exact(&mut len_buf)?;
                Self::ImageInfo {
                    size,
                    md5,
                    block_len: u32::from_le_bytes(len_buf),
                }
            }
            TAG_UNMATCHED_DATA => {
                let size = read_u48_le(r)?;
                Self::UnmatchedData { size }
            }
            TAG_LEGACY_MATCHED_FILE => {
                let size = read_u48_le(r)?;
                let md5 = read_md5(r)?;
                Self::MatchedFile {
                    size,
                    rsum: RollingChecksum64::new(),
                    md5,
                }
            }
            TAG_LEGACY_WRITTEN_FILE => {
                let size = read_u48_le(r)?;
                let md5 = read_md5(r)?;
                Self::WrittenFile {
                    size,
                    rsum: RollingChecksum64::new(),
                    md5,
                }
            }
            TAG_MATCHED_FILE => {
                let size = read_u48_le(r)?;
                let mut rsum_buf = [0u8; 8];
                r.read_exact(&mut rsum_buf)?;
                let md5 = read_md5(r)?;
                Self::MatchedFile {
                    size,
                    rsum: RollingChecksum64::from_le_bytes(rsum_buf, 0),
                    md5,
                }
            }
            TAG_WRITTEN_FILE => {
                let size = read_u48_le(r)?;
                let mut rsum_buf = [0u8; 8];
                r.read_exact(&mut rsum_buf)?;
                let md5 = read_md5(r)?;
                Self::WrittenFile {
                    size,
                    rsum: RollingChecksum64::from_le_bytes(rsum_buf, 0),
                    md5,
                }
            }
            other => return Err(TemplateError::UnknownDescriptorTag(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_info_round_trips() {
        let desc = Descriptor::ImageInfo {
            size: 123_456,
            md5: [7u8; 16],
            block_len: 8192,
        };
        let mut buf = Vec::new();
        desc.write(&mut buf).unwrap();
        assert_eq!(buf.len(), desc.wire_len());
        let mut cursor = &buf[..];
        assert_eq!(Descriptor::read(&mut cursor).unwrap(), desc);
    }

    #[test]
    fn matched_file_round_trips() {
        let mut rsum = RollingChecksum64::new();
        rsum.update(b"abcdefgh");
        let desc = Descriptor::MatchedFile {
            size: 4096,
            rsum,
            md5: [9u8; 16],
        };
        let mut buf = Vec::new();
        desc.write(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let decoded = Descriptor::read(&mut cursor).unwrap();
        match decoded {
            Descriptor::MatchedFile { size, rsum: got, md5 } => {
                assert_eq!(size, 4096);
                assert_eq!(md5, [9u8; 16]);
                assert_eq!((got.lo(), got.hi()), (rsum.lo(), rsum.hi()));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn legacy_image_info_fills_zero_block_len() {
        let mut buf = vec![TAG_LEGACY_IMAGE_INFO];
        write_u48_le(&mut buf, 777).unwrap();
        write_md5(&mut buf, &[1u8; 16]).unwrap();
        let mut cursor = &buf[..];
        let decoded = Descriptor::read(&mut cursor).unwrap();
        assert_eq!(
            decoded,
            Descriptor::ImageInfo {
                size: 777,
                md5: [1u8; 16],
                block_len: 0,
            }
        );
    }

    #[test]
    fn legacy_matched_file_has_zero_rsum() {
        let mut buf = vec![TAG_LEGACY_MATCHED_FILE];
        write_u48_le(&mut buf, 555).unwrap();
        write_md5(&mut buf, &[2u8; 16]).unwrap();
        let mut cursor = &buf[..];
        let decoded = Descriptor::read(&mut cursor).unwrap();
        match decoded {
            Descriptor::MatchedFile { size, rsum, md5 } => {
                assert_eq!(size, 555);
                assert_eq!(md5, [2u8; 16]);
                assert_eq!((rsum.lo(), rsum.hi()), (0, 0));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let buf = [200u8];
        let mut cursor = &buf[..];
        assert!(matches!(
            Descriptor::read(&mut cursor),
            Err(TemplateError::UnknownDescriptorTag(200))
        ));
    }
}
