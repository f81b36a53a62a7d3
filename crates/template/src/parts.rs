use std::io::{self, Read, Write};

use crate::descriptor::Descriptor;
use crate::error::TemplateError;
use crate::wire::{read_u48_le, write_u48_le};

const DATA_TAG: &[u8; 4] = b"DATA";
const DESC_TAG: &[u8; 4] = b"DESC";

/// Writes one `DATA` part: tag, part length (including the 4+6+6-byte
/// header), uncompressed length, then the already-compressed bytes
/// (spec.md §3 "`DataPart`").
///
/// # Errors
///
/// Propagates any I/O error from `w`, or [`TemplateError::Io`] if
/// `compressed.len()` doesn't fit the 48-bit part-length field.
pub fn write_data_part<W: Write>(
    w: &mut W,
    uncompressed_len: u64,
    compressed: &[u8],
) -> Result<(), TemplateError> {
    let part_len = 4 + 6 + 6 + compressed.len() as u64;
    w.write_all(DATA_TAG)?;
    write_u48_le(w, part_len)?;
    write_u48_le(w, uncompressed_len)?;
    w.write_all(compressed)?;
    Ok(())
}

/// One decoded `DATA` part: its compressed payload and the uncompressed
/// length it should expand to.
#[derive(Clone, Debug)]
pub struct DataPart {
    /// Length the payload expands to once decompressed.
    pub uncompressed_len: u64,
    /// Compressed bytes, as stored on the wire.
    pub compressed: Vec<u8>,
}

/// Reads one part (either `DATA` or `DESC`) from `r`, given the already
/// consumed 4-byte tag.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownPartTag`] for any other tag.
pub fn read_part_body<R: Read>(r: &mut R, tag: [u8; 4]) -> Result<PartBody, TemplateError> {
    if &tag == DATA_TAG {
        let part_len = read_u48_le(r)?;
        let uncompressed_len = read_u48_le(r)?;
        let payload_len = part_len
            .checked_sub(4 + 6 + 6)
            .ok_or_else(|| TemplateError::MalformedDesc("DATA part length underflow".into()))?;
        let mut compressed = vec![0u8; payload_len as usize];
        r.read_exact(&mut compressed)?;
        Ok(PartBody::Data(DataPart {
            uncompressed_len,
            compressed,
        }))
    } else if &tag == DESC_TAG {
        let len = read_u48_le(r)?;
        let mut body = vec![0u8; len as usize];
        r.read_exact(&mut body)?;
        let trailer = read_u48_le(r)?;
        if trailer != len {
            return Err(TemplateError::MalformedDesc(format!(
                "DESC leading length {len} does not match trailing length {trailer}"
            )));
        }
        let mut cursor = &body[..];
        let mut descriptors = Vec::new();
        while !cursor.is_empty() {
            descriptors.push(Descriptor::read(&mut cursor)?);
        }
        Ok(PartBody::Desc(descriptors))
    } else {
        Err(TemplateError::UnknownPartTag { tag })
    }
}

/// The decoded body of a part, tagged by which kind it was.
#[derive(Clone, Debug)]
pub enum PartBody {
    /// A `DATA` part's compressed payload.
    Data(DataPart),
    /// A `DESC` part's descriptor records, in wire order.
    Desc(Vec<Descriptor>),
}

/// Writes the `DESC` section: leading 6-byte length, every descriptor's
/// wire form, then the trailing repeated 6-byte length (spec.md §3
/// "`DescPart`" / §6 "seeking 6 bytes before EOF").
///
/// # Errors
///
/// Propagates any I/O error from `w`.
pub fn write_desc_part<W: Write>(w: &mut W, descriptors: &[Descriptor]) -> Result<(), TemplateError> {
    let body_len: usize = descriptors.iter().map(Descriptor::wire_len).sum();
    w.write_all(DESC_TAG)?;
    write_u48_le(w, body_len as u64)?;
    for desc in descriptors {
        desc.write(w)?;
    }
    write_u48_le(w, body_len as u64)?;
    Ok(())
}

/// Reads the 4-byte tag at the current position, returning `None` at a
/// clean end-of-stream.
///
/// # Errors
///
/// Propagates any I/O error other than a clean EOF on the first byte.
pub fn read_tag<R: Read>(r: &mut R) -> io::Result<Option<[u8; 4]>> {
    let mut tag = [0u8; 4];
    let mut read = 0;
    while read < 4 {
        match r.read(&mut tag[read..])? {
            0 if read == 0 => return Ok(None),
            0 => return Err(io::ErrorKind::UnexpectedEof.into()),
            n => read += n,
        }
    }
    Ok(Some(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[test]
    fn data_part_round_trips() {
        let mut buf = Vec::new();
        write_data_part(&mut buf, 11, b"compressed!").unwrap();
        let mut cursor = &buf[4..];
        match read_part_body(&mut cursor, *DATA_TAG).unwrap() {
            PartBody::Data(part) => {
                assert_eq!(part.uncompressed_len, 11);
                assert_eq!(part.compressed, b"compressed!");
            }
            PartBody::Desc(_) => panic!("expected DATA"),
        }
    }

    #[test]
    fn desc_part_round_trips_and_validates_trailer() {
        let descriptors = vec![
            Descriptor::UnmatchedData { size: 10 },
            Descriptor::ImageInfo {
                size: 10,
                md5: [3u8; 16],
                block_len: 512,
            },
        ];
        let mut buf = Vec::new();
        write_desc_part(&mut buf, &descriptors).unwrap();
        let mut cursor = &buf[4..];
        match read_part_body(&mut cursor, *DESC_TAG).unwrap() {
            PartBody::Desc(decoded) => assert_eq!(decoded, descriptors),
            PartBody::Data(_) => panic!("expected DESC"),
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut cursor: &[u8] = &[];
        let err = read_part_body(&mut cursor, *b"XXXX").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPartTag { .. }));
    }

    #[test]
    fn read_tag_detects_clean_eof() {
        let mut cursor: &[u8] = &[];
        assert!(read_tag(&mut cursor).unwrap().is_none());
    }
}
