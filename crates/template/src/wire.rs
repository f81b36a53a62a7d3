use std::io::{self, Read, Write};

/// Writes `value` as a 6-byte little-endian integer (spec.md §3 "6-byte
/// little-endian length"), matching `serialize6` in
/// `original_source/src/serialize.hh`.
///
/// # Errors
///
/// Returns [`io::Error`] if `value` exceeds the 48-bit range or the write
/// fails.
pub fn write_u48_le<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
    if value >= 1u64 << 48 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "value exceeds 48-bit template field width",
        ));
    }
    let bytes = value.to_le_bytes();
    w.write_all(&bytes[..6])
}

/// Reads a 6-byte little-endian integer (`unserialize6`).
///
/// # Errors
///
/// Returns [`io::Error`] if the read fails.
pub fn read_u48_le<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf[..6])?;
    Ok(u64::from_le_bytes(buf))
}

/// Writes a 16-byte MD5 digest. Kept separate from [`write_u48_le`] purely
/// for call-site readability.
pub fn write_md5<W: Write>(w: &mut W, md5: &[u8; 16]) -> io::Result<()> {
    w.write_all(md5)
}

/// Reads a 16-byte MD5 digest.
pub fn read_md5<R: Read>(r: &mut R) -> io::Result<[u8; 16]> {
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u48_round_trips() {
        let mut buf = Vec::new();
        write_u48_le(&mut buf, 0xDEAD_BEEF_CAFE).unwrap();
        assert_eq!(buf.len(), 6);
        let mut cursor = &buf[..];
        assert_eq!(read_u48_le(&mut cursor).unwrap(), 0xDEAD_BEEF_CAFE);
    }

    #[test]
    fn u48_rejects_oversized_value() {
        let mut buf = Vec::new();
        assert!(write_u48_le(&mut buf, 1u64 << 48).is_err());
    }
}
