use std::io::{self, Read};

use digest::Digest;

/// Streaming MD5 hasher (RFC 1321), the strong checksum used throughout the
/// template format and the jigdo text `Template-MD5Sum`/`ImageInfo` fields.
#[derive(Clone, Debug)]
pub struct Md5 {
    inner: md5::Md5,
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Md5 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: md5::Md5::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the 128-bit MD5 output.
    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        self.inner.finalize().into()
    }

    /// Finalises the digest but leaves the hasher ready for the next block,
    /// so a caller hashing many consecutive `md5BlockLen` chunks doesn't pay
    /// for re-initialising hasher state between blocks.
    ///
    /// Mirrors `MD5Sum::finishForReuse` in the original jigdo sources.
    #[must_use]
    pub fn finish_for_reuse(&mut self) -> [u8; 16] {
        let digest = self.inner.clone().finalize().into();
        self.inner = md5::Md5::new();
        digest
    }

    /// Convenience helper that computes the MD5 digest for `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 16] {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hashes exactly `size` bytes from `reader` through a `buf_size`-byte
    /// buffer, invoking `progress` after each chunk with the cumulative
    /// number of bytes hashed so far.
    ///
    /// Mirrors `MD5Sum::updateFromStream` (spec.md §4.5): used both to
    /// compute a component file's whole-file MD5 and to re-read bytes
    /// during template creation.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`io::Error`] if `reader` fails before `size`
    /// bytes have been read.
    pub fn update_from_reader<R: Read>(
        &mut self,
        mut reader: R,
        size: u64,
        buf_size: usize,
        mut progress: impl FnMut(u64),
    ) -> io::Result<()> {
        let mut buf = vec![0u8; buf_size.max(1)];
        let mut remaining = size;
        let mut done = 0u64;
        while remaining > 0 {
            let want = buf.len().min(remaining as usize);
            reader.read_exact(&mut buf[..want])?;
            self.update(&buf[..want]);
            remaining -= want as u64;
            done += want as u64;
            progress(done);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        use std::fmt::Write as _;

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    #[test]
    fn md5_streaming_matches_rfc_vectors() {
        let vectors = [
            (b"".as_slice(), "d41d8cd98f00b204e9800998ecf8427e"),
            (b"a".as_slice(), "0cc175b9c0f1b6a831c399e269772661"),
            (b"abc".as_slice(), "900150983cd24fb0d6963f7d28e17f72"),
            (
                b"message digest".as_slice(),
                "f96b697d7cb7938d525a2f31aaf161d0",
            ),
        ];

        for (input, expected_hex) in vectors {
            let mut hasher = Md5::new();
            let mid = input.len() / 2;
            hasher.update(&input[..mid]);
            hasher.update(&input[mid..]);
            let digest = hasher.finalize();
            assert_eq!(to_hex(&digest), expected_hex);

            let one_shot = Md5::digest(input);
            assert_eq!(to_hex(&one_shot), expected_hex);
        }
    }

    #[test]
    fn finish_for_reuse_resets_state() {
        let mut hasher = Md5::new();
        hasher.update(b"abc");
        let first = hasher.finish_for_reuse();
        assert_eq!(first, Md5::digest(b"abc"));

        hasher.update(b"message digest");
        let second = hasher.finish_for_reuse();
        assert_eq!(second, Md5::digest(b"message digest"));
    }

    #[test]
    fn update_from_reader_matches_digest_of_same_bytes() {
        let data = vec![b'x'; 5000];
        let mut hasher = Md5::new();
        let mut seen = Vec::new();
        hasher
            .update_from_reader(&data[..], data.len() as u64, 777, |n| seen.push(n))
            .unwrap();
        assert_eq!(hasher.finalize(), Md5::digest(&data));
        assert_eq!(*seen.last().unwrap(), data.len() as u64);
    }
}
