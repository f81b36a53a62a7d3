/// Snapshot of a [`RollingChecksum`](super::checksum::RollingChecksum)'s
/// state, cheap to store in a per-file sum cache and to restore later without
/// rescanning the block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RollingDigest {
    value: u32,
    len: usize,
}

impl RollingDigest {
    /// Digest representing an empty window.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a digest from its packed 32-bit value and window length.
    #[must_use]
    pub const fn new(value: u32, len: usize) -> Self {
        Self { value, len }
    }

    /// Raw 32-bit checksum value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }

    /// Length of the window that produced this digest.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns whether the digest was computed from zero bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Serialises the digest using the little-endian wire format used
    /// throughout the template and cache formats.
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.value.to_le_bytes()
    }

    /// Constructs a digest from the little-endian byte array used on the
    /// wire, together with the window length it applies to.
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 4], len: usize) -> Self {
        Self::new(u32::from_le_bytes(bytes), len)
    }
}

impl Default for RollingDigest {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<RollingDigest> for u32 {
    #[inline]
    fn from(digest: RollingDigest) -> Self {
        digest.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_default() {
        assert_eq!(RollingDigest::default(), RollingDigest::ZERO);
        assert!(RollingDigest::ZERO.is_empty());
    }

    #[test]
    fn le_bytes_round_trip() {
        let digest = RollingDigest::new(0xDEAD_BEEF, 42);
        let bytes = digest.to_le_bytes();
        let restored = RollingDigest::from_le_bytes(bytes, 42);
        assert_eq!(digest, restored);
    }
}
