use super::digest::RollingDigest;
use super::error::RollingError;

/// Nothing magic about this constant; just a value which, according to the
/// rsync sources this algorithm was adapted from, improves checksum quality.
const CHAR_OFFSET: u32 = 0xb593;

/// 32-bit rolling checksum over a sliding window of bytes.
///
/// The checksum can be updated in O(1) time when bytes are appended to the
/// back of the window or removed from the front, without rescanning the
/// window contents. This is the weak checksum used to find candidate block
/// matches before a strong digest comparison confirms them.
///
/// # Examples
///
/// ```
/// use checksums::RollingChecksum;
///
/// let mut sum = RollingChecksum::new();
/// sum.update(b"abcd");
///
/// // Slide the window by one byte: drop 'a', append 'e'.
/// sum.roll(b'a', b'e').unwrap();
///
/// let mut fresh = RollingChecksum::new();
/// fresh.update(b"bcde");
/// assert_eq!(sum.value(), fresh.value());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    sum: u32,
    len: usize,
}

impl RollingChecksum {
    /// Creates a checksum with zeroed state, covering an empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self { sum: 0, len: 0 }
    }

    /// Reconstructs a rolling checksum from a previously captured digest.
    #[must_use]
    pub const fn from_digest(digest: RollingDigest) -> Self {
        Self {
            sum: digest.value(),
            len: digest.len(),
        }
    }

    /// Resets the checksum to cover an empty window.
    pub const fn reset(&mut self) {
        self.sum = 0;
        self.len = 0;
    }

    /// Number of bytes currently covered by the window.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the window is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a slice of bytes to the end of the window.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.add_back(byte);
        }
    }

    /// Appends a single byte to the end of the window.
    #[inline]
    pub fn add_back(&mut self, byte: u8) {
        let mut a = self.sum & 0xffff;
        let mut b = self.sum >> 16;
        a = a.wrapping_add(u32::from(byte)).wrapping_add(CHAR_OFFSET);
        b = b.wrapping_add(a);
        self.sum = (a & 0xffff) | (b << 16);
        self.len += 1;
    }

    /// Appends the same byte `n` times, using the closed-form Gauss sum
    /// shortcut instead of looping `n` times.
    pub fn add_back_ntimes(&mut self, byte: u8, n: usize) {
        if n == 0 {
            return;
        }
        let x = u64::from(byte) + u64::from(CHAR_OFFSET);
        let n64 = n as u64;
        let a = self.sum & 0xffff;
        let b = self.sum >> 16;
        let new_b = (u64::from(b) + n64 * u64::from(a) + (n64 * (n64 + 1) / 2) * x) as u32;
        let new_a = (u64::from(a) + n64 * x) as u32;
        self.sum = (new_a & 0xffff) | (new_b << 16);
        self.len += n;
    }

    /// Removes a single byte from the front of the window.
    ///
    /// `area_size` is the number of bytes covered by the window *before* the
    /// byte is removed.
    #[inline]
    pub fn remove_front(&mut self, byte: u8, area_size: usize) {
        let mut a = self.sum & 0xffff;
        let mut b = self.sum >> 16;
        let weighted = (area_size as u32)
            .wrapping_mul(u32::from(byte).wrapping_add(CHAR_OFFSET));
        b = b.wrapping_sub(weighted);
        a = a.wrapping_sub(u32::from(byte).wrapping_add(CHAR_OFFSET));
        self.sum = (a & 0xffff) | (b << 16);
        self.len = self.len.saturating_sub(1);
    }

    /// Slides the window by one byte: removes `outgoing` from the front and
    /// appends `incoming` to the back, leaving the window length unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] if the window currently covers
    /// zero bytes, since there would be nothing to remove from the front.
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }
        let area_size = self.len;
        self.remove_front(outgoing, area_size);
        self.add_back(incoming);
        Ok(())
    }

    /// Raw 32-bit checksum value, used to bucket candidate offsets in the
    /// block hash table.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.sum
    }

    /// Returns the current state as a structured digest, for storage in a
    /// per-file sum cache.
    #[must_use]
    pub const fn digest(&self) -> RollingDigest {
        RollingDigest::new(self.sum, self.len)
    }
}

impl From<RollingDigest> for RollingChecksum {
    fn from(digest: RollingDigest) -> Self {
        Self::from_digest(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_checksum_is_zero() {
        let sum = RollingChecksum::new();
        assert_eq!(sum.value(), 0);
        assert!(sum.is_empty());
    }

    #[test]
    fn rolling_matches_recomputation() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let window = 12;

        let mut rolling = RollingChecksum::new();
        rolling.update(&data[..window]);

        for start in 1..=data.len() - window {
            rolling
                .roll(data[start - 1], data[start + window - 1])
                .unwrap();

            let mut fresh = RollingChecksum::new();
            fresh.update(&data[start..start + window]);
            assert_eq!(rolling.value(), fresh.value());
        }
    }

    #[test]
    fn add_back_ntimes_matches_loop() {
        let mut looped = RollingChecksum::new();
        for _ in 0..37 {
            looped.add_back(b'z');
        }

        let mut shortcut = RollingChecksum::new();
        shortcut.add_back_ntimes(b'z', 37);

        assert_eq!(looped.value(), shortcut.value());
        assert_eq!(looped.len(), shortcut.len());
    }

    #[test]
    fn roll_on_empty_window_errors() {
        let mut sum = RollingChecksum::new();
        assert_eq!(sum.roll(0, 0), Err(RollingError::EmptyWindow));
    }

    #[test]
    fn from_digest_round_trips() {
        let mut sum = RollingChecksum::new();
        sum.update(b"round trip me");
        let digest = sum.digest();
        let restored = RollingChecksum::from_digest(digest);
        assert_eq!(sum, restored);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Rolling a window forward by one byte always agrees with
        /// recomputing the checksum of the shifted window from scratch.
        #[test]
        fn roll_matches_recomputation(xs in prop::collection::vec(any::<u8>(), 1..64), b in any::<u8>()) {
            let mut rolling = RollingChecksum::new();
            rolling.update(&xs);
            rolling.roll(xs[0], b).unwrap();

            let mut fresh = RollingChecksum::new();
            fresh.update(&xs[1..]);
            fresh.add_back(b);

            prop_assert_eq!(rolling.value(), fresh.value());
            prop_assert_eq!(rolling.len(), fresh.len());
        }
    }
}
