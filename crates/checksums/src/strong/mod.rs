//! Strong checksum used to confirm rolling-sum hits and verify output.
//!
//! jigdo needs exactly one strong digest: MD5. The rolling sum narrows down
//! candidate offsets while scanning; MD5 over a whole `md5BlockLen` block
//! (or a whole file, or a whole image) is what actually confirms a match or
//! verifies reconstructed bytes (spec.md §4.1, §4.3).

mod md5;

pub use md5::Md5;

#[cfg(test)]
mod tests {
    use super::Md5;

    #[test]
    fn digest_matches_incremental_update() {
        let input = b"trait-check";

        let mut incremental = Md5::new();
        incremental.update(&input[..4]);
        incremental.update(&input[4..]);

        assert_eq!(incremental.finalize(), Md5::digest(input));
    }
}
