use rustc_hash::FxHashMap;

use checksums::RollingChecksum64;

/// Maps the exact `(lo, hi)` value of a file's first-block rolling sum to
/// the set of candidate file indices sharing it (spec.md §4.1 "Hash
/// table").
///
/// The original jigdo buckets on the upper bits of the rolling sum, masked
/// to `ceil(log2(numFiles))+1` bits, to keep the table small; this
/// implementation indexes on the full 64-bit value instead; since
/// collisions are always resolved by the MD5 comparison in step 3 of the
/// main loop, indexing on the full value only changes *how many* files
/// share a bucket, never the correctness of the scan (DESIGN.md records
/// this as an Open Question resolution).
#[derive(Debug, Default)]
pub struct HashTable {
    buckets: FxHashMap<(u32, u32), Vec<usize>>,
}

impl HashTable {
    /// Builds a table from file indices paired with their first-block
    /// rolling sum.
    #[must_use]
    pub fn build(entries: impl IntoIterator<Item = (usize, RollingChecksum64)>) -> Self {
        let mut buckets: FxHashMap<(u32, u32), Vec<usize>> = FxHashMap::default();
        for (index, rsum) in entries {
            buckets.entry((rsum.lo(), rsum.hi())).or_default().push(index);
        }
        Self { buckets }
    }

    /// Candidate file indices whose first-block rolling sum equals `rsum`.
    #[must_use]
    pub fn candidates(&self, rsum: RollingChecksum64) -> &[usize] {
        self.buckets
            .get(&(rsum.lo(), rsum.hi()))
            .map_or(&[], Vec::as_slice)
    }
}
