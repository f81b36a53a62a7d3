use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::file::FileSums;

/// One persisted cache entry (spec.md §4.6): the checksum parameters it was
/// computed with, the file's size/mtime at the time, and the sums
/// themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CacheEntry {
    size: u64,
    mtime: i64,
    block_len: u32,
    md5_block_len: u32,
    rolling_lo: u32,
    rolling_hi: u32,
    rolling_len: usize,
    whole_file_md5: [u8; 16],
    md5_blocks: Vec<[u8; 16]>,
    /// Unix timestamp the entry was last written by [`SumCache::store`],
    /// used by [`SumCache::purge_expired`] (spec.md §4.6 "entries older
    /// than a configurable expiry are purged"). Defaults to 0 (already
    /// expired) for entries serialized before this field existed.
    #[serde(default)]
    cached_at: u64,
    #[serde(skip, default)]
    dirty: bool,
}

/// On-disk cache of per-file sums, avoiding a re-hash of unchanged
/// component files (spec.md §4.6).
///
/// Keyed by leafname. A serialized entry is reused only if `block_len` and
/// `md5_block_len` match the caller's current parameters and the live
/// file's `size`/`mtime` match what was recorded — any mismatch discards
/// the entry rather than risking stale checksums.
///
/// Backed by a `serde_json` sidecar file rather than the original
/// `libdb`-keyed binary cache (see DESIGN.md "sum cache format").
///
/// Dirty entries (added or replaced since the last [`SumCache::flush`])
/// are written back to disk when the cache is dropped, mirroring the
/// original `JigdoCache`'s destructor ("the dtor will try to write cached
/// data to the cache file"); call [`SumCache::flush`] explicitly to
/// surface write errors instead of silently discarding them.
#[derive(Debug, Default)]
pub struct SumCache {
    entries: HashMap<String, CacheEntry>,
    path: Option<PathBuf>,
}

impl SumCache {
    /// Creates an empty, unbacked cache (nothing is persisted on
    /// [`SumCache::flush`] unless [`SumCache::load`] or
    /// [`SumCache::set_path`] is used).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cache from a `serde_json` file, remembering the path so
    /// [`SumCache::flush`] writes back to the same place.
    ///
    /// A missing file is treated as an empty cache, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CacheCorrupt`] if the file exists but isn't
    /// valid JSON in the expected shape.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                CacheError::CacheCorrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(_) => HashMap::new(),
        };
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    /// Sets the path used by a later [`SumCache::flush`], without reading
    /// from it.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Looks up a cached entry for `leafname`, returning the stored sums
    /// only if `size`/`mtime`/`block_len`/`md5_block_len` all match
    /// (spec.md §4.6 "On lookup, blockLen/md5BlockLen must match; file
    /// mtime and size must match").
    #[must_use]
    pub fn lookup(
        &self,
        leafname: &str,
        size: u64,
        mtime: i64,
        block_len: u32,
        md5_block_len: u32,
    ) -> Option<FileSums> {
        let entry = self.entries.get(leafname)?;
        if entry.size != size
            || entry.mtime != mtime
            || entry.block_len != block_len
            || entry.md5_block_len != md5_block_len
        {
            return None;
        }
        Some(FileSums {
            first_block_rolling: rebuild_rolling(entry.rolling_lo, entry.rolling_hi, entry.rolling_len),
            md5_blocks: entry.md5_blocks.clone(),
            whole_file_md5: entry.whole_file_md5,
            block_len: entry.block_len,
            md5_block_len: entry.md5_block_len,
        })
    }

    /// Stores (or replaces) the sums for `leafname`, marking the entry
    /// dirty so the next [`SumCache::flush`] writes it out, and stamping
    /// it with the current time for [`SumCache::purge_expired`].
    pub fn store(&mut self, leafname: impl Into<String>, size: u64, mtime: i64, sums: &FileSums) {
        self.entries.insert(
            leafname.into(),
            CacheEntry {
                size,
                mtime,
                block_len: sums.block_len,
                md5_block_len: sums.md5_block_len,
                rolling_lo: sums.first_block_rolling.lo(),
                rolling_hi: sums.first_block_rolling.hi(),
                rolling_len: sums.first_block_rolling.len(),
                whole_file_md5: sums.whole_file_md5,
                md5_blocks: sums.md5_blocks.clone(),
                cached_at: now_unix(),
                dirty: true,
            },
        );
    }

    /// Removes entries whose leafname is not in `live_leafnames`,
    /// regardless of age. Callers that only want to drop entries for files
    /// that no longer exist use this; [`SumCache::purge_expired`] handles
    /// age-based eviction independently.
    pub fn purge_except(&mut self, live_leafnames: &std::collections::HashSet<String>) {
        self.entries.retain(|k, _| live_leafnames.contains(k));
    }

    /// Removes entries last [`SumCache::store`]d more than `expiry_secs`
    /// ago (spec.md §4.6 "entries older than a configurable expiry are
    /// purged"), regardless of whether their leafname is still live.
    pub fn purge_expired(&mut self, expiry_secs: u64) {
        let now = now_unix();
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.cached_at) <= expiry_secs);
    }

    /// `true` if any entry has been added or replaced since the last
    /// successful [`SumCache::flush`].
    #[must_use]
    fn is_dirty(&self) -> bool {
        self.entries.values().any(|entry| entry.dirty)
    }

    /// Writes all entries to the path set via [`SumCache::load`] or
    /// [`SumCache::set_path`], then clears every entry's dirty flag.
    /// A no-op if no path was ever set or no entry is dirty.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CacheWrite`] if serialisation or the write
    /// itself fails.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.is_dirty() {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|source| {
            CacheError::CacheCorrupt {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(path, bytes).map_err(|source| CacheError::CacheWrite {
            path: path.clone(),
            source,
        })?;
        for entry in self.entries.values_mut() {
            entry.dirty = false;
        }
        Ok(())
    }

    /// Path this cache will flush to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for SumCache {
    fn drop(&mut self) {
        // Best-effort, mirroring the original `JigdoCache` destructor;
        // a caller that needs to observe write failures calls `flush`
        // explicitly before the cache is dropped.
        let _ = self.flush();
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn rebuild_rolling(lo: u32, hi: u32, len: usize) -> checksums::RollingChecksum64 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&lo.to_le_bytes());
    bytes[4..].copy_from_slice(&hi.to_le_bytes());
    checksums::RollingChecksum64::from_le_bytes(bytes, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::RollingChecksum64;

    fn sample_sums() -> FileSums {
        let mut rolling = RollingChecksum64::new();
        rolling.update(b"abcdefgh");
        FileSums {
            first_block_rolling: rolling,
            md5_blocks: vec![[1u8; 16]],
            whole_file_md5: [2u8; 16],
            block_len: 8,
            md5_block_len: 128,
        }
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let mut cache = SumCache::new();
        let sums = sample_sums();
        cache.store("file.bin", 1000, 42, &sums);

        let found = cache.lookup("file.bin", 1000, 42, 8, 128).unwrap();
        assert_eq!(found.whole_file_md5, sums.whole_file_md5);
        assert_eq!(
            found.first_block_rolling.lo(),
            sums.first_block_rolling.lo()
        );
    }

    #[test]
    fn mismatched_mtime_invalidates_entry() {
        let mut cache = SumCache::new();
        cache.store("file.bin", 1000, 42, &sample_sums());
        assert!(cache.lookup("file.bin", 1000, 99, 8, 128).is_none());
    }

    #[test]
    fn mismatched_block_len_invalidates_entry() {
        let mut cache = SumCache::new();
        cache.store("file.bin", 1000, 42, &sample_sums());
        assert!(cache.lookup("file.bin", 1000, 42, 16, 128).is_none());
    }

    #[test]
    fn flush_and_load_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sums.json");

        let mut cache = SumCache::new();
        cache.set_path(&path);
        cache.store("a.bin", 10, 1, &sample_sums());
        cache.flush().unwrap();

        let reloaded = SumCache::load(&path).unwrap();
        assert!(reloaded.lookup("a.bin", 10, 1, 8, 128).is_some());
    }

    #[test]
    fn purge_expired_drops_old_entries_but_keeps_fresh_ones() {
        let mut cache = SumCache::new();
        cache.store("old.bin", 1, 1, &sample_sums());
        // Backdate the entry so it reads as already expired.
        cache.entries.get_mut("old.bin").unwrap().cached_at = 0;
        cache.store("fresh.bin", 1, 1, &sample_sums());

        cache.purge_expired(3600);

        assert!(cache.lookup("old.bin", 1, 1, 8, 128).is_none());
        assert!(cache.lookup("fresh.bin", 1, 1, 8, 128).is_some());
    }

    #[test]
    fn flush_is_a_no_op_when_nothing_is_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sums.json");

        let mut cache = SumCache::new();
        cache.set_path(&path);
        cache.store("a.bin", 10, 1, &sample_sums());
        cache.flush().unwrap();
        assert!(!cache.is_dirty());

        // Removing the file out from under the cache and flushing again
        // (with nothing dirty) must not recreate it.
        std::fs::remove_file(&path).unwrap();
        cache.flush().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_flushes_dirty_entries_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sums.json");
        {
            let mut cache = SumCache::new();
            cache.set_path(&path);
            cache.store("a.bin", 10, 1, &sample_sums());
        } // drop here, should flush.

        let reloaded = SumCache::load(&path).unwrap();
        assert!(reloaded.lookup("a.bin", 10, 1, 8, 128).is_some());
    }

    #[test]
    fn purge_except_drops_stale_entries() {
        let mut cache = SumCache::new();
        cache.store("keep.bin", 1, 1, &sample_sums());
        cache.store("drop.bin", 1, 1, &sample_sums());

        let mut live = std::collections::HashSet::new();
        live.insert("keep.bin".to_string());
        cache.purge_except(&live);

        assert!(cache.lookup("keep.bin", 1, 1, 8, 128).is_some());
        assert!(cache.lookup("drop.bin", 1, 1, 8, 128).is_none());
    }
}
