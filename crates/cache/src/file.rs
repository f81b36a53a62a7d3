use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use checksums::{strong::Md5, RollingChecksum64};
use progress::Reporter;

use crate::error::CacheError;

/// Checksums computed for one component file, populated on demand
/// (spec.md §3 "File entry"): the rolling sum of the first `block_len`
/// bytes, the MD5 of each consecutive `md5_block_len`-byte chunk, and the
/// MD5 of the whole file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSums {
    /// Rolling sum over the first `block_len` bytes of the file.
    pub first_block_rolling: RollingChecksum64,
    /// MD5 of each consecutive `md5_block_len`-byte chunk (the last chunk
    /// may be shorter).
    pub md5_blocks: Vec<[u8; 16]>,
    /// MD5 over the whole file.
    pub whole_file_md5: [u8; 16],
    /// Window length the rolling sum was computed with.
    pub block_len: u32,
    /// Chunk length the MD5 blocks were computed with.
    pub md5_block_len: u32,
}

/// One entry in a [`ComponentPool`]: path on disk, size, mtime, label, and
/// lazily computed checksums (spec.md §3 "File entry").
///
/// A file is marked [`ComponentFile::ignored`] instead of being removed from
/// the pool when it can't be read — its size is set to zero so later
/// length-based comparisons (`0 < blockLen < md5BlockLen`, "no file smaller
/// than blockLen is ever matched") exclude it without special-casing absent
/// entries.
#[derive(Clone, Debug)]
pub struct ComponentFile {
    path: PathBuf,
    size: u64,
    mtime: i64,
    label: String,
    ignored: bool,
    sums: Option<FileSums>,
}

impl ComponentFile {
    /// Creates an entry for a file first observed on disk. Checksums are not
    /// computed yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64, mtime: i64, label: impl Into<String>) -> Self {
        let label = label.into();
        let ignored = size == 0;
        Self {
            path: path.into(),
            size,
            mtime,
            label,
            ignored,
            sums: None,
        }
    }

    /// Path on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes, as observed when the entry was created (zero if
    /// [`ComponentFile::ignored`]).
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Modification time, in whatever integer epoch the caller uses
    /// consistently (opaque to this crate; only used for cache validity
    /// comparisons).
    #[must_use]
    pub const fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Label grouping this file by source directory.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Leaf (file) name, used as the sum-cache key.
    #[must_use]
    pub fn leafname(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether this entry was excluded because reading it failed or it is
    /// empty. An ignored file is never matched.
    #[must_use]
    pub const fn ignored(&self) -> bool {
        self.ignored
    }

    /// Marks the entry ignored: size is reset to zero and any previously
    /// computed checksums are discarded (spec.md §3 "may be marked
    /// *ignored* if I/O fails (its size set to 0)").
    pub fn mark_ignored(&mut self) {
        self.ignored = true;
        self.size = 0;
        self.sums = None;
    }

    /// Already-computed checksums, if [`ComponentFile::ensure_sums`] has run.
    #[must_use]
    pub const fn sums(&self) -> Option<&FileSums> {
        self.sums.as_ref()
    }

    /// Installs checksums computed elsewhere (e.g. restored from a
    /// [`crate::SumCache`] hit), without touching the file on disk.
    pub fn set_sums(&mut self, sums: FileSums) {
        self.sums = Some(sums);
    }

    /// Computes and caches the rolling sum / MD5 blocks / whole-file MD5,
    /// unless they are already present. No file smaller than `block_len` is
    /// ever matched (spec.md §4.1 contract), so such files are marked
    /// ignored instead of hashed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file can't be opened or read; per
    /// spec.md §4.1 this is fatal for the scan, so callers of this method
    /// for *scanning* purposes should treat it as such, while callers
    /// populating a pool during discovery may instead call
    /// [`ComponentFile::mark_ignored`] on failure.
    pub fn ensure_sums(
        &mut self,
        block_len: u32,
        md5_block_len: u32,
        reporter: &dyn Reporter,
    ) -> Result<Option<&FileSums>, CacheError> {
        if self.ignored || self.size < u64::from(block_len) {
            return Ok(None);
        }
        if let Some(existing) = &self.sums {
            if existing.block_len == block_len && existing.md5_block_len == md5_block_len {
                return Ok(self.sums.as_ref());
            }
        }

        let file = File::open(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut first_block = vec![0u8; block_len as usize];
        read_exact_io(&mut reader, &mut first_block, &self.path)?;
        let mut first_block_rolling = RollingChecksum64::new();
        first_block_rolling.update(&first_block);

        let mut md5_blocks = Vec::with_capacity(
            ((self.size as usize) / md5_block_len.max(1) as usize) + 1,
        );
        let mut whole = Md5::new();
        whole.update(&first_block);
        let mut block_hasher = Md5::new();
        block_hasher.update(&first_block);
        let mut in_block = first_block.len() as u64;
        let md5_block_len = u64::from(md5_block_len.max(1));

        if in_block >= md5_block_len {
            md5_blocks.push(block_hasher.finish_for_reuse());
            in_block = 0;
        }

        let mut remaining = self.size - first_block.len() as u64;
        let mut buf = vec![0u8; 64 * 1024];
        let mut done = first_block.len() as u64;
        while remaining > 0 {
            let chunk = buf.len().min(remaining as usize);
            read_exact_io(&mut reader, &mut buf[..chunk], &self.path)?;
            let mut offset = 0usize;
            while offset < chunk {
                let room = (md5_block_len - in_block) as usize;
                let take = room.min(chunk - offset);
                whole.update(&buf[offset..offset + take]);
                block_hasher.update(&buf[offset..offset + take]);
                in_block += take as u64;
                offset += take;
                if in_block == md5_block_len {
                    md5_blocks.push(block_hasher.finish_for_reuse());
                    in_block = 0;
                }
            }
            remaining -= chunk as u64;
            done += chunk as u64;
            let _ = reporter.scanning_file(&self.leafname(), done);
        }
        if in_block > 0 {
            md5_blocks.push(block_hasher.finish_for_reuse());
        }

        let sums = FileSums {
            first_block_rolling,
            md5_blocks,
            whole_file_md5: whole.finalize(),
            block_len,
            md5_block_len: md5_block_len as u32,
        };
        self.sums = Some(sums);
        Ok(self.sums.as_ref())
    }
}

fn read_exact_io(
    reader: &mut impl Read,
    buf: &mut [u8],
    path: &Path,
) -> Result<(), CacheError> {
    reader
        .read_exact(buf)
        .map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// An owning collection of [`ComponentFile`] entries, with automatic label
/// assignment for files whose caller didn't supply one (spec.md §3 glossary
/// "Label"; original jigdo auto-generates `dirA, dirB, ...` per source
/// directory when `--label` isn't given).
#[derive(Clone, Debug, Default)]
pub struct ComponentPool {
    files: Vec<ComponentFile>,
    next_auto_label: u32,
}

impl ComponentPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next unused auto label in the sequence `dirA, dirB,
    /// ..., dirZ, dirAA, ...`.
    pub fn next_auto_label(&mut self) -> String {
        let mut n = self.next_auto_label;
        self.next_auto_label += 1;
        let mut suffix = String::new();
        loop {
            let letter = (b'A' + (n % 26) as u8) as char;
            suffix.insert(0, letter);
            n /= 26;
            if n == 0 {
                break;
            }
            n -= 1;
        }
        format!("dir{suffix}")
    }

    /// Adds a file to the pool, using `label` if given, otherwise the next
    /// auto-generated label.
    pub fn add(
        &mut self,
        path: impl Into<PathBuf>,
        size: u64,
        mtime: i64,
        label: Option<String>,
    ) -> &mut ComponentFile {
        let label = label.unwrap_or_else(|| self.next_auto_label());
        self.files.push(ComponentFile::new(path, size, mtime, label));
        self.files.last_mut().expect("just pushed")
    }

    /// All entries, including ignored ones.
    #[must_use]
    pub fn files(&self) -> &[ComponentFile] {
        &self.files
    }

    /// Mutable access to all entries.
    pub fn files_mut(&mut self) -> &mut [ComponentFile] {
        &mut self.files
    }

    /// Entries that are not ignored and at least `block_len` bytes long —
    /// the set eligible to be matched (spec.md §4.1 contract).
    pub fn eligible(&self, block_len: u32) -> impl Iterator<Item = &ComponentFile> {
        self.files
            .iter()
            .filter(move |f| !f.ignored() && f.size() >= u64::from(block_len))
    }

    /// Finds a file by its whole-file MD5, for decoder-mode lookups
    /// (spec.md §6 "`ComponentProvider` ... plus a lookup by MD5 for
    /// decoder mode").
    #[must_use]
    pub fn find_by_md5(&self, md5: &[u8; 16]) -> Option<&ComponentFile> {
        self.files
            .iter()
            .find(|f| f.sums().is_some_and(|s| &s.whole_file_md5 == md5))
    }
}
