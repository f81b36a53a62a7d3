use std::path::PathBuf;

use cache::ComponentFile;
use checksums::RollingChecksum64;
use progress::{Flow, Reporter};

use crate::error::MatchError;
use crate::hash_table::HashTable;
use crate::partial::{PartialMatch, PartialMatchQueue};

/// Parameters controlling a scan (spec.md §4.1 contract): `0 < block_len <
/// md5_block_len`.
#[derive(Clone, Copy, Debug)]
pub struct MatchParams {
    /// Rolling-sum window length.
    pub block_len: u32,
    /// Length of each MD5 verification block.
    pub md5_block_len: u32,
    /// Read granularity, used only to size the (conceptual) ring buffer;
    /// this implementation scans an in-memory byte slice directly, so it
    /// otherwise has no effect (see `scan`'s doc comment).
    pub read_amount: usize,
}

/// One candidate component file, as seen by the scanner: its pool index,
/// size, and precomputed checksums.
#[derive(Clone, Debug)]
pub struct FileCandidate {
    /// Index into the caller's file table (e.g. a [`cache::ComponentPool`]).
    pub index: usize,
    /// File size in bytes.
    pub size: u64,
    /// Rolling sum of the file's first `block_len` bytes.
    pub first_block_rolling: RollingChecksum64,
    /// MD5 of each consecutive `md5_block_len` chunk.
    pub md5_blocks: Vec<[u8; 16]>,
    /// MD5 of the whole file.
    pub whole_file_md5: [u8; 16],
    /// Label, for the match-exec environment interface.
    pub label: String,
    /// Path on disk, for the match-exec environment interface.
    pub path: PathBuf,
}

impl FileCandidate {
    /// Builds a candidate from a [`ComponentFile`] that already has sums
    /// computed. Returns `None` if the file is ignored or has no sums
    /// (i.e. was smaller than `block_len`).
    #[must_use]
    pub fn from_component(index: usize, file: &ComponentFile) -> Option<Self> {
        let sums = file.sums()?;
        if file.ignored() {
            return None;
        }
        Some(Self {
            index,
            size: file.size(),
            first_block_rolling: sums.first_block_rolling,
            md5_blocks: sums.md5_blocks.clone(),
            whole_file_md5: sums.whole_file_md5,
            label: file.label().to_string(),
            path: file.path().to_path_buf(),
        })
    }

    fn chunk_len(&self, block_number: u32, md5_block_len: u64) -> u64 {
        let start = u64::from(block_number) * md5_block_len;
        (self.size - start).min(md5_block_len)
    }
}

/// One event emitted by [`scan`], in strictly increasing image-offset order
/// (spec.md §5 "Ordering guarantees").
#[derive(Clone, Debug)]
pub enum MatchEvent {
    /// `len` bytes of glue with no matching component file.
    Unmatched {
        /// Number of unmatched bytes.
        len: u64,
    },
    /// A component file was confirmed starting at `start_offset`.
    Matched {
        /// Index of the matched file, as given to [`FileCandidate`].
        file_index: usize,
        /// Image offset the match starts at.
        start_offset: u64,
        /// Number of bytes the match covers (the file's size).
        size: u64,
        /// Rolling sum of the file's first block, as recorded on the wire.
        rsum: RollingChecksum64,
        /// Whole-file MD5, as recorded on the wire.
        md5: [u8; 16],
    },
}

/// Environment-variable-shaped context passed to [`MatchAction`], mirroring
/// `--match-exec`'s interface (spec.md §6).
#[derive(Clone, Debug)]
pub struct MatchContext<'a> {
    /// `LABEL`.
    pub label: &'a str,
    /// `LABELPATH`: the file's path relative to its label's root, here
    /// simply its path on disk (the driver owns true label-relative path
    /// resolution).
    pub label_path: &'a std::path::Path,
    /// `MATCHPATH`: same as `label_path` for this core (driver-specific
    /// path rewriting, if any, happens outside this crate).
    pub match_path: &'a std::path::Path,
    /// `LEAF`: the file's leaf name.
    pub leaf: String,
    /// `MD5SUM`: the file's whole-file MD5.
    pub md5sum: [u8; 16],
    /// `FILE`: the file's path on disk.
    pub file: &'a std::path::Path,
}

/// Callback invoked for every confirmed match, the core-side equivalent of
/// shelling out to `--match-exec` (spec.md §4.1 "side effects").
pub trait MatchAction {
    /// Called once per confirmed match, in image order.
    fn on_match(&mut self, ctx: &MatchContext<'_>);
}

impl MatchAction for () {
    fn on_match(&mut self, _ctx: &MatchContext<'_>) {}
}

/// Scans `image` for occurrences of any file in `files`, returning a list
/// of [`MatchEvent`]s in image order (spec.md §4.1).
///
/// This implementation requires the whole image in memory (or otherwise
/// randomly addressable as a byte slice) rather than the spec's bounded
/// ring buffer over a possibly non-seekable stream; re-reads for discarded
/// partial matches are therefore simple re-slicing instead of a seek-back
/// onto the candidate file. The [`PartialMatchQueue`] bound, sector-
/// alignment drop heuristic and fast-forward mode are still exercised
/// exactly as specified, since those govern *which* candidates are
/// tracked, not how their bytes are obtained (see DESIGN.md "scanner
/// memory model").
///
/// # Errors
///
/// Returns [`MatchError::Cancelled`] if `reporter` requests cancellation.
pub fn scan(
    image: &[u8],
    files: &[FileCandidate],
    params: MatchParams,
    mut action: Option<&mut dyn MatchAction>,
    reporter: &dyn Reporter,
) -> Result<Vec<MatchEvent>, MatchError> {
    let block_len = u64::from(params.block_len);
    let md5_block_len = u64::from(params.md5_block_len);
    let table = HashTable::build(files.iter().map(|f| (f.index, f.first_block_rolling)));

    let mut events = Vec::new();
    let mut queue = PartialMatchQueue::new();
    let mut unmatched_start: u64 = 0;
    let mut pos: u64 = 0;
    let len = image.len() as u64;

    // index into `files` by FileCandidate::index, for O(1) lookup from the
    // hash table's returned indices.
    let by_index: std::collections::HashMap<usize, &FileCandidate> =
        files.iter().map(|f| (f.index, f)).collect();

    let mut last_progress = 0u64;

    while pos <= len {
        if pos.saturating_sub(last_progress) >= 256 * 1024 {
            last_progress = pos;
            reporter
                .scanning_image(pos, len)
                .into_result()
                .map_err(MatchError::Cancelled)?;
        }

        // Step 3: resolve any partial matches due at this offset.
        let due = queue.take_due(pos);
        let mut confirmed_end = None;
        for due_match in due {
            let Some(file) = by_index.get(&due_match.file_index).copied() else {
                continue;
            };
            let block_start = due_match.start_offset + u64::from(due_match.block_number) * md5_block_len;
            if due_match.next_event_offset > len {
                continue; // ran off the end of the image; can't verify.
            }
            let chunk = &image[block_start as usize..due_match.next_event_offset as usize];
            reporter
                .reading_md5(block_start, chunk.len() as u64)
                .into_result()
                .map_err(MatchError::Cancelled)?;
            let digest = checksums::strong::Md5::digest(chunk);
            let expected = file.md5_blocks[due_match.block_number as usize];
            if digest != expected {
                continue; // drop this partial match.
            }
            if due_match.next_event_offset == due_match.start_offset + file.size {
                // Fully verified: confirmed match.
                confirmed_end = Some((due_match, file));
                break;
            }
            let next_block_number = due_match.block_number + 1;
            let next_chunk_len = file.chunk_len(next_block_number, md5_block_len);
            queue.reinsert(PartialMatch {
                start_offset: due_match.start_offset,
                next_event_offset: due_match.next_event_offset + next_chunk_len,
                block_number: next_block_number,
                file_index: due_match.file_index,
                projected_end: due_match.projected_end,
            });
        }

        if let Some((confirmed, file)) = confirmed_end {
            if confirmed.start_offset > unmatched_start {
                events.push(MatchEvent::Unmatched {
                    len: confirmed.start_offset - unmatched_start,
                });
            }
            events.push(MatchEvent::Matched {
                file_index: file.index,
                start_offset: confirmed.start_offset,
                size: file.size,
                rsum: file.first_block_rolling,
                md5: file.whole_file_md5,
            });
            if let Some(action) = action.as_deref_mut() {
                let leaf = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ctx = MatchContext {
                    label: &file.label,
                    label_path: &file.path,
                    match_path: &file.path,
                    leaf,
                    md5sum: file.whole_file_md5,
                    file: &file.path,
                };
                action.on_match(&ctx);
            }
            reporter
                .match_found(&file.label, confirmed.start_offset)
                .into_result()
                .map_err(MatchError::Cancelled)?;

            let end = confirmed.start_offset + file.size;
            queue.discard_before(end);
            unmatched_start = end;
            pos = end;
            continue;
        }

        // Step 1/2: look for new candidates starting at `pos`, unless
        // fast-forward mode (queue full, not sector-aligned) skips it.
        let check_new_candidates = !queue.is_full() || pos % queue.sector_length() == 0;
        if check_new_candidates && pos + block_len <= len {
            let mut window = RollingChecksum64::new();
            window.update(&image[pos as usize..(pos + block_len) as usize]);
            for &candidate_index in table.candidates(window) {
                let Some(file) = by_index.get(&candidate_index).copied() else {
                    continue;
                };
                let chunk_len = file.chunk_len(0, md5_block_len);
                queue.try_insert(PartialMatch {
                    start_offset: pos,
                    next_event_offset: pos + chunk_len,
                    block_number: 0,
                    file_index: candidate_index,
                    projected_end: pos + file.size,
                });
            }
        }

        pos += 1;
    }

    if len > unmatched_start {
        events.push(MatchEvent::Unmatched {
            len: len - unmatched_start,
        });
    }

    reporter
        .finished(len)
        .into_result()
        .map_err(MatchError::Cancelled)?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress::NullReporter;

    fn candidate(index: usize, data: &[u8], block_len: u32, md5_block_len: u32, label: &str) -> FileCandidate {
        let mut rolling = RollingChecksum64::new();
        rolling.update(&data[..block_len as usize]);
        let mut md5_blocks = Vec::new();
        for chunk in data.chunks(md5_block_len as usize) {
            md5_blocks.push(checksums::strong::Md5::digest(chunk));
        }
        FileCandidate {
            index,
            size: data.len() as u64,
            first_block_rolling: rolling,
            md5_blocks,
            whole_file_md5: checksums::strong::Md5::digest(data),
            label: label.to_string(),
            path: PathBuf::from(label),
        }
    }

    #[test]
    fn e1_glue_between_two_matches() {
        let f1 = vec![b'A'; 8192];
        let f2 = vec![b'C'; 4096];
        let mut image = f1.clone();
        image.extend_from_slice(b"BBBB");
        image.extend_from_slice(&f2);

        let files = vec![
            candidate(0, &f1, 1024, 8192, "dirA"),
            candidate(1, &f2, 1024, 8192, "dirA"),
        ];
        let params = MatchParams {
            block_len: 1024,
            md5_block_len: 8192,
            read_amount: 4096,
        };

        let events = scan(&image, &files, params, None, &NullReporter).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], MatchEvent::Matched { file_index: 0, size: 8192, .. }));
        assert!(matches!(events[1], MatchEvent::Unmatched { len: 4 }));
        assert!(matches!(events[2], MatchEvent::Matched { file_index: 1, size: 4096, .. }));
    }

    #[test]
    fn e2_back_to_back_matches_with_no_glue() {
        let f1 = vec![b'A'; 2048];
        let f2 = vec![b'B'; 2048];
        let mut image = f1.clone();
        image.extend_from_slice(&f2);

        let files = vec![
            candidate(0, &f1, 512, 1024, "dirA"),
            candidate(1, &f2, 512, 1024, "dirA"),
        ];
        let params = MatchParams {
            block_len: 512,
            md5_block_len: 1024,
            read_amount: 4096,
        };

        let events = scan(&image, &files, params, None, &NullReporter).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], MatchEvent::Matched { file_index: 0, .. }));
        assert!(matches!(events[1], MatchEvent::Matched { file_index: 1, .. }));
    }

    #[test]
    fn e3_same_component_appears_twice() {
        let f1 = vec![b'A'; 1024];
        let mut image = f1.clone();
        image.extend_from_slice(b"--");
        image.extend_from_slice(&f1);

        let files = vec![candidate(0, &f1, 256, 512, "dirA")];
        let params = MatchParams {
            block_len: 256,
            md5_block_len: 512,
            read_amount: 4096,
        };

        let events = scan(&image, &files, params, None, &NullReporter).unwrap();
        let matches: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, MatchEvent::Matched { .. }))
            .collect();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn e4_near_match_with_divergent_tail_stays_unmatched() {
        let mut f1 = vec![b'A'; 2048];
        let mut near = vec![b'A'; 1024];
        near.extend(std::iter::repeat(b'Z').take(1024));
        // Ensure the rolling sum of the first block_len bytes collides: both
        // start with the same first 256 bytes, so the 256-byte window used
        // for candidacy matches, but the full md5_block_len block differs.
        f1[..256].copy_from_slice(&vec![b'A'; 256]);
        near[..256].copy_from_slice(&vec![b'A'; 256]);

        let image = near.clone();
        let files = vec![candidate(0, &f1, 256, 2048, "dirA")];
        let params = MatchParams {
            block_len: 256,
            md5_block_len: 2048,
            read_amount: 4096,
        };

        let events = scan(&image, &files, params, None, &NullReporter).unwrap();
        assert!(events.iter().all(|e| !matches!(e, MatchEvent::Matched { .. })));
    }

    #[test]
    fn match_action_invoked_on_confirmed_match() {
        let f1 = vec![b'A'; 512];
        let files = vec![candidate(0, &f1, 128, 512, "dirA")];
        let params = MatchParams {
            block_len: 128,
            md5_block_len: 512,
            read_amount: 4096,
        };

        struct Counter(u32);
        impl MatchAction for Counter {
            fn on_match(&mut self, _ctx: &MatchContext<'_>) {
                self.0 += 1;
            }
        }

        let mut counter = Counter(0);
        let events = scan(&f1, &files, params, Some(&mut counter), &NullReporter).unwrap();
        assert_eq!(counter.0, 1);
        assert_eq!(events.len(), 1);
    }
}
