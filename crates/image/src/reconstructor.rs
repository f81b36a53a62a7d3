use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use checksums::strong::Md5;
use progress::Reporter;
use template::{Codec, Descriptor};

use crate::error::ImageError;
use crate::reader::{read_trailing_descriptors, GlueReader, TemplateHeader};

/// Resolves a descriptor's whole-file MD5 to a component file on disk
/// (spec.md §6 "`ComponentProvider` ... plus a lookup by MD5 for decoder
/// mode"). Implemented below for [`cache::ComponentPool`], so a caller
/// that already built a pool while scanning can reuse it here.
pub trait ComponentProvider {
    /// Returns the path of the component file whose whole-file MD5 is
    /// `md5`, if one is known.
    fn locate(&self, md5: &[u8; 16]) -> Option<&Path>;
}

impl ComponentProvider for cache::ComponentPool {
    fn locate(&self, md5: &[u8; 16]) -> Option<&Path> {
        self.find_by_md5(md5).map(cache::ComponentFile::path)
    }
}

/// Which of the three reconstruction strategies spec.md §4.3 describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconstructMode {
    /// Write the image in one sequential pass, failing as soon as a
    /// component file can't be located.
    SinglePass,
    /// Write the image in one sequential pass, zero-padding any missing
    /// component file instead of failing, then append a descriptor table
    /// recording which entries were actually supplied.
    CreateTmp,
    /// Resume a `CREATE_TMP` output: fill in entries that have since
    /// become available, leaving already-written and still-missing
    /// entries as they are.
    MergeTmp,
}

/// Drives a template's descriptors through to a reconstructed image
/// (spec.md §4.3 "`ImageReconstructor`"). Each associated function is one
/// of the three [`ReconstructMode`] strategies; which one a caller needs
/// depends on whether every component file is expected to be present.
///
/// # Errors
///
/// [`ImageError::MissingComponent`] in [`ImageReconstructor::single_pass`]
/// if a component file can't be located, [`ImageError::ComponentMismatch`]
/// if a located file's bytes don't hash to its descriptor's MD5,
/// [`ImageError::ImageMismatch`] if the completed image's MD5 disagrees
/// with `ImageInfo.md5`, [`ImageError::TempMismatch`] if a prior temp
/// file's descriptor table disagrees with the current template, or
/// [`ImageError::Io`]/[`ImageError::Template`] on a lower-level failure.
pub struct ImageReconstructor;

impl ImageReconstructor {
    /// Reconstructs the image in [`ReconstructMode::SinglePass`].
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub fn single_pass<R, W>(
        mut template: R,
        mut out: W,
        codec: Codec,
        provider: &impl ComponentProvider,
        reporter: &dyn Reporter,
    ) -> Result<(), ImageError>
    where
        R: Read + Seek,
        W: Write,
    {
        let header = TemplateHeader::parse(&mut template)?;
        let (image_size, image_md5, _block_len) = header.image_info()?;
        let mut glue = GlueReader::new(&mut template, codec, header.body_start, header.desc_start)?;

        let mut hasher = Md5::new();
        let mut written = 0u64;
        for desc in body_descriptors(&header.descriptors) {
            match desc {
                Descriptor::UnmatchedData { size } => {
                    let bytes = glue.read_exact(*size)?;
                    out.write_all(&bytes)?;
                    hasher.update(&bytes);
                }
                Descriptor::MatchedFile { size, md5, .. } | Descriptor::WrittenFile { size, md5, .. } => {
                    let path = provider
                        .locate(md5)
                        .ok_or_else(|| ImageError::MissingComponent {
                            md5: checksums::base64::encode(md5),
                        })?
                        .to_path_buf();
                    let bytes = read_component(&path, *size)?;
                    verify_component(&bytes, md5, &path)?;
                    out.write_all(&bytes)?;
                    hasher.update(&bytes);
                }
                Descriptor::ImageInfo { .. } => unreachable!("filtered out by body_descriptors"),
            }
            written += desc.size();
            reporter.writing_image(written, image_size, 0, image_size).into_result()?;
        }

        if hasher.finalize() != image_md5 {
            return Err(ImageError::ImageMismatch);
        }
        reporter.finished(image_size);
        Ok(())
    }

    /// Reconstructs the image in [`ReconstructMode::CreateTmp`]: missing
    /// component files are zero-padded rather than treated as fatal, and a
    /// descriptor table recording which entries were actually written is
    /// appended to `out`.
    ///
    /// Returns `true` if every component file was available (the output is
    /// already a complete, verified image aside from its trailing
    /// descriptor table), `false` if at least one entry still needs
    /// [`ImageReconstructor::merge_tmp`].
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub fn create_tmp<R, W>(
        mut template: R,
        mut out: W,
        codec: Codec,
        provider: &impl ComponentProvider,
        reporter: &dyn Reporter,
    ) -> Result<bool, ImageError>
    where
        R: Read + Seek,
        W: Write,
    {
        let header = TemplateHeader::parse(&mut template)?;
        let (image_size, image_md5, block_len) = header.image_info()?;
        let mut glue = GlueReader::new(&mut template, codec, header.body_start, header.desc_start)?;

        let mut hasher = Md5::new();
        let mut written = 0u64;
        let mut all_present = true;
        let mut own_descriptors = Vec::new();

        for desc in body_descriptors(&header.descriptors) {
            match desc {
                Descriptor::UnmatchedData { size } => {
                    let bytes = glue.read_exact(*size)?;
                    out.write_all(&bytes)?;
                    hasher.update(&bytes);
                    own_descriptors.push(*desc);
                }
                Descriptor::MatchedFile { size, rsum, md5 } => {
                    // A component that's missing, or whose bytes fail MD5
                    // verification, is not fatal here (spec.md §4.3
                    // "Verification": per-file error, right byte count
                    // still written) — it's zero-padded and left for a
                    // later `merge_tmp` pass to retry.
                    let verified = match provider.locate(md5).map(Path::to_path_buf) {
                        Some(path) => {
                            let bytes = read_component(&path, *size)?;
                            bytes_match(&bytes, md5).then_some(bytes)
                        }
                        None => None,
                    };
                    if let Some(bytes) = verified {
                        out.write_all(&bytes)?;
                        hasher.update(&bytes);
                        own_descriptors.push(Descriptor::WrittenFile {
                            size: *size,
                            rsum: *rsum,
                            md5: *md5,
                        });
                    } else {
                        let zeros = vec![0u8; *size as usize];
                        out.write_all(&zeros)?;
                        hasher.update(&zeros);
                        own_descriptors.push(*desc);
                        all_present = false;
                    }
                }
                Descriptor::WrittenFile { .. } | Descriptor::ImageInfo { .. } => {
                    unreachable!("a freshly written template carries no WrittenFile entries")
                }
            }
            written += desc.size();
            reporter.writing_image(written, image_size, 0, image_size).into_result()?;
        }

        own_descriptors.push(Descriptor::ImageInfo {
            size: image_size,
            md5: image_md5,
            block_len,
        });
        template::write_desc_part(&mut out, &own_descriptors)?;

        if all_present && hasher.finalize() != image_md5 {
            return Err(ImageError::ImageMismatch);
        }
        reporter.finished(image_size);
        Ok(all_present)
    }

    /// Resumes a [`ReconstructMode::CreateTmp`] output in place: validates
    /// `tmp`'s own trailing descriptor table against the current
    /// `template`, fills in any entry that's now available via `provider`,
    /// and either truncates the descriptor table (once every entry is
    /// written) or rewrites it with the updated statuses.
    ///
    /// Returns `true` once the image is complete and verified.
    ///
    /// # Errors
    ///
    /// See the type-level docs. In particular, [`ImageError::TempMismatch`]
    /// covers an entry count mismatch, an `ImageInfo` mismatch, or any
    /// non-status field (size, rolling sum, MD5) changing between runs.
    pub fn merge_tmp<R>(
        mut template: R,
        tmp: &mut File,
        codec: Codec,
        provider: &impl ComponentProvider,
        reporter: &dyn Reporter,
    ) -> Result<bool, ImageError>
    where
        R: Read + Seek,
    {
        let _ = codec; // the temp file's own glue bytes are never re-read; only newly available files are.
        let header = TemplateHeader::parse(&mut template)?;
        let (image_size, image_md5, block_len) = header.image_info()?;
        let body: Vec<&Descriptor> = body_descriptors(&header.descriptors).collect();

        let (tmp_desc_start, mut tmp_descriptors) = read_trailing_descriptors(&mut *tmp)?;
        let tmp_image_info = tmp_descriptors
            .pop()
            .ok_or_else(|| ImageError::TempMismatch("temp file descriptor table is empty".into()))?;
        match tmp_image_info {
            Descriptor::ImageInfo {
                size,
                md5,
                block_len: tmp_block_len,
            } if size == image_size && md5 == image_md5 && tmp_block_len == block_len => {}
            Descriptor::ImageInfo { .. } => {
                return Err(ImageError::TempMismatch(
                    "ImageInfo does not match template".into(),
                ))
            }
            _ => {
                return Err(ImageError::TempMismatch(
                    "temp file's last descriptor is not ImageInfo".into(),
                ))
            }
        }
        if tmp_descriptors.len() != body.len() {
            return Err(ImageError::TempMismatch(format!(
                "descriptor count mismatch: template has {}, temp file has {}",
                body.len(),
                tmp_descriptors.len()
            )));
        }

        let mut offset = 0u64;
        let mut all_present = true;
        for (slot, template_desc) in tmp_descriptors.iter_mut().zip(body.iter()) {
            if !same_payload(slot, template_desc) {
                return Err(ImageError::TempMismatch(
                    "descriptor payload changed between runs".into(),
                ));
            }
            let size = slot.size();
            if let Descriptor::MatchedFile { rsum, md5, .. } = *slot {
                // As in `create_tmp`, a checksum mismatch here is a
                // per-file error, not fatal to the whole merge: leave the
                // descriptor as `MatchedFile` (still zero-padded from the
                // prior pass) so a later pass can retry it.
                let verified = match provider.locate(&md5).map(Path::to_path_buf) {
                    Some(path) => {
                        let bytes = read_component(&path, size)?;
                        bytes_match(&bytes, &md5).then_some(bytes)
                    }
                    None => None,
                };
                if let Some(bytes) = verified {
                    tmp.seek(SeekFrom::Start(offset))?;
                    tmp.write_all(&bytes)?;
                    *slot = Descriptor::WrittenFile { size, rsum, md5 };
                } else {
                    all_present = false;
                }
            }
            offset += size;
            reporter.writing_image(offset, image_size, 0, image_size).into_result()?;
        }

        if all_present {
            tmp.seek(SeekFrom::Start(0))?;
            let mut hasher = Md5::new();
            hasher.update_from_reader(&mut *tmp, offset, 64 * 1024, |_done| {})?;
            if hasher.finalize() != image_md5 {
                return Err(ImageError::ImageMismatch);
            }
            tmp.set_len(offset)?;
        } else {
            tmp_descriptors.push(Descriptor::ImageInfo {
                size: image_size,
                md5: image_md5,
                block_len,
            });
            tmp.seek(SeekFrom::Start(tmp_desc_start))?;
            template::write_desc_part(tmp, &tmp_descriptors)?;
            let end = tmp.stream_position()?;
            tmp.set_len(end)?;
        }
        reporter.finished(image_size);
        Ok(all_present)
    }
}

fn body_descriptors(descriptors: &[Descriptor]) -> impl Iterator<Item = &Descriptor> {
    descriptors.iter().filter(|d| !matches!(d, Descriptor::ImageInfo { .. }))
}

fn same_payload(a: &Descriptor, b: &Descriptor) -> bool {
    match (a, b) {
        (Descriptor::UnmatchedData { size: sa }, Descriptor::UnmatchedData { size: sb }) => sa == sb,
        (
            Descriptor::MatchedFile { size: sa, rsum: ra, md5: ma }
            | Descriptor::WrittenFile { size: sa, rsum: ra, md5: ma },
            Descriptor::MatchedFile { size: sb, rsum: rb, md5: mb }
            | Descriptor::WrittenFile { size: sb, rsum: rb, md5: mb },
        ) => sa == sb && ra == rb && ma == mb,
        _ => false,
    }
}

fn read_component(path: &Path, size: u64) -> Result<Vec<u8>, ImageError> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; size as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn verify_component(bytes: &[u8], expected_md5: &[u8; 16], path: &Path) -> Result<(), ImageError> {
    if bytes_match(bytes, expected_md5) {
        Ok(())
    } else {
        Err(ImageError::ComponentMismatch { leaf: leaf_name(path) })
    }
}

fn bytes_match(bytes: &[u8], expected_md5: &[u8; 16]) -> bool {
    Md5::digest(bytes) == *expected_md5
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
