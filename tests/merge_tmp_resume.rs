//! spec.md E6: a `CreateTmp` pass with no components available yields a
//! zero-padded temp file plus a descriptor table; a later `MergeTmp` pass
//! supplying the components completes and verifies the image.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use cache::ComponentPool;
use jigdo::{create_template, reconstruct_image, Codec, EncoderConfig, MatchParams, ReconstructMode};
use progress::NullReporter;
use tempfile::tempdir;

#[test]
fn create_tmp_then_merge_tmp_completes_the_image() {
    let dir = tempdir().unwrap();
    let f1 = vec![b'A'; 8192];
    let f2 = vec![b'B'; 4096];
    let f1_path = dir.path().join("f1.bin");
    let f2_path = dir.path().join("f2.bin");
    std::fs::write(&f1_path, &f1).unwrap();
    std::fs::write(&f2_path, &f2).unwrap();

    let mut image = Vec::new();
    image.extend_from_slice(&f1);
    image.extend_from_slice(b"glue");
    image.extend_from_slice(&f2);

    let mut full_pool = ComponentPool::new();
    full_pool.add(&f1_path, f1.len() as u64, 0, Some("F1".to_string()));
    full_pool.add(&f2_path, f2.len() as u64, 0, Some("F2".to_string()));

    let params = MatchParams {
        block_len: 1024,
        md5_block_len: 8192,
        read_amount: 64 * 1024,
    };
    let config = EncoderConfig {
        codec: Codec::Deflate,
        zipped_buf_sz: 1 << 16,
        block_len: 1024,
        comment: "resume test".to_string(),
    };

    let mut template_bytes = Vec::new();
    create_template(&image, &mut full_pool, params, config, &mut template_bytes, &NullReporter).unwrap();

    // Pass 1: no components available at all, so every entry is
    // zero-padded and the temp file is incomplete.
    let empty_pool = ComponentPool::new();
    let tmp_path = dir.path().join("image.tmp");
    let mut tmp_file = File::create(&tmp_path).unwrap();
    let all_present = reconstruct_image(
        Cursor::new(&template_bytes),
        &mut tmp_file,
        Codec::Deflate,
        ReconstructMode::CreateTmp,
        &empty_pool,
        None,
        &NullReporter,
    )
    .unwrap();
    assert!(!all_present);

    let mut padded = Vec::new();
    let mut check = File::open(&tmp_path).unwrap();
    check.read_to_end(&mut padded).unwrap();
    assert!(padded.len() as u64 >= image.len() as u64);
    assert_ne!(padded[..image.len()], image[..]);

    // Pass 2: every component is now available; merge_tmp fills them in
    // and reports completion.
    let mut tmp_file = OpenOptions::new().read(true).write(true).open(&tmp_path).unwrap();
    let complete = reconstruct_image(
        Cursor::new(&template_bytes),
        std::io::sink(),
        Codec::Deflate,
        ReconstructMode::MergeTmp,
        &full_pool,
        Some(&mut tmp_file),
        &NullReporter,
    )
    .unwrap();
    assert!(complete);

    tmp_file.seek(SeekFrom::Start(0)).unwrap();
    let mut completed = vec![0u8; image.len()];
    tmp_file.read_exact(&mut completed).unwrap();
    assert_eq!(completed, image);
}
