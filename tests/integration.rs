use std::fs;
use std::path::PathBuf;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tempfile::TempDir;

use shardpipe::PipelineError;
use shardpipe::commands::{
    compress_file, decompress_file, disperse_file, reassemble_file, recover_file, split_file,
};
use shardpipe::domain::{ShareCount, SplitConfig, Threshold};

fn config(k: u16, n: u16) -> SplitConfig {
    SplitConfig::new(Threshold::new(k).unwrap(), ShareCount::new(n).unwrap()).unwrap()
}

fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.r#gen()).collect()
}

fn write_input(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();
    path
}

fn share_paths(input: &PathBuf, indices: &[u32]) -> Vec<PathBuf> {
    indices
        .iter()
        .map(|&i| shardpipe::codec::share_path(input, i))
        .collect()
}

#[test]
fn secret_split_three_of_five_recovers_from_any_subset() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(10 * 1024, 7);
    let input = write_input(&dir, "data.bin", &data);

    split_file(config(3, 5), &input, b"integration seed").unwrap();

    // All five share files exist, each leading with its big-endian index.
    for i in 0..5u32 {
        let share = shardpipe::codec::share_path(&input, i);
        let name = share.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(&format!(".{i:03}")), "bad suffix on {name}");
        let bytes = fs::read(&share).unwrap();
        assert_eq!(bytes[..4], i.to_be_bytes());
    }

    let output = dir.path().join("recovered.bin");
    recover_file(&share_paths(&input, &[0, 2, 4]), &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), data);

    // Order of the supplied shares is irrelevant.
    let output2 = dir.path().join("recovered2.bin");
    recover_file(&share_paths(&input, &[4, 0, 2]), &output2).unwrap();
    assert_eq!(fs::read(&output2).unwrap(), data);
}

#[test]
fn secret_two_of_two_requires_both_shares() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "hello.txt", b"hello world");

    split_file(config(2, 2), &input, b"seed").unwrap();

    let output = dir.path().join("out.txt");
    recover_file(&share_paths(&input, &[0, 1]), &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"hello world");
}

#[test]
fn dispersal_round_trip_and_share_sizes() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(64 * 1024, 11);
    let input = write_input(&dir, "blob.bin", &data);

    disperse_file(config(3, 5), &input).unwrap();

    // Dispersal shares are fractional-size, unlike secret shares.
    for i in 0..5u32 {
        let share = fs::read(shardpipe::codec::share_path(&input, i)).unwrap();
        assert!(share.len() < data.len() / 2);
    }

    let output = dir.path().join("reassembled.bin");
    reassemble_file(&share_paths(&input, &[1, 3, 4]), &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn round_trip_at_chunk_boundaries() {
    let dir = TempDir::new().unwrap();
    for len in [0usize, 1, 255, 256, 257] {
        let data = pseudo_random_bytes(len, len as u64);
        let input = write_input(&dir, &format!("b{len}.bin"), &data);

        split_file(config(2, 3), &input, b"boundary seed").unwrap();
        let out = dir.path().join(format!("b{len}.rec"));
        recover_file(&share_paths(&input, &[0, 2]), &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), data, "secret len {len}");

        disperse_file(config(2, 3), &input).unwrap();
        let out = dir.path().join(format!("b{len}.reas"));
        reassemble_file(&share_paths(&input, &[2, 1]), &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), data, "dispersal len {len}");
    }
}

#[test]
fn round_trip_multi_megabyte_input() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(3 * 1024 * 1024, 23);
    let input = write_input(&dir, "large.bin", &data);

    split_file(config(2, 3), &input, b"large seed").unwrap();
    let out = dir.path().join("large.rec");
    recover_file(&share_paths(&input, &[1, 2]), &out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), data);

    disperse_file(config(3, 4), &input).unwrap();
    let out = dir.path().join("large.reas");
    reassemble_file(&share_paths(&input, &[0, 2, 3]), &out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), data);
}

#[test]
fn out_of_range_share_count_creates_no_files() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "guarded.bin", b"never split");

    // 1001 shares cannot even be configured.
    let err = ShareCount::new(1001).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidArgument(_)));
    assert!(!shardpipe::codec::share_path(&input, 0).exists());

    // The limit itself is fine.
    assert!(ShareCount::new(1000).is_ok());
    assert!(Threshold::new(1000).is_ok());
}

#[test]
fn one_of_one_thousand_shares_is_accepted() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "tiny.bin", b"threshold limit");

    split_file(config(1, 1000), &input, b"limit seed").unwrap();
    assert!(shardpipe::codec::share_path(&input, 0).exists());
    assert!(shardpipe::codec::share_path(&input, 999).exists());

    // The highest-numbered share alone recovers a 1-threshold split.
    let output = dir.path().join("tiny.rec");
    recover_file(&share_paths(&input, &[999]), &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"threshold limit");
}

#[test]
fn recovery_validates_threshold_before_opening_anything() {
    // 1001 nonexistent share paths: the range check must fire before any
    // open() is attempted, so the error is InvalidArgument, not IO.
    let inputs: Vec<PathBuf> = (0..1001)
        .map(|i| PathBuf::from(format!("/nonexistent/share.{i:03}")))
        .collect();
    let err = recover_file(&inputs, &PathBuf::from("/nonexistent/out")).unwrap_err();
    let pipeline_err = err.downcast_ref::<PipelineError>().unwrap();
    assert!(matches!(pipeline_err, PipelineError::InvalidArgument(_)));
}

#[test]
fn empty_input_produces_header_only_shares() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "empty.bin", b"");

    split_file(config(2, 3), &input, b"seed for nothing").unwrap();
    for i in 0..3u32 {
        let bytes = fs::read(shardpipe::codec::share_path(&input, i)).unwrap();
        assert_eq!(bytes, i.to_be_bytes(), "share {i} should be header-only");
    }

    let output = dir.path().join("empty.rec");
    recover_file(&share_paths(&input, &[1, 2]), &output).unwrap();
    assert_eq!(fs::read(&output).unwrap().len(), 0);
}

#[test]
fn recovery_with_fewer_shares_never_silently_succeeds() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(4096, 31);
    let input = write_input(&dir, "threeway.bin", &data);

    split_file(config(3, 5), &input, b"seed").unwrap();

    // Two shares of a 3-threshold split: recovery treats the file count as
    // the threshold, so this either fails outright or diverges detectably.
    let output = dir.path().join("short.rec");
    let result = recover_file(&share_paths(&input, &[0, 1]), &output);
    match result {
        Err(_) => {}
        Ok(()) => assert_ne!(fs::read(&output).unwrap(), data),
    }
}

#[test]
fn same_seed_reproduces_shares_different_seed_does_not() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(2048, 41);
    let input_a = write_input(&dir, "a.bin", &data);
    let input_b = write_input(&dir, "b.bin", &data);
    let input_c = write_input(&dir, "c.bin", &data);

    split_file(config(2, 3), &input_a, b"same phrase").unwrap();
    split_file(config(2, 3), &input_b, b"same phrase").unwrap();
    split_file(config(2, 3), &input_c, b"other phrase").unwrap();

    let share_a = fs::read(shardpipe::codec::share_path(&input_a, 1)).unwrap();
    let share_b = fs::read(shardpipe::codec::share_path(&input_b, 1)).unwrap();
    let share_c = fs::read(shardpipe::codec::share_path(&input_c, 1)).unwrap();
    assert_eq!(share_a, share_b);
    assert_ne!(share_a, share_c);
}

#[test]
fn self_checked_compression_round_trips() {
    let dir = TempDir::new().unwrap();
    // Compressible text-like input, about a megabyte.
    let data: Vec<u8> = b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(1024 * 1024)
        .collect();
    let input = write_input(&dir, "text.txt", &data);

    let compressed = dir.path().join("text.zst");
    compress_file(&input, &compressed, 3).unwrap();
    assert!(fs::metadata(&compressed).unwrap().len() < data.len() as u64);

    let restored = dir.path().join("text.out");
    decompress_file(&compressed, &restored).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), data);
}

#[test]
fn compressing_an_empty_file_works() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "void.txt", b"");

    let compressed = dir.path().join("void.zst");
    compress_file(&input, &compressed, 3).unwrap();

    let restored = dir.path().join("void.out");
    decompress_file(&compressed, &restored).unwrap();
    assert_eq!(fs::read(&restored).unwrap().len(), 0);
}

#[test]
fn corrupted_compressed_file_fails_decompression() {
    let dir = TempDir::new().unwrap();
    let data = pseudo_random_bytes(32 * 1024, 53);
    let input = write_input(&dir, "payload.bin", &data);

    let compressed = dir.path().join("payload.zst");
    compress_file(&input, &compressed, 3).unwrap();

    let mut bytes = fs::read(&compressed).unwrap();
    let target = bytes.len() / 2;
    bytes[target] ^= 0xFF;
    let corrupted = write_input(&dir, "corrupted.zst", &bytes);

    let restored = dir.path().join("restored.bin");
    let result = decompress_file(&corrupted, &restored);
    match result {
        Err(_) => {}
        Ok(()) => assert_ne!(fs::read(&restored).unwrap(), data),
    }
}
