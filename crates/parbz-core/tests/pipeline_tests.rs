use std::fs;
use std::sync::Arc;

use parbz_core::{
    CompressionEngine, Compressor, CompressorConfig, EngineKind, MemoryStrategy, ParbzError,
};
use tempfile::tempdir;

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn config(block_size: usize, engine: EngineKind) -> CompressorConfig {
    CompressorConfig {
        block_size,
        workers: 4,
        strategy: MemoryStrategy::WholeFile,
        engine,
        level: engine.default_level(),
    }
}

#[test]
fn bzip2_round_trip_across_block_boundaries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    let output = dir.path().join("input.bin.bz2");
    let contents = patterned(10_000);
    fs::write(&input, &contents)?;

    let compressor = Compressor::new(config(1024, EngineKind::Bzip2))?;
    let stats = compressor.compress_file(&input, &output)?;

    assert_eq!(stats.input_bytes, contents.len() as u64);
    assert_eq!(stats.blocks_total, 10);
    assert_eq!(stats.output_bytes, fs::metadata(&output)?.len());

    // The concatenated per-block streams must decode back to the original.
    let engine = EngineKind::Bzip2.build(9);
    let decoded = engine.decompress(&fs::read(&output)?)?;
    assert_eq!(decoded, contents);

    Ok(())
}

#[test]
fn gzip_round_trip_across_block_boundaries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    let output = dir.path().join("input.bin.gz");
    let contents = patterned(5_000);
    fs::write(&input, &contents)?;

    let compressor = Compressor::new(config(999, EngineKind::Gzip))?;
    compressor.compress_file(&input, &output)?;

    let engine = EngineKind::Gzip.build(6);
    let decoded = engine.decompress(&fs::read(&output)?)?;
    assert_eq!(decoded, contents);

    Ok(())
}

#[test]
fn strategies_produce_identical_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    fs::write(&input, patterned(7_777))?;

    let whole_out = dir.path().join("whole.bz2");
    let stream_out = dir.path().join("stream.bz2");

    let mut cfg = config(1000, EngineKind::Bzip2);
    Compressor::new(cfg.clone())?.compress_file(&input, &whole_out)?;
    cfg.strategy = MemoryStrategy::Streaming;
    Compressor::new(cfg)?.compress_file(&input, &stream_out)?;

    assert_eq!(fs::read(&whole_out)?, fs::read(&stream_out)?);

    Ok(())
}

#[test]
fn repeated_runs_are_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    fs::write(&input, patterned(4_096))?;

    let first = dir.path().join("a.bz2");
    let second = dir.path().join("b.bz2");
    let compressor = Compressor::new(config(512, EngineKind::Bzip2))?;
    compressor.compress_file(&input, &first)?;
    compressor.compress_file(&input, &second)?;

    assert_eq!(fs::read(&first)?, fs::read(&second)?);

    Ok(())
}

#[test]
fn zero_byte_input_yields_empty_valid_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("empty.bin");
    let output = dir.path().join("empty.bin.bz2");
    fs::write(&input, b"")?;

    let compressor = Compressor::new(config(1024, EngineKind::Bzip2))?;
    let stats = compressor.compress_file(&input, &output)?;

    assert!(output.exists());
    assert_eq!(fs::metadata(&output)?.len(), 0);
    assert_eq!(stats.input_bytes, 0);
    assert_eq!(stats.output_bytes, 0);
    assert_eq!(stats.blocks_total, 0);
    assert!(stats.ratio().is_nan());

    Ok(())
}

#[test]
fn missing_input_is_an_input_error() {
    let compressor = Compressor::new(config(1024, EngineKind::Bzip2)).unwrap();
    let result = compressor.compress_file(
        std::path::Path::new("/nonexistent/parbz-test-input"),
        std::path::Path::new("/tmp/parbz-test-output"),
    );
    assert!(matches!(result, Err(ParbzError::InputLoad(_))));
}

#[test]
fn invalid_config_is_rejected_before_any_io() {
    let mut cfg = config(0, EngineKind::Bzip2);
    assert!(matches!(
        Compressor::new(cfg.clone()),
        Err(ParbzError::InvalidConfig(_))
    ));

    cfg.block_size = 1024;
    cfg.workers = 0;
    assert!(matches!(
        Compressor::new(cfg.clone()),
        Err(ParbzError::InvalidConfig(_))
    ));

    cfg.workers = 2;
    cfg.level = 10;
    assert!(matches!(
        Compressor::new(cfg),
        Err(ParbzError::InvalidConfig(_))
    ));
}

/// Fails any block whose first byte carries the marker value.
struct MarkerEngine;

impl CompressionEngine for MarkerEngine {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn compress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        if input.first() == Some(&0xAB) {
            anyhow::bail!("simulated engine failure");
        }
        Ok(input.to_vec())
    }

    fn decompress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

#[test]
fn single_block_failure_fails_the_run_and_writes_nothing(
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    let output = dir.path().join("input.bin.bz2");

    // Four 1000-byte blocks; only block 2 starts with the marker.
    let mut contents = vec![0u8; 4000];
    contents[2000] = 0xAB;
    fs::write(&input, &contents)?;

    let compressor = Compressor::with_engine(
        config(1000, EngineKind::Bzip2),
        Arc::new(MarkerEngine),
    )?;

    match compressor.compress_file(&input, &output) {
        Err(ParbzError::BlocksFailed { failed, total }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 4);
        }
        other => panic!("expected BlocksFailed, got {other:?}"),
    }
    assert!(!output.exists());

    Ok(())
}

#[test]
fn compress_to_writer_matches_file_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("input.bin");
    let output = dir.path().join("input.bin.gz");
    fs::write(&input, patterned(3_000))?;

    let compressor = Compressor::new(config(1024, EngineKind::Gzip))?;
    compressor.compress_file(&input, &output)?;

    let mut buffer = Vec::new();
    let stats = compressor.compress_to_writer(&input, &mut buffer)?;

    assert_eq!(buffer, fs::read(&output)?);
    assert_eq!(stats.output_bytes, buffer.len() as u64);

    Ok(())
}
