/*!
 * Common test utilities for the clipcue test suite
 */

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use clipcue::app_config::{Config, PipelineConfig};
use clipcue::chunk::{Chunk, Segment};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Two chunks with one segment each, the canonical pipeline fixture
pub fn two_chunk_fixture() -> Vec<Chunk> {
    vec![
        Chunk::new(0.0, 2.0, vec![Segment::new(0.0, 2.0, "first words")]),
        Chunk::new(2.0, 5.0, vec![Segment::new(2.0, 4.5, "second words")]),
    ]
}

/// Pipeline config pointing both directories into a temp dir,
/// sequential by default
pub fn pipeline_config_in(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        output_dir: dir.path().join("out"),
        subtitle_dir: dir.path().join("srt"),
        ..Default::default()
    }
}

/// App config with all working directories under a temp dir
pub fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.pipeline = pipeline_config_in(dir);
    config
}

/// Chunk JSON document in the upstream producer's mapping shape
pub fn chunks_json() -> &'static str {
    r#"{
  "chunks": [
    {"start": 0.0, "end": 2.0, "segments": [{"start": 0.0, "end": 2.0, "text": "first words"}]},
    {"start": 2.0, "end": 5.0, "segments": [{"start": 2.0, "end": 4.5, "text": "second words"}]}
  ]
}"#
}
