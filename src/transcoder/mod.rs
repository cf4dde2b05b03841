/*!
 * External transcoding engine boundary.
 *
 * Everything that touches the engine process lives behind the
 * `Transcoder` trait so the pipelines stay pure sequencing logic and
 * tests can substitute a fake engine:
 * - `ffmpeg`: concrete adapter shelling out to ffmpeg/ffprobe
 * - `mock`: recording fake engine for tests
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::TranscodeError;

pub mod ffmpeg;
pub mod mock;

pub use ffmpeg::FfmpegTranscoder;
pub use mock::{EngineCall, MockBehavior, MockTranscoder};

/// Source video handed to the engine: either a file on disk or raw
/// container bytes piped to the engine's stdin.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Path to an existing video file
    File(PathBuf),
    /// Whole-container bytes, written to the engine's stdin
    Bytes(Bytes),
}

impl VideoSource {
    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            VideoSource::File(path) => path.display().to_string(),
            VideoSource::Bytes(bytes) => format!("<{} bytes on stdin>", bytes.len()),
        }
    }
}

impl From<PathBuf> for VideoSource {
    fn from(path: PathBuf) -> Self {
        VideoSource::File(path)
    }
}

impl From<Bytes> for VideoSource {
    fn from(bytes: Bytes) -> Self {
        VideoSource::Bytes(bytes)
    }
}

/// Boundary to the external transcoding engine.
///
/// All three operations block (asynchronously) until the engine
/// process exits. A non-zero exit status, a spawn failure, or a broken
/// I/O channel surfaces as a `TranscodeError` carrying the engine's
/// diagnostic output.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Extract `[start, end]` (seconds) of `source` into a new
    /// container file at `output`.
    async fn slice(
        &self,
        source: &VideoSource,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError>;

    /// Re-encode `input` with the subtitle track at `subtitle_path`
    /// rendered into the picture, writing `output`.
    async fn burn_subtitles(
        &self,
        input: &Path,
        subtitle_path: &Path,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError>;

    /// Total duration of `source` in seconds.
    async fn probe_duration(&self, source: &VideoSource) -> Result<f64, TranscodeError>;
}
