use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Pipeline settings (directories, ordering, timebase)
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Transcoding engine settings
    #[serde(default)]
    pub transcode: TranscodeConfig,

    /// Speech-transcription API settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Timebase of segment timestamps relative to their chunk
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentTimebase {
    /// Segment times are absolute on the source-video timeline and are
    /// rebased to the clip before cue construction
    #[default]
    Absolute,
    /// Segment times are already relative to the enclosing chunk's start
    ChunkRelative,
}

impl std::fmt::Display for SegmentTimebase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::ChunkRelative => write!(f, "chunk-relative"),
        }
    }
}

/// Settings shared by the segmentation and overlay pipelines
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Directory where sliced and subtitled clips are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory where temporary subtitle tracks are persisted
    #[serde(default = "default_subtitle_dir")]
    pub subtitle_dir: PathBuf,

    /// Maximum number of chunks transcoded at the same time.
    /// Artifact order is always chunk order regardless of this value.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// How segment timestamps relate to their chunk
    #[serde(default)]
    pub segment_timebase: SegmentTimebase,

    /// Maximum chunk length in seconds when grouping transcribed segments
    #[serde(default = "default_max_chunk_duration_secs")]
    pub max_chunk_duration_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            subtitle_dir: default_subtitle_dir(),
            concurrency: default_concurrency(),
            segment_timebase: SegmentTimebase::default(),
            max_chunk_duration_secs: default_max_chunk_duration_secs(),
        }
    }
}

/// Settings for the external transcoding engine adapter
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscodeConfig {
    /// Path or name of the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Path or name of the ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Output container format (and slice file extension)
    #[serde(default = "default_container")]
    pub container: String,

    /// Video codec used when burning subtitles
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder preset used when burning subtitles
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant rate factor used when burning subtitles
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Name of the engine filter that renders subtitles into the picture
    #[serde(default = "default_subtitle_filter")]
    pub subtitle_filter: String,

    /// Upper bound on a single engine invocation, in seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry a failed engine invocation once before giving up
    #[serde(default)]
    pub retry_once: bool,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            container: default_container(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            subtitle_filter: default_subtitle_filter(),
            timeout_secs: default_engine_timeout_secs(),
            retry_once: false,
        }
    }
}

/// Settings for the speech-transcription API client
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Service endpoint URL
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,

    /// Model identifier passed to the service
    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// API key; the CLIPCUE_API_KEY environment variable takes precedence
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Optional ISO 639-1 language hint for the recognizer
    #[serde(default)]
    pub language: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            model: default_transcription_model(),
            api_key: String::new(),
            language: None,
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    /// Get the API key, preferring the environment over the config file
    pub fn resolve_api_key(&self) -> String {
        std::env::var("CLIPCUE_API_KEY").unwrap_or_else(|_| self.api_key.clone())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_output_dir() -> PathBuf {
    // Platform videos folder where available, otherwise a local directory
    dirs::video_dir()
        .map(|dir| dir.join("clipcue"))
        .unwrap_or_else(|| PathBuf::from("clipcue"))
}

fn default_subtitle_dir() -> PathBuf {
    default_output_dir().join("srt")
}

fn default_concurrency() -> usize {
    1
}

fn default_max_chunk_duration_secs() -> f64 {
    30.0
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_subtitle_filter() -> String {
    "subtitles".to_string()
}

fn default_engine_timeout_secs() -> u64 {
    300
}

fn default_transcription_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            return Err(anyhow!("pipeline.concurrency must be at least 1"));
        }

        if !(self.pipeline.max_chunk_duration_secs.is_finite()
            && self.pipeline.max_chunk_duration_secs > 0.0)
        {
            return Err(anyhow!(
                "pipeline.max_chunk_duration_secs must be a positive number, got {}",
                self.pipeline.max_chunk_duration_secs
            ));
        }

        if self.transcode.ffmpeg_path.trim().is_empty() {
            return Err(anyhow!("transcode.ffmpeg_path must not be empty"));
        }

        if self.transcode.timeout_secs == 0 {
            return Err(anyhow!("transcode.timeout_secs must be at least 1 second"));
        }

        if self.transcode.crf > 51 {
            return Err(anyhow!(
                "transcode.crf must be in 0..=51, got {}",
                self.transcode.crf
            ));
        }

        // A language hint, when present, must be a valid ISO 639-1 code
        if let Some(language) = &self.transcription.language {
            let normalized = language.trim().to_lowercase();
            if isolang::Language::from_639_1(&normalized).is_none() {
                return Err(anyhow!(
                    "transcription.language must be an ISO 639-1 code, got '{}'",
                    language
                ));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            pipeline: PipelineConfig::default(),
            transcode: TranscodeConfig::default(),
            transcription: TranscriptionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
