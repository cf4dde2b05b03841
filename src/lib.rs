/*!
 * # clipcue - chunk-based video segmentation and subtitle overlay
 *
 * A Rust library for cutting a source video into per-chunk clips and
 * burning each chunk's transcription onto its clip as subtitles.
 *
 * ## Features
 *
 * - Slice a video into one clip per time-ranged transcription chunk
 * - Render chunk segments into standard SRT subtitle tracks
 * - Burn subtitle tracks into the picture via ffmpeg
 * - Transcribe audio through a Whisper-style REST API and group the
 *   result into chunks
 * - Bounded per-invocation timeouts, optional retry, cancellation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `chunk`: Chunk/segment data model and JSON loading
 * - `subtitle_track`: SRT track construction and timestamp formatting
 * - `transcoder`: Boundary to the external transcoding engine:
 *   - `transcoder::ffmpeg`: ffmpeg/ffprobe adapter
 *   - `transcoder::mock`: recording fake engine for tests
 * - `pipeline`: Segmentation and overlay pipelines, cancellation
 * - `media_loader`: Extension-validated media byte loaders
 * - `transcription_service`: Speech-transcription API client
 * - `file_utils`: File system and artifact path helpers
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod chunk;
pub mod errors;
pub mod file_utils;
pub mod media_loader;
pub mod pipeline;
pub mod subtitle_track;
pub mod transcoder;
pub mod transcription_service;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use chunk::{Chunk, Segment};
pub use errors::{AppError, LoaderError, PipelineError, TimestampError, TranscodeError};
pub use pipeline::{CancelSignal, OverlayPipeline, SegmentationPipeline};
pub use subtitle_track::{format_timestamp, SubtitleTrack};
pub use transcoder::{FfmpegTranscoder, Transcoder, VideoSource};
