/*!
 * Error types for the clipcue application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced when formatting fractional seconds into subtitle timecodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Input seconds were negative
    #[error("invalid timestamp: negative seconds value {0}")]
    Negative(f64),

    /// Input seconds were NaN or infinite
    #[error("invalid timestamp: non-finite seconds value {0}")]
    NotFinite(f64),
}

/// Errors raised by the external transcoding engine boundary
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The engine binary could not be spawned at all
    #[error("failed to spawn transcoding engine '{engine}': {source}")]
    Spawn {
        /// Engine binary name or path
        engine: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// The engine exited with a non-zero status
    #[error("transcoding engine exited with status {code}: {diagnostic}")]
    EngineFailure {
        /// Exit code reported by the engine process (-1 if killed by a signal)
        code: i32,
        /// Filtered diagnostic output from the engine's stderr
        diagnostic: String,
    },

    /// Writing the input stream to the engine's stdin failed
    #[error("failed to stream input to transcoding engine: {0}")]
    BrokenPipe(std::io::Error),

    /// The engine did not finish within the configured deadline
    #[error("transcoding engine timed out after {timeout_secs}s")]
    Timeout {
        /// Deadline that was exceeded, in seconds
        timeout_secs: u64,
    },

    /// Engine output could not be interpreted (probe results, etc.)
    #[error("failed to parse transcoding engine output: {0}")]
    ParseOutput(String),

    /// Any other I/O error on the engine communication channel
    #[error("I/O error while driving transcoding engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the segmentation and overlay pipelines
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input (source video, chunk list) was absent or empty
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A chunk violated the `end > start >= 0` invariant
    #[error("invalid chunk at index {index}: {reason}")]
    InvalidChunk {
        /// Zero-based position of the offending chunk
        index: usize,
        /// Human-readable violation description
        reason: String,
    },

    /// Chunk and slice sequences could not be paired index-for-index
    #[error("chunk/slice pairing mismatch: {chunks} chunks but {slices} slices")]
    PairingMismatch {
        /// Number of chunks supplied
        chunks: usize,
        /// Number of slice paths supplied
        slices: usize,
    },

    /// The pipeline was cancelled before completing all chunk work
    #[error("pipeline cancelled")]
    Cancelled,

    /// A subtitle timestamp could not be formatted
    #[error("timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    /// The external transcoding engine failed
    #[error("transcode failure: {0}")]
    Transcode(#[from] TranscodeError),

    /// A filesystem operation around the pipeline failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the extension-validated media byte loaders
#[derive(Error, Debug)]
pub enum LoaderError {
    /// No path was supplied
    #[error("no media path supplied, nothing to load")]
    MissingPath,

    /// The file extension is not in the allow-list
    #[error("unsupported {kind} file type: {extension}")]
    UnsupportedType {
        /// Media kind the loader expected ("video" or "audio")
        kind: &'static str,
        /// Extension found on the supplied path
        extension: String,
    },

    /// The file does not exist
    #[error("file not found at {0}")]
    NotFound(PathBuf),

    /// Reading the file failed
    #[error("failed to read media file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the speech-transcription API client
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The configured endpoint is not a valid URL
    #[error("invalid transcription endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Sending the request failed before a response was received
    #[error("transcription request failed: {0}")]
    RequestFailed(String),

    /// The API answered with a non-success status
    #[error("transcription API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error body from the API
        message: String,
    },

    /// The response body could not be parsed
    #[error("failed to parse transcription response: {0}")]
    ParseError(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from timestamp formatting
    #[error("timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    /// Error from the transcoding engine
    #[error("transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Error from pipeline execution
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from a media loader
    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),

    /// Error from the transcription client
    #[error("transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Error from a file operation
    #[error("file error: {0}")]
    File(String),

    /// Any other error
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
