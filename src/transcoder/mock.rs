/*!
 * Mock transcoding engine for testing.
 *
 * Records every call it receives so tests can assert on ordering and
 * pairing, and simulates different engine behaviors:
 * - `MockTranscoder::working()` - every invocation succeeds
 * - `MockTranscoder::failing_slice()` / `failing_burn()` - one operation fails
 * - `MockTranscoder::fail_on_slice(n)` - the nth slice call fails
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::TranscodeError;
use crate::transcoder::{Transcoder, VideoSource};

/// One recorded engine invocation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Slice {
        /// Requested range start in seconds
        start: f64,
        /// Requested range end in seconds
        end: f64,
        /// Output path the pipeline asked for
        output: PathBuf,
    },
    Burn {
        /// Clip the subtitles were burned onto
        input: PathBuf,
        /// Subtitle track path handed to the engine
        subtitle_path: PathBuf,
        /// Whether the subtitle file existed when the engine ran
        subtitle_present: bool,
        /// Track contents read when the engine ran, empty if unreadable
        subtitle_text: String,
        /// Output path the pipeline asked for
        output: PathBuf,
    },
    Probe,
}

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Every invocation succeeds and writes a placeholder artifact
    Working,
    /// Every slice call fails
    FailingSlice,
    /// Every burn call fails
    FailingBurn,
    /// The nth slice call (1-based) fails, earlier ones succeed
    FailOnSlice { call: usize },
    /// Every invocation fails
    Failing,
}

/// Recording fake engine; clones share the same call log.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<EngineCall>>>,
    probed_duration: f64,
}

impl MockTranscoder {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
            probed_duration: 60.0,
        }
    }

    /// Create a mock engine where everything succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock engine whose slice calls always fail
    pub fn failing_slice() -> Self {
        Self::new(MockBehavior::FailingSlice)
    }

    /// Create a mock engine whose burn calls always fail
    pub fn failing_burn() -> Self {
        Self::new(MockBehavior::FailingBurn)
    }

    /// Create a mock engine failing on the nth slice call (1-based)
    pub fn fail_on_slice(call: usize) -> Self {
        Self::new(MockBehavior::FailOnSlice { call })
    }

    /// Set the duration reported by `probe_duration`
    pub fn with_probed_duration(mut self, seconds: f64) -> Self {
        self.probed_duration = seconds;
        self
    }

    /// Snapshot of every call recorded so far, in invocation order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Number of slice calls recorded
    pub fn slice_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, EngineCall::Slice { .. }))
            .count()
    }

    /// Number of burn calls recorded
    pub fn burn_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, EngineCall::Burn { .. }))
            .count()
    }

    fn engine_failure(operation: &str) -> TranscodeError {
        TranscodeError::EngineFailure {
            code: 1,
            diagnostic: format!("simulated {} failure", operation),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn slice(
        &self,
        _source: &VideoSource,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError> {
        let slice_number = {
            let mut calls = self.calls.lock();
            calls.push(EngineCall::Slice {
                start,
                end,
                output: output.to_path_buf(),
            });
            calls
                .iter()
                .filter(|call| matches!(call, EngineCall::Slice { .. }))
                .count()
        };

        match self.behavior {
            MockBehavior::Failing | MockBehavior::FailingSlice => {
                Err(Self::engine_failure("slice"))
            }
            MockBehavior::FailOnSlice { call } if slice_number == call => {
                Err(Self::engine_failure("slice"))
            }
            _ => {
                std::fs::write(output, b"mock clip")?;
                Ok(output.to_path_buf())
            }
        }
    }

    async fn burn_subtitles(
        &self,
        input: &Path,
        subtitle_path: &Path,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError> {
        self.calls.lock().push(EngineCall::Burn {
            input: input.to_path_buf(),
            subtitle_path: subtitle_path.to_path_buf(),
            subtitle_present: subtitle_path.exists(),
            subtitle_text: std::fs::read_to_string(subtitle_path).unwrap_or_default(),
            output: output.to_path_buf(),
        });

        match self.behavior {
            MockBehavior::Failing | MockBehavior::FailingBurn => {
                Err(Self::engine_failure("burn"))
            }
            _ => {
                std::fs::write(output, b"mock subtitled clip")?;
                Ok(output.to_path_buf())
            }
        }
    }

    async fn probe_duration(&self, _source: &VideoSource) -> Result<f64, TranscodeError> {
        self.calls.lock().push(EngineCall::Probe);

        match self.behavior {
            MockBehavior::Failing => Err(Self::engine_failure("probe")),
            _ => Ok(self.probed_duration),
        }
    }
}
