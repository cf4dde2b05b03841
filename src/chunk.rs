/*!
 * Transcription chunk model and JSON loading.
 *
 * A chunk is a time window of the source video together with the
 * transcribed segments that fall inside it. Chunks drive both
 * pipelines: the segmentation pipeline cuts one clip per chunk and
 * the overlay pipeline burns one subtitle track per chunk.
 */

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// One transcribed utterance with timestamps in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the utterance in seconds
    pub start: f64,
    /// End of the utterance in seconds
    pub end: f64,
    /// Transcribed text, written to the subtitle track verbatim
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Segment {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A time-ranged slice of the source video and its segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk start in seconds, relative to the source video
    pub start: f64,
    /// Chunk end in seconds, relative to the source video
    pub end: f64,
    /// Segments covered by this chunk, in transcription order
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Chunk {
    pub fn new(start: f64, end: f64, segments: Vec<Segment>) -> Self {
        Chunk {
            start,
            end,
            segments,
        }
    }

    /// Chunk length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the chunk's time range and the ranges of its segments.
    ///
    /// `index` is the zero-based position of the chunk in its input
    /// sequence and is only used to build the error.
    pub fn validate(&self, index: usize) -> Result<(), PipelineError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(PipelineError::InvalidChunk {
                index,
                reason: format!("non-finite time range {}..{}", self.start, self.end),
            });
        }
        if self.start < 0.0 {
            return Err(PipelineError::InvalidChunk {
                index,
                reason: format!("negative start time {}", self.start),
            });
        }
        if self.end <= self.start {
            return Err(PipelineError::InvalidChunk {
                index,
                reason: format!("end {} is not after start {}", self.end, self.start),
            });
        }
        for (position, segment) in self.segments.iter().enumerate() {
            if !segment.start.is_finite() || !segment.end.is_finite() {
                return Err(PipelineError::InvalidChunk {
                    index,
                    reason: format!(
                        "segment {} has a non-finite time range {}..{}",
                        position, segment.start, segment.end
                    ),
                });
            }
            if segment.end <= segment.start {
                return Err(PipelineError::InvalidChunk {
                    index,
                    reason: format!(
                        "segment {} ends at {} before it starts at {}",
                        position, segment.end, segment.start
                    ),
                });
            }
        }
        Ok(())
    }

    /// Copies of the segments rebased to clip-relative time.
    ///
    /// Segments carry source-video timestamps by default; the burned
    /// track must count from the start of the sliced clip instead.
    /// Starts before the chunk boundary clamp to zero.
    pub fn rebased_segments(&self) -> Vec<Segment> {
        self.segments
            .iter()
            .map(|segment| Segment {
                start: (segment.start - self.start).max(0.0),
                end: (segment.end - self.start).max(0.0),
                text: segment.text.clone(),
            })
            .collect()
    }
}

/// Accepted JSON shapes: `{"chunks": [...]}` as produced by the
/// transcription step, or a bare array of chunks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChunkDocument {
    Wrapped { chunks: Vec<Chunk> },
    Bare(Vec<Chunk>),
}

/// Parse a chunk list from a JSON string
pub fn parse_chunks(json: &str) -> Result<Vec<Chunk>> {
    let document: ChunkDocument =
        serde_json::from_str(json).context("Failed to parse chunk JSON")?;
    let chunks = match document {
        ChunkDocument::Wrapped { chunks } => chunks,
        ChunkDocument::Bare(chunks) => chunks,
    };
    Ok(chunks)
}

/// Read and parse a chunk list from a JSON file
pub fn load_chunks<P: AsRef<Path>>(path: P) -> Result<Vec<Chunk>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chunk file: {}", path.display()))?;
    parse_chunks(&json)
        .with_context(|| format!("Invalid chunk file: {}", path.display()))
}

/// Validate a full chunk sequence before any engine work starts.
///
/// An empty sequence is rejected so the pipelines never report
/// success without producing artifacts.
pub fn validate_chunks(chunks: &[Chunk]) -> Result<(), PipelineError> {
    if chunks.is_empty() {
        return Err(PipelineError::MissingInput(
            "chunk list is empty, nothing to process".to_string(),
        ));
    }
    for (index, chunk) in chunks.iter().enumerate() {
        chunk.validate(index)?;
    }
    Ok(())
}
