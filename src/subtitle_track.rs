use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use anyhow::{Result, Context};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::chunk::Segment;
use crate::errors::TimestampError;

// @module: SRT track construction and timestamp formatting

// @const: Single SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

/// Convert fractional seconds to whole milliseconds, truncating
/// sub-millisecond precision. Rejects values no subtitle timeline
/// can represent.
pub fn seconds_to_ms(seconds: f64) -> Result<u64, TimestampError> {
    if seconds.is_nan() || seconds.is_infinite() {
        return Err(TimestampError::NotFinite(seconds));
    }
    if seconds < 0.0 {
        return Err(TimestampError::Negative(seconds));
    }
    Ok((seconds * 1000.0).floor() as u64)
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format fractional seconds as an SRT timestamp.
///
/// Truncates toward zero at millisecond precision, so equal inputs
/// always render identically and inputs at least 1ms apart keep
/// their ordering.
pub fn format_timestamp(seconds: f64) -> Result<String, TimestampError> {
    Ok(format_ms(seconds_to_ms(seconds)?))
}

/// Parse an SRT timestamp back to milliseconds - used by tests
#[allow(dead_code)]
pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
    let captures = TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(|| anyhow::anyhow!("Invalid timestamp format: {}", timestamp))?;

    let hours: u64 = captures[1].parse().context("Failed to parse hours")?;
    let minutes: u64 = captures[2].parse().context("Failed to parse minutes")?;
    let seconds: u64 = captures[3].parse().context("Failed to parse seconds")?;
    let millis: u64 = captures[4].parse().context("Failed to parse milliseconds")?;

    if minutes >= 60 || seconds >= 60 {
        return Err(anyhow::anyhow!(
            "Invalid time components in timestamp: {}",
            timestamp
        ));
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: 1-based position in the track
    pub index: usize,

    // @field: Cue start in ms
    pub start_ms: u64,

    // @field: Cue end in ms
    pub end_ms: u64,

    // @field: Cue text, one or more lines
    pub text: String,
}

impl Cue {
    /// Creates a cue directly from millisecond times - used by tests
    #[allow(dead_code)]
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: String) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            text,
        }
    }

    // @creates: Cue from a transcription segment
    // @validates: Timestamps only; text is trusted as transcribed
    pub fn from_segment(index: usize, segment: &Segment) -> Result<Self, TimestampError> {
        Ok(Cue {
            index,
            start_ms: seconds_to_ms(segment.start)?,
            end_ms: seconds_to_ms(segment.end)?,
            text: segment.text.clone(),
        })
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_ms(self.start_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_ms(self.end_ms)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// An ordered SRT document built from one chunk's segments
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    /// Cues in input order, numbered from 1
    pub cues: Vec<Cue>,
}

impl SubtitleTrack {
    /// Build a track from segments, preserving their order.
    ///
    /// Cues are numbered 1..=N by position. Segments are not
    /// re-sorted; callers own the ordering they hand in, so the
    /// same input always produces byte-identical output.
    pub fn from_segments(segments: &[Segment]) -> Result<Self, TimestampError> {
        let mut cues = Vec::with_capacity(segments.len());
        for (position, segment) in segments.iter().enumerate() {
            cues.push(Cue::from_segment(position + 1, segment)?);
        }
        Ok(SubtitleTrack { cues })
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Render the full SRT document as a string
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the track to an SRT file, creating parent directories
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for cue in &self.cues {
            write!(file, "{}", cue)
                .with_context(|| format!("Failed to write cue {}", cue.index))?;
        }

        Ok(())
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for cue in &self.cues {
            write!(f, "{}", cue)?;
        }
        Ok(())
    }
}
