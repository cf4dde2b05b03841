/*!
 * Speech-transcription API client.
 *
 * Posts audio bytes as multipart form data with bearer-token auth to
 * a configurable STT endpoint and parses the response into timed
 * segments. A pure helper then groups flat segments into chunks by a
 * maximum chunk duration, bridging the recognizer's output to the
 * pipelines' input contract.
 */

use std::time::Duration;

use bytes::Bytes;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::app_config::TranscriptionConfig;
use crate::chunk::{Chunk, Segment};
use crate::errors::TranscriptionError;

/// Client for a Whisper-style transcription endpoint
pub struct TranscriptionService {
    client: Client,
    config: TranscriptionConfig,
    endpoint: Url,
}

/// Verbose transcription response with per-segment timing
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    start: f64,
    end: f64,
    text: String,
}

impl TranscriptionService {
    /// Build a client from configuration, validating the endpoint URL
    pub fn new(config: TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|_| TranscriptionError::InvalidEndpoint(config.endpoint.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        Ok(TranscriptionService {
            client,
            config,
            endpoint,
        })
    }

    /// Transcribe audio bytes into timed segments.
    ///
    /// `file_name` is only a hint for the recognizer's container
    /// detection; the bytes are what gets transcribed.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        file_name: &str,
    ) -> Result<Vec<Segment>, TranscriptionError> {
        let audio_part = Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");

        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        debug!(
            "Posting {} byte(s) of audio to {} (model {})",
            audio.len(),
            self.endpoint,
            self.config.model
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.config.resolve_api_key())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;
        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;

        if parsed.segments.is_empty() {
            return Err(TranscriptionError::ParseError(
                "response carried no timed segments".to_string(),
            ));
        }

        let segments = parsed
            .segments
            .into_iter()
            .map(|segment| Segment::new(segment.start, segment.end, segment.text.trim()))
            .collect::<Vec<_>>();

        info!("Transcription produced {} segment(s)", segments.len());
        Ok(segments)
    }
}

/// Group flat transcription segments into chunks no longer than
/// `max_duration` seconds.
///
/// Segments stay in input order and are never split; a chunk always
/// holds at least one segment, so a single over-long segment becomes
/// its own over-long chunk. Chunk boundaries snap to segment
/// boundaries: each chunk spans from its first segment's start to its
/// last segment's end.
pub fn group_into_chunks(segments: &[Segment], max_duration: f64) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_start = 0.0;

    for segment in segments {
        if current.is_empty() {
            current_start = segment.start;
            current.push(segment.clone());
            continue;
        }

        if segment.end - current_start <= max_duration {
            current.push(segment.clone());
        } else {
            let end = current.last().map(|s| s.end).unwrap_or(current_start);
            chunks.push(Chunk::new(current_start, end, std::mem::take(&mut current)));
            current_start = segment.start;
            current.push(segment.clone());
        }
    }

    if let Some(last) = current.last() {
        let end = last.end;
        chunks.push(Chunk::new(current_start, end, current));
    }

    chunks
}
