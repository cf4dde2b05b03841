/*!
 * ffmpeg/ffprobe adapter.
 *
 * Shells out to the configured engine binaries. Invocations are
 * bounded by a configurable timeout and can optionally be retried
 * once with a short jittered backoff.
 */

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use rand::Rng;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::app_config::TranscodeConfig;
use crate::errors::TranscodeError;
use crate::transcoder::{Transcoder, VideoSource};

/// Concrete `Transcoder` backed by the ffmpeg command line tools
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: TranscodeConfig,
}

/// ffprobe `-show_format` JSON envelope
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        FfmpegTranscoder { config }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Run one engine invocation to completion, streaming `stdin`
    /// to the child when present and capturing stdout/stderr.
    async fn run_engine(
        &self,
        binary: &str,
        args: &[String],
        stdin: Option<&Bytes>,
    ) -> Result<std::process::Output, TranscodeError> {
        debug!("Engine invocation: {} {}", binary, args.join(" "));

        let mut command = Command::new(binary);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A dropped future must not leave an engine process behind
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| TranscodeError::Spawn {
            engine: binary.to_string(),
            source,
        })?;

        // Feed stdin from a separate task; writing inline could
        // deadlock against the engine filling its stderr pipe
        let writer = match stdin {
            Some(bytes) => {
                let mut child_stdin = child.stdin.take().ok_or_else(|| {
                    TranscodeError::BrokenPipe(std::io::Error::other("engine stdin not captured"))
                })?;
                let bytes = bytes.clone();
                Some(tokio::spawn(async move {
                    child_stdin.write_all(&bytes).await?;
                    // Shutdown closes the pipe so the engine sees EOF
                    child_stdin.shutdown().await
                }))
            }
            None => None,
        };

        let deadline = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let diagnostic = filter_diagnostic(&String::from_utf8_lossy(&output.stderr));
            return Err(TranscodeError::EngineFailure { code, diagnostic });
        }

        // The engine reported success, so a writer failure means the
        // channel broke mid-stream
        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return Err(TranscodeError::BrokenPipe(error)),
                Err(join_error) => {
                    return Err(TranscodeError::BrokenPipe(std::io::Error::other(join_error)));
                }
            }
        }

        Ok(output)
    }

    /// Run an invocation, retrying once on engine failure or timeout
    /// when configured to do so.
    async fn run_engine_with_retry(
        &self,
        binary: &str,
        args: &[String],
        stdin: Option<&Bytes>,
    ) -> Result<std::process::Output, TranscodeError> {
        match self.run_engine(binary, args, stdin).await {
            Ok(output) => Ok(output),
            Err(first_error) => {
                let retryable = matches!(
                    first_error,
                    TranscodeError::EngineFailure { .. } | TranscodeError::Timeout { .. }
                );
                if !(self.config.retry_once && retryable) {
                    return Err(first_error);
                }

                let jitter_ms = rand::rng().random_range(100..500);
                warn!(
                    "Engine invocation failed ({}), retrying once in {}ms",
                    first_error, jitter_ms
                );
                tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                self.run_engine(binary, args, stdin).await
            }
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn slice(
        &self,
        source: &VideoSource,
        start: f64,
        end: f64,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError> {
        let mut args: Vec<String> = vec!["-y".to_string(), "-i".to_string()];

        let stdin = match source {
            VideoSource::File(path) => {
                args.push(path.display().to_string());
                None
            }
            VideoSource::Bytes(bytes) => {
                args.push("-".to_string());
                Some(bytes)
            }
        };

        args.extend([
            "-ss".to_string(),
            start.to_string(),
            "-to".to_string(),
            end.to_string(),
            "-f".to_string(),
            self.config.container.clone(),
            output.display().to_string(),
        ]);

        self.run_engine_with_retry(&self.config.ffmpeg_path, &args, stdin)
            .await?;
        Ok(output.to_path_buf())
    }

    async fn burn_subtitles(
        &self,
        input: &Path,
        subtitle_path: &Path,
        output: &Path,
    ) -> Result<PathBuf, TranscodeError> {
        let filter = format!(
            "{}={}",
            self.config.subtitle_filter,
            escape_filter_path(subtitle_path)
        );

        let args: Vec<String> = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-vf".to_string(),
            filter,
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            output.display().to_string(),
        ];

        self.run_engine_with_retry(&self.config.ffmpeg_path, &args, None)
            .await?;
        Ok(output.to_path_buf())
    }

    async fn probe_duration(&self, source: &VideoSource) -> Result<f64, TranscodeError> {
        let mut args: Vec<String> = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
        ];

        let stdin = match source {
            VideoSource::File(path) => {
                args.push(path.display().to_string());
                None
            }
            VideoSource::Bytes(bytes) => {
                args.push("-".to_string());
                Some(bytes)
            }
        };

        let output = self
            .run_engine_with_retry(&self.config.ffprobe_path, &args, stdin)
            .await?;

        let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscodeError::ParseOutput(format!("probe JSON: {}", e)))?;

        parsed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| {
                TranscodeError::ParseOutput("probe output carried no parsable duration".to_string())
            })
    }
}

/// Escape a path for use inside the engine's filter grammar, where
/// backslashes, colons, quotes and commas are metacharacters.
fn escape_filter_path(path: &Path) -> String {
    let mut escaped = String::new();
    for character in path.display().to_string().chars() {
        match character {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("\\'"),
            ',' => escaped.push_str("\\,"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Keep the tail of the engine's stderr that actually describes the
/// failure, dropping the version banner and build configuration noise.
fn filter_diagnostic(stderr: &str) -> String {
    const MAX_LINES: usize = 12;

    let relevant: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.is_empty()
                || trimmed.starts_with("ffmpeg version")
                || trimmed.starts_with("ffprobe version")
                || trimmed.starts_with("built with")
                || trimmed.starts_with("configuration:")
                || trimmed.starts_with("lib"))
        })
        .collect();

    let start = relevant.len().saturating_sub(MAX_LINES);
    relevant[start..].join("\n")
}
