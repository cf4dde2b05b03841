/*!
 * Chunk segmentation and subtitle overlay pipelines.
 *
 * Both pipelines walk the chunk list in order, delegate all media
 * work to a `Transcoder`, and return the produced artifact paths in
 * chunk order. The first engine failure aborts everything that has
 * not started yet; artifacts already written stay on disk.
 */

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use log::{debug, info};
use tokio::sync::watch;
use uuid::Uuid;

use crate::app_config::{PipelineConfig, SegmentTimebase};
use crate::chunk::{validate_chunks, Chunk};
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::subtitle_track::SubtitleTrack;
use crate::transcoder::{Transcoder, VideoSource};

/// Cloneable cancellation handle shared between the CLI and the
/// pipelines. Once cancelled no new chunk work is launched; the
/// in-flight engine future is dropped, which kills its process.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        CancelSignal {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Raise the signal; idempotent
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once the signal has been raised
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cuts the source video into one clip per chunk
pub struct SegmentationPipeline {
    transcoder: Arc<dyn Transcoder>,
    config: PipelineConfig,
    /// Container format, which doubles as the slice file extension
    container: String,
    cancel: CancelSignal,
    progress: Option<ProgressBar>,
}

impl SegmentationPipeline {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        config: PipelineConfig,
        container: impl Into<String>,
    ) -> Self {
        SegmentationPipeline {
            transcoder,
            config,
            container: container.into(),
            cancel: CancelSignal::new(),
            progress: None,
        }
    }

    /// Attach an external cancellation signal
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tick a progress bar once per completed chunk
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Slice `source` into one clip per chunk.
    ///
    /// Returned paths are in chunk order so later stages can pair
    /// slice `i` with chunk `i`. Fails fast on the first engine error.
    pub async fn segment(
        &self,
        chunks: &[Chunk],
        source: &VideoSource,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        validate_chunks(chunks)?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        info!(
            "Slicing {} into {} chunk(s) under {}",
            source.describe(),
            chunks.len(),
            self.config.output_dir.display()
        );

        let jobs = chunks.iter().enumerate().map(|(index, chunk)| {
            let transcoder = Arc::clone(&self.transcoder);
            let cancel = self.cancel.clone();
            let progress = self.progress.clone();
            let source = source.clone();
            let chunk = chunk.clone();
            let output =
                FileManager::slice_output_path(&self.config.output_dir, index + 1, &self.container);

            async move {
                if cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }

                debug!(
                    "Slicing chunk {} [{:.3}s..{:.3}s] -> {}",
                    index + 1,
                    chunk.start,
                    chunk.end,
                    output.display()
                );

                let produced = tokio::select! {
                    result = transcoder.slice(&source, chunk.start, chunk.end, &output) => {
                        result.map_err(PipelineError::from)?
                    }
                    _ = cancel.cancelled() => {
                        // The engine future was dropped above; remove its partial output
                        let _ = tokio::fs::remove_file(&output).await;
                        return Err(PipelineError::Cancelled);
                    }
                };

                if let Some(bar) = &progress {
                    bar.inc(1);
                }
                Ok(produced)
            }
        });

        let concurrency = self.config.concurrency.max(1);
        stream::iter(jobs)
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

/// Burns each chunk's subtitle track onto its sliced clip
pub struct OverlayPipeline {
    transcoder: Arc<dyn Transcoder>,
    config: PipelineConfig,
    cancel: CancelSignal,
    progress: Option<ProgressBar>,
}

impl OverlayPipeline {
    pub fn new(transcoder: Arc<dyn Transcoder>, config: PipelineConfig) -> Self {
        OverlayPipeline {
            transcoder,
            config,
            cancel: CancelSignal::new(),
            progress: None,
        }
    }

    /// Attach an external cancellation signal
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tick a progress bar once per completed chunk
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Burn each chunk's track onto the slice with the same index.
    ///
    /// The temporary subtitle file is removed once the burn call
    /// returns, on success and on failure alike.
    pub async fn overlay(
        &self,
        chunks: &[Chunk],
        slice_paths: &[PathBuf],
    ) -> Result<Vec<PathBuf>, PipelineError> {
        validate_chunks(chunks)?;
        if chunks.len() != slice_paths.len() {
            return Err(PipelineError::PairingMismatch {
                chunks: chunks.len(),
                slices: slice_paths.len(),
            });
        }
        std::fs::create_dir_all(&self.config.subtitle_dir)?;

        // One id per invocation so concurrent runs sharing the
        // subtitle directory cannot collide on temp names
        let run_id = Uuid::new_v4().simple().to_string();

        info!(
            "Burning subtitles onto {} clip(s), tracks under {}",
            chunks.len(),
            self.config.subtitle_dir.display()
        );

        let jobs = chunks.iter().zip(slice_paths).enumerate().map(
            |(index, (chunk, slice_path))| {
                let transcoder = Arc::clone(&self.transcoder);
                let cancel = self.cancel.clone();
                let progress = self.progress.clone();
                let subtitle_dir = self.config.subtitle_dir.clone();
                let timebase = self.config.segment_timebase;
                let run_id = run_id.clone();
                let chunk = chunk.clone();
                let slice_path = slice_path.clone();

                async move {
                    if cancel.is_cancelled() {
                        return Err(PipelineError::Cancelled);
                    }

                    let segments = match timebase {
                        SegmentTimebase::Absolute => chunk.rebased_segments(),
                        SegmentTimebase::ChunkRelative => chunk.segments.clone(),
                    };
                    let track = SubtitleTrack::from_segments(&segments)?;

                    // NamedTempFile deletes the track on drop, so the
                    // error path cannot leave an orphaned .srt behind
                    let mut temp_track = tempfile::Builder::new()
                        .prefix(&format!("track_{}_{}_", run_id, index + 1))
                        .suffix(".srt")
                        .tempfile_in(&subtitle_dir)?;
                    write!(temp_track.as_file_mut(), "{}", track)?;
                    temp_track.as_file_mut().flush()?;

                    let output = FileManager::subtitled_output_path(&slice_path);
                    debug!(
                        "Burning chunk {} ({} cue(s)) onto {} -> {}",
                        index + 1,
                        track.len(),
                        slice_path.display(),
                        output.display()
                    );

                    let produced = tokio::select! {
                        result = transcoder.burn_subtitles(&slice_path, temp_track.path(), &output) => {
                            result.map_err(PipelineError::from)?
                        }
                        _ = cancel.cancelled() => {
                            let _ = tokio::fs::remove_file(&output).await;
                            return Err(PipelineError::Cancelled);
                        }
                    };

                    if let Some(bar) = &progress {
                        bar.inc(1);
                    }
                    Ok(produced)
                }
            },
        );

        let concurrency = self.config.concurrency.max(1);
        stream::iter(jobs)
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

/// Run segmentation then overlay for the same chunk list.
pub async fn run_full_pipeline(
    transcoder: Arc<dyn Transcoder>,
    config: &PipelineConfig,
    container: &str,
    chunks: &[Chunk],
    source: &VideoSource,
    cancel: CancelSignal,
) -> Result<Vec<PathBuf>, PipelineError> {
    let segmentation =
        SegmentationPipeline::new(Arc::clone(&transcoder), config.clone(), container)
            .with_cancel(cancel.clone());
    let slice_paths = segmentation.segment(chunks, source).await?;

    let overlay = OverlayPipeline::new(transcoder, config.clone()).with_cancel(cancel);
    overlay.overlay(chunks, &slice_paths).await
}
