use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::chunk::{self, Chunk};
use crate::file_utils::FileManager;
use crate::media_loader;
use crate::pipeline::{CancelSignal, OverlayPipeline, SegmentationPipeline};
use crate::transcoder::{FfmpegTranscoder, Transcoder, VideoSource};
use crate::transcription_service::{group_into_chunks, TranscriptionService};

// @module: Application controller wiring chunks, pipelines and the engine

/// Main application controller for the slice-and-overlay workflow
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Engine boundary shared by both pipelines
    transcoder: Arc<dyn Transcoder>,
}

impl Controller {
    // @method: Create a controller backed by the real engine
    pub fn with_config(config: Config) -> Result<Self> {
        let transcoder = Arc::new(FfmpegTranscoder::new(config.transcode.clone()));
        Ok(Self::with_transcoder(config, transcoder))
    }

    // @method: Create a controller with an injected engine (tests)
    pub fn with_transcoder(config: Config, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { config, transcoder }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run both stages: slice the source per chunk, then burn each
    /// chunk's subtitles onto its clip. Returns the final artifact
    /// paths in chunk order.
    pub async fn run(
        &self,
        video_path: &Path,
        chunks_path: &Path,
        pipe_input: bool,
        manifest_path: Option<&Path>,
        cancel: CancelSignal,
    ) -> Result<Vec<PathBuf>> {
        let chunks = chunk::load_chunks(chunks_path)?;
        let source = self.resolve_source(video_path, pipe_input)?;

        let multi_progress = MultiProgress::new();
        let total_chunks = chunks.len() as u64;

        let slice_bar = multi_progress.add(Self::chunk_progress_bar(total_chunks, "slicing"));
        let segmentation = SegmentationPipeline::new(
            Arc::clone(&self.transcoder),
            self.config.pipeline.clone(),
            self.config.transcode.container.clone(),
        )
        .with_cancel(cancel.clone())
        .with_progress(slice_bar.clone());

        let slice_paths = segmentation.segment(&chunks, &source).await?;
        slice_bar.finish_and_clear();

        let overlay_bar = multi_progress.add(Self::chunk_progress_bar(total_chunks, "burning"));
        let overlay =
            OverlayPipeline::new(Arc::clone(&self.transcoder), self.config.pipeline.clone())
                .with_cancel(cancel)
                .with_progress(overlay_bar.clone());

        let artifacts = overlay.overlay(&chunks, &slice_paths).await?;
        overlay_bar.finish_and_clear();

        info!(
            "Produced {} subtitled clip(s) under {}",
            artifacts.len(),
            self.config.pipeline.output_dir.display()
        );

        if let Some(manifest) = manifest_path {
            FileManager::write_manifest(&artifacts, manifest)?;
            info!("Wrote artifact manifest to {}", manifest.display());
        }

        Ok(artifacts)
    }

    /// Run only the segmentation stage
    pub async fn run_slice(
        &self,
        video_path: &Path,
        chunks_path: &Path,
        pipe_input: bool,
        manifest_path: Option<&Path>,
        cancel: CancelSignal,
    ) -> Result<Vec<PathBuf>> {
        let chunks = chunk::load_chunks(chunks_path)?;
        let source = self.resolve_source(video_path, pipe_input)?;

        let slice_bar = Self::chunk_progress_bar(chunks.len() as u64, "slicing");
        let segmentation = SegmentationPipeline::new(
            Arc::clone(&self.transcoder),
            self.config.pipeline.clone(),
            self.config.transcode.container.clone(),
        )
        .with_cancel(cancel)
        .with_progress(slice_bar.clone());

        let slice_paths = segmentation.segment(&chunks, &source).await?;
        slice_bar.finish_and_clear();

        info!("Produced {} sliced clip(s)", slice_paths.len());

        if let Some(manifest) = manifest_path {
            FileManager::write_manifest(&slice_paths, manifest)?;
            info!("Wrote artifact manifest to {}", manifest.display());
        }

        Ok(slice_paths)
    }

    /// Transcribe an audio file and group the result into chunks,
    /// writing them as JSON to `output_path` (or stdout when absent).
    pub async fn run_transcribe(
        &self,
        audio_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<Vec<Chunk>> {
        let loaded = media_loader::load_audio(audio_path, false)?;
        let audio = loaded
            .into_bytes()
            .map_err(|message| anyhow!("audio load failed: {}", message))?;

        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let service = TranscriptionService::new(self.config.transcription.clone())?;
        let segments = service.transcribe(audio, &file_name).await?;
        let chunks = group_into_chunks(&segments, self.config.pipeline.max_chunk_duration_secs);

        info!(
            "Grouped {} segment(s) into {} chunk(s)",
            segments.len(),
            chunks.len()
        );

        let document = serde_json::json!({ "chunks": chunks });
        let json =
            serde_json::to_string_pretty(&document).context("Failed to serialize chunk document")?;

        match output_path {
            Some(path) => {
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write chunk file: {}", path.display()))?;
                info!("Wrote chunks to {}", path.display());
            }
            None => println!("{}", json),
        }

        Ok(chunks)
    }

    // @resolves: Source video as a file reference or in-memory bytes
    fn resolve_source(&self, video_path: &Path, pipe_input: bool) -> Result<VideoSource> {
        if pipe_input {
            let loaded = media_loader::load_video(video_path, false)?;
            let bytes = loaded
                .into_bytes()
                .map_err(|message| anyhow!("video load failed: {}", message))?;
            debug!("Piping {} byte(s) of video to the engine", bytes.len());
            return Ok(VideoSource::Bytes(bytes));
        }

        if !FileManager::file_exists(video_path) {
            return Err(anyhow!(
                "Input video does not exist: {}",
                video_path.display()
            ));
        }
        Ok(VideoSource::File(video_path.to_path_buf()))
    }

    fn chunk_progress_bar(total_chunks: u64, stage: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(total_chunks);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message(stage.to_string());
        progress_bar
    }
}
