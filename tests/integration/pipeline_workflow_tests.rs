/*!
 * Pipeline tests against the mock transcoding engine: ordering,
 * pairing, temp track cleanup, fail-fast and cancellation.
 */

use std::path::PathBuf;
use std::sync::Arc;

use clipcue::chunk::{Chunk, Segment};
use clipcue::errors::PipelineError;
use clipcue::pipeline::{
    run_full_pipeline, CancelSignal, OverlayPipeline, SegmentationPipeline,
};
use clipcue::transcoder::{EngineCall, MockTranscoder, VideoSource};

use crate::common::{create_temp_dir, pipeline_config_in, two_chunk_fixture};

fn file_source() -> VideoSource {
    VideoSource::File(PathBuf::from("source.mp4"))
}

/// Any .srt files left in the subtitle directory
fn stray_tracks(dir: &std::path::Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "srt"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_segment_shouldProduceOrderedSlicesWithExactRanges() {
    let dir = create_temp_dir().unwrap();
    let mock = MockTranscoder::working();
    let pipeline = SegmentationPipeline::new(
        Arc::new(mock.clone()),
        pipeline_config_in(&dir),
        "mp4",
    );

    let chunks = vec![Chunk::new(0.0, 2.0, vec![]), Chunk::new(2.0, 5.0, vec![])];
    let paths = pipeline.segment(&chunks, &file_source()).await.unwrap();

    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("slice_1.mp4"));
    assert!(paths[1].ends_with("slice_2.mp4"));

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        EngineCall::Slice {
            start: 0.0,
            end: 2.0,
            output: paths[0].clone()
        }
    );
    assert_eq!(
        calls[1],
        EngineCall::Slice {
            start: 2.0,
            end: 5.0,
            output: paths[1].clone()
        }
    );
}

#[tokio::test]
async fn test_segment_withConcurrency_shouldPreserveChunkOrder() {
    let dir = create_temp_dir().unwrap();
    let mut config = pipeline_config_in(&dir);
    config.concurrency = 3;

    let mock = MockTranscoder::working();
    let pipeline = SegmentationPipeline::new(Arc::new(mock.clone()), config, "mp4");

    let chunks: Vec<Chunk> = (0..6)
        .map(|i| Chunk::new(i as f64, (i + 1) as f64, vec![]))
        .collect();
    let paths = pipeline.segment(&chunks, &file_source()).await.unwrap();

    assert_eq!(paths.len(), 6);
    for (i, path) in paths.iter().enumerate() {
        assert!(path.ends_with(format!("slice_{}.mp4", i + 1)));
    }
    assert_eq!(mock.slice_calls(), 6);
}

#[tokio::test]
async fn test_segment_withEmptyChunkList_shouldFailMissingInput() {
    let dir = create_temp_dir().unwrap();
    let pipeline = SegmentationPipeline::new(
        Arc::new(MockTranscoder::working()),
        pipeline_config_in(&dir),
        "mp4",
    );

    let result = pipeline.segment(&[], &file_source()).await;
    assert!(matches!(result, Err(PipelineError::MissingInput(_))));
}

#[tokio::test]
async fn test_segment_withFailureOnSecondChunk_shouldAbortAndKeepEarlierArtifacts() {
    let dir = create_temp_dir().unwrap();
    let mock = MockTranscoder::fail_on_slice(2);
    let pipeline = SegmentationPipeline::new(
        Arc::new(mock.clone()),
        pipeline_config_in(&dir),
        "mp4",
    );

    let chunks = vec![
        Chunk::new(0.0, 2.0, vec![]),
        Chunk::new(2.0, 5.0, vec![]),
        Chunk::new(5.0, 7.0, vec![]),
    ];
    let result = pipeline.segment(&chunks, &file_source()).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));
    // No rollback: the first slice stays on disk
    assert!(dir.path().join("out").join("slice_1.mp4").exists());
    // Strictly sequential, so the third chunk was never attempted
    assert_eq!(mock.slice_calls(), 2);
}

#[tokio::test]
async fn test_segment_whenPreCancelled_shouldNotTouchTheEngine() {
    let dir = create_temp_dir().unwrap();
    let mock = MockTranscoder::working();
    let cancel = CancelSignal::new();
    cancel.cancel();

    let pipeline = SegmentationPipeline::new(
        Arc::new(mock.clone()),
        pipeline_config_in(&dir),
        "mp4",
    )
    .with_cancel(cancel);

    let result = pipeline.segment(&two_chunk_fixture(), &file_source()).await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(mock.slice_calls(), 0);
}

#[tokio::test]
async fn test_overlay_shouldBurnEachChunkOntoItsSlice() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let slice_paths = vec![
        config.output_dir.join("slice_1.mp4"),
        config.output_dir.join("slice_2.mp4"),
    ];
    for path in &slice_paths {
        std::fs::write(path, b"clip").unwrap();
    }

    let mock = MockTranscoder::working();
    let pipeline = OverlayPipeline::new(Arc::new(mock.clone()), config.clone());

    let artifacts = pipeline
        .overlay(&two_chunk_fixture(), &slice_paths)
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 2);
    assert!(artifacts[0].ends_with("slice_1_subtitled.mp4"));
    assert!(artifacts[1].ends_with("slice_2_subtitled.mp4"));

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    match &calls[1] {
        EngineCall::Burn {
            input,
            subtitle_present,
            output,
            ..
        } => {
            assert_eq!(input, &slice_paths[1]);
            assert!(subtitle_present);
            assert_eq!(output, &artifacts[1]);
        }
        other => panic!("unexpected call {:?}", other),
    }

    // No temp tracks left behind on success
    assert!(stray_tracks(&config.subtitle_dir).is_empty());
}

#[tokio::test]
async fn test_overlay_withAbsoluteTimebase_shouldRebaseCuesToClip() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let slice_path = config.output_dir.join("slice_1.mp4");
    std::fs::write(&slice_path, b"clip").unwrap();

    // Chunk starts at 10s; the burned cue must count from clip zero
    let chunks = vec![Chunk::new(
        10.0,
        20.0,
        vec![Segment::new(12.0, 14.0, "rebased")],
    )];

    let mock = MockTranscoder::working();
    let pipeline = OverlayPipeline::new(Arc::new(mock.clone()), config);
    pipeline.overlay(&chunks, &[slice_path]).await.unwrap();

    match &mock.calls()[0] {
        EngineCall::Burn { subtitle_text, .. } => {
            assert_eq!(
                subtitle_text,
                "1\n00:00:02,000 --> 00:00:04,000\nrebased\n\n"
            );
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_overlay_whenBurnFails_shouldStillRemoveTempTrack() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let slice_path = config.output_dir.join("slice_1.mp4");
    std::fs::write(&slice_path, b"clip").unwrap();

    let mock = MockTranscoder::failing_burn();
    let pipeline = OverlayPipeline::new(Arc::new(mock.clone()), config.clone());

    let chunks = vec![Chunk::new(0.0, 2.0, vec![Segment::new(0.0, 1.0, "hi")])];
    let result = pipeline.overlay(&chunks, &[slice_path]).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));

    // The engine saw the track while it ran, but it is gone now
    match &mock.calls()[0] {
        EngineCall::Burn {
            subtitle_path,
            subtitle_present,
            ..
        } => {
            assert!(subtitle_present);
            assert!(!subtitle_path.exists());
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert!(stray_tracks(&config.subtitle_dir).is_empty());
}

#[tokio::test]
async fn test_overlay_withMismatchedSliceCount_shouldFailPairing() {
    let dir = create_temp_dir().unwrap();
    let pipeline = OverlayPipeline::new(
        Arc::new(MockTranscoder::working()),
        pipeline_config_in(&dir),
    );

    let result = pipeline
        .overlay(&two_chunk_fixture(), &[PathBuf::from("slice_1.mp4")])
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::PairingMismatch {
            chunks: 2,
            slices: 1
        })
    ));
}

#[tokio::test]
async fn test_endToEnd_shouldPairSlicesAndBurnsByChunkIndex() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    let mock = MockTranscoder::working();
    let chunks = two_chunk_fixture();

    let segmentation =
        SegmentationPipeline::new(Arc::new(mock.clone()), config.clone(), "mp4");
    let slice_paths = segmentation.segment(&chunks, &file_source()).await.unwrap();
    assert_eq!(slice_paths.len(), 2);

    let overlay = OverlayPipeline::new(Arc::new(mock.clone()), config);
    let artifacts = overlay.overlay(&chunks, &slice_paths).await.unwrap();

    assert_eq!(artifacts.len(), 2);
    assert!(artifacts[0].ends_with("slice_1_subtitled.mp4"));
    assert!(artifacts[1].ends_with("slice_2_subtitled.mp4"));
    assert_eq!(mock.slice_calls(), 2);
    assert_eq!(mock.burn_calls(), 2);

    // Burn i consumed slice i
    let burns: Vec<_> = mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EngineCall::Burn { input, .. } => Some(input),
            _ => None,
        })
        .collect();
    assert_eq!(burns, slice_paths);
}

#[tokio::test]
async fn test_runFullPipeline_shouldChainBothStages() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    let mock = MockTranscoder::working();

    let artifacts = run_full_pipeline(
        Arc::new(mock.clone()),
        &config,
        "mp4",
        &two_chunk_fixture(),
        &file_source(),
        CancelSignal::new(),
    )
    .await
    .unwrap();

    assert_eq!(artifacts.len(), 2);
    assert_eq!(mock.slice_calls(), 2);
    assert_eq!(mock.burn_calls(), 2);
}

#[tokio::test]
async fn test_endToEnd_whenSecondSliceFails_shouldNeverReachOverlay() {
    let dir = create_temp_dir().unwrap();
    let config = pipeline_config_in(&dir);
    let mock = MockTranscoder::fail_on_slice(2);
    let chunks = two_chunk_fixture();

    let segmentation =
        SegmentationPipeline::new(Arc::new(mock.clone()), config.clone(), "mp4");
    let result = segmentation.segment(&chunks, &file_source()).await;
    assert!(result.is_err());

    // Fail-fast: overlay never ran for any chunk
    assert_eq!(mock.burn_calls(), 0);
}
