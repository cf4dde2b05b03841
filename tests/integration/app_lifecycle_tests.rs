/*!
 * Controller lifecycle tests: chunk file in, artifact list and
 * manifest out, against the mock engine.
 */

use std::sync::Arc;

use clipcue::app_controller::Controller;
use clipcue::pipeline::CancelSignal;
use clipcue::transcoder::MockTranscoder;

use crate::common::{chunks_json, config_in, create_temp_dir, create_test_file};

#[tokio::test]
async fn test_run_shouldProduceSubtitledArtifactsAndManifest() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();

    let video_path = create_test_file(&base, "source.mp4", "fake video").unwrap();
    let chunks_path = create_test_file(&base, "chunks.json", chunks_json()).unwrap();
    let manifest_path = base.join("manifest.json");

    let mock = MockTranscoder::working();
    let controller = Controller::with_transcoder(config_in(&dir), Arc::new(mock.clone()));

    let artifacts = controller
        .run(
            &video_path,
            &chunks_path,
            false,
            Some(&manifest_path),
            CancelSignal::new(),
        )
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 2);
    assert!(artifacts[0].ends_with("slice_1_subtitled.mp4"));
    assert!(artifacts[1].ends_with("slice_2_subtitled.mp4"));
    assert_eq!(mock.slice_calls(), 2);
    assert_eq!(mock.burn_calls(), 2);

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["artifacts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_withPipedInput_shouldLoadVideoBytes() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();

    let video_path = create_test_file(&base, "source.mp4", "fake video").unwrap();
    let chunks_path = create_test_file(&base, "chunks.json", chunks_json()).unwrap();

    let controller =
        Controller::with_transcoder(config_in(&dir), Arc::new(MockTranscoder::working()));

    let artifacts = controller
        .run(&video_path, &chunks_path, true, None, CancelSignal::new())
        .await
        .unwrap();
    assert_eq!(artifacts.len(), 2);
}

#[tokio::test]
async fn test_run_withMissingVideo_shouldFailBeforeEngineWork() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();
    let chunks_path = create_test_file(&base, "chunks.json", chunks_json()).unwrap();

    let mock = MockTranscoder::working();
    let controller = Controller::with_transcoder(config_in(&dir), Arc::new(mock.clone()));

    let result = controller
        .run(
            &base.join("ghost.mp4"),
            &chunks_path,
            false,
            None,
            CancelSignal::new(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(mock.slice_calls(), 0);
}

#[tokio::test]
async fn test_run_withInvalidChunkRange_shouldNameTheChunk() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();

    let video_path = create_test_file(&base, "source.mp4", "fake video").unwrap();
    let bad_chunks = r#"{"chunks": [
        {"start": 0.0, "end": 2.0, "segments": []},
        {"start": 5.0, "end": 3.0, "segments": []}
    ]}"#;
    let chunks_path = create_test_file(&base, "chunks.json", bad_chunks).unwrap();

    let controller =
        Controller::with_transcoder(config_in(&dir), Arc::new(MockTranscoder::working()));

    let error = controller
        .run(&video_path, &chunks_path, false, None, CancelSignal::new())
        .await
        .unwrap_err();

    assert!(error.to_string().contains("index 1"));
}

#[tokio::test]
async fn test_runSlice_shouldStopAfterSegmentation() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();

    let video_path = create_test_file(&base, "source.mp4", "fake video").unwrap();
    let chunks_path = create_test_file(&base, "chunks.json", chunks_json()).unwrap();

    let mock = MockTranscoder::working();
    let controller = Controller::with_transcoder(config_in(&dir), Arc::new(mock.clone()));

    let slices = controller
        .run_slice(&video_path, &chunks_path, false, None, CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(slices.len(), 2);
    assert!(slices[0].ends_with("slice_1.mp4"));
    assert_eq!(mock.slice_calls(), 2);
    assert_eq!(mock.burn_calls(), 0);
}

#[tokio::test]
async fn test_run_whenCancelled_shouldReturnCancelledError() {
    let dir = create_temp_dir().unwrap();
    let base = dir.path().to_path_buf();

    let video_path = create_test_file(&base, "source.mp4", "fake video").unwrap();
    let chunks_path = create_test_file(&base, "chunks.json", chunks_json()).unwrap();

    let mock = MockTranscoder::working();
    let controller = Controller::with_transcoder(config_in(&dir), Arc::new(mock.clone()));

    let cancel = CancelSignal::new();
    cancel.cancel();

    let result = controller
        .run(&video_path, &chunks_path, false, None, cancel)
        .await;

    assert!(result.is_err());
    assert_eq!(mock.slice_calls(), 0);
    assert_eq!(mock.burn_calls(), 0);
}
