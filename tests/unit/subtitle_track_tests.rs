/*!
 * Unit tests for timestamp formatting and SRT track construction
 */

use clipcue::chunk::Segment;
use clipcue::errors::TimestampError;
use clipcue::subtitle_track::{format_timestamp, parse_timestamp, SubtitleTrack};

#[test]
fn test_formatTimestamp_withZero_shouldProduceAllZeros() {
    assert_eq!(format_timestamp(0.0).unwrap(), "00:00:00,000");
}

#[test]
fn test_formatTimestamp_withHoursMinutesSeconds_shouldFormatEachField() {
    assert_eq!(format_timestamp(3661.5).unwrap(), "01:01:01,500");
}

#[test]
fn test_formatTimestamp_shouldTruncateNotRound() {
    // 1.9999s floors to 999ms, it must not round up to 2s
    assert_eq!(format_timestamp(1.9999).unwrap(), "00:00:01,999");
    assert_eq!(format_timestamp(0.0009).unwrap(), "00:00:00,000");
}

#[test]
fn test_formatTimestamp_withNegative_shouldFail() {
    assert!(matches!(
        format_timestamp(-0.5),
        Err(TimestampError::Negative(_))
    ));
}

#[test]
fn test_formatTimestamp_withNonFinite_shouldFail() {
    assert!(matches!(
        format_timestamp(f64::NAN),
        Err(TimestampError::NotFinite(_))
    ));
    assert!(matches!(
        format_timestamp(f64::INFINITY),
        Err(TimestampError::NotFinite(_))
    ));
}

#[test]
fn test_formatTimestamp_withInputsAtLeastOneMsApart_shouldStayOrdered() {
    let samples = [
        (0.0, 0.001),
        (0.999, 1.0),
        (59.999, 60.0),
        (3599.5, 3600.0),
        (12.345, 12.346),
        (3661.5, 3661.501),
    ];

    for (earlier, later) in samples {
        let first = format_timestamp(earlier).unwrap();
        let second = format_timestamp(later).unwrap();
        assert!(
            first < second,
            "expected {} < {} for inputs {} and {}",
            first,
            second,
            earlier,
            later
        );
    }
}

#[test]
fn test_parseTimestamp_shouldInvertFormat() {
    let formatted = format_timestamp(3661.5).unwrap();
    assert_eq!(parse_timestamp(&formatted).unwrap(), 3_661_500);
}

#[test]
fn test_fromSegments_withSingleSegment_shouldRenderExactBlock() {
    let segments = vec![Segment::new(0.0, 1.0, "hi")];
    let track = SubtitleTrack::from_segments(&segments).unwrap();
    assert_eq!(track.render(), "1\n00:00:00,000 --> 00:00:01,000\nhi\n\n");
}

#[test]
fn test_fromSegments_shouldNumberCuesFromOneInInputOrder() {
    let segments = vec![
        Segment::new(5.0, 6.0, "third in time"),
        Segment::new(0.0, 1.0, "first in time"),
        Segment::new(2.0, 3.0, "second in time"),
    ];

    let track = SubtitleTrack::from_segments(&segments).unwrap();

    let indices: Vec<usize> = track.cues.iter().map(|cue| cue.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    // Input order is trusted, never re-sorted
    assert_eq!(track.cues[0].text, "third in time");
}

#[test]
fn test_fromSegments_shouldBeDeterministic() {
    let segments = vec![
        Segment::new(0.0, 1.25, "one"),
        Segment::new(1.25, 3.0, "two"),
    ];

    let first = SubtitleTrack::from_segments(&segments).unwrap().render();
    let second = SubtitleTrack::from_segments(&segments).unwrap().render();
    assert_eq!(first, second);
}

#[test]
fn test_fromSegments_withInvalidTimestamp_shouldFail() {
    let segments = vec![Segment::new(-1.0, 1.0, "bad start")];
    assert!(SubtitleTrack::from_segments(&segments).is_err());
}

#[test]
fn test_fromSegments_withNoSegments_shouldRenderEmptyDocument() {
    let track = SubtitleTrack::from_segments(&[]).unwrap();
    assert!(track.is_empty());
    assert_eq!(track.render(), "");
}

#[test]
fn test_writeTo_shouldPersistRenderedDocument() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("track.srt");

    let segments = vec![Segment::new(0.0, 1.0, "hi")];
    let track = SubtitleTrack::from_segments(&segments).unwrap();
    track.write_to(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, track.render());
}
