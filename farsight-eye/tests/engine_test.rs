//! Tests for TargetEngine

use farsight_core::{ErrorKind, TargetKind, TargetSet};
use farsight_eye::color;
use farsight_eye::contour;
use farsight_eye::{process_templates, EngineConfig, FrameGeometry, ProfileParams, TargetEngine};
use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use tempfile::TempDir;

type Frame = farsight_eye::Frame;

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const RADIUS: i32 = 20;

/// Template directory holding a red and a blue ball of the same size
fn template_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (file, color) in [("red_ball-template.png", RED), ("blue_ball-template.png", BLUE)] {
        let mut template = Frame::new(64, 64);
        draw_filled_circle_mut(&mut template, (32, 32), RADIUS, color);
        template.save(dir.path().join(file)).unwrap();
    }
    dir
}

fn engine(threads: usize) -> (TargetEngine, TempDir) {
    let dir = template_dir();
    let profiles = process_templates(&ProfileParams::builtin(), dir.path()).unwrap();
    let config = EngineConfig { threads, ..Default::default() };
    (TargetEngine::new(config, profiles).unwrap(), dir)
}

fn frame_with_balls() -> Frame {
    let mut frame = Frame::new(320, 240);
    draw_filled_circle_mut(&mut frame, (160, 120), RADIUS, RED);
    draw_filled_circle_mut(&mut frame, (60, 60), RADIUS, BLUE);
    frame
}

#[test]
fn test_single_matching_region_is_detected() {
    let (engine, _dir) = engine(4);
    let mut frame = Frame::new(320, 240);
    draw_filled_circle_mut(&mut frame, (160, 120), RADIUS, RED);

    let detections = engine.process(&frame, TargetSet::all());
    assert_eq!(detections.len(), 1);
    let detection = detections[0];
    assert_eq!(detection.kind, TargetKind::RedBall);
    assert!(detection.score >= 1.5, "score {}", detection.score);
    assert!(detection.angle.abs() < 1.0, "angle {}", detection.angle);
    assert!(detection.distance > 0.0);
}

#[test]
fn test_blank_frame_has_no_detections() {
    let (engine, _dir) = engine(4);
    let frame = Frame::new(320, 240);
    assert!(engine.process(&frame, TargetSet::all()).is_empty());
}

#[test]
fn test_empty_request_has_no_detections() {
    let (engine, _dir) = engine(1);
    assert!(engine.process(&frame_with_balls(), TargetSet::none()).is_empty());
}

#[test]
fn test_request_filters_kinds() {
    let (engine, _dir) = engine(4);
    let frame = frame_with_balls();

    for kind in TargetKind::ALL {
        let detections = engine.process(&frame, TargetSet::only(kind));
        assert_eq!(detections.len(), 1);
        assert!(detections.iter().all(|d| d.kind == kind));
    }
}

#[test]
fn test_all_is_union_of_single_requests() {
    let (engine, _dir) = engine(4);
    let frame = frame_with_balls();

    let mut separately = Vec::new();
    for kind in TargetKind::ALL {
        separately.extend(engine.process(&frame, TargetSet::only(kind)));
    }
    assert_eq!(engine.process(&frame, TargetSet::all()), separately);
}

#[test]
fn test_thread_count_does_not_change_results() {
    let (pooled, _a) = engine(4);
    let (single, _b) = engine(1);
    let frame = frame_with_balls();
    assert_eq!(
        pooled.process(&frame, TargetSet::all()),
        single.process(&frame, TargetSet::all())
    );
}

#[test]
fn test_wrong_shape_is_rejected() {
    let (engine, _dir) = engine(4);
    let mut frame = Frame::new(320, 240);
    draw_filled_rect_mut(&mut frame, Rect::at(100, 100).of_size(120, 10), RED);
    assert!(engine.process(&frame, TargetSet::all()).is_empty());
}

#[test]
fn test_detection_geometry() {
    let (engine, _dir) = engine(4);
    let mut frame = Frame::new(320, 240);
    draw_filled_circle_mut(&mut frame, (240, 120), RADIUS, RED);

    let red = ProfileParams::red_ball();
    let mask = contour::open(&color::threshold(&frame, &red.thresholds, None));
    let regions = contour::find_regions(&mask);
    assert_eq!(regions.len(), 1);
    let (distance, angle) =
        FrameGeometry::new(320, 240, 47.0).locate(&regions[0].bounding_box, red.target_height);

    let detections = engine.process(&frame, TargetSet::only(TargetKind::RedBall));
    assert_eq!(detections.len(), 1);
    assert!((detections[0].distance - distance).abs() < 1e-12);
    assert!((detections[0].angle - angle).abs() < 1e-12);
    // Right of center
    assert!(detections[0].angle > 20.0);
}

#[test]
fn test_overlay_matches_process() {
    let (engine, _dir) = engine(4);
    let frame = frame_with_balls();

    let (detections, overlay) = engine.process_with_overlay(&frame, TargetSet::all());
    assert_eq!(detections, engine.process(&frame, TargetSet::all()));
    assert_eq!(overlay.dimensions(), frame.dimensions());
    assert_ne!(overlay, frame);
}

#[test]
fn test_missing_template_fails_startup() {
    let dir = TempDir::new().unwrap();
    let err = process_templates(&ProfileParams::builtin(), dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert!(err.message().contains("red_ball-template.png"));
}

#[test]
fn test_one_missing_template_fails_all() {
    let dir = template_dir();
    std::fs::remove_file(dir.path().join("blue_ball-template.png")).unwrap();
    let err = process_templates(&ProfileParams::builtin(), dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert!(err.message().contains("blue_ball-template.png"));
}
