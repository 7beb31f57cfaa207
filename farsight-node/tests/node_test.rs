//! End-to-end tests of the vision node over an in-process bus

use farsight_core::{Error, Mode, ModeChange, TargetSet};
use farsight_eye::{process_templates, EngineConfig, Frame, ProfileParams, TargetEngine};
use farsight_node::config::BusConfig;
use farsight_node::control;
use farsight_node::display::Display;
use farsight_node::lease::{CameraLease, Lease, LaunchStream, StillCamera};
use farsight_node::{
    LoopbackBus, MessageBus, Orchestrator, Pacer, Reporter, StateHandle, StreamSettings, VisionNode,
};
use image::Rgb;
use imageproc::drawing::draw_filled_circle_mut;
use mockall::mock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    pub Camera {}

    impl Lease for Camera {
        fn name(&self) -> &'static str;
        fn start(&mut self) -> Result<(), Error>;
        fn stop(&mut self) -> Result<(), Error>;
        fn is_started(&self) -> bool;
    }

    impl CameraLease for Camera {
        fn read(&mut self) -> Result<Frame, Error>;
    }
}

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Templates for both kinds plus a recorded frame with one red ball
fn fixtures() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (file, color) in [("red_ball-template.png", RED), ("blue_ball-template.png", BLUE)] {
        let mut template = Frame::new(64, 64);
        draw_filled_circle_mut(&mut template, (32, 32), 20, color);
        template.save(dir.path().join(file)).unwrap();
    }
    let mut frame = Frame::new(320, 240);
    draw_filled_circle_mut(&mut frame, (200, 100), 20, RED);
    frame.save(dir.path().join("frame.png")).unwrap();
    dir
}

struct Harness {
    node: VisionNode,
    bus: Arc<LoopbackBus>,
    topics: BusConfig,
    _dir: TempDir,
}

impl Harness {
    fn new(camera: impl FnOnce(&TempDir) -> Box<dyn CameraLease>) -> Self {
        let dir = fixtures();
        let topics = BusConfig::default();
        let profiles = process_templates(&ProfileParams::builtin(), dir.path()).unwrap();
        let engine = TargetEngine::new(EngineConfig { threads: 1, ..Default::default() }, profiles).unwrap();

        let bus = Arc::new(LoopbackBus::new());
        let state = StateHandle::new(Mode::Vision, TargetSet::all());
        control::subscribe(bus.as_ref(), &topics.control_topic, state.clone()).unwrap();

        let stream = LaunchStream::new(StreamSettings {
            launcher: "true".to_string(),
            ..Default::default()
        });
        let orchestrator = Orchestrator::new(state, camera(&dir), Box::new(stream));
        let reporter = Reporter::new(Some(bus.clone() as Arc<dyn MessageBus>), &topics);
        let node = VisionNode::new(orchestrator, engine, reporter, Display::new(false), (320, 240), 120);

        Self { node, bus, topics, _dir: dir }
    }

    fn with_still(file: &str) -> Self {
        let file = file.to_string();
        Self::new(move |dir| Box::new(StillCamera::new(Some(dir.path().join(file)))))
    }

    fn data(&self) -> Vec<String> {
        self.bus.published_on(&self.topics.data_topic)
    }

    fn errors(&self) -> Vec<String> {
        self.bus.published_on(&self.topics.error_topic)
    }

    fn control(&self, payload: &str) {
        self.bus.inject(&self.topics.control_topic, payload);
    }
}

#[test]
fn test_detections_are_published() {
    let mut harness = Harness::with_still("frame.png");
    harness.node.run_once();

    let data = harness.data();
    assert_eq!(data.len(), 1);
    let fields: Vec<&str> = data[0].split(' ').collect();
    assert_eq!(fields.len(), 4, "{}", data[0]);
    assert_eq!(fields[0], "1");
    let angle: f64 = fields[2].parse().unwrap();
    assert!(angle > 0.0, "ball is right of center, angle {}", angle);
    assert!(harness.errors().is_empty());
    assert_eq!(harness.node.stats().frames(), 1);
}

#[test]
fn test_target_filter_applies_to_next_frame() {
    let mut harness = Harness::with_still("frame.png");
    harness.control("targets blue_balls");
    harness.node.run_once();

    // The frame is still processed and reported, with no targets in it
    assert_eq!(harness.data(), vec![String::new()]);
}

#[test]
fn test_mode_none_releases_camera() {
    let mut harness = Harness::with_still("frame.png");
    harness.node.run_once();
    assert!(harness.node.orchestrator().camera().is_started());

    harness.control("mode none");
    harness.node.run_once();
    assert!(!harness.node.orchestrator().camera().is_started());
    assert_eq!(harness.node.orchestrator().active(), Mode::Idle);
    assert_eq!(harness.data().len(), 1);
    assert!(harness.errors().is_empty());
}

#[test]
fn test_unavailable_camera_reports_once_and_idles() {
    let mut harness = Harness::with_still("missing.png");
    harness.node.run_once();
    harness.node.run_once();

    let errors = harness.errors();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].starts_with("none;5:"), "{}", errors[0]);
    let change = ModeChange::deserialize(&errors[0]).unwrap();
    assert_eq!(change.mode, Mode::Idle);

    assert_eq!(harness.node.state().mode(), Mode::Idle);
    assert!(harness.data().is_empty());
}

#[test]
fn test_camera_failure_forces_idle() {
    let mut harness = Harness::new(|_| {
        let mut camera = MockCamera::new();
        camera.expect_start().times(1).returning(|| Ok(()));
        camera
            .expect_read()
            .times(1)
            .returning(|| Err(Error::library("camera unplugged")));
        camera.expect_stop().times(1).returning(|| Ok(()));
        Box::new(camera)
    });

    harness.node.run_once();
    assert_eq!(harness.errors(), vec!["none;2:camera unplugged".to_string()]);
    assert_eq!(harness.node.state().mode(), Mode::Idle);

    // The next iteration releases the camera and reads nothing
    harness.node.run_once();
    assert_eq!(harness.node.orchestrator().active(), Mode::Idle);
    assert!(harness.data().is_empty());
}

#[test]
fn test_dropped_frame_only_skips() {
    let mut harness = Harness::new(|_| {
        let mut camera = MockCamera::new();
        camera.expect_start().times(1).returning(|| Ok(()));
        camera
            .expect_read()
            .times(2)
            .returning(|| Err(Error::resource_unavailable("frame not ready")));
        Box::new(camera)
    });

    harness.node.run_once();
    harness.node.run_once();
    assert!(harness.errors().is_empty());
    assert!(harness.data().is_empty());
    assert_eq!(harness.node.state().mode(), Mode::Vision);
    assert_eq!(harness.node.orchestrator().active(), Mode::Vision);
}

#[test]
fn test_run_stops_on_flag() {
    let mut harness = Harness::with_still("frame.png");
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        flag.store(true, Ordering::Relaxed);
    });

    let mut pacer = Pacer::new(50);
    harness.node.run(&mut pacer, &stop);
    stopper.join().unwrap();

    let frames = harness.node.stats().frames();
    assert!(frames >= 1, "frames {}", frames);
    // 50 fps for about 200 ms
    assert!(frames <= 30, "frames {}", frames);
    assert_eq!(harness.data().len() as u64, frames);
}
