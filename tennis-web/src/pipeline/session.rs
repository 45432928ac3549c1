//! Analysis session - the per-tick pipeline
//!
//! One tick: detect poses, update metrics, draw surfaces A (annotated
//! video), B (skeleton) and C (reference skeleton), composite and record
//! while recording is on, then refresh court lines. Failures inside a tick
//! are logged and the tick carries on with what it has.

use image::RgbaImage;
use serde::Serialize;

use super::sources::{BrightObjectFinder, LineDetector, PoseSource};
use crate::bridge::LandmarkSet;
use crate::classifier::{reference_for_stroke, JointFeedback, StrokeClassifier, StrokeType};
use crate::compositor::{CompositeSources, FrameCompositor, RecordedClip, Recorder, RecordingMode, RecordingSink};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::physics::{analyze_pose, AngleSet, AngleSmoother, ConfidenceGate, KneeBend, KneeBendClassifier};
use crate::renderer::{
    draw_court_lines, draw_knee_badge, fit_landmarks, render_skeleton, CourtLine, SkeletonBackground,
    SkeletonStyle, Surface,
};

/// Whether ticks do any work
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Running,
    Halted,
}

// ============================================================================
// TRACK
// ============================================================================

/// Metrics last shown for a track
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackReading {
    pub angles: Option<AngleSet>,
    pub knee: Option<KneeBend>,
    pub stroke: StrokeType,
}

/// One video stream with its own pose source and classifier state
pub struct Track {
    source: Box<dyn PoseSource>,
    angles: AngleSmoother,
    knee: KneeBendClassifier,
    stroke: StrokeClassifier,
    /// Pose used for drawing this tick (may be empty)
    landmarks: LandmarkSet,
    frame_size: (u32, u32),
    reading: TrackReading,
}

impl Track {
    pub fn new(source: Box<dyn PoseSource>, config: &PipelineConfig) -> Self {
        Self {
            source,
            angles: config.angle_smoother(),
            knee: config.knee_classifier(),
            stroke: config.stroke_classifier(),
            landmarks: LandmarkSet::empty(),
            frame_size: (0, 0),
            reading: TrackReading::default(),
        }
    }

    /// Detect and update metrics. With no pose, or a pose the source already
    /// handed out, the previous reading stays.
    pub fn analyze(&mut self, frame: &RgbaImage) -> TrackReading {
        self.frame_size = frame.dimensions();
        self.landmarks = match self.source.detect(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                log::warn!("pose detection failed: {}", e);
                LandmarkSet::empty()
            }
        };

        if self.landmarks.is_empty() {
            log::trace!("{}", PipelineError::MissingData);
            return self.reading;
        }
        if !self.source.is_fresh() {
            log::trace!("repeated pose; metrics unchanged");
            return self.reading;
        }

        self.reading = TrackReading {
            angles: analyze_pose(&self.landmarks).map(|a| self.angles.push(a)),
            knee: self.knee.update(&self.landmarks),
            stroke: self.stroke.update(&self.landmarks),
        };
        self.reading
    }

    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    pub fn reading(&self) -> TrackReading {
        self.reading
    }

    pub fn reset(&mut self) {
        self.angles.clear();
        self.knee.reset();
        self.stroke.reset();
        self.landmarks = LandmarkSet::empty();
        self.reading = TrackReading::default();
    }
}

// ============================================================================
// TICK REPORT
// ============================================================================

/// What a tick produced, for the UI
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub state: LoopState,
    pub pose_detected: bool,
    /// Smoothed angles, whole degrees
    pub angles: Option<AngleSet>,
    pub knee_bend: Option<KneeBend>,
    pub stroke: StrokeType,
    pub reference_stroke: Option<StrokeType>,
    /// Angles compared with the pro reference for the current stroke
    pub feedback: Vec<JointFeedback>,
    pub ball: Option<(f32, f32)>,
    pub recorded: bool,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct AnalysisSession {
    config: PipelineConfig,
    gate: ConfidenceGate,
    primary: Track,
    reference: Option<Track>,
    style: SkeletonStyle,
    background: SkeletonBackground,
    annotated: Surface,
    skeleton: Surface,
    reference_overlay: Surface,
    compositor: FrameCompositor,
    recorder: Recorder,
    line_detector: Option<Box<dyn LineDetector>>,
    ball_finder: Option<Box<dyn BrightObjectFinder>>,
    court_lines: Vec<CourtLine>,
    last_line_check: Option<f64>,
    state: LoopState,
}

impl AnalysisSession {
    pub fn new(config: PipelineConfig, primary: Box<dyn PoseSource>) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            gate: config.gate(),
            primary: Track::new(primary, &config),
            reference: None,
            style: config.skeleton_style,
            background: config.background,
            annotated: Surface::new(0, 0),
            skeleton: Surface::new(0, 0),
            reference_overlay: Surface::new(0, 0),
            compositor: FrameCompositor::default().with_divider_width(config.divider_width),
            recorder: Recorder::new(),
            line_detector: None,
            ball_finder: None,
            court_lines: Vec::new(),
            last_line_check: None,
            state: LoopState::Halted,
            config,
        })
    }

    pub fn with_line_detector(mut self, detector: Box<dyn LineDetector>) -> Self {
        self.set_line_detector(detector);
        self
    }

    pub fn with_ball_finder(mut self, finder: Box<dyn BrightObjectFinder>) -> Self {
        self.set_ball_finder(finder);
        self
    }

    /// Swap the court detector; the next tick detects immediately
    pub fn set_line_detector(&mut self, detector: Box<dyn LineDetector>) {
        self.line_detector = Some(detector);
        self.last_line_check = None;
    }

    pub fn set_ball_finder(&mut self, finder: Box<dyn BrightObjectFinder>) {
        self.ball_finder = Some(finder);
    }

    /// Load a reference performer with its own pose source and classifiers
    pub fn attach_reference(&mut self, source: Box<dyn PoseSource>) {
        self.reference = Some(Track::new(source, &self.config));
        self.reference_overlay = Surface::new(0, 0);
    }

    pub fn detach_reference(&mut self) {
        self.reference = None;
        self.reference_overlay = Surface::new(0, 0);
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn set_style(&mut self, style: SkeletonStyle) {
        self.style = style;
    }

    pub fn set_background(&mut self, background: SkeletonBackground) {
        self.background = background;
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Resume ticking (playback started)
    pub fn start(&mut self) {
        self.state = LoopState::Running;
    }

    /// Pause ticking without touching a recording
    pub fn pause(&mut self) {
        self.state = LoopState::Halted;
    }

    /// Record composited frames into `sink`; starts the loop
    pub fn start_recording(&mut self, mode: RecordingMode, sink: Box<dyn RecordingSink>) {
        self.recorder.start(mode, sink);
        self.state = LoopState::Running;
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    /// Halt the loop and release the sink. Frames after this are never
    /// appended.
    pub fn stop_recording(&mut self) -> PipelineResult<Option<RecordedClip>> {
        self.state = LoopState::Halted;
        self.recorder.stop()
    }

    /// Halt, drop any recording and clear all per-session state
    pub fn reset(&mut self) {
        self.state = LoopState::Halted;
        if self.recorder.is_active() {
            if let Err(e) = self.recorder.stop() {
                log::warn!("recording dropped on reset: {}", e);
            }
        }
        self.primary.reset();
        if let Some(reference) = self.reference.as_mut() {
            reference.reset();
        }
        self.court_lines.clear();
        self.last_line_check = None;
        self.annotated.clear();
        self.skeleton.clear();
        self.reference_overlay.clear();
    }

    /// Run one frame. When halted nothing is processed and the last
    /// readings are reported.
    pub fn tick(&mut self, primary_frame: &RgbaImage, reference_frame: Option<&RgbaImage>, now_ms: f64) -> TickReport {
        if self.state == LoopState::Halted {
            return self.report(false, None, false);
        }

        let reading = self.primary.analyze(primary_frame);
        if let (Some(reference), Some(frame)) = (self.reference.as_mut(), reference_frame) {
            reference.analyze(frame);
        }
        let pose_detected = !self.primary.landmarks().is_empty();
        // Badge only for a fresh pose
        let knee = if pose_detected { reading.knee } else { None };

        self.draw_annotated(primary_frame, knee);
        self.draw_skeleton(knee);
        self.draw_reference_overlay();

        let recorded = self.record_frame(reference_frame);
        self.refresh_court_lines(primary_frame, now_ms);

        let ball = self.ball_finder.as_mut().and_then(|finder| match finder.find_bright_object(primary_frame) {
            Ok(ball) => ball,
            Err(e) => {
                log::warn!("ball search failed: {}", e);
                None
            }
        });

        self.report(pose_detected, ball, recorded)
    }

    fn report(&self, pose_detected: bool, ball: Option<(f32, f32)>, recorded: bool) -> TickReport {
        let reading = self.primary.reading();
        let feedback = match (reference_for_stroke(reading.stroke), reading.angles) {
            (Some(pro), Some(angles)) => pro.evaluate(&angles),
            _ => Vec::new(),
        };
        TickReport {
            state: self.state,
            pose_detected,
            angles: reading.angles.map(|a| a.rounded()),
            knee_bend: reading.knee,
            stroke: reading.stroke,
            reference_stroke: self.reference.as_ref().map(|r| r.reading().stroke),
            feedback,
            ball,
            recorded,
        }
    }

    /// Surface A: video frame, neon skeleton, knee badge
    fn draw_annotated(&mut self, frame: &RgbaImage, knee: Option<KneeBend>) {
        let (w, h) = frame.dimensions();
        self.annotated.resize(w, h);
        self.annotated.clear();
        self.annotated.draw_image(frame, 0, 0, w, h);

        render_skeleton(&mut self.annotated, self.primary.landmarks(), SkeletonStyle::Neon, 1.0, &self.gate);
        if let Some(knee) = knee {
            draw_knee_badge(&mut self.annotated, knee.status);
        }
    }

    /// Surface B: background, court lines, faded reference, player, badge
    fn draw_skeleton(&mut self, knee: Option<KneeBend>) {
        let dest = self.annotated.dimensions();
        self.skeleton.resize(dest.0, dest.1);
        self.background.paint(&mut self.skeleton);

        if !self.court_lines.is_empty() {
            draw_court_lines(&mut self.skeleton, &self.court_lines);
        }

        if let Some(reference) = self.reference.as_ref() {
            let fitted = fit_landmarks(reference.landmarks(), reference.frame_size(), dest);
            render_skeleton(&mut self.skeleton, &fitted, self.style, self.config.reference_opacity, &self.gate);
        }

        render_skeleton(&mut self.skeleton, self.primary.landmarks(), self.style, 1.0, &self.gate);
        if let Some(knee) = knee {
            draw_knee_badge(&mut self.skeleton, knee.status);
        }
    }

    /// Surface C: the reference performer's own skeleton at its video size
    fn draw_reference_overlay(&mut self) {
        let Some(reference) = self.reference.as_ref() else {
            return;
        };
        let (w, h) = reference.frame_size();
        self.reference_overlay.resize(w, h);
        self.reference_overlay.clear();
        render_skeleton(&mut self.reference_overlay, reference.landmarks(), self.style, 1.0, &self.gate);
    }

    /// Composite and append while recording. Returns whether a frame was added.
    fn record_frame(&mut self, reference_frame: Option<&RgbaImage>) -> bool {
        let Some(mode) = self.recorder.mode() else {
            return false;
        };
        self.compositor.set_layout(mode.layout(self.reference.is_some()));

        let primary = match mode {
            RecordingMode::Skeleton => &self.skeleton,
            RecordingMode::Overlay | RecordingMode::Combined => &self.annotated,
        };
        let sources = CompositeSources {
            primary,
            skeleton: &self.skeleton,
            reference_video: reference_frame.filter(|_| self.reference.is_some()),
        };
        let output = self.compositor.compose(&sources);

        match self.recorder.push(output.as_image()) {
            Ok(()) => !output.is_empty(),
            Err(e) => {
                log::warn!("frame not recorded: {}", e);
                false
            }
        }
    }

    /// Re-run court detection at most once per configured interval. Empty
    /// results and failures keep the previous lines.
    fn refresh_court_lines(&mut self, frame: &RgbaImage, now_ms: f64) {
        let Some(detector) = self.line_detector.as_mut() else {
            return;
        };
        let due = self
            .last_line_check
            .map_or(true, |last| now_ms - last > self.config.court_line_interval_ms);
        if !due {
            return;
        }
        match detector.detect_lines(frame) {
            Ok(lines) => {
                if !lines.is_empty() {
                    log::debug!("court lines updated: {}", lines.len());
                    self.court_lines = lines;
                }
                self.last_line_check = Some(now_ms);
            }
            Err(e) => log::warn!("court detection failed: {}", e),
        }
    }

    pub fn annotated_surface(&self) -> &Surface {
        &self.annotated
    }

    pub fn skeleton_surface(&self) -> &Surface {
        &self.skeleton
    }

    pub fn reference_surface(&self) -> &Surface {
        &self.reference_overlay
    }

    /// Last composited frame
    pub fn output(&self) -> &Surface {
        self.compositor.output()
    }

    pub fn court_lines(&self) -> &[CourtLine] {
        &self.court_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::landmarks::tests::standing_pose;
    use crate::bridge::RIGHT_WRIST;
    use crate::compositor::recording::tests::CountingSink;
    use crate::pipeline::LandmarkMailbox;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ScriptedLines {
        calls: Rc<RefCell<u32>>,
        fail: bool,
    }

    impl LineDetector for ScriptedLines {
        fn detect_lines(&mut self, _frame: &RgbaImage) -> PipelineResult<Vec<CourtLine>> {
            *self.calls.borrow_mut() += 1;
            if self.fail {
                return Err(PipelineError::unavailable("opencv not loaded"));
            }
            Ok(vec![CourtLine { x1: 0.0, y1: 0.5, x2: 1.0, y2: 0.5 }])
        }
    }

    fn session_with_mailbox() -> (AnalysisSession, Rc<RefCell<LandmarkMailbox>>) {
        let mailbox = Rc::new(RefCell::new(LandmarkMailbox::consuming()));
        let session = AnalysisSession::new(PipelineConfig::default(), Box::new(mailbox.clone())).unwrap();
        (session, mailbox)
    }

    fn frame() -> RgbaImage {
        RgbaImage::from_pixel(64, 48, image::Rgba([10, 120, 10, 255]))
    }

    #[test]
    fn test_halted_session_does_nothing() {
        let (mut session, mailbox) = session_with_mailbox();
        mailbox.borrow_mut().deliver(standing_pose());
        let report = session.tick(&frame(), None, 0.0);
        assert_eq!(report.state, LoopState::Halted);
        assert!(!report.pose_detected);
        assert_eq!(session.annotated_surface().dimensions(), (0, 0));
    }

    #[test]
    fn test_tick_draws_and_measures() {
        let (mut session, mailbox) = session_with_mailbox();
        session.start();
        mailbox.borrow_mut().deliver(standing_pose());
        let report = session.tick(&frame(), None, 0.0);

        assert!(report.pose_detected);
        assert_eq!(report.stroke, StrokeType::Ready);
        let knee = report.knee_bend.unwrap();
        assert!(knee.angle > 179.0);
        assert_eq!(report.angles.unwrap().left_knee, 180.0);
        assert_eq!(session.annotated_surface().dimensions(), (64, 48));
        assert_eq!(session.skeleton_surface().dimensions(), (64, 48));
        assert!(!report.recorded);
    }

    #[test]
    fn test_missing_pose_keeps_last_reading() {
        let (mut session, mailbox) = session_with_mailbox();
        session.start();
        mailbox.borrow_mut().deliver(standing_pose());
        let first = session.tick(&frame(), None, 0.0);
        let second = session.tick(&frame(), None, 33.0);
        assert!(!second.pose_detected);
        assert_eq!(second.knee_bend, first.knee_bend);
        // Nothing drawn over the video without a pose
        assert_eq!(session.annotated_surface().pixel(32, 5), Some([10, 120, 10, 255]));
    }

    #[test]
    fn test_recording_until_stop() {
        let (mut session, mailbox) = session_with_mailbox();
        let frames = Rc::new(RefCell::new(Vec::new()));
        session.start_recording(RecordingMode::Combined, Box::new(CountingSink { frames: frames.clone() }));

        mailbox.borrow_mut().deliver(standing_pose());
        assert!(session.tick(&frame(), None, 0.0).recorded);
        assert!(session.tick(&frame(), None, 33.0).recorded);
        assert_eq!(session.output().dimensions(), (128, 48));

        assert!(session.stop_recording().unwrap().is_none());
        assert_eq!(session.state(), LoopState::Halted);
        session.start();
        assert!(!session.tick(&frame(), None, 66.0).recorded);
        assert_eq!(frames.borrow().as_slice(), &[(128, 48), (128, 48)]);
    }

    #[test]
    fn test_reference_switches_to_quad() {
        let (mut session, mailbox) = session_with_mailbox();
        let reference = Rc::new(RefCell::new(LandmarkMailbox::latching()));
        session.attach_reference(Box::new(reference.clone()));
        let frames = Rc::new(RefCell::new(Vec::new()));
        session.start_recording(RecordingMode::Combined, Box::new(CountingSink { frames: frames.clone() }));

        mailbox.borrow_mut().deliver(standing_pose());
        reference.borrow_mut().deliver(standing_pose());
        let pro_frame = RgbaImage::new(32, 48);
        let report = session.tick(&frame(), Some(&pro_frame), 0.0);

        assert_eq!(report.reference_stroke, Some(StrokeType::Ready));
        assert_eq!(session.output().dimensions(), (128, 96));
        assert_eq!(session.reference_surface().dimensions(), (32, 48));
        // Reference lags: next tick has no new delivery but still draws
        session.tick(&frame(), Some(&pro_frame), 33.0);
        assert!(session.reference_surface().as_raw().iter().any(|b| *b != 0));
    }

    fn pose_with_wrist(x: f32) -> LandmarkSet {
        let mut points = standing_pose().points().to_vec();
        points[RIGHT_WRIST].x = x;
        LandmarkSet::from_points(points).unwrap()
    }

    #[test]
    fn test_latched_repeats_leave_reference_reading() {
        let reference = Rc::new(RefCell::new(LandmarkMailbox::latching()));
        let mut track = Track::new(Box::new(reference.clone()), &PipelineConfig::default());
        let pro_frame = RgbaImage::new(32, 48);

        // Pro video at half the display rate: a new pose every other tick,
        // wrist sweeping right to left and then holding still
        let sweep = (0..12).map(|i| 0.8 - 0.02 * i as f32);
        let hold = std::iter::repeat(0.8 - 0.02 * 11.0).take(6);
        for x in sweep.chain(hold) {
            reference.borrow_mut().deliver(pose_with_wrist(x));
            let fresh = track.analyze(&pro_frame);
            let stale = track.analyze(&pro_frame);
            assert_eq!(stale, fresh);
            assert!(!track.landmarks().is_empty());
        }
        assert_eq!(track.reading().stroke, StrokeType::Forehand);
    }

    #[test]
    fn test_court_lines_throttled() {
        let calls = Rc::new(RefCell::new(0));
        let (session, _mailbox) = session_with_mailbox();
        let mut session = session.with_line_detector(Box::new(ScriptedLines { calls: calls.clone(), fail: false }));
        session.start();
        session.tick(&frame(), None, 0.0);
        session.tick(&frame(), None, 500.0);
        session.tick(&frame(), None, 1000.0);
        assert_eq!(*calls.borrow(), 1);
        session.tick(&frame(), None, 1000.5);
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(session.court_lines().len(), 1);
    }

    #[test]
    fn test_court_detection_failure_is_retried() {
        let calls = Rc::new(RefCell::new(0));
        let (session, _mailbox) = session_with_mailbox();
        let mut session = session.with_line_detector(Box::new(ScriptedLines { calls: calls.clone(), fail: true }));
        session.start();
        session.tick(&frame(), None, 0.0);
        session.tick(&frame(), None, 10.0);
        assert_eq!(*calls.borrow(), 2);
        assert!(session.court_lines().is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let (mut session, mailbox) = session_with_mailbox();
        let frames = Rc::new(RefCell::new(Vec::new()));
        session.start_recording(RecordingMode::Overlay, Box::new(CountingSink { frames }));
        mailbox.borrow_mut().deliver(standing_pose());
        session.tick(&frame(), None, 0.0);

        session.reset();
        assert_eq!(session.state(), LoopState::Halted);
        assert!(!session.is_recording());
        session.start();
        let report = session.tick(&frame(), None, 33.0);
        assert!(report.knee_bend.is_none());
        assert!(report.angles.is_none());
    }
}
