//! Stroke detection from the right-wrist trajectory
//!
//! A two-state swing machine (idle / active swing) runs on the displacement
//! across the wrist trail. A swing is classified when it ends, using the
//! horizontal direction at peak speed: the cross-body motion happens near
//! peak racket speed. An upward flick in the top half of the frame is a
//! serve and preempts the groundstroke logic for that frame.

use super::model::{StrokeThresholds, StrokeType};
use crate::bridge::{LandmarkSet, RIGHT_WRIST};
use crate::physics::{WristTrail, TRAIL_FRAMES};

/// Swing tracking state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SwingPhase {
    Idle,
    ActiveSwing {
        peak_velocity: f32,
        /// Signed horizontal displacement when the peak was seen
        direction_at_peak: f32,
        /// Frames seen after the one that started the swing
        frame_count: u32,
    },
}

/// Per-session stroke classifier
#[derive(Clone, Debug)]
pub struct StrokeClassifier {
    trail: WristTrail,
    phase: SwingPhase,
    last_stroke: StrokeType,
    thresholds: StrokeThresholds,
    /// Return to READY after this many quiet frames; `None` keeps labels sticky
    idle_decay_frames: Option<u32>,
    idle_frames: u32,
}

impl StrokeClassifier {
    pub fn new() -> Self {
        Self::with_thresholds(StrokeThresholds::default())
    }

    pub fn with_thresholds(thresholds: StrokeThresholds) -> Self {
        Self {
            trail: WristTrail::with_capacity(TRAIL_FRAMES),
            phase: SwingPhase::Idle,
            last_stroke: StrokeType::Ready,
            thresholds,
            idle_decay_frames: None,
            idle_frames: 0,
        }
    }

    pub fn with_trail_frames(mut self, frames: usize) -> Self {
        self.trail = WristTrail::with_capacity(frames);
        self
    }

    pub fn with_idle_decay(mut self, frames: Option<u32>) -> Self {
        self.idle_decay_frames = frames;
        self
    }

    /// Process one frame of landmarks; an empty pose leaves all state alone
    pub fn update(&mut self, landmarks: &LandmarkSet) -> StrokeType {
        match landmarks.get(RIGHT_WRIST) {
            Some(wrist) => self.push_wrist(wrist.xy()),
            None => self.last_stroke,
        }
    }

    /// Process one right-wrist position
    pub fn push_wrist(&mut self, pos: (f32, f32)) -> StrokeType {
        self.trail.push(pos);

        let Some(displacement) = self.trail.displacement() else {
            return self.last_stroke;
        };
        let (dx, dy) = (displacement.x, displacement.y);
        let velocity = displacement.norm();
        let t = self.thresholds;

        if dy < t.serve_rise && pos.1 < t.serve_max_y {
            self.idle_frames = 0;
            self.last_stroke = StrokeType::Serve;
            return StrokeType::Serve;
        }

        if velocity > t.swing_start_velocity {
            self.idle_frames = 0;
            self.phase = match self.phase {
                SwingPhase::Idle => {
                    log::debug!("swing start v={:.3} dx={:.3}", velocity, dx);
                    SwingPhase::ActiveSwing {
                        peak_velocity: velocity,
                        direction_at_peak: dx,
                        frame_count: 0,
                    }
                }
                SwingPhase::ActiveSwing { peak_velocity, direction_at_peak, frame_count } => {
                    let (peak_velocity, direction_at_peak) = if velocity > peak_velocity {
                        (velocity, dx)
                    } else {
                        (peak_velocity, direction_at_peak)
                    };
                    SwingPhase::ActiveSwing {
                        peak_velocity,
                        direction_at_peak,
                        frame_count: frame_count + 1,
                    }
                }
            };
        } else if let SwingPhase::ActiveSwing { peak_velocity, direction_at_peak, frame_count } =
            self.phase
        {
            self.phase = SwingPhase::Idle;
            if peak_velocity > t.min_peak_velocity && frame_count > t.min_swing_frames {
                self.last_stroke = if direction_at_peak < 0.0 {
                    StrokeType::Forehand
                } else {
                    StrokeType::Backhand
                };
                log::debug!(
                    "swing end: {} (peak {:.3}, {} frames)",
                    self.last_stroke.as_str(),
                    peak_velocity,
                    frame_count
                );
            }
            self.idle_frames = 0;
        } else {
            self.tick_idle();
        }

        self.last_stroke
    }

    fn tick_idle(&mut self) {
        self.idle_frames = self.idle_frames.saturating_add(1);
        if let Some(limit) = self.idle_decay_frames {
            if self.idle_frames >= limit {
                self.last_stroke = StrokeType::Ready;
            }
        }
    }

    /// Last emitted label (sticky)
    pub fn last_stroke(&self) -> StrokeType {
        self.last_stroke
    }

    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    pub fn is_swinging(&self) -> bool {
        matches!(self.phase, SwingPhase::ActiveSwing { .. })
    }

    /// Reset classifier state
    pub fn reset(&mut self) {
        self.trail.clear();
        self.phase = SwingPhase::Idle;
        self.last_stroke = StrokeType::Ready;
        self.idle_frames = 0;
    }
}

impl Default for StrokeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(classifier: &mut StrokeClassifier, positions: &[(f32, f32)]) -> StrokeType {
        let mut last = classifier.last_stroke();
        for &pos in positions {
            last = classifier.push_wrist(pos);
        }
        last
    }

    #[test]
    fn test_starts_ready() {
        let mut classifier = StrokeClassifier::new();
        assert_eq!(classifier.push_wrist((0.5, 0.5)), StrokeType::Ready);
        assert_eq!(classifier.phase(), SwingPhase::Idle);
    }

    #[test]
    fn test_forehand_right_to_left() {
        let mut classifier = StrokeClassifier::new();
        let swing = [(0.5, 0.7), (0.45, 0.7), (0.38, 0.7), (0.3, 0.7), (0.25, 0.7)];
        assert_eq!(feed(&mut classifier, &swing), StrokeType::Ready);
        assert!(classifier.is_swinging());

        // Hold still until the window drains and the swing ends
        let rest = [(0.25, 0.7); 4];
        assert_eq!(feed(&mut classifier, &rest), StrokeType::Forehand);
        assert!(!classifier.is_swinging());
    }

    #[test]
    fn test_forehand_in_upper_half_without_vertical_motion() {
        let mut classifier = StrokeClassifier::new();
        let swing = [(0.5, 0.3), (0.45, 0.3), (0.38, 0.3), (0.3, 0.3), (0.25, 0.3)];
        feed(&mut classifier, &swing);
        assert_eq!(feed(&mut classifier, &[(0.25, 0.3); 4]), StrokeType::Forehand);
    }

    #[test]
    fn test_backhand_left_to_right() {
        let mut classifier = StrokeClassifier::new();
        let swing = [(0.2, 0.7), (0.26, 0.7), (0.34, 0.7), (0.42, 0.7), (0.5, 0.7)];
        feed(&mut classifier, &swing);
        assert_eq!(feed(&mut classifier, &[(0.5, 0.7); 4]), StrokeType::Backhand);
    }

    #[test]
    fn test_serve_preempts() {
        let mut classifier = StrokeClassifier::new();
        assert_eq!(classifier.push_wrist((0.5, 0.6)), StrokeType::Ready);
        // dy = -0.1 but wrist still at y = 0.5: groundstroke logic runs
        assert_eq!(classifier.push_wrist((0.5, 0.5)), StrokeType::Ready);
        assert!(classifier.is_swinging());
        assert_eq!(classifier.push_wrist((0.5, 0.4)), StrokeType::Serve);
        assert_eq!(classifier.push_wrist((0.5, 0.3)), StrokeType::Serve);
        // Swing tracking was not driven by the serve frames
        assert!(classifier.is_swinging());
    }

    #[test]
    fn test_wrist_raised_for_serve() {
        let mut classifier = StrokeClassifier::new();
        let toss = [(0.5, 0.6), (0.5, 0.525), (0.5, 0.45), (0.5, 0.375), (0.5, 0.3)];
        assert_eq!(feed(&mut classifier, &toss), StrokeType::Serve);
        assert_eq!(classifier.last_stroke(), StrokeType::Serve);

        // Two samples are enough when the rise is large
        let mut classifier = StrokeClassifier::new();
        classifier.push_wrist((0.5, 0.6));
        assert_eq!(classifier.push_wrist((0.5, 0.3)), StrokeType::Serve);
    }

    #[test]
    fn test_short_swing_is_discarded() {
        let mut classifier = StrokeClassifier::new();
        classifier.push_wrist((0.5, 0.7));
        classifier.push_wrist((0.44, 0.7));
        assert!(classifier.is_swinging());
        // Reset the window by holding still long enough
        let result = feed(&mut classifier, &[(0.44, 0.7); 5]);
        assert_eq!(result, StrokeType::Ready);
        assert!(!classifier.is_swinging());
    }

    #[test]
    fn test_label_is_sticky() {
        let mut classifier = StrokeClassifier::new();
        feed(&mut classifier, &[(0.2, 0.7), (0.26, 0.7), (0.34, 0.7), (0.42, 0.7), (0.5, 0.7)]);
        feed(&mut classifier, &[(0.5, 0.7); 4]);
        assert_eq!(feed(&mut classifier, &[(0.5, 0.7); 50]), StrokeType::Backhand);
    }

    #[test]
    fn test_idle_decay_returns_to_ready() {
        let mut classifier = StrokeClassifier::new().with_idle_decay(Some(10));
        feed(&mut classifier, &[(0.2, 0.7), (0.26, 0.7), (0.34, 0.7), (0.42, 0.7), (0.5, 0.7)]);
        assert_eq!(feed(&mut classifier, &[(0.5, 0.7); 4]), StrokeType::Backhand);
        assert_eq!(feed(&mut classifier, &[(0.5, 0.7); 9]), StrokeType::Backhand);
        assert_eq!(classifier.push_wrist((0.5, 0.7)), StrokeType::Ready);
    }

    #[test]
    fn test_empty_pose_keeps_label() {
        let mut classifier = StrokeClassifier::new();
        feed(&mut classifier, &[(0.5, 0.6), (0.5, 0.5), (0.5, 0.4)]);
        assert_eq!(classifier.update(&LandmarkSet::empty()), StrokeType::Serve);
    }

    #[test]
    fn test_reset() {
        let mut classifier = StrokeClassifier::new();
        feed(&mut classifier, &[(0.5, 0.6), (0.5, 0.5), (0.5, 0.4)]);
        classifier.reset();
        assert_eq!(classifier.last_stroke(), StrokeType::Ready);
        assert_eq!(classifier.phase(), SwingPhase::Idle);
    }
}
