//! Pipeline configuration
//!
//! Every tunable in one serde struct. JS may pass a partial object; missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::classifier::{StrokeClassifier, StrokeThresholds};
use crate::compositor::{DEFAULT_DIVIDER_WIDTH, DEFAULT_FPS, DEFAULT_MIME_PREFERENCES};
use crate::error::{PipelineError, PipelineResult};
use crate::physics::{
    AngleSmoother, ConfidenceGate, KneeBendClassifier, SmoothingWindow, ANGLE_WINDOW,
    DEFAULT_VISIBILITY_THRESHOLD, KNEE_WINDOW, STRAIGHT_LEG_THRESHOLD, TRAIL_FRAMES,
};
use crate::renderer::{SkeletonBackground, SkeletonStyle};

/// Opacity of the reference skeleton drawn under the player's
pub const REFERENCE_OPACITY: f32 = 0.3;

/// Minimum gap between court-line detections
pub const COURT_LINE_INTERVAL_MS: f64 = 1000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Frames averaged for the displayed joint angles
    pub angle_window: usize,
    /// Frames averaged for the knee-bend angle
    pub knee_window: usize,
    pub knee_straight_threshold: f32,
    /// Wrist positions kept for stroke velocity
    pub stroke_window: usize,
    pub stroke: StrokeThresholds,
    /// Quiet frames before the stroke label returns to READY; `None` keeps
    /// the last label until the next stroke
    pub idle_decay_frames: Option<u32>,
    pub visibility_threshold: f32,
    pub reference_opacity: f32,
    pub skeleton_style: SkeletonStyle,
    pub background: SkeletonBackground,
    pub recording_fps: u32,
    pub mime_preferences: Vec<String>,
    pub court_line_interval_ms: f64,
    pub divider_width: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            angle_window: ANGLE_WINDOW,
            knee_window: KNEE_WINDOW,
            knee_straight_threshold: STRAIGHT_LEG_THRESHOLD,
            stroke_window: TRAIL_FRAMES,
            stroke: StrokeThresholds::default(),
            idle_decay_frames: None,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            reference_opacity: REFERENCE_OPACITY,
            skeleton_style: SkeletonStyle::default(),
            background: SkeletonBackground::default(),
            recording_fps: DEFAULT_FPS,
            mime_preferences: DEFAULT_MIME_PREFERENCES.iter().map(|m| m.to_string()).collect(),
            court_line_interval_ms: COURT_LINE_INTERVAL_MS,
            divider_width: DEFAULT_DIVIDER_WIDTH,
        }
    }
}

impl PipelineConfig {
    /// Decode a JS config object; `undefined`/`null` give the defaults
    pub fn from_js(value: JsValue) -> PipelineResult<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_wasm_bindgen::from_value(value)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let fail = |msg: &str| Err(PipelineError::Config(msg.to_string()));

        if self.angle_window == 0 || self.knee_window == 0 {
            return fail("smoothing windows must hold at least one frame");
        }
        if self.stroke_window < 2 {
            return fail("stroke window needs at least two wrist positions");
        }
        if self.recording_fps == 0 {
            return fail("recording fps must be positive");
        }
        if !(0.0..=1.0).contains(&self.reference_opacity) {
            return fail("reference opacity must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return fail("visibility threshold must be within 0..=1");
        }
        if self.mime_preferences.is_empty() {
            return fail("at least one recording MIME type is required");
        }
        if self.court_line_interval_ms < 0.0 || self.divider_width < 0.0 {
            return fail("intervals and widths cannot be negative");
        }
        if self.stroke.swing_start_velocity <= 0.0 || self.stroke.min_peak_velocity <= 0.0 {
            return fail("swing velocities must be positive");
        }
        Ok(())
    }

    pub fn gate(&self) -> ConfidenceGate {
        ConfidenceGate::with_threshold(self.visibility_threshold)
    }

    pub fn angle_smoother(&self) -> AngleSmoother {
        SmoothingWindow::new(self.angle_window)
    }

    pub fn knee_classifier(&self) -> KneeBendClassifier {
        KneeBendClassifier::with_settings(self.knee_window, self.knee_straight_threshold)
    }

    pub fn stroke_classifier(&self) -> StrokeClassifier {
        StrokeClassifier::with_thresholds(self.stroke)
            .with_trail_frames(self.stroke_window)
            .with_idle_decay(self.idle_decay_frames)
    }
}
