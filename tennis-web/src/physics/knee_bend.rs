//! Knee-bend quality
//!
//! Picks the better-seen leg, measures hip→knee→ankle, smooths the angle over
//! the last frames and labels it. A leg straighter than the threshold is
//! "Granny's Legs".

use serde::{Deserialize, Serialize};

use super::angles::angle_at;
use super::smoother::SmoothingWindow;
use crate::bridge::{
    LandmarkSet, LEFT_ANKLE, LEFT_HIP, LEFT_KNEE, RIGHT_ANKLE, RIGHT_HIP, RIGHT_KNEE,
};

/// Frames averaged (~300ms at 30fps)
pub const KNEE_WINDOW: usize = 10;

/// Smoothed angles strictly above this are too straight
pub const STRAIGHT_LEG_THRESHOLD: f32 = 165.0;

/// Which leg was measured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Left,
    Right,
}

impl Leg {
    /// (hip, knee, ankle) landmark indices
    pub fn joints(&self) -> (usize, usize, usize) {
        match self {
            Leg::Left => (LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
            Leg::Right => (RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
        }
    }
}

/// Two-state knee quality label
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KneeStatus {
    Good,
    #[serde(rename = "Granny's Legs")]
    GrannysLegs,
}

impl KneeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            KneeStatus::Good => "Good",
            KneeStatus::GrannysLegs => "Granny's Legs",
        }
    }
}

/// One frame's knee-bend reading
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KneeBend {
    /// Smoothed hip-knee-ankle angle in degrees
    pub angle: f32,
    pub status: KneeStatus,
    pub leg: Leg,
}

/// Leg with the higher knee visibility.
///
/// Ties go to the left leg; a missing score counts as zero. Both are kept
/// as explicit policy so a side-on player with equal scores stays on one leg.
pub fn select_leg(landmarks: &LandmarkSet) -> Leg {
    let left = landmarks.get(LEFT_KNEE).map_or(0.0, |lm| lm.visibility_or_zero());
    let right = landmarks.get(RIGHT_KNEE).map_or(0.0, |lm| lm.visibility_or_zero());

    if right > left {
        Leg::Right
    } else {
        Leg::Left
    }
}

/// Threshold an angle into a status (`> threshold` only)
pub fn classify_knee_angle(angle: f32, threshold: f32) -> KneeStatus {
    if angle > threshold {
        KneeStatus::GrannysLegs
    } else {
        KneeStatus::Good
    }
}

/// Per-session knee-bend classifier with its own smoothing history
#[derive(Clone, Debug)]
pub struct KneeBendClassifier {
    window: SmoothingWindow<f32>,
    straight_threshold: f32,
}

impl KneeBendClassifier {
    pub fn new() -> Self {
        Self::with_settings(KNEE_WINDOW, STRAIGHT_LEG_THRESHOLD)
    }

    pub fn with_settings(window: usize, straight_threshold: f32) -> Self {
        Self {
            window: SmoothingWindow::new(window),
            straight_threshold,
        }
    }

    /// Process one frame; `None` when no pose is available (history untouched)
    pub fn update(&mut self, landmarks: &LandmarkSet) -> Option<KneeBend> {
        if landmarks.is_empty() {
            return None;
        }

        let leg = select_leg(landmarks);
        let (hip, knee, ankle) = leg.joints();
        let raw = angle_at(landmarks, hip, knee, ankle);
        let angle = self.window.push(raw);

        Some(KneeBend {
            angle,
            status: classify_knee_angle(angle, self.straight_threshold),
            leg,
        })
    }

    /// Current smoothed angle without adding a sample
    pub fn smoothed_angle(&self) -> Option<f32> {
        self.window.mean()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

impl Default for KneeBendClassifier {
    fn default() -> Self {
        Self::new()
    }
}
