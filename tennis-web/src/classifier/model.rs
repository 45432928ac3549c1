//! Stroke labels and thresholds

use serde::{Deserialize, Serialize};

/// Stroke labels (order matches the UI legend)
pub const STROKE_TYPES: [&str; 4] = ["READY", "FOREHAND", "BACKHAND", "SERVE"];

/// Stroke type enum for type-safe handling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrokeType {
    #[default]
    Ready,
    Forehand,
    Backhand,
    Serve,
}

impl StrokeType {
    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => StrokeType::Forehand,
            2 => StrokeType::Backhand,
            3 => StrokeType::Serve,
            _ => StrokeType::Ready,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeType::Ready => "READY",
            StrokeType::Forehand => "FOREHAND",
            StrokeType::Backhand => "BACKHAND",
            StrokeType::Serve => "SERVE",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StrokeType::Ready => 0,
            StrokeType::Forehand => 1,
            StrokeType::Backhand => 2,
            StrokeType::Serve => 3,
        }
    }
}

/// Velocity thresholds for swing detection, in normalized units per window
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeThresholds {
    /// Speed above which a swing starts (and below which it ends)
    pub swing_start_velocity: f32,
    /// Peak speed a finished swing needs to be classified
    pub min_peak_velocity: f32,
    /// Frames a swing must last beyond its first (strictly more than this)
    pub min_swing_frames: u32,
    /// Vertical displacement (negative = upward) that signals a serve
    pub serve_rise: f32,
    /// Wrist must be above this normalized y for a serve
    pub serve_max_y: f32,
}

impl Default for StrokeThresholds {
    fn default() -> Self {
        Self {
            swing_start_velocity: 0.03,
            min_peak_velocity: 0.05,
            min_swing_frames: 3,
            serve_rise: -0.05,
            serve_max_y: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_indices() {
        for (idx, label) in STROKE_TYPES.iter().enumerate() {
            let stroke = StrokeType::from_index(idx);
            assert_eq!(stroke.as_str(), *label);
            assert_eq!(stroke.index(), idx);
        }
        assert_eq!(StrokeType::from_index(99), StrokeType::Ready);
    }

    #[test]
    fn test_default_is_ready() {
        assert_eq!(StrokeType::default(), StrokeType::Ready);
    }
}
