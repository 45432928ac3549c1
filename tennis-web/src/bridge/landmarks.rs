//! Landmark types and the flat-array decoding used at the JS boundary
//!
//! MediaPipe Pose hands us 33 normalized keypoints per frame. The index
//! layout is fixed by the upstream model and must not be reordered.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_EYE: usize = 2;
pub const RIGHT_EYE: usize = 5;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_HEEL: usize = 29;
pub const RIGHT_HEEL: usize = 30;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// Values per landmark when JS sends visibility (x, y, z, visibility)
const STRIDE_WITH_VISIBILITY: usize = 4;
/// Values per landmark without visibility (x, y, z)
const STRIDE_POSITION_ONLY: usize = 3;

// ============================================================================
// LANDMARK DATA STRUCTURE
// ============================================================================

/// A single 3D landmark point (normalized coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    pub z: f32, // Relative depth
    /// Detection confidence, when the model reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, visibility: None }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// 2D position as a tuple
    pub fn xy(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Visibility with a missing score read as zero confidence
    pub fn visibility_or_zero(&self) -> f32 {
        self.visibility.unwrap_or(0.0)
    }
}

/// The full body pose for one frame: empty (no detection) or exactly 33 points
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// No pose detected this frame
    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    /// Build from a point list; only 0 or 33 entries are accepted.
    pub fn from_points(points: Vec<Landmark>) -> PipelineResult<Self> {
        match points.len() {
            0 | LANDMARK_COUNT => Ok(Self { points }),
            len => Err(PipelineError::InvalidLandmarkData { len }),
        }
    }

    /// Decode the flat Float32Array JS sends.
    ///
    /// Accepts 132 values (x, y, z, visibility per point), 99 values
    /// (x, y, z only) or an empty array for "no detection". A NaN
    /// visibility means the model gave no score.
    pub fn from_flat(data: &[f32]) -> PipelineResult<Self> {
        let stride = match data.len() {
            0 => return Ok(Self::empty()),
            n if n == LANDMARK_COUNT * STRIDE_WITH_VISIBILITY => STRIDE_WITH_VISIBILITY,
            n if n == LANDMARK_COUNT * STRIDE_POSITION_ONLY => STRIDE_POSITION_ONLY,
            len => return Err(PipelineError::InvalidLandmarkData { len }),
        };

        let points = data
            .chunks_exact(stride)
            .map(|c| Landmark {
                x: c[0],
                y: c[1],
                z: c[2],
                visibility: c.get(3).copied().filter(|v| !v.is_nan()),
            })
            .collect();

        Ok(Self { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Landmark at a fixed index, `None` when there is no pose
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }

    /// Transform every point, keeping the length unchanged
    pub fn map_points(&self, f: impl FnMut(&Landmark) -> Landmark) -> Self {
        Self {
            points: self.points.iter().map(f).collect(),
        }
    }

    /// Flatten back into the layout `from_flat` reads: (x, y, z) triples
    /// when no point has a score, otherwise quadruples with NaN for a
    /// missing one
    pub fn to_flat(&self) -> Vec<f32> {
        if self.points.iter().all(|lm| lm.visibility.is_none()) {
            return self.points.iter().flat_map(|lm| [lm.x, lm.y, lm.z]).collect();
        }
        let mut flat = Vec::with_capacity(self.points.len() * STRIDE_WITH_VISIBILITY);
        for lm in &self.points {
            flat.extend_from_slice(&[lm.x, lm.y, lm.z, lm.visibility.unwrap_or(f32::NAN)]);
        }
        flat
    }
}
