//! Joint angle calculation
//!
//! The angle at vertex `b` between rays b→a and b→c, taken as the absolute
//! difference of the two ray headings and reflected into [0°, 180°].

use std::ops::{Add, Div};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::bridge::{
    Landmark, LandmarkSet, LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST,
    RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};

/// Value reported by [`angle_or_zero`] when a point is absent.
///
/// Indistinguishable from a fully flexed joint, so callers that care should
/// use [`try_angle`] and gate on presence instead.
pub const NO_DATA_ANGLE: f32 = 0.0;

/// Angle at `b` in degrees, always within [0, 180]
pub fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let ray_a = Vector2::new(a.0 - b.0, a.1 - b.1);
    let ray_c = Vector2::new(c.0 - b.0, c.1 - b.1);

    let radians = ray_c.y.atan2(ray_c.x) - ray_a.y.atan2(ray_a.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Angle between three optional landmarks, `None` if any is missing
pub fn try_angle(a: Option<&Landmark>, b: Option<&Landmark>, c: Option<&Landmark>) -> Option<f32> {
    Some(joint_angle(a?.xy(), b?.xy(), c?.xy()))
}

/// Angle with the degenerate fallback: missing points yield [`NO_DATA_ANGLE`]
pub fn angle_or_zero(a: Option<&Landmark>, b: Option<&Landmark>, c: Option<&Landmark>) -> f32 {
    try_angle(a, b, c).unwrap_or(NO_DATA_ANGLE)
}

/// Angle for three landmark indices of one pose
pub fn angle_at(landmarks: &LandmarkSet, a: usize, b: usize, c: usize) -> f32 {
    angle_or_zero(landmarks.get(a), landmarks.get(b), landmarks.get(c))
}

// ============================================================================
// KEY ANGLES
// ============================================================================

/// The six joint angles tracked for feedback
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleSet {
    pub left_elbow: f32,
    pub right_elbow: f32,
    pub left_knee: f32,
    pub right_knee: f32,
    pub left_shoulder: f32,
    pub right_shoulder: f32,
}

impl AngleSet {
    /// Round each angle to whole degrees for display
    pub fn rounded(&self) -> Self {
        Self {
            left_elbow: self.left_elbow.round(),
            right_elbow: self.right_elbow.round(),
            left_knee: self.left_knee.round(),
            right_knee: self.right_knee.round(),
            left_shoulder: self.left_shoulder.round(),
            right_shoulder: self.right_shoulder.round(),
        }
    }
}

impl Add for AngleSet {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            left_elbow: self.left_elbow + rhs.left_elbow,
            right_elbow: self.right_elbow + rhs.right_elbow,
            left_knee: self.left_knee + rhs.left_knee,
            right_knee: self.right_knee + rhs.right_knee,
            left_shoulder: self.left_shoulder + rhs.left_shoulder,
            right_shoulder: self.right_shoulder + rhs.right_shoulder,
        }
    }
}

impl Div<f32> for AngleSet {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self {
            left_elbow: self.left_elbow / rhs,
            right_elbow: self.right_elbow / rhs,
            left_knee: self.left_knee / rhs,
            right_knee: self.right_knee / rhs,
            left_shoulder: self.left_shoulder / rhs,
            right_shoulder: self.right_shoulder / rhs,
        }
    }
}

/// Compute all key angles, `None` when no pose was detected
pub fn analyze_pose(landmarks: &LandmarkSet) -> Option<AngleSet> {
    if landmarks.is_empty() {
        return None;
    }

    Some(AngleSet {
        left_elbow: angle_at(landmarks, LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
        right_elbow: angle_at(landmarks, RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
        left_knee: angle_at(landmarks, LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
        right_knee: angle_at(landmarks, RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
        left_shoulder: angle_at(landmarks, LEFT_HIP, LEFT_SHOULDER, LEFT_ELBOW),
        right_shoulder: angle_at(landmarks, RIGHT_HIP, RIGHT_SHOULDER, RIGHT_ELBOW),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::landmarks::tests::standing_pose;

    #[test]
    fn test_straight_line() {
        let angle = joint_angle((0.0, 0.0), (0.5, 0.0), (1.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle((0.0, 0.0), (0.5, 0.0), (0.5, 0.5));
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflex_is_folded_back() {
        // Raw heading difference here is 270°, which folds to 90°
        let angle = joint_angle((0.0, -1.0), (0.0, 0.0), (-1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let points = [
            (0.1, 0.9), (0.3, 0.2), (0.8, 0.4), (0.5, 0.5), (0.95, 0.05), (0.0, 0.3),
        ];
        for &a in &points {
            for &b in &points {
                for &c in &points {
                    let forward = joint_angle(a, b, c);
                    let backward = joint_angle(c, b, a);
                    assert!((0.0..=180.0).contains(&forward));
                    assert!((forward - backward).abs() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_missing_point_policy() {
        let b = Landmark::new(0.5, 0.5, 0.0);
        let c = Landmark::new(1.0, 0.5, 0.0);
        assert_eq!(try_angle(None, Some(&b), Some(&c)), None);
        assert_eq!(angle_or_zero(None, Some(&b), Some(&c)), NO_DATA_ANGLE);
    }

    #[test]
    fn test_analyze_pose() {
        assert!(analyze_pose(&LandmarkSet::empty()).is_none());

        let angles = analyze_pose(&standing_pose()).unwrap();
        // Hip, knee and ankle are stacked vertically in the fixture
        assert!((angles.left_knee - 180.0).abs() < 1e-3);
        assert!(angles.right_elbow > 0.0 && angles.right_elbow <= 180.0);
    }

    #[test]
    fn test_rounded() {
        let set = AngleSet { left_elbow: 120.4, right_elbow: 120.6, ..Default::default() };
        let rounded = set.rounded();
        assert_eq!(rounded.left_elbow, 120.0);
        assert_eq!(rounded.right_elbow, 121.0);
    }
}
