//! Pro reference positions
//!
//! Ideal joint-angle ranges at contact for each stroke, and a comparison of
//! a measured angle set against them.

use serde::Serialize;

use super::model::StrokeType;
use crate::physics::AngleSet;

/// Joints a reference can constrain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftKnee,
    RightKnee,
    LeftShoulder,
    RightShoulder,
}

impl Joint {
    /// Read this joint's value from an angle set
    pub fn read(&self, angles: &AngleSet) -> f32 {
        match self {
            Joint::LeftElbow => angles.left_elbow,
            Joint::RightElbow => angles.right_elbow,
            Joint::LeftKnee => angles.left_knee,
            Joint::RightKnee => angles.right_knee,
            Joint::LeftShoulder => angles.left_shoulder,
            Joint::RightShoulder => angles.right_shoulder,
        }
    }
}

/// An inclusive [min, max] ideal range in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IdealRange {
    pub joint: Joint,
    pub min: f32,
    pub max: f32,
}

/// A named reference position
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ProReference {
    pub name: &'static str,
    pub description: &'static str,
    pub ideal: &'static [IdealRange],
}

/// How a measured angle relates to its ideal range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeVerdict {
    TooBent,
    Ideal,
    TooStraight,
}

/// Comparison result for one joint
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct JointFeedback {
    pub joint: Joint,
    pub measured: f32,
    pub verdict: RangeVerdict,
}

impl ProReference {
    /// Compare every constrained joint against the measured angles
    pub fn evaluate(&self, angles: &AngleSet) -> Vec<JointFeedback> {
        self.ideal
            .iter()
            .map(|range| {
                let measured = range.joint.read(angles);
                let verdict = if measured < range.min {
                    RangeVerdict::TooBent
                } else if measured > range.max {
                    RangeVerdict::TooStraight
                } else {
                    RangeVerdict::Ideal
                };
                JointFeedback { joint: range.joint, measured, verdict }
            })
            .collect()
    }
}

pub static PRO_REFERENCES: [ProReference; 3] = [
    ProReference {
        name: "Forehand Drive",
        description: "Ideal forehand contact point requires a semi-bent elbow and good knee flexion.",
        ideal: &[
            IdealRange { joint: Joint::RightElbow, min: 140.0, max: 170.0 },
            IdealRange { joint: Joint::RightKnee, min: 130.0, max: 160.0 },
        ],
    },
    ProReference {
        name: "Backhand Drive",
        description: "For a two-handed backhand, keep both arms relatively straight at contact.",
        ideal: &[
            IdealRange { joint: Joint::LeftElbow, min: 150.0, max: 180.0 },
            IdealRange { joint: Joint::RightElbow, min: 150.0, max: 180.0 },
        ],
    },
    ProReference {
        name: "Serve (Trophy Position)",
        description: "High elbow and deep knee bend are crucial for power.",
        ideal: &[
            IdealRange { joint: Joint::RightElbow, min: 80.0, max: 100.0 },
            IdealRange { joint: Joint::LeftKnee, min: 110.0, max: 140.0 },
        ],
    },
];

/// Reference position for a detected stroke; READY has none
pub fn reference_for_stroke(stroke: StrokeType) -> Option<&'static ProReference> {
    match stroke {
        StrokeType::Forehand => Some(&PRO_REFERENCES[0]),
        StrokeType::Backhand => Some(&PRO_REFERENCES[1]),
        StrokeType::Serve => Some(&PRO_REFERENCES[2]),
        StrokeType::Ready => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forehand_feedback() {
        let angles = AngleSet { right_elbow: 120.0, right_knee: 150.0, ..Default::default() };
        let feedback = reference_for_stroke(StrokeType::Forehand).unwrap().evaluate(&angles);
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].verdict, RangeVerdict::TooBent);
        assert_eq!(feedback[1].verdict, RangeVerdict::Ideal);
    }

    #[test]
    fn test_range_is_inclusive() {
        let angles = AngleSet { right_elbow: 100.0, left_knee: 141.0, ..Default::default() };
        let feedback = reference_for_stroke(StrokeType::Serve).unwrap().evaluate(&angles);
        assert_eq!(feedback[0].verdict, RangeVerdict::Ideal);
        assert_eq!(feedback[1].verdict, RangeVerdict::TooStraight);
    }

    #[test]
    fn test_ready_has_no_reference() {
        assert!(reference_for_stroke(StrokeType::Ready).is_none());
    }
}
