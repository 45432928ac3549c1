//! Physics module - joint angles, smoothing and knee-bend biomechanics
//!
//! Re-exports only. All logic in submodules.

mod angles;
mod confidence_gate;
mod knee_bend;
mod smoother;
mod velocity;

pub use angles::{
    analyze_pose, angle_at, angle_or_zero, joint_angle, try_angle, AngleSet, NO_DATA_ANGLE,
};
pub use confidence_gate::{ConfidenceGate, DEFAULT_VISIBILITY_THRESHOLD};
pub use knee_bend::{
    classify_knee_angle, select_leg, KneeBend, KneeBendClassifier, KneeStatus, Leg, KNEE_WINDOW,
    STRAIGHT_LEG_THRESHOLD,
};
pub use smoother::{AngleSmoother, SmoothingWindow, ANGLE_WINDOW};
pub use velocity::{WristTrail, TRAIL_FRAMES};
