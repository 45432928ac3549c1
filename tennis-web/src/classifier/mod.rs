//! Classifier module - stroke detection from wrist motion
//!
//! Rule-based: a velocity-threshold swing machine labels each finished swing,
//! and pro reference ranges grade the pose against the detected stroke.

mod model;
mod reference;
mod stroke;

pub use model::{StrokeThresholds, StrokeType, STROKE_TYPES};
pub use reference::{
    reference_for_stroke, IdealRange, Joint, JointFeedback, ProReference, RangeVerdict,
    PRO_REFERENCES,
};
pub use stroke::{StrokeClassifier, SwingPhase};
