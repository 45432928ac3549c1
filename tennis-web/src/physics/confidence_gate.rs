//! Confidence gate - decides which landmarks are trustworthy enough to use
//!
//! Points without a visibility score are treated as visible: the model only
//! omits the score when it has no opinion, and dropping them would erase
//! whole skeletons from sources that never report it.

use crate::bridge::Landmark;

/// Default minimum visibility for drawing a joint or bone
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Visibility gate for a single threshold
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl ConfidenceGate {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// A present landmark passes unless it reports visibility below threshold
    pub fn passes(&self, landmark: Option<&Landmark>) -> bool {
        match landmark {
            None => false,
            Some(lm) => lm.visibility.map_or(true, |v| v >= self.threshold),
        }
    }

    /// Both endpoints of a bone must pass
    pub fn passes_pair(&self, a: Option<&Landmark>, b: Option<&Landmark>) -> bool {
        self.passes(a) && self.passes(b)
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_thresholds() {
        let gate = ConfidenceGate::new();
        let seen = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.5);
        let faint = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.49);
        let unscored = Landmark::new(0.5, 0.5, 0.0);

        assert!(gate.passes(Some(&seen)));
        assert!(!gate.passes(Some(&faint)));
        assert!(gate.passes(Some(&unscored)));
        assert!(!gate.passes(None));
        assert!(!gate.passes_pair(Some(&seen), Some(&faint)));
    }

    #[test]
    fn test_custom_threshold() {
        let gate = ConfidenceGate::with_threshold(0.9);
        let lm = Landmark::new(0.1, 0.1, 0.0).with_visibility(0.8);
        assert!(!gate.passes(Some(&lm)));
        assert_eq!(gate.threshold(), 0.9);
    }
}
