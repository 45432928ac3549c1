//! Wrist trail - raw position history for swing velocity
//!
//! Velocity here is the displacement from the oldest to the newest retained
//! position. Positions are not smoothed; the window length alone damps jitter.

use std::collections::VecDeque;

use nalgebra::Vector2;

/// Number of raw positions retained
pub const TRAIL_FRAMES: usize = 5;

/// Position history for one tracked point
#[derive(Clone, Debug)]
pub struct WristTrail {
    history: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl WristTrail {
    pub fn new() -> Self {
        Self::with_capacity(TRAIL_FRAMES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a new position, dropping the oldest beyond capacity
    pub fn push(&mut self, pos: (f32, f32)) {
        self.history.push_back(pos);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    /// Newest minus oldest; `None` until two positions are known
    pub fn displacement(&self) -> Option<Vector2<f32>> {
        if self.history.len() < 2 {
            return None;
        }
        let (ox, oy) = *self.history.front()?;
        let (nx, ny) = *self.history.back()?;
        Some(Vector2::new(nx - ox, ny - oy))
    }

    /// Most recent position
    pub fn latest(&self) -> Option<(f32, f32)> {
        self.history.back().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Clear history (useful on session reset)
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for WristTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_two_samples() {
        let mut trail = WristTrail::new();
        assert!(trail.displacement().is_none());
        trail.push((0.5, 0.5));
        assert!(trail.displacement().is_none());
        trail.push((0.4, 0.5));
        let d = trail.displacement().unwrap();
        assert!((d.x + 0.1).abs() < 1e-6);
        assert!(d.y.abs() < 1e-6);
    }

    #[test]
    fn test_window_spans_oldest_to_newest() {
        let mut trail = WristTrail::new();
        for i in 0..8 {
            trail.push((i as f32 * 0.1, 0.0));
        }
        assert_eq!(trail.len(), TRAIL_FRAMES);
        // Retained x values are 0.3..=0.7
        let d = trail.displacement().unwrap();
        assert!((d.x - 0.4).abs() < 1e-5);
        let (lx, _) = trail.latest().unwrap();
        assert!((lx - 0.7).abs() < 1e-5);
    }
}
