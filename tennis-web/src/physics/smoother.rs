//! Sliding-window mean for per-frame jitter reduction
//!
//! Keeps the last `capacity` samples and reports their per-field mean.

use std::collections::VecDeque;
use std::ops::{Add, Div};

use super::angles::AngleSet;

/// Default window for the key-angle smoother
pub const ANGLE_WINDOW: usize = 5;

/// Bounded history buffer with an arithmetic mean over what it holds
#[derive(Clone, Debug)]
pub struct SmoothingWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> SmoothingWindow<T>
where
    T: Copy + Default + Add<Output = T> + Div<f32, Output = T>,
{
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, evict the oldest beyond capacity, return the new mean
    pub fn push(&mut self, sample: T) -> T {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        // Never empty right after a push
        self.mean().unwrap_or(sample)
    }

    /// Mean of the retained samples, `None` before the first push
    pub fn mean(&self) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        let sum = self.samples.iter().fold(T::default(), |acc, &s| acc + s);
        Some(sum / self.samples.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all history (scenario reset)
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Smoother for the six key angles
pub type AngleSmoother = SmoothingWindow<AngleSet>;

impl Default for AngleSmoother {
    fn default() -> Self {
        Self::new(ANGLE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_values() {
        let mut window = SmoothingWindow::new(4);
        let mut out = 0.0;
        for _ in 0..4 {
            out = window.push(7.5f32);
        }
        assert_eq!(out, 7.5);
    }

    #[test]
    fn test_oldest_is_evicted() {
        let mut window = SmoothingWindow::new(3);
        window.push(100.0f32);
        window.push(1.0);
        window.push(2.0);
        let out = window.push(3.0);
        assert_eq!(window.len(), 3);
        assert!((out - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_window_mean() {
        let mut window = SmoothingWindow::new(10);
        assert!(window.mean().is_none());
        window.push(160.0f32);
        let out = window.push(170.0);
        assert!((out - 165.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_capacity_and_clear() {
        let mut window = SmoothingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(1.0f32);
        assert_eq!(window.push(9.0), 9.0);
        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn test_angle_set_smoothing() {
        let mut smoother = AngleSmoother::default();
        smoother.push(AngleSet { left_knee: 170.0, right_elbow: 90.0, ..Default::default() });
        let out = smoother.push(AngleSet { left_knee: 160.0, right_elbow: 100.0, ..Default::default() });
        assert!((out.left_knee - 165.0).abs() < 1e-4);
        assert!((out.right_elbow - 95.0).abs() < 1e-4);
    }
}
