//! Bounded moving average over the most recent observations

use std::collections::VecDeque;

/// Number of observations retained by default
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

/// FIFO window computing the arithmetic mean of its contents.
///
/// Owned by a single sampler loop; not meant to be shared across tasks.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: VecDeque<f64>,
    capacity: usize,
}

impl MovingAverage {
    /// Create a window holding at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest one when full, and return the new mean
    pub fn push(&mut self, value: f64) -> f64 {
        self.window.push_back(value);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        // The window is never empty right after a push
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Mean of the retained values, `None` before the first push
    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_push_returns_value() {
        let mut window = MovingAverage::default();
        assert_eq!(window.mean(), None);
        assert_eq!(window.push(42.5), 42.5);
        assert_eq!(window.mean(), Some(42.5));
    }

    #[test]
    fn test_mean_of_partial_window() {
        let mut window = MovingAverage::default();
        let values = [29.85, 56.95, 53.85, 42.3, 70.7];
        let mut last = 0.0;
        for v in values {
            last = window.push(v);
        }

        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert!((last - expected).abs() < 1e-9);
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_full_window_then_eviction() {
        let mut window = MovingAverage::new(50);

        let mut mean = 0.0;
        for i in 1..=50 {
            mean = window.push((i * 10) as f64);
        }
        assert_eq!(mean, 255.0);
        assert_eq!(window.len(), 50);

        // 510 pushes out 10
        assert_eq!(window.push(510.0), 265.0);
        assert_eq!(window.len(), 50);
    }

    #[test]
    fn test_only_last_capacity_values_count() {
        let mut window = MovingAverage::new(3);
        for v in [100.0, 200.0, 1.0, 2.0, 3.0] {
            window.push(v);
        }
        assert_eq!(window.mean(), Some(2.0));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_mean_is_stable_between_pushes() {
        let mut window = MovingAverage::new(4);
        window.push(1.0);
        window.push(2.0);

        let first = window.mean();
        let second = window.mean();
        assert_eq!(first, second);
        assert_eq!(first, Some(1.5));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = MovingAverage::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(5.0);
        assert_eq!(window.push(7.0), 7.0);
    }
}
