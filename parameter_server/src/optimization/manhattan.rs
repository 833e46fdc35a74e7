use super::Optimizer;

/// Gradients with an absolute value below this are treated as zero.
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-17;

/// Moves every parameter by a fixed amount in the direction of its gradient.
#[derive(Debug, Clone, Copy)]
pub struct Manhattan {
    learning_rate: f64,
    zero_tolerance: f64,
}

impl Manhattan {
    pub fn new(learning_rate: f64) -> Self {
        Self::with_tolerance(learning_rate, DEFAULT_ZERO_TOLERANCE)
    }

    pub fn with_tolerance(learning_rate: f64, zero_tolerance: f64) -> Self {
        Self {
            learning_rate,
            zero_tolerance,
        }
    }
}

impl Optimizer for Manhattan {
    fn delta(&mut self, _idx: usize, grad: f64) -> f64 {
        if grad > self.zero_tolerance {
            self.learning_rate
        } else if grad < -self.zero_tolerance {
            -self.learning_rate
        } else {
            0.
        }
    }
}
