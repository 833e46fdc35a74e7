use super::Optimizer;

/// Classic backpropagation with momentum.
///
/// Every delta is `learning_rate * grad + momentum * previous_delta`.
#[derive(Debug, Clone)]
pub struct Momentum {
    learning_rate: f64,
    momentum: f64,
    previous_deltas: Box<[f64]>,
}

impl Momentum {
    /// Creates a new `Momentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The fraction of the previous delta carried into the next one.
    ///
    /// # Returns
    /// A new `Momentum` instance.
    pub fn new(len: usize, learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            previous_deltas: vec![0.; len].into_boxed_slice(),
        }
    }

    pub fn previous_deltas(&self) -> &[f64] {
        &self.previous_deltas
    }
}

impl Optimizer for Momentum {
    fn delta(&mut self, idx: usize, grad: f64) -> f64 {
        let prev = &mut self.previous_deltas[idx];
        let delta = self.learning_rate * grad + self.momentum * *prev;
        *prev = delta;
        delta
    }
}
