use crate::storage::{Result, SizeMismatchErr};

/// Defines the strategy for updating model parameters based on calculated gradients.
///
/// The gradient is the descent direction, every delta is *added* to its parameter.
pub trait Optimizer {
    /// Computes the change for a single parameter, updating the per parameter state.
    ///
    /// # Arguments
    /// * `idx` - The index of the parameter inside this optimizer's shard.
    /// * `grad` - The aggregated gradient of that parameter.
    ///
    /// # Returns
    /// The amount to add to the parameter.
    fn delta(&mut self, idx: usize, grad: f64) -> f64;

    /// Updates the provided slice of parameters using the accumulated gradient and zeroes
    /// every gradient slot it consumes.
    ///
    /// # Arguments
    /// * `grad` - A reference to the model's gradient.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &mut [f64], params: &mut [f64]) -> Result<()> {
        SizeMismatchErr::check(grad.len(), params.len())?;

        for (i, (p, g)) in params.iter_mut().zip(grad.iter_mut()).enumerate() {
            *p += self.delta(i, *g);
            *g = 0.;
        }

        Ok(())
    }
}
