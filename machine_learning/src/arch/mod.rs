pub mod activations;
mod flat;
mod layer;

pub use flat::FlatNetwork;
pub use layer::LayerDesc;

/// Computes the amount of weights a network with the given layer sizes has.
///
/// # Arguments
/// * `sizes` - The neuron count of every layer, output layer first.
///
/// # Returns
/// The sum over adjacent layers of `(source + 1) * destination`.
pub fn param_count(sizes: &[usize]) -> usize {
    sizes.windows(2).map(|w| w[0] * (w[1] + 1)).sum()
}
