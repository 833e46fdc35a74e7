use super::activations::ActFn;

/// Describes a single layer of a feedforward network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerDesc {
    pub neurons: usize,
    pub act_fn: ActFn,
    pub bias: bool,
}

impl LayerDesc {
    /// Creates the description of an input layer, it has no activation nor bias slot.
    pub fn input(neurons: usize) -> Self {
        Self {
            neurons,
            act_fn: ActFn::Linear,
            bias: false,
        }
    }

    /// Creates the description of a hidden or output layer with a bias slot per neuron.
    pub fn new(neurons: usize, act_fn: ActFn) -> Self {
        Self {
            neurons,
            act_fn,
            bias: true,
        }
    }

    pub fn without_bias(self) -> Self {
        Self {
            bias: false,
            ..self
        }
    }
}
