use super::Sigmoid;

/// A per layer activation function.
///
/// The derivative is always evaluated on the activation's *output*, which is what
/// the network keeps around after a forward pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Tanh,
    Linear,
    Relu,
}

use ActFn::*;

impl Default for ActFn {
    fn default() -> Self {
        Sigmoid(self::Sigmoid::default())
    }
}

impl ActFn {
    pub fn sigmoid(amp: f64) -> Self {
        Sigmoid(self::Sigmoid::new(amp))
    }

    pub fn f(&self, x: f64) -> f64 {
        match self {
            Sigmoid(a) => a.f(x),
            Tanh => x.tanh(),
            Linear => x,
            Relu => x.max(0.),
        }
    }

    pub fn df(&self, y: f64) -> f64 {
        match self {
            Sigmoid(a) => a.df(y),
            Tanh => 1. - y * y,
            Linear => 1.,
            Relu => {
                if y > 0. {
                    1.
                } else {
                    0.
                }
            }
        }
    }

    /// The stable tag under which this activation is registered.
    pub fn tag(&self) -> &'static str {
        match self {
            Sigmoid(_) => "sigmoid",
            Tanh => "tanh",
            Linear => "linear",
            Relu => "relu",
        }
    }
}
