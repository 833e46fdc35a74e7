use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::dataset::DataErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    TooFewLayers {
        got: usize,
    },
    EmptyLayer {
        layer: usize,
    },
    MissingBias {
        layer: usize,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A neuron output or delta stopped being finite. `layer` follows the network's
    /// internal indexing, where `0` is the output layer.
    NonFinite {
        layer: usize,
    },
    UnknownActFn {
        tag: String,
    },
    Data(DataErr),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::TooFewLayers { got } => {
                write!(f, "A network needs at least an input and an output layer, got {got} layers")
            }
            MlErr::EmptyLayer { layer } => write!(f, "Layer {layer} has no neurons"),
            MlErr::MissingBias { layer } => {
                write!(f, "Layer {layer} is not an input layer and has no bias slot")
            }
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            MlErr::NonFinite { layer } => {
                write!(f, "A non finite value showed up while computing layer {layer}")
            }
            MlErr::UnknownActFn { tag } => {
                write!(f, "There's no activation function registered as {tag:?}")
            }
            MlErr::Data(e) => write!(f, "dataset error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataErr> for MlErr {
    fn from(value: DataErr) -> Self {
        Self::Data(value)
    }
}
