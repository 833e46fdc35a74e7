use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The specific result type for the constructors of `RandParamGen`.
pub type Result<T> = std::result::Result<T, RandErr>;

/// Error returned whenever the parameters of a distribution are invalid.
#[derive(Debug)]
pub enum RandErr {
    Normal(NormalError),
    NegativeStdDev(f64),
    Uniform(UniformError),
}

impl From<NormalError> for RandErr {
    fn from(value: NormalError) -> Self {
        Self::Normal(value)
    }
}

impl From<UniformError> for RandErr {
    fn from(value: UniformError) -> Self {
        Self::Uniform(value)
    }
}

impl Display for RandErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandErr::Normal(e) => write!(f, "invalid normal distribution: {e}"),
            RandErr::Uniform(e) => write!(f, "invalid uniform distribution: {e}"),
            RandErr::NegativeStdDev(std_dev) => {
                write!(f, "invalid normal distribution: negative standard deviation {std_dev}")
            }
        }
    }
}

impl Error for RandErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RandErr::Normal(e) => Some(e),
            RandErr::Uniform(e) => Some(e),
            RandErr::NegativeStdDev(_) => None,
        }
    }
}
