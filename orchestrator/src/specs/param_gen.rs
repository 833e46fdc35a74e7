use serde::{Deserialize, Serialize};

/// The specification for a random distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSpec {
    Uniform { low: f64, high: f64 },
    UniformInclusive { low: f64, high: f64 },
    XavierUniform { fan_in: usize, fan_out: usize },
    LecunUniform { fan_in: usize },
    Normal { mean: f64, std_dev: f64 },
    Kaiming { fan_in: usize },
    Xavier { fan_in: usize, fan_out: usize },
    Lecun { fan_in: usize },
}

/// The specification for the initial weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGenSpec {
    Const { value: f64 },
    Rand { distribution: DistributionSpec },
    Explicit { params: Vec<f64> },
}

impl Default for ParamGenSpec {
    fn default() -> Self {
        Self::Rand {
            distribution: DistributionSpec::Uniform {
                low: -1.,
                high: 1.,
            },
        }
    }
}
