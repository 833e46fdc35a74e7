use parameter_server::optimization::{DEFAULT_ZERO_TOLERANCE, RpropConfig, ZeroCrossing};
use serde::{Deserialize, Serialize};

/// The specification for `ZeroCrossing`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCrossingSpec {
    #[default]
    LastGradient,
    StepSize,
}

impl From<ZeroCrossingSpec> for ZeroCrossing {
    fn from(value: ZeroCrossingSpec) -> Self {
        match value {
            ZeroCrossingSpec::LastGradient => ZeroCrossing::LastGradient,
            ZeroCrossingSpec::StepSize => ZeroCrossing::StepSize,
        }
    }
}

/// The specification for `RpropConfig`, every missing field takes its default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RpropSpec {
    pub increase: f64,
    pub decrease: f64,
    pub initial_step: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub zero_crossing: ZeroCrossingSpec,
}

impl Default for RpropSpec {
    fn default() -> Self {
        let RpropConfig {
            increase,
            decrease,
            initial_step,
            min_step,
            max_step,
            ..
        } = RpropConfig::default();

        Self {
            increase,
            decrease,
            initial_step,
            min_step,
            max_step,
            zero_crossing: ZeroCrossingSpec::default(),
        }
    }
}

impl From<RpropSpec> for RpropConfig {
    fn from(value: RpropSpec) -> Self {
        Self {
            increase: value.increase,
            decrease: value.decrease,
            initial_step: value.initial_step,
            min_step: value.min_step,
            max_step: value.max_step,
            zero_crossing: value.zero_crossing.into(),
        }
    }
}

fn default_zero_tolerance() -> f64 {
    DEFAULT_ZERO_TOLERANCE
}

/// The specification for the weight update strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategySpec {
    Backprop {
        learning_rate: f64,
        momentum: f64,
    },
    Rprop(RpropSpec),
    Manhattan {
        learning_rate: f64,
        #[serde(default = "default_zero_tolerance")]
        zero_tolerance: f64,
    },
}
