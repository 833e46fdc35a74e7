use serde::{Deserialize, Serialize};

/// The specification for a single layer, layers are listed from input to output.
///
/// When not given, `act_fn` is `linear` for the input layer and `sigmoid` for every other
/// layer, and only non input layers carry a bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub neurons: usize,
    #[serde(default)]
    pub act_fn: Option<String>,
    #[serde(default)]
    pub bias: Option<bool>,
}
