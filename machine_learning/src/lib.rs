pub mod arch;
pub mod dataset;
pub mod error;

pub use arch::{FlatNetwork, LayerDesc, activations::ActFn};
pub use dataset::{DataErr, Dataset, InMemoryDataset};
pub use error::{MlErr, Result};
