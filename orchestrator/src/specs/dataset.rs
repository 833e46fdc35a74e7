use machine_learning::{DataErr, InMemoryDataset};
use serde::{Deserialize, Serialize};

/// The specification for the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSpec {
    /// Every row's input values followed by its ideal values.
    Inline {
        data: Vec<f64>,
        x_size: usize,
        y_size: usize,
    },
    /// A list of `[input, ideal]` pairs.
    Rows { rows: Vec<(Vec<f64>, Vec<f64>)> },
}

impl DatasetSpec {
    /// Loads the dataset into memory.
    pub fn load(&self) -> Result<InMemoryDataset, DataErr> {
        match self {
            Self::Inline {
                data,
                x_size,
                y_size,
            } => InMemoryDataset::new(data.clone(), *x_size, *y_size),
            Self::Rows { rows } => InMemoryDataset::from_rows(rows.iter().map(|(x, y)| (x, y))),
        }
    }
}
