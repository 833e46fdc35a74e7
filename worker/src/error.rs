use std::{error::Error, fmt};

use machine_learning::{DataErr, MlErr};

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Failures while partitioning work or computing a gradient.
#[derive(Debug)]
pub enum WorkerErr {
    /// There are no rows to split.
    NoRows,

    /// The rows were to be split among zero workers.
    NoWorkers,

    /// A neuron output, delta or row error stopped being finite. `layer` follows the
    /// network's internal indexing, where `0` is the output layer.
    Arithmetic {
        worker: usize,
        row: usize,
        layer: usize,
    },

    /// The dataset failed to provide a row.
    Data {
        worker: usize,
        row: usize,
        source: DataErr,
    },

    /// The worker observed a cancellation request before reading `row`.
    Cancelled { worker: usize, row: usize },

    /// The network rejected an operation, usually because of a size mismatch.
    Ml(MlErr),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::NoRows => write!(f, "there are no rows to train on"),
            WorkerErr::NoWorkers => write!(f, "at least one worker is required"),
            WorkerErr::Arithmetic { worker, row, layer } => write!(
                f,
                "worker {worker} got a non finite value at row {row} in layer {layer}"
            ),
            WorkerErr::Data {
                worker,
                row,
                source,
            } => write!(f, "worker {worker} failed to read row {row}: {source}"),
            WorkerErr::Cancelled { worker, row } => {
                write!(f, "worker {worker} was cancelled before row {row}")
            }
            WorkerErr::Ml(e) => write!(f, "network error: {e}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Data { source, .. } => Some(source),
            WorkerErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for WorkerErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}
