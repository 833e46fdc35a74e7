use std::{error::Error, fmt};

use machine_learning::{DataErr, MlErr};
use parameter_server::{initialization::RandErr, storage::SizeMismatchErr};
use rayon::ThreadPoolBuildError;
use worker::{WorkRange, WorkerErr};

/// The orchestrator module's result type.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// Problems with the training setup, all of them are found at construction.
#[derive(Debug)]
pub enum ConfigErr {
    NoRows,
    NoWorkers,
    Shape {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    UnknownActFn {
        tag: String,
    },
    Distribution(RandErr),
    ThreadPool(ThreadPoolBuildError),
    Dataset(DataErr),

    /// The workers' ranges don't cover every row exactly once.
    Coverage {
        worker: usize,
        range: WorkRange,
        rows: usize,
    },
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRows => write!(f, "the dataset has no rows"),
            Self::NoWorkers => write!(f, "at least one worker is required"),
            Self::Shape {
                what,
                got,
                expected,
            } => write!(f, "{what} has size {got} but {expected} was expected"),
            Self::UnknownActFn { tag } => write!(f, "unknown activation function {tag:?}"),
            Self::Distribution(e) => write!(f, "invalid initialization: {e}"),
            Self::ThreadPool(e) => write!(f, "failed to build the worker pool: {e}"),
            Self::Dataset(e) => write!(f, "invalid dataset: {e}"),
            Self::Coverage {
                worker,
                range,
                rows,
            } => write!(
                f,
                "worker {worker} has rows {}..{}, the workers must split 0..{rows} without gaps or overlaps",
                range.low, range.high
            ),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Distribution(e) => Some(e),
            Self::ThreadPool(e) => Some(e),
            Self::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

/// All errors that can occur while setting up or running training.
#[derive(Debug)]
pub enum TrainErr {
    /// The network's topology is invalid.
    Structural(MlErr),

    /// The training setup is invalid.
    Configuration(ConfigErr),

    /// A worker found a non finite value, nothing was committed.
    Arithmetic(WorkerErr),

    /// The aggregated gradient or error is not finite, nothing was committed.
    NonFiniteGradient,

    /// A worker failed to read a row, nothing was committed.
    Data(WorkerErr),

    /// Training was cancelled, nothing was committed.
    Cancelled(WorkerErr),

    /// A worker failed for any other reason.
    Worker(WorkerErr),

    /// A gradient didn't match the parameters' length.
    Storage(SizeMismatchErr),

    /// The workers didn't report every row exactly once.
    IncompletePass { got: usize, expected: usize },
}

impl TrainErr {
    /// Whether retrying with other parameters may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Arithmetic(_) | Self::NonFiniteGradient)
    }
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(e) => write!(f, "invalid network: {e}"),
            Self::Configuration(e) => write!(f, "invalid configuration: {e}"),
            Self::Arithmetic(e) => write!(f, "arithmetic error: {e}"),
            Self::NonFiniteGradient => write!(f, "the aggregated gradient is not finite"),
            Self::Data(e) => write!(f, "data error: {e}"),
            Self::Cancelled(e) => write!(f, "cancelled: {e}"),
            Self::Worker(e) => write!(f, "worker error: {e}"),
            Self::Storage(e) => write!(f, "storage error: {e}"),
            Self::IncompletePass { got, expected } => {
                write!(f, "the workers reported {got} rows out of {expected}")
            }
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Structural(e) => Some(e),
            Self::Configuration(e) => Some(e),
            Self::Arithmetic(e) | Self::Data(e) | Self::Cancelled(e) | Self::Worker(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigErr> for TrainErr {
    fn from(value: ConfigErr) -> Self {
        Self::Configuration(value)
    }
}

impl From<MlErr> for TrainErr {
    fn from(value: MlErr) -> Self {
        match value {
            MlErr::UnknownActFn { tag } => Self::Configuration(ConfigErr::UnknownActFn { tag }),
            MlErr::Data(e) => Self::Configuration(ConfigErr::Dataset(e)),
            e => Self::Structural(e),
        }
    }
}

impl From<WorkerErr> for TrainErr {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::NoRows => Self::Configuration(ConfigErr::NoRows),
            WorkerErr::NoWorkers => Self::Configuration(ConfigErr::NoWorkers),
            e @ WorkerErr::Arithmetic { .. } => Self::Arithmetic(e),
            e @ WorkerErr::Data { .. } => Self::Data(e),
            e @ WorkerErr::Cancelled { .. } => Self::Cancelled(e),
            e => Self::Worker(e),
        }
    }
}

impl From<SizeMismatchErr> for TrainErr {
    fn from(value: SizeMismatchErr) -> Self {
        Self::Storage(value)
    }
}

impl From<RandErr> for TrainErr {
    fn from(value: RandErr) -> Self {
        Self::Configuration(ConfigErr::Distribution(value))
    }
}

impl From<DataErr> for TrainErr {
    fn from(value: DataErr) -> Self {
        Self::Configuration(ConfigErr::Dataset(value))
    }
}
