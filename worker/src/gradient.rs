use crate::{Result, StepStats, WorkRange};

/// The result of a worker's pass over its range.
#[derive(Debug, Clone, Copy)]
pub struct Gradient<'a> {
    values: &'a [f64],
    stats: StepStats,
}

impl<'a> Gradient<'a> {
    pub fn new(values: &'a [f64], stats: StepStats) -> Self {
        Self { values, stats }
    }

    /// The gradient of every weight, summed over the worker's rows.
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }
}

/// Computes the gradient of the network over a fixed range of rows.
///
/// Alternate implementations (accelerators, remote workers, test doubles) plug into the
/// coordinator through this trait.
pub trait GradientWorker: Send {
    /// An identifier used for observability.
    fn id(&self) -> usize;

    /// The rows this worker is responsible for.
    fn range(&self) -> WorkRange;

    /// Makes a full pass over the worker's range.
    ///
    /// # Returns
    /// The gradient and stats of the pass, or the first error found. A failing worker
    /// must not report anything.
    fn run(&mut self) -> Result<Gradient<'_>>;

    /// Replaces the worker's copy of the weights.
    ///
    /// # Errors
    /// An error if `params` doesn't have the network's amount of weights.
    fn sync_params(&mut self, params: &[f64]) -> Result<()>;
}
