use std::{num::NonZeroUsize, sync::Arc, thread};

use log::{debug, info, trace, warn};
use machine_learning::{Dataset, FlatNetwork, MlErr};
use parameter_server::{
    optimization::Optimizer,
    storage::{GradientAccumulator, ParameterStore},
};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use worker::{BackpropWorker, CancelToken, GradientWorker, partition};

use crate::error::{ConfigErr, Result, TrainErr};

/// The amount of parameters per shard when none is given.
pub const DEFAULT_SHARD_SIZE: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// How the training work is laid out.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// The amount of gradient workers, each gets its own thread.
    pub workers: usize,

    /// The maximum amount of parameters updated together by one optimizer.
    pub shard_size: NonZeroUsize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            shard_size: DEFAULT_SHARD_SIZE,
        }
    }
}

/// Runs synchronous batch training over a pool of gradient workers.
///
/// Every iteration is one full pass over the dataset: the workers compute their partial
/// gradients concurrently, these are summed, the optimizer is applied to the master copy
/// of the weights and then these are copied back into every worker.
pub struct Coordinator<O: Optimizer> {
    store: ParameterStore<O>,
    accumulator: GradientAccumulator,
    workers: Vec<Box<dyn GradientWorker>>,
    pool: ThreadPool,
    cancel: CancelToken,
    rows: usize,
    outputs: usize,
    error: Option<f64>,
    iterations: usize,
}

impl<O: Optimizer + Send> Coordinator<O> {
    /// Creates a new `Coordinator` with one `BackpropWorker` per range of rows.
    ///
    /// # Arguments
    /// * `network` - The network to train, its weights become the master weights.
    /// * `dataset` - The dataset shared among all workers.
    /// * `optimizer_factory` - Builds the optimizer of every parameter shard given its length.
    /// * `config` - The amount of workers and the shard size.
    ///
    /// # Errors
    /// A `TrainErr::Configuration` if the dataset is empty or doesn't fit the network,
    /// there are no workers or the thread pool can't be built.
    pub fn new<D, OF>(
        network: FlatNetwork,
        dataset: Arc<D>,
        optimizer_factory: OF,
        config: CoordinatorConfig,
    ) -> Result<Self>
    where
        D: Dataset + ?Sized + 'static,
        OF: FnMut(usize) -> O,
    {
        network.check_shape(&*dataset).map_err(|e| match e {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => TrainErr::Configuration(ConfigErr::Shape {
                what,
                got,
                expected,
            }),
            e => e.into(),
        })?;

        let ranges = partition(dataset.len(), config.workers)?;
        let cancel = CancelToken::new();

        let workers = ranges
            .into_iter()
            .enumerate()
            .map(|(id, range)| {
                let worker = BackpropWorker::new(
                    id,
                    network.clone(),
                    Arc::clone(&dataset),
                    range,
                    cancel.clone(),
                );

                Box::new(worker) as Box<dyn GradientWorker>
            })
            .collect();

        let params = network.params().to_vec();
        let store = ParameterStore::new(params, config.shard_size, optimizer_factory);
        Self::from_workers(store, workers, dataset.len(), network.output_size(), cancel)
    }

    /// Creates a new `Coordinator` from already built workers.
    ///
    /// # Arguments
    /// * `store` - The master weights and their optimizers.
    /// * `workers` - The workers, their ranges must cover every row exactly once.
    /// * `rows` - The amount of rows in the dataset.
    /// * `outputs` - The amount of output neurons of the network.
    /// * `cancel` - The token the workers observe.
    ///
    /// # Errors
    /// A `TrainErr` if there are no rows or workers, the pool can't be built or a worker
    /// rejects the master weights.
    pub fn from_workers(
        store: ParameterStore<O>,
        mut workers: Vec<Box<dyn GradientWorker>>,
        rows: usize,
        outputs: usize,
        cancel: CancelToken,
    ) -> Result<Self> {
        if rows == 0 {
            return Err(ConfigErr::NoRows.into());
        }

        if workers.is_empty() {
            return Err(ConfigErr::NoWorkers.into());
        }

        check_coverage(&workers, rows)?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.len())
            .thread_name(|i| format!("gradient-worker-{i}"))
            .build()
            .map_err(ConfigErr::ThreadPool)?;

        for worker in workers.iter_mut() {
            worker.sync_params(store.params())?;
        }

        info!(
            workers = workers.len(),
            rows = rows,
            weights = store.len();
            "coordinator ready"
        );

        Ok(Self {
            accumulator: GradientAccumulator::new(store.len()),
            store,
            workers,
            pool,
            cancel,
            rows,
            outputs,
            error: None,
            iterations: 0,
        })
    }

    /// Runs a single training iteration.
    ///
    /// # Returns
    /// The root mean squared error of the pass, computed with the weights as they were
    /// before this iteration's update.
    ///
    /// # Errors
    /// The first error found by any worker, an `IncompletePass` if the workers didn't cover
    /// every row or a `NonFiniteGradient`. On error neither the weights nor the optimizer
    /// state are modified.
    pub fn iteration(&mut self) -> Result<f64> {
        self.accumulator.reset();

        let iteration = self.iterations;
        let accumulator = &self.accumulator;
        let workers = &mut self.workers;

        let pass = self.pool.install(|| {
            workers.par_iter_mut().try_for_each(|worker| {
                let gradient = worker.run()?;
                let stats = gradient.stats();
                accumulator.accumulate(gradient.values(), stats.rows, stats.squared_error)?;
                Ok::<_, TrainErr>(())
            })
        });

        if let Err(e) = pass {
            warn!(iteration = iteration; "aborting iteration: {e}");
            return Err(e);
        }

        let totals = self.accumulator.totals();
        if totals.rows != self.rows {
            return Err(TrainErr::IncompletePass {
                got: totals.rows,
                expected: self.rows,
            });
        }

        if !totals.squared_error.is_finite() || !totals.grad.iter().all(|g| g.is_finite()) {
            warn!(iteration = iteration; "aborting iteration: non finite gradient");
            return Err(TrainErr::NonFiniteGradient);
        }

        let error = (totals.squared_error / (self.rows * self.outputs) as f64).sqrt();
        self.store.update_params(&mut totals.grad)?;
        self.broadcast()?;

        self.iterations += 1;
        self.error = Some(error);
        debug!(iteration = self.iterations, error = error; "iteration done");
        Ok(error)
    }

    /// Copies the master weights into every worker.
    fn broadcast(&mut self) -> Result<()> {
        let params = self.store.params();
        let workers = &mut self.workers;

        trace!(workers = workers.len(); "broadcasting weights");
        self.pool.install(|| {
            workers
                .par_iter_mut()
                .try_for_each(|worker| worker.sync_params(params))
        })?;

        Ok(())
    }
}

/// Checks that the workers' ranges split `[0, rows)` into non empty, disjoint and
/// contiguous ranges.
fn check_coverage(workers: &[Box<dyn GradientWorker>], rows: usize) -> Result<()> {
    let mut ranges: Vec<_> = workers.iter().map(|w| (w.id(), w.range())).collect();
    ranges.sort_by_key(|(_, range)| (range.low, range.high));

    let mut next = 0;
    for &(worker, range) in &ranges {
        if range.high <= range.low || range.low != next || range.high > rows {
            return Err(ConfigErr::Coverage { worker, range, rows }.into());
        }

        debug!(worker = worker, low = range.low, high = range.high; "worker range");
        next = range.high;
    }

    match ranges.last() {
        Some(&(worker, range)) if next != rows => {
            Err(ConfigErr::Coverage { worker, range, rows }.into())
        }
        _ => Ok(()),
    }
}

impl<O: Optimizer> Coordinator<O> {
    /// The error of the last successful iteration.
    pub fn error(&self) -> Option<f64> {
        self.error
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The master weights.
    pub fn params(&self) -> &[f64] {
        self.store.params()
    }

    /// The optimizer state of every parameter shard.
    pub fn optimizers(&self) -> &[O] {
        self.store.optimizers()
    }

    pub fn store(&self) -> &ParameterStore<O> {
        &self.store
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// A token that cancels the running and every future iteration.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::{ActFn, InMemoryDataset, LayerDesc};
    use parameter_server::optimization::Manhattan;

    use super::*;

    fn linear_setup(workers: usize) -> Coordinator<Manhattan> {
        let layers = [LayerDesc::input(1), LayerDesc::new(1, ActFn::Linear)];
        let network = FlatNetwork::new(&layers, Some(vec![0., 0.])).unwrap();
        let dataset = InMemoryDataset::new(vec![1., 2., 2., 4., 3., 6.], 1, 1).unwrap();
        let config = CoordinatorConfig {
            workers,
            shard_size: NonZeroUsize::new(1).unwrap(),
        };

        Coordinator::new(network, Arc::new(dataset), |_| Manhattan::new(0.5), config).unwrap()
    }

    #[test]
    fn manhattan_step() {
        let mut coordinator = linear_setup(2);
        assert_eq!(coordinator.worker_count(), 2);
        assert_eq!(coordinator.optimizers().len(), 2);
        assert_eq!(coordinator.error(), None);

        // every output is 0, the ideal values are 2, 4 and 6
        let error = coordinator.iteration().unwrap();
        assert!((error - (56f64 / 3.).sqrt()).abs() < 1e-12);
        assert_eq!(coordinator.params(), &[0.5, 0.5]);
        assert_eq!(coordinator.iterations(), 1);
        assert_eq!(coordinator.error(), Some(error));
    }

    #[test]
    fn workers_collapse_to_rows() {
        let coordinator = linear_setup(16);
        assert_eq!(coordinator.worker_count(), 3);
        assert_eq!(coordinator.rows(), 3);
    }

    #[test]
    fn configuration_errors() {
        let layers = [LayerDesc::input(2), LayerDesc::new(1, ActFn::Linear)];
        let network = FlatNetwork::new(&layers, None).unwrap();
        let dataset = Arc::new(InMemoryDataset::new(vec![1., 2.], 1, 1).unwrap());

        let shape = Coordinator::new(
            network.clone(),
            Arc::clone(&dataset),
            |_| Manhattan::new(0.1),
            CoordinatorConfig::default(),
        );
        assert!(matches!(
            shape,
            Err(TrainErr::Configuration(ConfigErr::Shape { got: 1, expected: 2, .. }))
        ));

        let dataset = Arc::new(InMemoryDataset::new(vec![1., 2., 3.], 2, 1).unwrap());
        let config = CoordinatorConfig {
            workers: 0,
            ..Default::default()
        };
        let no_workers = Coordinator::new(network, dataset, |_| Manhattan::new(0.1), config);
        assert!(matches!(
            no_workers,
            Err(TrainErr::Configuration(ConfigErr::NoWorkers))
        ));
    }
}
