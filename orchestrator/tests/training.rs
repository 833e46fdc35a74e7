use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use machine_learning::{ActFn, FlatNetwork, InMemoryDataset, LayerDesc, MlErr};
use orchestrator::{
    ConfigErr, Coordinator, CoordinatorConfig, StopCondition, TrainErr, Trainer, TrainerBuilder,
    specs::TrainerSpec,
};
use parameter_server::{
    optimization::{Momentum, Rprop, RpropConfig, ZeroCrossing},
    storage::ParameterStore,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use worker::{
    BackpropWorker, CancelToken, Gradient, GradientWorker, StepStats, WorkRange, WorkerErr,
};

const XOR_PARAMS: [f64; 9] = [-1., 2., -2., -1., 2., 2., -3., 2., 2.];

fn xor_network() -> FlatNetwork {
    let layers = [
        LayerDesc::input(2),
        LayerDesc::new(2, ActFn::sigmoid(1.)),
        LayerDesc::new(1, ActFn::sigmoid(1.)),
    ];

    FlatNetwork::new(&layers, Some(XOR_PARAMS.to_vec())).unwrap()
}

fn xor_dataset() -> Arc<InMemoryDataset> {
    let rows = [
        ([0., 0.], [0.]),
        ([0., 1.], [1.]),
        ([1., 0.], [1.]),
        ([1., 1.], [0.]),
    ];

    Arc::new(InMemoryDataset::from_rows(rows).unwrap())
}

fn config(workers: usize, shard_size: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        workers,
        shard_size: NonZeroUsize::new(shard_size).unwrap(),
    }
}

fn xor_rprop(zero_crossing: ZeroCrossing) -> Coordinator<Rprop> {
    let rprop = RpropConfig {
        zero_crossing,
        ..Default::default()
    };

    let factory = |len| Rprop::new(len, rprop);
    Coordinator::new(xor_network(), xor_dataset(), factory, config(2, 4)).unwrap()
}

#[test]
fn xor_converges_with_rprop() {
    for zero_crossing in [ZeroCrossing::LastGradient, ZeroCrossing::StepSize] {
        let mut coordinator = xor_rprop(zero_crossing);
        let stop = StopCondition {
            max_iterations: 500,
            target_error: None,
        };

        let report = coordinator.train(&stop).unwrap();
        assert_eq!(report.iterations, 500);

        let error = report.error.unwrap();
        assert!(error < 0.1, "{zero_crossing:?}: rms error {error}");

        let mut trained = xor_network();
        trained.set_params(&report.params).unwrap();
        let final_error = trained.calculate_error(&*xor_dataset()).unwrap();
        assert!(final_error < 0.1, "{zero_crossing:?}: final rms error {final_error}");
    }
}

#[test]
fn target_error_stops_early() {
    let mut coordinator = xor_rprop(ZeroCrossing::StepSize);
    let stop = StopCondition {
        max_iterations: 500,
        target_error: Some(0.2),
    };

    let report = coordinator.train(&stop).unwrap();
    assert!(report.iterations < 500);
    assert!(report.error.unwrap() <= 0.2);
}

fn random_problem(seed: u64) -> (FlatNetwork, Arc<InMemoryDataset>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let layers = [
        LayerDesc::input(3),
        LayerDesc::new(5, ActFn::Tanh),
        LayerDesc::new(2, ActFn::sigmoid(1.)),
    ];

    let params = (0..32).map(|_| rng.random_range(-1.0..1.0)).collect();
    let network = FlatNetwork::new(&layers, Some(params)).unwrap();

    let data = (0..37 * 5).map(|_| rng.random_range(0.0..1.0)).collect();
    let dataset = InMemoryDataset::new(data, 3, 2).unwrap();

    (network, Arc::new(dataset))
}

#[test]
fn worker_count_does_not_change_the_result() {
    let (network, dataset) = random_problem(3);
    let factory = |len| Momentum::new(len, 0.1, 0.9);

    let mut reference =
        Coordinator::new(network.clone(), Arc::clone(&dataset), factory, config(1, 64)).unwrap();

    let mut others: Vec<_> = [(3, 4), (8, 5), (37, 27)]
        .into_iter()
        .map(|(workers, shard_size)| {
            let config = config(workers, shard_size);
            Coordinator::new(network.clone(), Arc::clone(&dataset), factory, config).unwrap()
        })
        .collect();

    for _ in 0..3 {
        let expected_error = reference.iteration().unwrap();

        for other in others.iter_mut() {
            let error = other.iteration().unwrap();
            assert!((error - expected_error).abs() <= 1e-9 * expected_error);

            for (a, b) in other.params().iter().zip(reference.params()) {
                assert!((a - b).abs() <= 1e-9 * b.abs().max(1.), "{a} != {b}");
            }
        }
    }
}

/// A worker that reports a constant gradient and fails on demand.
struct ScriptedWorker {
    id: usize,
    range: WorkRange,
    rows: usize,
    grad: Vec<f64>,
    params: Vec<f64>,
    fail: Arc<AtomicBool>,
}

impl ScriptedWorker {
    fn new(id: usize, range: WorkRange, grad: Vec<f64>, fail: &Arc<AtomicBool>) -> Self {
        Self {
            id,
            range,
            rows: range.len(),
            params: vec![0.; grad.len()],
            grad,
            fail: Arc::clone(fail),
        }
    }

    fn boxed(self) -> Box<dyn GradientWorker> {
        Box::new(self)
    }
}

impl GradientWorker for ScriptedWorker {
    fn id(&self) -> usize {
        self.id
    }

    fn range(&self) -> WorkRange {
        self.range
    }

    fn run(&mut self) -> worker::Result<Gradient<'_>> {
        if self.fail.load(Ordering::Acquire) {
            return Err(WorkerErr::Arithmetic {
                worker: self.id,
                row: self.range.low,
                layer: 0,
            });
        }

        Ok(Gradient::new(&self.grad, StepStats::new(self.rows, 1.)))
    }

    fn sync_params(&mut self, params: &[f64]) -> worker::Result<()> {
        if params.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "params",
                got: params.len(),
                expected: self.params.len(),
            }
            .into());
        }

        self.params.copy_from_slice(params);
        Ok(())
    }
}

/// Two scripted workers over four rows, the second one reports `second_rows` rows.
fn scripted_rprop(fail: &Arc<AtomicBool>, second_rows: usize) -> Coordinator<Rprop> {
    let store = ParameterStore::new(vec![0.; 3], NonZeroUsize::new(2).unwrap(), |len| {
        Rprop::new(len, RpropConfig::default())
    });

    let healthy = Arc::new(AtomicBool::new(false));
    let mut second = ScriptedWorker::new(1, WorkRange::new(2, 4), vec![1., -1., 0.5], fail);
    second.rows = second_rows;

    let workers = vec![
        ScriptedWorker::new(0, WorkRange::new(0, 2), vec![1., -1., 0.5], &healthy).boxed(),
        second.boxed(),
    ];

    Coordinator::from_workers(store, workers, 4, 1, CancelToken::new()).unwrap()
}

#[test]
fn failing_worker_commits_nothing() {
    let fail = Arc::new(AtomicBool::new(false));
    let mut coordinator = scripted_rprop(&fail, 2);

    for _ in 0..3 {
        coordinator.iteration().unwrap();
    }

    let params = coordinator.params().to_vec();
    let steps: Vec<_> = coordinator.optimizers().iter().map(|o| o.steps().to_vec()).collect();
    let last: Vec<_> = coordinator
        .optimizers()
        .iter()
        .map(|o| o.last_gradients().to_vec())
        .collect();
    let error = coordinator.error();

    fail.store(true, Ordering::Release);
    let result = coordinator.iteration();
    assert!(matches!(
        result,
        Err(TrainErr::Arithmetic(WorkerErr::Arithmetic { worker: 1, .. }))
    ));
    assert!(result.unwrap_err().is_retryable());

    assert_eq!(coordinator.params(), params.as_slice());
    assert_eq!(coordinator.iterations(), 3);
    assert_eq!(coordinator.error(), error);
    for (i, o) in coordinator.optimizers().iter().enumerate() {
        assert_eq!(o.steps(), steps[i].as_slice());
        assert_eq!(o.last_gradients(), last[i].as_slice());
    }

    fail.store(false, Ordering::Release);
    coordinator.iteration().unwrap();
    assert_eq!(coordinator.iterations(), 4);
}

#[test]
fn every_row_must_be_reported() {
    let fail = Arc::new(AtomicBool::new(false));
    let mut coordinator = scripted_rprop(&fail, 1);

    assert!(matches!(
        coordinator.iteration(),
        Err(TrainErr::IncompletePass { got: 3, expected: 4 })
    ));
    assert_eq!(coordinator.params(), &[0.; 3]);
}

#[test]
fn non_finite_aggregate_commits_nothing() {
    let store = ParameterStore::new(vec![0.; 2], NonZeroUsize::new(2).unwrap(), |len| {
        Momentum::new(len, 0.1, 0.)
    });

    let never = Arc::new(AtomicBool::new(false));
    let workers = vec![
        ScriptedWorker::new(0, WorkRange::new(0, 1), vec![f64::MAX, 0.], &never).boxed(),
        ScriptedWorker::new(1, WorkRange::new(1, 2), vec![f64::MAX, 0.], &never).boxed(),
    ];

    let mut coordinator =
        Coordinator::from_workers(store, workers, 2, 1, CancelToken::new()).unwrap();
    assert!(matches!(coordinator.iteration(), Err(TrainErr::NonFiniteGradient)));
    assert_eq!(coordinator.params(), &[0., 0.]);
}

fn momentum_store(len: usize) -> ParameterStore<Momentum> {
    ParameterStore::new(vec![0.; len], NonZeroUsize::new(len).unwrap(), |len| {
        Momentum::new(len, 0.5, 0.)
    })
}

#[test]
fn overlapping_ranges_are_rejected() {
    let layers = [LayerDesc::input(1), LayerDesc::new(1, ActFn::Linear)];
    let network = FlatNetwork::new(&layers, Some(vec![0., 0.])).unwrap();
    let data = vec![1., 1., 1., 1., 1., -100., 1., -100.];
    let dataset = Arc::new(InMemoryDataset::new(data, 1, 1).unwrap());
    let cancel = CancelToken::new();

    // both workers go through the first half twice, the lengths still add up to 4
    let workers: Vec<Box<dyn GradientWorker>> = (0..2)
        .map(|id| {
            let worker = BackpropWorker::new(
                id,
                network.clone(),
                Arc::clone(&dataset),
                WorkRange::new(0, 2),
                cancel.clone(),
            );

            Box::new(worker) as Box<dyn GradientWorker>
        })
        .collect();

    let result = Coordinator::from_workers(momentum_store(2), workers, 4, 1, cancel);
    assert!(matches!(
        result,
        Err(TrainErr::Configuration(ConfigErr::Coverage { rows: 4, .. }))
    ));
}

#[test]
fn ranges_must_split_every_row() {
    let never = Arc::new(AtomicBool::new(false));
    let build = |ranges: &[(usize, usize)], rows: usize| {
        let workers = ranges
            .iter()
            .enumerate()
            .map(|(id, &(low, high))| {
                ScriptedWorker::new(id, WorkRange::new(low, high), vec![0., 0.], &never).boxed()
            })
            .collect();

        Coordinator::from_workers(momentum_store(2), workers, rows, 1, CancelToken::new())
    };

    let coverage_worker = |result: orchestrator::Result<Coordinator<Momentum>>| match result {
        Err(TrainErr::Configuration(ConfigErr::Coverage { worker, .. })) => Some(worker),
        _ => None,
    };

    // gap
    assert_eq!(coverage_worker(build(&[(0, 1), (2, 4)], 4)), Some(1));
    // past the last row
    assert_eq!(coverage_worker(build(&[(0, 2), (2, 4)], 3)), Some(1));
    // rows left uncovered
    assert_eq!(coverage_worker(build(&[(0, 2)], 4)), Some(0));
    // empty range
    assert_eq!(coverage_worker(build(&[(0, 0), (0, 4)], 4)), Some(0));

    // the order of the workers doesn't matter
    let coordinator = build(&[(2, 4), (0, 2)], 4).unwrap();
    assert_eq!(coordinator.worker_count(), 2);
}

#[test]
fn cancellation_keeps_the_weights() {
    let mut coordinator = xor_rprop(ZeroCrossing::LastGradient);
    coordinator.iteration().unwrap();
    let params = coordinator.params().to_vec();

    coordinator.cancel_token().cancel();
    assert!(matches!(
        coordinator.iteration(),
        Err(TrainErr::Cancelled(WorkerErr::Cancelled { .. }))
    ));

    assert_eq!(coordinator.params(), params.as_slice());
    assert_eq!(coordinator.iterations(), 1);
}

#[test]
fn rprop_steps_stay_in_bounds() {
    let layers = [LayerDesc::input(1), LayerDesc::new(1, ActFn::Linear)];
    let network = FlatNetwork::new(&layers, Some(vec![0.3, -0.2])).unwrap();
    let dataset = InMemoryDataset::new(vec![0., 1., 1., 3., 2., 5., 3., 7.], 1, 1).unwrap();

    let rprop = RpropConfig {
        max_step: 0.5,
        min_step: 1e-3,
        ..Default::default()
    };

    let factory = |len| Rprop::new(len, rprop);
    let mut coordinator =
        Coordinator::new(network, Arc::new(dataset), factory, config(2, 1)).unwrap();

    for _ in 0..200 {
        coordinator.iteration().unwrap();

        for optimizer in coordinator.optimizers() {
            let bounds = rprop.min_step..=rprop.max_step;
            assert!(optimizer.steps().iter().all(|s| bounds.contains(s)));
        }
    }

    // y = 1 + 2x
    let params = coordinator.params();
    assert!((params[0] - 1.).abs() < 0.05 && (params[1] - 2.).abs() < 0.05, "{params:?}");
}

#[test]
fn builder_trains_from_json() {
    let json = r#"{
        "layers": [
            { "neurons": 2 },
            { "neurons": 2, "act_fn": "sigmoid" },
            { "neurons": 1, "act_fn": "sigmoid" }
        ],
        "strategy": { "rprop": { "zero_crossing": "step_size" } },
        "param_gen": { "explicit": { "params": [-1, 2, -2, -1, 2, 2, -3, 2, 2] } },
        "dataset": { "rows": { "rows": [[[0, 0], [0]], [[0, 1], [1]], [[1, 0], [1]], [[1, 1], [0]]] } },
        "workers": 3,
        "max_iterations": 500,
        "target_error": 0.05
    }"#;

    let spec: TrainerSpec = serde_json::from_str(json).unwrap();
    let mut trainer = TrainerBuilder::new().build(&spec).unwrap();
    let report = trainer.train(&spec.stop_condition()).unwrap();

    assert!(report.error.unwrap() <= 0.05);
    assert!(report.iterations < 500);
    assert_eq!(report.params, trainer.params());
}
