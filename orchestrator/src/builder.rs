use std::sync::Arc;

use log::debug;
use machine_learning::{
    FlatNetwork, InMemoryDataset, LayerDesc,
    arch::{activations::registry, param_count},
};
use parameter_server::{
    initialization::{ConstParamGen, ParamGen, RandParamGen},
    optimization::{Manhattan, Momentum, Optimizer, Rprop, RpropConfig},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Coordinator, CoordinatorConfig, Trainer,
    error::{ConfigErr, Result},
    specs::{DistributionSpec, LayerSpec, ParamGenSpec, StrategySpec, TrainerSpec},
};

/// Makes `callback`'s argument generic over the concrete `RandParamGen` built for the
/// given distribution, so the rest of the build is statically dispatched.
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `dist_spec` - A specification for a distribution.
/// * `limit` - The limit of parameters that the `RandParamGen` can generate.
/// * `callback` - The closure to call passing in the created parameter generator.
macro_rules! with_distribution {
    ($rng:expr, $dist_spec:expr, $limit:expr, $callback:expr) => {
        match $dist_spec {
            DistributionSpec::Uniform { low, high } => {
                let param_gen = RandParamGen::uniform($rng, $limit, low, high)?;
                ($callback)(param_gen)
            }
            DistributionSpec::UniformInclusive { low, high } => {
                let param_gen = RandParamGen::uniform_inclusive($rng, $limit, low, high)?;
                ($callback)(param_gen)
            }
            DistributionSpec::XavierUniform { fan_in, fan_out } => {
                let param_gen = RandParamGen::xavier_uniform($rng, $limit, fan_in, fan_out)?;
                ($callback)(param_gen)
            }
            DistributionSpec::LecunUniform { fan_in } => {
                let param_gen = RandParamGen::lecun_uniform($rng, $limit, fan_in)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Normal { mean, std_dev } => {
                let param_gen = RandParamGen::normal($rng, $limit, mean, std_dev)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Kaiming { fan_in } => {
                let param_gen = RandParamGen::kaiming($rng, $limit, fan_in)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Xavier { fan_in, fan_out } => {
                let param_gen = RandParamGen::xavier($rng, $limit, fan_in, fan_out)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Lecun { fan_in } => {
                let param_gen = RandParamGen::lecun($rng, $limit, fan_in)?;
                ($callback)(param_gen)
            }
        }
    };
}

/// Builds `Trainer`s given a specification.
#[derive(Debug, Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification of the training session.
    ///
    /// # Returns
    /// A new trainer or a `TrainErr` if the specification is invalid.
    pub fn build(&self, spec: &TrainerSpec) -> Result<Box<dyn Trainer>> {
        let layers = self.resolve_layers(&spec.layers)?;
        FlatNetwork::validate(&layers)?;

        let dataset = Arc::new(spec.dataset.load()?);
        self.resolve_param_gen(spec, &layers, dataset)
    }

    /// Resolves every layer's activation function through the registry.
    fn resolve_layers(&self, specs: &[LayerSpec]) -> Result<Vec<LayerDesc>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| -> Result<LayerDesc> {
                let is_input = i == 0;
                let tag = match &spec.act_fn {
                    Some(tag) => tag.as_str(),
                    None if is_input => "linear",
                    None => "sigmoid",
                };

                Ok(LayerDesc {
                    neurons: spec.neurons,
                    act_fn: registry::resolve(tag)?,
                    bias: spec.bias.unwrap_or(!is_input),
                })
            })
            .collect()
    }

    /// Generates a random number generator given (or not) a seed.
    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Resolves the `ParamGen` that creates the initial weights.
    fn resolve_param_gen(
        &self,
        spec: &TrainerSpec,
        layers: &[LayerDesc],
        dataset: Arc<InMemoryDataset>,
    ) -> Result<Box<dyn Trainer>> {
        let sizes: Vec<_> = layers.iter().rev().map(|l| l.neurons).collect();
        let limit = param_count(&sizes);

        match spec.param_gen.clone().unwrap_or_default() {
            ParamGenSpec::Const { value } => {
                let param_gen = ConstParamGen::new(value, limit);
                self.resolve_network(spec, layers, limit, dataset, param_gen)
            }
            ParamGenSpec::Rand { distribution } => {
                let rng = self.generate_rng(spec.seed);
                with_distribution!(rng, distribution, limit, |param_gen| {
                    self.resolve_network(spec, layers, limit, dataset, param_gen)
                })
            }
            ParamGenSpec::Explicit { params } => {
                let network = FlatNetwork::new(layers, Some(params))?;
                self.resolve_strategy(spec, network, dataset)
            }
        }
    }

    /// Builds the network with `limit` weights drawn from `param_gen`.
    fn resolve_network<PG: ParamGen>(
        &self,
        spec: &TrainerSpec,
        layers: &[LayerDesc],
        limit: usize,
        dataset: Arc<InMemoryDataset>,
        mut param_gen: PG,
    ) -> Result<Box<dyn Trainer>> {
        let params = param_gen.sample_exact(limit).ok_or(ConfigErr::Shape {
            what: "initial params",
            got: 0,
            expected: limit,
        })?;

        let network = FlatNetwork::new(layers, Some(params))?;
        self.resolve_strategy(spec, network, dataset)
    }

    /// Resolves the weight update strategy.
    fn resolve_strategy(
        &self,
        spec: &TrainerSpec,
        network: FlatNetwork,
        dataset: Arc<InMemoryDataset>,
    ) -> Result<Box<dyn Trainer>> {
        match spec.strategy {
            StrategySpec::Backprop {
                learning_rate,
                momentum,
            } => {
                let factory = |len| Momentum::new(len, learning_rate, momentum);
                self.terminate_build(spec, network, dataset, factory)
            }
            StrategySpec::Rprop(rprop) => {
                let config = RpropConfig::from(rprop);
                let factory = |len| Rprop::new(len, config);
                self.terminate_build(spec, network, dataset, factory)
            }
            StrategySpec::Manhattan {
                learning_rate,
                zero_tolerance,
            } => {
                let factory = |_| Manhattan::with_tolerance(learning_rate, zero_tolerance);
                self.terminate_build(spec, network, dataset, factory)
            }
        }
    }

    /// Terminates the build and instanciates the coordinator.
    fn terminate_build<O, OF>(
        &self,
        spec: &TrainerSpec,
        network: FlatNetwork,
        dataset: Arc<InMemoryDataset>,
        optimizer_factory: OF,
    ) -> Result<Box<dyn Trainer>>
    where
        O: Optimizer + Send + 'static,
        OF: FnMut(usize) -> O,
    {
        let defaults = CoordinatorConfig::default();
        let config = CoordinatorConfig {
            workers: spec.workers.unwrap_or(defaults.workers),
            shard_size: spec.shard_size.unwrap_or(defaults.shard_size),
        };

        debug!(workers = config.workers, shard_size = config.shard_size.get(); "building coordinator");
        let coordinator = Coordinator::new(network, dataset, optimizer_factory, config)?;
        Ok(Box::new(coordinator))
    }
}
