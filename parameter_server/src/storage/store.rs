use std::num::NonZeroUsize;

use log::trace;
use rayon::prelude::*;

use super::{Result, SizeMismatchErr};
use crate::optimization::Optimizer;

/// Owns the master copy of the model's parameters.
///
/// The parameters are split in shards of at most `shard_size` values, each with its own
/// optimizer, so that updates can be applied to every shard in parallel.
#[derive(Debug)]
pub struct ParameterStore<O: Optimizer> {
    params: Box<[f64]>,
    optimizers: Box<[O]>,
    shard_size: NonZeroUsize,
}

impl<O: Optimizer> ParameterStore<O> {
    /// Creates a new `ParameterStore`.
    ///
    /// # Arguments
    /// * `params` - The initial state of the parameters.
    /// * `shard_size` - The maximum amount of parameters per shard.
    /// * `optimizer_factory` - Builds the optimizer of a shard given its length.
    ///
    /// # Returns
    /// A new `ParameterStore` instance.
    pub fn new<OF>(params: Vec<f64>, shard_size: NonZeroUsize, mut optimizer_factory: OF) -> Self
    where
        OF: FnMut(usize) -> O,
    {
        let optimizers = params
            .chunks(shard_size.get())
            .map(|shard| optimizer_factory(shard.len()))
            .collect();

        Self {
            params: params.into_boxed_slice(),
            optimizers,
            shard_size,
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn shard_size(&self) -> NonZeroUsize {
        self.shard_size
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// The optimizer of every shard, in parameter order.
    pub fn optimizers(&self) -> &[O] {
        &self.optimizers
    }
}

impl<O: Optimizer + Send> ParameterStore<O> {
    /// Applies `grad` to the parameters through every shard's optimizer and zeroes it.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `grad` isn't as long as the store, in which case nothing
    /// is modified.
    pub fn update_params(&mut self, grad: &mut [f64]) -> Result<()> {
        SizeMismatchErr::check(grad.len(), self.params.len())?;

        let shard_size = self.shard_size.get();
        trace!(shards = self.optimizers.len(), shard_size = shard_size; "updating parameters");

        self.params
            .par_chunks_mut(shard_size)
            .zip(grad.par_chunks_mut(shard_size))
            .zip(self.optimizers.par_iter_mut())
            .try_for_each(|((params, grad), optimizer)| optimizer.update_params(grad, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AddOptimizer;

    impl Optimizer for AddOptimizer {
        fn delta(&mut self, _idx: usize, grad: f64) -> f64 {
            grad
        }
    }

    fn create_test_store(params: usize, shard_size: usize) -> ParameterStore<AddOptimizer> {
        let shard_size = NonZeroUsize::new(shard_size).unwrap();
        ParameterStore::new(vec![0.; params], shard_size, |_| AddOptimizer)
    }

    #[test]
    fn test_handle_ragged_shards() {
        const PARAMS: usize = 15;
        const SHARD_SIZE: usize = 8;

        let mut store = create_test_store(PARAMS, SHARD_SIZE);
        assert_eq!(store.optimizers().len(), 2);

        let mut grad = [1.0; PARAMS];
        store.update_params(&mut grad).unwrap();
        assert_eq!(grad, [0.0; PARAMS]);

        assert_eq!(store.params(), &[1.0; PARAMS]);
    }

    #[test]
    fn test_shard_lengths() {
        let mut lens = Vec::new();
        let shard_size = NonZeroUsize::new(10).unwrap();
        let _ = ParameterStore::new(vec![0.; 105], shard_size, |len| {
            lens.push(len);
            AddOptimizer
        });

        assert_eq!(lens.len(), 11);
        assert_eq!(lens.last(), Some(&5));
        assert!(lens[..10].iter().all(|&len| len == 10));
    }

    #[test]
    fn test_size_mismatch_leaves_params() {
        let mut store = create_test_store(4, 3);

        assert!(store.update_params(&mut [1.0; 3]).is_err());
        assert_eq!(store.params(), &[0.0; 4]);
    }
}
