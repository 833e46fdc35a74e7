use log::debug;
use ndarray::{ArrayView2, ArrayViewMut2};
use rand::Rng;

use super::{LayerDesc, activations::ActFn, param_count};
use crate::{
    dataset::{DataErr, Dataset},
    error::{MlErr, Result},
};

/// A feedforward network flattened into a handful of contiguous buffers.
///
/// Layers are indexed from the output layer (`0`) to the input layer (`layer_count() - 1`).
/// The block of weights feeding layer `i` from layer `i + 1` starts at `weight_index[i]`,
/// inside it every destination neuron owns `sizes[i + 1] + 1` consecutive slots: its bias
/// followed by one weight per source neuron. The input layer lives at the tail of the
/// outputs buffer.
#[derive(Clone, Debug)]
pub struct FlatNetwork {
    sizes: Box<[usize]>,
    layer_index: Box<[usize]>,
    weight_index: Box<[usize]>,
    act_fns: Box<[ActFn]>,
    params: Box<[f64]>,
    outputs: Box<[f64]>,
}

impl FlatNetwork {
    /// Creates a new `FlatNetwork`.
    ///
    /// # Arguments
    /// * `layers` - The layer descriptions ordered from the input to the output layer.
    /// * `params` - The initial weights, if `None` they are drawn uniformly from `[-1, 1)`.
    ///
    /// # Errors
    /// An `MlErr` if the topology is invalid or `params` has the wrong length.
    pub fn new(layers: &[LayerDesc], params: Option<Vec<f64>>) -> Result<Self> {
        Self::validate(layers)?;

        let sizes: Box<[usize]> = layers.iter().rev().map(|l| l.neurons).collect();
        let act_fns: Box<[ActFn]> = layers.iter().rev().map(|l| l.act_fn).collect();
        let total = param_count(&sizes);

        let params = match params {
            Some(params) if params.len() != total => {
                return Err(MlErr::SizeMismatch {
                    what: "params",
                    got: params.len(),
                    expected: total,
                });
            }
            Some(params) => params.into_boxed_slice(),
            None => {
                let mut rng = rand::rng();
                (0..total).map(|_| rng.random_range(-1.0..1.0)).collect()
            }
        };

        let layer_index: Box<[usize]> = sizes
            .iter()
            .scan(0, |acc, &size| {
                let start = *acc;
                *acc += size;
                Some(start)
            })
            .collect();

        let mut weight_index = vec![0; sizes.len()];
        for i in 1..sizes.len() {
            weight_index[i] = weight_index[i - 1] + sizes[i - 1] * (sizes[i] + 1);
        }

        let outputs = vec![0.; sizes.iter().sum()].into_boxed_slice();
        debug!(layers = sizes.len(), params = total; "built flat network");

        Ok(Self {
            sizes,
            layer_index,
            weight_index: weight_index.into_boxed_slice(),
            act_fns,
            params,
            outputs,
        })
    }

    /// Checks that `layers` describe a valid feedforward network.
    ///
    /// # Errors
    /// An `MlErr` naming the first offending layer, counting from the input layer.
    pub fn validate(layers: &[LayerDesc]) -> Result<()> {
        if layers.len() < 2 {
            return Err(MlErr::TooFewLayers { got: layers.len() });
        }

        for (i, layer) in layers.iter().enumerate() {
            if layer.neurons == 0 {
                return Err(MlErr::EmptyLayer { layer: i });
            }

            if i > 0 && !layer.bias {
                return Err(MlErr::MissingBias { layer: i });
            }
        }

        Ok(())
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `input` - The input values, must be `input_size()` long.
    ///
    /// # Returns
    /// The output layer's values or an error if the input has the wrong size or a
    /// neuron output is not finite.
    pub fn compute(&mut self, input: &[f64]) -> Result<&[f64]> {
        let input_size = self.input_size();
        if input.len() != input_size {
            return Err(MlErr::SizeMismatch {
                what: "input",
                got: input.len(),
                expected: input_size,
            });
        }

        let tail = self.outputs.len() - input_size;
        self.outputs[tail..].copy_from_slice(input);

        for layer in (0..self.layer_count() - 1).rev() {
            self.compute_layer(layer)?;
        }

        Ok(&self.outputs[..self.sizes[0]])
    }

    /// Computes the outputs of `layer` from the outputs of `layer + 1`.
    fn compute_layer(&mut self, layer: usize) -> Result<()> {
        let Self {
            sizes,
            layer_index,
            weight_index,
            act_fns,
            params,
            outputs,
        } = self;

        let src_start = layer_index[layer + 1];
        let (head, tail) = outputs.split_at_mut(src_start);
        let dst = &mut head[layer_index[layer]..layer_index[layer] + sizes[layer]];
        let src = &tail[..sizes[layer + 1]];

        let act_fn = &act_fns[layer];
        let block = &params[weight_index[layer]..weight_index[layer + 1]];

        for (out, row) in dst.iter_mut().zip(block.chunks_exact(src.len() + 1)) {
            let z = row
                .iter()
                .skip(1)
                .zip(src)
                .fold(row[0], |acc, (w, x)| acc + w * x);

            *out = act_fn.f(z);
            if !out.is_finite() {
                return Err(MlErr::NonFinite { layer });
            }
        }

        Ok(())
    }

    /// Computes the root mean squared error of the network over an entire dataset.
    ///
    /// # Errors
    /// An `MlErr` if the dataset's shape doesn't match the network, it's empty or a
    /// row can't be read.
    pub fn calculate_error<D: Dataset + ?Sized>(&mut self, dataset: &D) -> Result<f64> {
        self.check_shape(dataset)?;
        if dataset.is_empty() {
            return Err(DataErr::Empty.into());
        }

        let mut x = vec![0.; dataset.x_size()];
        let mut y = vec![0.; dataset.y_size()];
        let mut sse = 0.;

        for row in 0..dataset.len() {
            dataset.read_row(row, &mut x, &mut y)?;
            let out = self.compute(&x)?;
            sse += out
                .iter()
                .zip(&y)
                .map(|(a, ideal)| (ideal - a).powi(2))
                .sum::<f64>();
        }

        Ok((sse / (dataset.len() * self.output_size()) as f64).sqrt())
    }

    /// Checks that rows of `dataset` can be fed to this network.
    pub fn check_shape<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<()> {
        if dataset.x_size() != self.input_size() {
            return Err(MlErr::SizeMismatch {
                what: "dataset input",
                got: dataset.x_size(),
                expected: self.input_size(),
            });
        }

        if dataset.y_size() != self.output_size() {
            return Err(MlErr::SizeMismatch {
                what: "dataset ideal",
                got: dataset.y_size(),
                expected: self.output_size(),
            });
        }

        Ok(())
    }

    pub fn layer_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn input_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    pub fn output_size(&self) -> usize {
        self.sizes[0]
    }

    /// Returns the amount of weights, biases included.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn layer_index(&self) -> &[usize] {
        &self.layer_index
    }

    pub fn weight_index(&self) -> &[usize] {
        &self.weight_index
    }

    pub fn act_fn(&self, layer: usize) -> &ActFn {
        &self.act_fns[layer]
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    /// Overwrites every weight of the network.
    ///
    /// # Errors
    /// `MlErr::SizeMismatch` if `params` doesn't have exactly `len()` values.
    pub fn set_params(&mut self, params: &[f64]) -> Result<()> {
        if params.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "params",
                got: params.len(),
                expected: self.params.len(),
            });
        }

        self.params.copy_from_slice(params);
        Ok(())
    }

    /// Returns the whole outputs buffer, output layer first.
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// Returns the outputs of the last forward pass for `layer`.
    pub fn layer_output(&self, layer: usize) -> &[f64] {
        let start = self.layer_index[layer];
        &self.outputs[start..start + self.sizes[layer]]
    }

    /// Gives a view of the weights feeding `layer`, one row per destination neuron.
    /// The first column holds the biases.
    ///
    /// # Errors
    /// `MlErr::SizeMismatch` if `layer` is the input layer or out of range.
    pub fn weight_block(&self, layer: usize) -> Result<ArrayView2<'_, f64>> {
        let (shape, start, end) = self.block_bounds(layer)?;

        ArrayView2::from_shape(shape, &self.params[start..end]).map_err(|_| MlErr::SizeMismatch {
            what: "weight block",
            got: end - start,
            expected: shape.0 * shape.1,
        })
    }

    /// Gives a view of the slice of `grad` parallel to `weight_block(layer)`.
    ///
    /// # Errors
    /// `MlErr::SizeMismatch` if `grad` isn't `len()` long or `layer` has no weights
    /// feeding it.
    pub fn grad_block<'a>(&self, grad: &'a mut [f64], layer: usize) -> Result<ArrayViewMut2<'a, f64>> {
        if grad.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: self.params.len(),
            });
        }

        let (shape, start, end) = self.block_bounds(layer)?;

        ArrayViewMut2::from_shape(shape, &mut grad[start..end]).map_err(|_| MlErr::SizeMismatch {
            what: "gradient block",
            got: end - start,
            expected: shape.0 * shape.1,
        })
    }

    /// The shape and parameter span of the block of weights feeding `layer`.
    fn block_bounds(&self, layer: usize) -> Result<((usize, usize), usize, usize)> {
        if layer + 1 >= self.layer_count() {
            return Err(MlErr::SizeMismatch {
                what: "weight block layer",
                got: layer,
                expected: self.layer_count() - 2,
            });
        }

        let shape = (self.sizes[layer], self.sizes[layer + 1] + 1);
        Ok((shape, self.weight_index[layer], self.weight_index[layer + 1]))
    }
}
