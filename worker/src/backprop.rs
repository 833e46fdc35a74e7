use std::sync::Arc;

use log::debug;
use machine_learning::{Dataset, FlatNetwork, MlErr};

use crate::{
    CancelToken, Gradient, GradientWorker, StepStats, WorkRange,
    error::{Result, WorkerErr},
};

/// A gradient worker that backpropagates every row of its range through a private
/// clone of the network.
pub struct BackpropWorker<D: Dataset + ?Sized> {
    id: usize,
    network: FlatNetwork,
    dataset: Arc<D>,
    range: WorkRange,
    cancel: CancelToken,
    grad: Box<[f64]>,
    deltas: Box<[f64]>,
    x: Box<[f64]>,
    y: Box<[f64]>,
}

impl<D: Dataset + ?Sized> BackpropWorker<D> {
    /// Creates a new `BackpropWorker`.
    ///
    /// # Arguments
    /// * `id` - Identifier used for observability.
    /// * `network` - The worker's own copy of the network.
    /// * `dataset` - The shared dataset.
    /// * `range` - The rows this worker goes through on every pass.
    /// * `cancel` - Checked before every row.
    pub fn new(
        id: usize,
        network: FlatNetwork,
        dataset: Arc<D>,
        range: WorkRange,
        cancel: CancelToken,
    ) -> Self {
        Self {
            id,
            grad: vec![0.; network.len()].into_boxed_slice(),
            deltas: vec![0.; network.outputs().len()].into_boxed_slice(),
            x: vec![0.; network.input_size()].into_boxed_slice(),
            y: vec![0.; network.output_size()].into_boxed_slice(),
            network,
            dataset,
            range,
            cancel,
        }
    }

    pub fn network(&self) -> &FlatNetwork {
        &self.network
    }
}

impl<D: Dataset + ?Sized> GradientWorker for BackpropWorker<D> {
    fn id(&self) -> usize {
        self.id
    }

    fn range(&self) -> WorkRange {
        self.range
    }

    fn run(&mut self) -> Result<Gradient<'_>> {
        let Self {
            id,
            network,
            dataset,
            range,
            cancel,
            grad,
            deltas,
            x,
            y,
        } = self;

        let worker = *id;
        let arithmetic = |row: usize, e: MlErr| match e {
            MlErr::NonFinite { layer } => WorkerErr::Arithmetic { worker, row, layer },
            e => WorkerErr::Ml(e),
        };

        grad.fill(0.);
        let mut squared_error = 0.;

        for row in range.rows() {
            if cancel.is_cancelled() {
                return Err(WorkerErr::Cancelled { worker, row });
            }

            dataset
                .read_row(row, x, y)
                .map_err(|source| WorkerErr::Data {
                    worker,
                    row,
                    source,
                })?;

            network.compute(x).map_err(|e| arithmetic(row, e))?;

            let act_fn = network.act_fn(0);
            let outputs = network.layer_output(0);

            for ((d, &actual), &ideal) in deltas.iter_mut().zip(outputs).zip(y.iter()) {
                let err = ideal - actual;
                *d = act_fn.df(actual) * err;
                squared_error += err * err;

                if !d.is_finite() {
                    return Err(WorkerErr::Arithmetic {
                        worker,
                        row,
                        layer: 0,
                    });
                }
            }

            for layer in 0..network.layer_count() - 1 {
                backprop_layer(network, grad, deltas, layer).map_err(|e| arithmetic(row, e))?;
            }
        }

        if !squared_error.is_finite() {
            return Err(WorkerErr::Arithmetic {
                worker,
                row: range.high - 1,
                layer: 0,
            });
        }

        if let Some(idx) = grad.iter().position(|g| !g.is_finite()) {
            let layer = network
                .weight_index()
                .iter()
                .rposition(|&start| start <= idx)
                .unwrap_or(0);

            return Err(WorkerErr::Arithmetic {
                worker,
                row: range.high - 1,
                layer,
            });
        }

        debug!(worker = worker, rows = range.len(), squared_error = squared_error; "finished pass");
        Ok(Gradient::new(grad, StepStats::new(range.len(), squared_error)))
    }

    fn sync_params(&mut self, params: &[f64]) -> Result<()> {
        Ok(self.network.set_params(params)?)
    }
}

/// Adds the contribution of `layer`'s deltas to the gradient of the weights feeding it
/// and, unless the source is the input layer, computes the source layer's deltas.
///
/// `deltas` is laid out like the network's outputs buffer.
fn backprop_layer(
    network: &FlatNetwork,
    grad: &mut [f64],
    deltas: &mut [f64],
    layer: usize,
) -> machine_learning::Result<()> {
    let src = layer + 1;
    let propagate = src + 1 < network.layer_count();

    let layer_index = network.layer_index();
    let sizes = network.sizes();
    let (head, tail) = deltas.split_at_mut(layer_index[src]);
    let dst_deltas = &head[layer_index[layer]..layer_index[layer] + sizes[layer]];
    let src_deltas = &mut tail[..sizes[src]];
    let src_outputs = network.layer_output(src);

    src_deltas.fill(0.);

    let weights = network.weight_block(layer)?;
    let mut grads = network.grad_block(grad, layer)?;

    let rows = weights.rows().into_iter().zip(grads.rows_mut());

    for ((w_row, mut g_row), &d) in rows.zip(dst_deltas) {
        g_row[0] += d;

        for (g, &out) in g_row.iter_mut().skip(1).zip(src_outputs) {
            *g += out * d;
        }

        if propagate {
            for (sd, &w) in src_deltas.iter_mut().zip(w_row.iter().skip(1)) {
                *sd += w * d;
            }
        }
    }

    if propagate {
        let act_fn = network.act_fn(src);

        for (sd, &out) in src_deltas.iter_mut().zip(src_outputs) {
            *sd *= act_fn.df(out);

            if !sd.is_finite() {
                return Err(MlErr::NonFinite { layer: src });
            }
        }
    }

    Ok(())
}
