use parking_lot::Mutex;

use super::{Result, SizeMismatchErr};

/// Everything the workers reported during a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub grad: Box<[f64]>,
    pub squared_error: f64,
    pub rows: usize,
}

impl Totals {
    fn new(len: usize) -> Self {
        Self {
            grad: vec![0.; len].into_boxed_slice(),
            squared_error: 0.,
            rows: 0,
        }
    }

    fn reset(&mut self) {
        self.grad.fill(0.);
        self.squared_error = 0.;
        self.rows = 0;
    }
}

/// Sums the partial gradients of many workers into one batch gradient.
///
/// Workers report concurrently through a shared reference, the lock is only held while a
/// single partial gradient is being added.
#[derive(Debug)]
pub struct GradientAccumulator {
    totals: Mutex<Totals>,
}

impl GradientAccumulator {
    /// Creates a new zeroed `GradientAccumulator`.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters of the model.
    pub fn new(len: usize) -> Self {
        Self {
            totals: Mutex::new(Totals::new(len)),
        }
    }

    pub fn len(&self) -> usize {
        self.totals.lock().grad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a worker's partial results into the totals.
    ///
    /// # Arguments
    /// * `grad` - The worker's gradient.
    /// * `rows` - The amount of rows the worker went through.
    /// * `squared_error` - The sum of squared errors over those rows.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `grad` doesn't have the accumulator's length.
    pub fn accumulate(&self, grad: &[f64], rows: usize, squared_error: f64) -> Result<()> {
        let mut totals = self.totals.lock();
        SizeMismatchErr::check(grad.len(), totals.grad.len())?;

        totals
            .grad
            .iter_mut()
            .zip(grad)
            .for_each(|(acc, g)| *acc += g);

        totals.squared_error += squared_error;
        totals.rows += rows;
        Ok(())
    }

    /// Zeroes every total.
    pub fn reset(&mut self) {
        self.totals.get_mut().reset();
    }

    /// Gives exclusive access to the totals, no worker can be reporting at the same time.
    pub fn totals(&mut self) -> &mut Totals {
        self.totals.get_mut()
    }
}
