use super::Optimizer;

/// What to do with a parameter whose gradient didn't keep nor flip its sign, that is,
/// when either the current or the last gradient is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroCrossing {
    /// Move by the sign of the gradient times the *last gradient*. Since one of both is
    /// zero in this branch the parameter stays put, the step is only taken next time.
    #[default]
    LastGradient,

    /// Move by the sign of the gradient times the current step size.
    StepSize,
}

/// The hyperparameters of resilient propagation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpropConfig {
    pub increase: f64,
    pub decrease: f64,
    pub initial_step: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub zero_crossing: ZeroCrossing,
}

impl Default for RpropConfig {
    fn default() -> Self {
        Self {
            increase: 1.2,
            decrease: 0.5,
            initial_step: 0.1,
            min_step: 1e-6,
            max_step: 50.,
            zero_crossing: ZeroCrossing::default(),
        }
    }
}

/// Resilient propagation, only the sign of each gradient is used and every parameter
/// adapts its own step size.
#[derive(Debug, Clone)]
pub struct Rprop {
    config: RpropConfig,
    steps: Box<[f64]>,
    last_gradients: Box<[f64]>,
}

impl Rprop {
    /// Creates a new `Rprop` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `config` - The hyperparameters.
    ///
    /// # Returns
    /// A new `Rprop` instance with every step size set to `config.initial_step`.
    pub fn new(len: usize, config: RpropConfig) -> Self {
        Self {
            steps: vec![config.initial_step; len].into_boxed_slice(),
            last_gradients: vec![0.; len].into_boxed_slice(),
            config,
        }
    }

    pub fn config(&self) -> &RpropConfig {
        &self.config
    }

    /// The current step size of every parameter.
    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    /// The gradient every parameter saw in the last update, zero after a sign flip.
    pub fn last_gradients(&self) -> &[f64] {
        &self.last_gradients
    }
}

/// Like `f64::signum` but zero for zero.
fn sign(x: f64) -> f64 {
    if x > 0. {
        1.
    } else if x < 0. {
        -1.
    } else {
        0.
    }
}

impl Optimizer for Rprop {
    fn delta(&mut self, idx: usize, grad: f64) -> f64 {
        let RpropConfig {
            increase,
            decrease,
            min_step,
            max_step,
            zero_crossing,
            ..
        } = self.config;

        let step = &mut self.steps[idx];
        let last = &mut self.last_gradients[idx];
        let change = sign(grad * *last);

        if change > 0. {
            *step = (*step * increase).min(max_step);
            *last = grad;
            sign(grad) * *step
        } else if change < 0. {
            *step = (*step * decrease).max(min_step);
            *last = 0.;
            0.
        } else {
            let delta = match zero_crossing {
                ZeroCrossing::LastGradient => sign(grad) * *last,
                ZeroCrossing::StepSize => sign(grad) * *step,
            };

            *last = grad;
            delta
        }
    }
}
