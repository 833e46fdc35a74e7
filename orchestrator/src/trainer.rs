use log::info;
use parameter_server::optimization::Optimizer;
use serde::Serialize;
use worker::CancelToken;

use crate::{Coordinator, Result};

/// When to stop training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCondition {
    pub max_iterations: usize,
    pub target_error: Option<f64>,
}

/// The outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub iterations: usize,
    pub error: Option<f64>,
    pub params: Vec<f64>,
}

/// A type-erased training session.
pub trait Trainer: Send {
    /// Runs a single iteration, see `Coordinator::iteration`.
    fn iteration(&mut self) -> Result<f64>;

    /// The amount of successful iterations so far.
    fn iterations(&self) -> usize;

    /// The error of the last successful iteration.
    fn error(&self) -> Option<f64>;

    /// The current weights.
    fn params(&self) -> &[f64];

    fn cancel_token(&self) -> CancelToken;

    /// Iterates until `stop.max_iterations` iterations have run or the error reaches
    /// `stop.target_error`.
    ///
    /// # Errors
    /// The first failing iteration's error, the weights stay as they were after the last
    /// successful iteration.
    fn train(&mut self, stop: &StopCondition) -> Result<TrainReport> {
        for _ in 0..stop.max_iterations {
            let error = self.iteration()?;

            if stop.target_error.is_some_and(|target| error <= target) {
                break;
            }
        }

        let report = TrainReport {
            iterations: self.iterations(),
            error: self.error(),
            params: self.params().to_vec(),
        };

        info!(iterations = report.iterations; "training finished with error {:?}", report.error);
        Ok(report)
    }
}

impl<O: Optimizer + Send> Trainer for Coordinator<O> {
    fn iteration(&mut self) -> Result<f64> {
        Coordinator::iteration(self)
    }

    fn iterations(&self) -> usize {
        Coordinator::iterations(self)
    }

    fn error(&self) -> Option<f64> {
        Coordinator::error(self)
    }

    fn params(&self) -> &[f64] {
        Coordinator::params(self)
    }

    fn cancel_token(&self) -> CancelToken {
        Coordinator::cancel_token(self)
    }
}
