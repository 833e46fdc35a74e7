use super::ActFn;
use crate::error::{MlErr, Result};

fn sigmoid() -> ActFn {
    ActFn::sigmoid(1.)
}

fn tanh() -> ActFn {
    ActFn::Tanh
}

fn linear() -> ActFn {
    ActFn::Linear
}

fn relu() -> ActFn {
    ActFn::Relu
}

const REGISTRY: &[(&str, fn() -> ActFn)] = &[
    ("sigmoid", sigmoid),
    ("tanh", tanh),
    ("linear", linear),
    ("relu", relu),
];

/// Resolves an activation function from its tag.
///
/// # Errors
/// `MlErr::UnknownActFn` if nothing is registered under `tag`.
pub fn resolve(tag: &str) -> Result<ActFn> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, ctor)| ctor())
        .ok_or_else(|| MlErr::UnknownActFn {
            tag: tag.to_string(),
        })
}

/// Every registered tag.
pub fn tags() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}
