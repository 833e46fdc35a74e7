mod act_fn;
pub mod registry;
mod sigmoid;

pub use act_fn::ActFn;
pub use sigmoid::Sigmoid;
